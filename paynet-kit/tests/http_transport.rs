#![cfg(feature = "direct-client")]

use std::time::Duration;

use paynet_kit::{
    config::GatewayConfig,
    encoding::{encode_query, flatten_map},
    errors::Error,
    gateway::HttpGateway,
    signature,
    transport::{DirectTransport, HttpTransport},
    types::FieldMap,
};
use wiremock::{
    Mock, MockServer, ResponseTemplate,
    matchers::{body_string, header, method, path},
};

const MERCHANT_ID: &str = "100856";
const SECRET: &str = "Circle4Take40Idea";

fn config(server: &MockServer, timeout_secs: u64) -> GatewayConfig {
    GatewayConfig::builder()
        .merchant_id(MERCHANT_ID)
        .merchant_secret(SECRET)
        .direct_url(format!("{}/direct/", server.uri()).parse().unwrap())
        .timeout_secs(timeout_secs)
        .connect_timeout_secs(timeout_secs)
        .build()
}

/// The form body the gateway is expected to post for `fields`.
fn expected_body(fields: &FieldMap) -> String {
    let mut sent = fields.clone().with("merchantID", MERCHANT_ID);
    let signature = signature::sign(&sent, SECRET, None).unwrap();
    sent.insert("signature", signature);
    encode_query(flatten_map(&sent).unwrap())
}

#[tokio::test]
async fn test_posts_url_encoded_form() {
    let server = MockServer::start().await;
    let request = FieldMap::new()
        .with("action", "SALE")
        .with("amount", 1001)
        .with("customerAddress", FieldMap::new().with("line1", "1 Main St & Co"));

    Mock::given(method("POST"))
        .and(path("/direct/"))
        .and(header("content-type", "application/x-www-form-urlencoded"))
        .and(body_string(expected_body(&request)))
        .respond_with(
            ResponseTemplate::new(200).set_body_string("responseCode=0&xref=21010101"),
        )
        .expect(1)
        .mount(&server)
        .await;

    let gateway = HttpGateway::new(config(&server, 5)).unwrap();
    let response = gateway.direct_request(request).await.unwrap();

    assert_eq!(response.get_text("responseCode"), Some("0"));
    assert_eq!(response.get_text("xref"), Some("21010101"));
}

#[tokio::test]
async fn test_server_error_is_transport_error() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/direct/"))
        .respond_with(ResponseTemplate::new(500).set_body_string("responseCode=0"))
        .mount(&server)
        .await;

    let gateway = HttpGateway::new(config(&server, 5)).unwrap();
    let err = gateway
        .direct_request(FieldMap::new().with("action", "SALE"))
        .await
        .unwrap_err();

    assert!(matches!(err, Error::Transport(_)));
    assert!(err.is_transport());
}

#[tokio::test]
async fn test_slow_reply_times_out() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/direct/"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string("responseCode=0")
                .set_delay(Duration::from_secs(3)),
        )
        .mount(&server)
        .await;

    let gateway = HttpGateway::new(config(&server, 1)).unwrap();
    let err = gateway
        .direct_request(FieldMap::new().with("action", "SALE"))
        .await
        .unwrap_err();

    assert!(matches!(err, Error::Transport(_)));
}

#[tokio::test]
async fn test_transport_reports_status_directly() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/direct/"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let config = config(&server, 5);
    let transport = HttpTransport::from_config(&config).unwrap();
    let err = transport
        .post_form(&config.direct_url, &[("action".to_owned(), "SALE".to_owned())])
        .await
        .unwrap_err();

    assert!(err.to_string().contains("503"));
}
