//! The Payment Network gateway client.
//!
//! For details, see the [`Gateway`] struct documentation.

use std::{fmt::Debug, sync::Arc};

use paynet_core::{
    encoding::{decode_query, flatten_map},
    signature,
    types::{FieldMap, field_names},
};

use crate::{
    audit::{AuditOperation, AuditOutcome, AuditRecord, AuditSink, NoopAuditSink},
    config::GatewayConfig,
    errors::{ConfigError, Error, Result},
    form::{DEFAULT_TARGET, RenderedForm, render_silent_post},
    origin::RequestOrigin,
    response::{ResponseOutcome, ResponseVerifier},
    transport::DirectTransport,
};

#[cfg(feature = "direct-client")]
use crate::transport::HttpTransport;

/// A client for the hosted and direct gateway APIs.
///
/// `Gateway` signs outgoing requests with the merchant secret, renders hosted
/// payment forms, talks to the direct API through a [`DirectTransport`] and
/// verifies gateway responses. It holds no per-request state and can be
/// shared between tasks.
///
/// ## Flows
///
/// - **Hosted**: [`hosted_request`](Gateway::hosted_request) returns a form
///   that posts the cardholder's browser to the hosted payment page. The
///   gateway later posts the result to `redirectURL`, which the caller feeds
///   to [`verify_response`](Gateway::verify_response).
/// - **Direct**: [`direct_request`](Gateway::direct_request) posts the
///   request server-to-server and returns the decoded reply;
///   [`direct_payment`](Gateway::direct_payment) also verifies it.
///
/// Each call reports exactly one [`AuditRecord`] to the configured sink.
///
/// ```
/// use paynet_core::types::FieldMap;
/// use paynet_kit::{config::GatewayConfig, gateway::HttpGateway, origin::RequestOrigin};
///
/// let gateway = HttpGateway::new(
///     GatewayConfig::builder()
///         .merchant_id("100856")
///         .merchant_secret("Circle4Take40Idea")
///         .build(),
/// )
/// .unwrap();
///
/// let origin = RequestOrigin::new("https://shop.example.com/checkout".parse().unwrap());
/// let form = gateway
///     .hosted_request(
///         FieldMap::new().with("action", "SALE").with("amount", 1001),
///         Some(&origin),
///     )
///     .unwrap();
///
/// assert!(form.as_str().contains(r#"name="merchantID" value="100856""#));
/// assert!(form.as_str().contains(r#"name="signature""#));
/// ```
#[derive(Clone)]
pub struct Gateway<T: DirectTransport> {
    config: GatewayConfig,
    transport: T,
    verifier: ResponseVerifier,
    audit: Arc<dyn AuditSink>,
}

/// A [`Gateway`] using the default HTTP transport.
#[cfg(feature = "direct-client")]
pub type HttpGateway = Gateway<HttpTransport>;

#[cfg(feature = "direct-client")]
impl Gateway<HttpTransport> {
    /// A gateway with an [`HttpTransport`] configured from `config`.
    pub fn new(config: GatewayConfig) -> Result<Self> {
        let transport = HttpTransport::from_config(&config)?;
        Ok(Self::with_transport(config, transport))
    }
}

impl<T: DirectTransport> Gateway<T> {
    pub fn with_transport(config: GatewayConfig, transport: T) -> Self {
        #[cfg(feature = "tracing")]
        if config.secret().is_none() {
            tracing::warn!(
                "No merchant secret configured for merchant '{}'; requests will be unsigned",
                config.merchant_id
            );
        }

        Gateway {
            verifier: ResponseVerifier::from_config(&config),
            config,
            transport,
            audit: Arc::new(NoopAuditSink),
        }
    }

    /// Report every call to `sink`.
    pub fn with_audit_sink(mut self, sink: impl AuditSink + 'static) -> Self {
        self.audit = Arc::new(sink);
        self
    }

    pub fn with_shared_audit_sink(mut self, sink: Arc<dyn AuditSink>) -> Self {
        self.audit = sink;
        self
    }

    pub fn config(&self) -> &GatewayConfig {
        &self.config
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn verifier(&self) -> &ResponseVerifier {
        &self.verifier
    }

    /// Build the signed, self-submitting form for the hosted payment page.
    ///
    /// A missing `redirectURL` is taken from `origin`. `merchantID` and
    /// `signature` are set last; any signature the caller supplied is replaced.
    pub fn hosted_request(
        &self,
        fields: FieldMap,
        origin: Option<&RequestOrigin>,
    ) -> Result<RenderedForm> {
        let arguments = fields.clone();

        let (sent, result) = match self.prepare_hosted(fields, origin) {
            Ok((sent, form)) => (Some(sent), Ok(form)),
            Err(err) => (None, Err(err)),
        };

        let outcome = match &result {
            Ok(form) => AuditOutcome::Rendered {
                form: form.as_str().to_owned(),
            },
            Err(err) => AuditOutcome::Failed {
                error: err.to_string(),
            },
        };
        self.audit.record(
            &AuditRecord::new(AuditOperation::HostedRequest, arguments, outcome).with_sent(sent),
        );

        result
    }

    /// Send a signed request to the direct API and decode the reply.
    ///
    /// The reply is not verified; see [`direct_payment`](Gateway::direct_payment).
    pub async fn direct_request(&self, fields: FieldMap) -> Result<FieldMap> {
        let arguments = fields.clone();
        let (sent, result) = self.send_direct(fields).await;

        let record = match &result {
            Ok(response) => AuditRecord::new(
                AuditOperation::DirectRequest,
                arguments,
                AuditOutcome::Response {
                    fields: response.clone(),
                },
            ),
            Err(err) => AuditRecord::failed(AuditOperation::DirectRequest, arguments, err),
        };
        self.audit.record(&record.with_sent(sent));

        result
    }

    /// [`direct_request`](Gateway::direct_request) followed by
    /// [`verify_response`](Gateway::verify_response), audited as one call.
    pub async fn direct_payment(&self, fields: FieldMap) -> Result<ResponseOutcome> {
        let arguments = fields.clone();
        let (sent, response) = self.send_direct(fields).await;
        let result = response.and_then(|response| self.verifier.verify(response));

        self.audit_verification(AuditOperation::DirectPayment, arguments, sent, &result);

        result
    }

    /// Verify a response posted back by the gateway or returned by the direct API.
    pub fn verify_response(&self, fields: FieldMap) -> Result<ResponseOutcome> {
        let arguments = fields.clone();
        let result = self.verifier.verify(fields);

        self.audit_verification(AuditOperation::VerifyResponse, arguments, None, &result);

        result
    }

    fn prepare_hosted(
        &self,
        mut fields: FieldMap,
        origin: Option<&RequestOrigin>,
    ) -> Result<(FieldMap, RenderedForm)> {
        if !fields.contains_key(field_names::REDIRECT_URL) {
            let origin = origin.ok_or(ConfigError::MissingRedirectUrl)?;
            fields.append(field_names::REDIRECT_URL, origin.redirect_url().as_str());
        }

        fields.remove(field_names::SIGNATURE);
        fields.append(field_names::MERCHANT_ID, &self.config.merchant_id);
        self.sign_into(&mut fields)?;

        let form = render_silent_post(&self.config.hosted_url, &fields, DEFAULT_TARGET)?;

        #[cfg(feature = "tracing")]
        tracing::debug!(
            "Hosted request rendered: fields={}, signed={}",
            fields.len(),
            fields.contains_key(field_names::SIGNATURE)
        );

        Ok((fields, form))
    }

    /// Sign `fields` for the direct API and flatten them into form pairs.
    fn prepare_direct(&self, mut fields: FieldMap) -> Result<(FieldMap, Vec<(String, String)>)> {
        fields.remove(field_names::SIGNATURE);
        if !fields.contains_key(field_names::MERCHANT_ID) {
            fields.append(field_names::MERCHANT_ID, &self.config.merchant_id);
        }
        self.sign_into(&mut fields)?;

        let form = flatten_map(&fields)?;
        Ok((fields, form))
    }

    async fn send_direct(&self, fields: FieldMap) -> (Option<FieldMap>, Result<FieldMap>) {
        let (sent, form) = match self.prepare_direct(fields) {
            Ok(prepared) => prepared,
            Err(err) => {
                #[cfg(feature = "tracing")]
                tracing::warn!("Direct request not sent: {err}");
                return (None, Err(err));
            }
        };

        #[cfg(feature = "tracing")]
        tracing::debug!("Posting direct request: url='{}'", self.config.direct_url);

        let result = match self.transport.post_form(&self.config.direct_url, &form).await {
            Ok(body) => decode_query(&body).map_err(Error::from),
            Err(err) => {
                #[cfg(feature = "tracing")]
                tracing::warn!("Direct request failed: {err}");
                Err(Error::transport(err))
            }
        };

        (Some(sent), result)
    }

    fn sign_into(&self, fields: &mut FieldMap) -> Result<()> {
        if let Some(secret) = self.config.secret() {
            let signature = signature::sign(fields, secret.expose(), None)?;
            fields.append(field_names::SIGNATURE, signature);
        }
        Ok(())
    }

    fn audit_verification(
        &self,
        operation: AuditOperation,
        arguments: FieldMap,
        sent: Option<FieldMap>,
        result: &Result<ResponseOutcome>,
    ) {
        let record = match result {
            Ok(outcome) => {
                let response_code = outcome
                    .fields()
                    .get(field_names::RESPONSE_CODE)
                    .and_then(|code| paynet_core::types::ResponseCode::try_from(code).ok())
                    .map_or(0, |code| code.0);
                AuditRecord::new(
                    operation,
                    arguments,
                    AuditOutcome::Verified {
                        outcome: outcome.kind(),
                        response_code,
                    },
                )
            }
            Err(err) => AuditRecord::failed(operation, arguments, err),
        };
        self.audit.record(&record.with_sent(sent));
    }
}

impl<T: DirectTransport> Debug for Gateway<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Gateway")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use std::convert::Infallible;

    use paynet_core::errors::EncodingError;
    use url::Url;

    use super::*;

    struct Unreachable;

    impl DirectTransport for Unreachable {
        type Error = Infallible;

        async fn post_form(
            &self,
            _url: &Url,
            _form: &[(String, String)],
        ) -> std::result::Result<String, Infallible> {
            unreachable!("hosted requests never touch the transport")
        }
    }

    fn gateway(secret: Option<&str>) -> Gateway<Unreachable> {
        let config = GatewayConfig::builder()
            .merchant_id("100856")
            .maybe_merchant_secret(secret)
            .build();
        Gateway::with_transport(config, Unreachable)
    }

    fn origin() -> RequestOrigin {
        RequestOrigin::new("https://shop.example.com/checkout?step=pay".parse().unwrap())
    }

    #[test]
    fn test_hosted_field_order() {
        let gateway = gateway(Some("s3cr3t"));
        let (fields, _form) = gateway
            .prepare_hosted(
                FieldMap::new()
                    .with("merchantID", "ignored")
                    .with("action", "SALE")
                    .with("amount", 1001)
                    .with("signature", "stale"),
                Some(&origin()),
            )
            .unwrap();

        assert_eq!(
            fields.keys().collect::<Vec<_>>(),
            ["action", "amount", "redirectURL", "merchantID", "signature"]
        );
        assert_eq!(fields.get_text("merchantID"), Some("100856"));
        assert_eq!(
            fields.get_text("redirectURL"),
            Some("https://shop.example.com/checkout?step=pay")
        );

        let mut unsigned = fields.clone();
        let signature = unsigned.remove("signature").unwrap();
        assert_eq!(
            signature.as_text(),
            Some(signature::sign(&unsigned, "s3cr3t", None).unwrap().to_string().as_str())
        );
    }

    #[test]
    fn test_hosted_keeps_caller_redirect_url() {
        let (fields, _form) = gateway(None)
            .prepare_hosted(
                FieldMap::new().with("redirectURL", "https://shop.example.com/return"),
                None,
            )
            .unwrap();

        assert_eq!(fields.get_text("redirectURL"), Some("https://shop.example.com/return"));
        assert!(!fields.contains_key("signature"));
    }

    #[test]
    fn test_hosted_requires_redirect_url() {
        let err = gateway(Some("s3cr3t"))
            .hosted_request(FieldMap::new().with("amount", 1), None)
            .unwrap_err();

        assert!(matches!(err, Error::Config(ConfigError::MissingRedirectUrl)));
    }

    #[test]
    fn test_hosted_form_targets_hosted_url() {
        let form = gateway(Some("s3cr3t"))
            .hosted_request(FieldMap::new().with("amount", 1), Some(&origin()))
            .unwrap();

        assert!(form.as_str().starts_with(
            r#"<form id="silentPost" action="https://commerce-api.handpoint.com/hosted/" method="post" target="_self">"#
        ));
    }

    #[test]
    fn test_colliding_field_names_are_rejected() {
        let fields = FieldMap::new()
            .with("customerAddress", FieldMap::new().with("city", "Leeds"))
            .with("customerAddress[city]", "York");

        let hosted = gateway(Some("s3cr3t")).prepare_hosted(fields.clone(), Some(&origin()));
        assert!(matches!(
            hosted,
            Err(Error::Encoding(EncodingError::DuplicateField(name))) if name == "customerAddress[city]"
        ));

        let direct = gateway(None).prepare_direct(fields);
        assert!(matches!(
            direct,
            Err(Error::Encoding(EncodingError::DuplicateField(name))) if name == "customerAddress[city]"
        ));
    }
}
