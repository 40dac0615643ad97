use url::Url;

/// Delivery of a signed, form-encoded request to the direct API.
///
/// Implementations POST `form` as `application/x-www-form-urlencoded` and
/// return the raw response body. A non-2xx status is an error.
pub trait DirectTransport {
    type Error: std::error::Error + Send + Sync + 'static;

    fn post_form(
        &self,
        url: &Url,
        form: &[(String, String)],
    ) -> impl Future<Output = Result<String, Self::Error>> + Send;
}

#[cfg(feature = "direct-client")]
pub use http_transport::{HttpTransport, HttpTransportError};

#[cfg(feature = "direct-client")]
mod http_transport {
    use reqwest_middleware::{ClientBuilder, ClientWithMiddleware};
    use url::Url;

    use super::DirectTransport;
    use crate::{config::GatewayConfig, errors::ConfigError};

    /// Default [`DirectTransport`] over `reqwest`.
    ///
    /// Wraps a [`ClientWithMiddleware`] so applications can add their own
    /// retry or tracing middleware via [`HttpTransport::from_client`].
    #[derive(Debug, Clone)]
    pub struct HttpTransport {
        client: ClientWithMiddleware,
    }

    #[derive(Debug, thiserror::Error)]
    pub enum HttpTransportError {
        #[error("HTTP request error: {0}")]
        Request(#[from] reqwest::Error),
        #[error("HTTP middleware error: {0}")]
        Middleware(#[from] reqwest_middleware::Error),
    }

    impl HttpTransport {
        /// A client with the given whole-request and connect timeouts.
        pub fn new(
            timeout: std::time::Duration,
            connect_timeout: std::time::Duration,
        ) -> Result<Self, ConfigError> {
            let client = reqwest::Client::builder()
                .timeout(timeout)
                .connect_timeout(connect_timeout)
                .build()
                .map_err(ConfigError::HttpClient)?;

            Ok(HttpTransport {
                client: ClientBuilder::new(client).build(),
            })
        }

        pub fn from_config(config: &GatewayConfig) -> Result<Self, ConfigError> {
            Self::new(config.timeout(), config.connect_timeout())
        }

        pub fn from_client(client: impl Into<ClientWithMiddleware>) -> Self {
            HttpTransport {
                client: client.into(),
            }
        }
    }

    impl DirectTransport for HttpTransport {
        type Error = HttpTransportError;

        async fn post_form(
            &self,
            url: &Url,
            form: &[(String, String)],
        ) -> Result<String, Self::Error> {
            let body = self
                .client
                .post(url.clone())
                .form(form)
                .send()
                .await?
                .error_for_status()?
                .text()
                .await?;

            Ok(body)
        }
    }
}
