use std::{fmt::Debug, time::Duration};

use bon::Builder;
use serde::Deserialize;
use url::Url;
use url_macro::url;
use zeroize::Zeroize;

/// Default hosted payment page.
pub const DEFAULT_HOSTED_URL: &str = "https://commerce-api.handpoint.com/hosted/";
/// Default direct (server-to-server) API endpoint.
pub const DEFAULT_DIRECT_URL: &str = "https://commerce-api.handpoint.com/direct/";
/// Hosted page variant rendered inside a modal; use as `hosted_url` to opt in.
pub const MODAL_HOSTED_URL: &str = "https://gateway.cardstream.com/hosted/modal/";

/// The merchant's signature key.
///
/// Never printed by `Debug` and wiped from memory on drop.
#[derive(Clone, PartialEq, Eq, Deserialize)]
#[serde(transparent)]
pub struct MerchantSecret(String);

impl MerchantSecret {
    pub fn new(secret: impl Into<String>) -> Self {
        MerchantSecret(secret.into())
    }

    pub fn expose(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl Debug for MerchantSecret {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("MerchantSecret(*** redacted ***)")
    }
}

impl Drop for MerchantSecret {
    fn drop(&mut self) {
        self.0.zeroize();
    }
}

impl From<String> for MerchantSecret {
    fn from(secret: String) -> Self {
        MerchantSecret(secret)
    }
}

impl From<&str> for MerchantSecret {
    fn from(secret: &str) -> Self {
        MerchantSecret(secret.to_owned())
    }
}

/// Gateway credentials and endpoints.
///
/// ```
/// use paynet_kit::config::{GatewayConfig, MODAL_HOSTED_URL};
///
/// let config = GatewayConfig::builder()
///     .merchant_id("100856")
///     .merchant_secret("Circle4Take40Idea")
///     .hosted_url(MODAL_HOSTED_URL.parse().unwrap())
///     .build();
///
/// assert_eq!(config.hosted_url.as_str(), MODAL_HOSTED_URL);
/// assert_eq!(config.direct_url.as_str(), "https://commerce-api.handpoint.com/direct/");
/// assert!(!format!("{config:?}").contains("Circle4Take40Idea"));
/// ```
///
/// It also deserializes from camelCase application config, with the same
/// defaults for anything left out.
#[derive(Builder, Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GatewayConfig {
    /// Merchant account id, sent as `merchantID`.
    #[builder(into)]
    pub merchant_id: String,
    /// Signature key. Requests go unsigned and responses unchecked without one.
    #[builder(into)]
    #[serde(default)]
    pub merchant_secret: Option<MerchantSecret>,
    #[builder(default = default_hosted_url())]
    #[serde(default = "default_hosted_url")]
    pub hosted_url: Url,
    #[builder(default = default_direct_url())]
    #[serde(default = "default_direct_url")]
    pub direct_url: Url,
    /// Whole-request timeout for the direct API, in seconds.
    #[builder(default = 30)]
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    #[builder(default = 10)]
    #[serde(default = "default_connect_timeout_secs")]
    pub connect_timeout_secs: u64,
}

impl GatewayConfig {
    /// The configured secret, ignoring an empty one.
    pub fn secret(&self) -> Option<&MerchantSecret> {
        self.merchant_secret
            .as_ref()
            .filter(|secret| !secret.is_empty())
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }
}

fn default_hosted_url() -> Url {
    url!("https://commerce-api.handpoint.com/hosted/")
}

fn default_direct_url() -> Url {
    url!("https://commerce-api.handpoint.com/direct/")
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_connect_timeout_secs() -> u64 {
    10
}
