use http::{HeaderMap, Uri, header::HOST};
use url::Url;

/// The URL of the inbound request currently being served.
///
/// Used as the default `redirectURL` of a hosted request, so the gateway
/// posts the cardholder back to the page that started the payment.
///
/// ```
/// use paynet_kit::origin::RequestOrigin;
///
/// let request = http::Request::builder()
///     .uri("/checkout/pay?order=42")
///     .header("host", "shop.example.com")
///     .header("x-forwarded-proto", "https")
///     .body(())
///     .unwrap();
///
/// let origin = RequestOrigin::from_request(&request).unwrap();
/// assert_eq!(origin.redirect_url().as_str(), "https://shop.example.com/checkout/pay?order=42");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestOrigin(Url);

impl RequestOrigin {
    pub fn new(url: Url) -> Self {
        RequestOrigin(url)
    }

    pub fn from_request<B>(request: &http::Request<B>) -> Option<Self> {
        Self::from_parts(request.uri(), request.headers())
    }

    /// Rebuild the absolute URL from a request line and its headers.
    ///
    /// The scheme comes from an absolute URI, then `X-Forwarded-Proto`, else
    /// `http`. The host comes from the URI authority, else the `Host` header.
    /// Returns `None` when no host is known.
    pub fn from_parts(uri: &Uri, headers: &HeaderMap) -> Option<Self> {
        let scheme = uri
            .scheme_str()
            .or_else(|| {
                headers
                    .get("x-forwarded-proto")
                    .and_then(|value| value.to_str().ok())
                    .and_then(|value| value.split(',').next())
                    .map(str::trim)
            })
            .unwrap_or("http");

        let host = match uri.authority() {
            Some(authority) => authority.as_str(),
            None => headers.get(HOST)?.to_str().ok()?,
        };

        let path_and_query = uri.path_and_query().map_or("/", |pq| pq.as_str());

        Url::parse(&format!("{scheme}://{host}{path_and_query}"))
            .ok()
            .map(RequestOrigin)
    }

    pub fn redirect_url(&self) -> &Url {
        &self.0
    }
}

impl From<Url> for RequestOrigin {
    fn from(url: Url) -> Self {
        RequestOrigin(url)
    }
}
