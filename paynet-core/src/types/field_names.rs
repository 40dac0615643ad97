//! Well-known field names of the gateway protocol.

pub const MERCHANT_ID: &str = "merchantID";
pub const SIGNATURE: &str = "signature";
pub const REDIRECT_URL: &str = "redirectURL";
pub const RESPONSE_CODE: &str = "responseCode";
pub const RESPONSE_MESSAGE: &str = "responseMessage";
pub const THREE_DS_VERSION: &str = "threeDSVersion";
