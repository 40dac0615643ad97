use std::{fmt::Display, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::{errors::ProtocolError, types::FieldValue};

/// A gateway `responseCode`.
///
/// ```
/// use paynet_core::types::{FieldValue, ResponseCode};
///
/// let code = ResponseCode::try_from(&FieldValue::from("65802")).unwrap();
/// assert_eq!(code, ResponseCode::THREE_DS_AUTHENTICATION_REQUIRED);
/// assert!(code.requires_three_ds());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ResponseCode(pub i64);

impl ResponseCode {
    /// Transaction successful.
    pub const SUCCESS: ResponseCode = ResponseCode(0);
    /// Transaction declined.
    pub const DO_NOT_HONOR: ResponseCode = ResponseCode(5);
    /// Verification successful.
    pub const NO_REASON_TO_DECLINE: ResponseCode = ResponseCode(85);
    /// Cardholder must complete a 3-D Secure challenge.
    pub const THREE_DS_AUTHENTICATION_REQUIRED: ResponseCode = ResponseCode(0x1010A);

    pub fn is_success(self) -> bool {
        self == Self::SUCCESS
    }

    pub fn requires_three_ds(self) -> bool {
        self == Self::THREE_DS_AUTHENTICATION_REQUIRED
    }
}

impl Display for ResponseCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for ResponseCode {
    type Err = ProtocolError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim()
            .parse::<i64>()
            .map(ResponseCode)
            .map_err(|_| ProtocolError::InvalidResponseCode(s.to_owned()))
    }
}

impl TryFrom<&FieldValue> for ResponseCode {
    type Error = ProtocolError;

    fn try_from(value: &FieldValue) -> Result<Self, Self::Error> {
        match value {
            FieldValue::Integer(code) => Ok(ResponseCode(*code)),
            FieldValue::Text(text) => text.parse(),
            other => Err(ProtocolError::InvalidResponseCode(format!("{other:?}"))),
        }
    }
}
