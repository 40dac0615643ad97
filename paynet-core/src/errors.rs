/// Signature check failures.
///
/// Both messages are safe to show to a cardholder; they never say which field
/// or which secret caused the failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum SignatureError {
    /// A secret is configured but the response carried no signature.
    #[error("Incorrectly signed response from Payment Gateway")]
    Missing,

    /// The recomputed signature differs from the one supplied.
    #[error("Incorrectly signed response from Payment Gateway (2)")]
    Mismatch,
}

/// Malformed or unparseable gateway payloads.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ProtocolError {
    /// The response has no `responseCode` field at all.
    #[error("Invalid response from Payment Gateway")]
    MissingResponseCode,

    /// `responseCode` is present but not an integer.
    #[error("Invalid response code from Payment Gateway: {0:?}")]
    InvalidResponseCode(String),

    /// A step-up response without a usable `threeDSVersion`.
    #[error("Invalid 3-D Secure version from Payment Gateway: {0:?}")]
    InvalidThreeDsVersion(String),

    /// The gateway replied with an empty body.
    #[error("Empty response from Payment Gateway")]
    EmptyResponse,

    /// A field name with unbalanced or misplaced brackets.
    #[error("Malformed field name in gateway response: {0:?}")]
    MalformedKey(String),

    /// The same path is used both as a value and as a nested map.
    #[error("Conflicting values for field {0:?} in gateway response")]
    ConflictingKey(String),
}

/// Field maps that cannot be put on the wire unambiguously.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EncodingError {
    /// Two fields flatten to the same name, e.g. `addr: {city}` next to a
    /// literal `addr[city]`.
    #[error("Field {0:?} is given more than once after flattening")]
    DuplicateField(String),
}

/// Error types for core protocol operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Error {
    /// Signature verification errors.
    #[error(transparent)]
    Signature(#[from] SignatureError),

    /// Payload decoding errors.
    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    /// Request encoding errors.
    #[error(transparent)]
    Encoding(#[from] EncodingError),
}

/// A specialized `Result` type for core protocol operations.
pub type Result<T> = std::result::Result<T, Error>;
