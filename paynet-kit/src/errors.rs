use paynet_core::errors::{EncodingError, ProtocolError, SignatureError};

use crate::response::Decline;

/// Boxed error returned by a [`DirectTransport`](crate::transport::DirectTransport).
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Errors raised while building a [`Gateway`](crate::gateway::Gateway) or a request.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// A hosted request has no `redirectURL` and no inbound request to derive one from.
    #[error("No redirectURL given and no request origin to derive one from")]
    MissingRedirectUrl,

    #[cfg(feature = "direct-client")]
    #[error("Failed to build HTTP client: {0}")]
    HttpClient(#[source] reqwest::Error),
}

/// Error type for gateway operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The direct API could not be reached, timed out or answered with a non-2xx status.
    #[error("Payment Gateway request failed: {0}")]
    Transport(#[source] BoxError),

    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    #[error(transparent)]
    Signature(#[from] SignatureError),

    /// The request fields cannot be encoded unambiguously.
    #[error(transparent)]
    Encoding(#[from] EncodingError),

    /// The gateway declined the transaction.
    #[error(transparent)]
    Declined(#[from] Decline),

    #[error(transparent)]
    Config(#[from] ConfigError),
}

impl Error {
    pub fn transport<E>(err: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Error::Transport(Box::new(err))
    }

    /// Whether the failure happened before the gateway produced an answer.
    ///
    /// Nothing in this crate retries; callers deciding to do so should only
    /// retry these.
    pub fn is_transport(&self) -> bool {
        matches!(self, Error::Transport(_))
    }
}

impl From<paynet_core::errors::Error> for Error {
    fn from(err: paynet_core::errors::Error) -> Self {
        match err {
            paynet_core::errors::Error::Signature(err) => Error::Signature(err),
            paynet_core::errors::Error::Protocol(err) => Error::Protocol(err),
            paynet_core::errors::Error::Encoding(err) => Error::Encoding(err),
        }
    }
}

/// A specialized `Result` type for gateway operations.
pub type Result<T> = std::result::Result<T, Error>;
