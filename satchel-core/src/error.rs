//! Error types shared across the session core

use thiserror::Error;

pub type SessionResult<T> = Result<T, SessionError>;

/// Error type for session operations
#[derive(Debug, Error)]
pub enum SessionError {
    /// A typed accessor disagreed with the stored dynamic kind.
    /// Returned to the caller, never retried.
    #[error("type mismatch: expected {expected}, found {found}")]
    TypeMismatch {
        expected: &'static str,
        found: &'static str,
    },

    /// The system randomness source failed while minting a token.
    /// Fatal to the in-progress load or creation call.
    #[error("token generation failed: {0}")]
    TokenGeneration(#[source] rand::Error),

    /// A store call failed; the backend error is carried verbatim.
    #[error("store error: {0}")]
    Store(#[source] Box<dyn std::error::Error + Send + Sync>),

    /// A payload could not be encoded to, or decoded from, the wire envelope.
    #[error("payload codec error: {message}")]
    Codec { message: String },

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// A mutation was attempted on a session whose identity was cleared
    /// by `destroy`.
    #[error("session has been destroyed")]
    Destroyed,

    /// An optional store capability was invoked on a backend that does not
    /// advertise it.
    #[error("store does not support {0}")]
    Unsupported(&'static str),

    /// The tracing subscriber could not be installed.
    #[error("logging initialization failed: {message}")]
    Logging { message: String },
}

impl SessionError {
    /// Wrap a backend error as a store failure
    pub fn store<E>(err: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Self::Store(Box::new(err))
    }

    /// Create a codec error
    pub fn codec<S: Into<String>>(message: S) -> Self {
        Self::Codec {
            message: message.into(),
        }
    }
}
