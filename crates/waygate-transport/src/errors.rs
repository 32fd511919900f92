//! Transport error types.

use thiserror::Error;

/// Result alias for transport operations.
pub type TransportResult<T> = Result<T, TransportError>;

/// Errors raised by a transport backend.
#[derive(Debug, Error)]
pub enum TransportError {
    /// Establishing a session failed.
    #[error("connect failed: {0}")]
    Connect(String),

    /// Issuing a pairing code failed.
    #[error("pairing failed: {0}")]
    Pairing(String),

    /// The session's event channel is gone.
    #[error("event channel closed")]
    ChannelClosed,

    /// The backend does not support the requested operation.
    #[error("unsupported operation: {0}")]
    Unsupported(&'static str),
}
