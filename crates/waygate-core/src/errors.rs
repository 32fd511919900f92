//! Gateway error taxonomy.
//!
//! Errors are classified by how the caller should react:
//!
//! - [`GatewayError::InvalidInput`] — malformed request, user-correctable (4xx)
//! - [`GatewayError::Unavailable`] — the gateway is not ready yet, transient (5xx)
//! - [`GatewayError::Upstream`] — the transport library failed (5xx, logged with detail)
//! - [`GatewayError::Persistence`] — a store write failed; recovered locally by
//!   re-queueing, never surfaced to HTTP callers
//! - [`GatewayError::TerminalAuth`] — credentials invalidated; no retry, the
//!   process stops and an operator must re-pair

use thiserror::Error;

/// Result alias for gateway operations.
pub type GatewayResult<T> = Result<T, GatewayError>;

/// Top-level error type for gateway operations.
#[derive(Debug, Error)]
pub enum GatewayError {
    /// Malformed caller request.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// The gateway has no usable connection yet.
    #[error("unavailable: {0}")]
    Unavailable(String),

    /// Transport-level failure while serving a request.
    #[error("upstream failure: {message}")]
    Upstream {
        /// Human-readable description.
        message: String,
        /// Underlying transport error, when available.
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// A durable-store write failed.
    #[error("persistence failure: {0}")]
    Persistence(String),

    /// Credentials were invalidated by the network.
    #[error("terminal auth failure: {0}")]
    TerminalAuth(String),
}

impl GatewayError {
    /// Wrap an upstream transport error.
    pub fn upstream(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Upstream {
            message: err.to_string(),
            source: Some(Box::new(err)),
        }
    }

    /// Whether the error requires operator intervention (never retried).
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::TerminalAuth(_))
    }

    /// Whether the condition is expected to clear on its own.
    #[must_use]
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Unavailable(_) | Self::Persistence(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    #[derive(Debug, Error)]
    #[error("boom")]
    struct Boom;

    #[test]
    fn invalid_input_display() {
        let err = GatewayError::InvalidInput("empty number".into());
        assert_eq!(err.to_string(), "invalid input: empty number");
    }

    #[test]
    fn upstream_preserves_source() {
        let err = GatewayError::upstream(Boom);
        assert_matches!(&err, GatewayError::Upstream { source: Some(_), .. });
        assert_eq!(err.to_string(), "upstream failure: boom");
    }

    #[test]
    fn terminal_classification() {
        assert!(GatewayError::TerminalAuth("logged out".into()).is_terminal());
        assert!(!GatewayError::Unavailable("no connection".into()).is_terminal());
    }

    #[test]
    fn transient_classification() {
        assert!(GatewayError::Unavailable("starting".into()).is_transient());
        assert!(GatewayError::Persistence("disk full".into()).is_transient());
        assert!(!GatewayError::InvalidInput("bad".into()).is_transient());
    }
}
