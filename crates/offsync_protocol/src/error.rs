//! Error types for the change model.

use thiserror::Error;

/// Result type for protocol operations.
pub type ProtocolResult<T> = Result<T, ProtocolError>;

/// Errors that can occur while building or decoding queued changes.
#[derive(Debug, Error)]
pub enum ProtocolError {
    /// JSON encoding or decoding failed.
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    /// A change violates a structural precondition.
    #[error("invalid change: {0}")]
    InvalidChange(String),
}

impl ProtocolError {
    /// Creates an invalid change error.
    pub fn invalid_change(message: impl Into<String>) -> Self {
        Self::InvalidChange(message.into())
    }
}

/// A failure reported by the remote data store for one change.
///
/// The offline engine never inspects `kind`; every failure means
/// "retain and retry later".
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct RemoteError {
    /// Human-readable failure description.
    pub message: String,
    /// Optional machine-readable failure kind (e.g. `"conflict"`).
    pub kind: Option<String>,
}

impl RemoteError {
    /// Creates a failure without a kind.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            kind: None,
        }
    }

    /// Creates a failure with a machine-readable kind.
    pub fn with_kind(message: impl Into<String>, kind: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            kind: Some(kind.into()),
        }
    }

    /// Creates a network failure.
    pub fn network(message: impl Into<String>) -> Self {
        Self::with_kind(message, "network")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn remote_error_display() {
        let err = RemoteError::with_kind("duplicate key", "conflict");
        assert_eq!(err.to_string(), "duplicate key");
        assert_eq!(err.kind.as_deref(), Some("conflict"));

        assert_eq!(RemoteError::network("timed out").kind.as_deref(), Some("network"));
        assert!(RemoteError::new("boom").kind.is_none());
    }

    #[test]
    fn invalid_change_display() {
        let err = ProtocolError::invalid_change("table name is empty");
        assert_eq!(err.to_string(), "invalid change: table name is empty");
    }
}
