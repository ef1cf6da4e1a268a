//! Error types for the offline engine.

use offsync_protocol::ProtocolError;
use offsync_storage::StorageError;
use thiserror::Error;

/// Result type for engine operations.
pub type EngineResult<T> = Result<T, EngineError>;

/// Errors that can occur in the offline engine.
///
/// Remote-store failures never appear here: they are absorbed into the
/// retained queue and reported through the notifier.
#[derive(Error, Debug)]
pub enum EngineError {
    /// The durable store failed.
    #[error("storage error: {0}")]
    Storage(#[from] StorageError),

    /// A queue could not be encoded or decoded.
    #[error("protocol error: {0}")]
    Protocol(ProtocolError),

    /// The caller passed a structurally invalid mutation.
    #[error("invalid mutation: {0}")]
    InvalidMutation(String),
}

impl From<ProtocolError> for EngineError {
    fn from(err: ProtocolError) -> Self {
        match err {
            ProtocolError::InvalidChange(message) => EngineError::InvalidMutation(message),
            other => EngineError::Protocol(other),
        }
    }
}

impl EngineError {
    /// Returns true if the error is a caller precondition violation.
    pub fn is_precondition(&self) -> bool {
        matches!(self, EngineError::InvalidMutation(_))
    }
}
