//! Error types for storage operations.

use std::io;
use thiserror::Error;

/// Result type for storage operations.
pub type StorageResult<T> = Result<T, StorageError>;

/// Errors that can occur during storage operations.
#[derive(Debug, Error)]
pub enum StorageError {
    /// An I/O error occurred.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// A stored blob is not valid UTF-8 text.
    #[error("stored blob for key '{key}' is corrupted: {reason}")]
    Corrupted {
        /// The key whose blob could not be read.
        key: String,
        /// What was wrong with it.
        reason: String,
    },

    /// The key cannot be used with this store.
    #[error("invalid key: {0:?}")]
    InvalidKey(String),
}
