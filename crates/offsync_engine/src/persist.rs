//! Durable queue store.
//!
//! Mirrors a queue into one JSON blob under a fixed key. Pure data mapping:
//! it never reorders or edits the changes it is handed.

use crate::error::{EngineError, EngineResult};
use offsync_protocol::{decode_queue, encode_queue, QueuedChange};
use offsync_storage::{KeyValueStore, StorageError};
use tracing::{error, warn};

/// Serializes a queue to a [`KeyValueStore`].
///
/// # Invariants
///
/// - An empty queue is stored as an absent key, never as `[]`
/// - `load` treats absent, empty and undecodable blobs alike: as an empty
///   queue
/// - An undecodable blob is removed on load so the store heals itself
/// - A blob the store fails to read is never treated as empty
#[derive(Debug)]
pub struct QueueStore<S: KeyValueStore> {
    store: S,
    key: String,
}

impl<S: KeyValueStore> QueueStore<S> {
    /// Creates a queue store writing under `key`.
    pub fn new(store: S, key: impl Into<String>) -> Self {
        Self {
            store,
            key: key.into(),
        }
    }

    /// Returns the storage key.
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Returns the underlying key/value store.
    pub fn inner(&self) -> &S {
        &self.store
    }

    /// Persists the full sequence, removing the key when it is empty.
    ///
    /// # Errors
    ///
    /// Returns an error if encoding fails or the store cannot be written.
    pub fn save(&self, changes: &[QueuedChange]) -> EngineResult<()> {
        if changes.is_empty() {
            return self.clear();
        }

        let blob = encode_queue(changes)?;
        self.store.save(&self.key, &blob)?;
        Ok(())
    }

    /// Loads the persisted sequence, healing corruption.
    ///
    /// A missing blob yields an empty queue. A blob that does not decode is
    /// discarded and yields an empty queue.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::Storage`] if the store cannot be read. The blob
    /// is left untouched; callers must not overwrite it until a later load
    /// succeeds.
    pub fn load(&self) -> EngineResult<Vec<QueuedChange>> {
        match self.try_load() {
            Ok(changes) => Ok(changes.unwrap_or_default()),
            Err(EngineError::Protocol(err)) => {
                warn!(key = %self.key, error = %err, "discarding unreadable offline queue");
                self.discard();
                Ok(Vec::new())
            }
            Err(EngineError::Storage(StorageError::Corrupted { reason, .. })) => {
                warn!(key = %self.key, %reason, "discarding corrupted offline queue");
                self.discard();
                Ok(Vec::new())
            }
            Err(err) => {
                error!(key = %self.key, error = %err, "failed to read offline queue");
                Err(err)
            }
        }
    }

    fn discard(&self) {
        if let Err(e) = self.store.remove(&self.key) {
            error!(key = %self.key, error = %e, "failed to discard unreadable offline queue");
        }
    }

    /// Loads the persisted sequence without healing.
    ///
    /// Returns `Ok(None)` when nothing is stored. Used by tooling that needs
    /// to tell "empty" from "corrupt".
    ///
    /// # Errors
    ///
    /// Returns [`crate::EngineError::Protocol`] if the blob does not decode,
    /// or [`crate::EngineError::Storage`] if the store cannot be read.
    pub fn try_load(&self) -> EngineResult<Option<Vec<QueuedChange>>> {
        match self.store.load(&self.key)? {
            None => Ok(None),
            Some(blob) if blob.trim().is_empty() => Ok(None),
            Some(blob) => Ok(Some(decode_queue(&blob)?)),
        }
    }

    /// Removes the persisted blob.
    ///
    /// # Errors
    ///
    /// Returns an error if the store cannot be written.
    pub fn clear(&self) -> EngineResult<()> {
        self.store.remove(&self.key)?;
        Ok(())
    }
}
