//! Key/value store trait definition.

use crate::error::StorageResult;

/// A durable key → string blob store.
///
/// Stores are **opaque**. They keep whole blobs under string keys and never
/// look inside them; the queue layer owns all serialization.
///
/// # Invariants
///
/// - `load` returns exactly the blob last passed to `save` for that key
/// - `load` returns `None` for a key that was never saved or was removed
/// - `save` replaces the previous blob atomically: a reader never observes
///   a partially written value
/// - `remove` on a missing key succeeds
/// - Stores must be `Send + Sync` and take `&self`, using interior locking
///
/// # Implementors
///
/// - [`super::InMemoryStore`] - For testing
/// - [`super::FileStore`] - For persistent storage
pub trait KeyValueStore: Send + Sync {
    /// Loads the blob stored under `key`.
    ///
    /// # Errors
    ///
    /// Returns an error if the key is invalid, the blob is not valid text,
    /// or an I/O error occurs.
    fn load(&self, key: &str) -> StorageResult<Option<String>>;

    /// Stores `value` under `key`, replacing any previous blob.
    ///
    /// # Errors
    ///
    /// Returns an error if the key is invalid or an I/O error occurs.
    fn save(&self, key: &str, value: &str) -> StorageResult<()>;

    /// Removes the blob stored under `key`.
    ///
    /// # Errors
    ///
    /// Returns an error if the key is invalid or an I/O error occurs.
    fn remove(&self, key: &str) -> StorageResult<()>;
}

impl<S: KeyValueStore + ?Sized> KeyValueStore for std::sync::Arc<S> {
    fn load(&self, key: &str) -> StorageResult<Option<String>> {
        (**self).load(key)
    }

    fn save(&self, key: &str, value: &str) -> StorageResult<()> {
        (**self).save(key, value)
    }

    fn remove(&self, key: &str) -> StorageResult<()> {
        (**self).remove(key)
    }
}
