//! In-memory key/value store for testing.

use crate::backend::KeyValueStore;
use crate::error::StorageResult;
use parking_lot::RwLock;
use std::collections::HashMap;

/// An in-memory key/value store.
///
/// This store keeps all blobs in memory and is suitable for:
/// - Unit tests
/// - Integration tests that simulate a restart by reopening an engine
///   over the same store
/// - Ephemeral queues that don't need persistence
///
/// # Thread Safety
///
/// This store is thread-safe and can be shared across threads.
///
/// # Example
///
/// ```rust
/// use offsync_storage::{InMemoryStore, KeyValueStore};
///
/// let store = InMemoryStore::with_entry("queue", "not json");
/// assert_eq!(store.load("queue").unwrap().as_deref(), Some("not json"));
/// ```
#[derive(Debug, Default)]
pub struct InMemoryStore {
    entries: RwLock<HashMap<String, String>>,
}

impl InMemoryStore {
    /// Creates a new empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a store seeded with one blob.
    ///
    /// Useful for testing recovery from corrupted or legacy data.
    #[must_use]
    pub fn with_entry(key: impl Into<String>, value: impl Into<String>) -> Self {
        let store = Self::new();
        store.entries.write().insert(key.into(), value.into());
        store
    }

    /// Returns true if a blob exists under `key`.
    #[must_use]
    pub fn contains(&self, key: &str) -> bool {
        self.entries.read().contains_key(key)
    }

    /// Returns the stored keys, sorted.
    #[must_use]
    pub fn keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = self.entries.read().keys().cloned().collect();
        keys.sort();
        keys
    }
}

impl KeyValueStore for InMemoryStore {
    fn load(&self, key: &str) -> StorageResult<Option<String>> {
        Ok(self.entries.read().get(key).cloned())
    }

    fn save(&self, key: &str, value: &str) -> StorageResult<()> {
        self.entries
            .write()
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> StorageResult<()> {
        self.entries.write().remove(key);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn memory_new_is_empty() {
        let store = InMemoryStore::new();
        assert!(store.keys().is_empty());
        assert!(store.load("anything").unwrap().is_none());
    }

    #[test]
    fn memory_save_and_load() {
        let store = InMemoryStore::new();
        store.save("a", "hello").unwrap();
        assert_eq!(store.load("a").unwrap().as_deref(), Some("hello"));
    }

    #[test]
    fn memory_save_replaces() {
        let store = InMemoryStore::new();
        store.save("a", "first").unwrap();
        store.save("a", "second").unwrap();
        assert_eq!(store.load("a").unwrap().as_deref(), Some("second"));
        assert_eq!(store.keys(), vec!["a".to_string()]);
    }

    #[test]
    fn memory_remove() {
        let store = InMemoryStore::with_entry("a", "x");
        assert!(store.contains("a"));
        store.remove("a").unwrap();
        assert!(!store.contains("a"));

        // Removing again is fine
        store.remove("a").unwrap();
    }

    #[test]
    fn memory_shared_through_arc() {
        let store = std::sync::Arc::new(InMemoryStore::new());
        let handle = std::sync::Arc::clone(&store);
        handle.save("k", "v").unwrap();
        assert_eq!(store.load("k").unwrap().as_deref(), Some("v"));
    }
}
