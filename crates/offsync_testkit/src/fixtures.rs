//! Test fixtures and engine helpers.
//!
//! Provides convenience functions for setting up stores, sample changes
//! and engines wired to the mock remote store.

use offsync_engine::{
    EngineConfig, MockRemote, Mutation, OfflineEngine, QueuedChange, RecordingNotifier, Row,
    RowFilter, StaticProbe,
};
use offsync_storage::{FileStore, InMemoryStore, KeyValueStore, StorageResult};
use parking_lot::Mutex;
use serde_json::json;
use std::io;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tempfile::TempDir;

/// An engine wired to a mock remote, a shared in-memory store and a
/// recording notifier.
pub type MemoryEngine = OfflineEngine<MockRemote, Arc<InMemoryStore>, RecordingNotifier>;

/// An engine wired to a mock remote, a file store and a recording notifier.
pub type FileEngine = OfflineEngine<MockRemote, FileStore, RecordingNotifier>;

/// An engine wired to a mock remote, a [`FaultyStore`] and a recording
/// notifier.
pub type FaultyEngine = OfflineEngine<MockRemote, Arc<FaultyStore>, RecordingNotifier>;

/// An in-memory store that fails chosen operations with a permission error.
#[derive(Debug, Default)]
pub struct FaultyStore {
    inner: InMemoryStore,
    failing_loads: AtomicUsize,
    failing_save_key: Mutex<Option<String>>,
}

impl FaultyStore {
    /// Creates a new empty store that fails nothing.
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Makes the next `count` loads fail.
    pub fn fail_loads(&self, count: usize) {
        self.failing_loads.store(count, Ordering::SeqCst);
    }

    /// Makes every save under `key` fail until [`heal`](Self::heal).
    pub fn fail_saves_for(&self, key: impl Into<String>) {
        *self.failing_save_key.lock() = Some(key.into());
    }

    /// Stops failing anything.
    pub fn heal(&self) {
        self.failing_loads.store(0, Ordering::SeqCst);
        *self.failing_save_key.lock() = None;
    }

    /// Returns the underlying store, bypassing the faults.
    pub fn inner(&self) -> &InMemoryStore {
        &self.inner
    }

    fn denied() -> io::Error {
        io::Error::new(io::ErrorKind::PermissionDenied, "permission denied")
    }
}

impl KeyValueStore for FaultyStore {
    fn load(&self, key: &str) -> StorageResult<Option<String>> {
        let failing = self
            .failing_loads
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1));
        if failing.is_ok() {
            return Err(Self::denied().into());
        }
        self.inner.load(key)
    }

    fn save(&self, key: &str, value: &str) -> StorageResult<()> {
        if self.failing_save_key.lock().as_deref() == Some(key) {
            return Err(Self::denied().into());
        }
        self.inner.save(key, value)
    }

    fn remove(&self, key: &str) -> StorageResult<()> {
        self.inner.remove(key)
    }
}

/// A file store in a temporary directory with automatic cleanup.
pub struct TestStore {
    /// The store instance.
    pub store: FileStore,
    /// The temporary directory (kept alive to prevent cleanup).
    temp_dir: TempDir,
}

impl TestStore {
    /// Creates a new file store in a fresh temporary directory.
    pub fn new() -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let store = FileStore::open(temp_dir.path()).expect("Failed to open file store");
        Self { store, temp_dir }
    }

    /// Returns the store directory.
    pub fn path(&self) -> &Path {
        self.temp_dir.path()
    }

    /// Opens a second handle on the same directory, as a restarted
    /// process would.
    pub fn reopen(&self) -> FileStore {
        FileStore::open(self.temp_dir.path()).expect("Failed to reopen file store")
    }
}

impl Default for TestStore {
    fn default() -> Self {
        Self::new()
    }
}

impl std::ops::Deref for TestStore {
    type Target = FileStore;

    fn deref(&self) -> &Self::Target {
        &self.store
    }
}

/// Builds a row from `(column, value)` pairs.
pub fn row<I, K>(pairs: I) -> Row
where
    I: IntoIterator<Item = (K, serde_json::Value)>,
    K: Into<String>,
{
    pairs.into_iter().map(|(k, v)| (k.into(), v)).collect()
}

/// An insert of a note with the given title.
pub fn note_insert(title: &str) -> Mutation {
    Mutation::insert(row([("title", json!(title))]))
}

/// An update of note `id` to the given title.
pub fn note_update(id: i64, title: &str) -> Mutation {
    Mutation::update(row([("title", json!(title))]), RowFilter::eq("id", id))
}

/// A delete of note `id`.
pub fn note_delete(id: i64) -> Mutation {
    Mutation::delete(RowFilter::eq("id", id))
}

/// A queued update on `notes` tagged with `n`, for ordering checks.
pub fn sample_change(n: i64) -> QueuedChange {
    QueuedChange::new("notes", Mutation::update(row([("n", json!(n))]), RowFilter::eq("id", n)))
        .expect("sample change is valid")
}

/// Extracts the filter value of each recorded call as an integer, in call
/// order. Calls without an integer filter value are skipped.
pub fn filter_ids(remote: &MockRemote) -> Vec<i64> {
    remote
        .calls()
        .iter()
        .filter_map(|call| call.mutation.filter().and_then(|f| f.value.as_i64()))
        .collect()
}

/// Opens an engine over a fresh in-memory store.
pub fn memory_engine(online: bool) -> MemoryEngine {
    memory_engine_with(EngineConfig::new(), Arc::new(InMemoryStore::new()), online)
}

/// Opens an engine over `store` with `config`.
pub fn memory_engine_with(
    config: EngineConfig,
    store: Arc<InMemoryStore>,
    online: bool,
) -> MemoryEngine {
    OfflineEngine::open(
        config,
        MockRemote::new(),
        store,
        &StaticProbe(online),
        RecordingNotifier::new(),
    )
}

/// Opens an engine whose remote calls wait for [`MockRemote::release`].
pub fn gated_engine(config: EngineConfig, online: bool) -> MemoryEngine {
    OfflineEngine::open(
        config,
        MockRemote::gated(),
        Arc::new(InMemoryStore::new()),
        &StaticProbe(online),
        RecordingNotifier::new(),
    )
}

/// Opens an engine over a [`FaultyStore`].
pub fn faulty_engine(config: EngineConfig, store: Arc<FaultyStore>, online: bool) -> FaultyEngine {
    OfflineEngine::open(
        config,
        MockRemote::new(),
        store,
        &StaticProbe(online),
        RecordingNotifier::new(),
    )
}

/// Opens an engine over `store`.
pub fn file_engine(config: EngineConfig, store: FileStore, online: bool) -> FileEngine {
    OfflineEngine::open(
        config,
        MockRemote::new(),
        store,
        &StaticProbe(online),
        RecordingNotifier::new(),
    )
}
