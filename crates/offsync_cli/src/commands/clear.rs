//! Clear command implementation.

use offsync_engine::QueueStore;
use offsync_storage::FileStore;

/// Runs the clear command.
///
/// Removes the stored blob even if it does not decode.
pub fn run(store: &QueueStore<FileStore>) -> Result<(), Box<dyn std::error::Error>> {
    let discarded = match store.try_load() {
        Ok(changes) => changes.map(|c| c.len()),
        Err(e) => {
            tracing::warn!(key = store.key(), error = %e, "clearing unreadable queue");
            None
        }
    };

    store.clear()?;

    match discarded {
        Some(n) => println!("Cleared {}: {} changes discarded", store.key(), n),
        None => println!("Cleared {}", store.key()),
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use offsync_protocol::{Mutation, QueuedChange, Row};

    #[test]
    fn clear_removes_queue() {
        let dir = tempfile::tempdir().unwrap();
        let store = QueueStore::new(FileStore::open(dir.path()).unwrap(), "offline-queue");
        store
            .save(&[QueuedChange::new("notes", Mutation::insert(Row::new())).unwrap()])
            .unwrap();

        run(&store).unwrap();
        assert!(store.try_load().unwrap().is_none());
    }

    #[test]
    fn clear_removes_corrupt_queue() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("offline-queue.json"), "garbage").unwrap();
        let store = QueueStore::new(FileStore::open(dir.path()).unwrap(), "offline-queue");

        run(&store).unwrap();
        assert!(!dir.path().join("offline-queue.json").exists());
    }

    #[test]
    fn clear_missing_queue_is_ok() {
        let dir = tempfile::tempdir().unwrap();
        let store = QueueStore::new(FileStore::open(dir.path()).unwrap(), "offline-queue");
        run(&store).unwrap();
    }
}
