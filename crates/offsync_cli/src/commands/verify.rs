//! Verify command implementation.

use offsync_engine::QueueStore;
use offsync_storage::FileStore;
use std::collections::HashSet;

/// Verification result for one stored queue.
#[derive(Debug)]
pub struct VerifyResult {
    /// Storage key.
    pub key: String,
    /// Whether a blob is stored under the key.
    pub present: bool,
    /// Number of records checked.
    pub records_checked: usize,
    /// Number of valid records.
    pub valid_records: usize,
    /// List of errors found.
    pub errors: Vec<String>,
}

impl VerifyResult {
    fn new(key: &str) -> Self {
        Self {
            key: key.to_string(),
            present: false,
            records_checked: 0,
            valid_records: 0,
            errors: Vec::new(),
        }
    }

    /// Returns true if nothing is wrong with the stored queue.
    pub fn is_ok(&self) -> bool {
        self.errors.is_empty()
    }
}

/// Checks one stored queue without modifying it.
pub fn verify(store: &QueueStore<FileStore>) -> VerifyResult {
    let mut result = VerifyResult::new(store.key());

    let changes = match store.try_load() {
        Ok(Some(changes)) => changes,
        Ok(None) => return result,
        Err(e) => {
            result.present = true;
            result.errors.push(format!("Unreadable queue: {}", e));
            return result;
        }
    };
    result.present = true;

    let mut seen = HashSet::new();
    for (i, change) in changes.iter().enumerate() {
        result.records_checked += 1;

        if !seen.insert(change.id) {
            result
                .errors
                .push(format!("Duplicate id {} at position {}", change.id, i + 1));
            continue;
        }

        if change.table.is_empty() {
            result
                .errors
                .push(format!("Empty table name at position {}", i + 1));
            continue;
        }

        match change.mutation.validate() {
            Ok(()) => result.valid_records += 1,
            Err(e) => result
                .errors
                .push(format!("Invalid change at position {}: {}", i + 1, e)),
        }
    }

    result
}

/// Runs the verify command.
pub fn run(stores: &[&QueueStore<FileStore>]) -> Result<(), Box<dyn std::error::Error>> {
    let mut ok = true;

    for store in stores {
        let result = verify(store);
        print_result(&result);
        ok &= result.is_ok();
    }

    println!();
    if ok {
        println!("✓ Queue verification passed");
        Ok(())
    } else {
        println!("✗ Queue verification failed");
        Err("Verification failed".into())
    }
}

fn print_result(result: &VerifyResult) {
    if !result.present {
        println!("{}: not present", result.key);
        return;
    }

    println!(
        "{}: {} records checked, {} valid",
        result.key, result.records_checked, result.valid_records
    );
    for error in &result.errors {
        println!("  - {}", error);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use offsync_protocol::{Mutation, QueuedChange, RowFilter};

    fn open(dir: &tempfile::TempDir) -> QueueStore<FileStore> {
        QueueStore::new(FileStore::open(dir.path()).unwrap(), "offline-queue")
    }

    #[test]
    fn absent_queue_passes() {
        let dir = tempfile::tempdir().unwrap();
        let result = verify(&open(&dir));
        assert!(!result.present);
        assert!(result.is_ok());
    }

    #[test]
    fn valid_queue_passes() {
        let dir = tempfile::tempdir().unwrap();
        let store = open(&dir);
        let change = QueuedChange::new("notes", Mutation::delete(RowFilter::eq("id", 1))).unwrap();
        store.save(&[change]).unwrap();

        let result = verify(&store);
        assert!(result.is_ok());
        assert_eq!(result.valid_records, 1);
    }

    #[test]
    fn corrupt_queue_fails_and_is_kept() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("offline-queue.json");
        std::fs::write(&path, "[{").unwrap();

        let result = verify(&open(&dir));
        assert!(!result.is_ok());
        assert!(path.exists());
    }

    #[test]
    fn duplicate_ids_fail() {
        let dir = tempfile::tempdir().unwrap();
        let store = open(&dir);
        let change = QueuedChange::new("notes", Mutation::delete(RowFilter::eq("id", 1))).unwrap();
        store.save(&[change.clone(), change]).unwrap();

        let result = verify(&store);
        assert_eq!(result.records_checked, 2);
        assert_eq!(result.valid_records, 1);
        assert_eq!(result.errors.len(), 1);
    }
}
