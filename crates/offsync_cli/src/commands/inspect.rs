//! Inspect command implementation.

use offsync_engine::QueueStore;
use offsync_protocol::QueuedChange;
use offsync_storage::FileStore;
use serde::Serialize;

/// Queue inspection result.
#[derive(Debug, Serialize)]
pub struct InspectResult {
    /// Storage key.
    pub key: String,
    /// File holding the queue.
    pub path: String,
    /// Number of pending changes.
    pub pending: usize,
    /// Pending changes per table, in first-seen order.
    pub tables: Vec<TableStats>,
    /// The changes, in replay order.
    pub changes: Vec<QueuedChange>,
}

/// Statistics for a single table.
#[derive(Debug, Serialize)]
pub struct TableStats {
    /// Table name.
    pub table: String,
    /// Number of pending changes.
    pub pending: usize,
}

/// Builds the inspection result without modifying the store.
pub fn inspect(store: &QueueStore<FileStore>) -> Result<InspectResult, Box<dyn std::error::Error>> {
    let path = store.inner().path_for(store.key())?;
    let changes = store.try_load()?.unwrap_or_default();

    let mut tables: Vec<TableStats> = Vec::new();
    for change in &changes {
        match tables.iter_mut().find(|t| t.table == change.table) {
            Some(stats) => stats.pending += 1,
            None => tables.push(TableStats {
                table: change.table.clone(),
                pending: 1,
            }),
        }
    }

    Ok(InspectResult {
        key: store.key().to_string(),
        path: path.display().to_string(),
        pending: changes.len(),
        tables,
        changes,
    })
}

/// Runs the inspect command.
pub fn run(store: &QueueStore<FileStore>, format: &str) -> Result<(), Box<dyn std::error::Error>> {
    let result = inspect(store)?;

    match format {
        "json" => {
            println!("{}", serde_json::to_string_pretty(&result)?);
        }
        "text" => print_text_output(&result),
        other => return Err(format!("Unknown format: {other}").into()),
    }

    Ok(())
}

fn print_text_output(result: &InspectResult) {
    println!("Queue: {}", result.key);
    println!("File: {}", result.path);
    println!("Pending: {}", result.pending);

    if result.changes.is_empty() {
        return;
    }

    println!();
    println!("Tables:");
    for stats in &result.tables {
        println!("  {:<24} {}", stats.table, stats.pending);
    }

    println!();
    println!("Changes:");
    for (i, change) in result.changes.iter().enumerate() {
        let filter = change
            .mutation
            .filter()
            .map(|f| format!(" where {f}"))
            .unwrap_or_default();
        println!(
            "  {:>4}  {}  {} {}{}  attempts={}  {}",
            i + 1,
            change.id,
            change.operation(),
            change.table,
            filter,
            change.attempts,
            change.timestamp.to_rfc3339(),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use offsync_protocol::{Mutation, RowFilter};

    #[test]
    fn inspect_counts_per_table() {
        let dir = tempfile::tempdir().unwrap();
        let store = QueueStore::new(FileStore::open(dir.path()).unwrap(), "offline-queue");
        let changes = vec![
            QueuedChange::new("notes", Mutation::delete(RowFilter::eq("id", 1))).unwrap(),
            QueuedChange::new("tags", Mutation::delete(RowFilter::eq("id", 2))).unwrap(),
            QueuedChange::new("notes", Mutation::delete(RowFilter::eq("id", 3))).unwrap(),
        ];
        store.save(&changes).unwrap();

        let result = inspect(&store).unwrap();
        assert_eq!(result.pending, 3);
        assert_eq!(result.changes, changes);
        assert_eq!(result.tables.len(), 2);
        assert_eq!(result.tables[0].table, "notes");
        assert_eq!(result.tables[0].pending, 2);
    }

    #[test]
    fn inspect_missing_queue_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = QueueStore::new(FileStore::open(dir.path()).unwrap(), "offline-queue");
        let result = inspect(&store).unwrap();
        assert_eq!(result.pending, 0);
        assert!(result.path.ends_with("offline-queue.json"));
    }

    #[test]
    fn inspect_does_not_heal_corrupt_queue() {
        let dir = tempfile::tempdir().unwrap();
        let store = QueueStore::new(FileStore::open(dir.path()).unwrap(), "offline-queue");
        std::fs::write(dir.path().join("offline-queue.json"), "not json").unwrap();

        assert!(inspect(&store).is_err());
        assert!(dir.path().join("offline-queue.json").exists());
    }
}
