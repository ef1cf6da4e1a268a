//! Queued changes.

use crate::error::{ProtocolError, ProtocolResult};
use crate::operation::{Mutation, OperationKind};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Local identifier of a queued change.
///
/// Used only for bookkeeping; it is never sent to the remote store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ChangeId(Uuid);

impl ChangeId {
    /// Generates a fresh random identifier.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Wraps an existing UUID.
    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Returns the underlying UUID.
    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for ChangeId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ChangeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// One pending mutation.
///
/// # Fields
///
/// - `id`: local identifier, generated at enqueue time
/// - `table`: target collection in the remote store
/// - `mutation`: what to do, flattened into the record on the wire
/// - `timestamp`: creation time, for diagnostics only; replay order is
///   queue order
/// - `attempts`: flush passes in which the remote store rejected this change
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueuedChange {
    /// Local identifier.
    pub id: ChangeId,
    /// Target table.
    pub table: String,
    /// The mutation to apply.
    #[serde(flatten)]
    pub mutation: Mutation,
    /// Creation time.
    pub timestamp: DateTime<Utc>,
    /// Failed dispatch count.
    #[serde(default)]
    pub attempts: u32,
}

impl QueuedChange {
    /// Creates a change with a fresh id stamped with the current time.
    ///
    /// # Errors
    ///
    /// Returns [`ProtocolError::InvalidChange`] if the table name is empty
    /// or the mutation fails [`Mutation::validate`].
    pub fn new(table: impl Into<String>, mutation: Mutation) -> ProtocolResult<Self> {
        let table = table.into();
        if table.trim().is_empty() {
            return Err(ProtocolError::invalid_change("table name is empty"));
        }
        mutation.validate()?;

        Ok(Self {
            id: ChangeId::new(),
            table,
            mutation,
            timestamp: Utc::now(),
            attempts: 0,
        })
    }

    /// Returns the operation kind.
    pub fn operation(&self) -> OperationKind {
        self.mutation.kind()
    }

    /// Records one failed dispatch and returns the new attempt count.
    pub fn record_failure(&mut self) -> u32 {
        self.attempts = self.attempts.saturating_add(1);
        self.attempts
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::operation::{Row, RowFilter};
    use serde_json::json;

    #[test]
    fn new_assigns_unique_ids() {
        let a = QueuedChange::new("notes", Mutation::insert(Row::new())).unwrap();
        let b = QueuedChange::new("notes", Mutation::insert(Row::new())).unwrap();
        assert_ne!(a.id, b.id);
        assert_eq!(a.attempts, 0);
        assert_eq!(a.operation(), OperationKind::Insert);
    }

    #[test]
    fn new_rejects_empty_table() {
        let result = QueuedChange::new(" ", Mutation::insert(Row::new()));
        assert!(matches!(result, Err(ProtocolError::InvalidChange(_))));
    }

    #[test]
    fn new_rejects_empty_filter_column() {
        let result = QueuedChange::new("notes", Mutation::delete(RowFilter::eq("", "abc")));
        assert!(matches!(result, Err(ProtocolError::InvalidChange(_))));
    }

    #[test]
    fn serialized_record_is_flat() {
        let change = QueuedChange::new("notes", Mutation::delete(RowFilter::eq("id", "abc")))
            .unwrap();
        let value = serde_json::to_value(&change).unwrap();

        assert_eq!(value["table"], json!("notes"));
        assert_eq!(value["operation"], json!("delete"));
        assert_eq!(value["filter"], json!({"column": "id", "value": "abc"}));
        assert_eq!(value["id"], json!(change.id.to_string()));
        assert!(value.get("data").is_none());
    }

    #[test]
    fn missing_attempts_defaults_to_zero() {
        let change: QueuedChange = serde_json::from_value(json!({
            "id": "6f1c2a0e-8d3b-4e55-9b8f-2f4d1c0a9e11",
            "table": "notes",
            "operation": "insert",
            "data": {"text": "hi"},
            "timestamp": "2024-03-01T10:00:00Z"
        }))
        .unwrap();

        assert_eq!(change.attempts, 0);
        assert_eq!(change.table, "notes");
        assert_eq!(change.mutation.data().unwrap()["text"], json!("hi"));
    }

    #[test]
    fn record_failure_counts() {
        let mut change = QueuedChange::new("notes", Mutation::insert(Row::new())).unwrap();
        assert_eq!(change.record_failure(), 1);
        assert_eq!(change.record_failure(), 2);
        assert_eq!(change.attempts, 2);
    }
}
