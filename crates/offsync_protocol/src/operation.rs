//! Mutations and row predicates.

use crate::error::{ProtocolError, ProtocolResult};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

/// A mapping of field name to value.
pub type Row = serde_json::Map<String, Value>;

/// Kind of mutation, without its payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OperationKind {
    /// A new row.
    Insert,
    /// A partial patch of an existing row.
    Update,
    /// Removal of an existing row.
    Delete,
}

impl OperationKind {
    /// Returns the lowercase wire name.
    pub fn as_str(&self) -> &'static str {
        match self {
            OperationKind::Insert => "insert",
            OperationKind::Update => "update",
            OperationKind::Delete => "delete",
        }
    }

    /// Returns true if the operation targets an existing row.
    pub fn requires_filter(&self) -> bool {
        matches!(self, OperationKind::Update | OperationKind::Delete)
    }
}

impl fmt::Display for OperationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An equality predicate identifying the target row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RowFilter {
    /// Column to compare.
    pub column: String,
    /// Value the column must equal.
    pub value: Value,
}

impl RowFilter {
    /// Creates a `column = value` predicate.
    pub fn eq(column: impl Into<String>, value: impl Into<Value>) -> Self {
        Self {
            column: column.into(),
            value: value.into(),
        }
    }
}

impl fmt::Display for RowFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} = {}", self.column, self.value)
    }
}

/// A mutation destined for one table of the remote store.
///
/// Update and delete carry a [`RowFilter`] by construction. Serialized
/// form is flat and tagged by `operation`:
///
/// ```json
/// {"operation": "update", "data": {"text": "hi"}, "filter": {"column": "id", "value": "abc"}}
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "operation", rename_all = "lowercase")]
pub enum Mutation {
    /// Insert `data` as a new row.
    Insert {
        /// The full new row.
        data: Row,
    },
    /// Apply `data` as a patch to rows matching `filter`.
    Update {
        /// The fields to change.
        data: Row,
        /// The target row.
        filter: RowFilter,
    },
    /// Remove rows matching `filter`.
    Delete {
        /// The target row.
        filter: RowFilter,
    },
}

impl Mutation {
    /// Creates an insert.
    pub fn insert(data: Row) -> Self {
        Mutation::Insert { data }
    }

    /// Creates an update.
    pub fn update(data: Row, filter: RowFilter) -> Self {
        Mutation::Update { data, filter }
    }

    /// Creates a delete.
    pub fn delete(filter: RowFilter) -> Self {
        Mutation::Delete { filter }
    }

    /// Returns the operation kind.
    pub fn kind(&self) -> OperationKind {
        match self {
            Mutation::Insert { .. } => OperationKind::Insert,
            Mutation::Update { .. } => OperationKind::Update,
            Mutation::Delete { .. } => OperationKind::Delete,
        }
    }

    /// Returns the row payload, if the operation has one.
    pub fn data(&self) -> Option<&Row> {
        match self {
            Mutation::Insert { data } | Mutation::Update { data, .. } => Some(data),
            Mutation::Delete { .. } => None,
        }
    }

    /// Returns the target predicate, if the operation has one.
    pub fn filter(&self) -> Option<&RowFilter> {
        match self {
            Mutation::Insert { .. } => None,
            Mutation::Update { filter, .. } | Mutation::Delete { filter } => Some(filter),
        }
    }

    /// Checks the structural preconditions the type cannot express.
    ///
    /// # Errors
    ///
    /// Returns [`ProtocolError::InvalidChange`] if a filter names an empty
    /// column.
    pub fn validate(&self) -> ProtocolResult<()> {
        if let Some(filter) = self.filter() {
            if filter.column.trim().is_empty() {
                return Err(ProtocolError::invalid_change(format!(
                    "{} filter has an empty column",
                    self.kind()
                )));
            }
        }
        Ok(())
    }
}
