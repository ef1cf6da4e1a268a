//! Persisted queue format vectors.
//!
//! Fixed blobs in the on-disk queue format. Hosts in other languages that
//! read or write the same store key are expected to agree on these.

use serde::{Deserialize, Serialize};

/// A stored blob and what decoding it must produce.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueueVector {
    /// Unique identifier for this vector.
    pub id: String,
    /// Human-readable description.
    pub description: String,
    /// The stored text.
    pub blob: String,
    /// Expected `(table, operation)` per change, in order. `None` if the
    /// blob must be rejected.
    pub expected: Option<Vec<(String, String)>>,
}

fn vector(
    id: &str,
    description: &str,
    blob: &str,
    expected: Option<&[(&str, &str)]>,
) -> QueueVector {
    QueueVector {
        id: id.into(),
        description: description.into(),
        blob: blob.into(),
        expected: expected.map(|pairs| {
            pairs
                .iter()
                .map(|(t, o)| (t.to_string(), o.to_string()))
                .collect()
        }),
    }
}

/// Queue format vectors.
pub fn queue_format_vectors() -> Vec<QueueVector> {
    vec![
        vector("empty_array", "An empty array is an empty queue", "[]", Some(&[])),
        vector(
            "single_insert",
            "One insert with row data",
            r#"[{"id":"6f1c2d4e-8a3b-4c5d-9e7f-0a1b2c3d4e5f","table":"notes","operation":"insert","data":{"title":"hello"},"timestamp":"2024-03-01T12:00:00Z"}]"#,
            Some(&[("notes", "insert")]),
        ),
        vector(
            "mixed_in_order",
            "Insert, update and delete keep their stored order",
            concat!(
                r#"[{"id":"00000000-0000-4000-8000-000000000001","table":"notes","operation":"insert","data":{"title":"a"},"timestamp":"2024-03-01T12:00:00Z","attempts":0},"#,
                r#"{"id":"00000000-0000-4000-8000-000000000002","table":"notes","operation":"update","data":{"title":"b"},"filter":{"column":"id","value":7},"timestamp":"2024-03-01T12:00:01Z","attempts":2},"#,
                r#"{"id":"00000000-0000-4000-8000-000000000003","table":"tags","operation":"delete","filter":{"column":"id","value":"x"},"timestamp":"2024-03-01T12:00:02Z"}]"#
            ),
            Some(&[("notes", "insert"), ("notes", "update"), ("tags", "delete")]),
        ),
        vector("not_json", "Truncated text is rejected", r#"[{"id":"#, None),
        vector("object_root", "A root object is rejected", r#"{"changes":[]}"#, None),
        vector(
            "unknown_operation",
            "An unknown operation tag is rejected",
            r#"[{"id":"00000000-0000-4000-8000-000000000001","table":"notes","operation":"upsert","data":{},"timestamp":"2024-03-01T12:00:00Z"}]"#,
            None,
        ),
        vector(
            "delete_without_filter",
            "A delete without a filter is rejected",
            r#"[{"id":"00000000-0000-4000-8000-000000000001","table":"notes","operation":"delete","timestamp":"2024-03-01T12:00:00Z"}]"#,
            None,
        ),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use offsync_protocol::decode_queue;

    #[test]
    fn vectors_decode_as_expected() {
        for v in queue_format_vectors() {
            let decoded = decode_queue(&v.blob);
            match (&v.expected, decoded) {
                (Some(expected), Ok(changes)) => {
                    let actual: Vec<(String, String)> = changes
                        .iter()
                        .map(|c| (c.table.clone(), c.operation().to_string()))
                        .collect();
                    assert_eq!(&actual, expected, "vector {}", v.id);
                }
                (None, Err(_)) => {}
                (expected, decoded) => {
                    panic!("vector {}: expected {:?}, got {:?}", v.id, expected, decoded)
                }
            }
        }
    }

    #[test]
    fn missing_attempts_default_to_zero() {
        let v = &queue_format_vectors()[1];
        let changes = decode_queue(&v.blob).unwrap();
        assert_eq!(changes[0].attempts, 0);
    }
}
