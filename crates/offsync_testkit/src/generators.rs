//! Property-based test generators using proptest.
//!
//! Provides strategies for generating valid mutations and queued changes.

use offsync_protocol::{Mutation, QueuedChange, Row, RowFilter};
use proptest::prelude::*;
use serde_json::Value;

/// Strategy for generating valid table names.
pub fn table_name_strategy() -> impl Strategy<Value = String> {
    prop::string::string_regex("[a-z][a-z0-9_]{0,15}").expect("Invalid regex")
}

/// Strategy for generating valid column names.
pub fn column_strategy() -> impl Strategy<Value = String> {
    prop::string::string_regex("[a-z][a-z_]{0,11}").expect("Invalid regex")
}

/// Strategy for generating scalar JSON values.
pub fn scalar_strategy() -> impl Strategy<Value = Value> {
    prop_oneof![
        Just(Value::Null),
        any::<bool>().prop_map(Value::from),
        any::<i64>().prop_map(Value::from),
        prop::string::string_regex("[ -~]{0,24}")
            .expect("Invalid regex")
            .prop_map(Value::from),
    ]
}

/// Strategy for generating rows with up to eight columns.
pub fn row_strategy() -> impl Strategy<Value = Row> {
    prop::collection::btree_map(column_strategy(), scalar_strategy(), 0..8)
        .prop_map(|map| map.into_iter().collect())
}

/// Strategy for generating equality filters.
pub fn filter_strategy() -> impl Strategy<Value = RowFilter> {
    (column_strategy(), scalar_strategy()).prop_map(|(column, value)| RowFilter { column, value })
}

/// Strategy for generating valid mutations of every kind.
pub fn mutation_strategy() -> impl Strategy<Value = Mutation> {
    prop_oneof![
        row_strategy().prop_map(Mutation::insert),
        (row_strategy(), filter_strategy())
            .prop_map(|(data, filter)| Mutation::update(data, filter)),
        filter_strategy().prop_map(Mutation::delete),
    ]
}

/// Strategy for generating a valid queued change.
pub fn queued_change_strategy() -> impl Strategy<Value = QueuedChange> {
    (table_name_strategy(), mutation_strategy(), 0u32..5).prop_map(|(table, mutation, attempts)| {
        let mut change = QueuedChange::new(table, mutation).expect("generated change is valid");
        change.attempts = attempts;
        change
    })
}

/// Strategy for generating a queue of up to `max_len` changes.
pub fn queue_strategy(max_len: usize) -> impl Strategy<Value = Vec<QueuedChange>> {
    prop::collection::vec(queued_change_strategy(), 0..=max_len)
}

/// Strategy for generating a failure pattern: `true` marks a change the
/// remote store rejects.
pub fn failure_pattern_strategy(max_len: usize) -> impl Strategy<Value = Vec<bool>> {
    prop::collection::vec(any::<bool>(), 0..=max_len)
}

#[cfg(test)]
mod tests {
    use super::*;
    use offsync_protocol::{decode_queue, encode_queue};

    proptest! {
        #[test]
        fn generated_mutations_validate(mutation in mutation_strategy()) {
            prop_assert!(mutation.validate().is_ok());
        }

        #[test]
        fn generated_queues_survive_persistence(queue in queue_strategy(12)) {
            let text = encode_queue(&queue).unwrap();
            prop_assert_eq!(decode_queue(&text).unwrap(), queue);
        }

        #[test]
        fn table_names_are_nonempty(name in table_name_strategy()) {
            prop_assert!(!name.is_empty());
        }
    }
}
