//! JSON encoding of a whole queue.
//!
//! A queue is stored as one JSON array of flat change records, in queue
//! order. Decoding never reorders.

use crate::change::QueuedChange;
use crate::error::ProtocolResult;

/// Encodes changes to a JSON array, preserving order.
///
/// # Errors
///
/// Returns [`crate::ProtocolError::Json`] if a value cannot be serialized.
pub fn encode_queue(changes: &[QueuedChange]) -> ProtocolResult<String> {
    Ok(serde_json::to_string(changes)?)
}

/// Decodes a JSON array of change records.
///
/// # Errors
///
/// Returns [`crate::ProtocolError::Json`] if the text is not a valid array
/// of change records.
pub fn decode_queue(text: &str) -> ProtocolResult<Vec<QueuedChange>> {
    Ok(serde_json::from_str(text)?)
}
