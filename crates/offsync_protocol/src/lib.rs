//! # Offsync Protocol
//!
//! Queued change model and JSON codec for offsync.
//!
//! This crate provides:
//! - [`Mutation`], a tagged union over insert / update / delete, so that
//!   update and delete always carry a [`RowFilter`]
//! - [`QueuedChange`], one buffered write destined for the remote store
//! - [`RemoteError`], the structured failure a remote store reports
//! - JSON encoding/decoding of a whole queue ([`encode_queue`],
//!   [`decode_queue`])
//!
//! This is a pure data crate with no I/O operations.

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod change;
mod codec;
mod error;
mod operation;

pub use change::{ChangeId, QueuedChange};
pub use codec::{decode_queue, encode_queue};
pub use error::{ProtocolError, ProtocolResult, RemoteError};
pub use operation::{Mutation, OperationKind, Row, RowFilter};
