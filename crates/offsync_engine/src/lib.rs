//! # Offsync Engine
//!
//! Offline mutation queue and sync driver.
//!
//! This crate provides:
//! - A durable, ordered queue of pending table mutations
//! - A connectivity monitor that reports edges, not levels
//! - A single-flight sync driver that replays the queue into a remote store
//! - Retry ceilings with a dead-letter list
//! - A REST adapter for row-oriented remote stores
//!
//! ## Architecture
//!
//! Writes made while offline are captured as [`QueuedChange`]s and appended
//! to a [`MutationQueue`], which persists the whole list through a
//! [`QueueStore`] after every change. When connectivity returns, or on
//! enqueue while online, the [`OfflineEngine`] flushes a snapshot of the
//! queue into a [`RemoteStore`] one change at a time, in order.
//!
//! ## Key Invariants
//!
//! - Queue order is enqueue order, across restarts
//! - At most one flush is in flight per engine
//! - A change leaves the queue only after the remote store acknowledged it
//! - Changes enqueued during a flush are picked up by exactly one follow-up
//! - The engine never surfaces sync failures to the caller of `enqueue`

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod config;
mod connectivity;
mod error;
mod notifier;
mod persist;
mod queue;
mod remote;
mod rest;
mod state;

pub use config::{EngineConfig, RetryPolicy, DEAD_LETTER_SUFFIX, DEFAULT_QUEUE_KEY};
pub use connectivity::{
    Connectivity, ConnectivityEdge, ConnectivityMonitor, ConnectivityProbe, StaticProbe,
};
pub use error::{EngineError, EngineResult};
pub use notifier::{Notification, Notifier, RecordingNotifier, Severity, TracingNotifier};
pub use persist::QueueStore;
pub use queue::MutationQueue;
pub use remote::{MockRemote, RemoteCall, RemoteStore};
pub use rest::{HttpClient, Method, RestRemote, RestRequest, RestResponse};
pub use state::{DriverState, EngineStats, FlushOutcome, OfflineEngine};

pub use offsync_protocol::{
    ChangeId, Mutation, OperationKind, QueuedChange, RemoteError, Row, RowFilter,
};
