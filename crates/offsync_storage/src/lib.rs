//! # Offsync Storage
//!
//! Durable key/value blob stores for offsync.
//!
//! This crate provides the lowest-level persistence abstraction used by the
//! offline queue. Stores are **opaque string stores** - they do not interpret
//! the blobs they hold.
//!
//! ## Design Principles
//!
//! - Stores are simple blob maps (load, save, remove)
//! - No knowledge of queue formats or serialization
//! - Must be `Send + Sync` so an engine can share one store
//! - A `save` is atomic from the caller's perspective
//!
//! ## Available Stores
//!
//! - [`InMemoryStore`] - For testing and ephemeral queues
//! - [`FileStore`] - One file per key in a directory, survives restarts
//!
//! ## Example
//!
//! ```rust
//! use offsync_storage::{InMemoryStore, KeyValueStore};
//!
//! let store = InMemoryStore::new();
//! store.save("offline-queue", "[]").unwrap();
//! assert_eq!(store.load("offline-queue").unwrap().as_deref(), Some("[]"));
//! store.remove("offline-queue").unwrap();
//! assert!(store.load("offline-queue").unwrap().is_none());
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod backend;
mod error;
mod file;
mod memory;

pub use backend::KeyValueStore;
pub use error::{StorageError, StorageResult};
pub use file::FileStore;
pub use memory::InMemoryStore;
