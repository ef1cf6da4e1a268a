//! # Offsync Testkit
//!
//! Test utilities for offsync.
//!
//! This crate provides:
//! - Fixtures for temporary stores, sample changes and ready-made engines
//! - Property-based test generators using proptest
//! - Concurrent enqueue stress helpers
//! - Persisted queue format vectors
//!
//! ## Usage
//!
//! ```rust,ignore
//! use offsync_testkit::prelude::*;
//!
//! #[tokio::test]
//! async fn test_with_engine() {
//!     let engine = memory_engine(false);
//!     engine.enqueue("notes", note_insert("hello")).await.unwrap();
//!     assert_eq!(engine.pending_count(), 1);
//! }
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod fixtures;
pub mod generators;
pub mod stress;
pub mod vectors;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::fixtures::*;
    pub use crate::generators::*;
    pub use crate::stress::*;
    pub use crate::vectors::*;
}

pub use fixtures::*;
pub use generators::*;
pub use stress::*;
pub use vectors::*;
