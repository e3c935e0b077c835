//! Snapshot storage for goalpace.
//!
//! This crate provides a repository trait for per-goal snapshot histories
//! with a JSON file implementation and an in-memory one.

#![warn(missing_docs)]

pub mod trait_;
pub mod json_storage;
pub mod memory;

pub use trait_::{SnapshotStore, StorageError, Result, MAX_RECORD_ATTEMPTS};
pub use json_storage::JsonSnapshotStore;
pub use memory::MemorySnapshotStore;
