//! goalpace core data models.
//!
//! This crate defines the snapshot time series that the analytics and
//! prediction engines read, plus the shared result and error types.

#![warn(missing_docs)]

// Core identities
mod id;

// Time series
mod snapshot;
pub mod date;

// Results and errors
mod outcome;
mod severity;
mod error;

// Re-exports
pub use id::GoalId;
pub use snapshot::{History, Snapshot, SnapshotCounts};
pub use outcome::Outcome;
pub use severity::Severity;
pub use error::{CoreError, Result};

/// Timestamp type
pub type Time = chrono::DateTime<chrono::Utc>;

/// Calendar day type
pub type Date = chrono::NaiveDate;
