//! Errors raised by the core data model.

/// Error type for core operations.
pub type Result<T> = std::result::Result<T, CoreError>;

/// Errors that can occur while building core values.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CoreError {
    /// A date string was not a valid `YYYY-MM-DD` calendar day
    #[error("Invalid date '{0}': expected YYYY-MM-DD")]
    InvalidDate(String),

    /// A goal id was empty
    #[error("Invalid goal id '{0}'")]
    InvalidGoalId(String),

    /// Snapshot counts violate `completed <= total`
    #[error("Invalid snapshot: completed ({completed}) exceeds total ({total})")]
    InvalidSnapshot {
        /// Completed task count
        completed: u32,
        /// Total task count
        total: u32,
    },
}
