//! Snapshot repository abstraction.

use std::time::Duration;

use async_trait::async_trait;
use goalpace_core::{CoreError, GoalId, History, Snapshot};
use tracing::{info, warn};

/// Error type for storage operations.
pub type Result<T> = std::result::Result<T, StorageError>;

/// How many times `record_snapshot` retries after losing a version race.
pub const MAX_RECORD_ATTEMPTS: usize = 5;

/// Base delay between `record_snapshot` retries, scaled by attempt number.
const RETRY_BACKOFF: Duration = Duration::from_millis(10);

/// Errors that can occur during storage operations.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Invalid snapshot or date
    #[error(transparent)]
    Core(#[from] CoreError),

    /// Another writer saved the history since it was read
    #[error("Version conflict on goal {goal}: expected {expected}, found {found}")]
    Conflict {
        /// Goal being written
        goal: GoalId,
        /// Version the writer read
        expected: u64,
        /// Version currently stored
        found: u64,
    },

    /// Other error
    #[error("{0}")]
    Other(String),
}

/// Repository for per-goal snapshot histories.
///
/// Implementations must return histories sorted ascending by date with at
/// most one snapshot per date, and must reject a save whose
/// `expected_version` no longer matches the stored version.
#[async_trait]
pub trait SnapshotStore: Send + Sync {
    /// Load a goal's history. Unknown goals yield an empty history at version 0.
    async fn load_history(&self, goal_id: &GoalId) -> Result<History>;

    /// Replace a goal's history if it is still at `expected_version`.
    ///
    /// Returns the new version.
    async fn save_history(
        &self,
        goal_id: &GoalId,
        snapshots: &[Snapshot],
        expected_version: u64,
    ) -> Result<u64>;

    /// List goals that have at least one stored snapshot.
    async fn list_goals(&self) -> Result<Vec<GoalId>>;

    /// Append a snapshot, or overwrite the one already stored for its date.
    ///
    /// Read-modify-write guarded by the version check; a lost race is
    /// retried against the fresh history with a growing delay. Stores that
    /// can hold their write lock across the whole sequence override this.
    async fn record_snapshot(&self, goal_id: &GoalId, snapshot: Snapshot) -> Result<History> {
        let mut attempt = 0;
        loop {
            attempt += 1;
            let mut history = self.load_history(goal_id).await?;
            let replaced = history.upsert(snapshot);

            match self
                .save_history(goal_id, &history.snapshots, history.version)
                .await
            {
                Ok(version) => {
                    history.version = version;
                    info!(
                        "Recorded snapshot for goal {} on {} ({})",
                        goal_id,
                        snapshot.date,
                        if replaced { "overwrote" } else { "appended" }
                    );
                    return Ok(history);
                }
                Err(StorageError::Conflict { expected, found, .. })
                    if attempt < MAX_RECORD_ATTEMPTS =>
                {
                    warn!(
                        "Version conflict recording goal {} (expected {}, found {}), retrying",
                        goal_id, expected, found
                    );
                    tokio::time::sleep(RETRY_BACKOFF * attempt as u32).await;
                }
                Err(e) => return Err(e),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::MemorySnapshotStore;
    use chrono::NaiveDate;
    use goalpace_core::SnapshotCounts;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Rejects the first `conflicts` saves as if another writer got there first.
    struct ContendedStore {
        inner: MemorySnapshotStore,
        conflicts: AtomicUsize,
        saves: AtomicUsize,
    }

    impl ContendedStore {
        fn new(conflicts: usize) -> Self {
            Self {
                inner: MemorySnapshotStore::new(),
                conflicts: AtomicUsize::new(conflicts),
                saves: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl SnapshotStore for ContendedStore {
        async fn load_history(&self, goal_id: &GoalId) -> Result<History> {
            self.inner.load_history(goal_id).await
        }

        async fn save_history(
            &self,
            goal_id: &GoalId,
            snapshots: &[Snapshot],
            expected_version: u64,
        ) -> Result<u64> {
            self.saves.fetch_add(1, Ordering::SeqCst);
            let remaining = self.conflicts.load(Ordering::SeqCst);
            if remaining > 0 {
                self.conflicts.store(remaining - 1, Ordering::SeqCst);
                return Err(StorageError::Conflict {
                    goal: goal_id.clone(),
                    expected: expected_version,
                    found: expected_version + 1,
                });
            }
            self.inner.save_history(goal_id, snapshots, expected_version).await
        }

        async fn list_goals(&self) -> Result<Vec<GoalId>> {
            self.inner.list_goals().await
        }
    }

    fn snap() -> Snapshot {
        Snapshot::new(
            NaiveDate::from_ymd_opt(2024, 5, 1).unwrap(),
            SnapshotCounts::new(2, 4),
        )
        .unwrap()
    }

    #[tokio::test]
    async fn test_record_retries_after_conflict() {
        let store = ContendedStore::new(2);
        let goal = GoalId::new("g");

        let history = store.record_snapshot(&goal, snap()).await.unwrap();
        assert_eq!(history.len(), 1);
        assert_eq!(history.version, 1);
        assert_eq!(store.saves.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_record_gives_up_after_max_attempts() {
        let store = ContendedStore::new(MAX_RECORD_ATTEMPTS);
        let goal = GoalId::new("g");

        let err = store.record_snapshot(&goal, snap()).await.unwrap_err();
        assert!(matches!(err, StorageError::Conflict { .. }));
        assert_eq!(store.saves.load(Ordering::SeqCst), MAX_RECORD_ATTEMPTS);
        assert!(store.inner.load_history(&goal).await.unwrap().is_empty());
    }
}
