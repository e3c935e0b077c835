//! In-memory snapshot store.
//!
//! Same semantics as the JSON store without touching the filesystem. Used by
//! tests and by callers embedding the engines.

use std::collections::BTreeMap;

use goalpace_core::{GoalId, History, Snapshot};
use tokio::sync::RwLock;
use tracing::info;

use super::{Result, SnapshotStore, StorageError};

/// Memory-backed snapshot store.
#[derive(Debug, Default)]
pub struct MemorySnapshotStore {
    goals: RwLock<BTreeMap<GoalId, (u64, Vec<Snapshot>)>>,
}

impl MemorySnapshotStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait::async_trait]
impl SnapshotStore for MemorySnapshotStore {
    async fn load_history(&self, goal_id: &GoalId) -> Result<History> {
        let goals = self.goals.read().await;
        Ok(match goals.get(goal_id) {
            Some((version, snapshots)) => {
                History::from_snapshots(goal_id.clone(), snapshots.clone(), *version)
            }
            None => History::empty(goal_id.clone()),
        })
    }

    async fn save_history(
        &self,
        goal_id: &GoalId,
        snapshots: &[Snapshot],
        expected_version: u64,
    ) -> Result<u64> {
        let mut goals = self.goals.write().await;
        let found = goals.get(goal_id).map(|(v, _)| *v).unwrap_or(0);
        if found != expected_version {
            return Err(StorageError::Conflict {
                goal: goal_id.clone(),
                expected: expected_version,
                found,
            });
        }

        let version = found + 1;
        goals.insert(goal_id.clone(), (version, snapshots.to_vec()));
        Ok(version)
    }

    async fn record_snapshot(&self, goal_id: &GoalId, snapshot: Snapshot) -> Result<History> {
        let mut goals = self.goals.write().await;
        let (version, snapshots) = goals.entry(goal_id.clone()).or_default();

        let mut history = History::from_snapshots(goal_id.clone(), snapshots.clone(), *version);
        let replaced = history.upsert(snapshot);
        *version += 1;
        *snapshots = history.snapshots.clone();
        history.version = *version;

        info!(
            "Recorded snapshot for goal {} on {} ({})",
            goal_id,
            snapshot.date,
            if replaced { "overwrote" } else { "appended" }
        );
        Ok(history)
    }

    async fn list_goals(&self) -> Result<Vec<GoalId>> {
        let goals = self.goals.read().await;
        Ok(goals
            .iter()
            .filter(|(_, (_, snapshots))| !snapshots.is_empty())
            .map(|(id, _)| id.clone())
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use goalpace_core::SnapshotCounts;

    fn snap(d: u32, completed: u32) -> Snapshot {
        Snapshot::new(
            NaiveDate::from_ymd_opt(2024, 1, d).unwrap(),
            SnapshotCounts::new(completed, 10),
        )
        .unwrap()
    }

    #[tokio::test]
    async fn test_record_same_day_overwrites() {
        let store = MemorySnapshotStore::new();
        let goal = GoalId::new("g");

        store.record_snapshot(&goal, snap(1, 1)).await.unwrap();
        let history = store.record_snapshot(&goal, snap(1, 5)).await.unwrap();

        assert_eq!(history.len(), 1);
        assert_eq!(history.version, 2);
        let reloaded = store.load_history(&goal).await.unwrap();
        assert_eq!(reloaded.len(), 1);
        assert_eq!(reloaded.snapshots[0].completed, 5);
    }

    #[tokio::test]
    async fn test_record_returns_sorted_history() {
        let store = MemorySnapshotStore::new();
        let goal = GoalId::new("g");

        store.record_snapshot(&goal, snap(3, 3)).await.unwrap();
        store.record_snapshot(&goal, snap(1, 1)).await.unwrap();
        let history = store.load_history(&goal).await.unwrap();

        assert_eq!(history.snapshots[0].completed, 1);
        assert_eq!(history.snapshots[1].completed, 3);
    }

    #[tokio::test]
    async fn test_stale_save_is_rejected() {
        let store = MemorySnapshotStore::new();
        let goal = GoalId::new("g");

        store.save_history(&goal, &[snap(1, 1)], 0).await.unwrap();
        let err = store.save_history(&goal, &[snap(1, 2)], 0).await.unwrap_err();
        assert!(matches!(err, StorageError::Conflict { expected: 0, found: 1, .. }));
    }

    #[tokio::test]
    async fn test_unknown_goal_is_empty() {
        let store = MemorySnapshotStore::new();
        let history = store.load_history(&GoalId::new("nope")).await.unwrap();
        assert!(history.is_empty());
        assert_eq!(history.version, 0);
        assert!(store.list_goals().await.unwrap().is_empty());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_recorders_all_persist() {
        let store = std::sync::Arc::new(MemorySnapshotStore::new());
        let goal = GoalId::new("g");
        let start = NaiveDate::from_ymd_opt(2024, 3, 1).unwrap();

        let handles: Vec<_> = (0..30)
            .map(|i| {
                let store = store.clone();
                let goal = goal.clone();
                tokio::spawn(async move {
                    let snapshot = Snapshot::new(
                        start + chrono::Duration::days(i),
                        SnapshotCounts::new(i as u32, 30),
                    )
                    .unwrap();
                    store.record_snapshot(&goal, snapshot).await
                })
            })
            .collect();
        for handle in handles {
            handle.await.unwrap().unwrap();
        }

        let history = store.load_history(&goal).await.unwrap();
        assert_eq!(history.len(), 30);
        assert_eq!(history.version, 30);
        assert!(history.snapshots.windows(2).all(|w| w[0].date < w[1].date));
    }
}
