//! Snapshot model - one day of recorded progress for a goal.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::id::GoalId;
use crate::{CoreError, Result};

/// Task counts reported by the goal registry at recording time.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SnapshotCounts {
    /// Completed tasks
    pub completed: u32,

    /// Total tasks in scope
    pub total: u32,

    /// Blocked tasks
    pub blocked: u32,

    /// Tasks currently in progress
    pub in_progress: u32,
}

impl SnapshotCounts {
    /// Counts with only completed/total set.
    pub fn new(completed: u32, total: u32) -> Self {
        Self {
            completed,
            total,
            ..Default::default()
        }
    }

    /// Set the blocked count.
    pub fn with_blocked(mut self, blocked: u32) -> Self {
        self.blocked = blocked;
        self
    }

    /// Set the in-progress count.
    pub fn with_in_progress(mut self, in_progress: u32) -> Self {
        self.in_progress = in_progress;
        self
    }
}

/// A single day's recorded progress for one goal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Snapshot {
    /// Calendar day, persisted as `YYYY-MM-DD`
    pub date: NaiveDate,

    /// Completed tasks
    pub completed: u32,

    /// Total tasks in scope
    pub total: u32,

    /// Blocked tasks
    #[serde(default)]
    pub blocked: u32,

    /// Tasks currently in progress
    #[serde(default)]
    pub in_progress: u32,
}

impl Snapshot {
    /// Build a snapshot, rejecting `completed > total`.
    pub fn new(date: NaiveDate, counts: SnapshotCounts) -> Result<Self> {
        if counts.completed > counts.total {
            return Err(CoreError::InvalidSnapshot {
                completed: counts.completed,
                total: counts.total,
            });
        }

        Ok(Self {
            date,
            completed: counts.completed,
            total: counts.total,
            blocked: counts.blocked,
            in_progress: counts.in_progress,
        })
    }

    /// Tasks left to do, floored at zero.
    pub fn remaining(&self) -> u32 {
        self.total.saturating_sub(self.completed)
    }
}

/// Ordered snapshot series for one goal.
///
/// Always sorted ascending by date with at most one point per date.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct History {
    /// Goal this history belongs to
    pub goal_id: GoalId,

    /// Snapshots, oldest first
    pub snapshots: Vec<Snapshot>,

    /// Store version the snapshots were read at (0 = never written)
    #[serde(skip)]
    pub version: u64,
}

impl History {
    /// An empty, never-written history.
    pub fn empty(goal_id: GoalId) -> Self {
        Self {
            goal_id,
            snapshots: Vec::new(),
            version: 0,
        }
    }

    /// Build a history from raw snapshots, normalising order and duplicates.
    ///
    /// When two snapshots share a date the later one in `snapshots` wins.
    pub fn from_snapshots(goal_id: GoalId, snapshots: Vec<Snapshot>, version: u64) -> Self {
        let mut history = Self::empty(goal_id);
        history.version = version;
        for snapshot in snapshots {
            history.upsert(snapshot);
        }
        history
    }

    /// Insert a snapshot, overwriting any existing point for the same date.
    ///
    /// Returns `true` when an existing point was replaced.
    pub fn upsert(&mut self, snapshot: Snapshot) -> bool {
        match self
            .snapshots
            .binary_search_by(|existing| existing.date.cmp(&snapshot.date))
        {
            Ok(idx) => {
                self.snapshots[idx] = snapshot;
                true
            }
            Err(idx) => {
                self.snapshots.insert(idx, snapshot);
                false
            }
        }
    }

    /// Most recent snapshot.
    pub fn latest(&self) -> Option<&Snapshot> {
        self.snapshots.last()
    }

    /// Snapshots with `start <= date <= end`.
    pub fn between(&self, start: NaiveDate, end: NaiveDate) -> &[Snapshot] {
        let from = self.snapshots.partition_point(|s| s.date < start);
        let to = self.snapshots.partition_point(|s| s.date <= end);
        if from >= to {
            &[]
        } else {
            &self.snapshots[from..to]
        }
    }

    /// Days between the first and last snapshot.
    pub fn span_days(&self) -> i64 {
        match (self.snapshots.first(), self.snapshots.last()) {
            (Some(first), Some(last)) => (last.date - first.date).num_days(),
            _ => 0,
        }
    }

    /// Number of snapshots.
    pub fn len(&self) -> usize {
        self.snapshots.len()
    }

    /// Whether no snapshots have been recorded.
    pub fn is_empty(&self) -> bool {
        self.snapshots.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 5, d).unwrap()
    }

    fn snap(d: u32, completed: u32) -> Snapshot {
        Snapshot::new(day(d), SnapshotCounts::new(completed, 10)).unwrap()
    }

    #[test]
    fn test_snapshot_rejects_completed_over_total() {
        let err = Snapshot::new(day(1), SnapshotCounts::new(11, 10)).unwrap_err();
        assert_eq!(err, CoreError::InvalidSnapshot { completed: 11, total: 10 });
    }

    #[test]
    fn test_upsert_same_date_overwrites() {
        let mut history = History::empty(GoalId::new("g"));
        assert!(!history.upsert(snap(1, 2)));
        assert!(history.upsert(snap(1, 4)));
        assert_eq!(history.len(), 1);
        assert_eq!(history.latest().unwrap().completed, 4);
    }

    #[test]
    fn test_from_snapshots_sorts_by_date() {
        let history =
            History::from_snapshots(GoalId::new("g"), vec![snap(3, 3), snap(1, 1), snap(2, 2)], 1);
        let dates: Vec<_> = history.snapshots.iter().map(|s| s.date).collect();
        assert_eq!(dates, vec![day(1), day(2), day(3)]);
        assert_eq!(history.span_days(), 2);
    }

    #[test]
    fn test_between_is_inclusive() {
        let history = History::from_snapshots(
            GoalId::new("g"),
            (1..=5).map(|d| snap(d, d)).collect(),
            1,
        );
        let window = history.between(day(2), day(4));
        assert_eq!(window.len(), 3);
        assert_eq!(window[0].date, day(2));
        assert!(history.between(day(6), day(9)).is_empty());
    }

    #[test]
    fn test_snapshot_json_format() {
        let json = serde_json::to_value(snap(7, 3)).unwrap();
        assert_eq!(json["date"], "2024-05-07");
        assert_eq!(json["completed"], 3);
        assert_eq!(json["in_progress"], 0);
    }
}
