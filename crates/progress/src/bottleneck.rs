//! Bottleneck detection from the snapshot series.

use goalpace_core::{Severity, Snapshot};
use serde::Serialize;

use crate::config::BottleneckConfig;

/// Kind of bottleneck.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BottleneckKind {
    /// Tasks are blocked at the latest snapshot
    Blocked,
    /// No completions across the trailing snapshots
    Stalled,
}

impl BottleneckKind {
    /// Get string representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            BottleneckKind::Blocked => "blocked",
            BottleneckKind::Stalled => "stalled",
        }
    }
}

/// Something holding a goal back.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Bottleneck {
    /// What kind of bottleneck
    pub kind: BottleneckKind,
    /// How urgent it is
    pub severity: Severity,
    /// What was observed
    pub description: String,
    /// Suggested next step
    pub recommendation: String,
}

/// Detect bottlenecks in a date-sorted history, most severe first.
pub fn detect_bottlenecks(snapshots: &[Snapshot], config: &BottleneckConfig) -> Vec<Bottleneck> {
    let mut bottlenecks = Vec::new();
    let Some(latest) = snapshots.last() else {
        return bottlenecks;
    };

    let span = (latest.date - snapshots[0].date).num_days();
    if latest.blocked > 0 && span > config.min_window_days {
        let severity = if latest.blocked > config.high_blocked_threshold {
            Severity::High
        } else {
            Severity::Medium
        };
        bottlenecks.push(Bottleneck {
            kind: BottleneckKind::Blocked,
            severity,
            description: format!("{} task(s) currently blocked", latest.blocked),
            recommendation: "Review blocked tasks and resolve their dependencies".to_string(),
        });
    }

    if is_stalled(snapshots, config.stall_points) {
        let stalled_since = snapshots[snapshots.len() - config.stall_points.max(2)].date;
        bottlenecks.push(Bottleneck {
            kind: BottleneckKind::Stalled,
            severity: Severity::Critical,
            description: format!(
                "No tasks completed since {} ({} snapshots)",
                stalled_since,
                config.stall_points.max(2)
            ),
            recommendation: "Break the next task into smaller steps or reassign it".to_string(),
        });
    }

    bottlenecks.sort_by(|a, b| b.severity.cmp(&a.severity));
    bottlenecks
}

/// Whether the last `points` snapshots all share one completed count.
fn is_stalled(snapshots: &[Snapshot], points: usize) -> bool {
    let points = points.max(2);
    if snapshots.len() < points {
        return false;
    }
    snapshots[snapshots.len() - points..]
        .windows(2)
        .all(|pair| pair[0].completed == pair[1].completed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, NaiveDate};
    use goalpace_core::SnapshotCounts;

    fn series(points: &[(u32, u32)]) -> Vec<Snapshot> {
        let start = NaiveDate::from_ymd_opt(2024, 4, 1).unwrap();
        points
            .iter()
            .enumerate()
            .map(|(i, (completed, blocked))| {
                Snapshot::new(
                    start + Duration::days(i as i64),
                    SnapshotCounts::new(*completed, 50).with_blocked(*blocked),
                )
                .unwrap()
            })
            .collect()
    }

    #[test]
    fn test_empty_history_has_no_bottlenecks() {
        assert!(detect_bottlenecks(&[], &BottleneckConfig::default()).is_empty());
    }

    #[test]
    fn test_blocked_requires_window_longer_than_two_days() {
        let config = BottleneckConfig::default();

        // Span of 2 days is not enough
        let short = series(&[(0, 0), (1, 0), (2, 2)]);
        assert!(detect_bottlenecks(&short, &config).is_empty());

        let long = series(&[(0, 0), (1, 0), (2, 0), (3, 2)]);
        let found = detect_bottlenecks(&long, &config);
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].kind, BottleneckKind::Blocked);
        assert_eq!(found[0].severity, Severity::Medium);
    }

    #[test]
    fn test_blocked_severity_high_above_three() {
        let history = series(&[(0, 0), (1, 0), (2, 0), (3, 4)]);
        let found = detect_bottlenecks(&history, &BottleneckConfig::default());
        assert_eq!(found[0].severity, Severity::High);
    }

    #[test]
    fn test_stalled_iff_last_three_equal() {
        let config = BottleneckConfig::default();
        let stalled = |pts: &[(u32, u32)]| {
            detect_bottlenecks(&series(pts), &config)
                .iter()
                .any(|b| b.kind == BottleneckKind::Stalled)
        };

        assert!(stalled(&[(1, 0), (4, 0), (4, 0), (4, 0)]));
        assert!(!stalled(&[(4, 0), (4, 0), (5, 0)]));
        assert!(!stalled(&[(4, 0), (5, 0), (5, 0)]));
        assert!(!stalled(&[(4, 0), (4, 0)]));
    }

    #[test]
    fn test_sorted_most_severe_first() {
        let history = series(&[(0, 0), (2, 0), (2, 1), (2, 1)]);
        let found = detect_bottlenecks(&history, &BottleneckConfig::default());
        assert_eq!(found.len(), 2);
        assert_eq!(found[0].kind, BottleneckKind::Stalled);
        assert_eq!(found[0].severity, Severity::Critical);
        assert_eq!(found[1].kind, BottleneckKind::Blocked);
    }
}
