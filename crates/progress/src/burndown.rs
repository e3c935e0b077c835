//! Burndown: ideal vs actual remaining work over a date window.

use chrono::{Duration, NaiveDate};
use goalpace_core::{Outcome, Snapshot};
use serde::Serialize;
use tracing::debug;

use crate::chart::render_burndown;
use crate::config::BurndownConfig;

/// Minimum points for a burndown.
pub const MIN_BURNDOWN_POINTS: usize = 2;

/// Optional date window for a burndown. Missing ends fall back to the
/// configured window ending today.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BurndownRange {
    /// First day included
    pub start: Option<NaiveDate>,
    /// Last day included
    pub end: Option<NaiveDate>,
}

impl BurndownRange {
    /// Explicit inclusive range.
    pub fn between(start: NaiveDate, end: NaiveDate) -> Self {
        Self {
            start: Some(start),
            end: Some(end),
        }
    }

    /// Resolve to concrete inclusive bounds.
    pub fn resolve(&self, today: NaiveDate, window_days: i64) -> (NaiveDate, NaiveDate) {
        let end = self.end.unwrap_or(today);
        let start = self.start.unwrap_or_else(|| {
            Duration::try_days(window_days.max(1) - 1)
                .and_then(|span| end.checked_sub_signed(span))
                .unwrap_or(NaiveDate::MIN)
        });
        (start, end)
    }
}

/// One sampled day of a burndown.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct BurndownPoint {
    /// Day sampled
    pub date: NaiveDate,
    /// Remaining work on the ideal line
    pub ideal_remaining: f64,
    /// Remaining work actually recorded
    pub actual_remaining: u32,
}

/// Burndown over a window.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BurndownData {
    /// First day of the window
    pub start_date: NaiveDate,
    /// Last day of the window
    pub end_date: NaiveDate,
    /// Total scope at the first sampled point
    pub total_scope: u32,
    /// Tasks completed between the first and last sampled point
    pub completed_in_range: u32,
    /// Sampled points, oldest first
    pub points: Vec<BurndownPoint>,
    /// Text chart of the points
    pub chart: String,
}

/// Compute a burndown from a date-sorted history.
pub fn compute_burndown(
    snapshots: &[Snapshot],
    range: BurndownRange,
    today: NaiveDate,
    config: &BurndownConfig,
) -> Outcome<BurndownData> {
    let (start, end) = range.resolve(today, config.default_window_days);
    let from = snapshots.partition_point(|s| s.date < start);
    let to = snapshots.partition_point(|s| s.date <= end);
    let window = if from < to { &snapshots[from..to] } else { &[][..] };

    if window.len() < MIN_BURNDOWN_POINTS {
        return Outcome::insufficient(MIN_BURNDOWN_POINTS, window.len());
    }

    let first = window[0];
    let last = window[window.len() - 1];

    // Ideal line runs from the starting scope down to what is left after the
    // work completed by the end of the window, in equal steps per sample.
    let ideal_start = first.total as f64;
    let ideal_end = first.total.saturating_sub(last.completed) as f64;
    let steps = (window.len() - 1) as f64;

    let points: Vec<BurndownPoint> = window
        .iter()
        .enumerate()
        .map(|(i, s)| BurndownPoint {
            date: s.date,
            ideal_remaining: ideal_start - (ideal_start - ideal_end) * (i as f64 / steps),
            actual_remaining: s.remaining(),
        })
        .collect();

    debug!(
        "Burndown {}..{}: {} points, scope {}",
        start,
        end,
        points.len(),
        first.total
    );

    let chart = render_burndown(&points, config.chart_width, config.chart_height);

    Outcome::Computed(BurndownData {
        start_date: start,
        end_date: end,
        total_scope: first.total,
        completed_in_range: last.completed.saturating_sub(first.completed),
        points,
        chart,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chart::ALL_DONE_MESSAGE;
    use goalpace_core::SnapshotCounts;

    fn day(d: i64) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, 1).unwrap() + Duration::days(d)
    }

    fn series(completed: &[u32], total: u32) -> Vec<Snapshot> {
        completed
            .iter()
            .enumerate()
            .map(|(i, c)| Snapshot::new(day(i as i64), SnapshotCounts::new(*c, total)).unwrap())
            .collect()
    }

    #[test]
    fn test_fewer_than_two_points_is_insufficient() {
        let config = BurndownConfig::default();
        assert_eq!(
            compute_burndown(&[], BurndownRange::default(), day(0), &config),
            Outcome::insufficient(2, 0)
        );
        let one = series(&[1], 5);
        assert_eq!(
            compute_burndown(&one, BurndownRange::default(), day(0), &config),
            Outcome::insufficient(2, 1)
        );
    }

    #[test]
    fn test_ideal_is_non_increasing_and_actual_tracks_remaining() {
        let history = series(&[0, 1, 1, 4, 6], 10);
        let data = compute_burndown(&history, BurndownRange::default(), day(4), &BurndownConfig::default())
            .into_value()
            .unwrap();

        assert_eq!(data.points.len(), 5);
        assert_eq!(data.points[0].ideal_remaining, 10.0);
        assert_eq!(data.points[4].ideal_remaining, 4.0);
        for pair in data.points.windows(2) {
            assert!(pair[1].ideal_remaining <= pair[0].ideal_remaining);
        }
        let actual: Vec<_> = data.points.iter().map(|p| p.actual_remaining).collect();
        assert_eq!(actual, vec![10, 9, 9, 6, 4]);
        assert_eq!(data.completed_in_range, 6);
        assert!(data.chart.contains('#'));
    }

    #[test]
    fn test_default_window_is_last_fourteen_days() {
        let history = series(&(0..20).collect::<Vec<_>>(), 30);
        let data = compute_burndown(&history, BurndownRange::default(), day(19), &BurndownConfig::default())
            .into_value()
            .unwrap();

        assert_eq!(data.points.len(), 14);
        assert_eq!(data.start_date, day(6));
        assert_eq!(data.points[0].date, day(6));
    }

    #[test]
    fn test_explicit_range() {
        let history = series(&[0, 2, 4, 6, 8], 10);
        let range = BurndownRange::between(day(1), day(3));
        let data = compute_burndown(&history, range, day(30), &BurndownConfig::default())
            .into_value()
            .unwrap();

        assert_eq!(data.points.len(), 3);
        assert_eq!(data.total_scope, 10);
        assert_eq!(data.points[2].actual_remaining, 4);
    }

    #[test]
    fn test_empty_scope_renders_completion_message() {
        let history = series(&[0, 0], 0);
        let mut config = BurndownConfig::default();
        config.default_window_days = 5;
        let data = compute_burndown(&history, BurndownRange::default(), day(1), &config)
            .into_value()
            .unwrap();
        assert_eq!(data.chart, ALL_DONE_MESSAGE);
    }

    #[test]
    fn test_oversized_window_reaches_back_to_earliest_date() {
        let (start, end) = BurndownRange::default().resolve(day(3), i64::MAX);
        assert_eq!(start, NaiveDate::MIN);
        assert_eq!(end, day(3));

        let config = BurndownConfig {
            default_window_days: 1_000_000_000,
            ..BurndownConfig::default()
        };
        let history = series(&[0, 2, 5], 10);
        let data = compute_burndown(&history, BurndownRange::default(), day(2), &config)
            .into_value()
            .unwrap();
        assert_eq!(data.points.len(), 3);
        assert_eq!(data.start_date, NaiveDate::MIN);
    }
}
