//! Velocity: completed work per period and whether it is speeding up.

use chrono::NaiveDate;
use goalpace_core::{Outcome, Snapshot};
use serde::Serialize;
use tracing::debug;

use crate::config::VelocityConfig;

/// Minimum non-empty periods for velocity metrics.
pub const MIN_VELOCITY_PERIODS: usize = 2;

/// Direction of velocity between the first and last period.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum VelocityTrend {
    /// Last period beat the first by more than the improving ratio
    Improving,
    /// Within the dead band
    Stable,
    /// Last period fell below the declining ratio of the first
    Declining,
}

impl VelocityTrend {
    /// Get string representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            VelocityTrend::Improving => "improving",
            VelocityTrend::Stable => "stable",
            VelocityTrend::Declining => "declining",
        }
    }
}

/// Completed work within one chunk of history.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PeriodVelocity {
    /// First day in the chunk
    pub start: NaiveDate,
    /// Last day in the chunk
    pub end: NaiveDate,
    /// Tasks completed across the chunk, floored at zero
    pub completed: u32,
}

/// Velocity across equal-size chunks of history.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VelocityMetrics {
    /// Per-chunk velocity, oldest first
    pub periods: Vec<PeriodVelocity>,
    /// Mean velocity over the chunks
    pub average_velocity: f64,
    /// First vs last chunk classification
    pub trend: VelocityTrend,
    /// `(last - first) / (first + 1)` clamped to `[-1, 1]`
    pub momentum: f64,
}

/// Compute velocity over `periods` equal chunks of a date-sorted history.
///
/// Chunk size is `len / periods` (at least one point); trailing points that
/// do not fill a chunk are left out.
pub fn compute_velocity(
    snapshots: &[Snapshot],
    periods: usize,
    config: &VelocityConfig,
) -> Outcome<VelocityMetrics> {
    let periods = periods.max(1);
    let chunk_size = (snapshots.len() / periods).max(1);

    // Chunk i starts at or after index i, so later periods are always empty
    let velocities: Vec<PeriodVelocity> = (0..periods.min(snapshots.len()))
        .filter_map(|i| {
            let start = i * chunk_size;
            let end = ((i + 1) * chunk_size).min(snapshots.len());
            let chunk = snapshots.get(start..end)?;
            let (first, last) = (chunk.first()?, chunk.last()?);
            Some(PeriodVelocity {
                start: first.date,
                end: last.date,
                completed: last.completed.saturating_sub(first.completed),
            })
        })
        .collect();

    debug!(
        "Velocity: {} points, chunk size {}, {} non-empty periods",
        snapshots.len(),
        chunk_size,
        velocities.len()
    );

    if velocities.len() < MIN_VELOCITY_PERIODS {
        return Outcome::insufficient(MIN_VELOCITY_PERIODS, velocities.len());
    }

    let sum: u32 = velocities.iter().map(|p| p.completed).sum();
    let average_velocity = sum as f64 / velocities.len() as f64;

    let first = velocities[0].completed as f64;
    let last = velocities[velocities.len() - 1].completed as f64;

    let trend = if last > first * config.improving_ratio {
        VelocityTrend::Improving
    } else if last < first * config.declining_ratio {
        VelocityTrend::Declining
    } else {
        VelocityTrend::Stable
    };

    let momentum = ((last - first) / (first + 1.0)).clamp(-1.0, 1.0);

    Outcome::Computed(VelocityMetrics {
        periods: velocities,
        average_velocity,
        trend,
        momentum,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use goalpace_core::SnapshotCounts;

    fn series(completed: &[u32]) -> Vec<Snapshot> {
        let start = NaiveDate::from_ymd_opt(2024, 6, 1).unwrap();
        completed
            .iter()
            .enumerate()
            .map(|(i, c)| {
                Snapshot::new(start + Duration::days(i as i64), SnapshotCounts::new(*c, 100))
                    .unwrap()
            })
            .collect()
    }

    #[test]
    fn test_single_point_is_insufficient() {
        let config = VelocityConfig::default();
        assert_eq!(compute_velocity(&[], 4, &config), Outcome::insufficient(2, 0));
        assert_eq!(
            compute_velocity(&series(&[3]), 4, &config),
            Outcome::insufficient(2, 1)
        );
    }

    #[test]
    fn test_average_is_mean_of_period_deltas() {
        // chunk size 2: [0,2] [3,7] [8,8] [9,15]
        let history = series(&[0, 2, 3, 7, 8, 8, 9, 15]);
        let metrics = compute_velocity(&history, 4, &VelocityConfig::default())
            .into_value()
            .unwrap();

        let deltas: Vec<u32> = metrics.periods.iter().map(|p| p.completed).collect();
        assert_eq!(deltas, vec![2, 4, 0, 6]);
        let sum: u32 = deltas.iter().sum();
        assert_eq!(metrics.average_velocity, sum as f64 / deltas.len() as f64);
    }

    #[test]
    fn test_trend_classification() {
        let config = VelocityConfig::default();

        let improving = compute_velocity(&series(&[0, 1, 1, 5]), 2, &config).into_value().unwrap();
        assert_eq!(improving.trend, VelocityTrend::Improving);
        assert_eq!(improving.momentum, 1.0);

        let declining = compute_velocity(&series(&[0, 5, 5, 6]), 2, &config).into_value().unwrap();
        assert_eq!(declining.trend, VelocityTrend::Declining);
        assert!((declining.momentum - (1.0 - 5.0) / 6.0).abs() < 1e-9);

        // 21 vs 20 sits inside the dead band
        let stable = compute_velocity(&series(&[0, 20, 20, 41]), 2, &config).into_value().unwrap();
        assert_eq!(stable.periods[0].completed, 20);
        assert_eq!(stable.periods[1].completed, 21);
        assert_eq!(stable.trend, VelocityTrend::Stable);
    }

    #[test]
    fn test_regression_in_completed_floors_at_zero() {
        let history = series(&[5, 2, 2, 4]);
        let metrics = compute_velocity(&history, 2, &VelocityConfig::default())
            .into_value()
            .unwrap();
        assert_eq!(metrics.periods[0].completed, 0);
        assert_eq!(metrics.periods[1].completed, 2);
    }

    #[test]
    fn test_short_history_uses_single_point_chunks() {
        let metrics = compute_velocity(&series(&[1, 2]), 4, &VelocityConfig::default())
            .into_value()
            .unwrap();
        assert_eq!(metrics.periods.len(), 2);
        assert_eq!(metrics.average_velocity, 0.0);
    }

    #[test]
    fn test_huge_period_count_is_bounded_by_history() {
        let history = series(&[0, 1, 3, 4, 6, 7, 9, 10, 12, 13]);
        let metrics = compute_velocity(&history, usize::MAX, &VelocityConfig::default())
            .into_value()
            .unwrap();
        assert_eq!(metrics.periods.len(), history.len());
        assert_eq!(metrics.average_velocity, 0.0);
    }
}
