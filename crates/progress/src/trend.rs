//! Trend analysis: least-squares fit of completed work against elapsed days.

use goalpace_core::{Outcome, Snapshot};
use serde::Serialize;
use tracing::debug;

use crate::config::TrendConfig;

/// Direction of the fitted completion line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TrendDirection {
    /// Slope above the threshold
    Positive,
    /// Slope within the threshold
    Flat,
    /// Slope below the negative threshold
    Negative,
}

impl TrendDirection {
    /// Get string representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            TrendDirection::Positive => "positive",
            TrendDirection::Flat => "flat",
            TrendDirection::Negative => "negative",
        }
    }
}

/// Linear regression of completed tasks over time.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrendAnalysis {
    /// Tasks completed per day
    pub slope: f64,
    /// Completed tasks at day zero
    pub intercept: f64,
    /// Coefficient of determination (0 when `y` has no variance)
    pub r_squared: f64,
    /// Direction of the slope
    pub direction: TrendDirection,
    /// Slope normalised by `max(y) + 1`, clamped to `[-1, 1]`
    pub momentum_score: f64,
    /// Number of points fitted
    pub samples: usize,
}

/// Fit completed tasks against days since the first snapshot.
pub fn compute_trend(snapshots: &[Snapshot], config: &TrendConfig) -> Outcome<TrendAnalysis> {
    let min_points = config.min_points.max(2);
    if snapshots.len() < min_points {
        return Outcome::insufficient(min_points, snapshots.len());
    }

    let origin = snapshots[0].date;
    let xs: Vec<f64> = snapshots
        .iter()
        .map(|s| (s.date - origin).num_days() as f64)
        .collect();
    let ys: Vec<f64> = snapshots.iter().map(|s| s.completed as f64).collect();

    let n = snapshots.len() as f64;
    let sum_x: f64 = xs.iter().sum();
    let sum_y: f64 = ys.iter().sum();
    let sum_xy: f64 = xs.iter().zip(&ys).map(|(x, y)| x * y).sum();
    let sum_xx: f64 = xs.iter().map(|x| x * x).sum();

    let denominator = n * sum_xx - sum_x * sum_x;
    if denominator.abs() < f64::EPSILON {
        return Outcome::degenerate("Regression undefined: all snapshots share one date");
    }

    let slope = (n * sum_xy - sum_x * sum_y) / denominator;
    let intercept = (sum_y - slope * sum_x) / n;

    let mean_y = sum_y / n;
    let ss_tot: f64 = ys.iter().map(|y| (y - mean_y).powi(2)).sum();
    let ss_res: f64 = xs
        .iter()
        .zip(&ys)
        .map(|(x, y)| (y - (slope * x + intercept)).powi(2))
        .sum();
    let r_squared = if ss_tot > 0.0 { 1.0 - ss_res / ss_tot } else { 0.0 };

    let direction = if slope > config.slope_threshold {
        TrendDirection::Positive
    } else if slope < -config.slope_threshold {
        TrendDirection::Negative
    } else {
        TrendDirection::Flat
    };

    let max_y = ys.iter().cloned().fold(0.0f64, f64::max);
    let momentum_score = (slope / (max_y + 1.0)).clamp(-1.0, 1.0);

    debug!(
        "Trend over {} points: slope {:.3}, r2 {:.3}",
        snapshots.len(),
        slope,
        r_squared
    );

    Outcome::Computed(TrendAnalysis {
        slope,
        intercept,
        r_squared,
        direction,
        momentum_score,
        samples: snapshots.len(),
    })
}
