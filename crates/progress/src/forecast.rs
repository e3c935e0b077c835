//! Completion forecast from average velocity.
//!
//! The confidence band is a fixed heuristic (a multiple of the projected
//! days), not a statistical interval.

use chrono::{Duration, NaiveDate};
use goalpace_core::{Outcome, Snapshot};
use serde::Serialize;
use tracing::debug;

use crate::config::ForecastConfig;
use crate::velocity::VelocityMetrics;

/// Projected completion for a goal.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CompletionForecast {
    /// Tasks left at the latest snapshot
    pub tasks_remaining: u32,
    /// Average velocity the projection uses
    pub average_velocity: f64,
    /// `tasks_remaining / average_velocity`
    pub days_to_complete: f64,
    /// Projected completion day
    pub estimated_date: NaiveDate,
    /// Pessimistic completion day
    pub low_estimate: NaiveDate,
    /// Optimistic completion day
    pub high_estimate: NaiveDate,
    /// Heuristic confidence in the projection
    pub confidence: f64,
    /// Chance of finishing by the deadline (set when a deadline is given or the goal is done)
    pub probability: Option<f64>,
    /// Deadline evaluated against
    pub deadline: Option<NaiveDate>,
    /// Days from today to the deadline (negative once passed)
    pub days_remaining: Option<i64>,
    /// Tasks per day needed to hit the deadline
    pub required_velocity: Option<f64>,
}

impl CompletionForecast {
    /// Whether nothing is left to do.
    pub fn is_complete(&self) -> bool {
        self.tasks_remaining == 0
    }
}

/// Add a fractional number of days, rounding up to whole days.
pub(crate) fn add_days(date: NaiveDate, days: f64) -> NaiveDate {
    let whole = days.max(0.0).ceil();
    if whole >= i32::MAX as f64 {
        return NaiveDate::MAX;
    }
    date.checked_add_signed(Duration::days(whole as i64))
        .unwrap_or(NaiveDate::MAX)
}

/// Forecast completion from the latest snapshot and velocity metrics.
pub fn compute_forecast(
    snapshots: &[Snapshot],
    velocity: &Outcome<VelocityMetrics>,
    today: NaiveDate,
    deadline: Option<NaiveDate>,
    config: &ForecastConfig,
) -> Outcome<CompletionForecast> {
    let Some(latest) = snapshots.last() else {
        return Outcome::insufficient(1, 0);
    };

    let tasks_remaining = latest.remaining();
    let days_remaining = deadline.map(|d| (d - today).num_days());

    if tasks_remaining == 0 {
        return Outcome::Computed(CompletionForecast {
            tasks_remaining: 0,
            average_velocity: velocity.value().map(|v| v.average_velocity).unwrap_or(0.0),
            days_to_complete: 0.0,
            estimated_date: today,
            low_estimate: today,
            high_estimate: today,
            confidence: 1.0,
            probability: Some(1.0),
            deadline,
            days_remaining,
            required_velocity: deadline.map(|_| 0.0),
        });
    }

    let metrics = match velocity {
        Outcome::Computed(m) => m,
        Outcome::InsufficientData { required, available } => {
            return Outcome::insufficient(*required, *available)
        }
        Outcome::Degenerate(reason) => return Outcome::degenerate(reason.clone()),
    };

    let average_velocity = metrics.average_velocity;
    if average_velocity <= 0.0 {
        return Outcome::degenerate("No completed work in the tracked periods; velocity is zero");
    }

    let remaining = tasks_remaining as f64;
    let days_to_complete = remaining / average_velocity;
    let confidence = (average_velocity / (remaining + 1.0)).min(config.max_confidence);

    let (probability, required_velocity) = match days_remaining {
        None => (None, None),
        Some(days) if days <= 0 => (Some(0.0), Some(config.overdue_required_velocity)),
        Some(days) => {
            let days = days as f64;
            let probability = if days_to_complete <= days {
                config.on_schedule_probability
            } else {
                (2.0 - days_to_complete / days).max(0.0)
            };
            (Some(probability), Some(remaining / days))
        }
    };

    debug!(
        "Forecast: {} remaining at {:.2}/period -> {:.1} days",
        tasks_remaining, average_velocity, days_to_complete
    );

    Outcome::Computed(CompletionForecast {
        tasks_remaining,
        average_velocity,
        days_to_complete,
        estimated_date: add_days(today, days_to_complete),
        low_estimate: add_days(today, days_to_complete * config.pessimistic_factor),
        high_estimate: add_days(today, days_to_complete * config.optimistic_factor),
        confidence,
        probability,
        deadline,
        days_remaining,
        required_velocity,
    })
}
