//! Short textual insights assembled from the computed metrics.

use goalpace_core::Outcome;

use crate::bottleneck::Bottleneck;
use crate::config::InsightConfig;
use crate::forecast::CompletionForecast;
use crate::trend::{TrendAnalysis, TrendDirection};
use crate::velocity::{VelocityMetrics, VelocityTrend};

/// Returned when nothing else qualifies.
pub const NO_INSIGHTS: &str = "No significant insights yet; keep recording daily snapshots";

/// Build insights; always returns at least one.
pub fn generate_insights(
    velocity: &Outcome<VelocityMetrics>,
    trend: &Outcome<TrendAnalysis>,
    forecast: &Outcome<CompletionForecast>,
    bottlenecks: &[Bottleneck],
    config: &InsightConfig,
) -> Vec<String> {
    let mut insights = Vec::new();

    if let Some(v) = velocity.value() {
        match v.trend {
            VelocityTrend::Improving => insights.push(format!(
                "Velocity is improving (momentum {:+.2}, avg {:.1} tasks/period)",
                v.momentum, v.average_velocity
            )),
            VelocityTrend::Declining => insights.push(format!(
                "Velocity is declining (momentum {:+.2}, avg {:.1} tasks/period)",
                v.momentum, v.average_velocity
            )),
            VelocityTrend::Stable => {}
        }
    }

    if let Some(t) = trend.value() {
        match t.direction {
            TrendDirection::Positive => insights.push(format!(
                "Completion trend is positive: {:.2} tasks/day (R² {:.2}, momentum {:.2})",
                t.slope, t.r_squared, t.momentum_score
            )),
            TrendDirection::Negative => insights.push(format!(
                "Completed count is trending down ({:.2} tasks/day); check for reopened work",
                t.slope
            )),
            TrendDirection::Flat => {}
        }
    }

    if let Some(probability) = forecast.value().and_then(|f| f.probability) {
        if probability > config.on_track_probability {
            insights.push(format!(
                "On track to meet the deadline ({:.0}% likely)",
                probability * 100.0
            ));
        } else if probability < config.at_risk_probability {
            insights.push(format!(
                "At risk of missing the deadline ({:.0}% likely)",
                probability * 100.0
            ));
        }
    }

    for bottleneck in bottlenecks.iter().take(config.max_bottlenecks) {
        insights.push(format!(
            "Bottleneck ({}): {}. {}",
            bottleneck.severity, bottleneck.description, bottleneck.recommendation
        ));
    }

    if insights.is_empty() {
        insights.push(NO_INSIGHTS.to_string());
    }
    insights
}
