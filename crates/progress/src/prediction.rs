//! Prediction engine - deadline risk, required velocity and what-if scenarios.
//!
//! Built on top of the analytics engine's forecast. All adjustments are
//! fixed heuristics from `PredictionConfig`, not a statistical model.

use chrono::{Duration, NaiveDate};
use goalpace_core::{GoalId, Outcome};
use serde::Serialize;
use tracing::debug;

use crate::config::PredictionConfig;
use crate::engine::AnalyticsEngine;
use crate::forecast::{add_days, CompletionForecast};

/// Discrete confidence band for completion estimates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ConfidenceBand {
    /// Optimistic estimate
    Low,
    /// Baseline estimate
    Central,
    /// Conservative estimate
    High,
}

impl ConfidenceBand {
    /// Band for a requested confidence level in `[0, 1]`.
    pub fn from_level(level: f64, config: &PredictionConfig) -> Self {
        if level >= config.high_confidence_level {
            ConfidenceBand::High
        } else if level < config.low_confidence_level {
            ConfidenceBand::Low
        } else {
            ConfidenceBand::Central
        }
    }

    /// Days the band shifts the baseline date by.
    pub fn shift_days(&self, config: &PredictionConfig) -> i64 {
        match self {
            ConfidenceBand::Low => config.low_confidence_shift_days,
            ConfidenceBand::Central => config.central_confidence_shift_days,
            ConfidenceBand::High => config.high_confidence_shift_days,
        }
    }
}

/// Completion date adjusted for a confidence level.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CompletionEstimate {
    /// Requested confidence level
    pub confidence_level: f64,
    /// Band the level falls in
    pub band: ConfidenceBand,
    /// Forecast date before adjustment
    pub baseline_date: NaiveDate,
    /// Days added to the baseline
    pub shift_days: i64,
    /// Adjusted completion date
    pub estimated_date: NaiveDate,
    /// Tasks left
    pub tasks_remaining: u32,
}

/// Qualitative deadline risk.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RiskLevel {
    /// Probability above the on-track threshold
    OnTrack,
    /// Probability above the slightly-behind threshold
    SlightlyBehind,
    /// Probability above the at-risk threshold
    AtRisk,
    /// Anything lower
    HighRisk,
}

impl RiskLevel {
    /// Classify a probability.
    pub fn from_probability(probability: f64, config: &PredictionConfig) -> Self {
        if probability > config.on_track_probability {
            RiskLevel::OnTrack
        } else if probability > config.slightly_behind_probability {
            RiskLevel::SlightlyBehind
        } else if probability > config.at_risk_probability {
            RiskLevel::AtRisk
        } else {
            RiskLevel::HighRisk
        }
    }

    /// Get string representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            RiskLevel::OnTrack => "on_track",
            RiskLevel::SlightlyBehind => "slightly_behind",
            RiskLevel::AtRisk => "at_risk",
            RiskLevel::HighRisk => "high_risk",
        }
    }

    /// What to do about it.
    pub fn recommendation(&self) -> &'static str {
        match self {
            RiskLevel::OnTrack => "On track. Maintain the current pace.",
            RiskLevel::SlightlyBehind => {
                "Slightly behind. Increase focus or trim low-priority tasks."
            }
            RiskLevel::AtRisk => {
                "At risk. Reduce scope, add capacity or renegotiate the deadline."
            }
            RiskLevel::HighRisk => {
                "High risk of missing the deadline. Escalate and replan now."
            }
        }
    }
}

/// Risk of missing a deadline.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RiskAssessment {
    /// Deadline assessed
    pub deadline: NaiveDate,
    /// Chance of finishing by the deadline
    pub probability: f64,
    /// `1 - probability`
    pub risk_score: f64,
    /// Qualitative level
    pub risk_level: RiskLevel,
    /// Suggested response
    pub recommendation: String,
    /// Days until the deadline (negative once passed)
    pub days_remaining: i64,
    /// Tasks left
    pub tasks_remaining: u32,
    /// Forecast completion date
    pub estimated_date: NaiveDate,
    /// Current average velocity
    pub current_velocity: f64,
    /// Tasks per day needed to hit the deadline
    pub required_velocity: f64,
}

/// Velocity needed to hit a deadline with a contingency buffer.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RequiredVelocity {
    /// Deadline planned for
    pub deadline: NaiveDate,
    /// Tasks left
    pub tasks_remaining: u32,
    /// Days until the deadline
    pub days_remaining: i64,
    /// Days held back as contingency
    pub buffer_days: i64,
    /// Days left to work with after the buffer
    pub usable_days: i64,
    /// Tasks per usable day needed
    pub required_velocity: f64,
    /// Current average velocity (0 if unknown)
    pub current_velocity: f64,
    /// `required - current`
    pub velocity_gap: f64,
    /// Whether the required pace is realistic
    pub feasible: bool,
}

/// Named what-if interventions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ScenarioType {
    /// Work faster
    IncreaseVelocity,
    /// Cut remaining work
    ReduceScope,
    /// Work streams in parallel
    ParallelWork,
    /// Push the deadline out
    ExtendDeadline,
}

impl ScenarioType {
    /// Every scenario, in comparison order.
    pub const ALL: [ScenarioType; 4] = [
        ScenarioType::IncreaseVelocity,
        ScenarioType::ReduceScope,
        ScenarioType::ParallelWork,
        ScenarioType::ExtendDeadline,
    ];

    /// Get string representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            ScenarioType::IncreaseVelocity => "increase_velocity",
            ScenarioType::ReduceScope => "reduce_scope",
            ScenarioType::ParallelWork => "parallel_work",
            ScenarioType::ExtendDeadline => "extend_deadline",
        }
    }

    /// Resource cost of the intervention.
    pub fn resource_cost(&self) -> ResourceCost {
        match self {
            ScenarioType::IncreaseVelocity => ResourceCost::Medium,
            ScenarioType::ReduceScope => ResourceCost::Low,
            ScenarioType::ParallelWork => ResourceCost::High,
            ScenarioType::ExtendDeadline => ResourceCost::Low,
        }
    }
}

impl std::fmt::Display for ScenarioType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Unknown scenario name.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Unknown scenario '{0}' (expected increase_velocity, reduce_scope, parallel_work or extend_deadline)")]
pub struct ParseScenarioError(String);

impl std::str::FromStr for ScenarioType {
    type Err = ParseScenarioError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().replace('-', "_").as_str() {
            "increase_velocity" => Ok(ScenarioType::IncreaseVelocity),
            "reduce_scope" => Ok(ScenarioType::ReduceScope),
            "parallel_work" => Ok(ScenarioType::ParallelWork),
            "extend_deadline" => Ok(ScenarioType::ExtendDeadline),
            _ => Err(ParseScenarioError(s.to_string())),
        }
    }
}

/// Qualitative cost of a scenario. Ordered cheapest first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceCost {
    /// Little extra effort
    Low,
    /// Some extra effort or coordination
    Medium,
    /// Significant extra people or spend
    High,
}

/// Projection under one scenario.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScenarioResult {
    /// Scenario applied
    pub scenario: ScenarioType,
    /// What the scenario changes
    pub description: String,
    /// Remaining work after the adjustment
    pub tasks_remaining: f64,
    /// Velocity after the adjustment
    pub velocity: f64,
    /// Days to complete after the adjustment
    pub days_to_complete: f64,
    /// Projected completion date
    pub projected_date: NaiveDate,
    /// Deadline after the adjustment
    pub deadline: NaiveDate,
    /// Probability before the adjustment
    pub baseline_probability: f64,
    /// Probability after the adjustment
    pub probability: f64,
    /// `probability - baseline_probability`
    pub probability_delta: f64,
    /// Cost of the intervention
    pub resource_cost: ResourceCost,
}

/// All scenarios side by side.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScenarioComparison {
    /// Forecast without intervention
    pub baseline: CompletionForecast,
    /// One result per scenario
    pub scenarios: Vec<ScenarioResult>,
    /// Highest probability, cheapest on ties
    pub recommended: Option<ScenarioType>,
}

/// Deadline risk and scenario reasoning over analytics forecasts.
#[derive(Clone)]
pub struct PredictionEngine {
    analytics: AnalyticsEngine,
}

impl PredictionEngine {
    /// Create a prediction engine over an analytics engine.
    pub fn new(analytics: AnalyticsEngine) -> Self {
        Self { analytics }
    }

    /// Underlying analytics engine.
    pub fn analytics(&self) -> &AnalyticsEngine {
        &self.analytics
    }

    fn config(&self) -> &PredictionConfig {
        &self.analytics.config().prediction
    }

    /// Forecast date shifted by the band of `confidence_level`.
    pub async fn estimate_completion_date(
        &self,
        goal_id: &GoalId,
        confidence_level: f64,
    ) -> Outcome<CompletionEstimate> {
        let config = self.config();
        self.analytics
            .forecast_completion(goal_id, None)
            .await
            .map(|forecast| {
                let band = ConfidenceBand::from_level(confidence_level, config);
                // A finished goal is done on its baseline date at any confidence
                let shift_days = if forecast.is_complete() {
                    0
                } else {
                    band.shift_days(config)
                };
                let estimated_date = forecast
                    .estimated_date
                    .checked_add_signed(Duration::days(shift_days))
                    .unwrap_or(forecast.estimated_date);

                CompletionEstimate {
                    confidence_level,
                    band,
                    baseline_date: forecast.estimated_date,
                    shift_days,
                    estimated_date,
                    tasks_remaining: forecast.tasks_remaining,
                }
            })
    }

    /// Probability of meeting `deadline` and what to do about it.
    pub async fn assess_deadline_risk(
        &self,
        goal_id: &GoalId,
        deadline: NaiveDate,
    ) -> Outcome<RiskAssessment> {
        let config = self.config();
        let today = self.analytics.today();
        self.analytics
            .forecast_completion(goal_id, Some(deadline))
            .await
            .map(|forecast| {
                let probability = forecast.probability.unwrap_or(0.0);
                let risk_level = RiskLevel::from_probability(probability, config);
                debug!(
                    "Deadline risk for {}: p={:.2} -> {}",
                    goal_id,
                    probability,
                    risk_level.as_str()
                );

                RiskAssessment {
                    deadline,
                    probability,
                    risk_score: 1.0 - probability,
                    risk_level,
                    recommendation: risk_level.recommendation().to_string(),
                    days_remaining: forecast
                        .days_remaining
                        .unwrap_or_else(|| (deadline - today).num_days()),
                    tasks_remaining: forecast.tasks_remaining,
                    estimated_date: forecast.estimated_date,
                    current_velocity: forecast.average_velocity,
                    required_velocity: forecast.required_velocity.unwrap_or(0.0),
                }
            })
    }

    /// Pace needed to finish by `deadline` while keeping a contingency buffer.
    pub async fn calculate_required_velocity(
        &self,
        goal_id: &GoalId,
        deadline: NaiveDate,
    ) -> Outcome<RequiredVelocity> {
        let config = self.config();
        let history = self.analytics.load_history(goal_id).await;
        let Some(latest) = history.latest() else {
            return Outcome::insufficient(1, 0);
        };

        let tasks_remaining = latest.remaining();
        let current_velocity = self
            .analytics
            .velocity_of(&history, None)
            .value()
            .map(|v| v.average_velocity)
            .unwrap_or(0.0);

        let days_remaining = (deadline - self.analytics.today()).num_days();
        let buffer_days = if days_remaining > 0 {
            ((days_remaining as f64 * config.buffer_ratio).floor() as i64)
                .max(config.min_buffer_days)
        } else {
            0
        };
        let usable_days = days_remaining - buffer_days;

        let required_velocity = if tasks_remaining == 0 {
            0.0
        } else if usable_days <= 0 {
            self.analytics.config().forecast.overdue_required_velocity
        } else {
            tasks_remaining as f64 / usable_days as f64
        };

        // Nothing left to do is feasible even with no measured velocity
        let feasible = tasks_remaining == 0
            || (current_velocity > 0.0
                && usable_days > 0
                && required_velocity <= config.feasibility_ratio * current_velocity);

        Outcome::Computed(RequiredVelocity {
            deadline,
            tasks_remaining,
            days_remaining,
            buffer_days,
            usable_days,
            required_velocity,
            current_velocity,
            velocity_gap: required_velocity - current_velocity,
            feasible,
        })
    }

    /// Project one what-if scenario against `deadline`.
    pub async fn scenario_analysis(
        &self,
        goal_id: &GoalId,
        deadline: NaiveDate,
        scenario: ScenarioType,
    ) -> Outcome<ScenarioResult> {
        self.analytics
            .forecast_completion(goal_id, Some(deadline))
            .await
            .map(|baseline| self.apply_scenario(&baseline, deadline, scenario))
    }

    /// Run every scenario and recommend one.
    pub async fn compare_scenarios(
        &self,
        goal_id: &GoalId,
        deadline: NaiveDate,
    ) -> Outcome<ScenarioComparison> {
        self.analytics
            .forecast_completion(goal_id, Some(deadline))
            .await
            .map(|baseline| {
                let scenarios: Vec<ScenarioResult> = ScenarioType::ALL
                    .iter()
                    .map(|s| self.apply_scenario(&baseline, deadline, *s))
                    .collect();
                let recommended = recommend(&scenarios);
                ScenarioComparison {
                    baseline,
                    scenarios,
                    recommended,
                }
            })
    }

    fn apply_scenario(
        &self,
        baseline: &CompletionForecast,
        deadline: NaiveDate,
        scenario: ScenarioType,
    ) -> ScenarioResult {
        let params = &self.config().scenarios;
        let today = self.analytics.today();

        let mut remaining = baseline.tasks_remaining as f64;
        let mut velocity = baseline.average_velocity;
        let mut target = deadline;

        let (bump, description) = match scenario {
            ScenarioType::IncreaseVelocity => {
                velocity *= params.velocity_increase_factor;
                (
                    params.increase_velocity_bump,
                    format!(
                        "Raise velocity by {:.0}%",
                        (params.velocity_increase_factor - 1.0) * 100.0
                    ),
                )
            }
            ScenarioType::ReduceScope => {
                remaining *= params.scope_reduction_factor;
                (
                    params.reduce_scope_bump,
                    format!(
                        "Cut remaining scope by {:.0}%",
                        (1.0 - params.scope_reduction_factor) * 100.0
                    ),
                )
            }
            ScenarioType::ParallelWork => {
                velocity *= params.parallel_factor;
                (
                    params.parallel_work_bump,
                    format!("Run work in parallel ({:.1}x throughput)", params.parallel_factor),
                )
            }
            ScenarioType::ExtendDeadline => {
                target = deadline
                    .checked_add_signed(Duration::days(params.deadline_extension_days))
                    .unwrap_or(deadline);
                (
                    params.extend_deadline_bump,
                    format!("Extend the deadline by {} days", params.deadline_extension_days),
                )
            }
        };

        let days_to_complete = if remaining <= 0.0 || velocity <= 0.0 {
            0.0
        } else {
            remaining / velocity
        };

        let baseline_probability = baseline.probability.unwrap_or(0.0);
        let probability = (baseline_probability + bump).clamp(0.0, 1.0);

        ScenarioResult {
            scenario,
            description,
            tasks_remaining: remaining,
            velocity,
            days_to_complete,
            projected_date: add_days(today, days_to_complete),
            deadline: target,
            baseline_probability,
            probability,
            probability_delta: probability - baseline_probability,
            resource_cost: scenario.resource_cost(),
        }
    }
}

/// Highest probability wins; cheaper cost breaks ties, then comparison order.
fn recommend(scenarios: &[ScenarioResult]) -> Option<ScenarioType> {
    let mut best: Option<&ScenarioResult> = None;
    for candidate in scenarios {
        best = match best {
            None => Some(candidate),
            Some(current) => {
                let better = candidate.probability > current.probability + f64::EPSILON
                    || ((candidate.probability - current.probability).abs() <= f64::EPSILON
                        && candidate.resource_cost < current.resource_cost);
                if better {
                    Some(candidate)
                } else {
                    Some(current)
                }
            }
        };
    }
    best.map(|s| s.scenario)
}
