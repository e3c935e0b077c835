//! Tunable heuristics for the analytics and prediction engines.
//!
//! Every threshold the engines use lives here. The defaults reproduce the
//! stock behaviour; a JSON file can override any subset of them.

use std::path::Path;

use serde::{Deserialize, Serialize};

/// Errors loading a configuration file.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// File could not be read
    #[error("Failed to read config {path}: {source}")]
    Io {
        /// Config path
        path: String,
        /// Underlying error
        source: std::io::Error,
    },

    /// File was not valid JSON for the config schema
    #[error("Invalid config {path}: {source}")]
    Parse {
        /// Config path
        path: String,
        /// Underlying error
        source: serde_json::Error,
    },
}

/// Configuration for the analytics engine.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalyticsConfig {
    /// Burndown window and chart size
    pub burndown: BurndownConfig,
    /// Velocity chunking and trend ratios
    pub velocity: VelocityConfig,
    /// Regression thresholds
    pub trend: TrendConfig,
    /// Forecast bands and probabilities
    pub forecast: ForecastConfig,
    /// Bottleneck detection thresholds
    pub bottleneck: BottleneckConfig,
    /// Insight probability thresholds
    pub insight: InsightConfig,
    /// Prediction engine policy
    pub prediction: PredictionConfig,
}

impl AnalyticsConfig {
    /// Load a (possibly partial) JSON override. Missing keys keep defaults.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_json_str(&raw).map_err(|source| ConfigError::Parse {
            path: path.display().to_string(),
            source,
        })
    }

    /// Parse a (possibly partial) JSON override.
    pub fn from_json_str(raw: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(raw)
    }
}

/// Burndown settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BurndownConfig {
    /// Days covered when no explicit range is given
    pub default_window_days: i64,
    /// Maximum chart columns
    pub chart_width: usize,
    /// Chart rows
    pub chart_height: usize,
}

impl Default for BurndownConfig {
    fn default() -> Self {
        Self {
            default_window_days: 14,
            chart_width: 60,
            chart_height: 10,
        }
    }
}

/// Velocity settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VelocityConfig {
    /// Chunks the history is split into when no count is given
    pub default_periods: usize,
    /// Last/first ratio above which velocity is improving
    pub improving_ratio: f64,
    /// Last/first ratio below which velocity is declining
    pub declining_ratio: f64,
}

impl Default for VelocityConfig {
    fn default() -> Self {
        Self {
            default_periods: 4,
            improving_ratio: 1.1,
            declining_ratio: 0.9,
        }
    }
}

/// Regression settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrendConfig {
    /// Minimum points for a regression
    pub min_points: usize,
    /// Slope magnitude (tasks/day) separating a direction from flat
    pub slope_threshold: f64,
}

impl Default for TrendConfig {
    fn default() -> Self {
        Self {
            min_points: 3,
            slope_threshold: 0.1,
        }
    }
}

/// Forecast settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ForecastConfig {
    /// Multiplier on days-to-complete for the late estimate
    pub pessimistic_factor: f64,
    /// Multiplier on days-to-complete for the early estimate
    pub optimistic_factor: f64,
    /// Upper bound on forecast confidence
    pub max_confidence: f64,
    /// Probability reported when the forecast lands before the deadline
    pub on_schedule_probability: f64,
    /// Required velocity reported once the deadline has passed
    pub overdue_required_velocity: f64,
}

impl Default for ForecastConfig {
    fn default() -> Self {
        Self {
            pessimistic_factor: 1.2,
            optimistic_factor: 0.8,
            max_confidence: 0.95,
            on_schedule_probability: 0.9,
            overdue_required_velocity: 999.0,
        }
    }
}

/// Bottleneck settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BottleneckConfig {
    /// History must span more than this many days before blocked work counts
    pub min_window_days: i64,
    /// Blocked count above which severity is high
    pub high_blocked_threshold: u32,
    /// Trailing points checked for a stall
    pub stall_points: usize,
}

impl Default for BottleneckConfig {
    fn default() -> Self {
        Self {
            min_window_days: 2,
            high_blocked_threshold: 3,
            stall_points: 3,
        }
    }
}

/// Insight settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InsightConfig {
    /// Probability above which a goal is reported on track
    pub on_track_probability: f64,
    /// Probability below which a goal is reported at risk
    pub at_risk_probability: f64,
    /// Bottlenecks mentioned at most
    pub max_bottlenecks: usize,
}

impl Default for InsightConfig {
    fn default() -> Self {
        Self {
            on_track_probability: 0.8,
            at_risk_probability: 0.3,
            max_bottlenecks: 2,
        }
    }
}

/// Prediction engine settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PredictionConfig {
    /// Confidence level at or above which the high band applies
    pub high_confidence_level: f64,
    /// Confidence level below which the low band applies
    pub low_confidence_level: f64,
    /// Days added to the baseline date for the high band
    pub high_confidence_shift_days: i64,
    /// Days added to the baseline date for the central band
    pub central_confidence_shift_days: i64,
    /// Days added to the baseline date for the low band
    pub low_confidence_shift_days: i64,
    /// Probability above which a deadline is on track
    pub on_track_probability: f64,
    /// Probability above which a deadline is slightly behind
    pub slightly_behind_probability: f64,
    /// Probability above which a deadline is at risk (else high risk)
    pub at_risk_probability: f64,
    /// Share of remaining days held back as contingency
    pub buffer_ratio: f64,
    /// Minimum contingency days
    pub min_buffer_days: i64,
    /// Required velocity is feasible up to this multiple of current velocity
    pub feasibility_ratio: f64,
    /// Scenario parameters
    pub scenarios: ScenarioConfig,
}

impl Default for PredictionConfig {
    fn default() -> Self {
        Self {
            high_confidence_level: 0.9,
            low_confidence_level: 0.7,
            high_confidence_shift_days: 3,
            central_confidence_shift_days: 0,
            low_confidence_shift_days: -2,
            on_track_probability: 0.9,
            slightly_behind_probability: 0.7,
            at_risk_probability: 0.5,
            buffer_ratio: 0.2,
            min_buffer_days: 1,
            feasibility_ratio: 1.5,
            scenarios: ScenarioConfig::default(),
        }
    }
}

/// What-if scenario parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScenarioConfig {
    /// Velocity multiplier for `increase_velocity`
    pub velocity_increase_factor: f64,
    /// Remaining-work multiplier for `reduce_scope`
    pub scope_reduction_factor: f64,
    /// Throughput multiplier for `parallel_work`
    pub parallel_factor: f64,
    /// Days added for `extend_deadline`
    pub deadline_extension_days: i64,
    /// Probability bump for `increase_velocity`
    pub increase_velocity_bump: f64,
    /// Probability bump for `reduce_scope`
    pub reduce_scope_bump: f64,
    /// Probability bump for `parallel_work`
    pub parallel_work_bump: f64,
    /// Probability bump for `extend_deadline`
    pub extend_deadline_bump: f64,
}

impl Default for ScenarioConfig {
    fn default() -> Self {
        Self {
            velocity_increase_factor: 1.2,
            scope_reduction_factor: 0.8,
            parallel_factor: 2.0,
            deadline_extension_days: 14,
            increase_velocity_bump: 0.15,
            reduce_scope_bump: 0.2,
            parallel_work_bump: 0.25,
            extend_deadline_bump: 0.2,
        }
    }
}
