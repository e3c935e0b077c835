//! Progress Analytics
//!
//! Burndown, velocity, trend, forecast and bottleneck analytics over a
//! goal's daily snapshots, plus deadline risk and scenario prediction.

#![warn(missing_docs)]

pub mod config;
pub mod chart;
pub mod burndown;
pub mod velocity;
pub mod trend;
pub mod forecast;
pub mod bottleneck;
pub mod insight;
pub mod engine;
pub mod prediction;

pub use config::{
    AnalyticsConfig, BottleneckConfig, BurndownConfig, ConfigError, ForecastConfig,
    InsightConfig, PredictionConfig, ScenarioConfig, TrendConfig, VelocityConfig,
};
pub use burndown::{BurndownData, BurndownPoint, BurndownRange};
pub use velocity::{PeriodVelocity, VelocityMetrics, VelocityTrend};
pub use trend::{TrendAnalysis, TrendDirection};
pub use forecast::CompletionForecast;
pub use bottleneck::{Bottleneck, BottleneckKind};
pub use engine::{AnalyticsEngine, AnalyticsReport};
pub use prediction::{
    CompletionEstimate, ConfidenceBand, ParseScenarioError, PredictionEngine, RequiredVelocity,
    ResourceCost, RiskAssessment, RiskLevel, ScenarioComparison, ScenarioResult, ScenarioType,
};
