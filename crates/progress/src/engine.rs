//! Analytics engine - derives progress metrics from a goal's snapshot history.
//!
//! Every query reloads the history from the injected store and computes the
//! metric fresh; nothing is cached between calls.

use std::sync::Arc;

use chrono::NaiveDate;
use goalpace_core::{date, GoalId, History, Outcome, Snapshot, SnapshotCounts};
use goalpace_storage::{SnapshotStore, StorageError};
use serde::Serialize;
use tracing::{debug, warn};

use crate::bottleneck::{detect_bottlenecks, Bottleneck};
use crate::burndown::{compute_burndown, BurndownData, BurndownRange};
use crate::config::AnalyticsConfig;
use crate::forecast::{compute_forecast, CompletionForecast};
use crate::insight::generate_insights;
use crate::trend::{compute_trend, TrendAnalysis};
use crate::velocity::{compute_velocity, VelocityMetrics};

/// Every metric for one goal, computed from a single history load.
#[derive(Debug, Clone, Serialize)]
pub struct AnalyticsReport {
    /// Goal reported on
    pub goal_id: GoalId,
    /// Day the report was computed for
    pub as_of: NaiveDate,
    /// Snapshots in the history
    pub snapshot_count: usize,
    /// Latest recorded snapshot
    pub latest: Option<Snapshot>,
    /// Burndown over the default window
    pub burndown: Outcome<BurndownData>,
    /// Velocity over the default periods
    pub velocity: Outcome<VelocityMetrics>,
    /// Regression trend
    pub trend: Outcome<TrendAnalysis>,
    /// Completion forecast
    pub forecast: Outcome<CompletionForecast>,
    /// Detected bottlenecks, most severe first
    pub bottlenecks: Vec<Bottleneck>,
    /// Textual insights
    pub insights: Vec<String>,
}

/// Computes burndown, velocity, trend, forecast, bottlenecks and insights.
#[derive(Clone)]
pub struct AnalyticsEngine {
    store: Arc<dyn SnapshotStore>,
    config: AnalyticsConfig,
    reference_date: Option<NaiveDate>,
}

impl AnalyticsEngine {
    /// Create an engine over a snapshot store.
    pub fn new(store: Arc<dyn SnapshotStore>) -> Self {
        Self {
            store,
            config: AnalyticsConfig::default(),
            reference_date: None,
        }
    }

    /// Set the configuration.
    pub fn with_config(mut self, config: AnalyticsConfig) -> Self {
        self.config = config;
        self
    }

    /// Pin "today" instead of reading the system clock.
    pub fn with_reference_date(mut self, today: NaiveDate) -> Self {
        self.reference_date = Some(today);
        self
    }

    /// Active configuration.
    pub fn config(&self) -> &AnalyticsConfig {
        &self.config
    }

    /// The day computations are relative to.
    pub fn today(&self) -> NaiveDate {
        self.reference_date.unwrap_or_else(date::today)
    }

    /// Record today's counts for a goal, overwriting any snapshot already taken today.
    pub async fn record_snapshot(
        &self,
        goal_id: &GoalId,
        counts: SnapshotCounts,
    ) -> Result<History, StorageError> {
        self.record_snapshot_on(goal_id, self.today(), counts).await
    }

    /// Record counts for a specific day.
    pub async fn record_snapshot_on(
        &self,
        goal_id: &GoalId,
        day: NaiveDate,
        counts: SnapshotCounts,
    ) -> Result<History, StorageError> {
        let snapshot = Snapshot::new(day, counts)?;
        self.store.record_snapshot(goal_id, snapshot).await
    }

    /// Load a goal's history, degrading to empty if the store fails.
    pub async fn load_history(&self, goal_id: &GoalId) -> History {
        match self.store.load_history(goal_id).await {
            Ok(history) => {
                debug!("Loaded {} snapshots for goal {}", history.len(), goal_id);
                history
            }
            Err(e) => {
                warn!("Failed to load history for goal {}, using empty history: {}", goal_id, e);
                History::empty(goal_id.clone())
            }
        }
    }

    /// Ideal vs actual remaining work over a window (default: last 14 days).
    pub async fn burndown(&self, goal_id: &GoalId, range: BurndownRange) -> Outcome<BurndownData> {
        let history = self.load_history(goal_id).await;
        compute_burndown(&history.snapshots, range, self.today(), &self.config.burndown)
    }

    /// Velocity over `periods` chunks (default from config).
    pub async fn velocity_metrics(
        &self,
        goal_id: &GoalId,
        periods: Option<usize>,
    ) -> Outcome<VelocityMetrics> {
        let history = self.load_history(goal_id).await;
        self.velocity_of(&history, periods)
    }

    /// Least-squares trend of completed work.
    pub async fn trend_analysis(&self, goal_id: &GoalId) -> Outcome<TrendAnalysis> {
        let history = self.load_history(goal_id).await;
        compute_trend(&history.snapshots, &self.config.trend)
    }

    /// Projected completion, optionally against a deadline.
    pub async fn forecast_completion(
        &self,
        goal_id: &GoalId,
        deadline: Option<NaiveDate>,
    ) -> Outcome<CompletionForecast> {
        let history = self.load_history(goal_id).await;
        self.forecast_of(&history, deadline)
    }

    /// Blocked and stalled conditions, most severe first.
    pub async fn detect_bottlenecks(&self, goal_id: &GoalId) -> Vec<Bottleneck> {
        let history = self.load_history(goal_id).await;
        detect_bottlenecks(&history.snapshots, &self.config.bottleneck)
    }

    /// Textual insights; always at least one.
    pub async fn generate_insights(
        &self,
        goal_id: &GoalId,
        deadline: Option<NaiveDate>,
    ) -> Vec<String> {
        let history = self.load_history(goal_id).await;
        self.analyze(&history, deadline).insights
    }

    /// All metrics for a goal from one history load.
    pub async fn report(&self, goal_id: &GoalId, deadline: Option<NaiveDate>) -> AnalyticsReport {
        let history = self.load_history(goal_id).await;
        self.analyze(&history, deadline)
    }

    /// All metrics for an already-loaded history.
    pub fn analyze(&self, history: &History, deadline: Option<NaiveDate>) -> AnalyticsReport {
        let snapshots = &history.snapshots;
        let velocity = self.velocity_of(history, None);
        let trend = compute_trend(snapshots, &self.config.trend);
        let forecast = compute_forecast(
            snapshots,
            &velocity,
            self.today(),
            deadline,
            &self.config.forecast,
        );
        let bottlenecks = detect_bottlenecks(snapshots, &self.config.bottleneck);
        let insights = generate_insights(
            &velocity,
            &trend,
            &forecast,
            &bottlenecks,
            &self.config.insight,
        );

        AnalyticsReport {
            goal_id: history.goal_id.clone(),
            as_of: self.today(),
            snapshot_count: snapshots.len(),
            latest: history.latest().copied(),
            burndown: compute_burndown(
                snapshots,
                BurndownRange::default(),
                self.today(),
                &self.config.burndown,
            ),
            velocity,
            trend,
            forecast,
            bottlenecks,
            insights,
        }
    }

    pub(crate) fn velocity_of(
        &self,
        history: &History,
        periods: Option<usize>,
    ) -> Outcome<VelocityMetrics> {
        let periods = periods.unwrap_or(self.config.velocity.default_periods);
        compute_velocity(&history.snapshots, periods, &self.config.velocity)
    }

    pub(crate) fn forecast_of(
        &self,
        history: &History,
        deadline: Option<NaiveDate>,
    ) -> Outcome<CompletionForecast> {
        let velocity = self.velocity_of(history, None);
        compute_forecast(
            &history.snapshots,
            &velocity,
            self.today(),
            deadline,
            &self.config.forecast,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bottleneck::BottleneckKind;
    use crate::trend::TrendDirection;
    use crate::velocity::VelocityTrend;
    use chrono::Duration;
    use goalpace_storage::MemorySnapshotStore;

    fn start() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 10, 1).unwrap()
    }

    fn engine(today: NaiveDate) -> AnalyticsEngine {
        AnalyticsEngine::new(Arc::new(MemorySnapshotStore::new())).with_reference_date(today)
    }

    /// 14 days where completion climbs to 10 of 20 and blocked work tapers off.
    async fn seeded(goal: &GoalId) -> AnalyticsEngine {
        let engine = engine(start() + Duration::days(13));
        for i in 0..14u32 {
            let counts = SnapshotCounts::new(i.min(10), 20).with_blocked(3u32.saturating_sub(i / 5));
            engine
                .record_snapshot_on(goal, start() + Duration::days(i as i64), counts)
                .await
                .unwrap();
        }
        engine
    }

    #[tokio::test]
    async fn test_deterministic_scenario() {
        let goal = GoalId::new("release");
        let engine = seeded(&goal).await;

        let velocity = engine.velocity_metrics(&goal, Some(4)).await.into_value().unwrap();
        assert!(velocity.average_velocity > 0.0);

        // Chunks of 3 drop the last 2 points, so the final period only gains
        // 9 -> 10 and period velocity reads as declining even though work is
        // still being completed. The regression trend is what stays positive.
        let deltas: Vec<u32> = velocity.periods.iter().map(|p| p.completed).collect();
        assert_eq!(deltas, vec![2, 2, 2, 1]);
        assert_eq!(velocity.trend, VelocityTrend::Declining);

        let trend = engine.trend_analysis(&goal).await.into_value().unwrap();
        assert_eq!(trend.direction, TrendDirection::Positive);

        let forecast = engine.forecast_completion(&goal, None).await.into_value().unwrap();
        assert_eq!(forecast.tasks_remaining, 10);
    }

    #[tokio::test]
    async fn test_scenario_bottlenecks_and_insights() {
        let goal = GoalId::new("release");
        let engine = seeded(&goal).await;

        // Completed has sat at 10 since day 10 and one task is still blocked
        let bottlenecks = engine.detect_bottlenecks(&goal).await;
        let kinds: Vec<_> = bottlenecks.iter().map(|b| b.kind).collect();
        assert_eq!(kinds, vec![BottleneckKind::Stalled, BottleneckKind::Blocked]);

        let insights = engine.generate_insights(&goal, None).await;
        assert!(insights.iter().any(|i| i.contains("Bottleneck (critical)")));
    }

    #[tokio::test]
    async fn test_same_day_record_keeps_length() {
        let goal = GoalId::new("g");
        let engine = engine(start());

        engine.record_snapshot(&goal, SnapshotCounts::new(1, 5)).await.unwrap();
        let before = engine.load_history(&goal).await.len();
        engine.record_snapshot(&goal, SnapshotCounts::new(2, 5)).await.unwrap();
        let history = engine.load_history(&goal).await;

        assert_eq!(history.len(), before);
        assert_eq!(history.latest().unwrap().completed, 2);
    }

    #[tokio::test]
    async fn test_invalid_counts_are_rejected() {
        let engine = engine(start());
        let err = engine
            .record_snapshot(&GoalId::new("g"), SnapshotCounts::new(6, 5))
            .await
            .unwrap_err();
        assert!(matches!(err, StorageError::Core(_)));
    }

    #[tokio::test]
    async fn test_unknown_goal_yields_no_results() {
        let engine = engine(start());
        let goal = GoalId::new("ghost");

        assert!(!engine.burndown(&goal, BurndownRange::default()).await.is_computed());
        assert!(!engine.velocity_metrics(&goal, None).await.is_computed());
        assert!(!engine.trend_analysis(&goal).await.is_computed());
        assert!(!engine.forecast_completion(&goal, None).await.is_computed());
        assert!(engine.detect_bottlenecks(&goal).await.is_empty());
        assert_eq!(engine.generate_insights(&goal, None).await.len(), 1);
    }

    #[tokio::test]
    async fn test_finished_goal_forecast() {
        let goal = GoalId::new("done");
        let engine = engine(start());
        engine.record_snapshot(&goal, SnapshotCounts::new(7, 7)).await.unwrap();

        let forecast = engine.forecast_completion(&goal, None).await.into_value().unwrap();
        assert_eq!(forecast.tasks_remaining, 0);
        assert_eq!(forecast.probability, Some(1.0));
    }

    #[tokio::test]
    async fn test_report_bundles_metrics() {
        let goal = GoalId::new("release");
        let engine = seeded(&goal).await;
        let deadline = start() + Duration::days(40);

        let report = engine.report(&goal, Some(deadline)).await;
        assert_eq!(report.snapshot_count, 14);
        assert_eq!(report.as_of, start() + Duration::days(13));
        assert!(report.burndown.is_computed());
        assert!(report.velocity.is_computed());
        assert_eq!(report.forecast.value().unwrap().deadline, Some(deadline));
        assert!(!report.insights.is_empty());
    }
}
