//! goalpace CLI - record goal progress and report analytics.

mod render;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use goalpace_core::{date, GoalId, SnapshotCounts};
use goalpace_progress::{
    AnalyticsConfig, AnalyticsEngine, BurndownRange, PredictionEngine, ScenarioType,
};
use goalpace_storage::{JsonSnapshotStore, SnapshotStore};
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

use render::Output;

#[derive(Parser)]
#[command(name = "goalpace")]
#[command(about = "Goal progress analytics: burndown, velocity, forecasts and scenarios", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Directory holding the snapshot store
    #[arg(long, global = true, default_value = ".goalpace")]
    data_dir: PathBuf,

    /// JSON file overriding analytics heuristics
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Compute as of this day (YYYY-MM-DD) instead of today
    #[arg(long, global = true, value_parser = parse_day)]
    today: Option<NaiveDate>,

    /// Emit structured JSON instead of text
    #[arg(long, global = true)]
    json: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Record a progress snapshot for a goal
    Record {
        /// Goal ID
        goal: GoalId,
        /// Completed tasks
        #[arg(long)]
        completed: u32,
        /// Total tasks
        #[arg(long)]
        total: u32,
        /// Blocked tasks
        #[arg(long, default_value = "0")]
        blocked: u32,
        /// In-progress tasks
        #[arg(long, default_value = "0")]
        in_progress: u32,
        /// Day to record for (defaults to today)
        #[arg(long, value_parser = parse_day)]
        date: Option<NaiveDate>,
    },
    /// Show the recorded snapshots for a goal
    History {
        /// Goal ID
        goal: GoalId,
    },
    /// List goals with recorded snapshots
    Goals,
    /// Burndown chart over a date window
    Burndown {
        /// Goal ID
        goal: GoalId,
        /// First day (defaults to 14 days before --to)
        #[arg(long, value_parser = parse_day)]
        from: Option<NaiveDate>,
        /// Last day (defaults to today)
        #[arg(long, value_parser = parse_day)]
        to: Option<NaiveDate>,
    },
    /// Velocity per period
    Velocity {
        /// Goal ID
        goal: GoalId,
        /// Number of periods
        #[arg(long)]
        periods: Option<usize>,
    },
    /// Regression trend of completed work
    Trend {
        /// Goal ID
        goal: GoalId,
    },
    /// Completion forecast
    Forecast {
        /// Goal ID
        goal: GoalId,
        /// Deadline (YYYY-MM-DD)
        #[arg(long, value_parser = parse_day)]
        deadline: Option<NaiveDate>,
    },
    /// Detected bottlenecks
    Bottlenecks {
        /// Goal ID
        goal: GoalId,
    },
    /// Textual insights
    Insights {
        /// Goal ID
        goal: GoalId,
        /// Deadline (YYYY-MM-DD)
        #[arg(long, value_parser = parse_day)]
        deadline: Option<NaiveDate>,
    },
    /// Every metric in one report
    Report {
        /// Goal ID
        goal: GoalId,
        /// Deadline (YYYY-MM-DD)
        #[arg(long, value_parser = parse_day)]
        deadline: Option<NaiveDate>,
    },
    /// Completion date at a confidence level
    Estimate {
        /// Goal ID
        goal: GoalId,
        /// Confidence level (0-1)
        #[arg(long, default_value = "0.8")]
        confidence: f64,
    },
    /// Deadline risk assessment
    Risk {
        /// Goal ID
        goal: GoalId,
        /// Deadline (YYYY-MM-DD)
        #[arg(value_parser = parse_day)]
        deadline: NaiveDate,
    },
    /// Velocity needed to hit a deadline
    RequiredVelocity {
        /// Goal ID
        goal: GoalId,
        /// Deadline (YYYY-MM-DD)
        #[arg(value_parser = parse_day)]
        deadline: NaiveDate,
    },
    /// Project one what-if scenario
    Scenario {
        /// Goal ID
        goal: GoalId,
        /// Deadline (YYYY-MM-DD)
        #[arg(value_parser = parse_day)]
        deadline: NaiveDate,
        /// increase_velocity, reduce_scope, parallel_work or extend_deadline
        scenario: ScenarioType,
    },
    /// Compare every scenario
    Compare {
        /// Goal ID
        goal: GoalId,
        /// Deadline (YYYY-MM-DD)
        #[arg(value_parser = parse_day)]
        deadline: NaiveDate,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    // Logs go to stderr so stdout stays clean for reports
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let out = Output::new(cli.json);

    let config = match &cli.config {
        Some(path) => AnalyticsConfig::from_json_file(path)
            .with_context(|| format!("Loading config {}", path.display()))?,
        None => AnalyticsConfig::default(),
    };

    let store: Arc<dyn SnapshotStore> = Arc::new(
        JsonSnapshotStore::new(&cli.data_dir)
            .await
            .with_context(|| format!("Opening store at {}", cli.data_dir.display()))?,
    );
    debug!("Using store at {}", cli.data_dir.display());

    let mut analytics = AnalyticsEngine::new(store.clone()).with_config(config);
    if let Some(today) = cli.today {
        analytics = analytics.with_reference_date(today);
    }

    match cli.command {
        Commands::Record {
            goal,
            completed,
            total,
            blocked,
            in_progress,
            date,
        } => {
            let counts = SnapshotCounts::new(completed, total)
                .with_blocked(blocked)
                .with_in_progress(in_progress);
            let day = date.unwrap_or_else(|| analytics.today());
            let history = analytics.record_snapshot_on(&goal, day, counts).await?;
            info!("Goal {} now has {} snapshots", goal, history.len());
            out.history(&history)?;
        }
        Commands::History { goal } => {
            let history = analytics.load_history(&goal).await;
            out.history(&history)?;
        }
        Commands::Goals => {
            let goals = store.list_goals().await?;
            out.goals(&goals)?;
        }
        Commands::Burndown { goal, from, to } => {
            let range = BurndownRange { start: from, end: to };
            out.burndown(&analytics.burndown(&goal, range).await)?;
        }
        Commands::Velocity { goal, periods } => {
            out.velocity(&analytics.velocity_metrics(&goal, periods).await)?;
        }
        Commands::Trend { goal } => {
            out.trend(&analytics.trend_analysis(&goal).await)?;
        }
        Commands::Forecast { goal, deadline } => {
            out.forecast(&analytics.forecast_completion(&goal, deadline).await)?;
        }
        Commands::Bottlenecks { goal } => {
            out.bottlenecks(&analytics.detect_bottlenecks(&goal).await)?;
        }
        Commands::Insights { goal, deadline } => {
            out.insights(&analytics.generate_insights(&goal, deadline).await)?;
        }
        Commands::Report { goal, deadline } => {
            out.report(&analytics.report(&goal, deadline).await)?;
        }
        Commands::Estimate { goal, confidence } => {
            let prediction = PredictionEngine::new(analytics);
            out.estimate(&prediction.estimate_completion_date(&goal, confidence).await)?;
        }
        Commands::Risk { goal, deadline } => {
            let prediction = PredictionEngine::new(analytics);
            out.risk(&prediction.assess_deadline_risk(&goal, deadline).await)?;
        }
        Commands::RequiredVelocity { goal, deadline } => {
            let prediction = PredictionEngine::new(analytics);
            out.required_velocity(&prediction.calculate_required_velocity(&goal, deadline).await)?;
        }
        Commands::Scenario {
            goal,
            deadline,
            scenario,
        } => {
            let prediction = PredictionEngine::new(analytics);
            out.scenario(&prediction.scenario_analysis(&goal, deadline, scenario).await)?;
        }
        Commands::Compare { goal, deadline } => {
            let prediction = PredictionEngine::new(analytics);
            out.comparison(&prediction.compare_scenarios(&goal, deadline).await)?;
        }
    }

    Ok(())
}

fn parse_day(s: &str) -> std::result::Result<NaiveDate, String> {
    date::parse_date(s).map_err(|e| e.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_record_command() {
        let cli = Cli::try_parse_from([
            "goalpace", "record", "launch", "--completed", "3", "--total", "9", "--blocked", "1",
            "--date", "2024-05-02",
        ])
        .unwrap();
        match cli.command {
            Commands::Record { goal, completed, total, blocked, date, .. } => {
                assert_eq!(goal.as_str(), "launch");
                assert_eq!((completed, total, blocked), (3, 9, 1));
                assert_eq!(date, NaiveDate::from_ymd_opt(2024, 5, 2));
            }
            _ => panic!("expected record"),
        }
    }

    #[test]
    fn test_parse_scenario_and_global_flags() {
        let cli = Cli::try_parse_from([
            "goalpace", "scenario", "launch", "2024-06-30", "reduce-scope", "--json", "--today",
            "2024-06-01",
        ])
        .unwrap();
        assert!(cli.json);
        assert_eq!(cli.today, NaiveDate::from_ymd_opt(2024, 6, 1));
        assert!(matches!(
            cli.command,
            Commands::Scenario { scenario: ScenarioType::ReduceScope, .. }
        ));
    }

    #[test]
    fn test_bad_date_is_rejected() {
        assert!(Cli::try_parse_from(["goalpace", "risk", "launch", "30/06/2024"]).is_err());
    }
}
