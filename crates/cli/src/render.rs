//! Text and JSON rendering of analytics results.

use anyhow::Result;
use goalpace_core::{GoalId, History, Outcome};
use goalpace_progress::{
    AnalyticsReport, Bottleneck, BurndownData, CompletionEstimate, CompletionForecast,
    RequiredVelocity, RiskAssessment, ScenarioComparison, ScenarioResult, TrendAnalysis,
    VelocityMetrics,
};
use serde::Serialize;

/// Prints results either as pretty JSON or as text.
pub struct Output {
    json: bool,
}

impl Output {
    pub fn new(json: bool) -> Self {
        Self { json }
    }

    fn emit<T: Serialize>(&self, value: &T, text: impl FnOnce() -> String) -> Result<()> {
        if self.json {
            println!("{}", serde_json::to_string_pretty(value)?);
        } else {
            println!("{}", text());
        }
        Ok(())
    }

    fn emit_outcome<T: Serialize>(
        &self,
        outcome: &Outcome<T>,
        text: impl FnOnce(&T) -> String,
    ) -> Result<()> {
        self.emit(outcome, || match outcome {
            Outcome::Computed(value) => text(value),
            other => other.reason().unwrap_or_default(),
        })
    }

    pub fn history(&self, history: &History) -> Result<()> {
        self.emit(history, || history_text(history))
    }

    pub fn goals(&self, goals: &[GoalId]) -> Result<()> {
        self.emit(&goals, || {
            if goals.is_empty() {
                "No goals recorded yet".to_string()
            } else {
                goals
                    .iter()
                    .map(|g| g.to_string())
                    .collect::<Vec<_>>()
                    .join("\n")
            }
        })
    }

    pub fn burndown(&self, burndown: &Outcome<BurndownData>) -> Result<()> {
        self.emit_outcome(burndown, burndown_text)
    }

    pub fn velocity(&self, velocity: &Outcome<VelocityMetrics>) -> Result<()> {
        self.emit_outcome(velocity, velocity_text)
    }

    pub fn trend(&self, trend: &Outcome<TrendAnalysis>) -> Result<()> {
        self.emit_outcome(trend, trend_text)
    }

    pub fn forecast(&self, forecast: &Outcome<CompletionForecast>) -> Result<()> {
        self.emit_outcome(forecast, forecast_text)
    }

    pub fn bottlenecks(&self, bottlenecks: &[Bottleneck]) -> Result<()> {
        self.emit(&bottlenecks, || bottlenecks_text(bottlenecks))
    }

    pub fn insights(&self, insights: &[String]) -> Result<()> {
        self.emit(&insights, || bullets(insights))
    }

    pub fn report(&self, report: &AnalyticsReport) -> Result<()> {
        self.emit(report, || {
            let mut out = format!(
                "Goal {} as of {} ({} snapshots)\n",
                report.goal_id, report.as_of, report.snapshot_count
            );
            let sections = [
                ("Burndown", section(&report.burndown, burndown_text)),
                ("Velocity", section(&report.velocity, velocity_text)),
                ("Trend", section(&report.trend, trend_text)),
                ("Forecast", section(&report.forecast, forecast_text)),
                ("Bottlenecks", bottlenecks_text(&report.bottlenecks)),
                ("Insights", bullets(&report.insights)),
            ];
            for (title, body) in sections {
                out.push_str(&format!("\n== {} ==\n{}\n", title, body));
            }
            out
        })
    }

    pub fn estimate(&self, estimate: &Outcome<CompletionEstimate>) -> Result<()> {
        self.emit_outcome(estimate, |e| {
            format!(
                "Estimated completion: {} ({:?} band at {:.0}% confidence, {:+} days from {})\nTasks remaining: {}",
                e.estimated_date,
                e.band,
                e.confidence_level * 100.0,
                e.shift_days,
                e.baseline_date,
                e.tasks_remaining
            )
        })
    }

    pub fn risk(&self, risk: &Outcome<RiskAssessment>) -> Result<()> {
        self.emit_outcome(risk, |r| {
            format!(
                "Risk: {} (score {:.2}, {:.0}% likely)\n\
                 Deadline {} in {} days, estimated completion {}\n\
                 Velocity: current {:.2}/day, required {:.2}/day for {} tasks\n\
                 {}",
                r.risk_level.as_str(),
                r.risk_score,
                r.probability * 100.0,
                r.deadline,
                r.days_remaining,
                r.estimated_date,
                r.current_velocity,
                r.required_velocity,
                r.tasks_remaining,
                r.recommendation
            )
        })
    }

    pub fn required_velocity(&self, required: &Outcome<RequiredVelocity>) -> Result<()> {
        self.emit_outcome(required, |r| {
            format!(
                "Required velocity: {:.2} tasks/day ({} tasks over {} usable days, {} buffer)\n\
                 Current velocity: {:.2} tasks/day (gap {:+.2})\n\
                 Feasible: {}",
                r.required_velocity,
                r.tasks_remaining,
                r.usable_days,
                r.buffer_days,
                r.current_velocity,
                r.velocity_gap,
                if r.feasible { "yes" } else { "no" }
            )
        })
    }

    pub fn scenario(&self, scenario: &Outcome<ScenarioResult>) -> Result<()> {
        self.emit_outcome(scenario, scenario_text)
    }

    pub fn comparison(&self, comparison: &Outcome<ScenarioComparison>) -> Result<()> {
        self.emit_outcome(comparison, |c| {
            let mut out = format!(
                "Baseline: {} ({:.1} days, {:.0}% likely)\n",
                c.baseline.estimated_date,
                c.baseline.days_to_complete,
                c.baseline.probability.unwrap_or(0.0) * 100.0
            );
            for result in &c.scenarios {
                out.push('\n');
                out.push_str(&scenario_text(result));
                out.push('\n');
            }
            match c.recommended {
                Some(s) => out.push_str(&format!("\nRecommended: {}", s)),
                None => out.push_str("\nNo scenario to recommend"),
            }
            out
        })
    }
}

fn section<T>(outcome: &Outcome<T>, text: impl FnOnce(&T) -> String) -> String {
    match outcome {
        Outcome::Computed(value) => text(value),
        other => other.reason().unwrap_or_default(),
    }
}

fn bullets(lines: &[String]) -> String {
    lines
        .iter()
        .map(|l| format!("- {}", l))
        .collect::<Vec<_>>()
        .join("\n")
}

fn history_text(history: &History) -> String {
    if history.is_empty() {
        return format!("No snapshots for goal {}", history.goal_id);
    }
    let mut out = format!("Goal {} ({} snapshots)\n", history.goal_id, history.len());
    for s in &history.snapshots {
        out.push_str(&format!(
            "{}  {:>4}/{:<4} blocked {:<3} in progress {}\n",
            s.date, s.completed, s.total, s.blocked, s.in_progress
        ));
    }
    out.trim_end().to_string()
}

fn burndown_text(b: &BurndownData) -> String {
    format!(
        "{} to {}: {} of {} tasks completed in range\n\n{}",
        b.start_date, b.end_date, b.completed_in_range, b.total_scope, b.chart
    )
}

fn velocity_text(v: &VelocityMetrics) -> String {
    let mut out = format!(
        "Average velocity: {:.2} tasks/period, trend {} (momentum {:+.2})\n",
        v.average_velocity,
        v.trend.as_str(),
        v.momentum
    );
    for p in &v.periods {
        out.push_str(&format!("{} .. {}: {}\n", p.start, p.end, p.completed));
    }
    out.trim_end().to_string()
}

fn trend_text(t: &TrendAnalysis) -> String {
    format!(
        "Slope {:.3} tasks/day, intercept {:.2}, R² {:.3}\nDirection {}, momentum {:.2} ({} samples)",
        t.slope,
        t.intercept,
        t.r_squared,
        t.direction.as_str(),
        t.momentum_score,
        t.samples
    )
}

fn forecast_text(f: &CompletionForecast) -> String {
    if f.is_complete() {
        return format!("All tasks completed as of {}", f.estimated_date);
    }
    let mut out = format!(
        "{} tasks remaining at {:.2} tasks/day: {:.1} days\n\
         Estimated {} (range {} .. {}), confidence {:.0}%",
        f.tasks_remaining,
        f.average_velocity,
        f.days_to_complete,
        f.estimated_date,
        f.low_estimate,
        f.high_estimate,
        f.confidence * 100.0
    );
    if let (Some(deadline), Some(probability)) = (f.deadline, f.probability) {
        out.push_str(&format!(
            "\nDeadline {}: {:.0}% likely",
            deadline,
            probability * 100.0
        ));
        if let Some(required) = f.required_velocity {
            out.push_str(&format!(", needs {:.2} tasks/day", required));
        }
    }
    out
}

fn bottlenecks_text(bottlenecks: &[Bottleneck]) -> String {
    if bottlenecks.is_empty() {
        return "No bottlenecks detected".to_string();
    }
    bottlenecks
        .iter()
        .map(|b| {
            format!(
                "[{}] {}: {}\n  -> {}",
                b.severity,
                b.kind.as_str(),
                b.description,
                b.recommendation
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

fn scenario_text(s: &ScenarioResult) -> String {
    format!(
        "{} ({:?} cost): {}\n  {:.1} tasks at {:.2}/day -> {} ({:.1} days), deadline {}\n  Probability {:.0}% ({:+.0} points)",
        s.scenario,
        s.resource_cost,
        s.description,
        s.tasks_remaining,
        s.velocity,
        s.projected_date,
        s.days_to_complete,
        s.deadline,
        s.probability * 100.0,
        s.probability_delta * 100.0
    )
}
