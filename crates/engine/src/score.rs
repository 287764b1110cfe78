//! Sub-scores and the weighted priority score.

use crate::config::ScoringConfig;
use crate::strategy::{Strategy, Weights};
use crate::task::Task;
use chrono::NaiveDate;
use taskrank_graph::{GraphMetrics, MetricsReport};

/// Batch-wide inputs shared by every task's score.
#[derive(Debug, Clone, Copy)]
pub struct ScoringContext {
    /// Reference date for deadlines.
    pub today: NaiveDate,
    /// Largest cumulative upstream hours in the batch.
    pub max_cumulative_upstream_hours: f64,
    /// Largest descendant count in the batch.
    pub max_descendant_count: usize,
    /// Tunable constants.
    pub config: ScoringConfig,
}

impl ScoringContext {
    /// Capture the normalization maxima of a metrics report.
    #[must_use]
    pub fn new(today: NaiveDate, metrics: &MetricsReport, config: ScoringConfig) -> Self {
        Self {
            today,
            max_cumulative_upstream_hours: metrics.max_cumulative_upstream_hours(),
            max_descendant_count: metrics.max_descendant_count(),
            config,
        }
    }
}

/// The four normalized inputs of every strategy, each in `[0, 1]`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SubScores {
    /// Deadline pressure.
    pub urgency: f64,
    /// `importance / 10`.
    pub importance: f64,
    /// Upstream effort relative to the batch maximum.
    pub critical_path: f64,
    /// Descendant count relative to the batch maximum.
    pub blocking_fanout: f64,
}

impl SubScores {
    /// Compute the sub-scores of one task.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn compute(task: &Task, metrics: &GraphMetrics, ctx: &ScoringContext) -> Self {
        Self {
            urgency: urgency(task.due_date, ctx.today, &ctx.config),
            importance: f64::from(task.importance) / 10.0,
            critical_path: ratio(
                metrics.cumulative_upstream_hours,
                ctx.max_cumulative_upstream_hours,
            ),
            blocking_fanout: ratio(
                metrics.descendant_count as f64,
                ctx.max_descendant_count as f64,
            ),
        }
    }
}

/// Weighted contributions of the sub-scores, as fractions of the full scale.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Contributions {
    /// Weighted urgency.
    pub urgency: f64,
    /// Weighted importance.
    pub importance: f64,
    /// Weighted critical path.
    pub critical_path: f64,
    /// Weighted blocking fanout.
    pub blocking_fanout: f64,
}

impl Contributions {
    /// Apply a weight row to sub-scores.
    #[must_use]
    pub fn new(weights: Weights, subs: &SubScores) -> Self {
        let w = |percent: u8| f64::from(percent) / 100.0;
        Self {
            urgency: w(weights.urgency) * subs.urgency,
            importance: w(weights.importance) * subs.importance,
            critical_path: w(weights.critical_path) * subs.critical_path,
            blocking_fanout: w(weights.blocking_fanout) * subs.blocking_fanout,
        }
    }

    /// Sum of all contributions.
    #[must_use]
    pub fn total(&self) -> f64 {
        self.urgency + self.importance + self.critical_path + self.blocking_fanout
    }
}

/// Deadline pressure in `[0, 1]`.
///
/// Due today or overdue is 1. The value falls linearly to 0 at the horizon.
/// Without a due date the configured baseline applies.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn urgency(due_date: Option<NaiveDate>, today: NaiveDate, config: &ScoringConfig) -> f64 {
    let Some(due) = due_date else {
        return config.undated_urgency;
    };
    let days_remaining = (due - today).num_days();
    if days_remaining <= 0 {
        return 1.0;
    }
    (1.0 - days_remaining as f64 / f64::from(config.horizon_days)).clamp(0.0, 1.0)
}

/// Priority score in `0..=100` for a strategy.
#[must_use]
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub fn score(strategy: Strategy, subs: &SubScores) -> u8 {
    let points = (Contributions::new(strategy.weights(), subs).total() * 100.0).round();
    points.clamp(0.0, 100.0) as u8
}

fn ratio(value: f64, max: f64) -> f64 {
    if max > 0.0 && max.is_finite() && value.is_finite() {
        (value / max).clamp(0.0, 1.0)
    } else {
        0.0
    }
}
