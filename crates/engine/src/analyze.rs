//! The analysis pipeline.
//!
//! One call runs `Validating → GraphBuilding → Scoring → Done` over a single
//! batch. Nothing is shared between calls.

use crate::config::ScoringConfig;
use crate::explain::explain;
use crate::score::{ScoringContext, SubScores, score};
use crate::strategy::Strategy;
use crate::task::{AnalyzedTask, Note, ValidatedTask};
use crate::validate::validate_batch;
use crate::{Error, Result};
use chrono::NaiveDate;
use rayon::prelude::*;
use serde::Serialize;
use serde_json::Value;
use std::collections::HashMap;
use std::fmt;
use taskrank_graph::{GraphMetrics, TaskGraph, TaskKey};
use tracing::{debug, info};

/// Pipeline stage, reported through tracing as the analysis advances.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnalysisPhase {
    /// Normalizing raw records.
    Validating,
    /// Building the dependency graph, breaking cycles and computing metrics.
    GraphBuilding,
    /// Scoring and explaining each task.
    Scoring,
    /// Finished.
    Done,
}

impl fmt::Display for AnalysisPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Validating => "validating",
            Self::GraphBuilding => "graph_building",
            Self::Scoring => "scoring",
            Self::Done => "done",
        })
    }
}

/// Per-call inputs besides the batch itself.
#[derive(Debug, Clone, PartialEq)]
pub struct AnalysisOptions {
    /// Strategy name as the caller gave it. `None` selects the default.
    pub strategy: Option<String>,
    /// Reference date for deadlines.
    pub today: NaiveDate,
    /// Scoring constants.
    pub scoring: ScoringConfig,
}

impl AnalysisOptions {
    /// Options with the default strategy and scoring constants.
    #[must_use]
    pub fn new(today: NaiveDate) -> Self {
        Self {
            strategy: None,
            today,
            scoring: ScoringConfig::default(),
        }
    }

    /// Select a strategy by name. Unknown names fall back to `balanced`.
    #[must_use]
    pub fn with_strategy(mut self, name: impl Into<String>) -> Self {
        self.strategy = Some(name.into());
        self
    }

    /// Replace the scoring constants.
    #[must_use]
    pub const fn with_scoring(mut self, scoring: ScoringConfig) -> Self {
        self.scoring = scoring;
        self
    }
}

/// Result of one analysis.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnalysisReport {
    /// The strategy actually applied.
    pub strategy: Strategy,
    /// One entry per distinct task id, in first-occurrence input order.
    pub tasks: Vec<AnalyzedTask>,
}

impl AnalysisReport {
    /// Tasks ordered by score, highest first. Equal scores keep input order.
    #[must_use]
    pub fn ranked(&self) -> Vec<&AnalyzedTask> {
        let mut ranked: Vec<&AnalyzedTask> = self.tasks.iter().collect();
        ranked.sort_by(|a, b| b.score.cmp(&a.score));
        ranked
    }

    /// The `limit` highest-ranked tasks.
    #[must_use]
    pub fn suggest(&self, limit: usize) -> Vec<&AnalyzedTask> {
        let mut ranked = self.ranked();
        ranked.truncate(limit);
        ranked
    }
}

/// Analyze a batch of raw task records.
///
/// # Errors
///
/// Returns [`Error::MalformedBatch`] if `batch` is not an array of objects,
/// and [`Error::Configuration`] if `options.scoring` is out of range. Every
/// other anomaly is absorbed into the affected task's explanation.
pub fn analyze(batch: &Value, options: &AnalysisOptions) -> Result<AnalysisReport> {
    options.scoring.validate()?;
    let (strategy, strategy_note) = Strategy::resolve(options.strategy.as_deref());

    enter(AnalysisPhase::Validating);
    let mut tasks = validate_batch(batch)?;

    enter(AnalysisPhase::GraphBuilding);
    let mut graph = TaskGraph::new();
    for task in &tasks {
        graph.add_task(task.key, task.clone())?;
    }
    graph.add_dependency_edges()?;

    let broken = graph.break_cycles();
    if !broken.is_empty() {
        let position: HashMap<TaskKey, usize> = tasks
            .iter()
            .enumerate()
            .map(|(i, task)| (task.key, i))
            .collect();
        for link in &broken {
            if let Some(&i) = position.get(&link.task) {
                tasks[i].drop_cyclic_dependency(link.dependency.id());
            }
        }
    }

    let metrics = graph.compute_metrics()?;
    let ctx = ScoringContext::new(options.today, &metrics, options.scoring);
    debug!(
        tasks = graph.task_count(),
        edges = graph.edge_count(),
        broken = broken.len(),
        max_depth = metrics.max_depth(),
        "Dependency graph ready"
    );

    enter(AnalysisPhase::Scoring);
    let analyzed: Vec<AnalyzedTask> = tasks
        .into_par_iter()
        .filter(|task| task.key.is_primary())
        .map(|task| {
            let task_metrics = metrics.get(task.key).copied().unwrap_or_default();
            analyze_task(task, &task_metrics, strategy, strategy_note.as_ref(), &ctx)
        })
        .collect();

    enter(AnalysisPhase::Done);
    info!(
        strategy = %strategy,
        tasks = analyzed.len(),
        cycles_broken = broken.len(),
        "Analysis complete"
    );

    Ok(AnalysisReport {
        strategy,
        tasks: analyzed,
    })
}

/// Analyze a batch given as JSON text.
///
/// # Errors
///
/// Text that is not valid JSON is a [`Error::MalformedBatch`]; otherwise as
/// [`analyze`].
pub fn analyze_str(source: &str, options: &AnalysisOptions) -> Result<AnalysisReport> {
    let batch: Value = serde_json::from_str(source)
        .map_err(|e| Error::malformed_batch(format!("invalid JSON: {e}")))?;
    analyze(&batch, options)
}

fn enter(phase: AnalysisPhase) {
    debug!(%phase, "Entering analysis phase");
}

fn analyze_task(
    validated: ValidatedTask,
    metrics: &GraphMetrics,
    strategy: Strategy,
    strategy_note: Option<&Note>,
    ctx: &ScoringContext,
) -> AnalyzedTask {
    let ValidatedTask {
        task,
        mut notes,
        has_circular_dependency,
        ..
    } = validated;
    notes.extend(strategy_note.cloned());

    let subs = SubScores::compute(&task, metrics, ctx);
    let explanation = explain(
        &task,
        metrics,
        &subs,
        strategy,
        ctx.today,
        &ctx.config,
        &notes,
    )
    .iter()
    .map(ToString::to_string)
    .collect();

    AnalyzedTask {
        score: score(strategy, &subs),
        explanation,
        has_circular_dependency,
        task,
    }
}
