//! Per-task graph metrics.

use crate::{Result, TaskGraph, TaskKey, TaskNodeData};
use petgraph::Direction;
use std::collections::{BTreeMap, HashSet};
use tracing::debug;

/// Structural metrics for a single task.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct GraphMetrics {
    /// Length of the longest dependency chain ending at this task (0 without dependencies).
    pub depth: usize,
    /// Number of tasks that transitively depend on this task.
    pub descendant_count: usize,
    /// Estimated hours along the heaviest dependency chain leading into this
    /// task, including the task's own hours.
    pub cumulative_upstream_hours: f64,
}

/// Metrics for every task of a graph, plus the batch-wide maxima used for
/// normalization.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MetricsReport {
    metrics: BTreeMap<TaskKey, GraphMetrics>,
    max_cumulative_upstream_hours: f64,
    max_descendant_count: usize,
    max_depth: usize,
}

impl MetricsReport {
    /// Metrics for one task.
    #[must_use]
    pub fn get(&self, key: TaskKey) -> Option<&GraphMetrics> {
        self.metrics.get(&key)
    }

    /// All metrics in ascending key order.
    pub fn iter(&self) -> impl Iterator<Item = (TaskKey, &GraphMetrics)> {
        self.metrics.iter().map(|(k, m)| (*k, m))
    }

    /// Largest `cumulative_upstream_hours` in the batch.
    #[must_use]
    pub const fn max_cumulative_upstream_hours(&self) -> f64 {
        self.max_cumulative_upstream_hours
    }

    /// Largest `descendant_count` in the batch.
    #[must_use]
    pub const fn max_descendant_count(&self) -> usize {
        self.max_descendant_count
    }

    /// Largest `depth` in the batch.
    #[must_use]
    pub const fn max_depth(&self) -> usize {
        self.max_depth
    }

    /// Number of tasks covered.
    #[must_use]
    pub fn len(&self) -> usize {
        self.metrics.len()
    }

    /// Whether the report covers no tasks.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.metrics.is_empty()
    }
}

fn sanitize_hours(hours: f64) -> f64 {
    if hours.is_finite() && hours > 0.0 {
        hours
    } else {
        0.0
    }
}

impl<T: TaskNodeData> TaskGraph<T> {
    /// Compute [`GraphMetrics`] for every task.
    ///
    /// Depth and cumulative hours propagate forward in topological order;
    /// descendant sets are accumulated backwards and memoized per node.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::CycleDetected`] if the graph still contains a
    /// cycle. Call [`TaskGraph::break_cycles`] first.
    pub fn compute_metrics(&self) -> Result<MetricsReport> {
        let order = self.topological_indices()?;
        let mut per_node = vec![GraphMetrics::default(); self.graph.node_count()];

        for &idx in &order {
            let mut depth = 0;
            let mut upstream = 0.0_f64;
            for dep in self.graph.neighbors_directed(idx, Direction::Incoming) {
                let dep_metrics = &per_node[dep.index()];
                depth = depth.max(dep_metrics.depth + 1);
                upstream = upstream.max(dep_metrics.cumulative_upstream_hours);
            }
            let own = sanitize_hours(self.graph[idx].task.estimated_hours());
            per_node[idx.index()].depth = depth;
            // Saturate so the batch maximum stays finite
            per_node[idx.index()].cumulative_upstream_hours = (upstream + own).min(f64::MAX);
        }

        let mut closures: Vec<HashSet<usize>> = vec![HashSet::new(); self.graph.node_count()];
        for &idx in order.iter().rev() {
            let mut closure = HashSet::new();
            for dependent in self.graph.neighbors_directed(idx, Direction::Outgoing) {
                closure.insert(dependent.index());
                closure.extend(closures[dependent.index()].iter().copied());
            }
            per_node[idx.index()].descendant_count = closure.len();
            closures[idx.index()] = closure;
        }

        let mut report = MetricsReport::default();
        for (&key, &idx) in &self.key_to_node {
            let metrics = per_node[idx.index()];
            report.max_cumulative_upstream_hours = report
                .max_cumulative_upstream_hours
                .max(metrics.cumulative_upstream_hours);
            report.max_descendant_count = report.max_descendant_count.max(metrics.descendant_count);
            report.max_depth = report.max_depth.max(metrics.depth);
            report.metrics.insert(key, metrics);
        }

        debug!(
            tasks = report.len(),
            max_depth = report.max_depth,
            max_descendants = report.max_descendant_count,
            max_upstream_hours = report.max_cumulative_upstream_hours,
            "Computed graph metrics"
        );

        Ok(report)
    }
}
