//! Task dependency graph algorithms for taskrank.
//!
//! This crate builds a directed graph of tasks (edges point from a dependency
//! to the task that depends on it) using petgraph, breaks dependency cycles
//! deterministically, and computes the per-task metrics the scoring engine
//! needs: chain depth, descendant count and cumulative upstream effort.
//!
//! # Key Types
//!
//! - [`TaskGraph`]: The graph structure for building and querying task dependencies
//! - [`TaskNodeData`]: Trait that task types must implement to be stored in the graph
//! - [`TaskKey`]: Identity of a node, stable across runs and totally ordered
//! - [`MetricsReport`]: Per-task [`GraphMetrics`] plus the batch-wide maxima
//!
//! # Example
//!
//! ```ignore
//! use taskrank_graph::{TaskGraph, TaskKey, TaskNodeData};
//!
//! #[derive(Clone)]
//! struct MyTask {
//!     deps: Vec<TaskKey>,
//!     hours: f64,
//! }
//!
//! impl TaskNodeData for MyTask {
//!     fn dependency_keys(&self) -> impl Iterator<Item = TaskKey> {
//!         self.deps.iter().copied()
//!     }
//!
//!     fn estimated_hours(&self) -> f64 {
//!         self.hours
//!     }
//! }
//!
//! let mut graph = TaskGraph::new();
//! graph.add_task(TaskKey::primary(1), MyTask { deps: vec![], hours: 4.0 })?;
//! graph.add_task(TaskKey::primary(2), MyTask { deps: vec![TaskKey::primary(1)], hours: 2.0 })?;
//! graph.add_dependency_edges()?;
//!
//! let broken = graph.break_cycles();
//! let metrics = graph.compute_metrics()?;
//! ```

mod cycles;
mod error;
mod graph;
mod key;
mod metrics;

pub use cycles::BrokenDependency;
pub use error::{Error, Result};
pub use graph::{GraphNode, TaskGraph};
pub use key::TaskKey;
pub use metrics::{GraphMetrics, MetricsReport};

/// Trait for task data that can be stored in the task graph.
///
/// Implement this trait for your task type to enable it to be stored
/// in a [`TaskGraph`] and participate in metric computation.
pub trait TaskNodeData: Clone {
    /// Returns the keys of tasks this task depends on.
    fn dependency_keys(&self) -> impl Iterator<Item = TaskKey>;

    /// Effort attributed to this task, in hours.
    ///
    /// Negative or non-finite values are treated as zero.
    fn estimated_hours(&self) -> f64;
}
