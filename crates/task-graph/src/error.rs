//! Error types for task graph operations.

use crate::TaskKey;
use thiserror::Error;

/// Result type for task graph operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur during task graph operations.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum Error {
    /// A dependency cycle was found where the graph must be acyclic.
    #[error("Cycle detected in task graph: {message}")]
    CycleDetected {
        /// Human-readable description of the cycle.
        message: String,
    },

    /// One or more tasks depend on tasks that are not in the graph.
    #[error("Missing dependencies: {}", format_missing(.missing))]
    MissingDependencies {
        /// List of (task, missing_dependency) pairs.
        missing: Vec<(TaskKey, TaskKey)>,
    },
}

fn format_missing(missing: &[(TaskKey, TaskKey)]) -> String {
    missing
        .iter()
        .map(|(task, dep)| format!("task {task} depends on missing task {dep}"))
        .collect::<Vec<_>>()
        .join(", ")
}
