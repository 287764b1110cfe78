//! Task records flowing through the engine.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;
use taskrank_graph::{TaskKey, TaskNodeData};

/// Title given to tasks that arrive without one.
pub const UNTITLED_TASK: &str = "Untitled task";

/// A validated task.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    /// Caller-supplied id, unique among the tasks that reach the output.
    pub id: i64,
    /// Non-empty title.
    pub title: String,
    /// Deadline, if any.
    pub due_date: Option<NaiveDate>,
    /// Effort estimate, finite and non-negative.
    pub estimated_hours: f64,
    /// Importance rating, 1 through 10.
    pub importance: u8,
    /// Ids of tasks in the same batch that must finish first.
    pub dependencies: Vec<i64>,
}

/// A non-fatal annotation recorded while validating or building the graph.
///
/// Notes are surfaced to the caller as the last entries of a task's
/// explanation.
#[derive(Debug, Clone, PartialEq)]
pub enum Note {
    /// Title was missing or blank.
    UntitledTask,
    /// Due date could not be parsed.
    InvalidDueDate {
        /// The value as received.
        raw: String,
    },
    /// Importance was outside 1..=10.
    ImportanceClamped {
        /// The value as received, rounded to an integer.
        given: i64,
        /// The value used instead.
        clamped: u8,
    },
    /// Importance was missing or not a number.
    ImportanceDefaulted {
        /// The value used instead.
        value: u8,
    },
    /// Estimated hours were negative.
    HoursClamped {
        /// The value as received.
        given: f64,
    },
    /// Estimated hours exceeded the accepted maximum.
    HoursCapped {
        /// The value as received.
        given: f64,
        /// The value used instead.
        cap: f64,
    },
    /// Estimated hours were missing or not a number.
    HoursDefaulted {
        /// The value used instead.
        value: f64,
    },
    /// The task had no usable id.
    IdAssigned {
        /// The id given to the task.
        id: i64,
    },
    /// Another task in the batch carries the same id.
    DuplicateId {
        /// The shared id.
        id: i64,
    },
    /// The task listed itself as a dependency.
    SelfDependency,
    /// A dependency named a task that is not in the batch.
    DanglingDependency {
        /// The unknown id.
        id: i64,
    },
    /// A dependency entry was not an integer id.
    InvalidDependency {
        /// The entry as received.
        raw: String,
    },
    /// A dependency was dropped to break a cycle.
    CycleBroken {
        /// The dropped dependency.
        dependency: i64,
    },
    /// The requested strategy is unknown.
    UnknownStrategy {
        /// The name as requested.
        name: String,
    },
}

impl fmt::Display for Note {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UntitledTask => write!(f, "title missing; using \"{UNTITLED_TASK}\""),
            Self::InvalidDueDate { raw } => write!(
                f,
                "due date '{raw}' is not a valid date; treated as no deadline"
            ),
            Self::ImportanceClamped { given, clamped } => {
                write!(f, "importance {given} clamped to {clamped}")
            }
            Self::ImportanceDefaulted { value } => {
                write!(f, "importance missing; defaulted to {value}")
            }
            Self::HoursClamped { given } => write!(f, "estimated hours {given} clamped to 0"),
            Self::HoursCapped { given, cap } => {
                write!(f, "estimated hours {given:e} capped at {cap}h")
            }
            Self::HoursDefaulted { value } => {
                write!(f, "estimated hours missing; defaulted to {value}h")
            }
            Self::IdAssigned { id } => write!(f, "id missing; assigned #{id}"),
            Self::DuplicateId { id } => write!(f, "duplicate id #{id} in batch"),
            Self::SelfDependency => f.write_str("self-dependency ignored"),
            Self::DanglingDependency { id } => {
                write!(f, "dependency #{id} ignored: not found in batch")
            }
            Self::InvalidDependency { raw } => {
                write!(f, "dependency entry '{raw}' ignored: not a task id")
            }
            Self::CycleBroken { dependency } => {
                write!(f, "dependency #{dependency} removed: would create a cycle")
            }
            Self::UnknownStrategy { name } => {
                write!(f, "unknown strategy '{name}', defaulted to balanced")
            }
        }
    }
}

/// A task after validation, with its graph identity and accumulated notes.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidatedTask {
    /// Graph identity; duplicates of an id get later occurrences.
    pub key: TaskKey,
    /// The normalized task.
    pub task: Task,
    /// Notes recorded so far, in the order they were found.
    pub notes: Vec<Note>,
    /// Whether a dependency was dropped to break a cycle.
    pub has_circular_dependency: bool,
}

impl ValidatedTask {
    /// Drop `dependency` from this task after cycle breaking.
    pub fn drop_cyclic_dependency(&mut self, dependency: i64) {
        self.task.dependencies.retain(|&id| id != dependency);
        self.notes.push(Note::CycleBroken { dependency });
        self.has_circular_dependency = true;
    }
}

impl TaskNodeData for ValidatedTask {
    fn dependency_keys(&self) -> impl Iterator<Item = TaskKey> {
        self.task.dependencies.iter().copied().map(TaskKey::primary)
    }

    fn estimated_hours(&self) -> f64 {
        self.task.estimated_hours
    }
}

/// A scored task as returned to the caller.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalyzedTask {
    /// The validated input fields.
    #[serde(flatten)]
    pub task: Task,
    /// Priority score, 0 through 100.
    pub score: u8,
    /// Reasons behind the score, most significant first. Never empty.
    pub explanation: Vec<String>,
    /// Whether a dependency of this task was dropped to break a cycle.
    pub has_circular_dependency: bool,
}
