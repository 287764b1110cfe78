//! Dependency-aware task prioritization.
//!
//! Given a batch of tasks with due dates, effort estimates, importance
//! ratings and inter-task dependencies, [`analyze`] scores every task from 0
//! to 100 under a [`Strategy`] and explains each score.
//!
//! The pipeline is a single pass over one batch:
//!
//! 1. [`validate`] normalizes raw JSON records, recording [`Note`]s instead
//!    of failing on bad fields.
//! 2. The dependency graph is built with `taskrank-graph`; cycles are broken
//!    deterministically and per-task metrics computed.
//! 3. [`score`] combines sub-scores with the strategy's weights and
//!    [`explain`] turns the weighted contributions into reasons.
//!
//! ```ignore
//! use taskrank_engine::{AnalysisOptions, analyze_str};
//!
//! let options = AnalysisOptions::new(today).with_strategy("deadline_driven");
//! let report = analyze_str(r#"[{"id": 1, "title": "Ship", "importance": 8}]"#, &options)?;
//! for task in report.ranked() {
//!     println!("{} {}", task.score, task.task.title);
//! }
//! ```

pub mod analyze;
pub mod config;
pub mod error;
pub mod explain;
pub mod score;
pub mod strategy;
pub mod task;
pub mod validate;

pub use analyze::{AnalysisOptions, AnalysisPhase, AnalysisReport, analyze, analyze_str};
pub use config::{CONFIG_FILE_NAME, Config, ScoringConfig};
pub use error::{Error, Result};
pub use explain::{Factor, FactorDetail, Reason};
pub use strategy::{Strategy, Weights};
pub use task::{AnalyzedTask, Note, Task, UNTITLED_TASK, ValidatedTask};
pub use validate::{MAX_HOURS, validate_batch};
