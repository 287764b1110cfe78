//! taskrank - dependency-aware task prioritization from the command line
//!
//! The binary reads a JSON batch of tasks from a file or stdin, scores it
//! with [`taskrank_engine`] and prints the ranked, explained result as text
//! or JSON.
//!
//! ```text
//! taskrank analyze tasks.json --strategy critical_path --sort score
//! taskrank suggest tasks.json --limit 5 -o json
//! taskrank strategies
//! ```

/// CLI argument parsing and exit codes.
pub mod cli;
/// Command implementations.
pub mod commands;
/// Tracing and logging configuration.
pub mod tracing;
