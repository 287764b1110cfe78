//! Error types for the taskrank engine
//!
//! Only structurally malformed batches fail an analysis. Everything else a
//! caller can get wrong inside a task record is absorbed as a note on the
//! task. The remaining variants cover configuration loading.

use miette::Diagnostic;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Result type for engine operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for taskrank engine operations
#[derive(Error, Debug, Diagnostic)]
pub enum Error {
    /// The batch is not a list of task records
    #[error("Malformed task batch: {message}")]
    #[diagnostic(
        code(taskrank::batch::malformed),
        help("Send a JSON array with one object per task")
    )]
    MalformedBatch {
        /// What was wrong with the batch shape
        message: String,
    },

    /// Configuration error
    #[error("Configuration error: {message}")]
    #[diagnostic(code(taskrank::config::invalid))]
    Configuration {
        /// The error message describing the configuration issue
        message: String,
        /// Optional help text
        #[help]
        help: Option<String>,
    },

    /// I/O error with path context
    #[error("I/O error during {operation}: {source}")]
    #[diagnostic(code(taskrank::io::error))]
    Io {
        /// The underlying I/O error
        #[source]
        source: std::io::Error,
        /// The path where the I/O error occurred, if applicable
        path: Option<Box<Path>>,
        /// Description of the operation that failed
        operation: String,
    },

    /// Dependency graph invariant violated
    #[error("Dependency graph error: {0}")]
    #[diagnostic(code(taskrank::graph))]
    Graph(#[from] taskrank_graph::Error),
}

impl Error {
    /// Create a malformed batch error
    pub fn malformed_batch(message: impl Into<String>) -> Self {
        Self::MalformedBatch {
            message: message.into(),
        }
    }

    /// Create a configuration error with a message
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
            help: None,
        }
    }

    /// Create a configuration error with help text
    pub fn configuration_with_help(message: impl Into<String>, help: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
            help: Some(help.into()),
        }
    }

    /// Create an I/O error with context
    pub fn io(source: std::io::Error, path: Option<PathBuf>, operation: impl Into<String>) -> Self {
        Self::Io {
            source,
            path: path.map(PathBuf::into_boxed_path),
            operation: operation.into(),
        }
    }
}
