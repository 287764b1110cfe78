use crate::tracing::{LogLevel, TracingConfig, TracingFormat};
use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand, ValueEnum};
use miette::{Diagnostic, Report};
use serde::{Deserialize, Serialize};
use std::io::{self, Write};
use std::path::PathBuf;
use thiserror::Error;

/// Exit codes for the CLI application
pub const EXIT_OK: i32 = 0;
/// CLI or configuration error exit code
pub const EXIT_CLI: i32 = 2;
/// Analysis or I/O failure exit code
pub const EXIT_ANALYSIS: i32 = 3;

/// Default number of tasks returned by `suggest`.
pub const DEFAULT_SUGGESTIONS: usize = 3;

/// CLI-specific error types with proper exit code mapping
#[derive(Error, Debug, Clone, Diagnostic)]
pub enum CliError {
    /// CLI or configuration error (exit code 2)
    #[error("CLI/configuration error: {message}")]
    #[diagnostic(code(taskrank::cli::config))]
    Config {
        /// The error message
        message: String,
        /// Optional help text
        #[help]
        help: Option<String>,
    },
    /// The batch could not be analyzed (exit code 3)
    #[error("Analysis failed: {message}")]
    #[diagnostic(code(taskrank::cli::analysis))]
    Analysis {
        /// The error message
        message: String,
        /// Optional help text
        #[help]
        help: Option<String>,
    },
    /// Other unexpected error (exit code 3)
    #[error("Unexpected error: {message}")]
    #[diagnostic(code(taskrank::cli::other))]
    Other {
        /// The error message
        message: String,
        /// Optional help text
        #[help]
        help: Option<String>,
    },
}

impl CliError {
    /// Create a new configuration error with help text
    #[must_use]
    pub fn config_with_help(message: impl Into<String>, help: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
            help: Some(help.into()),
        }
    }

    /// Create a new analysis error with help text
    #[must_use]
    pub fn analysis_with_help(message: impl Into<String>, help: impl Into<String>) -> Self {
        Self::Analysis {
            message: message.into(),
            help: Some(help.into()),
        }
    }

    /// Create a new other error
    #[must_use]
    pub fn other(message: impl Into<String>) -> Self {
        Self::Other {
            message: message.into(),
            help: None,
        }
    }

    /// Create a new other error with help text
    #[must_use]
    pub fn other_with_help(message: impl Into<String>, help: impl Into<String>) -> Self {
        Self::Other {
            message: message.into(),
            help: Some(help.into()),
        }
    }
}

/// Convert `taskrank_engine::Error` to the matching `CliError` variant.
///
/// - Configuration errors -> Config (exit code 2)
/// - Malformed batches -> Analysis (exit code 3)
/// - I/O and graph errors -> Other (exit code 3)
impl From<taskrank_engine::Error> for CliError {
    fn from(err: taskrank_engine::Error) -> Self {
        match err {
            // Keep only the message to avoid "Configuration error: Configuration error:"
            taskrank_engine::Error::Configuration { message, help } => Self::Config {
                message,
                help,
            },
            taskrank_engine::Error::MalformedBatch { message } => Self::analysis_with_help(
                message,
                "The input must be a JSON array with one object per task",
            ),
            taskrank_engine::Error::Io {
                source,
                path,
                operation,
            } => {
                let path_str = path
                    .as_ref()
                    .map_or(String::new(), |p| format!(" on {}", p.display()));
                Self::other_with_help(
                    format!("I/O {operation} failed{path_str}: {source}"),
                    "Check file permissions and ensure the path exists",
                )
            }
            taskrank_engine::Error::Graph(_) => Self::other(err.to_string()),
        }
    }
}

/// Map CLI error to appropriate exit code
#[must_use]
pub const fn exit_code_for(err: &CliError) -> i32 {
    match err {
        CliError::Config { .. } => EXIT_CLI,
        CliError::Analysis { .. } | CliError::Other { .. } => EXIT_ANALYSIS,
    }
}

/// Render error appropriately based on JSON flag
#[allow(clippy::print_stdout, clippy::print_stderr)]
pub fn render_error(err: &CliError, json_mode: bool) {
    if json_mode {
        let error_envelope = ErrorEnvelope::new(serde_json::json!({
            "code": match err {
                CliError::Config { .. } => "config",
                CliError::Analysis { .. } => "analysis",
                CliError::Other { .. } => "other",
            },
            "message": err.to_string()
        }));

        match serde_json::to_string(&error_envelope) {
            Ok(json) => println!("{json}"),
            Err(_) => eprintln!("Error serializing error response"),
        }
    } else {
        let report = Report::new(err.clone());
        eprintln!("{report:?}");
        let _ = io::stderr().flush();
    }
}

/// Output format for command results
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, ValueEnum, Serialize, Deserialize, Default)]
#[must_use]
pub enum OutputFormat {
    /// JSON output format
    Json,
    /// Plain text format
    #[default]
    Text,
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Self::Json => "json",
            Self::Text => "text",
        })
    }
}

/// Order of analyzed tasks in the output
#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum, Default)]
pub enum SortOrder {
    /// Input order (first occurrence of each id)
    #[default]
    Input,
    /// Highest score first; equal scores keep input order
    Score,
}

/// Success response envelope for JSON output
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OkEnvelope<T> {
    /// Status indicator - always "ok" for success
    pub status: &'static str,
    /// The actual data payload
    pub data: T,
}

impl<T> OkEnvelope<T> {
    /// Create a new success envelope
    #[must_use]
    pub const fn new(data: T) -> Self {
        Self { status: "ok", data }
    }
}

/// Error response envelope for JSON output
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorEnvelope<E> {
    /// Status indicator - always "error" for failures
    pub status: &'static str,
    /// The error details
    pub error: E,
}

impl<E> ErrorEnvelope<E> {
    /// Create a new error envelope
    #[must_use]
    pub const fn new(error: E) -> Self {
        Self {
            status: "error",
            error,
        }
    }
}

/// Main CLI entry point for taskrank.
///
/// Scores and explains a batch of tasks by deadline, importance and
/// dependency structure.
#[derive(Parser, Debug)]
#[command(name = "taskrank")]
#[command(about = "Dependency-aware task prioritization with explained scores")]
#[command(long_about = None)]
#[command(version)]
pub struct Cli {
    /// The subcommand to execute.
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Logging verbosity level.
    #[arg(
        short = 'L',
        long,
        global = true,
        help = "Set logging level",
        default_value = "warn",
        value_enum
    )]
    pub level: LogLevel,

    /// Log output format; JSON when `--json` is set, pretty otherwise.
    #[arg(
        long,
        global = true,
        value_enum,
        value_name = "FORMAT",
        help = "Log output format: pretty, compact, json or dev"
    )]
    pub log_format: Option<TracingFormat>,

    /// Emit JSON envelope regardless of format.
    #[arg(long, global = true, help = "Emit JSON envelope regardless of format")]
    pub json: bool,

    /// Configuration file; defaults to `taskrank.toml` in the working directory.
    #[arg(
        long,
        short = 'c',
        global = true,
        value_name = "PATH",
        help = "Path to a taskrank.toml configuration file"
    )]
    pub config: Option<PathBuf>,
}

/// Options shared by every command that analyzes a batch.
#[derive(Args, Debug, Clone, PartialEq, Eq)]
pub struct BatchArgs {
    /// Batch file; reads stdin when absent or `-`.
    #[arg(value_name = "FILE", help = "JSON batch file (stdin if omitted or '-')")]
    pub file: Option<PathBuf>,

    /// Scoring strategy name.
    #[arg(
        long,
        short = 's',
        env = "TASKRANK_STRATEGY",
        help = "Scoring strategy: deadline_driven, importance_driven, critical_path or balanced"
    )]
    pub strategy: Option<String>,

    /// Reference date for deadlines.
    #[arg(
        long,
        value_name = "YYYY-MM-DD",
        help = "Reference date for deadlines (defaults to today)"
    )]
    pub today: Option<NaiveDate>,

    /// Output format.
    #[arg(
        long = "output",
        short = 'o',
        value_enum,
        default_value_t,
        help = "Output format"
    )]
    pub output_format: OutputFormat,
}

/// Available CLI subcommands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Score and explain every task of a batch.
    #[command(about = "Score and explain every task of a batch")]
    Analyze {
        /// Batch input and scoring options.
        #[command(flatten)]
        batch: BatchArgs,

        /// Output order.
        #[arg(long, value_enum, default_value_t, help = "Output order")]
        sort: SortOrder,
    },
    /// Show the highest-priority tasks of a batch.
    #[command(about = "Show the highest-priority tasks of a batch")]
    Suggest {
        /// Batch input and scoring options.
        #[command(flatten)]
        batch: BatchArgs,

        /// Number of tasks to show.
        #[arg(
            long,
            short = 'n',
            default_value_t = DEFAULT_SUGGESTIONS,
            help = "Number of tasks to suggest"
        )]
        limit: usize,
    },
    /// List the scoring strategies and their weights.
    #[command(about = "List scoring strategies and their weights")]
    Strategies {
        /// Output format.
        #[arg(
            long = "output",
            short = 'o',
            value_enum,
            default_value_t,
            help = "Output format"
        )]
        output_format: OutputFormat,
    },
    /// Show version information.
    #[command(about = "Show version information")]
    Version {
        /// Output format.
        #[arg(
            long = "output",
            short = 'o',
            value_enum,
            default_value_t,
            help = "Output format"
        )]
        output_format: OutputFormat,
    },
}

impl Commands {
    /// Name used in tracing spans.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Analyze { .. } => "analyze",
            Self::Suggest { .. } => "suggest",
            Self::Strategies { .. } => "strategies",
            Self::Version { .. } => "version",
        }
    }
}

impl Cli {
    /// Tracing setup for this invocation.
    #[must_use]
    pub fn tracing_config(&self) -> TracingConfig {
        let format = self.log_format.unwrap_or(if self.json {
            TracingFormat::Json
        } else {
            TracingFormat::Pretty
        });
        TracingConfig {
            format,
            level: self.level.into(),
        }
    }
}

/// Parse command-line arguments
#[must_use]
pub fn parse() -> Cli {
    Cli::parse()
}
