//! Command implementations.
//!
//! Each command returns its stdout text; printing and exit codes are left
//! to the binary.

use crate::cli::{BatchArgs, Cli, CliError, Commands, OkEnvelope, OutputFormat, SortOrder};
use serde::Serialize;
use std::fmt::Write as _;
use std::io::Read;
use std::path::{Path, PathBuf};
use taskrank_engine::{
    AnalysisOptions, AnalysisReport, AnalyzedTask, Config, Strategy, Weights, analyze_str,
};
use tracing::{debug, instrument};

/// Run the parsed command line.
///
/// # Errors
///
/// Returns a [`CliError`] if no subcommand was given, the configuration or
/// batch cannot be read, or the batch is malformed.
pub fn execute(cli: &Cli) -> Result<String, CliError> {
    let Some(command) = &cli.command else {
        return Err(CliError::config_with_help(
            "No subcommand provided",
            "Run 'taskrank --help' for usage information",
        ));
    };
    let _span = crate::command_span!(command.name()).entered();

    match command {
        Commands::Analyze { batch, sort } => {
            let report = run_analysis(batch, cli.config.as_deref())?;
            let tasks: Vec<&AnalyzedTask> = match sort {
                SortOrder::Input => report.tasks.iter().collect(),
                SortOrder::Score => report.ranked(),
            };
            render_tasks(&report, &tasks, batch.output_format, cli.json)
        }
        Commands::Suggest { batch, limit } => {
            let report = run_analysis(batch, cli.config.as_deref())?;
            render_tasks(&report, &report.suggest(*limit), batch.output_format, cli.json)
        }
        Commands::Strategies { output_format } => strategies(*output_format, cli.json),
        Commands::Version { output_format } => version(*output_format, cli.json),
    }
}

/// Load the configuration file, or the defaults when none exists.
///
/// An explicit path must exist; otherwise `taskrank.toml` in the working
/// directory is used if present.
///
/// # Errors
///
/// Returns a [`CliError`] if the file cannot be read or is invalid.
pub fn load_config(explicit: Option<&Path>) -> Result<Config, CliError> {
    let config = match explicit {
        Some(path) => Config::load(path)?,
        None => {
            let cwd = std::env::current_dir().map_err(|e| {
                CliError::other(format!("Cannot determine working directory: {e}"))
            })?;
            Config::discover(&cwd)?
        }
    };
    Ok(config)
}

/// Build the analysis options for one invocation.
///
/// The strategy comes from the command line (or `TASKRANK_STRATEGY`), then
/// the configuration file, then the engine default. The reference date
/// defaults to the local calendar date.
#[must_use]
pub fn analysis_options(args: &BatchArgs, config: &Config) -> AnalysisOptions {
    let today = args
        .today
        .unwrap_or_else(|| chrono::Local::now().date_naive());
    let mut options = AnalysisOptions::new(today).with_scoring(config.scoring);
    let strategy = args
        .strategy
        .clone()
        .or_else(|| config.default_strategy.map(|s| s.as_str().to_string()));
    if let Some(strategy) = strategy {
        options = options.with_strategy(strategy);
    }
    options
}

#[instrument(skip_all, fields(file = ?args.file))]
fn run_analysis(args: &BatchArgs, config_path: Option<&Path>) -> Result<AnalysisReport, CliError> {
    let config = load_config(config_path)?;
    let options = analysis_options(args, &config);
    let source = read_batch(args.file.as_deref())?;
    debug!(bytes = source.len(), today = %options.today, "Read batch");
    Ok(analyze_str(&source, &options)?)
}

fn read_batch(file: Option<&Path>) -> Result<String, CliError> {
    match file {
        Some(path) if path != Path::new("-") => std::fs::read_to_string(path).map_err(|e| {
            taskrank_engine::Error::io(e, Some(PathBuf::from(path)), "read batch").into()
        }),
        _ => {
            let mut source = String::new();
            std::io::stdin()
                .read_to_string(&mut source)
                .map_err(|e| taskrank_engine::Error::io(e, None, "read batch from stdin"))?;
            Ok(source)
        }
    }
}

fn render_tasks(
    report: &AnalysisReport,
    tasks: &[&AnalyzedTask],
    format: OutputFormat,
    json_envelope: bool,
) -> Result<String, CliError> {
    if json_envelope {
        return to_json(&OkEnvelope::new(tasks));
    }
    match format {
        OutputFormat::Json => to_json(&tasks),
        OutputFormat::Text => Ok(tasks_text(report.strategy, tasks)),
    }
}

/// Human-readable listing: one line per task, reasons indented below.
#[must_use]
pub fn tasks_text(strategy: Strategy, tasks: &[&AnalyzedTask]) -> String {
    let mut out = format!("Strategy: {strategy}\n");
    if tasks.is_empty() {
        out.push_str("No tasks.\n");
    }
    for analyzed in tasks {
        let task = &analyzed.task;
        let _ = write!(out, "\n{:>3}  #{} {}", analyzed.score, task.id, task.title);
        if let Some(due) = task.due_date {
            let _ = write!(out, " (due {due})");
        }
        out.push('\n');
        for reason in &analyzed.explanation {
            let _ = writeln!(out, "       - {reason}");
        }
    }
    out.trim_end().to_string()
}

#[derive(Serialize)]
struct StrategyInfo {
    name: &'static str,
    description: &'static str,
    default: bool,
    weights: Weights,
}

fn strategies(format: OutputFormat, json_envelope: bool) -> Result<String, CliError> {
    let infos: Vec<StrategyInfo> = Strategy::ALL
        .into_iter()
        .map(|strategy| StrategyInfo {
            name: strategy.as_str(),
            description: strategy.description(),
            default: strategy == Strategy::default(),
            weights: strategy.weights(),
        })
        .collect();

    if json_envelope {
        return to_json(&OkEnvelope::new(&infos));
    }
    match format {
        OutputFormat::Json => to_json(&infos),
        OutputFormat::Text => {
            let mut out = format!(
                "{:<18} {:>7} {:>10} {:>13} {:>8}\n",
                "STRATEGY", "URGENCY", "IMPORTANCE", "CRITICAL_PATH", "FANOUT"
            );
            for info in &infos {
                let w = info.weights;
                let _ = writeln!(
                    out,
                    "{:<18} {:>6}% {:>9}% {:>12}% {:>7}%  {}",
                    info.name,
                    w.urgency,
                    w.importance,
                    w.critical_path,
                    w.blocking_fanout,
                    info.description
                );
            }
            Ok(out.trim_end().to_string())
        }
    }
}

fn version(format: OutputFormat, json_envelope: bool) -> Result<String, CliError> {
    let info = serde_json::json!({
        "name": env!("CARGO_PKG_NAME"),
        "version": env!("CARGO_PKG_VERSION"),
    });
    if json_envelope {
        return to_json(&OkEnvelope::new(info));
    }
    match format {
        OutputFormat::Json => to_json(&info),
        OutputFormat::Text => Ok(format!(
            "{} {}",
            env!("CARGO_PKG_NAME"),
            env!("CARGO_PKG_VERSION")
        )),
    }
}

fn to_json<T: Serialize + ?Sized>(value: &T) -> Result<String, CliError> {
    serde_json::to_string_pretty(value)
        .map_err(|e| CliError::other(format!("Failed to serialize output: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use taskrank_engine::{ScoringConfig, analyze};

    fn batch_args(strategy: Option<&str>) -> BatchArgs {
        BatchArgs {
            file: None,
            strategy: strategy.map(str::to_string),
            today: NaiveDate::from_ymd_opt(2024, 6, 1),
            output_format: OutputFormat::Text,
        }
    }

    #[test]
    fn test_strategy_precedence() {
        let config = Config {
            default_strategy: Some(Strategy::CriticalPath),
            scoring: ScoringConfig::default(),
        };

        let options = analysis_options(&batch_args(Some("deadline_driven")), &config);
        assert_eq!(options.strategy.as_deref(), Some("deadline_driven"));

        let options = analysis_options(&batch_args(None), &config);
        assert_eq!(options.strategy.as_deref(), Some("critical_path"));

        let options = analysis_options(&batch_args(None), &Config::default());
        assert!(options.strategy.is_none());
        assert_eq!(options.today, NaiveDate::from_ymd_opt(2024, 6, 1).unwrap());
    }

    #[test]
    fn test_tasks_text_layout() {
        let batch = serde_json::json!([
            {"id": 1, "title": "Write report", "due_date": "2024-06-03",
             "estimated_hours": 2, "importance": 9}
        ]);
        let options = AnalysisOptions::new(NaiveDate::from_ymd_opt(2024, 6, 1).unwrap());
        let report = analyze(&batch, &options).unwrap();
        let tasks: Vec<&AnalyzedTask> = report.tasks.iter().collect();

        let text = tasks_text(report.strategy, &tasks);
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "Strategy: balanced");
        assert!(lines[2].ends_with("#1 Write report (due 2024-06-03)"));
        assert!(text.contains("       - Due in 2 days — high urgency"));
        assert!(text.contains("       - High importance (9/10)"));
    }

    #[test]
    fn test_empty_listing() {
        assert_eq!(tasks_text(Strategy::Balanced, &[]), "Strategy: balanced\nNo tasks.");
    }

    #[test]
    fn test_strategies_json() {
        let json = strategies(OutputFormat::Json, false).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        let rows = value.as_array().unwrap();
        assert_eq!(rows.len(), 4);
        let balanced = rows.iter().find(|r| r["name"] == "balanced").unwrap();
        assert_eq!(balanced["default"], true);
        assert_eq!(balanced["weights"]["urgency"], 35);
    }

    #[test]
    fn test_version_envelope() {
        let json = version(OutputFormat::Text, true).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["status"], "ok");
        assert_eq!(value["data"]["name"], "taskrank");
    }

    #[test]
    fn test_missing_config_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = load_config(Some(&dir.path().join("nope.toml"))).unwrap_err();
        assert!(matches!(err, CliError::Other { .. }));
    }
}
