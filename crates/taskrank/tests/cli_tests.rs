//! End-to-end tests for the taskrank binary

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use tempfile::TempDir;

const BATCH: &str = r#"[
  {"id": 1, "title": "Pour foundation", "due_date": "2024-06-20", "estimated_hours": 10, "importance": 6, "dependencies": []},
  {"id": 2, "title": "Frame walls", "due_date": "2024-06-25", "estimated_hours": 8, "importance": 6, "dependencies": [1]},
  {"id": 3, "title": "Pay invoice", "due_date": "2024-06-02", "estimated_hours": 0.5, "importance": 9, "dependencies": []},
  {"id": 4, "title": "Tidy shed", "estimated_hours": 1, "importance": 2, "dependencies": [9]}
]"#;

fn taskrank(dir: &TempDir) -> Command {
    #[allow(deprecated)]
    let mut cmd = Command::cargo_bin("taskrank").unwrap();
    cmd.current_dir(dir.path())
        .env_remove("TASKRANK_STRATEGY")
        .env_remove("RUST_LOG");
    cmd
}

fn workspace() -> TempDir {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("tasks.json"), BATCH).unwrap();
    dir
}

fn json_output(cmd: &mut Command) -> serde_json::Value {
    let output = cmd.assert().success().get_output().stdout.clone();
    serde_json::from_slice(&output).unwrap()
}

#[test]
fn test_analyze_json_keeps_input_order() {
    let dir = workspace();
    let value = json_output(taskrank(&dir).args([
        "analyze",
        "tasks.json",
        "--today",
        "2024-06-01",
        "-o",
        "json",
    ]));

    let ids: Vec<i64> = value
        .as_array()
        .unwrap()
        .iter()
        .map(|t| t["id"].as_i64().unwrap())
        .collect();
    assert_eq!(ids, vec![1, 2, 3, 4]);

    for task in value.as_array().unwrap() {
        let score = task["score"].as_u64().unwrap();
        assert!(score <= 100);
        assert!(!task["explanation"].as_array().unwrap().is_empty());
    }
    assert_eq!(
        value[3]["explanation"].as_array().unwrap().last().unwrap(),
        "dependency #9 ignored: not found in batch"
    );
}

#[test]
fn test_analyze_reads_stdin() {
    let dir = TempDir::new().unwrap();
    taskrank(&dir)
        .args(["analyze", "--today", "2024-06-01"])
        .write_stdin(BATCH)
        .assert()
        .success()
        .stdout(predicate::str::starts_with("Strategy: balanced"))
        .stdout(predicate::str::contains("#3 Pay invoice (due 2024-06-02)"))
        .stdout(predicate::str::contains("Due in 1 day — high urgency"));
}

#[test]
fn test_suggest_limits_and_ranks() {
    let dir = workspace();
    let value = json_output(taskrank(&dir).args([
        "suggest",
        "tasks.json",
        "--today",
        "2024-06-01",
        "--limit",
        "2",
        "-o",
        "json",
    ]));

    let tasks = value.as_array().unwrap();
    assert_eq!(tasks.len(), 2);
    assert!(tasks[0]["score"].as_u64() >= tasks[1]["score"].as_u64());
}

#[test]
fn test_strategy_from_environment() {
    let dir = workspace();
    taskrank(&dir)
        .env("TASKRANK_STRATEGY", "critical_path")
        .args(["analyze", "tasks.json", "--today", "2024-06-01"])
        .assert()
        .success()
        .stdout(predicate::str::starts_with("Strategy: critical_path"));
}

#[test]
fn test_unknown_strategy_is_noted_not_fatal() {
    let dir = workspace();
    taskrank(&dir)
        .args(["analyze", "tasks.json", "--strategy", "bogus"])
        .assert()
        .success()
        .stdout(predicate::str::contains(
            "unknown strategy 'bogus', defaulted to balanced",
        ));
}

#[test]
fn test_config_file_sets_default_strategy() {
    let dir = workspace();
    fs::write(
        dir.path().join("taskrank.toml"),
        "default_strategy = \"deadline_driven\"\n",
    )
    .unwrap();

    taskrank(&dir)
        .args(["analyze", "tasks.json"])
        .assert()
        .success()
        .stdout(predicate::str::starts_with("Strategy: deadline_driven"));
}

#[test]
fn test_invalid_config_exits_with_cli_code() {
    let dir = workspace();
    fs::write(dir.path().join("taskrank.toml"), "[scoring]\nhorizon_days = 0\n").unwrap();

    taskrank(&dir)
        .args(["analyze", "tasks.json"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("horizon_days"));
}

#[test]
fn test_malformed_batch_exits_with_analysis_code() {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("bad.json"), r#"{"tasks": []}"#).unwrap();

    taskrank(&dir)
        .args(["analyze", "bad.json"])
        .assert()
        .code(3)
        .stderr(predicate::str::contains("Analysis failed"));
}

#[test]
fn test_json_error_envelope() {
    let dir = TempDir::new().unwrap();
    let output = taskrank(&dir)
        .args(["--json", "analyze", "missing.json"])
        .assert()
        .code(3)
        .get_output()
        .stdout
        .clone();

    let value: serde_json::Value = serde_json::from_slice(&output).unwrap();
    assert_eq!(value["status"], "error");
    assert_eq!(value["error"]["code"], "other");
}

#[test]
fn test_strategies_listing() {
    let dir = TempDir::new().unwrap();
    taskrank(&dir)
        .arg("strategies")
        .assert()
        .success()
        .stdout(predicate::str::contains("deadline_driven"))
        .stdout(predicate::str::contains("importance_driven"))
        .stdout(predicate::str::contains("critical_path"))
        .stdout(predicate::str::contains("balanced"));
}

#[test]
fn test_log_format_flag_routes_logs_to_stderr() {
    let dir = TempDir::new().unwrap();
    taskrank(&dir)
        .args(["--log-format", "compact", "-L", "info", "version"])
        .assert()
        .success()
        .stdout(predicate::str::starts_with("taskrank "))
        .stderr(predicate::str::contains("Tracing initialized"));
}

#[test]
fn test_no_subcommand_is_a_usage_error() {
    let dir = TempDir::new().unwrap();
    taskrank(&dir).assert().code(2);
}
