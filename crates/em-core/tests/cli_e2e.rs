//! End-to-end CLI tests against a temporary data directory.

use assert_cmd::Command;
use predicates::prelude::*;
use serde_json::Value;
use tempfile::TempDir;

fn em(dir: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("em-core").unwrap();
    cmd.env_remove("EMOTION_MONITOR_CONFIG")
        .env_remove("EMOTION_MONITOR_DATA_DIR")
        .env_remove("EM_LOG")
        .env_remove("RUST_LOG")
        .env("XDG_CONFIG_HOME", dir.path().join("config"))
        .arg("--data-dir")
        .arg(dir.path().join("telemetry"));
    cmd
}

fn json_stdout(cmd: &mut Command) -> Value {
    let output = cmd.output().unwrap();
    assert!(output.status.success(), "{:?}", output);
    serde_json::from_slice(&output.stdout).unwrap()
}

#[test]
fn test_init_creates_tables() {
    let dir = TempDir::new().unwrap();
    let report = json_stdout(em(&dir).arg("init"));
    assert_eq!(report["status"], "ok");
    assert_eq!(report["backend"], "parquet");
    let tables = dir.path().join("telemetry");
    assert!(tables.join("page_visited_table").join("_schema.json").exists());
    assert!(tables.join("emotion_clf_table").join("_schema.json").exists());
}

#[test]
fn test_analyze_then_predictions() {
    let dir = TempDir::new().unwrap();
    let analysis = json_stdout(em(&dir).args(["analyze", "I am so happy today"]));
    assert_eq!(analysis["label"], "happy");

    let predictions = json_stdout(em(&dir).arg("predictions"));
    let rows = predictions.as_array().unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0]["prediction"], "happy");
    assert_eq!(rows[0]["probability"], analysis["confidence"]);
    assert!(rows[0]["time"].as_str().unwrap().ends_with("+05:30"));
}

#[test]
fn test_visit_counts() {
    let dir = TempDir::new().unwrap();
    em(&dir).args(["visit", "home"]).assert().success();
    em(&dir).args(["visit", "monitor"]).assert().success();
    em(&dir).args(["visit", "home"]).assert().success();

    let report = json_stdout(em(&dir).arg("visits"));
    assert_eq!(report["visits"].as_array().unwrap().len(), 3);
    assert_eq!(report["page_counts"][0]["page_name"], "Home");
    assert_eq!(report["page_counts"][0]["count"], 2);
    assert_eq!(report["page_counts"][1]["page_name"], "Monitor");
}

#[test]
fn test_empty_text_fails_with_inference_exit_code() {
    let dir = TempDir::new().unwrap();
    em(&dir)
        .args(["analyze", ""])
        .assert()
        .code(12)
        .stderr(predicate::str::contains("\"code\":30"));

    let predictions = json_stdout(em(&dir).arg("predictions"));
    assert!(predictions.as_array().unwrap().is_empty());
}

#[test]
fn test_dashboard_markdown() {
    let dir = TempDir::new().unwrap();
    em(&dir).args(["analyze", "wow"]).assert().success();
    em(&dir)
        .args(["dashboard", "--format", "md"])
        .assert()
        .success()
        .stdout(
            predicate::str::contains("# Emotion Monitor")
                .and(predicate::str::contains("| Monitor | 1 |"))
                .and(predicate::str::contains("surprise")),
        );
}

#[test]
fn test_bad_config_exit_code() {
    let dir = TempDir::new().unwrap();
    let config = dir.path().join("monitor.json");
    std::fs::write(&config, "{ not json").unwrap();
    em(&dir)
        .arg("--config")
        .arg(&config)
        .arg("init")
        .assert()
        .code(11);
}

#[test]
fn test_unknown_page_is_args_error() {
    let dir = TempDir::new().unwrap();
    em(&dir).args(["visit", "settings"]).assert().code(10);
}
