//! Basic CLI E2E tests.
//!
//! Tests invoke the built binary against a temporary data directory and
//! verify its JSON output.

use std::path::Path;
use std::process::Command;

use serde_json::Value;

/// Run a CLI command and return (exit code, stdout, stderr).
fn run_cli(data_dir: &Path, args: &[&str]) -> (i32, String, String) {
    let output = Command::new(env!("CARGO_BIN_EXE_waterprint"))
        .args(args)
        .env("WATERPRINT_DATA_DIR", data_dir)
        .env_remove("WATERPRINT_LOG")
        .output()
        .expect("Failed to execute CLI command");

    let code = output.status.code().unwrap_or(-1);
    let stdout = String::from_utf8_lossy(&output.stdout).to_string();
    let stderr = String::from_utf8_lossy(&output.stderr).to_string();
    (code, stdout, stderr)
}

fn run_json(data_dir: &Path, args: &[&str]) -> Value {
    let (code, stdout, stderr) = run_cli(data_dir, args);
    assert_eq!(code, 0, "{args:?} failed: {stderr}");
    serde_json::from_str(&stdout).expect("stdout is not JSON")
}

/// Long showers, hand dishwashing, full laundry loads, dual flush, tap off,
/// no garden, no car.
fn submit_survey(data_dir: &Path) -> Value {
    run_json(data_dir, &["survey", "submit", "2,2,0,0,0,1,0"])
}

#[test]
fn test_survey_questions() {
    let dir = tempfile::tempdir().unwrap();
    let questions = run_json(dir.path(), &["survey", "questions"]);
    assert_eq!(questions.as_array().unwrap().len(), 8);
    assert_eq!(questions[0]["options"][0]["type"], "Achievement");
}

#[test]
fn test_survey_submit_scores_and_creates_profile() {
    let dir = tempfile::tempdir().unwrap();
    let result = submit_survey(dir.path());
    assert_eq!(result["totalUsage"], 142.0);
    assert_eq!(result["improvementAreas"], serde_json::json!(["Shower", "Dishwashing"]));
    assert_eq!(result["achievements"].as_array().unwrap().len(), 3);

    let profile = run_json(dir.path(), &["profile", "show"]);
    assert_eq!(profile["initialWaterprint"], 142.0);
    assert_eq!(profile["currentWaterprint"], 131.0);

    let pending = run_json(dir.path(), &["survey", "pending"]);
    assert!(pending.as_array().unwrap().is_empty());
}

#[test]
fn test_survey_rejects_bad_index() {
    let dir = tempfile::tempdir().unwrap();
    let (code, _, stderr) = run_cli(dir.path(), &["survey", "submit", "9"]);
    assert_eq!(code, 1);
    assert!(stderr.contains("error:"));
}

#[test]
fn test_profile_show_without_survey_fails() {
    let dir = tempfile::tempdir().unwrap();
    let (code, _, stderr) = run_cli(dir.path(), &["profile", "show"]);
    assert_eq!(code, 1);
    assert!(stderr.contains("Unknown profile"));
}

#[test]
fn test_challenge_lifecycle() {
    let dir = tempfile::tempdir().unwrap();
    submit_survey(dir.path());

    let challenge = run_json(dir.path(), &["challenge", "start", "Shower", "--target", "10"]);
    assert_eq!(challenge["targetSaving"], 10.0);
    assert_eq!(challenge["status"], "active");

    let mut last = Value::Null;
    for saved in ["2", "1", "2", "1", "2", "1", "2"] {
        last = run_json(dir.path(), &["challenge", "log", "Shower", saved]);
    }
    assert_eq!(last["challenge"]["status"], "resolved");
    assert_eq!(last["outcome"]["achievement"]["improvement"], 11.0);

    let profile = run_json(dir.path(), &["profile", "show"]);
    assert_eq!(profile["currentWaterprint"], 120.0);

    let tasks = run_json(dir.path(), &["task", "list"]);
    let categories: Vec<&str> = tasks
        .as_array()
        .unwrap()
        .iter()
        .map(|t| t["category"].as_str().unwrap())
        .collect();
    assert_eq!(categories, ["Dishwashing"]);

    let outbox = run_json(dir.path(), &["profile", "outbox"]);
    assert_eq!(outbox.as_array().unwrap().len(), 1);
    assert_eq!(outbox[0]["update"]["waterprintReduction"], 11.0);
}

#[test]
fn test_challenge_log_above_cap_rejected() {
    let dir = tempfile::tempdir().unwrap();
    submit_survey(dir.path());
    run_json(dir.path(), &["challenge", "start", "Shower"]);

    let (code, _, stderr) = run_cli(dir.path(), &["challenge", "log", "Shower", "99"]);
    assert_eq!(code, 1);
    assert!(stderr.contains("Invalid action"), "{stderr}");

    let (code, _, _) = run_cli(dir.path(), &["challenge", "log", "Shower", "-1"]);
    assert_eq!(code, 1);

    let status = run_json(dir.path(), &["challenge", "status", "Shower"]);
    assert!(status[0]["challenge"]["dailyActions"].as_array().unwrap().is_empty());
}

#[test]
fn test_challenge_plan_and_finish_early() {
    let dir = tempfile::tempdir().unwrap();
    submit_survey(dir.path());

    let planned = run_json(dir.path(), &["challenge", "plan"]);
    assert_eq!(planned.as_array().unwrap().len(), 2);

    let outcome = run_json(dir.path(), &["challenge", "finish", "Dishwashing"]);
    assert!(outcome["achievement"].is_null());
    assert_eq!(outcome["challenge"]["status"], "completed");
}

#[test]
fn test_profile_complete_queues_update() {
    let dir = tempfile::tempdir().unwrap();
    submit_survey(dir.path());

    let profile = run_json(
        dir.path(),
        &["profile", "complete", "5", "--task-id", "fix-leak"],
    );
    assert_eq!(profile["currentWaterprint"], 126.0);

    let outbox = run_json(dir.path(), &["profile", "outbox"]);
    assert_eq!(outbox[0]["update"]["taskId"], "fix-leak");

    let id = outbox[0]["id"].as_i64().unwrap().to_string();
    let (code, _, _) = run_cli(dir.path(), &["profile", "ack", &id]);
    assert_eq!(code, 0);
    let outbox = run_json(dir.path(), &["profile", "outbox"]);
    assert!(outbox.as_array().unwrap().is_empty());
}

#[test]
fn test_task_count_reports_reminder() {
    let dir = tempfile::tempdir().unwrap();
    submit_survey(dir.path());
    let count = run_json(dir.path(), &["task", "count"]);
    assert_eq!(count["pending"], 2);
    assert_eq!(count["reminderDue"], true);
}

#[test]
fn test_catalog_list() {
    let dir = tempfile::tempdir().unwrap();
    let rows = run_json(dir.path(), &["catalog", "list"]);
    let shower = rows
        .as_array()
        .unwrap()
        .iter()
        .find(|r| r["category"] == "Shower")
        .unwrap();
    assert_eq!(shower["dailyCap"], 5.0);
    assert_eq!(shower["target"], 35.0);
}

#[test]
fn test_config_get_set() {
    let dir = tempfile::tempdir().unwrap();
    let (code, stdout, _) = run_cli(dir.path(), &["config", "get", "challenge.duration_days"]);
    assert_eq!(code, 0);
    assert_eq!(stdout.trim(), "7");

    let (code, _, _) = run_cli(dir.path(), &["config", "set", "challenge.duration_days", "10"]);
    assert_eq!(code, 0);
    let (_, stdout, _) = run_cli(dir.path(), &["config", "get", "challenge.duration_days"]);
    assert_eq!(stdout.trim(), "10");

    let (code, _, _) = run_cli(dir.path(), &["config", "set", "challenge.nope", "1"]);
    assert_eq!(code, 1);
}

#[test]
fn test_oversized_day_counts_fail_cleanly() {
    let dir = tempfile::tempdir().unwrap();
    let (code, _, stderr) = run_cli(
        dir.path(),
        &["config", "set", "challenge.duration_days", "4294967295"],
    );
    assert_eq!(code, 1);
    assert!(stderr.contains("challenge.duration_days"), "{stderr}");
    let (_, stdout, _) = run_cli(dir.path(), &["config", "get", "challenge.duration_days"]);
    assert_eq!(stdout.trim(), "7");

    submit_survey(dir.path());
    let (code, _, stderr) = run_cli(dir.path(), &["profile", "savings", "--days", "4294967295"]);
    assert_eq!(code, 1);
    assert!(stderr.contains("Invalid window"), "{stderr}");
}
