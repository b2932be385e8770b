//! Basic CLI E2E tests.
//!
//! Tests run the built binary against a throwaway data directory.

use std::io::Write;
use std::path::Path;
use std::process::{Command, Stdio};

use tempfile::TempDir;

/// Run a CLI command and return (stdout, stderr, exit code).
fn run_cli(data_dir: &Path, args: &[&str], stdin: &str) -> (String, String, i32) {
    let mut child = Command::new(env!("CARGO_BIN_EXE_fittrack-cli"))
        .args(args)
        .env("FITTRACK_DATA_DIR", data_dir)
        .env_remove("FITTRACK_LOG")
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .expect("Failed to execute CLI command");

    child
        .stdin
        .take()
        .expect("stdin is piped")
        .write_all(stdin.as_bytes())
        .expect("Failed to write stdin");
    let output = child.wait_with_output().expect("Failed to wait for CLI");

    let stdout = String::from_utf8_lossy(&output.stdout).to_string();
    let stderr = String::from_utf8_lossy(&output.stderr).to_string();
    let code = output.status.code().unwrap_or(-1);

    (stdout, stderr, code)
}

fn run_ok(data_dir: &Path, args: &[&str]) -> String {
    let (stdout, stderr, code) = run_cli(data_dir, args, "");
    assert_eq!(code, 0, "CLI command failed: {args:?}\n{stderr}");
    stdout
}

fn json_lines(stdout: &str) -> Vec<serde_json::Value> {
    stdout
        .lines()
        .filter(|l| !l.trim().is_empty())
        .map(|l| serde_json::from_str(l).expect("stdout line is JSON"))
        .collect()
}

const LEG_DAY: &str = r#"{
  "name": "Leg Day",
  "exercises": [
    { "id": "e1", "name": "Squat", "targetValue": 10, "kind": "reps" },
    { "id": "e2", "name": "Wall sit", "targetValue": 30, "kind": "time" }
  ],
  "setCount": 1
}"#;

fn write_template(dir: &TempDir) -> String {
    let path = dir.path().join("leg_day.json");
    std::fs::write(&path, LEG_DAY).unwrap();
    path.to_string_lossy().into_owned()
}

#[test]
fn test_config_roundtrip() {
    let dir = TempDir::new().unwrap();
    assert_eq!(run_ok(dir.path(), &["config", "get", "session.rest_seconds"]).trim(), "60");
    run_ok(dir.path(), &["config", "set", "session.rest_seconds", "90"]);
    assert_eq!(run_ok(dir.path(), &["config", "get", "session.rest_seconds"]).trim(), "90");
    run_ok(dir.path(), &["config", "reset"]);
    assert_eq!(run_ok(dir.path(), &["config", "get", "session.rest_seconds"]).trim(), "60");
}

#[test]
fn test_config_unknown_key_fails() {
    let dir = TempDir::new().unwrap();
    let (_, stderr, code) = run_cli(dir.path(), &["config", "get", "session.nope"], "");
    assert_eq!(code, 1);
    assert!(stderr.starts_with("error:"));
}

#[test]
fn test_template_import_and_list() {
    let dir = TempDir::new().unwrap();
    let file = write_template(&dir);
    let out = run_ok(dir.path(), &["template", "import", &file]);
    assert!(out.contains("Leg Day"));

    let out = run_ok(dir.path(), &["template", "list", "--json"]);
    let templates: serde_json::Value = serde_json::from_str(&out).unwrap();
    assert_eq!(templates[0]["name"], "Leg Day");
    assert_eq!(templates[0]["exercises"].as_array().unwrap().len(), 2);
}

#[test]
fn test_template_import_rejects_empty_routine() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("empty.json");
    std::fs::write(&path, r#"{"name": "Nothing", "exercises": []}"#).unwrap();
    let (_, stderr, code) = run_cli(dir.path(), &["template", "import", path.to_str().unwrap()], "");
    assert_eq!(code, 1);
    assert!(stderr.contains("error:"));
}

#[test]
fn test_workout_complete_is_recorded() {
    let dir = TempDir::new().unwrap();
    let file = write_template(&dir);
    let (stdout, stderr, code) = run_cli(
        dir.path(),
        &["workout", "start", &file],
        "done 1\nskip\ndone 2\ncomplete\n",
    );
    assert_eq!(code, 0, "{stderr}");

    let lines = json_lines(&stdout);
    assert_eq!(lines[0]["type"], "SessionStarted");
    assert!(lines.iter().any(|e| e["type"] == "RestStarted"));
    assert!(lines.iter().any(|e| e["type"] == "SessionCompleted"));
    let record = lines.last().unwrap();
    assert_eq!(record["name"], "Leg Day");
    assert_eq!(record["completionPercentage"], 100.0);
    assert_eq!(record["completed"], true);

    let history: serde_json::Value =
        serde_json::from_str(&run_ok(dir.path(), &["history", "list"])).unwrap();
    assert_eq!(history.as_array().unwrap().len(), 1);
    assert_eq!(history[0]["id"], record["id"]);
}

#[test]
fn test_history_delete_removes_workout() {
    let dir = TempDir::new().unwrap();
    let file = write_template(&dir);
    let (stdout, stderr, code) = run_cli(dir.path(), &["workout", "start", &file], "complete\n");
    assert_eq!(code, 0, "{stderr}");
    let record = json_lines(&stdout).pop().unwrap();
    let id = record["id"].as_str().unwrap().to_string();

    let out = run_ok(dir.path(), &["history", "delete", &id]);
    assert!(out.contains(&id));
    let history: serde_json::Value =
        serde_json::from_str(&run_ok(dir.path(), &["history", "list"])).unwrap();
    assert!(history.as_array().unwrap().is_empty());

    let (_, stderr, code) = run_cli(dir.path(), &["history", "delete", &id], "");
    assert_eq!(code, 1);
    assert!(stderr.contains("no workout with id"));
}

#[test]
fn test_workout_end_of_input_quits_with_partial_record() {
    let dir = TempDir::new().unwrap();
    let file = write_template(&dir);
    let (stdout, stderr, code) = run_cli(dir.path(), &["workout", "start", &file], "done 1\n");
    assert_eq!(code, 0, "{stderr}");

    let lines = json_lines(&stdout);
    assert!(lines.iter().any(|e| e["type"] == "QuitPromptOpened"));
    assert!(lines.iter().any(|e| e["type"] == "SessionQuit"));
    assert_eq!(lines.last().unwrap()["completionPercentage"], 50.0);

    let stats: serde_json::Value =
        serde_json::from_str(&run_ok(dir.path(), &["history", "stats"])).unwrap();
    assert_eq!(stats["total_workouts"], 1);
}

#[test]
fn test_workout_quit_prompt_can_be_cancelled() {
    let dir = TempDir::new().unwrap();
    let file = write_template(&dir);
    let (stdout, _, code) = run_cli(
        dir.path(),
        &["workout", "start", &file],
        "quit\nquit\nno\nstatus\nquit\nyes\n",
    );
    assert_eq!(code, 0);

    let types: Vec<String> = json_lines(&stdout)
        .iter()
        .filter_map(|e| e["type"].as_str().map(str::to_string))
        .filter(|t| t.starts_with("QuitPrompt") || t == "NavigationSuppressed" || t == "SessionQuit")
        .collect();
    assert_eq!(
        types,
        vec![
            "QuitPromptOpened",
            "NavigationSuppressed",
            "QuitPromptCancelled",
            "QuitPromptOpened",
            "SessionQuit",
        ]
    );
}

#[test]
fn test_workout_bad_input_is_reported_not_fatal() {
    let dir = TempDir::new().unwrap();
    let file = write_template(&dir);
    let (stdout, stderr, code) = run_cli(
        dir.path(),
        &["workout", "start", &file],
        "jump\ndone 9\ndone 1\ncomplete\n",
    );
    assert_eq!(code, 0);
    assert!(stderr.contains("unknown command 'jump'"));
    assert!(stderr.contains("no exercise 9"));
    assert_eq!(json_lines(&stdout).last().unwrap()["completionPercentage"], 50.0);
}

#[test]
fn test_workout_unknown_template_fails() {
    let dir = TempDir::new().unwrap();
    let (_, stderr, code) = run_cli(dir.path(), &["workout", "start", "Arm Day"], "");
    assert_eq!(code, 1);
    assert!(stderr.contains("no template named 'Arm Day'"));
}

#[test]
fn test_workout_from_stored_template() {
    let dir = TempDir::new().unwrap();
    let file = write_template(&dir);
    run_ok(dir.path(), &["template", "import", &file]);
    let (stdout, _, code) = run_cli(dir.path(), &["workout", "start", "Leg Day"], "complete\n");
    assert_eq!(code, 0);
    assert_eq!(json_lines(&stdout).last().unwrap()["completionPercentage"], 0.0);
}

#[test]
fn test_profile_set_and_show() {
    let dir = TempDir::new().unwrap();
    let out = run_ok(dir.path(), &["profile", "show"]);
    assert!(out.contains("No profile found"));

    run_ok(dir.path(), &["profile", "set", "--height", "180", "--weight", "81"]);
    let profile: serde_json::Value =
        serde_json::from_str(&run_ok(dir.path(), &["profile", "show"])).unwrap();
    assert_eq!(profile["bmiCategory"], "Overweight");

    let (_, _, code) = run_cli(dir.path(), &["profile", "set", "--height", "0", "--weight", "81"], "");
    assert_eq!(code, 1);
}

#[test]
fn test_reminders_defaults_and_update() {
    let dir = TempDir::new().unwrap();
    let settings: serde_json::Value =
        serde_json::from_str(&run_ok(dir.path(), &["reminders", "show"])).unwrap();
    assert_eq!(settings["time"], "18:00");
    assert_eq!(settings["enabled"], true);

    run_ok(
        dir.path(),
        &["reminders", "set", "--disable", "--days", "tue,thu", "--time", "07:30"],
    );
    let settings: serde_json::Value =
        serde_json::from_str(&run_ok(dir.path(), &["reminders", "show"])).unwrap();
    assert_eq!(settings["enabled"], false);
    assert_eq!(settings["days"], serde_json::json!(["tuesday", "thursday"]));
    assert_eq!(settings["time"], "07:30");

    let (_, _, code) = run_cli(dir.path(), &["reminders", "set", "--time", "7:30pm"], "");
    assert_eq!(code, 1);
}
