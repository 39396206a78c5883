//! Integration tests for the cairn CLI.
//!
//! These tests verify the end-to-end behavior of the CLI commands against a
//! catalog in a temporary directory.

use rstest::{fixture, rstest};
use serde_json::Value;
use tempfile::TempDir;

mod common;
use common::{run_cairn_in_dir, write_record};

// ============================================================================
// Test Fixtures
// ============================================================================

/// Provides a temporary directory with an initialized catalog
#[fixture]
fn initialized_dir() -> TempDir {
    let temp = TempDir::new().expect("Failed to create temp directory");
    let output = run_cairn_in_dir(temp.path(), &["init", "--quiet"]);
    assert!(
        output.status.success(),
        "Failed to initialize cairn: {:?}",
        String::from_utf8_lossy(&output.stderr)
    );
    temp
}

/// An initialized catalog with an epic, two issues and a task
#[fixture]
fn populated_dir(initialized_dir: TempDir) -> TempDir {
    let root = initialized_dir.path();
    write_record(root, "epics", "EPIC-1", &["status: in-progress"]);
    write_record(root, "issues", "ISS-1", &["epicId: EPIC-1", "priority: high"]);
    write_record(root, "issues", "ISS-2", &["status: done"]);
    write_record(root, "tasks", "TASK-1", &["issueId: ISS-1", "blockedBy: [ISS-2, TASK-9]"]);
    initialized_dir
}

fn stdout_json(output: &std::process::Output) -> Value {
    assert!(
        output.status.success(),
        "command failed: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    serde_json::from_slice(&output.stdout).expect("stdout should be JSON")
}

// ============================================================================
// Help and Version Tests
// ============================================================================

#[test]
fn test_cli_help_shows_all_commands() {
    let temp = TempDir::new().unwrap();
    let output = run_cairn_in_dir(temp.path(), &["--help"]);

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    for command in ["init", "rebuild", "status", "list", "show", "update", "remove", "overview", "check"] {
        assert!(stdout.contains(command), "help should mention {command}");
    }
}

#[test]
fn test_cli_no_args() {
    let temp = TempDir::new().unwrap();
    let output = run_cairn_in_dir(temp.path(), &[]);
    assert!(output.status.success());
}

// ============================================================================
// Command Tests
// ============================================================================

#[rstest]
fn test_init_twice_fails(initialized_dir: TempDir) {
    let output = run_cairn_in_dir(initialized_dir.path(), &["init", "--quiet"]);

    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("already initialized"));
}

#[rstest]
fn test_rebuild_reports_item_count(populated_dir: TempDir) {
    let output = run_cairn_in_dir(populated_dir.path(), &["rebuild", "--json"]);
    let json = stdout_json(&output);

    assert_eq!(json["items"], 4);
    assert_eq!(json["stats"]["counts"]["issues"], 2);
    assert!(populated_dir.path().join(".cairn/index.json").exists());
}

#[rstest]
fn test_list_filters_by_status(populated_dir: TempDir) {
    let output = run_cairn_in_dir(populated_dir.path(), &["list", "issues", "--status", "done", "--json"]);
    let json = stdout_json(&output);

    let ids: Vec<&str> = json
        .as_array()
        .unwrap()
        .iter()
        .map(|e| e["id"].as_str().unwrap())
        .collect();
    assert_eq!(ids, vec!["ISS-2"]);
}

#[rstest]
fn test_list_text_output(populated_dir: TempDir) {
    let output = run_cairn_in_dir(populated_dir.path(), &["list", "issue"]);

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("ISS-1"));
    assert!(stdout.contains("Title ISS-2"));
    assert!(stdout.contains("2 item(s)"));
}

#[rstest]
fn test_show_includes_derived_children(populated_dir: TempDir) {
    let output = run_cairn_in_dir(populated_dir.path(), &["show", "EPIC-1", "--json"]);
    let json = stdout_json(&output);

    assert_eq!(json["type"], "epic");
    assert_eq!(json["entry"]["children"]["issueIds"], serde_json::json!(["ISS-1"]));
}

#[rstest]
fn test_show_missing_item_fails(populated_dir: TempDir) {
    let output = run_cairn_in_dir(populated_dir.path(), &["show", "ISS-404"]);

    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("ISS-404"));
}

#[rstest]
fn test_update_after_delete_removes_item(populated_dir: TempDir) {
    let root = populated_dir.path();
    stdout_json(&run_cairn_in_dir(root, &["rebuild", "--json"]));
    std::fs::remove_file(root.join("issues/ISS-1.md")).unwrap();

    let json = stdout_json(&run_cairn_in_dir(root, &["update", "issue", "ISS-1", "--json"]));
    assert_eq!(json["outcome"], "removed");

    let json = stdout_json(&run_cairn_in_dir(root, &["show", "EPIC-1", "--json"]));
    assert!(json["entry"].get("children").is_none());
}

#[rstest]
fn test_remove_reports_whether_anything_changed(populated_dir: TempDir) {
    let root = populated_dir.path();

    let json = stdout_json(&run_cairn_in_dir(root, &["remove", "task", "TASK-1", "--json"]));
    assert_eq!(json["removed"], true);

    let json = stdout_json(&run_cairn_in_dir(root, &["remove", "task", "TASK-1", "--json"]));
    assert_eq!(json["removed"], false);
}

#[rstest]
fn test_overview_json(populated_dir: TempDir) {
    let json = stdout_json(&run_cairn_in_dir(populated_dir.path(), &["overview", "--json"]));

    assert_eq!(json["totalItems"], 4);
    assert_eq!(json["completionRate"], 25.0);
    assert_eq!(json["byStatus"]["done"], 1);
    assert_eq!(json["byType"]["issue"]["total"], 2);
}

#[rstest]
fn test_check_reports_dangling_blocker(populated_dir: TempDir) {
    let json = stdout_json(&run_cairn_in_dir(populated_dir.path(), &["check", "--json"]));

    let dangling = json["dangling"].as_array().unwrap();
    assert_eq!(dangling.len(), 1);
    assert_eq!(dangling[0]["target"], "TASK-9");
    assert_eq!(dangling[0]["relation"], "blockedBy");
    assert!(json["cycles"].as_array().unwrap().is_empty());
    // ISS-2 is done, so TASK-1 is not blocked by it.
    assert!(json["blocked"].as_array().unwrap().is_empty());

    let strict = run_cairn_in_dir(populated_dir.path(), &["check", "--strict"]);
    assert!(!strict.status.success());
}

#[rstest]
fn test_status_from_nested_directory(populated_dir: TempDir) {
    let nested = populated_dir.path().join("issues");
    let json = stdout_json(&run_cairn_in_dir(&nested, &["status", "--json"]));

    assert_eq!(json["totalItems"], 4);
    assert_eq!(json["counts"]["tasks"], 1);
}
