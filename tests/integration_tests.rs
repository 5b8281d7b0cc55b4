//! Integration tests for the gavel CLI
//!
//! These tests drive the binary end to end against a temporary project.

use assert_cmd::Command;
use assert_cmd::cargo::cargo_bin_cmd;
use predicates::prelude::*;
use std::fs;
use std::path::PathBuf;
use tempfile::TempDir;

/// Helper to create a gavel Command
fn gavel() -> Command {
    let mut cmd = cargo_bin_cmd!("gavel");
    cmd.env_remove("GAVEL_STORE_DIR");
    cmd
}

/// Helper to create a temporary project directory
fn create_temp_project() -> TempDir {
    TempDir::new().unwrap()
}

/// Helper to initialize a gavel project in a temp directory
fn init_gavel_project(dir: &TempDir) {
    gavel()
        .current_dir(dir.path())
        .arg("init")
        .assert()
        .success();
}

fn write_request(dir: &TempDir, name: &str, json: &str) -> PathBuf {
    let path = dir.path().join(name);
    fs::write(&path, json).unwrap();
    path
}

const SCALAR_REQUEST: &str = r#"{
    "id": "g1",
    "phaseId": "draft",
    "prompt": "Review the draft",
    "currentOutput": "draft text",
    "editableFields": ["output"],
    "canSkip": true
}"#;

const MAPPING_REQUEST: &str = r#"{
    "id": "g2",
    "phase_id": "outline",
    "current_output": {"summary": "x", "tags": ["a", "b"]},
    "editable_fields": ["tags"],
    "can_skip": false
}"#;

// =============================================================================
// Basic CLI Tests
// =============================================================================

mod cli_basics {
    use super::*;

    #[test]
    fn test_gavel_help() {
        gavel().arg("--help").assert().success();
    }

    #[test]
    fn test_gavel_version() {
        gavel().arg("--version").assert().success();
    }

    #[test]
    fn test_gavel_init_creates_structure() {
        let dir = create_temp_project();

        gavel()
            .current_dir(dir.path())
            .arg("init")
            .assert()
            .success()
            .stdout(predicate::str::contains("Initialized gavel project"));

        assert!(dir.path().join(".gavel/gavel.toml").exists());
        assert!(dir.path().join(".gavel/store").exists());
    }

    #[test]
    fn test_gavel_init_idempotent() {
        let dir = create_temp_project();
        init_gavel_project(&dir);

        gavel()
            .current_dir(dir.path())
            .arg("init")
            .assert()
            .success()
            .stdout(predicate::str::contains("already initialized"));
    }
}

// =============================================================================
// Review Tests
// =============================================================================

mod review {
    use super::*;

    #[test]
    fn test_approve_with_scalar_edit_reports_engine_call() {
        let dir = create_temp_project();
        init_gavel_project(&dir);
        let request = write_request(&dir, "request.json", SCALAR_REQUEST);

        gavel()
            .current_dir(dir.path())
            .arg("review")
            .arg(&request)
            .args(["--action", "approve", "--edit", "output=revised text"])
            .assert()
            .success()
            .stdout(predicate::str::contains(r#""call":"approve""#))
            .stdout(predicate::str::contains(r#""gavel_id":"g1""#))
            .stdout(predicate::str::contains(r#""new_output":"revised text""#));

        gavel()
            .current_dir(dir.path())
            .args(["history", "--json"])
            .assert()
            .success()
            .stdout(predicate::str::contains(r#""decision": "approved""#))
            .stdout(predicate::str::contains(r#""output": "revised text""#));
    }

    #[test]
    fn test_structured_edit_is_sent_typed() {
        let dir = create_temp_project();
        init_gavel_project(&dir);
        let request = write_request(&dir, "request.json", MAPPING_REQUEST);

        gavel()
            .current_dir(dir.path())
            .arg("review")
            .arg(&request)
            .args(["--action", "approve", "--edit", r#"tags=["a","b","c"]"#])
            .assert()
            .success()
            .stdout(predicate::str::contains(r#""tags":["a","b","c"]"#));
    }

    #[test]
    fn test_reject_sends_commentary_only() {
        let dir = create_temp_project();
        init_gavel_project(&dir);
        let request = write_request(&dir, "request.json", SCALAR_REQUEST);

        gavel()
            .current_dir(dir.path())
            .arg("review")
            .arg(&request)
            .args(["--action", "reject", "--commentary", "needs more detail"])
            .assert()
            .success()
            .stdout(predicate::str::contains(r#""call":"reject""#))
            .stdout(predicate::str::contains(r#""commentary":"needs more detail""#))
            .stdout(predicate::str::contains("edited_values").not());
    }

    #[test]
    fn test_skip_not_allowed_fails_and_records_nothing() {
        let dir = create_temp_project();
        init_gavel_project(&dir);
        let request = write_request(&dir, "request.json", MAPPING_REQUEST);

        gavel()
            .current_dir(dir.path())
            .arg("review")
            .arg(&request)
            .args(["--action", "skip"])
            .assert()
            .failure()
            .stderr(predicate::str::contains("cannot be skipped"));

        gavel()
            .current_dir(dir.path())
            .arg("history")
            .assert()
            .success()
            .stdout(predicate::str::contains("No review decisions recorded"));
    }

    #[test]
    fn test_edit_of_locked_field_fails() {
        let dir = create_temp_project();
        init_gavel_project(&dir);
        let request = write_request(&dir, "request.json", MAPPING_REQUEST);

        gavel()
            .current_dir(dir.path())
            .arg("review")
            .arg(&request)
            .args(["--action", "approve", "--edit", "summary=changed"])
            .assert()
            .failure()
            .stderr(predicate::str::contains("not editable"));
    }

    #[test]
    fn test_invalid_action_fails() {
        let dir = create_temp_project();
        init_gavel_project(&dir);
        let request = write_request(&dir, "request.json", SCALAR_REQUEST);

        gavel()
            .current_dir(dir.path())
            .arg("review")
            .arg(&request)
            .args(["--action", "maybe"])
            .assert()
            .failure()
            .stderr(predicate::str::contains("Invalid decision"));
    }

    #[test]
    fn test_malformed_request_fails() {
        let dir = create_temp_project();
        init_gavel_project(&dir);
        let request = write_request(&dir, "request.json", "{not json");

        gavel()
            .current_dir(dir.path())
            .arg("review")
            .arg(&request)
            .args(["--action", "approve"])
            .assert()
            .failure()
            .stderr(predicate::str::contains("Failed to parse review request"));
    }
}

// =============================================================================
// History Tests
// =============================================================================

mod history {
    use super::*;

    fn approve(dir: &TempDir, request: &PathBuf) {
        gavel()
            .current_dir(dir.path())
            .arg("review")
            .arg(request)
            .args(["--action", "approve"])
            .assert()
            .success();
    }

    #[test]
    fn test_history_is_capped_newest_first() {
        let dir = create_temp_project();
        init_gavel_project(&dir);

        for i in 0..4 {
            let json = SCALAR_REQUEST.replace("\"g1\"", &format!("\"r{}\"", i));
            let request = write_request(&dir, &format!("r{}.json", i), &json);
            approve(&dir, &request);
        }

        let output = gavel()
            .current_dir(dir.path())
            .args(["--history-capacity", "2", "history", "--json"])
            .output()
            .unwrap();
        assert!(output.status.success());
        let records: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
        let ids: Vec<&str> = records
            .as_array()
            .unwrap()
            .iter()
            .map(|r| r["gavel_id"].as_str().unwrap())
            .collect();
        assert_eq!(ids, vec!["r3", "r2"]);
    }

    #[test]
    fn test_history_clear() {
        let dir = create_temp_project();
        init_gavel_project(&dir);
        let request = write_request(&dir, "request.json", SCALAR_REQUEST);
        approve(&dir, &request);

        gavel()
            .current_dir(dir.path())
            .args(["history", "clear"])
            .assert()
            .success()
            .stdout(predicate::str::contains("Cleared 1 decision(s)"));

        gavel()
            .current_dir(dir.path())
            .arg("history")
            .assert()
            .success()
            .stdout(predicate::str::contains("No review decisions recorded"));
    }

    #[test]
    fn test_corrupt_history_is_treated_as_empty() {
        let dir = create_temp_project();
        init_gavel_project(&dir);
        fs::write(dir.path().join(".gavel/store/gavel.history.json"), "{broken").unwrap();

        gavel()
            .current_dir(dir.path())
            .arg("history")
            .assert()
            .success()
            .stdout(predicate::str::contains("No review decisions recorded"));
    }

    #[test]
    fn test_store_dir_flag_redirects_history() {
        let dir = create_temp_project();
        init_gavel_project(&dir);
        let request = write_request(&dir, "request.json", SCALAR_REQUEST);

        gavel()
            .current_dir(dir.path())
            .args(["--store-dir", "elsewhere", "review"])
            .arg(&request)
            .args(["--action", "approve"])
            .assert()
            .success();

        assert!(dir.path().join("elsewhere/gavel.history.json").exists());
        gavel()
            .current_dir(dir.path())
            .arg("history")
            .assert()
            .success()
            .stdout(predicate::str::contains("No review decisions recorded"));
    }
}

// =============================================================================
// Configuration Tests
// =============================================================================

mod configuration {
    use super::*;

    #[test]
    fn test_config_show_defaults() {
        let dir = create_temp_project();

        gavel()
            .current_dir(dir.path())
            .args(["config", "show"])
            .assert()
            .success()
            .stdout(predicate::str::contains("Using default configuration"))
            .stdout(predicate::str::contains("capacity = 50"))
            .stdout(predicate::str::contains("panel position = (0, 0)"));
    }

    #[test]
    fn test_config_position_is_stored_and_shown() {
        let dir = create_temp_project();
        init_gavel_project(&dir);

        gavel()
            .current_dir(dir.path())
            .args(["config", "position", "120", "48.5"])
            .assert()
            .success()
            .stdout(predicate::str::contains("Panel position set to (120, 48.5)"));

        assert!(dir.path().join(".gavel/store/gavel.panel_position.json").exists());
        gavel()
            .current_dir(dir.path())
            .args(["config", "show"])
            .assert()
            .success()
            .stdout(predicate::str::contains("panel position = (120, 48.5)"));
    }

    #[test]
    fn test_config_validate_defaults() {
        let dir = create_temp_project();
        init_gavel_project(&dir);

        gavel()
            .current_dir(dir.path())
            .args(["config", "validate"])
            .assert()
            .success()
            .stdout(predicate::str::contains("Configuration is valid"));
    }

    #[test]
    fn test_config_validate_reports_warnings() {
        let dir = create_temp_project();
        init_gavel_project(&dir);
        fs::write(
            dir.path().join(".gavel/gavel.toml"),
            "[history]\ncapacity = 0\nkey = \"shared\"\n\n[ui]\nposition_key = \"shared\"\n",
        )
        .unwrap();

        gavel()
            .current_dir(dir.path())
            .args(["config", "validate"])
            .assert()
            .success()
            .stdout(predicate::str::contains("Warnings:"))
            .stdout(predicate::str::contains("overwrite each other"));
    }
}
