//! CLI integration tests for the `approvals` binary.
//!
//! Uses `assert_cmd` to spawn the binary and verify exit codes, stdout
//! content, and stderr content.

use std::fs;
use std::path::PathBuf;

use assert_cmd::cargo::cargo_bin_cmd;
use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

fn approvals() -> Command {
    let mut cmd = cargo_bin_cmd!("approvals");
    cmd.env_remove("RUST_LOG");
    cmd
}

fn demo_fixture() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("fixtures")
        .join("demo.json")
}

// ──────────────────────────────────────────────
// 1. Help and version
// ──────────────────────────────────────────────

#[test]
fn help_exits_0_with_description() {
    approvals()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("Approvals workflow API server"));
}

#[test]
fn version_exits_0() {
    approvals()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("approvals"));
}

#[test]
fn serve_help_lists_environment_variables() {
    approvals()
        .args(["serve", "--help"])
        .assert()
        .success()
        .stdout(predicate::str::contains("APPROVALS_FIXTURE"))
        .stdout(predicate::str::contains("APPROVALS_CACHE_TTL_SECS"));
}

// ──────────────────────────────────────────────
// 2. check-fixture
// ──────────────────────────────────────────────

#[test]
fn demo_fixture_is_clean() {
    approvals()
        .arg("check-fixture")
        .arg(demo_fixture())
        .assert()
        .success()
        .stdout(predicate::str::contains(
            "2 definitions, 2 processes, 5 people, 3 metadata nodes",
        ))
        .stdout(predicate::str::contains("problem").not());
}

#[test]
fn demo_fixture_summary_as_json() {
    let output = approvals()
        .args(["--output", "json", "check-fixture"])
        .arg(demo_fixture())
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();
    let summary: serde_json::Value = serde_json::from_slice(&output).unwrap();
    assert_eq!(summary["definitions"], 2);
    assert_eq!(summary["processes"], 2);
    assert_eq!(summary["nodes"], 3);
    assert_eq!(summary["problems"], serde_json::json!([]));
}

#[test]
fn fixture_problems_fail_the_check() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("broken.json");
    fs::write(
        &path,
        r#"{
            "definitions": [
                {"processDefinitionId": 1, "documentTypeName": "Travel Request"}
            ],
            "processes": [
                {"processId": 5, "processDefinitionId": 9,
                 "documentTypeName": "Timecard", "documentId": "TC-1",
                 "originatorHanfordId": "1000001", "beneficiaryHanfordId": "1000001",
                 "processState": "PENDING",
                 "createDateTime": "2024-03-01T08:00:00Z",
                 "lastChangeDateTime": "2024-03-01T08:00:00Z"}
            ]
        }"#,
    )
    .unwrap();

    approvals()
        .arg("check-fixture")
        .arg(&path)
        .assert()
        .failure()
        .stdout(predicate::str::contains(
            "process definition 1 has no activities",
        ))
        .stdout(predicate::str::contains(
            "process 5 references unknown process definition 9",
        ));
}

#[test]
fn malformed_fixture_reports_parse_error() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("bad.json");
    fs::write(&path, "{ not json").unwrap();

    approvals()
        .arg("check-fixture")
        .arg(&path)
        .assert()
        .failure()
        .stderr(predicate::str::contains("invalid fixture"));
}

#[test]
fn missing_fixture_reports_json_error() {
    approvals()
        .args(["--output", "json", "check-fixture", "/nonexistent/fixture.json"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("\"error\""))
        .stderr(predicate::str::contains("cannot read fixture"));
}

#[test]
fn quiet_suppresses_errors() {
    approvals()
        .args(["--quiet", "check-fixture", "/nonexistent/fixture.json"])
        .assert()
        .failure()
        .stderr(predicate::str::is_empty());
}
