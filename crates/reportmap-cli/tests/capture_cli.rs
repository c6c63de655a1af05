#![allow(missing_docs, clippy::unwrap_used)]

mod common;

use common::{reportmap_cmd, write_capture, write_project};
use predicates::prelude::*;
use serde_json::Value;
use tempfile::tempdir;

#[test]
fn capture_script_lists_project_pages() {
    let dir = tempdir().unwrap();
    let project = write_project(dir.path());

    reportmap_cmd()
        .args(["capture", "script", "--page", "Extra", "--project"])
        .arg(&project)
        .assert()
        .success()
        .stdout(predicate::str::contains("\"Extra\","))
        .stdout(predicate::str::contains("\"P1\","))
        .stdout(predicate::str::contains("\"P2\","))
        .stdout(predicate::str::contains("getVisuals"));
}

#[test]
fn capture_script_needs_pages() {
    reportmap_cmd()
        .args(["capture", "script"])
        .assert()
        .code(2);
}

#[test]
fn capture_inspect_counts_visuals() {
    let dir = tempdir().unwrap();
    let log = write_capture(dir.path());

    let output = reportmap_cmd()
        .args(["capture", "inspect", "--format", "json"])
        .arg(&log)
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();
    let doc: Value = serde_json::from_slice(&output).unwrap();
    assert_eq!(doc["stats"]["visuals"], 2);
    assert_eq!(doc["stats"]["noise_lines"], 1);
    assert_eq!(doc["pages"]["P2"], 1);
}

#[test]
fn capture_inspect_missing_log() {
    let dir = tempdir().unwrap();
    reportmap_cmd()
        .args(["capture", "inspect"])
        .arg(dir.path().join("missing.log"))
        .assert()
        .code(3);
}

#[test]
fn config_init_and_show() {
    let dir = tempdir().unwrap();
    let config = dir.path().join("nested/config.toml");

    reportmap_cmd()
        .args(["config", "init", "--config"])
        .arg(&config)
        .assert()
        .success();
    assert!(config.is_file());

    reportmap_cmd()
        .args(["config", "init", "--config"])
        .arg(&config)
        .assert()
        .code(2);

    reportmap_cmd()
        .args(["config", "show", "--config"])
        .arg(&config)
        .assert()
        .success()
        .stdout(predicate::str::contains("unresolved_marker = \"N/A\""));
}
