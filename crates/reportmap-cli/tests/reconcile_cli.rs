#![allow(missing_docs, clippy::unwrap_used)]

mod common;

use common::{reportmap_cmd, write_capture, write_project};
use predicates::prelude::*;
use serde_json::Value;
use tempfile::tempdir;

fn reconcile_json(args: &[&str]) -> Value {
    let output = reportmap_cmd()
        .arg("reconcile")
        .args(args)
        .args(["--format", "json"])
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();
    serde_json::from_slice(&output).unwrap()
}

fn sheet<'a>(doc: &'a Value, name: &str) -> &'a Value {
    doc["sheets"]
        .as_array()
        .unwrap()
        .iter()
        .find(|s| s["name"] == name)
        .unwrap()
}

fn cell<'a>(sheet: &'a Value, row: usize, header: &str) -> &'a Value {
    let col = sheet["headers"]
        .as_array()
        .unwrap()
        .iter()
        .position(|h| h == header)
        .unwrap();
    &sheet["rows"][row][col]
}

#[test]
fn reconcile_project_propagates_through_visuals() {
    let dir = tempdir().unwrap();
    let project = write_project(dir.path());
    let capture = write_capture(dir.path());

    let doc = reconcile_json(&[
        "--project",
        project.to_str().unwrap(),
        "--capture",
        capture.to_str().unwrap(),
    ]);

    let bookmarks = sheet(&doc, "Bookmarks");
    assert_eq!(cell(bookmarks, 0, "Bookmark ID"), "B1");
    assert_eq!(cell(bookmarks, 0, "Visual Title"), "Sales Trend");
    assert_eq!(cell(bookmarks, 0, "Page Name"), "Overview");
    assert_eq!(cell(bookmarks, 0, "Orphaned"), "No");

    assert_eq!(cell(bookmarks, 1, "Bookmark ID"), "B2");
    assert_eq!(cell(bookmarks, 1, "Visual Title"), "N/A");
    assert_eq!(cell(bookmarks, 1, "Page Name"), "N/A");
    assert_eq!(cell(bookmarks, 1, "Orphaned"), "Yes");

    let pages = sheet(&doc, "Pages");
    assert_eq!(cell(pages, 0, "Action Name"), "Page Navigation: Overview");
    assert_eq!(cell(pages, 1, "Visual Title"), "Sales Trend");

    let visuals = sheet(&doc, "Visuals");
    assert_eq!(cell(visuals, 0, "Page Name"), "Overview");
    assert_eq!(cell(visuals, 0, "Width"), 300.0);

    assert_eq!(doc["orphanedBookmarks"], 1);
}

#[test]
fn reconcile_without_capture_reports_unavailable_visuals() {
    let dir = tempdir().unwrap();
    let project = write_project(dir.path());

    let doc = reconcile_json(&["--project", project.to_str().unwrap(), "--marker", "?"]);

    assert_eq!(doc["diagnostics"]["unavailable_sources"][0], "visuals");
    let bookmarks = sheet(&doc, "Bookmarks");
    assert_eq!(cell(bookmarks, 0, "Page Name"), "?");
}

#[test]
fn reconcile_writes_xlsx() {
    let dir = tempdir().unwrap();
    let project = write_project(dir.path());
    let capture = write_capture(dir.path());
    let out = dir.path().join("report.xlsx");

    reportmap_cmd()
        .args(["reconcile", "--project"])
        .arg(&project)
        .arg("--capture")
        .arg(&capture)
        .arg("--output")
        .arg(&out)
        .assert()
        .success()
        .stdout(predicate::str::contains("Wrote"));

    let bytes = std::fs::read(&out).unwrap();
    // xlsx files are zip archives
    assert_eq!(&bytes[..2], b"PK");
}

#[test]
fn reconcile_xlsx_is_byte_identical_across_runs() {
    let dir = tempdir().unwrap();
    let project = write_project(dir.path());
    let capture = write_capture(dir.path());
    let first = dir.path().join("first.xlsx");
    let second = dir.path().join("second.xlsx");

    for (i, out) in [&first, &second].into_iter().enumerate() {
        if i > 0 {
            // Cross a second boundary so a wall-clock timestamp would differ.
            std::thread::sleep(std::time::Duration::from_millis(1100));
        }
        reportmap_cmd()
            .args(["reconcile", "--project"])
            .arg(&project)
            .arg("--capture")
            .arg(&capture)
            .arg("--output")
            .arg(out)
            .assert()
            .success();
    }

    assert_eq!(std::fs::read(&first).unwrap(), std::fs::read(&second).unwrap());
}

#[test]
fn reconcile_text_summary_is_default() {
    let dir = tempdir().unwrap();
    let project = write_project(dir.path());

    reportmap_cmd()
        .args(["reconcile", "--project"])
        .arg(&project)
        .assert()
        .success()
        .stdout(predicate::str::contains("Bookmarks"))
        .stdout(predicate::str::contains("visuals unavailable"));
}

#[test]
fn reconcile_requires_some_input() {
    reportmap_cmd()
        .arg("reconcile")
        .assert()
        .code(2)
        .stderr(predicate::str::contains("missing required input"));
}

#[test]
fn reconcile_xlsx_needs_output_path() {
    let dir = tempdir().unwrap();
    let project = write_project(dir.path());
    reportmap_cmd()
        .args(["reconcile", "--format", "xlsx", "--project"])
        .arg(&project)
        .assert()
        .code(2);
}

#[test]
fn reconcile_missing_project_is_not_found() {
    let dir = tempdir().unwrap();
    reportmap_cmd()
        .args(["reconcile", "--project"])
        .arg(dir.path().join("nope"))
        .assert()
        .code(3);
}

#[test]
fn reconcile_with_no_usable_input_exits_4() {
    let dir = tempdir().unwrap();
    // An existing folder with no definition content: every source is unavailable.
    reportmap_cmd()
        .args(["reconcile", "--project"])
        .arg(dir.path())
        .assert()
        .code(4)
        .stderr(predicate::str::contains("No usable input"));
}

#[test]
fn reconcile_strict_fails_on_warnings() {
    let dir = tempdir().unwrap();
    let project = write_project(dir.path());
    let capture = write_capture(dir.path());

    reportmap_cmd()
        .args(["reconcile", "--strict", "--format", "json", "--project"])
        .arg(&project)
        .arg("--capture")
        .arg(&capture)
        .assert()
        .success();

    std::fs::write(
        project.join("definition/bookmarks/broken.bookmark.json"),
        "{ not json",
    )
    .unwrap();

    reportmap_cmd()
        .args(["reconcile", "--strict", "--format", "json", "--project"])
        .arg(&project)
        .arg("--capture")
        .arg(&capture)
        .assert()
        .code(6)
        .stderr(predicate::str::contains("--strict"));

    reportmap_cmd()
        .args(["reconcile", "--format", "json", "--project"])
        .arg(&project)
        .arg("--capture")
        .arg(&capture)
        .assert()
        .success();
}

#[test]
fn config_file_sets_marker() {
    let dir = tempdir().unwrap();
    let project = write_project(dir.path());
    let config = dir.path().join("reportmap.toml");
    std::fs::write(&config, "[export]\nunresolved_marker = \"(missing)\"\ninclude_diagnostics = false\n").unwrap();

    let doc = reconcile_json(&[
        "--config",
        config.to_str().unwrap(),
        "--project",
        project.to_str().unwrap(),
    ]);
    let bookmarks = sheet(&doc, "Bookmarks");
    assert_eq!(cell(bookmarks, 1, "Page Name"), "(missing)");
    assert_eq!(doc["sheets"].as_array().unwrap().len(), 3);
}
