#![allow(clippy::expect_used, clippy::unwrap_used)]

use assert_cmd::Command;
use serde_json::{Value, json};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;
use std::time::Duration;
use tempfile::TempDir;

#[allow(dead_code)]
pub const CMD_TIMEOUT: Duration = Duration::from_secs(15);

fn home_dir() -> &'static Path {
    static HOME_DIR: OnceLock<TempDir> = OnceLock::new();
    HOME_DIR
        .get_or_init(|| tempfile::tempdir().expect("failed to create home dir for tests"))
        .path()
}

/// Create a configured `reportmap` command suitable for integration tests.
/// The platform config directory points into a scratch home so a developer's
/// own config never leaks into a test.
#[allow(dead_code)]
pub fn reportmap_cmd() -> Command {
    let mut cmd = Command::new(assert_cmd::cargo::cargo_bin!("reportmap"));
    cmd.timeout(CMD_TIMEOUT);
    let home = home_dir();
    cmd.env("HOME", home);
    cmd.env("XDG_CONFIG_HOME", home.join(".config"));
    cmd.env("APPDATA", home.join("AppData"));
    cmd.env_remove("REPORTMAP_CONFIG");
    cmd.env_remove("REPORTMAP_UNRESOLVED_MARKER");
    cmd.env("NO_COLOR", "1");
    cmd
}

fn write_json(path: &Path, value: &Value) {
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, serde_json::to_string_pretty(value).unwrap()).unwrap();
}

/// Write a small PBIR report under `root` and return the `*.Report` folder.
///
/// - page `P1` "Landing" with an action button navigating to `P2`
/// - page `P2` "Overview" with line chart `V9`
/// - bookmark `B1` "Focus" on `V9`, bookmark `B2` "Reset" with no visual
#[allow(dead_code)]
pub fn write_project(root: &Path) -> PathBuf {
    let report = root.join("Sales.Report");
    let definition = report.join("definition");

    write_json(
        &definition.join("pages/P1/page.json"),
        &json!({"name": "P1", "displayName": "Landing"}),
    );
    write_json(
        &definition.join("pages/P1/visuals/BTN/visual.json"),
        &json!({
            "name": "BTN",
            "visual": {
                "visualType": "actionButton",
                "visualContainerObjects": {
                    "visualLink": [{"properties": {
                        "type": {"expr": {"Literal": {"Value": "'PageNavigation'"}}},
                        "navigationSection": {"expr": {"Literal": {"Value": "'P2'"}}}
                    }}]
                }
            }
        }),
    );
    write_json(
        &definition.join("pages/P2/page.json"),
        &json!({"name": "P2", "displayName": "Overview"}),
    );
    write_json(
        &definition.join("pages/P2/visuals/V9/visual.json"),
        &json!({"name": "V9", "visual": {"visualType": "lineChart"}}),
    );

    write_json(
        &definition.join("bookmarks/B1.bookmark.json"),
        &json!({
            "name": "B1",
            "displayName": "Focus",
            "options": {"targetVisualNames": ["V9"]},
            "explorationState": {
                "activeSection": "P2",
                "sections": {"P2": {"visualContainers": {
                    "V9": {"singleVisual": {"visualType": "lineChart"}}
                }}}
            }
        }),
    );
    write_json(
        &definition.join("bookmarks/B2.bookmark.json"),
        &json!({
            "name": "B2",
            "displayName": "Reset",
            "explorationState": {"activeSection": "P1", "sections": {}}
        }),
    );

    report
}

/// Console output from the capture script for the fixture project.
#[allow(dead_code)]
pub fn write_capture(root: &Path) -> PathBuf {
    let path = root.join("console.log");
    let log = concat!(
        "VM12:3 report loaded\n",
        r#"VM12:20 {"pageId":"P2","visuals":[{"pageId":"P2","name":"V9","type":"lineChart","title":"Sales Trend","layout":{"x":10,"y":20,"width":300,"height":200}}]}"#,
        "\n",
        r#"{"pageId":"P1","visuals":[{"pageId":"P1","name":"BTN","type":"actionButton"}]}"#,
        "\n",
    );
    fs::write(&path, log).unwrap();
    path
}
