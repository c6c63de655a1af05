//! Reader for a PBIR `definition/bookmarks` folder.
//!
//! Each `*.bookmark.json` document becomes one raw entry per visual container
//! captured on the bookmark's active page. Filters are summarised as readable
//! predicates and slicer states as selections.

use serde_json::Value;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

use super::project::{collect_files, is_json_file, read_json};
use super::{BookmarkSource, RawBookmarkEntry, Rejected};
use crate::config::ScanConfig;
use crate::types::SlicerSelection;
use crate::value::{
    as_items, eq_loose, find_leaf, get_any, get_ci, get_path, leaves, literal_or_string,
    non_empty_text, objects, scalar_text,
};
use crate::{Error, Result};

/// Bookmarks read from a definition folder.
#[derive(Debug)]
pub struct BookmarkFolder {
    root: PathBuf,
    scan: ScanConfig,
    rejected: Vec<Rejected>,
}

impl BookmarkFolder {
    /// Reader for the folder at `root`.
    pub fn new(root: &Path, scan: ScanConfig) -> Self {
        Self {
            root: root.to_path_buf(),
            scan,
            rejected: Vec::new(),
        }
    }
}

impl BookmarkSource for BookmarkFolder {
    fn load(&mut self) -> Result<Vec<RawBookmarkEntry>> {
        if !self.root.is_dir() {
            return Err(Error::SourceUnavailable {
                source_name: "bookmarks".to_string(),
                reason: format!("{} is not a directory", self.root.display()),
            });
        }

        let files = collect_files(&self.root, &self.scan, is_json_file)?;
        debug!("reading {} bookmark files under {}", files.len(), self.root.display());

        let mut entries = Vec::new();
        for path in files {
            let doc = match read_json(&path, &self.scan) {
                Ok(doc) => doc,
                Err(reason) => {
                    warn!("skipping {}: {reason}", path.display());
                    self.rejected.push(Rejected {
                        location: path.display().to_string(),
                        reason,
                    });
                    continue;
                },
            };
            if !is_bookmark_document(&doc) {
                debug!("{} is not a bookmark document", path.display());
                continue;
            }
            let file_name = path
                .file_name()
                .map(|name| name.to_string_lossy().into_owned())
                .unwrap_or_default();
            entries.extend(parse_bookmark(&doc, &file_name));
        }
        Ok(entries)
    }

    fn rejected(&mut self) -> Vec<Rejected> {
        std::mem::take(&mut self.rejected)
    }
}

/// The folder also holds `bookmarks.json`, which only lists ordering and groups.
fn is_bookmark_document(doc: &Value) -> bool {
    get_ci(doc, "explorationState").is_some() || get_ci(doc, "displayName").is_some()
}

/// Bookmark id from its file name: `abc.bookmark.json` → `abc`.
pub fn bookmark_id_from_file_name(file_name: &str) -> String {
    let once = Path::new(file_name)
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    Path::new(&once)
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or(once)
}

/// Raw entries for one bookmark document.
pub fn parse_bookmark(doc: &Value, file_name: &str) -> Vec<RawBookmarkEntry> {
    let from_file = bookmark_id_from_file_name(file_name);
    let bookmark_id = if from_file.trim().is_empty() {
        get_ci(doc, "name").and_then(non_empty_text)
    } else {
        Some(from_file)
    };
    let name = get_ci(doc, "displayName").and_then(scalar_text);

    let exploration = get_ci(doc, "explorationState");
    let targets = target_visual_names(doc);
    let mode = bookmark_mode(doc);
    let page_id = exploration
        .and_then(|state| get_ci(state, "activeSection"))
        .and_then(non_empty_text);

    let containers = exploration
        .zip(page_id.as_deref())
        .and_then(|(state, active)| {
            get_ci(state, "sections")
                .and_then(|sections| get_ci(sections, active))
                .and_then(|section| get_ci(section, "visualContainers"))
        })
        .and_then(Value::as_object);

    let base = RawBookmarkEntry {
        bookmark_id,
        name,
        page_id,
        mode: Some(mode.to_string()),
        ..RawBookmarkEntry::default()
    };

    let Some(containers) = containers.filter(|map| !map.is_empty()) else {
        return vec![base];
    };

    containers
        .iter()
        .map(|(visual_id, container)| {
            let visual_type = container_visual_type(container);
            let is_slicer = visual_type.as_deref().is_some_and(|t| eq_loose(t, "slicer"));
            RawBookmarkEntry {
                visual_id: Some(visual_id.clone()),
                selected: Some(targets.contains(visual_id.as_str())),
                display_mode: display_mode(container),
                filters: applied_filters(container),
                slicer_selections: if is_slicer {
                    slicer_selections(container)
                } else {
                    Vec::new()
                },
                visual_type,
                ..base.clone()
            }
        })
        .collect()
}

fn target_visual_names(doc: &Value) -> HashSet<String> {
    let sources = [
        get_path(doc, &["options", "targetVisualNames"]),
        get_ci(doc, "targetVisualNames"),
        get_path(doc, &["explorationState", "options", "targetVisualNames"]),
    ];
    sources
        .into_iter()
        .flatten()
        .flat_map(as_items)
        .filter_map(scalar_text)
        .collect()
}

fn bookmark_mode(doc: &Value) -> &'static str {
    let flagged = |key: &str| get_ci(doc, key).and_then(Value::as_bool).unwrap_or(false);
    if flagged("personal") || flagged("isPersonal") {
        return "personal";
    }
    let only_targets = get_path(doc, &["options", "applyOnlyToTargetVisuals"])
        .or_else(|| get_path(doc, &["explorationState", "options", "applyOnlyToTargetVisuals"]))
        .and_then(Value::as_bool)
        .unwrap_or(false);
    if only_targets {
        "single-visual"
    } else {
        "all-visuals"
    }
}

fn container_visual_type(container: &Value) -> Option<String> {
    get_path(container, &["singleVisual", "visualType"])
        .or_else(|| get_any(container, &["visualType"]))
        .or_else(|| get_any(container, &["type"]))
        .and_then(non_empty_text)
}

fn display_mode(container: &Value) -> Option<String> {
    let direct = get_path(container, &["singleVisual", "objects", "display", "mode"])
        .or_else(|| get_path(container, &["singleVisual", "display", "mode"]))
        .and_then(literal_or_string);
    direct
        .or_else(|| find_leaf(container, &["mode"]).and_then(Value::as_str).map(str::to_string))
        .filter(|mode| !mode.is_empty())
}

/// `filters.byExpr` rendered as predicates, in source order.
fn applied_filters(container: &Value) -> Vec<String> {
    get_ci(container, "filters")
        .and_then(|filters| get_ci(filters, "byExpr"))
        .map(as_items)
        .unwrap_or_default()
        .into_iter()
        .filter(|filter| filter.is_object())
        .map(|filter| summarize_filter(filter).unwrap_or_else(|| filter.to_string()))
        .collect()
}

/// One `byExpr` filter as `Table.Column OP values`. `None` when neither a
/// column nor a value could be found.
pub fn summarize_filter(filter: &Value) -> Option<String> {
    let entity = find_leaf(filter, &["Entity", "Source", "Table"])
        .and_then(non_empty_text)
        .unwrap_or_default();
    let property = find_leaf(filter, &["Property", "Column", "Field"])
        .and_then(non_empty_text)
        .unwrap_or_default();
    let values = filter_values(filter);

    let lhs = match (entity.is_empty(), property.is_empty()) {
        (false, false) => format!("{entity}.{property}"),
        (false, true) => entity,
        (true, false) => property,
        (true, true) => String::new(),
    };
    if lhs.is_empty() && values.is_empty() {
        return None;
    }

    let condition = condition_text(filter);
    let negated = condition.contains("not") || has_segment(filter, &["not", "notin"]);
    let between = find_leaf(filter, &["mode"])
        .and_then(Value::as_str)
        .is_some_and(|mode| mode.eq_ignore_ascii_case("between"))
        || condition.contains(" between ");

    let rendered = match values.as_slice() {
        [low, high] if between => format!("{lhs} BETWEEN {low} AND {high}"),
        [single] if !condition.contains(" in ") => {
            format!("{lhs} {} {single}", if negated { "<>" } else { "=" })
        },
        [] => lhs,
        many => format!(
            "{lhs} {} [{}]",
            if negated { "NOT IN" } else { "IN" },
            many.join(",")
        ),
    };
    Some(rendered)
}

/// Lowercased text of the `Where` and `Condition` leaves, where authored
/// filters spell out their operator.
fn condition_text(filter: &Value) -> String {
    ["Where", "Condition"]
        .iter()
        .filter_map(|key| find_leaf(filter, &[key]).and_then(Value::as_str))
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

/// Literal values of a filter, quoted; `null` stays bare.
fn filter_values(filter: &Value) -> Vec<String> {
    let mut raw: Vec<&Value> = objects(filter)
        .into_iter()
        .find_map(|obj| get_any(obj, &["Values", "values"]))
        .map(flatten_literals)
        .unwrap_or_default();
    if raw.is_empty() {
        raw = leaves(filter)
            .into_iter()
            .filter(|(path, _)| {
                path.last().is_some_and(|last| last.eq_ignore_ascii_case("value"))
                    && path.iter().any(|seg| seg.eq_ignore_ascii_case("literal"))
            })
            .map(|(_, leaf)| leaf)
            .collect();
    }
    raw.into_iter()
        .map(|value| match scalar_text(value) {
            Some(text) if !text.eq_ignore_ascii_case("null") => {
                format!("'{}'", text.trim_matches('\''))
            },
            _ => "null".to_string(),
        })
        .collect()
}

fn flatten_literals(value: &Value) -> Vec<&Value> {
    match value {
        Value::Array(items) => items.iter().flat_map(flatten_literals).collect(),
        Value::Object(_) => get_path(value, &["Literal", "Value"])
            .or_else(|| get_ci(value, "Value").filter(|v| !v.is_object() && !v.is_array()))
            .into_iter()
            .collect(),
        other => vec![other],
    }
}

fn has_segment(filter: &Value, names: &[&str]) -> bool {
    objects(filter).into_iter().any(|obj| {
        obj.as_object()
            .is_some_and(|map| map.keys().any(|k| names.iter().any(|n| k.eq_ignore_ascii_case(n))))
    })
}

/// Selections held by a slicer container, from its merged `general.filter`.
pub fn slicer_selections(container: &Value) -> Vec<SlicerSelection> {
    let generals = get_path(container, &["singleVisual", "objects", "merge", "general"])
        .map(as_items)
        .unwrap_or_default();

    let mut selections = Vec::new();
    for general in generals {
        let Some(inner) = get_path(general, &["properties", "filter", "filter"]) else {
            continue;
        };
        let wheres = get_ci(inner, "Where").map(as_items).unwrap_or_default();
        for item in wheres {
            let Some(in_block) = get_path(item, &["Condition", "In"]) else {
                continue;
            };
            let property = get_ci(in_block, "Expressions")
                .map(as_items)
                .and_then(|exprs| exprs.first().copied())
                .and_then(|expr| get_path(expr, &["Column", "Property"]))
                .and_then(non_empty_text);
            let Some(property) = property else {
                continue;
            };
            let values = get_ci(in_block, "Values")
                .map(flatten_literals)
                .unwrap_or_default()
                .into_iter()
                .filter_map(scalar_text)
                .map(|v| v.trim_matches('\'').to_string())
                .collect();
            selections.push(SlicerSelection { property, values });
        }
    }
    selections
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::fs;
    use tempfile::TempDir;

    fn sample_bookmark() -> Value {
        json!({
            "displayName": "Q1 View",
            "name": "Bookmark1",
            "options": {"targetVisualNames": ["V1"], "applyOnlyToTargetVisuals": true},
            "explorationState": {
                "activeSection": "P1",
                "sections": {
                    "P1": {
                        "visualContainers": {
                            "V1": {
                                "singleVisual": {
                                    "visualType": "slicer",
                                    "objects": {
                                        "merge": {
                                            "general": [{
                                                "properties": {
                                                    "filter": {
                                                        "filter": {
                                                            "Where": [{
                                                                "Condition": {
                                                                    "In": {
                                                                        "Expressions": [{"Column": {"Property": "Region"}}],
                                                                        "Values": [
                                                                            [{"Literal": {"Value": "'West'"}}],
                                                                            [{"Literal": {"Value": "'East'"}}]
                                                                        ]
                                                                    }
                                                                }
                                                            }]
                                                        }
                                                    }
                                                }
                                            }]
                                        }
                                    }
                                }
                            },
                            "V2": {
                                "singleVisual": {
                                    "visualType": "lineChart",
                                    "display": {"mode": "hidden"}
                                },
                                "filters": {
                                    "byExpr": [{
                                        "expression": {"Column": {"Expression": {"SourceRef": {"Entity": "Sales"}}, "Property": "Year"}},
                                        "filter": {"Where": [{"Condition": {"In": {"Values": [[{"Literal": {"Value": "2023L"}}]]}}}]}
                                    }]
                                }
                            }
                        }
                    }
                }
            }
        })
    }

    #[test]
    fn test_bookmark_id_strips_two_extensions() {
        assert_eq!(bookmark_id_from_file_name("abc.bookmark.json"), "abc");
        assert_eq!(bookmark_id_from_file_name("plain.json"), "plain");
    }

    #[test]
    fn test_parse_bookmark_one_entry_per_container() {
        let entries = parse_bookmark(&sample_bookmark(), "B1.bookmark.json");
        assert_eq!(entries.len(), 2);

        let slicer = &entries[0];
        assert_eq!(slicer.bookmark_id.as_deref(), Some("B1"));
        assert_eq!(slicer.name.as_deref(), Some("Q1 View"));
        assert_eq!(slicer.page_id.as_deref(), Some("P1"));
        assert_eq!(slicer.visual_id.as_deref(), Some("V1"));
        assert_eq!(slicer.selected, Some(true));
        assert_eq!(slicer.mode.as_deref(), Some("single-visual"));
        assert_eq!(slicer.slicer_selections.len(), 1);
        assert_eq!(
            slicer.slicer_selections[0].to_string(),
            "Region IN ['West','East']"
        );

        let chart = &entries[1];
        assert_eq!(chart.visual_id.as_deref(), Some("V2"));
        assert_eq!(chart.selected, Some(false));
        assert_eq!(chart.display_mode.as_deref(), Some("hidden"));
        assert!(chart.slicer_selections.is_empty());
        assert_eq!(chart.filters, vec!["Sales.Year IN ['2023L']"]);
    }

    #[test]
    fn test_bookmark_without_containers_yields_single_entry() {
        let doc = json!({"displayName": "Empty", "explorationState": {"activeSection": "P9"}});
        let entries = parse_bookmark(&doc, "B2.bookmark.json");
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].visual_id, None);
        assert_eq!(entries[0].mode.as_deref(), Some("all-visuals"));
    }

    #[test]
    fn test_summarize_filter_operators() {
        let eq = json!({"Entity": "Sales", "Property": "Region", "Values": [{"Literal": {"Value": "'West'"}}]});
        assert_eq!(summarize_filter(&eq).as_deref(), Some("Sales.Region = 'West'"));

        let ne = json!({"Not": {"Entity": "Sales", "Property": "Region", "Values": ["West"]}});
        assert_eq!(summarize_filter(&ne).as_deref(), Some("Sales.Region <> 'West'"));

        let between = json!({"Property": "Year", "mode": "Between", "Values": [2020, 2023]});
        assert_eq!(
            summarize_filter(&between).as_deref(),
            Some("Year BETWEEN '2020' AND '2023'")
        );

        let not_in = json!({"NotIn": {"Property": "Year", "Values": [1, null]}});
        assert_eq!(summarize_filter(&not_in).as_deref(), Some("Year NOT IN ['1',null]"));

        assert_eq!(summarize_filter(&json!({"unrelated": true})), None);
    }

    #[test]
    fn test_single_value_in_renders_as_equality() {
        let structured = json!({
            "In": {"Expressions": [{"Entity": "Sales", "Property": "Region"}], "Values": [["'West'"]]}
        });
        assert_eq!(summarize_filter(&structured).as_deref(), Some("Sales.Region = 'West'"));

        let spelled = json!({
            "Where": "Sales.Region in ('West')",
            "Entity": "Sales",
            "Property": "Region",
            "Values": ["West"]
        });
        assert_eq!(summarize_filter(&spelled).as_deref(), Some("Sales.Region IN ['West']"));

        let several = json!({"In": {"Property": "Region", "Values": ["West", "East"]}});
        assert_eq!(summarize_filter(&several).as_deref(), Some("Region IN ['West','East']"));
    }

    #[test]
    fn test_folder_skips_index_and_rejects_broken_files() {
        let dir = TempDir::new().unwrap();
        fs::write(
            dir.path().join("B1.bookmark.json"),
            serde_json::to_string(&sample_bookmark()).unwrap(),
        )
        .unwrap();
        fs::write(dir.path().join("bookmarks.json"), r#"{"items":[{"name":"B1"}]}"#).unwrap();
        fs::write(dir.path().join("broken.bookmark.json"), "{not json").unwrap();

        let mut folder = BookmarkFolder::new(dir.path(), ScanConfig::default());
        let entries = folder.load().unwrap();
        assert_eq!(entries.len(), 2);
        let rejected = folder.rejected();
        assert_eq!(rejected.len(), 1);
        assert!(rejected[0].location.ends_with("broken.bookmark.json"));
        assert!(folder.rejected().is_empty());
    }

    #[test]
    fn test_missing_folder_is_unavailable() {
        let dir = TempDir::new().unwrap();
        let mut folder = BookmarkFolder::new(&dir.path().join("absent"), ScanConfig::default());
        assert_eq!(folder.load().unwrap_err().category(), "source_unavailable");
    }
}
