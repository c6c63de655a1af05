//! Reader for a PBIR `definition/pages` folder.
//!
//! Layout: `pages/<page>/page.json` and `pages/<page>/visuals/<v>/visual.json`.
//! Each visual yields its actions, bound columns and visual-level filters.

use serde_json::Value;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use regex::Regex;
use tracing::{debug, warn};

use super::project::{read_json, sorted_subdirs};
use super::{PageSource, RawAction, RawPageEntry, RawPageVisualEntry, Rejected};
use crate::config::ScanConfig;
use crate::value::{
    as_items, dedupe_preserve_order, eq_loose, get_any, get_any_truthy, get_ci, get_path,
    is_truthy, literal_or_string, non_empty_text, norm_text, objects, scalar_text,
};
use crate::{Error, Result};

/// Property names made only of digits are sort hints, not columns.
///
/// SAFETY: Pattern is a compile-time constant that is known to be valid.
#[allow(clippy::unwrap_used)]
static NUMERIC_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^\d+$").unwrap());

/// Single-letter tokens are alias placeholders, never filter values.
///
/// SAFETY: Pattern is a compile-time constant that is known to be valid.
#[allow(clippy::unwrap_used)]
static PLACEHOLDER_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^[A-Za-z]$").unwrap());

/// Pages read from a definition folder.
#[derive(Debug)]
pub struct PageFolder {
    root: PathBuf,
    scan: ScanConfig,
    rejected: Vec<Rejected>,
}

impl PageFolder {
    /// Reader for the folder at `root`.
    pub fn new(root: &Path, scan: ScanConfig) -> Self {
        Self {
            root: root.to_path_buf(),
            scan,
            rejected: Vec::new(),
        }
    }

    fn reject(&mut self, path: &Path, reason: String) {
        warn!("skipping {}: {reason}", path.display());
        self.rejected.push(Rejected {
            location: path.display().to_string(),
            reason,
        });
    }

    fn load_visuals(&mut self, page_dir: &Path) -> Result<Vec<RawPageVisualEntry>> {
        let visuals_dir = page_dir.join("visuals");
        if !visuals_dir.is_dir() {
            return Ok(Vec::new());
        }
        let mut visuals = Vec::new();
        for visual_dir in sorted_subdirs(&visuals_dir, &self.scan)? {
            let path = visual_dir.join("visual.json");
            if !path.is_file() {
                continue;
            }
            match read_json(&path, &self.scan) {
                Ok(doc) => visuals.push(parse_visual(&doc)),
                Err(reason) => self.reject(&path, reason),
            }
        }
        Ok(visuals)
    }
}

impl PageSource for PageFolder {
    fn load(&mut self) -> Result<Vec<RawPageEntry>> {
        if !self.root.is_dir() {
            return Err(Error::SourceUnavailable {
                source_name: "pages".to_string(),
                reason: format!("{} is not a directory", self.root.display()),
            });
        }

        let mut pages = Vec::new();
        for page_dir in sorted_subdirs(&self.root, &self.scan)? {
            let path = page_dir.join("page.json");
            if !path.is_file() {
                continue;
            }
            let doc = match read_json(&path, &self.scan) {
                Ok(doc) => doc,
                Err(reason) => {
                    self.reject(&path, reason);
                    continue;
                },
            };
            let mut page = parse_page(&doc);
            page.visuals = self.load_visuals(&page_dir)?;
            debug!(
                page = page.id.as_deref().unwrap_or("-"),
                visuals = page.visuals.len(),
                "read page"
            );
            pages.push(page);
        }
        Ok(pages)
    }

    fn rejected(&mut self) -> Vec<Rejected> {
        std::mem::take(&mut self.rejected)
    }
}

/// Page identity from `page.json`; visuals are filled in by the caller.
pub fn parse_page(doc: &Value) -> RawPageEntry {
    RawPageEntry {
        id: get_any(doc, &["name"]).and_then(non_empty_text),
        display_name: get_any(doc, &["displayName"]).and_then(scalar_text),
        visuals: Vec::new(),
    }
}

/// Everything extracted from one `visual.json`.
pub fn parse_visual(doc: &Value) -> RawPageVisualEntry {
    let aliases = alias_map(doc);
    let visual_type = get_path(doc, &["visual", "visualType"]).and_then(non_empty_text);
    RawPageVisualEntry {
        id: get_any(doc, &["name"]).and_then(non_empty_text),
        actions: visual_actions(doc, visual_type.as_deref()),
        columns: visual_columns(doc, &aliases),
        filters: visual_filters(doc, &aliases),
        visual_type,
    }
}

// Actions

fn visual_actions(doc: &Value, visual_type: Option<&str>) -> Vec<RawAction> {
    let mut actions = Vec::new();
    if let Some(target) = legacy_bookmark(doc) {
        actions.push(RawAction::new("Bookmark", Some(target)));
    }
    if let Some(target) = legacy_tooltip(doc) {
        actions.push(RawAction::new("Tooltip", Some(target)));
    }
    if visual_type.is_some_and(|t| eq_loose(t, "actionButton")) {
        actions.extend(link_actions(doc));
    }

    let mut seen = std::collections::HashSet::new();
    actions.retain(|action| seen.insert((action.kind.clone(), action.target.clone())));
    actions
}

/// First `bookmark.expr.Literal.Value` anywhere in the document.
fn legacy_bookmark(doc: &Value) -> Option<String> {
    objects(doc).into_iter().find_map(|obj| {
        get_ci(obj, "bookmark")
            .and_then(|b| get_path(b, &["expr", "Literal", "Value"]))
            .and_then(non_empty_text)
            .map(|v| v.trim_matches('\'').to_string())
    })
}

/// First tooltip page under a `visualTooltip` or `tooltip` key.
fn legacy_tooltip(doc: &Value) -> Option<String> {
    objects(doc).into_iter().find_map(|obj| {
        ["visualTooltip", "tooltip"]
            .into_iter()
            .filter_map(|key| get_ci(obj, key))
            .find_map(tooltip_value)
    })
}

fn tooltip_value(node: &Value) -> Option<String> {
    let found = match node {
        Value::Array(items) => items.iter().find_map(|item| {
            get_path(item, &["properties", "section", "expr", "Literal", "Value"])
                .or_else(|| get_path(item, &["properties", "section", "value"]))
                .filter(|v| is_truthy(v))
                .and_then(scalar_text)
                .or_else(|| item.as_str().filter(|s| !s.is_empty()).map(str::to_string))
        }),
        Value::Object(_) => get_path(node, &["expr", "Literal", "Value"])
            .filter(|v| is_truthy(v))
            .or_else(|| get_any_truthy(node, &["value"]))
            .and_then(scalar_text),
        _ => None,
    };
    found.map(|v| v.trim_matches('\'').to_string())
}

/// `visualLink` entries of an action button.
fn link_actions(doc: &Value) -> Vec<RawAction> {
    let mut actions = Vec::new();
    for node in objects(doc) {
        let Some(link) = get_any_truthy(node, &["visualLink"]) else {
            continue;
        };
        for item in as_items(link).into_iter().filter(|item| item.is_object()) {
            let props = get_any_truthy(item, &["properties"]).unwrap_or(item);
            let kind = get_any(props, &["type"])
                .and_then(literal_or_string)
                .map(|t| norm_text(&t))
                .unwrap_or_default();

            if let Some(text) = get_any(props, &["tooltip"])
                .and_then(literal_or_string)
                .filter(|t| !t.is_empty())
            {
                actions.push(RawAction::new("Tooltip", Some(text)));
            }

            let target_of = |key: &str| {
                get_any(props, &[key])
                    .and_then(literal_or_string)
                    .filter(|t| !t.is_empty())
            };
            match kind.as_str() {
                "pagenavigation" => {
                    actions.push(RawAction::new("PageNavigation", target_of("navigationSection")));
                },
                "bookmark" => actions.push(RawAction::new("Bookmark", target_of("bookmark"))),
                _ => {},
            }
        }
    }
    actions
}

// Columns

fn entity_with_spaces(entity: &str) -> String {
    if entity.contains('.') && !entity.contains(' ') {
        entity
            .split('.')
            .filter(|part| !part.is_empty())
            .collect::<Vec<_>>()
            .join(" ")
    } else {
        entity.to_string()
    }
}

/// Alias → table name from every `From` block.
fn alias_map(doc: &Value) -> HashMap<String, String> {
    let mut aliases = HashMap::new();
    for node in objects(doc) {
        let Some(from) = get_any(node, &["From"]) else {
            continue;
        };
        for item in as_items(from) {
            let name = get_any(item, &["Name"]).and_then(non_empty_text);
            let entity = get_any(item, &["Entity"]).and_then(non_empty_text);
            if let (Some(name), Some(entity)) = (name, entity) {
                aliases.insert(name, entity_with_spaces(&entity));
            }
        }
    }
    aliases
}

fn unwrap_field(field: &Value) -> &Value {
    ["Column", "Measure", "Aggregation", "Field"]
        .into_iter()
        .find_map(|wrapper| get_any(field, &[wrapper]).filter(|inner| inner.is_object()))
        .unwrap_or(field)
}

/// `Table Name.Column` for a field-like object.
fn table_column(field: &Value, aliases: &HashMap<String, String>) -> Option<String> {
    let field = unwrap_field(field);
    let source_ref = get_any(field, &["Expression"]).and_then(|e| get_any(e, &["SourceRef"]));

    let entity = source_ref
        .and_then(|src| get_any(src, &["Entity"]))
        .and_then(non_empty_text)
        .or_else(|| {
            source_ref
                .and_then(|src| get_any(src, &["Source"]))
                .and_then(scalar_text)
                .and_then(|alias| aliases.get(&alias).cloned())
        })
        .or_else(|| get_any(field, &["Entity"]).and_then(non_empty_text));

    let property = get_any(field, &["Property"]).and_then(non_empty_text)?;
    if NUMERIC_RE.is_match(&property) {
        return None;
    }
    Some(match entity {
        Some(entity) => format!("{}.{property}", entity_with_spaces(&entity)),
        None => property,
    })
}

fn visual_columns(doc: &Value, aliases: &HashMap<String, String>) -> Vec<String> {
    let mut columns = Vec::new();
    for node in objects(doc) {
        for key in ["field", "Aggregation"] {
            if let Some(sub) = get_any(node, &[key]).filter(|v| v.is_object()) {
                columns.extend(table_column(sub, aliases));
            }
        }
        if let Some(fields) = get_any(node, &["fields"]).and_then(Value::as_array) {
            columns.extend(
                fields
                    .iter()
                    .filter(|f| f.is_object())
                    .filter_map(|f| table_column(f, aliases)),
            );
        }

        let source_ref = get_any(node, &["Expression"]).and_then(|e| get_any(e, &["SourceRef"]));
        let has_entity = source_ref.is_some_and(|src| get_any(src, &["Entity", "Source"]).is_some())
            || get_any(node, &["Entity"]).is_some();
        if has_entity && get_any(node, &["Property"]).is_some() {
            columns.extend(table_column(node, aliases));
        }
    }
    dedupe_preserve_order(columns)
}

// Filters

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Operator {
    In,
    Equals,
    Between,
    NotIn,
    NotBetween,
}

impl Operator {
    const fn as_str(self) -> &'static str {
        match self {
            Self::In => "IN",
            Self::Equals => "=",
            Self::Between => "BETWEEN",
            Self::NotIn => "NOT IN",
            Self::NotBetween => "NOT BETWEEN",
        }
    }

    const fn negate(self) -> Self {
        match self {
            Self::In | Self::Equals | Self::NotIn => Self::NotIn,
            Self::Between | Self::NotBetween => Self::NotBetween,
        }
    }

    const fn is_range(self) -> bool {
        matches!(self, Self::Between | Self::NotBetween)
    }
}

/// Every distinct scalar below `node`, in document order.
fn literals(node: &Value) -> Vec<String> {
    fn visit(node: &Value, out: &mut Vec<String>) {
        match node {
            Value::Object(map) => map.values().for_each(|v| visit(v, out)),
            Value::Array(items) => items.iter().for_each(|v| visit(v, out)),
            Value::String(s) => out.push(s.clone()),
            Value::Number(n) => out.push(n.to_string()),
            Value::Bool(_) | Value::Null => {},
        }
    }
    let mut out = Vec::new();
    visit(node, &mut out);
    dedupe_preserve_order(out)
}

fn operator_and_values(cond: &Value) -> Option<(Operator, Vec<String>)> {
    let direct = [
        ("In", Operator::In),
        ("Equals", Operator::Equals),
        ("Between", Operator::Between),
        ("NotIn", Operator::NotIn),
    ];
    for (key, op) in direct {
        if let Some(node) = get_any(cond, &[key]) {
            let values = get_any_truthy(node, &["Values"]).unwrap_or(node);
            return Some((op, literals(values)));
        }
    }

    if let Some(not) = get_any(cond, &["Not"]).filter(|v| v.is_object()) {
        let inner = get_any_truthy(not, &["Expression"]).unwrap_or(not);
        if let Some((op, values)) = operator_and_values(inner) {
            return Some((op.negate(), values));
        }
    }

    get_any(cond, &["Expression"])
        .filter(|v| v.is_object())
        .and_then(operator_and_values)
}

fn is_valid_filter_value(raw: &str) -> bool {
    let trimmed = raw.trim();
    let bare = trimmed.trim_matches('\'').trim_matches('"');
    if norm_text(bare) == "null" {
        return false;
    }
    let unquoted = if trimmed.len() >= 2
        && ((trimmed.starts_with('\'') && trimmed.ends_with('\''))
            || (trimmed.starts_with('"') && trimmed.ends_with('"')))
    {
        &trimmed[1..trimmed.len() - 1]
    } else {
        trimmed
    };
    !PLACEHOLDER_RE.is_match(unquoted)
}

/// Single-quote a value, doubling embedded quotes.
fn quote_value(raw: &str) -> String {
    let inner = if raw.len() >= 2 && raw.starts_with('\'') && raw.ends_with('\'') {
        &raw[1..raw.len() - 1]
    } else {
        raw
    };
    format!("'{}'", inner.replace('\'', "''"))
}

fn column_in_condition(cond: &Value, aliases: &HashMap<String, String>) -> Option<String> {
    objects(cond).into_iter().find_map(|node| {
        get_any(node, &["Column"])
            .filter(|col| col.is_object())
            .and_then(|col| table_column(col, aliases))
    })
}

fn predicates_from(
    filter_like: &Value,
    hint: Option<&str>,
    aliases: &HashMap<String, String>,
    out: &mut Vec<String>,
) {
    let Some(wheres) = get_any(filter_like, &["Where"]).filter(|w| w.is_array() || w.is_object()) else {
        return;
    };
    for item in as_items(wheres) {
        let Some(cond) = get_any(item, &["Condition"]).filter(|c| c.is_object()) else {
            continue;
        };
        let Some(column) = hint
            .map(str::to_string)
            .or_else(|| column_in_condition(cond, aliases))
        else {
            continue;
        };
        let Some((op, values)) = operator_and_values(cond) else {
            continue;
        };
        let values: Vec<String> = values
            .iter()
            .filter(|v| is_valid_filter_value(v))
            .map(|v| quote_value(v))
            .collect();
        if values.is_empty() && !op.is_range() {
            continue;
        }

        let predicate = match (op, values.as_slice()) {
            (Operator::Equals | Operator::In, [single]) => format!("{column} = {single}"),
            (Operator::Between | Operator::NotBetween, [low, high, ..]) => {
                format!("{column} {} {low} AND {high}", op.as_str())
            },
            (_, many) => format!("{column} {} [{}]", op.as_str(), many.join(",")),
        };
        out.push(predicate);
    }
}

fn visual_filters(doc: &Value, aliases: &HashMap<String, String>) -> Vec<String> {
    let mut predicates = Vec::new();

    for node in objects(doc) {
        let Some(filters) = get_any(node, &["filters"]).and_then(Value::as_array) else {
            continue;
        };
        for filter in filters.iter().filter(|f| f.is_object()) {
            let field = get_any_truthy(filter, &["field"]).unwrap_or(filter);
            let hint = table_column(field, aliases);
            let container = get_any_truthy(filter, &["filter"]).unwrap_or(filter);
            predicates_from(container, hint.as_deref(), aliases, &mut predicates);
        }
    }

    for node in objects(doc) {
        let Some(filter_like) = get_any(node, &["filter"]).filter(|v| v.is_object()) else {
            continue;
        };
        let hint = get_any(node, &["field"])
            .filter(|v| v.is_object())
            .and_then(|field| table_column(field, aliases));
        predicates_from(filter_like, hint.as_deref(), aliases, &mut predicates);
    }

    dedupe_preserve_order(predicates)
}
