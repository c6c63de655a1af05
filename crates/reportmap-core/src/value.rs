//! Case-insensitive navigation over loosely shaped JSON documents.
//!
//! Report definition files are written by several generations of tooling and
//! disagree on key casing (`Values` vs `values`) and nesting. Lookups here try
//! an exact key first and fall back to a case-insensitive match.

use regex::Regex;
use serde_json::Value;
use std::sync::LazyLock;

/// Runs of whitespace, underscores and hyphens.
///
/// SAFETY: Pattern is a compile-time constant that is known to be valid.
#[allow(clippy::unwrap_used)]
static SEPARATOR_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[\s_-]+").unwrap());

/// Normalize text for comparisons only: case-folded, with spaces, underscores
/// and hyphens removed. `Page Navigation`, `page_navigation` and
/// `page-navigation` all become `pagenavigation`.
pub fn norm_text(raw: &str) -> String {
    SEPARATOR_RE
        .replace_all(raw.trim(), "")
        .to_lowercase()
}

/// Loose equality using [`norm_text`].
pub fn eq_loose(a: &str, b: &str) -> bool {
    norm_text(a) == norm_text(b)
}

/// Look up `key` in an object: exact match first, then case-insensitive.
pub fn get_ci<'a>(value: &'a Value, key: &str) -> Option<&'a Value> {
    let map = value.as_object()?;
    if let Some(found) = map.get(key) {
        return Some(found);
    }
    map.iter()
        .find(|(k, _)| k.eq_ignore_ascii_case(key))
        .map(|(_, v)| v)
}

/// First present key among `keys`: every exact match is tried before any
/// case-insensitive one.
pub fn get_any<'a>(value: &'a Value, keys: &[&str]) -> Option<&'a Value> {
    let map = value.as_object()?;
    keys.iter().find_map(|k| map.get(*k)).or_else(|| {
        keys.iter().find_map(|wanted| {
            map.iter()
                .find(|(k, _)| k.eq_ignore_ascii_case(wanted))
                .map(|(_, v)| v)
        })
    })
}

/// Follow `path` one key at a time with [`get_ci`].
pub fn get_path<'a>(value: &'a Value, path: &[&str]) -> Option<&'a Value> {
    path.iter().try_fold(value, |current, key| get_ci(current, key))
}

/// Like [`get_any`] but treats `null`, `false`, `0`, empty strings, arrays
/// and objects as absent, the way the capture tooling treats them.
pub fn get_any_truthy<'a>(value: &'a Value, keys: &[&str]) -> Option<&'a Value> {
    get_any(value, keys).filter(|v| is_truthy(v))
}

/// JSON truthiness: `null`, `false`, `0`, `""`, `[]` and `{}` are falsy.
pub fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(a) => !a.is_empty(),
        Value::Object(o) => !o.is_empty(),
    }
}

/// Render a scalar as text. Containers and `null` yield `None`.
pub fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Null | Value::Array(_) | Value::Object(_) => None,
    }
}

/// Non-empty trimmed text of a scalar.
pub fn non_empty_text(value: &Value) -> Option<String> {
    scalar_text(value)
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

/// Concrete value from `{expr: {Literal: {Value}}}`, `{Literal: {Value}}`,
/// `{Value: scalar}` or a bare scalar, with quotes stripped.
pub fn literal_or_string(value: &Value) -> Option<String> {
    match value {
        Value::Object(_) => get_path(value, &["expr", "Literal", "Value"])
            .or_else(|| get_path(value, &["Literal", "Value"]))
            .and_then(scalar_text)
            .or_else(|| get_ci(value, "Value").and_then(scalar_text))
            .map(|s| s.trim_matches(|c| c == '\'' || c == '"').to_string()),
        Value::String(_) | Value::Number(_) => {
            scalar_text(value).map(|s| s.trim_matches(|c| c == '\'' || c == '"').to_string())
        },
        _ => None,
    }
}

/// Every object inside `value`, pre-order, document order.
pub fn objects(value: &Value) -> Vec<&Value> {
    fn visit<'a>(value: &'a Value, out: &mut Vec<&'a Value>) {
        match value {
            Value::Object(map) => {
                out.push(value);
                for child in map.values() {
                    visit(child, out);
                }
            },
            Value::Array(items) => {
                for child in items {
                    visit(child, out);
                }
            },
            _ => {},
        }
    }
    let mut out = Vec::new();
    visit(value, &mut out);
    out
}

/// Every scalar leaf inside `value` with the key path leading to it. Array
/// positions appear as `[i]`.
pub fn leaves(value: &Value) -> Vec<(Vec<String>, &Value)> {
    fn visit<'a>(value: &'a Value, path: &mut Vec<String>, out: &mut Vec<(Vec<String>, &'a Value)>) {
        match value {
            Value::Object(map) => {
                for (k, child) in map {
                    path.push(k.clone());
                    visit(child, path, out);
                    path.pop();
                }
            },
            Value::Array(items) => {
                for (i, child) in items.iter().enumerate() {
                    path.push(format!("[{i}]"));
                    visit(child, path, out);
                    path.pop();
                }
            },
            _ => out.push((path.clone(), value)),
        }
    }
    let mut out = Vec::new();
    visit(value, &mut Vec::new(), &mut out);
    out
}

/// First leaf whose final key matches one of `keys` (case-insensitive).
pub fn find_leaf<'a>(value: &'a Value, keys: &[&str]) -> Option<&'a Value> {
    leaves(value).into_iter().find_map(|(path, leaf)| {
        path.last()
            .filter(|last| keys.iter().any(|k| last.eq_ignore_ascii_case(k)))
            .map(|_| leaf)
    })
}

/// Normalize a one-or-many field to a slice of items.
pub fn as_items(value: &Value) -> Vec<&Value> {
    match value {
        Value::Array(items) => items.iter().collect(),
        Value::Null => Vec::new(),
        other => vec![other],
    }
}

/// Remove duplicates, keeping the first occurrence.
pub fn dedupe_preserve_order(items: Vec<String>) -> Vec<String> {
    let mut seen = std::collections::HashSet::new();
    items
        .into_iter()
        .filter(|item| seen.insert(item.clone()))
        .collect()
}
