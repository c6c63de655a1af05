//! Ingestion of visuals captured from a rendered report.
//!
//! The capture script logs one JSON object per page to the browser console.
//! Console output is noisy: prefixes, warnings, stack traces and the same
//! object logged twice. [`CaptureLog`] finds every JSON object in the text,
//! keeps the ones shaped like visuals and counts everything else as noise.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::path::{Path, PathBuf};
use tracing::debug;

use super::{RawVisualEntry, Rejected, VisualSource};
use crate::value::{get_any, non_empty_text};
use crate::{Error, Result};

/// Counters for one ingestion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct CaptureStats {
    /// JSON objects found in the text.
    pub objects: usize,
    /// Visual entries produced.
    pub visuals: usize,
    /// Objects that were not visuals or page groups.
    pub skipped_objects: usize,
    /// Non-blank lines holding no JSON object.
    pub noise_lines: usize,
}

#[derive(Debug, Clone)]
enum Input {
    Text(String),
    File(PathBuf),
}

/// Visual source backed by captured console output.
#[derive(Debug, Clone)]
pub struct CaptureLog {
    input: Input,
    stats: CaptureStats,
    rejected: Vec<Rejected>,
}

impl CaptureLog {
    /// Capture held in memory.
    pub fn from_text(text: impl Into<String>) -> Self {
        Self::with_input(Input::Text(text.into()))
    }

    /// Capture read from `path` on load.
    pub fn from_path(path: &Path) -> Self {
        Self::with_input(Input::File(path.to_path_buf()))
    }

    const fn with_input(input: Input) -> Self {
        Self {
            input,
            stats: CaptureStats {
                objects: 0,
                visuals: 0,
                skipped_objects: 0,
                noise_lines: 0,
            },
            rejected: Vec::new(),
        }
    }

    /// Counters from the last load.
    pub const fn stats(&self) -> CaptureStats {
        self.stats
    }

    fn text(&self) -> Result<String> {
        match &self.input {
            Input::Text(text) => Ok(text.clone()),
            Input::File(path) => std::fs::read_to_string(path).map_err(|e| Error::SourceUnavailable {
                source_name: "visuals".to_string(),
                reason: format!("cannot read capture log {}: {e}", path.display()),
            }),
        }
    }
}

impl VisualSource for CaptureLog {
    fn load(&mut self) -> Result<Vec<RawVisualEntry>> {
        let text = self.text()?;
        let (entries, stats, rejected) = ingest(&text);
        debug!(
            objects = stats.objects,
            visuals = stats.visuals,
            skipped = stats.skipped_objects,
            noise = stats.noise_lines,
            "ingested capture log"
        );
        self.stats = stats;
        self.rejected = rejected;
        Ok(entries)
    }

    fn rejected(&mut self) -> Vec<Rejected> {
        std::mem::take(&mut self.rejected)
    }
}

/// A JSON object found in free text, with the byte span it occupied.
#[derive(Debug, Clone, PartialEq)]
pub struct Located {
    /// Byte offset of the opening brace.
    pub start: usize,
    /// Byte offset just past the closing brace.
    pub end: usize,
    /// Parsed object.
    pub value: Value,
}

/// Every top-level JSON object embedded in `text`, in order. Objects nested
/// inside a found object are not reported separately.
pub fn find_json_objects(text: &str) -> Vec<Located> {
    let mut found = Vec::new();
    let mut pos = 0;
    while let Some(offset) = text[pos..].find('{') {
        let start = pos + offset;
        let mut stream = serde_json::Deserializer::from_str(&text[start..]).into_iter::<Value>();
        match stream.next() {
            Some(Ok(value)) if value.is_object() => {
                let end = start + stream.byte_offset();
                found.push(Located { start, end, value });
                pos = end;
            },
            // Resume where the parser gave up, not at the next inner brace.
            Some(Err(err)) => pos = (start + failure_offset(&text[start..], &err)).max(start + 1),
            _ => pos = start + 1,
        }
    }
    found
}

/// Byte offset in `text` at or just before the byte `err` stopped on.
fn failure_offset(text: &str, err: &serde_json::Error) -> usize {
    let line_start = match err.line() {
        0 | 1 => 0,
        line => text
            .match_indices('\n')
            .nth(line - 2)
            .map_or(text.len(), |(i, _)| i + 1),
    };
    let mut offset = (line_start + err.column().saturating_sub(1)).min(text.len());
    while !text.is_char_boundary(offset) {
        offset -= 1;
    }
    offset
}

/// Parse captured text into raw visual entries.
pub fn ingest(text: &str) -> (Vec<RawVisualEntry>, CaptureStats, Vec<Rejected>) {
    let located = find_json_objects(text);
    let mut stats = CaptureStats {
        objects: located.len(),
        noise_lines: count_noise_lines(text, &located),
        ..CaptureStats::default()
    };
    let mut entries = Vec::new();
    let mut rejected = Vec::new();

    for object in &located {
        let value = &object.value;
        if let Some(group) = get_any(value, &["visuals"]).and_then(Value::as_array) {
            let group_page = get_any(value, &["pageId"]).and_then(non_empty_text);
            for (i, item) in group.iter().enumerate() {
                match serde_json::from_value::<RawVisualEntry>(item.clone()) {
                    Ok(mut entry) if item.is_object() => {
                        if entry.page_id.is_none() {
                            entry.page_id.clone_from(&group_page);
                        }
                        entries.push(entry);
                    },
                    Ok(_) => rejected.push(Rejected {
                        location: format!("byte {} visuals[{i}]", object.start),
                        reason: "visual entry is not an object".to_string(),
                    }),
                    Err(e) => rejected.push(Rejected {
                        location: format!("byte {} visuals[{i}]", object.start),
                        reason: format!("unreadable visual entry: {e}"),
                    }),
                }
            }
        } else if looks_like_visual(value) {
            match serde_json::from_value::<RawVisualEntry>(value.clone()) {
                Ok(entry) => entries.push(entry),
                Err(e) => rejected.push(Rejected {
                    location: format!("byte {}", object.start),
                    reason: format!("unreadable visual entry: {e}"),
                }),
            }
        } else {
            stats.skipped_objects += 1;
        }
    }

    stats.visuals = entries.len();
    (entries, stats, rejected)
}

fn looks_like_visual(value: &Value) -> bool {
    get_any(value, &["pageId"]).is_some() && get_any(value, &["name", "id"]).is_some()
}

fn count_noise_lines(text: &str, located: &[Located]) -> usize {
    let mut line_start = 0;
    let mut noise = 0;
    for line in text.split_inclusive('\n') {
        let line_end = line_start + line.len();
        let covered = located
            .iter()
            .any(|obj| obj.start < line_end && obj.end > line_start);
        if !covered && !line.trim().is_empty() {
            noise += 1;
        }
        line_start = line_end;
    }
    noise
}

/// Browser-console script that logs the visuals of `page_ids` in the shape
/// [`CaptureLog`] reads. Run it in the embedded-report playground with the
/// report loaded as `report`.
pub fn capture_script(page_ids: &[String]) -> String {
    let ids = page_ids
        .iter()
        .map(|id| format!("    {},", Value::String(id.clone())))
        .collect::<Vec<_>>()
        .join("\n");
    format!(
        r"try {{
  const pages = await report.getPages();
  const pageIds = [
{ids}
  ];
  const pagesById = new Map(pages.map(p => [p.name, p]));
  for (const pageId of pageIds) {{
    const page = pagesById.get(pageId);
    if (!page) {{
      console.warn(`Page with ID ${{pageId}} not found.`);
      continue;
    }}
    const visuals = await page.getVisuals();
    console.log(JSON.stringify({{
      pageId,
      visuals: visuals.map(v => ({{
        pageId,
        name: v.name,
        type: v.type,
        title: v.title,
        layout: v.layout
      }}))
    }}));
  }}
}} catch (errors) {{
  console.log(errors);
}}
"
    )
}
