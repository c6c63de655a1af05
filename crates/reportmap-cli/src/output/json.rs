//! JSON output.

use reportmap_core::RunOutput;
use serde_json::{Value, json};

/// JSON document for a run: sheets plus the diagnostic summary.
pub fn run_document(output: &RunOutput) -> Value {
    json!({
        "sheets": output.workbook.sheets,
        "diagnostics": output.summary,
        "orphanedBookmarks": output.enriched.orphaned_bookmarks(),
    })
}

/// Pretty-printed [`run_document`].
pub fn render_run(output: &RunOutput) -> serde_json::Result<String> {
    serde_json::to_string_pretty(&run_document(output))
}
