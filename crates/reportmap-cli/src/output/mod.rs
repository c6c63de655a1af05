//! # Output Formatting
//!
//! Renders a reconciliation run in one of three formats:
//!
//! - **xlsx**: the consolidated workbook, one worksheet per sheet
//! - **json**: every sheet plus the diagnostic summary
//! - **text**: a colored summary for the terminal
//!
//! The format is taken from `--format`, else inferred from the `--output`
//! extension, else `text`.

pub mod json;
pub mod text;
pub mod xlsx;

use std::path::Path;

/// Output format for `reconcile`
#[derive(Clone, Copy, Debug, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    /// Excel workbook (requires --output)
    Xlsx,
    /// Sheets and diagnostics as JSON
    Json,
    /// Human-readable summary
    Text,
}

impl OutputFormat {
    /// Pick the format for a run.
    pub fn resolve(explicit: Option<Self>, output: Option<&Path>) -> Self {
        if let Some(format) = explicit {
            return format;
        }
        let extension = output
            .and_then(Path::extension)
            .and_then(|ext| ext.to_str())
            .map(str::to_ascii_lowercase);
        match (output, extension.as_deref()) {
            (_, Some("json")) => Self::Json,
            (_, Some("txt")) => Self::Text,
            (Some(_), _) => Self::Xlsx,
            (None, _) => Self::Text,
        }
    }
}
