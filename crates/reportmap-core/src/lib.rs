//! # reportmap-core
//!
//! Entity resolution and propagation over Power BI report metadata.
//!
//! A report's metadata arrives in three independent collections: bookmark
//! definitions, page definitions, and visuals captured from the rendered
//! report. Each collection only knows its own identifiers. This crate joins
//! them, fills in the fields each collection is missing (page names on
//! bookmarks, visual titles on pages, target names on button actions) and
//! renders the result as tables.
//!
//! ## Architecture
//!
//! - **Sources** ([`source`]): readers for PBIR folders and capture logs,
//!   behind the [`BookmarkSource`], [`PageSource`] and [`VisualSource`] traits
//! - **Normalization** ([`normalize`]): raw entries to canonical records
//! - **Index** ([`index`]): per-run identifier lookups, duplicates removed
//! - **Reconciliation** ([`reconcile`]): staged resolution and propagation
//! - **Export** ([`export`]): sheets with a marker for unresolved values
//! - **Diagnostics** ([`diagnostics`]): every non-fatal issue, with counters
//!
//! ## Quick Start
//!
//! ```rust
//! use reportmap_core::source::{RawBookmarkEntry, RawPageEntry, RawVisualEntry};
//! use reportmap_core::{ExportOptions, Sources, run};
//!
//! let mut bookmarks = vec![RawBookmarkEntry {
//!     bookmark_id: Some("B1".into()),
//!     name: Some("Focus".into()),
//!     visual_id: Some("V9".into()),
//!     ..Default::default()
//! }];
//! let mut pages = vec![RawPageEntry {
//!     id: Some("P2".into()),
//!     display_name: Some("Overview".into()),
//!     ..Default::default()
//! }];
//! let mut visuals = vec![RawVisualEntry {
//!     page_id: Some("P2".into()),
//!     name: Some("V9".into()),
//!     title: Some("Sales Trend".into()),
//!     ..Default::default()
//! }];
//!
//! let output = run(
//!     Sources { bookmarks: &mut bookmarks, pages: &mut pages, visuals: &mut visuals },
//!     &ExportOptions::default(),
//! )?;
//! let row = &output.enriched.bookmarks[0];
//! assert_eq!(row.page_name.value().map(String::as_str), Some("Overview"));
//! # Ok::<(), reportmap_core::Error>(())
//! ```
//!
//! ## Error Handling
//!
//! Problems with individual records never abort a run; they are recorded in
//! [`Diagnostics`]. Only [`Error::NoUsableInput`] stops the pipeline.

/// Configuration loading and defaults
pub mod config;
/// Per-run issue log and counters
pub mod diagnostics;
/// Error types and result aliases
pub mod error;
/// Workbook rendering
pub mod export;
/// Identifier index
pub mod index;
/// Raw entries to canonical records
pub mod normalize;
/// End-to-end run
pub mod pipeline;
/// Resolution and propagation stages
pub mod reconcile;
/// Input readers
pub mod source;
/// Canonical record types
pub mod types;
/// Case-insensitive JSON helpers
pub mod value;

// Re-export commonly used types
pub use config::{Config, ExportConfig, ScanConfig};
pub use diagnostics::{DiagnosticSummary, Diagnostics, Issue, IssueKind, Severity, SourceKind};
pub use error::{Error, Result};
pub use export::{Cell, ExportOptions, Sheet, Workbook};
pub use index::{GlobalLookup, IdentifierIndex, RecordSet};
pub use pipeline::{RunOutput, Sources, run};
pub use reconcile::{EnrichedSet, Reconciler, reconcile};
pub use source::{BookmarkSource, PageSource, VisualSource};
pub use types::*;
