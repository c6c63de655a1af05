//! Input adapters.
//!
//! The engine only sees raw entries produced by these traits. An `Err` from
//! `load` means the whole collection is unavailable; individual unreadable
//! files are reported through [`Rejected`] instead.
//!
//! Implementations:
//! - [`bookmarks::BookmarkFolder`] reads a PBIR `definition/bookmarks` folder
//! - [`pages::PageFolder`] reads a PBIR `definition/pages` folder
//! - [`capture::CaptureLog`] ingests console output of the capture script
//! - `Vec<Raw*>` for in-memory inputs
//! - [`Unavailable`] for a source that could not be located

pub mod bookmarks;
pub mod capture;
pub mod pages;
pub mod project;

use serde::{Deserialize, Serialize};

use crate::types::SlicerSelection;
use crate::{Error, Result};

/// An input item that a reader could not turn into a raw entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rejected {
    /// Where it came from (file path or log line).
    pub location: String,
    /// Why it was rejected.
    pub reason: String,
}

/// Bookmark row as read from a source. Every field is optional; the
/// normalizer decides what is required.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RawBookmarkEntry {
    /// Bookmark identifier.
    #[serde(alias = "id")]
    pub bookmark_id: Option<String>,
    /// Display name.
    #[serde(alias = "displayName")]
    pub name: Option<String>,
    /// Active page.
    #[serde(alias = "activeSection")]
    pub page_id: Option<String>,
    /// Captured visual container.
    pub visual_id: Option<String>,
    /// Bookmark scope label.
    pub mode: Option<String>,
    /// Whether the container is a target visual.
    pub selected: Option<bool>,
    /// Visual type recorded in the bookmark.
    pub visual_type: Option<String>,
    /// Container display mode.
    pub display_mode: Option<String>,
    /// Filter predicates.
    pub filters: Vec<String>,
    /// Slicer selections.
    pub slicer_selections: Vec<SlicerSelection>,
}

/// Action attached to a page visual, before normalization.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RawAction {
    /// Action label (`PageNavigation`, `Bookmark`, `Tooltip`…).
    #[serde(alias = "type")]
    pub kind: Option<String>,
    /// Target identifier.
    pub target: Option<String>,
}

impl RawAction {
    /// Action with a label and optional target.
    pub fn new(kind: &str, target: Option<String>) -> Self {
        Self {
            kind: Some(kind.to_string()),
            target,
        }
    }
}

/// Visual listed in a page definition, before normalization.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RawPageVisualEntry {
    /// Visual identifier.
    #[serde(alias = "name")]
    pub id: Option<String>,
    /// Visual type.
    pub visual_type: Option<String>,
    /// Attached actions.
    pub actions: Vec<RawAction>,
    /// Bound fields.
    pub columns: Vec<String>,
    /// Visual-level filter predicates.
    pub filters: Vec<String>,
}

/// Page as read from a source.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RawPageEntry {
    /// Page identifier.
    #[serde(alias = "name")]
    pub id: Option<String>,
    /// Display name.
    pub display_name: Option<String>,
    /// Visuals in definition order.
    pub visuals: Vec<RawPageVisualEntry>,
}

/// Visual as captured from the rendered report.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RawVisualEntry {
    /// Owning page identifier.
    pub page_id: Option<String>,
    /// Visual identifier.
    #[serde(alias = "id")]
    pub name: Option<String>,
    /// Visual type.
    #[serde(rename = "type", alias = "visualType")]
    pub visual_type: Option<String>,
    /// Displayed title.
    pub title: Option<String>,
    /// Layout object, passed through.
    pub layout: Option<serde_json::Value>,
}

/// Provides raw bookmark entries.
pub trait BookmarkSource {
    /// Load every entry. `Err` means the collection is unavailable.
    fn load(&mut self) -> Result<Vec<RawBookmarkEntry>>;

    /// Items skipped during the last `load`.
    fn rejected(&mut self) -> Vec<Rejected> {
        Vec::new()
    }
}

/// Provides raw page entries.
pub trait PageSource {
    /// Load every entry. `Err` means the collection is unavailable.
    fn load(&mut self) -> Result<Vec<RawPageEntry>>;

    /// Items skipped during the last `load`.
    fn rejected(&mut self) -> Vec<Rejected> {
        Vec::new()
    }
}

/// Provides raw captured visuals.
pub trait VisualSource {
    /// Load every entry. `Err` means the collection is unavailable.
    fn load(&mut self) -> Result<Vec<RawVisualEntry>>;

    /// Items skipped during the last `load`.
    fn rejected(&mut self) -> Vec<Rejected> {
        Vec::new()
    }
}

impl BookmarkSource for Vec<RawBookmarkEntry> {
    fn load(&mut self) -> Result<Vec<RawBookmarkEntry>> {
        Ok(self.clone())
    }
}

impl PageSource for Vec<RawPageEntry> {
    fn load(&mut self) -> Result<Vec<RawPageEntry>> {
        Ok(self.clone())
    }
}

impl VisualSource for Vec<RawVisualEntry> {
    fn load(&mut self) -> Result<Vec<RawVisualEntry>> {
        Ok(self.clone())
    }
}

/// A source that could not be located; every load fails.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Unavailable {
    /// Collection name used in the error.
    pub source_name: String,
    /// Why it is unavailable.
    pub reason: String,
}

impl Unavailable {
    /// New unavailable source.
    pub fn new(source_name: &str, reason: impl Into<String>) -> Self {
        Self {
            source_name: source_name.to_string(),
            reason: reason.into(),
        }
    }

    fn error(&self) -> Error {
        Error::SourceUnavailable {
            source_name: self.source_name.clone(),
            reason: self.reason.clone(),
        }
    }
}

impl BookmarkSource for Unavailable {
    fn load(&mut self) -> Result<Vec<RawBookmarkEntry>> {
        Err(self.error())
    }
}

impl PageSource for Unavailable {
    fn load(&mut self) -> Result<Vec<RawPageEntry>> {
        Err(self.error())
    }
}

impl VisualSource for Unavailable {
    fn load(&mut self) -> Result<Vec<RawVisualEntry>> {
        Err(self.error())
    }
}
