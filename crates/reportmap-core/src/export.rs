//! Tabular rendering of an enriched record set.
//!
//! [`Workbook::from_enriched`] lays the enriched collections out as
//! independent sheets. Rows follow source insertion order. Unresolved fields
//! are written as the configured marker, which is never the same as an empty
//! cell.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::config::ExportConfig;
use crate::diagnostics::Diagnostics;
use crate::reconcile::EnrichedSet;
use crate::types::{ActionAnnotation, Bookmark, BoundingBox, Page, PageVisual, Resolution, Visual};
use crate::{Error, Result};

/// Sheet holding one row per bookmark row.
pub const BOOKMARKS_SHEET: &str = "Bookmarks";
/// Sheet holding one row per page visual.
pub const PAGES_SHEET: &str = "Pages";
/// Sheet holding one row per captured visual.
pub const VISUALS_SHEET: &str = "Visuals";
/// Sheet listing recorded issues.
pub const DIAGNOSTICS_SHEET: &str = "Diagnostics";

/// Separator used when a cell holds a list.
pub const LIST_SEPARATOR: &str = "; ";

/// Text for an empty filter or slicer list.
pub const EMPTY_LIST: &str = "None";

const BOOKMARK_HEADERS: [&str; 12] = [
    "Bookmark ID",
    "Bookmark Name",
    "Visual ID",
    "Page Name",
    "Visual Title",
    "Visual Type",
    "Selected Visual",
    "Mode",
    "Display Mode",
    "Applied Filters",
    "Slicer Selections",
    "Orphaned",
];

const PAGE_HEADERS: [&str; 9] = [
    "Page ID",
    "Page Name",
    "Visual ID",
    "Visual Title",
    "Visual Type",
    "Action Type",
    "Action Name",
    "Visual Columns",
    "Visual Filters",
];

const VISUAL_HEADERS: [&str; 10] = [
    "Page ID",
    "Page Name",
    "Visual ID",
    "Visual Type",
    "Title",
    "X",
    "Y",
    "Width",
    "Height",
    "Layout",
];

const DIAGNOSTIC_HEADERS: [&str; 5] = ["Severity", "Kind", "Source", "Identifier", "Message"];

/// Rendering options.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportOptions {
    /// Text written for unresolved fields.
    pub unresolved_marker: String,
    /// Whether to add the diagnostics sheet.
    pub include_diagnostics: bool,
}

impl Default for ExportOptions {
    fn default() -> Self {
        Self::from(&ExportConfig::default())
    }
}

impl From<&ExportConfig> for ExportOptions {
    fn from(config: &ExportConfig) -> Self {
        Self {
            unresolved_marker: config.unresolved_marker.clone(),
            include_diagnostics: config.include_diagnostics,
        }
    }
}

/// One cell of a sheet.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Cell {
    /// Text, including the unresolved marker.
    Text(String),
    /// A number (visual geometry).
    Number(f64),
    /// Nothing to show.
    Empty,
}

impl Cell {
    fn text(value: impl Into<String>) -> Self {
        Self::Text(value.into())
    }

    fn optional(value: Option<&str>) -> Self {
        value.map_or(Self::Empty, Self::text)
    }

    /// Whether the cell holds nothing.
    pub const fn is_empty(&self) -> bool {
        matches!(self, Self::Empty)
    }
}

impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Text(text) => f.write_str(text),
            Self::Number(n) => write!(f, "{n}"),
            Self::Empty => Ok(()),
        }
    }
}

/// A named table with a header row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Sheet {
    /// Sheet name.
    pub name: String,
    /// Column headers.
    pub headers: Vec<String>,
    /// Data rows; every row has one cell per header.
    pub rows: Vec<Vec<Cell>>,
}

impl Sheet {
    fn new(name: &str, headers: &[&str]) -> Self {
        Self {
            name: name.to_string(),
            headers: headers.iter().map(|h| (*h).to_string()).collect(),
            rows: Vec::new(),
        }
    }

    /// Index of the column named `header`.
    pub fn column(&self, header: &str) -> Option<usize> {
        self.headers.iter().position(|h| h == header)
    }

    /// Cell at `row` under `header`.
    pub fn cell(&self, row: usize, header: &str) -> Option<&Cell> {
        let col = self.column(header)?;
        self.rows.get(row)?.get(col)
    }

    fn push(&mut self, row: Vec<Cell>) {
        debug_assert_eq!(row.len(), self.headers.len(), "row width for sheet {}", self.name);
        self.rows.push(row);
    }
}

/// A set of independent sheets.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Workbook {
    /// Sheets in output order.
    pub sheets: Vec<Sheet>,
}

impl Workbook {
    /// Render `enriched` into sheets.
    pub fn from_enriched(enriched: &EnrichedSet, options: &ExportOptions) -> Self {
        let renderer = Renderer {
            marker: &options.unresolved_marker,
        };
        let mut sheets = vec![
            renderer.bookmarks(&enriched.bookmarks),
            renderer.pages(&enriched.pages),
            renderer.visuals(&enriched.visuals),
        ];
        if options.include_diagnostics {
            sheets.push(diagnostics_sheet(&enriched.diagnostics));
        }
        Self { sheets }
    }

    /// Sheet named `name`.
    pub fn sheet(&self, name: &str) -> Option<&Sheet> {
        self.sheets.iter().find(|s| s.name == name)
    }

    /// Pretty JSON rendering of every sheet.
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self).map_err(|e| Error::Export(format!("cannot encode workbook: {e}")))
    }
}

struct Renderer<'a> {
    marker: &'a str,
}

impl Renderer<'_> {
    fn resolved<T: fmt::Display>(&self, value: &Resolution<T>) -> Cell {
        match value {
            Resolution::Resolved(v) => Cell::Text(v.to_string()),
            Resolution::Unresolved => Cell::text(self.marker),
        }
    }

    fn bookmarks(&self, bookmarks: &[Bookmark]) -> Sheet {
        let mut sheet = Sheet::new(BOOKMARKS_SHEET, &BOOKMARK_HEADERS);
        for bookmark in bookmarks {
            sheet.push(vec![
                Cell::text(bookmark.id()),
                Cell::text(&bookmark.name),
                Cell::optional(bookmark.visual_id()),
                self.resolved(&bookmark.page_name),
                self.resolved(&bookmark.visual_title),
                self.resolved(&bookmark.visual_type),
                yes_no(bookmark.selected),
                Cell::text(bookmark.mode.as_str()),
                Cell::optional(bookmark.display_mode.as_deref()),
                join_or_none(&bookmark.filters),
                join_or_none(&bookmark.slicer_selections),
                yes_no(bookmark.orphaned),
            ]);
        }
        sheet
    }

    fn pages(&self, pages: &[Page]) -> Sheet {
        let mut sheet = Sheet::new(PAGES_SHEET, &PAGE_HEADERS);
        for page in pages {
            if page.visuals.is_empty() {
                let mut row = vec![Cell::text(&page.id), Cell::text(&page.name)];
                row.resize(PAGE_HEADERS.len(), Cell::text(self.marker));
                sheet.push(row);
                continue;
            }
            for visual in &page.visuals {
                sheet.push(self.page_visual_row(page, visual));
            }
        }
        sheet
    }

    fn page_visual_row(&self, page: &Page, visual: &PageVisual) -> Vec<Cell> {
        let action_types: Vec<String> = visual.actions.iter().map(action_type).collect();
        let action_names: Vec<String> = visual
            .actions
            .iter()
            .filter_map(|action| self.action_name(action))
            .collect();
        vec![
            Cell::text(&page.id),
            Cell::text(&page.name),
            Cell::text(&visual.id),
            self.resolved(&visual.title),
            Cell::text(visual.visual_type.as_str()),
            Cell::Text(action_types.join(LIST_SEPARATOR)),
            Cell::Text(action_names.join(LIST_SEPARATOR)),
            Cell::Text(visual.columns.join(LIST_SEPARATOR)),
            join_or_none(&visual.filters),
        ]
    }

    fn action_name(&self, action: &ActionAnnotation) -> Option<String> {
        action.target.as_ref()?;
        Some(match &action.target_name {
            Resolution::Resolved(name) => format!("{}: {name}", action.kind.label()),
            Resolution::Unresolved => self.marker.to_string(),
        })
    }

    fn visuals(&self, visuals: &[Visual]) -> Sheet {
        let mut sheet = Sheet::new(VISUALS_SHEET, &VISUAL_HEADERS);
        for visual in visuals {
            let bounds = visual.layout.bounds;
            let geometry = |pick: fn(&BoundingBox) -> f64| {
                bounds.as_ref().map_or(Cell::Empty, |b| Cell::Number(pick(b)))
            };
            sheet.push(vec![
                Cell::text(&visual.page_id),
                self.resolved(&visual.page_name),
                Cell::text(&visual.id),
                Cell::text(visual.visual_type.as_str()),
                Cell::optional(visual.title.as_deref()),
                geometry(|b| b.x),
                geometry(|b| b.y),
                geometry(|b| b.width),
                geometry(|b| b.height),
                visual
                    .layout
                    .raw
                    .as_ref()
                    .map_or(Cell::Empty, |raw| Cell::Text(raw.to_string())),
            ]);
        }
        sheet
    }
}

fn diagnostics_sheet(diagnostics: &Diagnostics) -> Sheet {
    let mut sheet = Sheet::new(DIAGNOSTICS_SHEET, &DIAGNOSTIC_HEADERS);
    for issue in diagnostics.issues() {
        sheet.push(vec![
            Cell::text(issue.severity.as_str()),
            Cell::text(issue.kind.as_str()),
            Cell::text(issue.source.as_str()),
            Cell::optional(issue.identifier.as_deref()),
            Cell::text(&issue.message),
        ]);
    }
    sheet
}

fn action_type(action: &ActionAnnotation) -> String {
    match &action.target {
        Some(target) => format!("{}: {target}", action.kind.label()),
        None => action.kind.label().to_string(),
    }
}

fn yes_no(flag: bool) -> Cell {
    Cell::text(if flag { "Yes" } else { "No" })
}

fn join_or_none<T: fmt::Display>(items: &[T]) -> Cell {
    if items.is_empty() {
        return Cell::text(EMPTY_LIST);
    }
    Cell::Text(
        items
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(LIST_SEPARATOR),
    )
}
