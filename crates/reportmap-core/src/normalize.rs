//! Raw entries to canonical records.
//!
//! Required identifiers are checked here; entries without one are dropped and
//! reported. Enum labels that are not recognised become `Unknown` and are
//! counted. Nothing is looked up across collections at this stage.

use std::collections::HashSet;
use tracing::debug;

use crate::diagnostics::{Diagnostics, SourceKind};
use crate::source::{RawAction, RawBookmarkEntry, RawPageEntry, RawPageVisualEntry, RawVisualEntry};
use crate::types::{
    ActionAnnotation, ActionKind, Bookmark, BookmarkKey, BookmarkMode, BoundingBox,
    FilterDescriptor, Layout, Page, PageVisual, Resolution, Visual, VisualType,
};

/// Trimmed text, `None` when blank.
fn clean(raw: Option<&str>) -> Option<String> {
    raw.map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

fn clean_list(raw: &[String]) -> Vec<String> {
    raw.iter().filter_map(|s| clean(Some(s))).collect()
}

/// Canonical bookmark rows, in input order.
pub fn normalize_bookmarks(raw: Vec<RawBookmarkEntry>, diagnostics: &mut Diagnostics) -> Vec<Bookmark> {
    diagnostics.stats_mut(SourceKind::Bookmarks).received += raw.len();
    let mut out = Vec::with_capacity(raw.len());

    for (position, entry) in raw.into_iter().enumerate() {
        let Some(bookmark_id) = clean(entry.bookmark_id.as_deref()) else {
            diagnostics.malformed(
                SourceKind::Bookmarks,
                None,
                format!("entry #{position} has no bookmark id"),
            );
            continue;
        };

        let mode = match clean(entry.mode.as_deref()) {
            None => BookmarkMode::AllVisuals,
            Some(label) => BookmarkMode::parse(&label).unwrap_or_else(|| {
                diagnostics.coerced(
                    SourceKind::Bookmarks,
                    &bookmark_id,
                    format!("unrecognised bookmark mode '{label}'"),
                );
                BookmarkMode::Unknown
            }),
        };

        out.push(Bookmark {
            key: BookmarkKey {
                bookmark_id,
                visual_id: clean(entry.visual_id.as_deref()),
            },
            name: entry.name.map(|n| n.trim().to_string()).unwrap_or_default(),
            page_id: clean(entry.page_id.as_deref()),
            mode,
            selected: entry.selected.unwrap_or(false),
            recorded_type: VisualType::from_raw(entry.visual_type.as_deref().unwrap_or_default()),
            display_mode: clean(entry.display_mode.as_deref()),
            filters: clean_list(&entry.filters)
                .into_iter()
                .map(FilterDescriptor)
                .collect(),
            slicer_selections: entry.slicer_selections,
            visual_type: Resolution::Unresolved,
            visual_title: Resolution::Unresolved,
            page_name: Resolution::Unresolved,
            orphaned: false,
        });
    }

    diagnostics.stats_mut(SourceKind::Bookmarks).kept += out.len();
    debug!(kept = out.len(), "normalized bookmarks");
    out
}

fn normalize_action(raw: RawAction, owner: &str, diagnostics: &mut Diagnostics) -> ActionAnnotation {
    let label = clean(raw.kind.as_deref()).unwrap_or_default();
    let kind = ActionKind::parse(&label).unwrap_or_else(|| {
        diagnostics.coerced(
            SourceKind::Pages,
            owner,
            format!("unrecognised action kind '{label}'"),
        );
        ActionKind::Unknown
    });
    ActionAnnotation::new(kind, clean(raw.target.as_deref()))
}

fn normalize_page_visual(
    raw: RawPageVisualEntry,
    page_id: &str,
    position: usize,
    diagnostics: &mut Diagnostics,
) -> Option<PageVisual> {
    let Some(id) = clean(raw.id.as_deref()) else {
        diagnostics.malformed(
            SourceKind::Pages,
            Some(page_id),
            format!("visual #{position} on page '{page_id}' has no id"),
        );
        return None;
    };
    let owner = format!("{page_id}/{id}");
    let actions = raw
        .actions
        .into_iter()
        .map(|action| normalize_action(action, &owner, diagnostics))
        .collect();
    Some(PageVisual {
        visual_type: VisualType::from_raw(raw.visual_type.as_deref().unwrap_or_default()),
        actions,
        columns: clean_list(&raw.columns),
        filters: clean_list(&raw.filters),
        title: Resolution::Unresolved,
        id,
    })
}

/// Canonical pages, in input order.
pub fn normalize_pages(raw: Vec<RawPageEntry>, diagnostics: &mut Diagnostics) -> Vec<Page> {
    diagnostics.stats_mut(SourceKind::Pages).received += raw.len();
    let mut out = Vec::with_capacity(raw.len());

    for (position, entry) in raw.into_iter().enumerate() {
        let Some(id) = clean(entry.id.as_deref()) else {
            diagnostics.malformed(
                SourceKind::Pages,
                None,
                format!("page #{position} has no id"),
            );
            continue;
        };
        let visuals = entry
            .visuals
            .into_iter()
            .enumerate()
            .filter_map(|(i, visual)| normalize_page_visual(visual, &id, i, diagnostics))
            .collect();
        out.push(Page {
            name: entry.display_name.map(|n| n.trim().to_string()).unwrap_or_default(),
            visuals,
            id,
        });
    }

    diagnostics.stats_mut(SourceKind::Pages).kept += out.len();
    debug!(kept = out.len(), "normalized pages");
    out
}

/// Bounding box when the layout carries all four numeric coordinates.
fn bounds(layout: &serde_json::Value) -> Option<BoundingBox> {
    let num = |key: &str| layout.get(key).and_then(serde_json::Value::as_f64);
    Some(BoundingBox {
        x: num("x")?,
        y: num("y")?,
        width: num("width")?,
        height: num("height")?,
    })
}

/// Canonical captured visuals, in input order. Byte-identical repeats are
/// collapsed into their first occurrence.
pub fn normalize_visuals(raw: Vec<RawVisualEntry>, diagnostics: &mut Diagnostics) -> Vec<Visual> {
    diagnostics.stats_mut(SourceKind::Visuals).received += raw.len();
    let mut seen = HashSet::new();
    let mut out = Vec::with_capacity(raw.len());

    for (position, entry) in raw.into_iter().enumerate() {
        if let Ok(fingerprint) = serde_json::to_string(&entry) {
            if !seen.insert(fingerprint) {
                diagnostics.stats_mut(SourceKind::Visuals).collapsed_duplicates += 1;
                continue;
            }
        }

        let Some(id) = clean(entry.name.as_deref()) else {
            diagnostics.malformed(
                SourceKind::Visuals,
                None,
                format!("captured visual #{position} has no name"),
            );
            continue;
        };
        let Some(page_id) = clean(entry.page_id.as_deref()) else {
            diagnostics.malformed(
                SourceKind::Visuals,
                Some(&id),
                format!("captured visual '{id}' has no page id"),
            );
            continue;
        };

        let layout = Layout {
            bounds: entry.layout.as_ref().and_then(bounds),
            raw: entry.layout,
        };
        out.push(Visual {
            visual_type: VisualType::from_raw(entry.visual_type.as_deref().unwrap_or_default()),
            title: entry.title,
            layout,
            page_name: Resolution::Unresolved,
            id,
            page_id,
        });
    }

    let stats = diagnostics.stats_mut(SourceKind::Visuals);
    stats.kept += out.len();
    debug!(
        kept = out.len(),
        collapsed = stats.collapsed_duplicates,
        "normalized visuals"
    );
    out
}
