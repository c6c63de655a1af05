//! Identifier lookups over one run's records.
//!
//! [`IdentifierIndex::build`] first removes records whose identifier collides
//! with an earlier one in the same collection (reporting each), then maps
//! every remaining identifier to the record's position. The index holds
//! positions rather than references so the engine can fill in derived fields
//! while looking things up.

use std::collections::{HashMap, HashSet};
use std::hash::Hash;
use tracing::debug;

use crate::diagnostics::{Diagnostics, SourceKind};
use crate::types::{Bookmark, BookmarkKey, Page, Visual, VisualKey};

/// The three canonical collections of a run.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RecordSet {
    /// Bookmark rows.
    pub bookmarks: Vec<Bookmark>,
    /// Pages with their listed visuals.
    pub pages: Vec<Page>,
    /// Captured visuals.
    pub visuals: Vec<Visual>,
}

/// Result of a lookup by bare visual id.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GlobalLookup {
    /// Exactly one page has a visual with this id.
    Found(usize),
    /// Visuals with this id exist on several pages.
    Ambiguous,
    /// No captured visual has this id.
    Missing,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum GlobalEntry {
    Unique(usize),
    Ambiguous,
}

/// Immutable lookup tables for one run.
#[derive(Debug, Clone, Default)]
pub struct IdentifierIndex {
    pages: HashMap<String, usize>,
    visuals: HashMap<VisualKey, usize>,
    global_visuals: HashMap<String, GlobalEntry>,
    bookmarks: HashMap<BookmarkKey, usize>,
    bookmark_names: HashMap<String, String>,
}

/// Keep the first record per key, reporting every later one.
fn keep_first<T, K: Hash + Eq + Clone>(
    records: &mut Vec<T>,
    key_of: impl Fn(&T) -> K,
    mut report: impl FnMut(&K),
) {
    let mut seen = HashSet::new();
    records.retain(|record| {
        let key = key_of(record);
        if seen.contains(&key) {
            report(&key);
            false
        } else {
            seen.insert(key);
            true
        }
    });
}

impl IdentifierIndex {
    /// Remove duplicate records from `records` and index the rest.
    pub fn build(records: &mut RecordSet, diagnostics: &mut Diagnostics) -> Self {
        keep_first(
            &mut records.pages,
            |page| page.id.clone(),
            |id| {
                diagnostics.duplicate(
                    SourceKind::Pages,
                    id,
                    format!("page '{id}' is defined more than once; keeping the first"),
                );
            },
        );
        for page in &mut records.pages {
            let page_id = page.id.clone();
            keep_first(
                &mut page.visuals,
                |visual| visual.id.clone(),
                |id| {
                    diagnostics.duplicate(
                        SourceKind::Pages,
                        &format!("{page_id}/{id}"),
                        format!("page '{page_id}' lists visual '{id}' more than once; keeping the first"),
                    );
                },
            );
        }
        keep_first(&mut records.visuals, Visual::key, |key| {
            diagnostics.duplicate(
                SourceKind::Visuals,
                &key.to_string(),
                format!("conflicting captures for visual '{key}'; keeping the first"),
            );
        });
        keep_first(
            &mut records.bookmarks,
            |bookmark| bookmark.key.clone(),
            |key| {
                diagnostics.duplicate(
                    SourceKind::Bookmarks,
                    &key.to_string(),
                    format!("bookmark row '{key}' appears more than once; keeping the first"),
                );
            },
        );

        let mut index = Self::default();
        for (pos, page) in records.pages.iter().enumerate() {
            index.pages.insert(page.id.clone(), pos);
        }
        for (pos, visual) in records.visuals.iter().enumerate() {
            index.visuals.insert(visual.key(), pos);
            index
                .global_visuals
                .entry(visual.id.clone())
                .and_modify(|entry| *entry = GlobalEntry::Ambiguous)
                .or_insert(GlobalEntry::Unique(pos));
        }
        for (pos, bookmark) in records.bookmarks.iter().enumerate() {
            index.bookmarks.insert(bookmark.key.clone(), pos);
            index
                .bookmark_names
                .entry(bookmark.key.bookmark_id.clone())
                .or_insert_with(|| bookmark.name.clone());
        }

        debug!(
            pages = index.pages.len(),
            visuals = index.visuals.len(),
            bookmarks = index.bookmarks.len(),
            ambiguous = index.ambiguous_visual_ids().len(),
            "built identifier index"
        );
        index
    }

    /// Position of the page with `id`.
    pub fn page(&self, id: &str) -> Option<usize> {
        self.pages.get(id).copied()
    }

    /// Position of the captured visual `(page_id, visual_id)`.
    pub fn visual(&self, page_id: &str, visual_id: &str) -> Option<usize> {
        self.visuals.get(&VisualKey::new(page_id, visual_id)).copied()
    }

    /// Lookup by bare visual id across all pages.
    pub fn visual_global(&self, visual_id: &str) -> GlobalLookup {
        match self.global_visuals.get(visual_id) {
            Some(GlobalEntry::Unique(pos)) => GlobalLookup::Found(*pos),
            Some(GlobalEntry::Ambiguous) => GlobalLookup::Ambiguous,
            None => GlobalLookup::Missing,
        }
    }

    /// Position of the bookmark row with `key`.
    pub fn bookmark(&self, key: &BookmarkKey) -> Option<usize> {
        self.bookmarks.get(key).copied()
    }

    /// Display name of bookmark `id` (from its first row).
    pub fn bookmark_name(&self, id: &str) -> Option<&str> {
        self.bookmark_names.get(id).map(String::as_str)
    }

    /// Visual ids present on more than one page, sorted.
    pub fn ambiguous_visual_ids(&self) -> Vec<&str> {
        let mut ids: Vec<&str> = self
            .global_visuals
            .iter()
            .filter(|(_, entry)| **entry == GlobalEntry::Ambiguous)
            .map(|(id, _)| id.as_str())
            .collect();
        ids.sort_unstable();
        ids
    }
}
