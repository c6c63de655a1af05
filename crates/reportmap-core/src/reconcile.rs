//! Cross-collection resolution and propagation.
//!
//! The engine runs in stages encoded in the type of [`Reconciler`]:
//!
//! 1. [`Indexed`]: duplicates removed, identifier index built.
//! 2. [`DirectlyResolved`]: every field with a direct source is filled in
//!    (visual page names, page-visual titles, action target names).
//! 3. [`Propagated`]: bookmark rows copy title, page name and type from the
//!    captured visual they reference.
//!
//! Bookmarks only ever learn their page name through the visual, never from
//! the page collection, so every row pointing at the same visual agrees.
//!
//! ```rust
//! use reportmap_core::{Diagnostics, RecordSet, Reconciler};
//!
//! let enriched = Reconciler::new(RecordSet::default(), Diagnostics::new())
//!     .resolve_direct()
//!     .propagate()
//!     .finish();
//! assert!(enriched.bookmarks.is_empty());
//! ```

use std::marker::PhantomData;
use tracing::{debug, info};

use crate::diagnostics::{DiagnosticSummary, Diagnostics, SourceKind};
use crate::index::{GlobalLookup, IdentifierIndex, RecordSet};
use crate::types::{ActionKind, Bookmark, Page, Resolution, Visual, VisualType};

/// Stage marker: index built.
#[derive(Debug)]
pub struct Indexed;

/// Stage marker: direct references resolved.
#[derive(Debug)]
pub struct DirectlyResolved;

/// Stage marker: bookmark fields propagated.
#[derive(Debug)]
pub struct Propagated;

/// Reconciliation state for one run.
#[derive(Debug)]
pub struct Reconciler<Stage> {
    records: RecordSet,
    index: IdentifierIndex,
    diagnostics: Diagnostics,
    _stage: PhantomData<Stage>,
}

/// Enriched records ready for export.
#[derive(Debug, Clone, PartialEq)]
pub struct EnrichedSet {
    /// Bookmark rows with derived fields filled in.
    pub bookmarks: Vec<Bookmark>,
    /// Pages with visual titles and action names filled in.
    pub pages: Vec<Page>,
    /// Captured visuals with page names filled in.
    pub visuals: Vec<Visual>,
    /// Everything recorded along the way.
    pub diagnostics: Diagnostics,
}

impl EnrichedSet {
    /// Aggregate view of the run's diagnostics.
    pub fn summary(&self) -> DiagnosticSummary {
        self.diagnostics.summary()
    }

    /// Number of bookmark rows flagged as orphaned.
    pub fn orphaned_bookmarks(&self) -> usize {
        self.bookmarks.iter().filter(|b| b.orphaned).count()
    }
}

impl<Stage> Reconciler<Stage> {
    /// Records in their current state.
    pub const fn records(&self) -> &RecordSet {
        &self.records
    }

    /// The run's identifier index.
    pub const fn index(&self) -> &IdentifierIndex {
        &self.index
    }

    /// Issues recorded so far.
    pub const fn diagnostics(&self) -> &Diagnostics {
        &self.diagnostics
    }

    fn advance<Next>(self) -> Reconciler<Next> {
        Reconciler {
            records: self.records,
            index: self.index,
            diagnostics: self.diagnostics,
            _stage: PhantomData,
        }
    }
}

impl Reconciler<Indexed> {
    /// Remove duplicate records and index the rest.
    pub fn new(mut records: RecordSet, mut diagnostics: Diagnostics) -> Self {
        let index = IdentifierIndex::build(&mut records, &mut diagnostics);
        Self {
            records,
            index,
            diagnostics,
            _stage: PhantomData,
        }
    }

    /// Pass 1: fill every field that has a direct authoritative source.
    pub fn resolve_direct(mut self) -> Reconciler<DirectlyResolved> {
        self.resolve_visual_pages();
        self.resolve_page_visuals();
        debug!("direct resolution complete");
        self.advance()
    }

    fn resolve_visual_pages(&mut self) {
        let Self {
            records,
            index,
            diagnostics,
            ..
        } = self;
        for visual in &mut records.visuals {
            match index.page(&visual.page_id) {
                Some(pos) => visual.page_name = Resolution::Resolved(records.pages[pos].name.clone()),
                None => diagnostics.unresolved(
                    SourceKind::Visuals,
                    &visual.key().to_string(),
                    format!("page '{}' is not in the page definitions", visual.page_id),
                ),
            }
        }
    }

    fn resolve_page_visuals(&mut self) {
        let Self {
            records,
            index,
            diagnostics,
            ..
        } = self;
        let page_names: Vec<String> = records.pages.iter().map(|p| p.name.clone()).collect();

        for page in &mut records.pages {
            for visual in &mut page.visuals {
                let key = format!("{}/{}", page.id, visual.id);
                match index.visual(&page.id, &visual.id) {
                    Some(pos) => visual.title = records.visuals[pos].title.clone().into(),
                    None => diagnostics.unresolved(
                        SourceKind::Pages,
                        &key,
                        "no captured visual with this page and id",
                    ),
                }

                for action in &mut visual.actions {
                    let Some(target) = action.target.as_deref() else {
                        continue;
                    };
                    let name = match action.kind {
                        ActionKind::PageNavigation | ActionKind::Tooltip => {
                            index.page(target).map(|pos| page_names[pos].clone())
                        },
                        ActionKind::Bookmark => index.bookmark_name(target).map(str::to_string),
                        ActionKind::Unknown => continue,
                    };
                    if name.is_none() {
                        diagnostics.unresolved(
                            SourceKind::Pages,
                            &key,
                            format!("{} target '{target}' matches nothing", action.kind.label()),
                        );
                    }
                    action.target_name = name.into();
                }
            }
        }
    }
}

impl Reconciler<DirectlyResolved> {
    /// Pass 2: copy visual-derived fields onto every bookmark row.
    pub fn propagate(mut self) -> Reconciler<Propagated> {
        let Self {
            records,
            index,
            diagnostics,
            ..
        } = &mut self;

        for bookmark in &mut records.bookmarks {
            let fallback_type: Resolution<VisualType> = Some(bookmark.recorded_type.clone())
                .filter(|t| !t.is_unknown())
                .into();

            let Some(visual_id) = bookmark.key.visual_id.as_deref() else {
                bookmark.orphaned = true;
                bookmark.visual_type = fallback_type;
                continue;
            };

            // A page the report defines scopes the lookup to that page.
            let known_page = bookmark
                .page_id
                .as_deref()
                .filter(|page_id| index.page(page_id).is_some());
            let found = if let Some(page_id) = known_page {
                index
                    .visual(page_id, visual_id)
                    .ok_or("no captured visual with this id on the bookmark's page")
            } else {
                let by_page = bookmark
                    .page_id
                    .as_deref()
                    .and_then(|page_id| index.visual(page_id, visual_id));
                match by_page {
                    Some(pos) => Ok(pos),
                    None => match index.visual_global(visual_id) {
                        GlobalLookup::Found(pos) => Ok(pos),
                        GlobalLookup::Ambiguous => Err("visual id exists on several pages"),
                        GlobalLookup::Missing => Err("no captured visual with this id"),
                    },
                }
            };

            match found {
                Ok(pos) => {
                    let visual = &records.visuals[pos];
                    bookmark.visual_title = visual.title.clone().into();
                    bookmark.page_name = visual.page_name.clone();
                    bookmark.visual_type = if visual.visual_type == VisualType::Unknown {
                        fallback_type
                    } else {
                        Resolution::Resolved(visual.visual_type.clone())
                    };
                },
                Err(reason) => {
                    bookmark.orphaned = true;
                    bookmark.visual_type = fallback_type;
                    diagnostics.unresolved(SourceKind::Bookmarks, &bookmark.key.to_string(), reason);
                },
            }
        }

        debug!("propagation complete");
        self.advance()
    }
}

impl Reconciler<Propagated> {
    /// Release the enriched records.
    pub fn finish(self) -> EnrichedSet {
        let enriched = EnrichedSet {
            bookmarks: self.records.bookmarks,
            pages: self.records.pages,
            visuals: self.records.visuals,
            diagnostics: self.diagnostics,
        };
        info!(
            bookmarks = enriched.bookmarks.len(),
            orphaned = enriched.orphaned_bookmarks(),
            pages = enriched.pages.len(),
            visuals = enriched.visuals.len(),
            issues = enriched.diagnostics.issues().len(),
            "reconciliation finished"
        );
        enriched
    }
}

/// Run every stage over `records`.
pub fn reconcile(records: RecordSet, diagnostics: Diagnostics) -> EnrichedSet {
    Reconciler::new(records, diagnostics)
        .resolve_direct()
        .propagate()
        .finish()
}
