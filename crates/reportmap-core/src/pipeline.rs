//! One complete run: load, normalize, reconcile, render.
//!
//! A source that fails to load contributes an empty collection and a
//! `SourceUnavailable` issue. The run only fails when no source could be
//! loaded at all.

use tracing::{info, warn};

use crate::diagnostics::{DiagnosticSummary, Diagnostics, SourceKind};
use crate::export::{ExportOptions, Workbook};
use crate::index::RecordSet;
use crate::normalize::{normalize_bookmarks, normalize_pages, normalize_visuals};
use crate::reconcile::{EnrichedSet, reconcile};
use crate::source::{BookmarkSource, PageSource, Rejected, VisualSource};
use crate::{Error, Result};

/// The three inputs of a run.
pub struct Sources<'a> {
    /// Bookmark rows.
    pub bookmarks: &'a mut dyn BookmarkSource,
    /// Page definitions.
    pub pages: &'a mut dyn PageSource,
    /// Captured visuals.
    pub visuals: &'a mut dyn VisualSource,
}

/// Everything a run produces.
#[derive(Debug, Clone, PartialEq)]
pub struct RunOutput {
    /// Enriched records and their diagnostics.
    pub enriched: EnrichedSet,
    /// Rendered sheets.
    pub workbook: Workbook,
    /// Aggregate diagnostics.
    pub summary: DiagnosticSummary,
}

fn load_collection<T>(
    kind: SourceKind,
    loaded: Result<Vec<T>>,
    rejected: Vec<Rejected>,
    diagnostics: &mut Diagnostics,
) -> Option<Vec<T>> {
    for item in rejected {
        diagnostics.malformed(
            kind,
            Some(&item.location),
            format!("skipped {}: {}", item.location, item.reason),
        );
    }
    match loaded {
        Ok(entries) => Some(entries),
        Err(e) => {
            warn!(source = %kind, error = %e, "source unavailable");
            diagnostics.source_unavailable(kind, e.to_string());
            None
        },
    }
}

/// Run the whole pipeline over `sources`.
///
/// # Errors
///
/// Returns [`Error::NoUsableInput`] when none of the three sources could be
/// loaded.
pub fn run(sources: Sources<'_>, options: &ExportOptions) -> Result<RunOutput> {
    let Sources {
        bookmarks: bookmark_source,
        pages: page_source,
        visuals: visual_source,
    } = sources;
    let mut diagnostics = Diagnostics::new();

    let loaded = bookmark_source.load();
    let bookmarks = load_collection(
        SourceKind::Bookmarks,
        loaded,
        bookmark_source.rejected(),
        &mut diagnostics,
    );
    let loaded = page_source.load();
    let pages = load_collection(
        SourceKind::Pages,
        loaded,
        page_source.rejected(),
        &mut diagnostics,
    );
    let loaded = visual_source.load();
    let visuals = load_collection(
        SourceKind::Visuals,
        loaded,
        visual_source.rejected(),
        &mut diagnostics,
    );

    if bookmarks.is_none() && pages.is_none() && visuals.is_none() {
        return Err(Error::NoUsableInput);
    }

    let records = RecordSet {
        bookmarks: normalize_bookmarks(bookmarks.unwrap_or_default(), &mut diagnostics),
        pages: normalize_pages(pages.unwrap_or_default(), &mut diagnostics),
        visuals: normalize_visuals(visuals.unwrap_or_default(), &mut diagnostics),
    };

    let enriched = reconcile(records, diagnostics);
    let workbook = Workbook::from_enriched(&enriched, options);
    let summary = enriched.summary();

    info!(
        issues = summary.total_issues,
        warnings = summary.warnings,
        unavailable = summary.unavailable_sources.len(),
        sheets = workbook.sheets.len(),
        "run complete"
    );

    Ok(RunOutput {
        enriched,
        workbook,
        summary,
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::diagnostics::IssueKind;
    use crate::source::{RawBookmarkEntry, RawPageEntry, RawVisualEntry, Unavailable};

    struct Flaky {
        entries: Vec<RawVisualEntry>,
    }

    impl VisualSource for Flaky {
        fn load(&mut self) -> Result<Vec<RawVisualEntry>> {
            Ok(self.entries.clone())
        }

        fn rejected(&mut self) -> Vec<Rejected> {
            vec![Rejected {
                location: "capture.log:3".to_string(),
                reason: "truncated object".to_string(),
            }]
        }
    }

    fn visual(page: &str, name: &str, title: &str) -> RawVisualEntry {
        RawVisualEntry {
            page_id: Some(page.to_string()),
            name: Some(name.to_string()),
            visual_type: Some("card".to_string()),
            title: Some(title.to_string()),
            layout: None,
        }
    }

    #[test]
    fn test_all_sources_unavailable_is_fatal() {
        let mut bookmarks = Unavailable::new("bookmarks", "missing");
        let mut pages = Unavailable::new("pages", "missing");
        let mut visuals = Unavailable::new("visuals", "missing");
        let err = run(
            Sources {
                bookmarks: &mut bookmarks,
                pages: &mut pages,
                visuals: &mut visuals,
            },
            &ExportOptions::default(),
        )
        .unwrap_err();
        assert!(matches!(err, Error::NoUsableInput));
    }

    #[test]
    fn test_partial_input_still_produces_workbook() {
        let mut bookmarks = vec![RawBookmarkEntry {
            bookmark_id: Some("B1".to_string()),
            name: Some("Focus".to_string()),
            visual_id: Some("V1".to_string()),
            ..RawBookmarkEntry::default()
        }];
        let mut pages = Unavailable::new("pages", "no definition/pages folder");
        let mut visuals = Flaky {
            entries: vec![visual("P1", "V1", "Revenue")],
        };

        let output = run(
            Sources {
                bookmarks: &mut bookmarks,
                pages: &mut pages,
                visuals: &mut visuals,
            },
            &ExportOptions::default(),
        )
        .unwrap();

        assert_eq!(output.summary.unavailable_sources, vec![SourceKind::Pages]);
        assert_eq!(
            output
                .enriched
                .diagnostics
                .issues_of(IssueKind::MalformedRecord)
                .count(),
            1
        );
        let bookmark = &output.enriched.bookmarks[0];
        assert_eq!(bookmark.visual_title.value().map(String::as_str), Some("Revenue"));
        // Pages are missing, so the page name cannot be derived.
        assert!(!bookmark.page_name.is_resolved());
        assert_eq!(output.workbook.sheets.len(), 4);
    }

    #[test]
    fn test_empty_sources_are_not_unavailable() {
        let mut bookmarks: Vec<RawBookmarkEntry> = Vec::new();
        let mut pages: Vec<RawPageEntry> = Vec::new();
        let mut visuals: Vec<RawVisualEntry> = Vec::new();
        let output = run(
            Sources {
                bookmarks: &mut bookmarks,
                pages: &mut pages,
                visuals: &mut visuals,
            },
            &ExportOptions::default(),
        )
        .unwrap();
        assert_eq!(output.summary.total_issues, 0);
        assert!(output.workbook.sheets.iter().all(|s| s.rows.is_empty()));
    }
}
