//! End-to-end properties of the reconciliation pipeline.

#![allow(clippy::unwrap_used)]

use proptest::prelude::*;
use reportmap_core::export::{BOOKMARKS_SHEET, PAGES_SHEET};
use reportmap_core::source::{RawBookmarkEntry, RawPageEntry, RawPageVisualEntry, RawVisualEntry};
use reportmap_core::{Cell, ExportOptions, Resolution, RunOutput, Sources, run};

type Inputs = (Vec<RawBookmarkEntry>, Vec<RawPageEntry>, Vec<RawVisualEntry>);

fn execute(inputs: &Inputs) -> RunOutput {
    let (mut bookmarks, mut pages, mut visuals) = inputs.clone();
    run(
        Sources {
            bookmarks: &mut bookmarks,
            pages: &mut pages,
            visuals: &mut visuals,
        },
        &ExportOptions::default(),
    )
    .unwrap()
}

fn page(id: &str, name: &str, visuals: &[&str]) -> RawPageEntry {
    RawPageEntry {
        id: Some(id.to_string()),
        display_name: Some(name.to_string()),
        visuals: visuals
            .iter()
            .map(|v| RawPageVisualEntry {
                id: Some((*v).to_string()),
                ..RawPageVisualEntry::default()
            })
            .collect(),
    }
}

fn visual(page_id: &str, name: &str, title: Option<&str>) -> RawVisualEntry {
    RawVisualEntry {
        page_id: Some(page_id.to_string()),
        name: Some(name.to_string()),
        visual_type: Some("lineChart".to_string()),
        title: title.map(str::to_string),
        layout: None,
    }
}

fn bookmark(id: &str, visual_id: Option<&str>, page_id: Option<&str>) -> RawBookmarkEntry {
    RawBookmarkEntry {
        bookmark_id: Some(id.to_string()),
        name: Some(format!("{id} name")),
        page_id: page_id.map(str::to_string),
        visual_id: visual_id.map(str::to_string),
        ..RawBookmarkEntry::default()
    }
}

fn inputs() -> impl Strategy<Value = Inputs> {
    let pages = 1usize..4;
    let visuals = prop::collection::vec(
        (0usize..4, 0usize..6, prop::option::of("[A-Z][a-z]{0,6}")),
        0..12,
    );
    let bookmarks = prop::collection::vec(
        (0usize..5, prop::option::of(0usize..8), prop::option::of(0usize..5)),
        0..12,
    );
    (pages, visuals, bookmarks).prop_map(|(page_count, visuals, bookmarks)| {
        let pages = (0..page_count)
            .map(|p| page(&format!("P{p}"), &format!("Page {p}"), &[]))
            .collect();
        let visuals = visuals
            .into_iter()
            .map(|(p, v, title)| visual(&format!("P{p}"), &format!("V{v}"), title.as_deref()))
            .collect();
        let bookmarks = bookmarks
            .into_iter()
            .map(|(b, v, p)| {
                bookmark(
                    &format!("B{b}"),
                    v.map(|v| format!("V{v}")).as_deref(),
                    p.map(|p| format!("P{p}")).as_deref(),
                )
            })
            .collect();
        (bookmarks, pages, visuals)
    })
}

#[test]
fn test_worked_example() {
    let inputs = (
        vec![
            bookmark("B1", Some("V9"), Some("P2")),
            bookmark("B2", None, Some("P2")),
        ],
        vec![page("P2", "Overview", &["V9"])],
        vec![visual("P2", "V9", Some("Sales Trend"))],
    );
    let output = execute(&inputs);
    let sheet = output.workbook.sheet(BOOKMARKS_SHEET).unwrap();

    assert_eq!(sheet.cell(0, "Visual Title"), Some(&Cell::Text("Sales Trend".into())));
    assert_eq!(sheet.cell(0, "Page Name"), Some(&Cell::Text("Overview".into())));
    assert_eq!(sheet.cell(0, "Orphaned"), Some(&Cell::Text("No".into())));

    assert_eq!(sheet.cell(1, "Visual Title"), Some(&Cell::Text("N/A".into())));
    assert_eq!(sheet.cell(1, "Page Name"), Some(&Cell::Text("N/A".into())));
    assert_eq!(sheet.cell(1, "Orphaned"), Some(&Cell::Text("Yes".into())));

    let pages = output.workbook.sheet(PAGES_SHEET).unwrap();
    assert_eq!(pages.cell(0, "Visual Title"), Some(&Cell::Text("Sales Trend".into())));
}

#[test]
fn test_null_title_propagates_as_unresolved() {
    let inputs = (
        vec![
            bookmark("B1", Some("V1"), None),
            bookmark("B2", Some("V1"), Some("P1")),
        ],
        vec![page("P1", "Detail", &["V1"])],
        vec![visual("P1", "V1", None)],
    );
    let output = execute(&inputs);
    for row in &output.enriched.bookmarks {
        assert_eq!(row.visual_title, Resolution::Unresolved);
        assert_eq!(row.page_name, Resolution::Resolved("Detail".to_string()));
        assert!(!row.orphaned);
    }
}

#[test]
fn test_bookmark_page_without_the_visual_is_orphaned() {
    let inputs = (
        vec![bookmark("B1", Some("V1"), Some("P1"))],
        vec![page("P1", "Main", &[]), page("P2", "Other", &["V1"])],
        vec![visual("P2", "V1", Some("Elsewhere"))],
    );
    let output = execute(&inputs);
    let row = &output.enriched.bookmarks[0];
    assert!(row.orphaned);
    assert_eq!(row.visual_title, Resolution::Unresolved);
    assert_eq!(row.page_name, Resolution::Unresolved);

    let sheet = output.workbook.sheet(BOOKMARKS_SHEET).unwrap();
    assert_eq!(sheet.cell(0, "Orphaned"), Some(&Cell::Text("Yes".into())));
}

proptest! {
    #[test]
    fn prop_idempotent_output(inputs in inputs()) {
        let first = execute(&inputs);
        let second = execute(&inputs);
        prop_assert_eq!(&first.workbook, &second.workbook);
        prop_assert_eq!(first.workbook.to_json().unwrap(), second.workbook.to_json().unwrap());
    }

    #[test]
    fn prop_bookmarks_agree_with_their_visual(inputs in inputs()) {
        let output = execute(&inputs);
        let enriched = &output.enriched;
        for row in enriched.bookmarks.iter().filter(|b| !b.orphaned) {
            let vid = row.visual_id().unwrap();
            let matched = enriched.visuals.iter().find(|v| {
                v.id == vid
                    && Resolution::from(v.title.clone()) == row.visual_title
                    && v.page_name == row.page_name
            });
            prop_assert!(matched.is_some(), "no visual explains bookmark {}", row.key);

            // Transitivity: a resolved page name is the owning page's name.
            if let (Some(visual), Some(name)) = (matched, row.page_name.value()) {
                let owner = enriched.pages.iter().find(|p| p.id == visual.page_id).unwrap();
                prop_assert_eq!(&owner.name, name);
            }
        }
    }

    #[test]
    fn prop_unmatched_reference_is_orphaned(inputs in inputs()) {
        let output = execute(&inputs);
        let enriched = &output.enriched;
        for row in &enriched.bookmarks {
            let known = row
                .visual_id()
                .is_some_and(|vid| enriched.visuals.iter().any(|v| v.id == vid));
            if !known {
                prop_assert!(row.orphaned);
                prop_assert_eq!(&row.visual_title, &Resolution::Unresolved);
                prop_assert_eq!(&row.page_name, &Resolution::Unresolved);
            }
        }
    }

    #[test]
    fn prop_rows_follow_input_order(inputs in inputs()) {
        let output = execute(&inputs);
        let mut expected: Vec<(String, Option<String>)> = Vec::new();
        for raw in &inputs.0 {
            let key = (raw.bookmark_id.clone().unwrap(), raw.visual_id.clone());
            if !expected.contains(&key) {
                expected.push(key);
            }
        }
        let sheet = output.workbook.sheet(BOOKMARKS_SHEET).unwrap();
        let actual: Vec<(String, Option<String>)> = (0..sheet.rows.len())
            .map(|i| {
                let id = sheet.cell(i, "Bookmark ID").unwrap().to_string();
                let visual = match sheet.cell(i, "Visual ID").unwrap() {
                    Cell::Empty => None,
                    cell => Some(cell.to_string()),
                };
                (id, visual)
            })
            .collect();
        prop_assert_eq!(actual, expected);
    }
}
