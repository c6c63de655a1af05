//! Text output formatting

use colored::Colorize;
use reportmap_core::source::capture::CaptureStats;
use reportmap_core::{DiagnosticSummary, RunOutput, SourceKind};
use std::fmt::Write as _;

/// Terminal summary of a run.
pub fn render_run(output: &RunOutput) -> String {
    let mut out = String::new();
    let enriched = &output.enriched;

    let _ = writeln!(out, "{}", "Consolidated report".bold());
    for sheet in &output.workbook.sheets {
        let _ = writeln!(out, "  {:<12} {:>6} rows", sheet.name, sheet.rows.len());
    }

    let orphaned = enriched.orphaned_bookmarks();
    if orphaned > 0 {
        let _ = writeln!(
            out,
            "  {} bookmark rows reference no captured visual",
            orphaned.to_string().yellow()
        );
    }

    render_summary(&mut out, &output.summary);
    out
}

fn render_summary(out: &mut String, summary: &DiagnosticSummary) {
    if summary.total_issues == 0 {
        let _ = writeln!(out, "{}", "No issues recorded".green());
        return;
    }

    let _ = writeln!(
        out,
        "{} issues ({} warnings)",
        summary.total_issues,
        summary.warnings.to_string().yellow()
    );
    for (kind, count) in &summary.by_kind {
        let _ = writeln!(out, "  {kind:<22} {count:>6}");
    }
    for source in &summary.unavailable_sources {
        let _ = writeln!(out, "  {} {source} unavailable", "!".red().bold());
    }
    for source in SourceKind::ALL {
        let stats = summary.stats.get(source);
        if stats.dropped + stats.duplicates + stats.coerced > 0 {
            let _ = writeln!(
                out,
                "  {source}: {} dropped, {} duplicates, {} coerced",
                stats.dropped, stats.duplicates, stats.coerced
            );
        }
    }
}

/// Terminal summary of a capture inspection.
pub fn render_capture(stats: &CaptureStats, pages: &[(String, usize)]) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{}", "Capture log".bold());
    let _ = writeln!(out, "  JSON objects   {:>6}", stats.objects);
    let _ = writeln!(out, "  visuals        {:>6}", stats.visuals);
    let _ = writeln!(out, "  skipped        {:>6}", stats.skipped_objects);
    let _ = writeln!(out, "  noise lines    {:>6}", stats.noise_lines);
    if !pages.is_empty() {
        let _ = writeln!(out, "{}", "Visuals per page".bold());
        for (page, count) in pages {
            let _ = writeln!(out, "  {page:<32} {count:>6}");
        }
    }
    out
}
