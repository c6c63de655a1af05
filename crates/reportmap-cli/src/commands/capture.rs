//! `reportmap capture`: generate the capture script and inspect saved logs.

use anyhow::{Result, anyhow};
use reportmap_core::source::capture::{CaptureLog, capture_script};
use reportmap_core::source::project::ReportProject;
use reportmap_core::{Config, VisualSource};
use serde_json::json;
use std::collections::BTreeMap;
use std::path::Path;

use crate::cli::InspectFormat;
use crate::error::CliError;
use crate::output::text;

/// Print the capture script for the given pages.
pub fn script(pages: &[String], project: Option<&Path>, config: &Config) -> Result<()> {
    let mut page_ids = pages.to_vec();
    if let Some(root) = project {
        let project = ReportProject::discover(root, &config.scan).map_err(CliError::from)?;
        let mut source = project.page_source(&config.scan);
        let entries = source.load().map_err(CliError::from)?;
        page_ids.extend(entries.into_iter().filter_map(|page| page.id));
    }
    if page_ids.is_empty() {
        return Err(CliError::usage(anyhow!("missing required page ids: pass --page or --project")).into());
    }
    let mut seen = std::collections::HashSet::new();
    page_ids.retain(|id| seen.insert(id.clone()));

    print!("{}", capture_script(&page_ids));
    Ok(())
}

/// Summarize a saved capture log.
pub fn inspect(log: &Path, format: InspectFormat) -> Result<()> {
    if !log.is_file() {
        return Err(CliError::not_found(anyhow!("capture log not found: {}", log.display())).into());
    }
    let mut capture = CaptureLog::from_path(log);
    let entries = capture.load().map_err(CliError::from)?;
    let rejected = capture.rejected();

    let mut per_page: BTreeMap<String, usize> = BTreeMap::new();
    for entry in &entries {
        let page = entry.page_id.clone().unwrap_or_else(|| "(no page)".to_string());
        *per_page.entry(page).or_default() += 1;
    }
    let stats = capture.stats();

    match format {
        InspectFormat::Json => {
            let doc = json!({
                "stats": stats,
                "pages": per_page,
                "rejected": rejected,
            });
            println!("{}", serde_json::to_string_pretty(&doc)?);
        },
        InspectFormat::Text => {
            let pages: Vec<(String, usize)> = per_page.into_iter().collect();
            print!("{}", text::render_capture(&stats, &pages));
            for item in &rejected {
                println!("  rejected {}: {}", item.location, item.reason);
            }
        },
    }
    Ok(())
}
