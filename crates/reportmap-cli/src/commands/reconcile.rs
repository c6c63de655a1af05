//! `reportmap reconcile`: load, join and export.

use anyhow::{Context, Result, anyhow};
use reportmap_core::source::bookmarks::BookmarkFolder;
use reportmap_core::source::capture::CaptureLog;
use reportmap_core::source::pages::PageFolder;
use reportmap_core::source::project::ReportProject;
use reportmap_core::source::Unavailable;
use reportmap_core::{
    BookmarkSource, ExportOptions, PageSource, RunOutput, ScanConfig, Sources, VisualSource, run,
};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use super::load_config;
use crate::cli::ReconcileArgs;
use crate::error::CliError;
use crate::output::{OutputFormat, json, text, xlsx};

/// Execute the reconcile command.
pub fn execute(args: &ReconcileArgs, config_path: Option<&Path>, quiet: bool) -> Result<()> {
    if args.project.is_none() && args.bookmarks.is_none() && args.pages.is_none() && args.capture.is_none() {
        return Err(CliError::usage(anyhow!(
            "missing required input: pass --project, --bookmarks, --pages or --capture"
        ))
        .into());
    }
    let format = OutputFormat::resolve(args.format, args.output.as_deref());
    if format == OutputFormat::Xlsx && args.output.is_none() {
        return Err(CliError::usage(anyhow!("cannot use --format xlsx without --output")).into());
    }

    let config = load_config(config_path)?;
    let mut options = ExportOptions::from(&config.export);
    if let Some(marker) = &args.marker {
        options.unresolved_marker.clone_from(marker);
    }
    if args.no_diagnostics {
        options.include_diagnostics = false;
    }

    let project = args
        .project
        .as_deref()
        .map(|root| ReportProject::discover(root, &config.scan))
        .transpose()
        .map_err(CliError::from)?;

    let mut bookmarks = bookmark_source(args.bookmarks.as_deref(), project.as_ref(), &config.scan)?;
    let mut pages = page_source(args.pages.as_deref(), project.as_ref(), &config.scan)?;
    let mut visuals = visual_source(args.capture.as_deref())?;

    let output = run(
        Sources {
            bookmarks: bookmarks.as_mut(),
            pages: pages.as_mut(),
            visuals: visuals.as_mut(),
        },
        &options,
    )
    .map_err(CliError::from)?;

    write_output(&output, format, args.output.as_deref(), quiet)?;

    if args.strict && output.summary.warnings > 0 {
        return Err(CliError::warnings(anyhow!(
            "{} warnings recorded (--strict)",
            output.summary.warnings
        ))
        .into());
    }
    Ok(())
}

fn require_dir(path: &Path, what: &str) -> Result<PathBuf> {
    if path.is_dir() {
        Ok(path.to_path_buf())
    } else {
        Err(CliError::not_found(anyhow!("{what} folder not found: {}", path.display())).into())
    }
}

fn bookmark_source(
    explicit: Option<&Path>,
    project: Option<&ReportProject>,
    scan: &ScanConfig,
) -> Result<Box<dyn BookmarkSource>> {
    if let Some(dir) = explicit {
        let dir = require_dir(dir, "bookmarks")?;
        return Ok(Box::new(BookmarkFolder::new(&dir, scan.clone())));
    }
    Ok(match project {
        Some(project) => project.bookmark_source(scan),
        None => Box::new(Unavailable::new("bookmarks", "no bookmarks folder given")),
    })
}

fn page_source(
    explicit: Option<&Path>,
    project: Option<&ReportProject>,
    scan: &ScanConfig,
) -> Result<Box<dyn PageSource>> {
    if let Some(dir) = explicit {
        let dir = require_dir(dir, "pages")?;
        return Ok(Box::new(PageFolder::new(&dir, scan.clone())));
    }
    Ok(match project {
        Some(project) => project.page_source(scan),
        None => Box::new(Unavailable::new("pages", "no pages folder given")),
    })
}

fn visual_source(capture: Option<&Path>) -> Result<Box<dyn VisualSource>> {
    match capture {
        Some(path) if path.is_file() => Ok(Box::new(CaptureLog::from_path(path))),
        Some(path) => {
            Err(CliError::not_found(anyhow!("capture log not found: {}", path.display())).into())
        },
        None => Ok(Box::new(Unavailable::new("visuals", "no capture log given"))),
    }
}

fn write_output(output: &RunOutput, format: OutputFormat, path: Option<&Path>, quiet: bool) -> Result<()> {
    let rendered = match format {
        OutputFormat::Xlsx => None,
        OutputFormat::Json => Some(json::render_run(output).map_err(|e| CliError::export(anyhow!(e)))?),
        OutputFormat::Text => Some(text::render_run(output)),
    };

    let Some(path) = path else {
        if let Some(rendered) = rendered {
            print!("{rendered}");
        }
        return Ok(());
    };

    match rendered {
        None => xlsx::write_workbook(&output.workbook, path)
            .map_err(|e| anyhow!(e))
            .with_context(|| format!("writing {}", path.display()))
            .map_err(CliError::export)?,
        Some(rendered) => std::fs::write(path, rendered)
            .with_context(|| format!("writing {}", path.display()))
            .map_err(CliError::export)?,
    }
    info!("wrote {}", path.display());
    debug!(format = ?format, "output written");

    if !quiet && format != OutputFormat::Text {
        print!("{}", text::render_run(output));
        println!("Wrote {}", path.display());
    }
    Ok(())
}
