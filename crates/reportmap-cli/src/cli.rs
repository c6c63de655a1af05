//! # CLI Structure and Argument Parsing
//!
//! `reportmap` reads a Power BI report's bookmark and page definitions plus a
//! capture of the rendered visuals, joins them, and writes one consolidated
//! workbook.
//!
//! ## Usage Patterns
//!
//! ```bash
//! # Print the capture script for every page of a project
//! reportmap capture script --project ./Sales.Report > capture.js
//!
//! # Reconcile a project with a saved console capture
//! reportmap reconcile --project ./Sales.Report --capture console.log --output report.xlsx
//!
//! # Point at the folders directly and print a summary
//! reportmap reconcile --bookmarks ./definition/bookmarks --pages ./definition/pages
//!
//! # Check what a capture log contains
//! reportmap capture inspect console.log --format json
//! ```
//!
//! ## Exit Codes
//!
//! See [`crate::error::ErrorCategory`]. `--strict` turns recorded warnings
//! into exit code 6.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::output::OutputFormat;

/// Main CLI structure for the `reportmap` command
#[derive(Parser, Clone, Debug)]
#[command(name = "reportmap")]
#[command(version)]
#[command(
    about = "reportmap - consolidate Power BI bookmarks, pages and visuals",
    long_about = None
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Show debug logging on stderr
    #[arg(short = 'v', long, global = true)]
    pub verbose: bool,

    /// Suppress informational messages (only show errors)
    #[arg(short = 'q', long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Disable all ANSI colors in output (also respects `NO_COLOR` env)
    #[arg(long = "no-color", global = true)]
    pub no_color: bool,

    /// Path to configuration file (overrides autodiscovery). Also via `REPORTMAP_CONFIG`.
    #[arg(long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,
}

/// Available subcommands
#[derive(Subcommand, Clone, Debug)]
pub enum Commands {
    /// Join bookmarks, pages and captured visuals into one workbook
    Reconcile(ReconcileArgs),

    /// Work with visual captures from the rendered report
    Capture {
        #[command(subcommand)]
        command: CaptureCommands,
    },

    /// Inspect or create the configuration file
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
}

/// Arguments for `reportmap reconcile`
#[derive(clap::Args, Clone, Debug)]
pub struct ReconcileArgs {
    /// Report folder (`*.Report`, its `definition` folder, or a PBIP root)
    #[arg(short = 'p', long, value_name = "DIR")]
    pub project: Option<PathBuf>,

    /// Bookmarks folder (overrides the one found under --project)
    #[arg(long, value_name = "DIR")]
    pub bookmarks: Option<PathBuf>,

    /// Pages folder (overrides the one found under --project)
    #[arg(long, value_name = "DIR")]
    pub pages: Option<PathBuf>,

    /// Console output saved from the capture script
    #[arg(short = 'c', long, value_name = "FILE")]
    pub capture: Option<PathBuf>,

    /// Where to write the workbook (stdout when omitted)
    #[arg(short = 'o', long, value_name = "FILE")]
    pub output: Option<PathBuf>,

    /// Output format (inferred from --output when omitted)
    #[arg(short = 'f', long, value_enum)]
    pub format: Option<OutputFormat>,

    /// Text written for values that could not be resolved
    #[arg(long, value_name = "TEXT")]
    pub marker: Option<String>,

    /// Leave out the Diagnostics sheet
    #[arg(long)]
    pub no_diagnostics: bool,

    /// Exit with code 6 when any warning was recorded
    #[arg(long)]
    pub strict: bool,
}

/// Subcommands of `reportmap capture`
#[derive(Subcommand, Clone, Debug)]
pub enum CaptureCommands {
    /// Print the browser-console script that captures visuals
    Script {
        /// Page ids to capture (repeatable)
        #[arg(long = "page", value_name = "ID")]
        pages: Vec<String>,

        /// Take page ids from this report folder
        #[arg(short = 'p', long, value_name = "DIR")]
        project: Option<PathBuf>,
    },

    /// Summarize what a saved capture contains
    Inspect {
        /// Console output saved from the capture script
        log: PathBuf,

        /// Output format
        #[arg(short = 'f', long, value_enum, default_value = "text")]
        format: InspectFormat,
    },
}

/// Subcommands of `reportmap config`
#[derive(Subcommand, Clone, Debug)]
pub enum ConfigCommands {
    /// Print the effective configuration as TOML
    Show,
    /// Print where the configuration file is looked up
    Path,
    /// Write a default configuration file
    Init {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}

/// Formats for `capture inspect`
#[derive(Clone, Copy, Debug, PartialEq, Eq, clap::ValueEnum)]
pub enum InspectFormat {
    /// Human-readable summary
    Text,
    /// JSON object
    Json,
}

impl Cli {
    /// Whether the selected command writes JSON to stdout.
    pub fn emits_json(&self) -> bool {
        match &self.command {
            Commands::Reconcile(args) => {
                args.output.is_none() && args.format == Some(OutputFormat::Json)
            },
            Commands::Capture {
                command: CaptureCommands::Inspect { format, .. },
            } => *format == InspectFormat::Json,
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_reconcile_flags_parse() {
        let cli = Cli::try_parse_from([
            "reportmap",
            "reconcile",
            "--project",
            "Sales.Report",
            "--capture",
            "console.log",
            "--format",
            "json",
            "--marker",
            "?",
            "--strict",
        ])
        .unwrap_or_else(|e| panic!("{e}"));
        let Commands::Reconcile(args) = &cli.command else {
            panic!("expected reconcile");
        };
        assert_eq!(args.format, Some(OutputFormat::Json));
        assert_eq!(args.marker.as_deref(), Some("?"));
        assert!(args.strict);
        assert!(cli.emits_json());
    }

    #[test]
    fn test_quiet_conflicts_with_verbose() {
        assert!(Cli::try_parse_from(["reportmap", "-v", "-q", "config", "path"]).is_err());
    }
}
