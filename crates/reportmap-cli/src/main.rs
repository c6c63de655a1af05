//! reportmap CLI - consolidate Power BI report metadata
//!
//! Entry point for the `reportmap` command-line interface. Command
//! implementations live in [`commands`]; exit codes are defined in [`error`].

use anyhow::Result;
use clap::Parser;
use std::process::ExitCode;

mod cli;
mod commands;
mod error;
mod output;
mod utils;

use cli::{CaptureCommands, Cli, Commands};
use error::exit_code_from_error;
use utils::logging::initialize_logging;

fn main() -> ExitCode {
    let cli = Cli::parse();

    if let Err(e) = initialize_logging(&cli) {
        eprintln!("failed to initialize logging: {e}");
    }

    match execute_command(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e:#}");
            ExitCode::from(exit_code_from_error(&e))
        },
    }
}

fn execute_command(cli: &Cli) -> Result<()> {
    let config_path = cli.config.as_deref();
    match &cli.command {
        Commands::Reconcile(args) => commands::reconcile(args, config_path, cli.quiet),
        Commands::Capture { command } => match command {
            CaptureCommands::Script { pages, project } => {
                let config = commands::load_config(config_path)?;
                commands::capture_script(pages, project.as_deref(), &config)
            },
            CaptureCommands::Inspect { log, format } => commands::capture_inspect(log, *format),
        },
        Commands::Config { command } => commands::config(command, config_path),
    }
}
