//! `reportmap config`: show, locate or create the configuration file.

use anyhow::{Result, anyhow};
use reportmap_core::Config;
use std::path::Path;

use super::load_config;
use crate::cli::ConfigCommands;
use crate::error::CliError;

/// Execute a config subcommand.
pub fn execute(command: &ConfigCommands, config_path: Option<&Path>) -> Result<()> {
    match command {
        ConfigCommands::Show => {
            let config = load_config(config_path)?;
            print!("{}", toml::to_string_pretty(&config)?);
        },
        ConfigCommands::Path => {
            let path = match config_path {
                Some(path) => path.to_path_buf(),
                None => Config::config_path().map_err(CliError::from)?,
            };
            println!("{}", path.display());
        },
        ConfigCommands::Init { force } => {
            let path = match config_path {
                Some(path) => path.to_path_buf(),
                None => Config::config_path().map_err(CliError::from)?,
            };
            if path.exists() && !force {
                return Err(CliError::usage(anyhow!(
                    "cannot use existing config {} (pass --force to overwrite)",
                    path.display()
                ))
                .into());
            }
            Config::default().save_to(&path).map_err(CliError::from)?;
            println!("Wrote {}", path.display());
        },
    }
    Ok(())
}
