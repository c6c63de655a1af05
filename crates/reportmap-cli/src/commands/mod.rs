//! Command implementations for the reportmap CLI.

mod capture;
mod config;
mod reconcile;

pub use capture::{inspect as capture_inspect, script as capture_script};
pub use config::execute as config;
pub use reconcile::execute as reconcile;

use anyhow::Result;
use reportmap_core::Config;
use std::path::Path;

use crate::error::CliError;

/// Effective configuration for a command.
pub fn load_config(explicit: Option<&Path>) -> Result<Config> {
    let config = match explicit {
        Some(path) => Config::load_with_path(path),
        None => Config::load(),
    };
    config.map_err(|e| CliError::from(e).into())
}
