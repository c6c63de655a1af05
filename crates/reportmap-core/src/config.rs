//! Configuration management for reportmap.
//!
//! Configuration is stored in TOML format and resolved in this order:
//!
//! 1. An explicit path (`--config` on the command line)
//! 2. The `REPORTMAP_CONFIG` environment variable
//! 3. The platform config directory (`config.toml`, see [`Config::config_path`])
//! 4. Built-in defaults
//!
//! `REPORTMAP_UNRESOLVED_MARKER` overrides the marker after the file is read.
//!
//! ## Example
//!
//! ```rust
//! use reportmap_core::Config;
//!
//! let config: Config = toml::from_str(r#"
//! [export]
//! unresolved_marker = "?"
//! "#)?;
//! assert_eq!(config.export.unresolved_marker, "?");
//! assert!(config.export.include_diagnostics);
//! # Ok::<(), toml::de::Error>(())
//! ```

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Environment variable naming an explicit config file.
pub const CONFIG_ENV: &str = "REPORTMAP_CONFIG";

/// Environment variable overriding [`ExportConfig::unresolved_marker`].
pub const MARKER_ENV: &str = "REPORTMAP_UNRESOLVED_MARKER";

/// Default text written in place of an unresolved value.
pub const DEFAULT_UNRESOLVED_MARKER: &str = "N/A";

/// Top-level configuration.
///
/// ## Example Configuration File
///
/// ```toml
/// [export]
/// unresolved_marker = "N/A"
/// include_diagnostics = true
///
/// [scan]
/// ignore_dir_names = [".git", ".pbi"]
/// max_file_bytes = 10485760
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Workbook rendering options.
    pub export: ExportConfig,
    /// Project folder traversal options.
    pub scan: ScanConfig,
}

/// How enriched tables are rendered.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExportConfig {
    /// Text written for unresolved derived fields.
    ///
    /// Must differ from an empty cell so readers can tell "not found" from
    /// "found and empty".
    pub unresolved_marker: String,

    /// Whether the `Diagnostics` sheet is produced.
    pub include_diagnostics: bool,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            unresolved_marker: DEFAULT_UNRESOLVED_MARKER.to_string(),
            include_diagnostics: true,
        }
    }
}

/// How report definition folders are traversed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScanConfig {
    /// Directory names skipped entirely during traversal.
    pub ignore_dir_names: Vec<String>,
    /// Largest definition file read into memory (bytes). Larger files are
    /// reported as malformed and skipped.
    pub max_file_bytes: u64,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            ignore_dir_names: [".git", ".pbi", "node_modules", ".venv", ".idea", ".vscode"]
                .into_iter()
                .map(String::from)
                .collect(),
            max_file_bytes: 10 * 1024 * 1024,
        }
    }
}

impl ScanConfig {
    /// Whether a directory with this name should be skipped.
    pub fn is_ignored(&self, dir_name: &str) -> bool {
        self.ignore_dir_names.iter().any(|name| name == dir_name)
    }
}

impl Config {
    /// Load configuration following the documented resolution order.
    ///
    /// A missing default config file yields defaults; a file named through
    /// `REPORTMAP_CONFIG` must exist.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] when a config file cannot be read or parsed,
    /// and [`Error::NotFound`] when `REPORTMAP_CONFIG` names a missing file.
    pub fn load() -> Result<Self> {
        Self::resolve(None, |key| std::env::var(key).ok())
    }

    /// Load configuration from an explicit path, then apply environment
    /// overrides.
    ///
    /// # Errors
    ///
    /// Fails when the file is missing, unreadable or not valid TOML.
    pub fn load_with_path(path: &Path) -> Result<Self> {
        Self::resolve(Some(path), |key| std::env::var(key).ok())
    }

    /// Resolution with an injectable environment lookup.
    fn resolve(explicit: Option<&Path>, env: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let mut config = if let Some(path) = explicit {
            Self::load_from(path)?
        } else if let Some(path) = env(CONFIG_ENV).filter(|p| !p.trim().is_empty()) {
            Self::load_from(Path::new(&path))?
        } else {
            match Self::config_path() {
                Ok(path) if path.exists() => Self::load_from(&path)?,
                Ok(_) => Self::default(),
                Err(e) => {
                    tracing::debug!("no platform config directory: {e}");
                    Self::default()
                },
            }
        };
        config.apply_overrides(env);
        Ok(config)
    }

    /// Read and parse a TOML config file.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`] for a missing file and [`Error::Config`] for
    /// unreadable or malformed content.
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(Error::NotFound(format!(
                "config file {}",
                path.display()
            )));
        }
        let content = fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("Failed to read config: {e}")))?;
        let config: Self = toml::from_str(&content)
            .map_err(|e| Error::Config(format!("Failed to parse config: {e}")))?;
        tracing::debug!("loaded config from {}", path.display());
        Ok(config)
    }

    /// Apply environment overrides through `env`.
    fn apply_overrides(&mut self, env: impl Fn(&str) -> Option<String>) {
        if let Some(marker) = env(MARKER_ENV) {
            tracing::debug!("unresolved marker overridden by {MARKER_ENV}");
            self.export.unresolved_marker = marker;
        }
    }

    /// Save the configuration to the platform config directory.
    ///
    /// # Errors
    ///
    /// Fails when the config directory cannot be determined or written.
    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::config_path()?)
    }

    /// Serialize to TOML at `path`, creating parent directories.
    ///
    /// # Errors
    ///
    /// Fails when the directory cannot be created or the file written.
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .map_err(|e| Error::Config(format!("Failed to create config directory: {e}")))?;
        }

        let content = toml::to_string_pretty(self)
            .map_err(|e| Error::Config(format!("Failed to serialize config: {e}")))?;

        fs::write(path, content)
            .map_err(|e| Error::Config(format!("Failed to write config: {e}")))?;

        Ok(())
    }

    /// Path of the platform config file.
    ///
    /// - Linux: `~/.config/reportmap/config.toml`
    /// - macOS: `~/Library/Application Support/dev.reportmap.reportmap/config.toml`
    /// - Windows: `%APPDATA%\reportmap\reportmap\config\config.toml`
    ///
    /// # Errors
    ///
    /// Returns an error if the system config directory cannot be determined,
    /// which may happen in sandboxed environments.
    pub fn config_path() -> Result<PathBuf> {
        let project_dirs = directories::ProjectDirs::from("dev", "reportmap", "reportmap")
            .ok_or_else(|| Error::Config("Failed to determine project directories".into()))?;
        Ok(project_dirs.config_dir().join("config.toml"))
    }
}
