//! Store configuration parsing and defaults.
//!
//! The control directory carries a small TOML `config` file. Every field has
//! a default, so a missing file (or missing table) is never an error.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Configuration stored in `<control>/config`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Snapshot-engine settings.
    pub snapshot: SnapshotConfig,
    /// Log display settings.
    pub log: LogConfig,
}

/// Settings for the external archive tool.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SnapshotConfig {
    /// Program name or absolute path of the archive tool.
    ///
    /// Bare names are resolved through `PATH` at invocation time.
    pub tool: String,
}

impl Default for SnapshotConfig {
    fn default() -> Self {
        Self {
            tool: "tar".to_string(),
        }
    }
}

/// Settings for the `log` command.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    /// Maximum rows printed per invocation; `0` means unlimited.
    pub default_limit: usize,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self { default_limit: 0 }
    }
}

impl Config {
    /// Loads the configuration, falling back to defaults if the file is
    /// absent.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read or parsed.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config: {}", path.display()))?;
        toml::from_str(&content)
            .with_context(|| format!("failed to parse config: {}", path.display()))
    }

    /// Writes the configuration to `path`.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization or the write fails.
    pub fn save(&self, path: &Path) -> Result<()> {
        let content = toml::to_string_pretty(self).context("failed to serialize config")?;
        std::fs::write(path, content)
            .with_context(|| format!("failed to write config: {}", path.display()))?;
        Ok(())
    }
}
