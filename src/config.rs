// ABOUTME: Migration tuning configuration
// ABOUTME: Serde-backed defaults, TOML file loading, and validation

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Default location of the per-key failure log, relative to the working
/// directory.
pub const DEFAULT_ERROR_LOG: &str = "redis-keys-migrator-error.log";

/// Tuning knobs for a migration run.
///
/// Every field has a default matching the tool's long-standing behavior.
/// A TOML config file may override any subset of fields, and CLI flags win
/// over the file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct MigratorConfig {
    /// Glob pattern for `SCAN MATCH`.
    pub scan_pattern: String,
    /// `COUNT` hint for each SCAN page.
    pub scan_count: usize,
    /// Queued write operations that trigger a pipeline flush.
    pub pipeline_size: usize,
    /// Already-present keys tolerated before the loop pauses to ease
    /// destination load.
    pub existing_keys_pause_threshold: u64,
    /// Failed keys that abort the run early.
    pub max_failed_keys: u64,
    /// Pause length in seconds, applied after each flush and after each
    /// run of already-present keys.
    pub pause_secs: u64,
    /// Per-key failure log location, truncated at startup.
    pub error_log: PathBuf,
}

impl Default for MigratorConfig {
    fn default() -> Self {
        Self {
            scan_pattern: "*".to_string(),
            scan_count: 1000,
            pipeline_size: 1000,
            existing_keys_pause_threshold: 1000,
            max_failed_keys: 1000,
            pause_secs: 1,
            error_log: PathBuf::from(DEFAULT_ERROR_LOG),
        }
    }
}

impl MigratorConfig {
    /// Load configuration from a TOML file.
    ///
    /// Missing fields fall back to their defaults; unknown fields are
    /// rejected so a typo cannot silently disable a knob.
    pub fn from_file(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        let config: MigratorConfig = toml::from_str(&contents)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;
        config.validate()?;
        Ok(config)
    }

    /// Check that the knobs make sense.
    pub fn validate(&self) -> Result<()> {
        if self.scan_pattern.trim().is_empty() {
            bail!("scan_pattern cannot be empty (use \"*\" for all keys)");
        }
        if self.scan_count == 0 {
            bail!("scan_count must be at least 1");
        }
        if self.pipeline_size == 0 {
            bail!("pipeline_size must be at least 1");
        }
        if self.existing_keys_pause_threshold == 0 {
            bail!("existing_keys_pause_threshold must be at least 1");
        }
        if self.max_failed_keys == 0 {
            bail!("max_failed_keys must be at least 1");
        }
        Ok(())
    }

    /// The configured pause as a [`Duration`].
    pub fn pause(&self) -> Duration {
        Duration::from_secs(self.pause_secs)
    }
}
