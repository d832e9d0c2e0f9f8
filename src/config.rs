//! Rewriter configuration module.
//!
//! Handles loading and validating an optional `sitefix.toml` placed in
//! the root of the site being rewritten. Without the file every rule behaves
//! exactly as the stock defaults below.
//!
//! ## Configuration Options
//!
//! ```toml
//! # All options are optional - defaults shown below
//!
//! [paths]
//! local_asset_dirs = ["mortgage-calculator"]  # Pages that keep their own css/ and js/
//!
//! [trailing_slashes]
//! reserved_extensions = ["html", "css", "js", "xml", "txt", "svg", "jpg", "png", "gif"]
//!
//! [processing]
//! max_processes = 4         # Max parallel workers (omit for auto = CPU cores)
//! ```
//!
//! ## Partial Configuration
//!
//! Config files are sparse. Any section or key left out keeps its default:
//!
//! ```toml
//! [trailing_slashes]
//! reserved_extensions = ["html", "css", "js", "xml", "txt", "svg", "jpg", "png", "gif", "pdf"]
//! ```
//!
//! Unknown keys are rejected to catch typos early.

use serde::Deserialize;
use std::fs;
use std::path::Path;
use thiserror::Error;

/// Name of the config file looked up in the traversal root.
pub const CONFIG_FILENAME: &str = "sitefix.toml";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("Config validation error: {0}")]
    Validation(String),
}

/// Rewriter configuration loaded from `sitefix.toml`.
///
/// All fields have defaults matching the hardcoded rule sets. Unknown keys are
/// rejected.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RewriteConfig {
    /// Asset-path pass settings.
    pub paths: PathsConfig,
    /// Trailing-slash pass settings.
    pub trailing_slashes: TrailingSlashConfig,
    /// Parallel processing settings.
    pub processing: ProcessingConfig,
}

impl RewriteConfig {
    /// Validate config values are usable as rule inputs.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.paths.local_asset_dirs.iter().any(|d| d.is_empty()) {
            return Err(ConfigError::Validation(
                "paths.local_asset_dirs entries must not be empty".into(),
            ));
        }
        for ext in &self.trailing_slashes.reserved_extensions {
            let bare = ext.strip_prefix('.').unwrap_or(ext);
            if bare.is_empty() {
                return Err(ConfigError::Validation(
                    "trailing_slashes.reserved_extensions entries must not be empty".into(),
                ));
            }
            if bare.contains(['/', '"']) {
                return Err(ConfigError::Validation(format!(
                    "trailing_slashes.reserved_extensions entry {ext:?} must not contain '/' or '\"'"
                )));
            }
        }
        if self.processing.max_processes == Some(0) {
            return Err(ConfigError::Validation(
                "processing.max_processes must be at least 1".into(),
            ));
        }
        Ok(())
    }
}

/// Asset-path pass settings.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PathsConfig {
    /// Directory name fragments whose pages keep their own `css/` and `js/`
    /// folders. A page whose relative directory contains one of these gets
    /// its bare `css/…` and `js/…` references rooted at its own directory.
    pub local_asset_dirs: Vec<String>,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            local_asset_dirs: vec!["mortgage-calculator".to_string()],
        }
    }
}

/// Trailing-slash pass settings.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TrailingSlashConfig {
    /// Extensions (without the leading dot) that mark an absolute href as a
    /// file. Matching is case-sensitive.
    pub reserved_extensions: Vec<String>,
}

impl Default for TrailingSlashConfig {
    fn default() -> Self {
        Self {
            reserved_extensions: ["html", "css", "js", "xml", "txt", "svg", "jpg", "png", "gif"]
                .into_iter()
                .map(String::from)
                .collect(),
        }
    }
}

/// Parallel processing settings.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ProcessingConfig {
    /// Maximum number of files rewritten in parallel.
    /// When absent, defaults to the number of CPU cores.
    /// Values larger than the core count are clamped down.
    pub max_processes: Option<usize>,
}

/// Worker count for the rewrite pool: the CPU core count, lowered to
/// `max_processes` when that is set.
pub fn effective_threads(config: &ProcessingConfig) -> usize {
    let cores = std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1);
    config.max_processes.map_or(cores, |n| n.min(cores))
}

// =============================================================================
// Config loading
// =============================================================================

/// Parse `sitefix.toml` text. Every section is `#[serde(default)]`, so keys
/// the file leaves out fall back to the stock values.
pub fn parse_config(content: &str) -> Result<RewriteConfig, ConfigError> {
    let config: RewriteConfig = toml::from_str(content)?;
    config.validate()?;
    Ok(config)
}

/// Load config for a traversal root.
///
/// A missing `sitefix.toml` yields the stock rule settings.
pub fn load_config(root: &Path) -> Result<RewriteConfig, ConfigError> {
    let config_path = root.join(CONFIG_FILENAME);
    if !config_path.exists() {
        return Ok(RewriteConfig::default());
    }
    parse_config(&fs::read_to_string(&config_path)?)
}

/// Returns a fully-commented stock `sitefix.toml`.
///
/// Used by the `gen-config` CLI command.
pub fn stock_config_toml() -> &'static str {
    r##"# sitefix configuration
# =====================
# All settings are optional. Values shown below are the defaults.
# Place this file as sitefix.toml in the root of the site being rewritten.
# Unknown keys will cause an error.

# ---------------------------------------------------------------------------
# Asset paths (`sitefix paths`)
# ---------------------------------------------------------------------------
[paths]
# Pages whose directory path contains one of these fragments keep their own
# css/ and js/ folders: href="css/x.css" becomes href="/<page dir>/css/x.css".
local_asset_dirs = ["mortgage-calculator"]

# ---------------------------------------------------------------------------
# Trailing slashes (`sitefix trailing-slashes`)
# ---------------------------------------------------------------------------
[trailing_slashes]
# Absolute hrefs ending in one of these extensions are files and never get a
# trailing slash. Matching is case-sensitive.
reserved_extensions = ["html", "css", "js", "xml", "txt", "svg", "jpg", "png", "gif"]

# ---------------------------------------------------------------------------
# Processing
# ---------------------------------------------------------------------------
[processing]
# Maximum number of files rewritten in parallel. Omit for auto (CPU cores).
# max_processes = 4
"##
}
