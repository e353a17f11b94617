//! Configuration types.

use crate::logging::DiagLevel;
use crate::paths::DEFAULT_NAMESPACE;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Application directory name under the platform data dir.
pub const APP_DIR_NAME: &str = "layered-config";

/// Top-level configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Prefix of every storage key this application owns.
    #[serde(default = "default_namespace")]
    pub namespace: String,

    #[serde(default)]
    pub primary: PrimaryConfig,

    #[serde(default)]
    pub secondary: SecondaryConfig,

    /// Minimum level of diagnostics forwarded to sinks.
    #[serde(default)]
    pub log_level: DiagLevel,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            namespace: default_namespace(),
            primary: PrimaryConfig::default(),
            secondary: SecondaryConfig::default(),
            log_level: DiagLevel::default(),
        }
    }
}

impl Config {
    /// Load a single configuration file (YAML).
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("reading config file {}", path.display()))?;
        let config: Config = serde_yaml::from_str(&content)
            .with_context(|| format!("parsing config file {}", path.display()))?;
        Ok(config)
    }
}

/// Raw-text primary store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PrimaryConfig {
    /// When false the primary backend is constructed unavailable.
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Directory holding one file per key.
    #[serde(default = "default_primary_dir")]
    pub dir: PathBuf,
}

impl Default for PrimaryConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            dir: default_primary_dir(),
        }
    }
}

/// Structured-value secondary store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SecondaryConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// SQLite database file.
    #[serde(default = "default_secondary_db")]
    pub db_path: PathBuf,
}

impl Default for SecondaryConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            db_path: default_secondary_db(),
        }
    }
}

fn default_namespace() -> String {
    DEFAULT_NAMESPACE.to_string()
}

fn default_true() -> bool {
    true
}

fn data_dir() -> PathBuf {
    dirs::data_dir()
        .map(|d| d.join(APP_DIR_NAME))
        .unwrap_or_else(|| PathBuf::from(".layered-config"))
}

fn default_primary_dir() -> PathBuf {
    data_dir().join("primary")
}

fn default_secondary_db() -> PathBuf {
    data_dir().join("secondary.db")
}
