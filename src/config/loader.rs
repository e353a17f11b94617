//! Configuration loader with tier-based merging.
//!
//! Loads configuration from multiple tiers and merges them field-by-field.

use super::merge::merge_layers;
use super::types::Config;
use crate::defaults::{BUILTIN_DEFAULTS_YAML, DefaultTree};
use anyhow::Result;
use serde_json::Value;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Configuration tier priority (lowest to highest).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ConfigTier {
    /// Embedded defaults (lowest priority)
    Defaults = 0,
    /// Project-level config ($CWD/layered-config/)
    Project = 1,
    /// User-level config (~/.layered-config/)
    User = 2,
    /// Environment variables (highest priority)
    Environment = 3,
}

impl std::fmt::Display for ConfigTier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigTier::Defaults => write!(f, "defaults"),
            ConfigTier::Project => write!(f, "project"),
            ConfigTier::User => write!(f, "user"),
            ConfigTier::Environment => write!(f, "environment"),
        }
    }
}

/// Directories for the file tiers.
#[derive(Debug, Clone)]
pub struct ConfigPaths {
    pub project_dir: Option<PathBuf>,
    pub user_dir: Option<PathBuf>,
}

impl Default for ConfigPaths {
    fn default() -> Self {
        Self::discover()
    }
}

impl ConfigPaths {
    /// Discover configuration paths from environment and defaults.
    pub fn discover() -> Self {
        // User dir: LAYERED_CONFIG_USER_DIR or ~/.layered-config
        let user_dir = std::env::var("LAYERED_CONFIG_USER_DIR")
            .ok()
            .map(PathBuf::from)
            .or_else(|| dirs::home_dir().map(|h| h.join(".layered-config")));

        // Project dir: LAYERED_CONFIG_PROJECT_DIR or $CWD/layered-config
        let project_dir = std::env::var("LAYERED_CONFIG_PROJECT_DIR")
            .ok()
            .map(PathBuf::from)
            .or_else(|| Some(PathBuf::from("layered-config")));

        Self {
            project_dir,
            user_dir,
        }
    }

    /// Create paths with explicit directories.
    pub fn with_dirs(project_dir: Option<PathBuf>, user_dir: Option<PathBuf>) -> Self {
        Self {
            project_dir,
            user_dir,
        }
    }

    /// Existing tier files named `file_name`, lowest tier first.
    fn tier_files(&self, file_name: &str) -> Vec<(ConfigTier, PathBuf)> {
        [
            (ConfigTier::Project, self.project_dir.as_ref()),
            (ConfigTier::User, self.user_dir.as_ref()),
        ]
        .into_iter()
        .filter_map(|(tier, dir)| dir.map(|d| (tier, d.join(file_name))))
        .filter(|(_, file)| file.exists())
        .collect()
    }
}

/// Read a YAML file as a JSON value, skipping it with a warning when it
/// cannot be read or parsed.
fn read_yaml_tier(tier: ConfigTier, file: &Path) -> Option<Value> {
    let content = match std::fs::read_to_string(file) {
        Ok(content) => content,
        Err(e) => {
            warn!(%tier, file = %file.display(), "skipping unreadable file: {}", e);
            return None;
        }
    };
    match serde_yaml::from_str::<Value>(&content) {
        Ok(value) => {
            debug!(%tier, file = %file.display(), "loaded tier");
            Some(value)
        }
        Err(e) => {
            warn!(%tier, file = %file.display(), "skipping invalid YAML: {}", e);
            None
        }
    }
}

/// Configuration loader that handles tier-based merging.
#[derive(Debug, Clone)]
pub struct ConfigLoader {
    pub paths: ConfigPaths,
    config: Config,
    /// Highest-tier config file that was used (if any)
    config_path: Option<PathBuf>,
}

impl ConfigLoader {
    /// Load configuration from all tiers with proper merging.
    pub fn load() -> Result<Self> {
        Self::load_with_paths(ConfigPaths::discover())
    }

    /// Load configuration with explicit paths. Environment overrides are
    /// read from the process environment.
    pub fn load_with_paths(paths: ConfigPaths) -> Result<Self> {
        Self::load_with(paths, |name| std::env::var(name).ok())
    }

    /// Load configuration with explicit paths and environment lookup.
    pub fn load_with<F>(paths: ConfigPaths, env: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        // Check for explicit config path override
        if let Some(explicit_path) = env("LAYERED_CONFIG_PATH") {
            let path = PathBuf::from(&explicit_path);
            let mut config = Config::load(&path)?;
            Self::apply_env_overrides(&mut config, &env);
            return Ok(Self {
                paths,
                config,
                config_path: Some(path),
            });
        }

        // Tier 1: Defaults
        let mut configs: Vec<Value> = vec![serde_json::to_value(Config::default())?];

        // Tiers 2 and 3: Project, then User
        let mut config_path = None;
        for (tier, file) in paths.tier_files("config.yaml") {
            if let Some(value) = read_yaml_tier(tier, &file) {
                configs.push(value);
                config_path = Some(file);
            }
        }

        let merged = merge_layers(configs);
        let mut config: Config = serde_json::from_value(merged)?;

        // Tier 4: Environment variable overrides
        Self::apply_env_overrides(&mut config, &env);

        Ok(Self {
            paths,
            config,
            config_path,
        })
    }

    /// Apply environment variable overrides to config.
    fn apply_env_overrides<F>(config: &mut Config, env: &F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(namespace) = env("LAYERED_CONFIG_NAMESPACE") {
            config.namespace = namespace;
        }

        if let Some(dir) = env("LAYERED_CONFIG_PRIMARY_DIR") {
            config.primary.dir = PathBuf::from(dir);
        }

        if let Some(db_path) = env("LAYERED_CONFIG_SECONDARY_DB") {
            config.secondary.db_path = PathBuf::from(db_path);
        }

        if let Some(level) = env("LAYERED_CONFIG_LOG_LEVEL") {
            match level.parse() {
                Ok(level) => config.log_level = level,
                Err(e) => warn!("ignoring LAYERED_CONFIG_LOG_LEVEL: {}", e),
            }
        }
    }

    /// Build the default tree seed: embedded defaults, then project and
    /// user `defaults.yaml`, merged field by field. Nulls are dropped.
    pub fn load_defaults(&self) -> Result<DefaultTree> {
        let mut layers: Vec<Value> = vec![serde_yaml::from_str(BUILTIN_DEFAULTS_YAML)?];
        for (tier, file) in self.paths.tier_files("defaults.yaml") {
            if let Some(value) = read_yaml_tier(tier, &file) {
                layers.push(value);
            }
        }
        DefaultTree::from_json(merge_layers(layers))
    }

    /// Get the loaded configuration.
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Get mutable access to the configuration.
    pub fn config_mut(&mut self) -> &mut Config {
        &mut self.config
    }

    /// Get the config file path that was used.
    pub fn config_path(&self) -> Option<&Path> {
        self.config_path.as_deref()
    }
}
