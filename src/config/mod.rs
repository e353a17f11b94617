//! Application configuration and default-tree seeding.
//!
//! Settings come from four tiers, merged field by field:
//! 1. **Defaults** - `Config::default()`
//! 2. **Project** - `$CWD/layered-config/config.yaml`
//! 3. **User** - `~/.layered-config/config.yaml`
//! 4. **Environment** - variables below
//!
//! The default tree seed is built the same way from the embedded
//! `config/defaults.yaml` plus optional project and user `defaults.yaml`.
//!
//! ## Environment Variables
//! - `LAYERED_CONFIG_PATH` - Explicit config file (overrides the file tiers)
//! - `LAYERED_CONFIG_NAMESPACE` - Storage key namespace
//! - `LAYERED_CONFIG_PRIMARY_DIR` - Primary store directory
//! - `LAYERED_CONFIG_SECONDARY_DB` - Secondary store database file
//! - `LAYERED_CONFIG_LOG_LEVEL` - Minimum diagnostic level (`debug`, `info`, `warning`, `error`)
//! - `LAYERED_CONFIG_USER_DIR` - User config dir (default: `~/.layered-config`)
//! - `LAYERED_CONFIG_PROJECT_DIR` - Project config dir (default: `./layered-config`)

mod loader;
mod merge;
mod types;

pub use loader::{ConfigLoader, ConfigPaths, ConfigTier};
pub use merge::{merge_into, merge_layers, prune_nulls};
pub use types::*;
