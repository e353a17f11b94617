//! Per-key configuration resolver.
//!
//! Reads walk the priority chain Primary → Secondary → DefaultTree and stop
//! at the first tier holding a value; tiers are never merged. Writes always
//! update the DefaultTree, then persist to Primary, falling back to
//! Secondary when Primary refuses.
//!
//! Every value is persisted under its own key, so two processes writing
//! different paths never overwrite each other, and two writing the same path
//! end with whichever wrote last.
//!
//! No operation returns an error. Invalid input yields `None` or `false`;
//! store failures are logged and degrade to the next tier.

use crate::config::Config;
use crate::db::Database;
use crate::defaults::DefaultTree;
use crate::error::ConfigError;
use crate::logging::{DiagLevel, Logger};
use crate::paths::{ConfigPath, KeyCodec, StorageKey};
use crate::storage::{
    DirStringStore, HostStorage, MemoryValueStore, PrimaryBackend, SecondaryBackend,
    StorageBackend,
};
use crate::value::ConfigValue;
use serde::Serialize;
use serde_json::{Value, json};
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

/// A persistent tier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StoreTier {
    Primary,
    Secondary,
}

impl fmt::Display for StoreTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StoreTier::Primary => write!(f, "primary"),
            StoreTier::Secondary => write!(f, "secondary"),
        }
    }
}

/// Tier that answered a read.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ValueSource {
    Primary,
    Secondary,
    Defaults,
}

impl From<StoreTier> for ValueSource {
    fn from(tier: StoreTier) -> Self {
        match tier {
            StoreTier::Primary => ValueSource::Primary,
            StoreTier::Secondary => ValueSource::Secondary,
        }
    }
}

impl fmt::Display for ValueSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValueSource::Primary => write!(f, "primary"),
            ValueSource::Secondary => write!(f, "secondary"),
            ValueSource::Defaults => write!(f, "defaults"),
        }
    }
}

/// A resolved value with the tier it came from.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Resolved {
    pub source: ValueSource,
    pub value: ConfigValue,
}

/// Three independent views: persisted entries per backend keyed by dotted
/// path, plus the current default tree.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConfigListing {
    pub primary: BTreeMap<String, ConfigValue>,
    pub secondary: BTreeMap<String, ConfigValue>,
    pub defaults: ConfigValue,
}

pub struct ConfigResolver {
    codec: KeyCodec,
    primary: Arc<dyn StorageBackend>,
    secondary: Arc<dyn StorageBackend>,
    defaults: DefaultTree,
    logger: Logger,
}

impl ConfigResolver {
    pub fn new(
        primary: Arc<dyn StorageBackend>,
        secondary: Arc<dyn StorageBackend>,
        defaults: DefaultTree,
    ) -> Self {
        Self {
            codec: KeyCodec::default(),
            primary,
            secondary,
            defaults,
            logger: Logger::new().with_name("resolver"),
        }
    }

    /// Build a resolver over the stores named in `config`. A store that is
    /// disabled or cannot be opened is wired in as permanently unavailable.
    pub fn open(config: &Config, defaults: DefaultTree, logger: &Logger) -> Self {
        let host = HostStorage::new();
        if config.primary.enabled {
            match DirStringStore::open(&config.primary.dir) {
                Ok(store) => host.install(Arc::new(store)),
                Err(e) => logger.log_with_data(
                    DiagLevel::Warning,
                    "primary store could not be opened",
                    json!({"dir": config.primary.dir.display().to_string(), "error": e.to_string()}),
                ),
            }
        }
        let primary = PrimaryBackend::capture(&host).with_logger(logger);

        let secondary = if config.secondary.enabled {
            match Database::open(&config.secondary.db_path) {
                Ok(db) => SecondaryBackend::new(Arc::new(db)),
                Err(e) => {
                    logger.log_with_data(
                        DiagLevel::Warning,
                        "secondary store could not be opened",
                        json!({"db_path": config.secondary.db_path.display().to_string(), "error": e.to_string()}),
                    );
                    SecondaryBackend::new(Arc::new(MemoryValueStore::unavailable()))
                }
            }
        } else {
            SecondaryBackend::new(Arc::new(MemoryValueStore::unavailable()))
        }
        .with_logger(logger);

        Self::new(Arc::new(primary), Arc::new(secondary), defaults)
            .with_namespace(config.namespace.clone())
            .with_logger(logger)
    }

    pub fn with_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.codec = KeyCodec::new(namespace);
        self
    }

    pub fn with_logger(mut self, logger: &Logger) -> Self {
        self.logger = logger.named("resolver");
        self
    }

    pub fn codec(&self) -> &KeyCodec {
        &self.codec
    }

    pub fn defaults(&self) -> &DefaultTree {
        &self.defaults
    }

    /// Reset the default tree to its seed, dropping in-process writes.
    pub fn reset_defaults(&mut self) {
        self.defaults.reset();
    }

    fn backend(&self, tier: StoreTier) -> &Arc<dyn StorageBackend> {
        match tier {
            StoreTier::Primary => &self.primary,
            StoreTier::Secondary => &self.secondary,
        }
    }

    fn parse_path(&self, path: &str) -> Option<ConfigPath> {
        match ConfigPath::parse(path) {
            Ok(path) => Some(path),
            Err(e) => {
                self.logger.log_with_data(
                    DiagLevel::Debug,
                    "rejected config path",
                    ConfigError::invalid_path(path, e).to_json(),
                );
                None
            }
        }
    }

    /// Storage key for a dotted path.
    pub fn key_for(&self, path: &str) -> Option<StorageKey> {
        ConfigPath::parse(path)
            .ok()
            .map(|p| self.codec.encode_key(&p))
    }

    /// Dotted path for a storage key in this namespace.
    pub fn path_for(&self, key: &str) -> Option<ConfigPath> {
        self.codec.decode_key(key)
    }

    /// Resolve a path and report which tier answered.
    pub fn resolve(&self, path: &str) -> Option<Resolved> {
        let path = self.parse_path(path)?;
        let key = self.codec.encode_key(&path);

        for tier in [StoreTier::Primary, StoreTier::Secondary] {
            if let Some(value) = self.backend(tier).get(key.as_str()) {
                return Some(Resolved {
                    source: tier.into(),
                    value,
                });
            }
        }

        self.defaults.get(&path).map(|value| Resolved {
            source: ValueSource::Defaults,
            value: value.clone(),
        })
    }

    /// Value at `path` from the first tier holding one.
    pub fn get(&self, path: &str) -> Option<ConfigValue> {
        self.resolve(path).map(|resolved| resolved.value)
    }

    /// Value at `path` in a single persistent tier.
    pub fn get_from(&self, tier: StoreTier, path: &str) -> Option<ConfigValue> {
        let path = self.parse_path(path)?;
        self.backend(tier)
            .get(self.codec.encode_key(&path).as_str())
    }

    /// Write a value. The default tree is updated even when no backend
    /// accepts the write; the result only reports persistence.
    pub fn set(&mut self, path: &str, value: impl Into<ConfigValue>) -> bool {
        let Some(path) = self.parse_path(path) else {
            return false;
        };
        let value = value.into();
        let key = self.codec.encode_key(&path);
        self.defaults.set(&path, value.clone());

        if self.primary.set(key.as_str(), &value) {
            return true;
        }
        if self.secondary.set(key.as_str(), &value) {
            return true;
        }

        self.logger.log_with_data(
            DiagLevel::Warning,
            "value kept in memory only, no backend accepted it",
            json!({"path": path.as_str(), "key": key.as_str()}),
        );
        false
    }

    /// Write a JSON value. `null`, anywhere in the value, is rejected
    /// without side effects.
    pub fn set_json(&mut self, path: &str, value: Value) -> bool {
        match ConfigValue::try_from(value) {
            Ok(value) => self.set(path, value),
            Err(e) => {
                self.logger.log_with_data(
                    DiagLevel::Debug,
                    "rejected config value",
                    e.with_details(format!("path: {}", path)).to_json(),
                );
                false
            }
        }
    }

    /// Write to one persistent tier only, with no fallback. The default
    /// tree is updated either way.
    pub fn set_in(&mut self, tier: StoreTier, path: &str, value: impl Into<ConfigValue>) -> bool {
        let Some(path) = self.parse_path(path) else {
            return false;
        };
        let value = value.into();
        self.defaults.set(&path, value.clone());
        self.backend(tier)
            .set(self.codec.encode_key(&path).as_str(), &value)
    }

    /// Entries persisted in one tier under this namespace, keyed by path.
    pub fn list_tier(&self, tier: StoreTier) -> BTreeMap<String, ConfigValue> {
        let backend = self.backend(tier);
        let mut entries = BTreeMap::new();
        for key in backend.list_keys() {
            if !self.codec.owns(&key) {
                continue;
            }
            let Some(path) = self.codec.decode_key(&key) else {
                self.logger.log_with_data(
                    DiagLevel::Debug,
                    "skipping undecodable key",
                    json!({"tier": tier.to_string(), "key": key}),
                );
                continue;
            };
            if let Some(value) = backend.get(&key) {
                entries.insert(path.to_string(), value);
            }
        }
        entries
    }

    pub fn list(&self) -> ConfigListing {
        ConfigListing {
            primary: self.list_tier(StoreTier::Primary),
            secondary: self.list_tier(StoreTier::Secondary),
            defaults: self.defaults.snapshot(),
        }
    }

    /// Remove this namespace's entries from one tier.
    pub fn clear_tier(&self, tier: StoreTier) {
        self.backend(tier).clear(self.codec.namespace());
    }

    /// Remove this namespace's entries from both backends. The default tree
    /// keeps its current contents.
    pub fn clear(&self) {
        self.clear_tier(StoreTier::Primary);
        self.clear_tier(StoreTier::Secondary);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStringStore;

    fn resolver() -> (ConfigResolver, Arc<MemoryStringStore>, Arc<MemoryValueStore>) {
        let strings = Arc::new(MemoryStringStore::new());
        let values = Arc::new(MemoryValueStore::new());
        let resolver = ConfigResolver::new(
            Arc::new(PrimaryBackend::new(strings.clone())),
            Arc::new(SecondaryBackend::new(values.clone())),
            DefaultTree::empty(),
        );
        (resolver, strings, values)
    }

    #[test]
    fn invalid_paths_are_rejected_without_side_effects() {
        let (mut resolver, strings, values) = resolver();
        assert!(!resolver.set("", 1));
        assert!(!resolver.set("a..b", 1));
        assert_eq!(resolver.get(""), None);
        assert!(strings.is_empty());
        assert!(values.is_empty());
        assert!(resolver.defaults().as_map().is_empty());
    }

    #[test]
    fn null_json_is_rejected_without_side_effects() {
        let (mut resolver, strings, _) = resolver();
        assert!(!resolver.set_json("a", Value::Null));
        assert!(!resolver.set_json("a", json!({"b": null})));
        assert!(strings.is_empty());
        assert!(resolver.defaults().as_map().is_empty());
    }

    #[test]
    fn resolve_reports_source() {
        let (mut resolver, strings, _) = resolver();
        resolver.set_in(StoreTier::Secondary, "media.volume", 3);
        assert_eq!(
            resolver.resolve("media.volume").map(|r| r.source),
            Some(ValueSource::Secondary)
        );

        strings.set_available(false);
        resolver.set("media.rate", 2);
        assert_eq!(
            resolver.resolve("media.rate").map(|r| r.source),
            Some(ValueSource::Secondary)
        );
    }

    #[test]
    fn key_helpers_use_namespace() {
        let (resolver, _, _) = resolver();
        let resolver = resolver.with_namespace("_app_");
        let key = resolver.key_for("media.volume").unwrap();
        assert_eq!(key.as_str(), "_app_media_volume");
        assert_eq!(
            resolver.path_for(key.as_str()).map(|p| p.to_string()),
            Some("media.volume".to_string())
        );
        assert!(resolver.key_for("").is_none());
    }
}
