//! In-memory default tree.
//!
//! Holds the seed defaults plus the latest value written in this process for
//! every path. It is the last tier the resolver reads and is updated by every
//! `set`, whether or not a backend accepted the write.

use crate::paths::{ConfigPath, read_path, write_path};
use crate::value::{ConfigMap, ConfigValue};
use anyhow::{Result, anyhow};

/// Embedded seed shape.
pub const BUILTIN_DEFAULTS_YAML: &str = include_str!("../config/defaults.yaml");

#[derive(Debug, Clone, PartialEq)]
pub struct DefaultTree {
    seed: ConfigMap,
    current: ConfigMap,
}

impl Default for DefaultTree {
    fn default() -> Self {
        Self::builtin()
    }
}

impl DefaultTree {
    /// Tree seeded with the given map.
    pub fn new(seed: ConfigMap) -> Self {
        Self {
            current: seed.clone(),
            seed,
        }
    }

    /// Tree with no defaults at all.
    pub fn empty() -> Self {
        Self::new(ConfigMap::new())
    }

    /// Tree seeded from a value, which must be a map.
    pub fn from_value(seed: ConfigValue) -> Result<Self> {
        match seed {
            ConfigValue::Map(map) => Ok(Self::new(map)),
            other => Err(anyhow!("default tree must be a map, got {}", other.kind())),
        }
    }

    /// Tree seeded from a JSON value. Nulls are rejected.
    pub fn from_json(seed: serde_json::Value) -> Result<Self> {
        Self::from_value(ConfigValue::try_from(seed)?)
    }

    /// Parse the embedded seed.
    pub fn builtin_seed() -> Result<ConfigMap> {
        let value: serde_json::Value = serde_yaml::from_str(BUILTIN_DEFAULTS_YAML)?;
        match ConfigValue::try_from(value)? {
            ConfigValue::Map(map) => Ok(map),
            other => Err(anyhow!("embedded defaults must be a map, got {}", other.kind())),
        }
    }

    /// Tree seeded with the embedded defaults.
    pub fn builtin() -> Self {
        match Self::builtin_seed() {
            Ok(seed) => Self::new(seed),
            Err(e) => {
                tracing::error!("embedded defaults unreadable: {}", e);
                Self::empty()
            }
        }
    }

    pub fn get(&self, path: &ConfigPath) -> Option<&ConfigValue> {
        read_path(&self.current, path)
    }

    pub fn set(&mut self, path: &ConfigPath, value: ConfigValue) {
        write_path(&mut self.current, path, value);
    }

    /// Current tree as a single map value.
    pub fn snapshot(&self) -> ConfigValue {
        ConfigValue::Map(self.current.clone())
    }

    pub fn as_map(&self) -> &ConfigMap {
        &self.current
    }

    pub fn seed(&self) -> &ConfigMap {
        &self.seed
    }

    /// Drop every in-process write and return to the seed, as a fresh
    /// process would see it.
    pub fn reset(&mut self) {
        self.current = self.seed.clone();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn path(s: &str) -> ConfigPath {
        ConfigPath::parse(s).unwrap()
    }

    #[test]
    fn builtin_seed_has_expected_shape() {
        let tree = DefaultTree::builtin();
        assert_eq!(tree.get(&path("media.volume")), Some(&ConfigValue::from(1)));
        assert_eq!(
            tree.get(&path("enhance.blockSetPlaybackRate")),
            Some(&ConfigValue::from(true))
        );
        assert_eq!(tree.get(&path("debug")), Some(&ConfigValue::from(true)));
        assert_eq!(tree.get(&path("hotkeys")), Some(&ConfigValue::empty_map()));
    }

    #[test]
    fn set_then_reset_restores_seed() {
        let mut tree = DefaultTree::from_json(json!({"media": {"volume": 1}})).unwrap();
        tree.set(&path("media.volume"), ConfigValue::from_f64(0.5).unwrap());
        tree.set(&path("media.muted"), true.into());
        assert_eq!(tree.get(&path("media.volume")).and_then(|v| v.as_f64()), Some(0.5));

        tree.reset();
        assert_eq!(tree.get(&path("media.volume")), Some(&ConfigValue::from(1)));
        assert!(tree.get(&path("media.muted")).is_none());
    }

    #[test]
    fn from_value_requires_map() {
        assert!(DefaultTree::from_value(ConfigValue::from(1)).is_err());
        assert!(DefaultTree::from_json(json!({"a": null})).is_err());
    }

    #[test]
    fn snapshot_reflects_writes() {
        let mut tree = DefaultTree::empty();
        tree.set(&path("a.b"), "c".into());
        assert_eq!(
            serde_json::to_value(tree.snapshot()).unwrap(),
            json!({"a": {"b": "c"}})
        );
        assert!(tree.seed().is_empty());
    }
}
