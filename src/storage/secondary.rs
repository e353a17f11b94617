//! Secondary backend over a structured-value store.
//!
//! The store is usable only while it reports all four capabilities
//! (get, set, delete, list). Values cross the boundary as JSON values with
//! no string marshaling; a stored `null` or a value holding nested nulls is
//! reported and treated as unset.

use super::{StorageBackend, ValueStore};
use crate::error::ConfigError;
use crate::logging::{DiagLevel, Logger};
use crate::value::ConfigValue;
use serde_json::{Value, json};
use std::sync::Arc;

pub struct SecondaryBackend {
    store: Arc<dyn ValueStore>,
    logger: Logger,
}

impl SecondaryBackend {
    pub fn new(store: Arc<dyn ValueStore>) -> Self {
        Self {
            store,
            logger: Logger::new().with_name("secondary"),
        }
    }

    pub fn with_logger(mut self, logger: &Logger) -> Self {
        self.logger = logger.named("secondary");
        self
    }

    fn warn(&self, message: &str, data: Value) {
        self.logger.log_with_data(DiagLevel::Warning, message, data);
    }
}

impl StorageBackend for SecondaryBackend {
    fn name(&self) -> &str {
        "secondary"
    }

    fn is_available(&self) -> bool {
        self.store.capabilities().is_complete()
    }

    fn get(&self, key: &str) -> Option<ConfigValue> {
        if !self.is_available() {
            return None;
        }
        match self.store.get_value(key) {
            Ok(Some(Value::Null)) | Ok(None) => None,
            Ok(Some(value)) => match ConfigValue::try_from(value) {
                Ok(value) => Some(value),
                Err(e) => {
                    self.warn(
                        "unusable stored value treated as unset",
                        json!({"key": key, "error": e.to_string()}),
                    );
                    None
                }
            },
            Err(e) => {
                self.warn("read failed", json!({"key": key, "error": e.to_string()}));
                None
            }
        }
    }

    fn set(&self, key: &str, value: &ConfigValue) -> bool {
        if !self.is_available() {
            self.logger.log_with_data(
                DiagLevel::Debug,
                "write skipped",
                ConfigError::unavailable(self.name()).with_key(key).to_json(),
            );
            return false;
        }
        match self.store.set_value(key, &Value::from(value.clone())) {
            Ok(()) => true,
            Err(e) => {
                self.warn("write failed", json!({"key": key, "error": e.to_string()}));
                false
            }
        }
    }

    fn remove(&self, key: &str) {
        if !self.is_available() {
            return;
        }
        if let Err(e) = self.store.delete_value(key) {
            self.warn("remove failed", json!({"key": key, "error": e.to_string()}));
        }
    }

    fn list_keys(&self) -> Vec<String> {
        if !self.is_available() {
            return Vec::new();
        }
        self.store.list_values().unwrap_or_else(|e| {
            self.warn("listing keys failed", json!({"error": e.to_string()}));
            Vec::new()
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::{Capabilities, MemoryValueStore};

    fn backend() -> (SecondaryBackend, Arc<MemoryValueStore>) {
        let store = Arc::new(MemoryValueStore::new());
        (SecondaryBackend::new(store.clone()), store)
    }

    #[test]
    fn stores_structured_values_directly() {
        let (secondary, store) = backend();
        let value = ConfigValue::try_from(json!({"play": "space"})).unwrap();
        assert!(secondary.set("_lcfg_hotkeys", &value));
        assert_eq!(store.raw("_lcfg_hotkeys"), Some(json!({"play": "space"})));
        assert_eq!(secondary.get("_lcfg_hotkeys"), Some(value));
    }

    #[test]
    fn any_missing_capability_means_unavailable() {
        let (secondary, store) = backend();
        assert!(secondary.is_available());
        store.set_capabilities(Capabilities {
            list: false,
            ..Capabilities::all()
        });
        assert!(!secondary.is_available());
        assert!(!secondary.set("k", &1.into()));
        assert!(secondary.list_keys().is_empty());
    }

    #[test]
    fn null_values_read_as_unset() {
        let (secondary, store) = backend();
        store.insert_raw("a", Value::Null);
        store.insert_raw("b", json!({"x": null}));
        assert_eq!(secondary.get("a"), None);
        assert_eq!(secondary.get("b"), None);
    }

    #[test]
    fn rejected_write_returns_false() {
        let (secondary, store) = backend();
        store.set_reject_writes(true);
        assert!(!secondary.set("k", &1.into()));
        assert!(store.is_empty());
    }

    #[test]
    fn clear_only_touches_namespace() {
        let (secondary, store) = backend();
        store.insert_raw("other_app", json!(1));
        secondary.set("_lcfg_debug", &false.into());
        secondary.clear("_lcfg_");
        assert_eq!(store.len(), 1);
        assert_eq!(store.raw("other_app"), Some(json!(1)));
    }
}
