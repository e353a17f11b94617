//! Primary backend over a host raw-text store.
//!
//! The host exposes its store through a replaceable `HostStorage` slot that
//! other code in the process may swap out. `PrimaryBackend::capture` clones
//! the handle once; later swaps do not reach an adapter built earlier.
//!
//! Every value is written as JSON text. Reading parses it back; text that
//! does not parse, or parses to `null`, is reported and treated as unset.

use super::{StorageBackend, StringStore};
use crate::error::ConfigError;
use crate::logging::{DiagLevel, Logger};
use crate::value::ConfigValue;
use serde_json::{Value, json};
use arc_swap::ArcSwapOption;
use std::sync::Arc;

/// Replaceable slot through which a host publishes its raw-text store.
///
/// Uses `ArcSwapOption` so the host can swap its store at any
/// time without blocking readers.
pub struct HostStorage {
    string_store: ArcSwapOption<Arc<dyn StringStore>>,
}

impl Default for HostStorage {
    fn default() -> Self {
        Self {
            string_store: ArcSwapOption::empty(),
        }
    }
}

impl HostStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_string_store(store: Arc<dyn StringStore>) -> Self {
        let host = Self::new();
        host.install(store);
        host
    }

    /// Install or replace the published store.
    pub fn install(&self, store: Arc<dyn StringStore>) {
        self.string_store.store(Some(Arc::new(store)));
    }

    /// The store published right now, if any.
    pub fn current(&self) -> Option<Arc<dyn StringStore>> {
        self.string_store
            .load_full()
            .map(|published| Arc::clone(&*published))
    }
}

pub struct PrimaryBackend {
    store: Option<Arc<dyn StringStore>>,
    logger: Logger,
}

impl PrimaryBackend {
    pub fn new(store: Arc<dyn StringStore>) -> Self {
        Self {
            store: Some(store),
            logger: Logger::new().with_name("primary"),
        }
    }

    /// Capture whatever store the host publishes at this moment. With
    /// nothing published the backend is permanently unavailable.
    pub fn capture(host: &HostStorage) -> Self {
        let logger = Logger::new().with_name("primary");
        let store = host.current();
        if store.is_none() {
            logger.warning("no host store published, primary backend disabled");
        }
        Self { store, logger }
    }

    pub fn with_logger(mut self, logger: &Logger) -> Self {
        self.logger = logger.named("primary");
        self
    }

    /// The store usable for this call, if any.
    fn usable(&self) -> Option<&Arc<dyn StringStore>> {
        self.store.as_ref().filter(|store| store.is_available())
    }
}

impl StorageBackend for PrimaryBackend {
    fn name(&self) -> &str {
        "primary"
    }

    fn is_available(&self) -> bool {
        self.usable().is_some()
    }

    fn get(&self, key: &str) -> Option<ConfigValue> {
        let store = self.usable()?;
        let text = match store.get_item(key) {
            Ok(text) => text?,
            Err(e) => {
                self.logger.log_with_data(
                    DiagLevel::Warning,
                    "read failed",
                    json!({"key": key, "error": e.to_string()}),
                );
                return None;
            }
        };

        let parsed = serde_json::from_str::<Value>(&text)
            .map_err(|e| e.to_string())
            .and_then(|value| match value {
                Value::Null => Err("stored null".to_string()),
                value => ConfigValue::try_from(value).map_err(|e| e.to_string()),
            });
        match parsed {
            Ok(value) => Some(value),
            Err(error) => {
                self.logger.log_with_data(
                    DiagLevel::Warning,
                    "unparseable stored value treated as unset",
                    json!({"key": key, "raw": text, "error": error}),
                );
                None
            }
        }
    }

    fn set(&self, key: &str, value: &ConfigValue) -> bool {
        let Some(store) = self.usable() else {
            self.logger.log_with_data(
                DiagLevel::Debug,
                "write skipped",
                ConfigError::unavailable(self.name()).with_key(key).to_json(),
            );
            return false;
        };
        let text = match serde_json::to_string(value) {
            Ok(text) => text,
            Err(e) => {
                self.logger.log_with_data(
                    DiagLevel::Warning,
                    "value not serializable",
                    json!({"key": key, "error": e.to_string()}),
                );
                return false;
            }
        };
        match store.set_item(key, &text) {
            Ok(()) => true,
            Err(e) => {
                self.logger.log_with_data(
                    DiagLevel::Warning,
                    "write failed",
                    json!({"key": key, "error": e.to_string()}),
                );
                false
            }
        }
    }

    fn remove(&self, key: &str) {
        let Some(store) = self.usable() else {
            return;
        };
        if let Err(e) = store.remove_item(key) {
            self.logger.log_with_data(
                DiagLevel::Warning,
                "remove failed",
                json!({"key": key, "error": e.to_string()}),
            );
        }
    }

    fn list_keys(&self) -> Vec<String> {
        let Some(store) = self.usable() else {
            return Vec::new();
        };
        store.keys().unwrap_or_else(|e| {
            self.logger.log_with_data(
                DiagLevel::Warning,
                "listing keys failed",
                json!({"error": e.to_string()}),
            );
            Vec::new()
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStringStore;

    fn backend() -> (PrimaryBackend, Arc<MemoryStringStore>) {
        let store = Arc::new(MemoryStringStore::new());
        (PrimaryBackend::new(store.clone()), store)
    }

    #[test]
    fn values_are_stored_as_json_text() {
        let (primary, store) = backend();
        assert!(primary.set("k_bool", &true.into()));
        assert!(primary.set("k_str", &"fast".into()));
        assert!(primary.set(
            "k_list",
            &ConfigValue::List(vec![1.into(), 2.into()])
        ));

        assert_eq!(store.raw("k_bool").as_deref(), Some("true"));
        assert_eq!(store.raw("k_str").as_deref(), Some("\"fast\""));
        assert_eq!(store.raw("k_list").as_deref(), Some("[1,2]"));
        assert_eq!(primary.get("k_str"), Some("fast".into()));
    }

    #[test]
    fn corrupt_text_reads_as_unset() {
        let (primary, store) = backend();
        store.insert_raw("bad", "{not json");
        store.insert_raw("nul", "null");
        assert_eq!(primary.get("bad"), None);
        assert_eq!(primary.get("nul"), None);
    }

    #[test]
    fn unavailable_store_degrades() {
        let (primary, store) = backend();
        assert!(primary.set("k", &1.into()));
        store.set_available(false);

        assert!(!primary.is_available());
        assert_eq!(primary.get("k"), None);
        assert!(!primary.set("k", &2.into()));
        assert!(primary.list_keys().is_empty());
        primary.remove("k");

        store.set_available(true);
        assert_eq!(primary.get("k"), Some(1.into()));
    }

    #[test]
    fn rejected_write_returns_false() {
        let (primary, store) = backend();
        store.set_reject_writes(true);
        assert!(!primary.set("k", &1.into()));
        assert!(store.is_empty());
    }

    #[test]
    fn capture_ignores_later_host_swaps() {
        let original = Arc::new(MemoryStringStore::new());
        let host = HostStorage::with_string_store(original.clone());
        let primary = PrimaryBackend::capture(&host);

        let hijacked = Arc::new(MemoryStringStore::new());
        host.install(hijacked.clone());
        assert!(primary.set("k", &"v".into()));

        assert_eq!(original.raw("k").as_deref(), Some("\"v\""));
        assert!(hijacked.is_empty());
    }

    #[test]
    fn host_hands_out_latest_install() {
        let host = HostStorage::new();
        assert!(host.current().is_none());

        let first = Arc::new(MemoryStringStore::new());
        let second = Arc::new(MemoryStringStore::new());
        host.install(first.clone());
        host.install(second.clone());

        let current = host.current().unwrap();
        current.set_item("k", "1").unwrap();
        assert!(first.is_empty());
        assert_eq!(second.raw("k").as_deref(), Some("1"));
    }

    #[test]
    fn skipped_write_reports_unavailable_code() {
        let records = Arc::new(std::sync::Mutex::new(Vec::new()));
        let sink_records = records.clone();
        let logger = Logger::new()
            .with_level_filter(Arc::new(crate::logging::LogLevelFilter::new(
                DiagLevel::Debug,
            )))
            .with_sink(Arc::new(move |d: &crate::logging::Diagnostic| {
                sink_records.lock().unwrap().push(d.clone());
            }));
        let primary =
            PrimaryBackend::new(Arc::new(MemoryStringStore::unavailable())).with_logger(&logger);

        assert!(!primary.set("_lcfg_a", &1.into()));
        let records = records.lock().unwrap();
        let data = records[0].data.as_ref().unwrap();
        assert_eq!(data["code"], "BACKEND_UNAVAILABLE");
        assert_eq!(data["key"], "_lcfg_a");
    }

    #[test]
    fn capture_without_store_is_never_available() {
        let host = HostStorage::new();
        let primary = PrimaryBackend::capture(&host);
        host.install(Arc::new(MemoryStringStore::new()));
        assert!(!primary.is_available());
        assert!(!primary.set("k", &1.into()));
    }

    #[test]
    fn clear_only_touches_namespace() {
        let (primary, store) = backend();
        store.insert_raw("theme", "dark");
        primary.set("_lcfg_a", &1.into());
        primary.set("_lcfg_b", &2.into());

        primary.clear("_lcfg_");
        assert_eq!(store.len(), 1);
        assert_eq!(store.raw("theme").as_deref(), Some("dark"));
    }
}
