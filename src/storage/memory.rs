//! In-memory stores for tests and ephemeral runs.
//!
//! Both stores can be switched unavailable, and can be told to reject writes
//! the way a full or read-only host store would.

use super::{Capabilities, StringStore, ValueStore};
use crate::error::{ConfigError, ErrorCode, StoreResult};
use serde_json::Value;
use std::collections::BTreeMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};

fn poisoned() -> ConfigError {
    ConfigError::internal("memory store lock poisoned")
}

fn quota_exceeded(key: &str) -> ConfigError {
    ConfigError::new(ErrorCode::Io, "write rejected: quota exceeded").with_key(key)
}

/// Raw-text store kept in memory.
#[derive(Debug)]
pub struct MemoryStringStore {
    items: Mutex<BTreeMap<String, String>>,
    available: AtomicBool,
    reject_writes: AtomicBool,
}

impl Default for MemoryStringStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryStringStore {
    pub fn new() -> Self {
        Self {
            items: Mutex::new(BTreeMap::new()),
            available: AtomicBool::new(true),
            reject_writes: AtomicBool::new(false),
        }
    }

    /// A store that always reports itself unavailable.
    pub fn unavailable() -> Self {
        let store = Self::new();
        store.set_available(false);
        store
    }

    pub fn set_available(&self, available: bool) {
        self.available.store(available, Ordering::Relaxed);
    }

    pub fn set_reject_writes(&self, reject: bool) {
        self.reject_writes.store(reject, Ordering::Relaxed);
    }

    /// Write raw text directly, bypassing every check.
    pub fn insert_raw(&self, key: &str, value: &str) {
        if let Ok(mut items) = self.items.lock() {
            items.insert(key.to_string(), value.to_string());
        }
    }

    /// Read raw text directly, bypassing every check.
    pub fn raw(&self, key: &str) -> Option<String> {
        self.items.lock().ok()?.get(key).cloned()
    }

    pub fn len(&self) -> usize {
        self.items.lock().map(|items| items.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl StringStore for MemoryStringStore {
    fn is_available(&self) -> bool {
        self.available.load(Ordering::Relaxed)
    }

    fn get_item(&self, key: &str) -> StoreResult<Option<String>> {
        Ok(self.items.lock().map_err(|_| poisoned())?.get(key).cloned())
    }

    fn set_item(&self, key: &str, value: &str) -> StoreResult<()> {
        if self.reject_writes.load(Ordering::Relaxed) {
            return Err(quota_exceeded(key));
        }
        self.items
            .lock()
            .map_err(|_| poisoned())?
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove_item(&self, key: &str) -> StoreResult<()> {
        self.items.lock().map_err(|_| poisoned())?.remove(key);
        Ok(())
    }

    fn keys(&self) -> StoreResult<Vec<String>> {
        Ok(self.items.lock().map_err(|_| poisoned())?.keys().cloned().collect())
    }
}

/// Structured-value store kept in memory.
#[derive(Debug)]
pub struct MemoryValueStore {
    values: Mutex<BTreeMap<String, Value>>,
    capabilities: Mutex<Capabilities>,
    reject_writes: AtomicBool,
}

impl Default for MemoryValueStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryValueStore {
    pub fn new() -> Self {
        Self {
            values: Mutex::new(BTreeMap::new()),
            capabilities: Mutex::new(Capabilities::all()),
            reject_writes: AtomicBool::new(false),
        }
    }

    /// A store offering no operations.
    pub fn unavailable() -> Self {
        let store = Self::new();
        store.set_capabilities(Capabilities::none());
        store
    }

    pub fn set_capabilities(&self, capabilities: Capabilities) {
        if let Ok(mut caps) = self.capabilities.lock() {
            *caps = capabilities;
        }
    }

    pub fn set_reject_writes(&self, reject: bool) {
        self.reject_writes.store(reject, Ordering::Relaxed);
    }

    /// Write a value directly, bypassing every check.
    pub fn insert_raw(&self, key: &str, value: Value) {
        if let Ok(mut values) = self.values.lock() {
            values.insert(key.to_string(), value);
        }
    }

    pub fn raw(&self, key: &str) -> Option<Value> {
        self.values.lock().ok()?.get(key).cloned()
    }

    pub fn len(&self) -> usize {
        self.values.lock().map(|values| values.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl ValueStore for MemoryValueStore {
    fn capabilities(&self) -> Capabilities {
        self.capabilities
            .lock()
            .map(|caps| *caps)
            .unwrap_or_else(|_| Capabilities::none())
    }

    fn get_value(&self, key: &str) -> StoreResult<Option<Value>> {
        Ok(self.values.lock().map_err(|_| poisoned())?.get(key).cloned())
    }

    fn set_value(&self, key: &str, value: &Value) -> StoreResult<()> {
        if self.reject_writes.load(Ordering::Relaxed) {
            return Err(quota_exceeded(key));
        }
        self.values
            .lock()
            .map_err(|_| poisoned())?
            .insert(key.to_string(), value.clone());
        Ok(())
    }

    fn delete_value(&self, key: &str) -> StoreResult<()> {
        self.values.lock().map_err(|_| poisoned())?.remove(key);
        Ok(())
    }

    fn list_values(&self) -> StoreResult<Vec<String>> {
        Ok(self.values.lock().map_err(|_| poisoned())?.keys().cloned().collect())
    }
}
