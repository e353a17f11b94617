//! Storage backends.
//!
//! Two layers:
//! - Raw stores: `StringStore` (raw text per key) and `ValueStore`
//!   (structured JSON per key). These report failures as `StoreResult`.
//! - `StorageBackend`: the uniform, non-failing contract the resolver uses.
//!   `PrimaryBackend` adapts a `StringStore`, `SecondaryBackend` adapts a
//!   `ValueStore`. Failures degrade to absent values, `false` or no-ops and
//!   are reported through the backend's `Logger`.
//!
//! Availability is checked on every call and never cached.

mod file;
mod memory;
mod primary;
mod secondary;

pub use file::DirStringStore;
pub use memory::{MemoryStringStore, MemoryValueStore};
pub use primary::{HostStorage, PrimaryBackend};
pub use secondary::SecondaryBackend;

use crate::error::StoreResult;
use crate::value::ConfigValue;
use serde_json::Value;

/// Host store holding raw text per key.
pub trait StringStore: Send + Sync {
    /// Whether the store can be used right now.
    fn is_available(&self) -> bool;

    fn get_item(&self, key: &str) -> StoreResult<Option<String>>;

    fn set_item(&self, key: &str, value: &str) -> StoreResult<()>;

    fn remove_item(&self, key: &str) -> StoreResult<()>;

    /// Every key currently stored, including keys of unrelated users.
    fn keys(&self) -> StoreResult<Vec<String>>;
}

/// Operations a `ValueStore` currently offers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Capabilities {
    pub get: bool,
    pub set: bool,
    pub delete: bool,
    pub list: bool,
}

impl Capabilities {
    pub const fn all() -> Self {
        Self {
            get: true,
            set: true,
            delete: true,
            list: true,
        }
    }

    pub const fn none() -> Self {
        Self {
            get: false,
            set: false,
            delete: false,
            list: false,
        }
    }

    pub fn is_complete(&self) -> bool {
        self.get && self.set && self.delete && self.list
    }
}

/// Host store holding structured values per key.
pub trait ValueStore: Send + Sync {
    fn capabilities(&self) -> Capabilities;

    fn get_value(&self, key: &str) -> StoreResult<Option<Value>>;

    fn set_value(&self, key: &str, value: &Value) -> StoreResult<()>;

    fn delete_value(&self, key: &str) -> StoreResult<()>;

    fn list_values(&self) -> StoreResult<Vec<String>>;
}

/// Uniform backend contract. No method fails: unavailability and errors
/// degrade to absent, `false`, empty or no-op.
pub trait StorageBackend: Send + Sync {
    /// Short name used in diagnostics and listings.
    fn name(&self) -> &str;

    fn is_available(&self) -> bool;

    fn get(&self, key: &str) -> Option<ConfigValue>;

    fn set(&self, key: &str, value: &ConfigValue) -> bool;

    fn remove(&self, key: &str);

    /// All native keys, unfiltered. Empty when unavailable.
    fn list_keys(&self) -> Vec<String>;

    /// Remove every key under `namespace`, leaving other keys untouched.
    fn clear(&self, namespace: &str) {
        if !self.is_available() {
            return;
        }
        for key in self.list_keys() {
            if key.starts_with(namespace) {
                self.remove(&key);
            }
        }
    }
}
