//! Layered Config Library
//!
//! Per-key configuration resolved across a primary raw-text store, a
//! secondary structured store, and an in-memory default tree.

pub mod cli;
pub mod config;
pub mod db;
pub mod defaults;
pub mod error;
pub mod format;
pub mod logging;
pub mod paths;
pub mod resolver;
pub mod storage;
pub mod value;

pub use defaults::DefaultTree;
pub use error::{ConfigError, ErrorCode};
pub use paths::{ConfigPath, KeyCodec, StorageKey};
pub use resolver::{ConfigListing, ConfigResolver, Resolved, StoreTier, ValueSource};
pub use value::{ConfigMap, ConfigValue};
