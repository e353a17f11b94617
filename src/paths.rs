//! Dotted config paths and their storage keys.
//!
//! This module provides:
//! - `ConfigPath`, a validated dotted path such as `media.volume`
//! - `KeyCodec`, the namespaced path ⇄ storage key mapping
//! - `read_path` / `write_path` over a nested `ConfigMap`
//!
//! Pure string manipulation, no I/O.
//!
//! ## Key encoding
//! A key is the namespace followed by the path segments joined with `_`.
//! Inside a segment `%` is written as `%25` and `_` as `%5F`, so every key
//! decodes to exactly one path. Paths without `_` or `%` encode the same way
//! as a plain `replace('.', '_')`.

use crate::value::{ConfigMap, ConfigValue};
use std::fmt;
use thiserror::Error;

/// Namespace used when none is configured.
pub const DEFAULT_NAMESPACE: &str = "_lcfg_";

/// Separator between encoded segments in a storage key.
const KEY_SEPARATOR: char = '_';

/// Why a string is not a valid config path.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PathError {
    #[error("path is empty")]
    Empty,
    #[error("path '{0}' has an empty segment")]
    EmptySegment(String),
    #[error("segment '{0}' contains a dot")]
    DottedSegment(String),
}

/// A non-empty dotted path with non-empty segments.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ConfigPath(String);

impl ConfigPath {
    /// Validate a dotted path. Invalid input is rejected, never normalized.
    pub fn parse(path: &str) -> Result<Self, PathError> {
        if path.is_empty() {
            return Err(PathError::Empty);
        }
        if path.split('.').any(str::is_empty) {
            return Err(PathError::EmptySegment(path.to_string()));
        }
        Ok(Self(path.to_string()))
    }

    /// Build a path from already-split segments.
    pub fn from_segments<I, S>(segments: I) -> Result<Self, PathError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let segments = segments
            .into_iter()
            .map(|s| s.as_ref().to_string())
            .collect::<Vec<_>>();
        if let Some(dotted) = segments.iter().find(|s| s.contains('.')) {
            return Err(PathError::DottedSegment(dotted.clone()));
        }
        Self::parse(&segments.join("."))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn segments(&self) -> impl Iterator<Item = &str> {
        self.0.split('.')
    }
}

impl fmt::Display for ConfigPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::str::FromStr for ConfigPath {
    type Err = PathError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

/// Namespaced flat key derived from a `ConfigPath`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct StorageKey(String);

impl StorageKey {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Display for StorageKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Maps config paths to storage keys under one namespace.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyCodec {
    namespace: String,
}

impl Default for KeyCodec {
    fn default() -> Self {
        Self::new(DEFAULT_NAMESPACE)
    }
}

impl KeyCodec {
    pub fn new(namespace: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
        }
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    /// Whether a native backend key belongs to this namespace.
    pub fn owns(&self, key: &str) -> bool {
        key.starts_with(&self.namespace)
    }

    pub fn encode_key(&self, path: &ConfigPath) -> StorageKey {
        let mut key = self.namespace.clone();
        for (i, segment) in path.segments().enumerate() {
            if i > 0 {
                key.push(KEY_SEPARATOR);
            }
            escape_segment(segment, &mut key);
        }
        StorageKey(key)
    }

    /// Inverse of `encode_key`. `None` for keys outside the namespace or
    /// keys the encoder could not have produced.
    pub fn decode_key(&self, key: &str) -> Option<ConfigPath> {
        let body = key.strip_prefix(self.namespace.as_str())?;
        let mut segments = Vec::new();
        for raw in body.split(KEY_SEPARATOR) {
            let segment = urlencoding::decode(raw).ok()?;
            if segment.is_empty() || segment.contains('.') {
                return None;
            }
            segments.push(segment.into_owned());
        }
        let path = ConfigPath::from_segments(segments).ok()?;
        // Reject alternate spellings such as `%41` for `A`
        (self.encode_key(&path).as_str() == key).then_some(path)
    }
}

fn escape_segment(segment: &str, out: &mut String) {
    for c in segment.chars() {
        match c {
            '%' => out.push_str("%25"),
            '_' => out.push_str("%5F"),
            c => out.push(c),
        }
    }
}

/// Look up a value by path. Absent when a segment is missing or an
/// intermediate value is not a map.
pub fn read_path<'a>(tree: &'a ConfigMap, path: &ConfigPath) -> Option<&'a ConfigValue> {
    let mut segments = path.segments();
    let first = segments.next()?;
    let mut current = tree.get(first)?;
    for segment in segments {
        current = current.as_map()?.get(segment)?;
    }
    Some(current)
}

/// Set a value by path, creating intermediate maps and replacing any
/// non-map value standing in the way.
pub fn write_path(tree: &mut ConfigMap, path: &ConfigPath, value: ConfigValue) {
    let segments: Vec<&str> = path.segments().collect();
    let Some((last, parents)) = segments.split_last() else {
        return;
    };

    let mut current = tree;
    for segment in parents {
        let entry = current
            .entry(segment.to_string())
            .or_insert_with(ConfigValue::empty_map);
        if !matches!(entry, ConfigValue::Map(_)) {
            *entry = ConfigValue::empty_map();
        }
        let ConfigValue::Map(map) = entry else {
            return;
        };
        current = map;
    }
    current.insert(last.to_string(), value);
}
