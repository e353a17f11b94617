//! Directory-backed raw-text store: one file per key.
//!
//! File names are the percent-encoded key plus `.val`. Each write goes to
//! its own hidden temp file that is renamed over the target, so a reader in another
//! process sees either the old or the new text for a key, never a mix.

use super::StringStore;
use crate::error::{ConfigError, StoreResult};
use std::fs;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

const VALUE_EXT: &str = ".val";
const TEMP_EXT: &str = ".tmp";

#[derive(Debug, Clone)]
pub struct DirStringStore {
    root: PathBuf,
}

impl DirStringStore {
    /// Use `root` as the store, creating it when missing.
    pub fn open<P: AsRef<Path>>(root: P) -> StoreResult<Self> {
        let root = root.as_ref().to_path_buf();
        fs::create_dir_all(&root)?;
        Ok(Self { root })
    }

    /// Use `root` without creating it. The store stays unavailable until the
    /// directory exists.
    pub fn at<P: AsRef<Path>>(root: P) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
        }
    }

    fn file_for(&self, key: &str) -> PathBuf {
        self.root
            .join(format!("{}{}", urlencoding::encode(key), VALUE_EXT))
    }

}

impl StringStore for DirStringStore {
    fn is_available(&self) -> bool {
        self.root.is_dir()
    }

    fn get_item(&self, key: &str) -> StoreResult<Option<String>> {
        match fs::read_to_string(self.file_for(key)) {
            Ok(text) => Ok(Some(text)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(ConfigError::from(e).with_key(key)),
        }
    }

    fn set_item(&self, key: &str, value: &str) -> StoreResult<()> {
        // Unique temp file per write; dropped (and deleted) on any failure
        let write = || -> std::io::Result<()> {
            let mut temp = tempfile::Builder::new()
                .prefix(".")
                .suffix(TEMP_EXT)
                .tempfile_in(&self.root)?;
            temp.write_all(value.as_bytes())?;
            temp.as_file().sync_all()?;
            temp.persist(self.file_for(key)).map_err(|e| e.error)?;
            Ok(())
        };
        write().map_err(|e| ConfigError::from(e).with_key(key))
    }

    fn remove_item(&self, key: &str) -> StoreResult<()> {
        match fs::remove_file(self.file_for(key)) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(ConfigError::from(e).with_key(key)),
        }
    }

    fn keys(&self) -> StoreResult<Vec<String>> {
        let mut keys = Vec::new();
        for entry in fs::read_dir(&self.root)? {
            let name = entry?.file_name();
            let Some(name) = name.to_str() else {
                continue;
            };
            if name.starts_with('.') && name.ends_with(TEMP_EXT) {
                continue;
            }
            let Some(encoded) = name.strip_suffix(VALUE_EXT) else {
                continue;
            };
            // Files this store did not write may share the directory
            let Ok(key) = urlencoding::decode(encoded) else {
                continue;
            };
            if urlencoding::encode(&key) != encoded {
                continue;
            }
            keys.push(key.into_owned());
        }
        keys.sort();
        Ok(keys)
    }
}
