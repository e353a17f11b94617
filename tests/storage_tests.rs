//! Integration tests for the on-disk stores.
//!
//! A "restart" is modeled by dropping every handle and reopening the same
//! directory and database file.

use layered_config::config::{Config, PrimaryConfig, SecondaryConfig};
use layered_config::db::Database;
use layered_config::logging::Logger;
use layered_config::storage::{
    DirStringStore, PrimaryBackend, SecondaryBackend, StorageBackend, StringStore, ValueStore,
};
use layered_config::{ConfigResolver, ConfigValue, DefaultTree, StoreTier, ValueSource};
use serde_json::json;
use std::sync::Arc;
use tempfile::TempDir;

fn config_in(temp: &TempDir) -> Config {
    Config {
        primary: PrimaryConfig {
            enabled: true,
            dir: temp.path().join("primary"),
        },
        secondary: SecondaryConfig {
            enabled: true,
            db_path: temp.path().join("data").join("secondary.db"),
        },
        ..Config::default()
    }
}

fn open_resolver(config: &Config, seed: serde_json::Value) -> ConfigResolver {
    ConfigResolver::open(
        config,
        DefaultTree::from_json(seed).expect("valid seed"),
        &Logger::new(),
    )
}

mod dir_store_tests {
    use super::*;

    #[test]
    fn items_survive_reopen() {
        let temp = TempDir::new().unwrap();
        {
            let store = DirStringStore::open(temp.path().join("s")).unwrap();
            store.set_item("_lcfg_media_volume", "0.5").unwrap();
            store.set_item("odd/key with spaces", "\"x\"").unwrap();
        }

        let store = DirStringStore::open(temp.path().join("s")).unwrap();
        assert_eq!(
            store.get_item("_lcfg_media_volume").unwrap().as_deref(),
            Some("0.5")
        );
        assert_eq!(
            store.keys().unwrap(),
            vec!["_lcfg_media_volume".to_string(), "odd/key with spaces".to_string()]
        );
    }

    #[test]
    fn foreign_file_does_not_hide_namespace_entries() {
        let temp = TempDir::new().unwrap();
        let config = config_in(&temp);
        let mut resolver = open_resolver(&config, json!({}));
        assert!(resolver.set("media.volume", 1));

        std::fs::write(config.primary.dir.join("%FF.val"), "foreign").unwrap();

        assert_eq!(
            resolver.list().primary.get("media.volume"),
            Some(&ConfigValue::from(1))
        );
        resolver.clear();
        assert!(!config.primary.dir.join("_lcfg_media_volume.val").exists());
        assert!(config.primary.dir.join("%FF.val").exists());
    }

    #[test]
    fn missing_directory_is_unavailable() {
        let temp = TempDir::new().unwrap();
        let store = DirStringStore::at(temp.path().join("absent"));
        assert!(!store.is_available());

        let backend = PrimaryBackend::new(Arc::new(store));
        assert!(!backend.set("k", &ConfigValue::from(1)));
        assert!(backend.list_keys().is_empty());
    }

    #[test]
    fn removed_directory_turns_store_off() {
        let temp = TempDir::new().unwrap();
        let root = temp.path().join("s");
        let backend = PrimaryBackend::new(Arc::new(DirStringStore::open(&root).unwrap()));
        assert!(backend.is_available());

        std::fs::remove_dir_all(&root).unwrap();
        assert!(!backend.is_available());
        assert_eq!(backend.get("k"), None);
    }
}

mod database_tests {
    use super::*;

    #[test]
    fn values_survive_reopen() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("values.db");
        {
            let db = Database::open(&path).unwrap();
            db.set_value("_lcfg_hotkeys", &json!({"play": "space"})).unwrap();
            db.set_value("_lcfg_debug", &json!(false)).unwrap();
        }

        let db = Database::open(&path).unwrap();
        assert_eq!(
            db.get_value("_lcfg_hotkeys").unwrap(),
            Some(json!({"play": "space"}))
        );
        assert_eq!(
            db.list_values().unwrap(),
            vec!["_lcfg_debug".to_string(), "_lcfg_hotkeys".to_string()]
        );
    }

    #[test]
    fn backend_over_database_round_trips() {
        let db = Arc::new(Database::open_in_memory().unwrap());
        let backend = SecondaryBackend::new(db.clone());
        assert!(backend.is_available());

        assert!(backend.set("_lcfg_media_rate", &ConfigValue::from(2)));
        assert_eq!(backend.get("_lcfg_media_rate"), Some(ConfigValue::from(2)));

        db.set_value("foreign", &json!("keep")).unwrap();
        backend.clear("_lcfg_");
        assert_eq!(db.list_values().unwrap(), vec!["foreign".to_string()]);
    }
}

mod resolver_on_disk {
    use super::*;

    #[test]
    fn primary_value_survives_restart() {
        let temp = TempDir::new().unwrap();
        let config = config_in(&temp);
        {
            let mut resolver = open_resolver(&config, json!({"media": {"volume": 1}}));
            assert!(resolver.set("media.volume", ConfigValue::from_f64(0.25).unwrap()));
        }

        let resolver = open_resolver(&config, json!({"media": {"volume": 1}}));
        let resolved = resolver.resolve("media.volume").unwrap();
        assert_eq!(resolved.source, ValueSource::Primary);
        assert_eq!(resolved.value.as_f64(), Some(0.25));
        assert!(temp.path().join("primary").join("_lcfg_media_volume.val").exists());
    }

    #[test]
    fn disabled_primary_persists_to_database() {
        let temp = TempDir::new().unwrap();
        let mut config = config_in(&temp);
        config.primary.enabled = false;
        {
            let mut resolver = open_resolver(&config, json!({}));
            assert!(resolver.set("enhance.blockSetVolume", true));
        }

        let resolver = open_resolver(&config, json!({}));
        assert_eq!(
            resolver.resolve("enhance.blockSetVolume").map(|r| r.source),
            Some(ValueSource::Secondary)
        );
        assert!(!temp.path().join("primary").exists());
    }

    #[test]
    fn both_disabled_falls_back_to_seed_after_restart() {
        let temp = TempDir::new().unwrap();
        let mut config = config_in(&temp);
        config.primary.enabled = false;
        config.secondary.enabled = false;
        {
            let mut resolver = open_resolver(&config, json!({"debug": true}));
            assert!(!resolver.set("debug", false));
            assert_eq!(resolver.get("debug"), Some(ConfigValue::from(false)));
        }

        let resolver = open_resolver(&config, json!({"debug": true}));
        assert_eq!(resolver.get("debug"), Some(ConfigValue::from(true)));
    }

    #[test]
    fn namespace_from_config_scopes_clear() {
        let temp = TempDir::new().unwrap();
        let mut config = config_in(&temp);
        config.namespace = "_app_".to_string();
        let mut app = open_resolver(&config, json!({}));
        assert!(app.set("volume", 1));
        assert!(app.set_in(StoreTier::Secondary, "rate", 2));

        let mut other_config = config.clone();
        other_config.namespace = "_other_".to_string();
        let mut other = open_resolver(&other_config, json!({}));
        assert!(other.set("volume", 5));

        app.clear();
        let listing = other.list();
        assert_eq!(
            listing.primary.get("volume"),
            Some(&ConfigValue::from(5))
        );
        assert!(app.list().primary.is_empty());
        assert!(app.list().secondary.is_empty());
    }
}
