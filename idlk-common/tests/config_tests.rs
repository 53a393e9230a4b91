//! Tests for configuration loading and database path resolution
//!
//! Tests that manipulate IDLK_DATABASE are marked #[serial] so they never
//! observe each other's environment.

use idlk_common::config::{
    default_database_path, resolve_database_path, NoveltyMode, TomlConfig, DATABASE_ENV_VAR,
};
use serial_test::serial;
use std::env;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

#[test]
fn test_missing_config_file_uses_defaults() {
    let temp_dir = TempDir::new().unwrap();
    let config = TomlConfig::load(&temp_dir.path().join("absent.toml")).unwrap();

    assert_eq!(config.port, 3000);
    assert!(config.database_path.is_none());
    assert_eq!(config.resolver.novelty, NoveltyMode::Exact);
}

#[test]
fn test_missing_config_file_left_absent() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("nested").join("idlk-ir.toml");

    let config = TomlConfig::load(&path).unwrap();

    assert_eq!(config.logging.level, "info");
    assert!(!path.exists());
    assert!(!path.parent().unwrap().exists());
}

#[test]
fn test_config_file_loaded() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("idlk-ir.toml");
    std::fs::write(
        &path,
        r#"
database_path = "/srv/idlk/contacts.db"
port = 8080

[logging]
level = "debug"

[database]
max_connections = 4
busy_timeout_ms = 100

[resolver]
max_attempts = 3
novelty = "present_fields"
"#,
    )
    .unwrap();

    let config = TomlConfig::load(&path).unwrap();
    assert_eq!(config.database_path, Some(PathBuf::from("/srv/idlk/contacts.db")));
    assert_eq!(config.port, 8080);
    assert_eq!(config.logging.level, "debug");
    assert_eq!(config.database.max_connections, 4);
    assert_eq!(config.database.busy_timeout_ms, 100);
    assert_eq!(config.resolver.max_attempts, 3);
    assert_eq!(config.resolver.initial_backoff_ms, 10);
    assert_eq!(config.resolver.novelty, NoveltyMode::PresentFields);
}

#[test]
fn test_malformed_config_file_is_error() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("idlk-ir.toml");
    std::fs::write(&path, "port = \"not a number\"").unwrap();

    assert!(TomlConfig::load(&path).is_err());
}

#[test]
#[serial]
fn test_cli_argument_wins() {
    env::set_var(DATABASE_ENV_VAR, "/from/env.db");
    let config = TomlConfig {
        database_path: Some(PathBuf::from("/from/toml.db")),
        ..TomlConfig::default()
    };

    let path = resolve_database_path(Some(Path::new("/from/cli.db")), DATABASE_ENV_VAR, &config);
    env::remove_var(DATABASE_ENV_VAR);

    assert_eq!(path, PathBuf::from("/from/cli.db"));
}

#[test]
#[serial]
fn test_environment_beats_toml() {
    env::set_var(DATABASE_ENV_VAR, "/from/env.db");
    let config = TomlConfig {
        database_path: Some(PathBuf::from("/from/toml.db")),
        ..TomlConfig::default()
    };

    let path = resolve_database_path(None, DATABASE_ENV_VAR, &config);
    env::remove_var(DATABASE_ENV_VAR);

    assert_eq!(path, PathBuf::from("/from/env.db"));
}

#[test]
#[serial]
fn test_toml_beats_default() {
    env::remove_var(DATABASE_ENV_VAR);
    let config = TomlConfig {
        database_path: Some(PathBuf::from("/from/toml.db")),
        ..TomlConfig::default()
    };

    assert_eq!(
        resolve_database_path(None, DATABASE_ENV_VAR, &config),
        PathBuf::from("/from/toml.db")
    );
}

#[test]
#[serial]
fn test_no_overrides_uses_default() {
    env::remove_var(DATABASE_ENV_VAR);

    assert_eq!(
        resolve_database_path(None, DATABASE_ENV_VAR, &TomlConfig::default()),
        default_database_path()
    );
}
