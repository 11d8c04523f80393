//! Tests for config.rs file loading

use std::fs;

use dextd::config::{Config, ConfigSource};
use dextd::ReplacementPolicy;
use tempfile::TempDir;

#[test]
fn test_load_from_file() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("config.toml");
    fs::write(
        &path,
        r#"
[extension]
identifier = "com.example.custom.driver"

[controller]
replacement_policy = "never"
history_limit = 8

[log]
level = "debug"
"#,
    )
    .unwrap();

    let config = Config::load(Some(&path));
    assert_eq!(config.extension.identifier, "com.example.custom.driver");
    assert_eq!(config.controller.replacement_policy, ReplacementPolicy::Never);
    assert_eq!(config.controller.history_limit, 8);
    assert_eq!(config.log.level, "debug");
}

#[test]
fn test_invalid_file_falls_back_to_defaults() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("config.toml");
    fs::write(&path, "this is [not toml").unwrap();

    assert!(Config::load_from_path(&path).is_err());
    let config = Config::load(Some(&path));
    assert_eq!(
        config.extension.identifier,
        dext_shared::DEFAULT_DEXT_IDENTIFIER
    );
}

#[test]
fn test_saved_default_is_loadable() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("nested").join("config.toml");

    Config::save_default(&path).unwrap();
    let config = Config::load_from_path(&path).unwrap();
    assert_eq!(config.controller.replacement_policy, ReplacementPolicy::AlwaysReplace);
    assert!(config.controller.activation_timeout_ms.is_none());
}

#[test]
fn test_load_with_source_names_file() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("config.toml");
    fs::write(&path, "[log]\nlevel = \"warn\"\n").unwrap();

    let (config, source) = Config::load_with_source(Some(&path));
    assert_eq!(config.log.level, "warn");
    assert_eq!(source, ConfigSource::File(path));
}

#[test]
fn test_load_with_source_keeps_parse_error() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("config.toml");
    fs::write(&path, "this is [not toml").unwrap();

    let (_, source) = Config::load_with_source(Some(&path));
    match source {
        ConfigSource::Defaults(reason) => assert!(reason.contains("Failed to parse"), "{}", reason),
        other => panic!("expected defaults, got {:?}", other),
    }
}
