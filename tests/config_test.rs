//! Integration tests for Settings loading and config file creation.
//!
//! Precedence, lowest to highest: defaults, global file, local file, env.
//! These tests pass the global path, an explicit local file and an injected
//! environment, so neither the user's config nor the process environment
//! leaks in.

use std::fs;
use std::path::PathBuf;

use config::Environment;
use tempfile::TempDir;

use tagtree::application::ApplicationError;
use tagtree::cli::commands::init_config;
use tagtree::cli::CliError;
use tagtree::config::{OutputFormat, Settings};
use tagtree::domain::DanglingParents;
use tagtree::infrastructure::di::ServiceContainer;

fn env_from(pairs: &[(&str, &str)]) -> Environment {
    let map: config::Map<String, String> = pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
    Environment::with_prefix("TAGTREE")
        .prefix_separator("_")
        .separator("__")
        .source(Some(map))
}

#[test]
fn given_local_config_when_load_then_file_values_apply() {
    // Arrange
    let dir = TempDir::new().unwrap();
    let config_path = dir.path().join("tagtree.toml");
    fs::write(
        &config_path,
        r#"
input = "/data/tags.json"
format = "ascii"
dangling_parents = "exclude"
"#,
    )
    .unwrap();

    // Act
    let settings =
        Settings::load_layered(None, Some(config_path.as_path()), env_from(&[])).unwrap();

    // Assert
    assert_eq!(settings.input, Some(PathBuf::from("/data/tags.json")));
    assert_eq!(settings.format, OutputFormat::Ascii);
    assert!(settings.pretty, "unset keys keep their default");
    assert_eq!(settings.dangling_parents, DanglingParents::Exclude);
}

#[test]
fn given_local_config_and_env_when_load_then_env_wins() {
    // Arrange
    let dir = TempDir::new().unwrap();
    let config_path = dir.path().join("tagtree.toml");
    fs::write(&config_path, "format = \"ascii\"\npretty = true\n").unwrap();
    let env = env_from(&[("TAGTREE_FORMAT", "json"), ("TAGTREE_PRETTY", "false")]);

    // Act
    let settings = Settings::load_layered(None, Some(config_path.as_path()), env).unwrap();

    // Assert
    assert_eq!(settings.format, OutputFormat::Json);
    assert!(!settings.pretty);
}

#[test]
fn given_global_and_local_config_when_load_then_local_wins_per_key() {
    // Arrange
    let dir = TempDir::new().unwrap();
    let global_path = dir.path().join("global.toml");
    let local_path = dir.path().join("local.toml");
    fs::write(&global_path, "format = \"ascii\"\npretty = false\n").unwrap();
    fs::write(&local_path, "pretty = true\n").unwrap();

    // Act
    let settings = Settings::load_layered(
        Some(global_path.as_path()),
        Some(local_path.as_path()),
        env_from(&[]),
    )
    .unwrap();

    // Assert
    assert_eq!(settings.format, OutputFormat::Ascii, "global value kept");
    assert!(settings.pretty, "local value wins");
}

#[test]
fn given_missing_global_config_when_load_then_uses_defaults() {
    // Arrange
    let dir = TempDir::new().unwrap();
    let global_path = dir.path().join("absent.toml");

    // Act
    let settings = Settings::load_layered(
        Some(global_path.as_path()),
        None,
        env_from(&[("TAGTREE_INPUT", "/data/tags.json")]),
    )
    .unwrap();

    // Assert
    assert_eq!(settings.input, Some(PathBuf::from("/data/tags.json")));
    assert_eq!(settings.format, OutputFormat::Json);
}

#[test]
fn given_bad_pretty_env_when_load_then_returns_config_error() {
    // Arrange
    let env = env_from(&[("TAGTREE_PRETTY", "maybe")]);

    // Act
    let result = Settings::load_layered(None, None, env);

    // Assert
    assert!(matches!(result, Err(ApplicationError::Config { .. })));
}

#[test]
fn given_missing_explicit_config_when_load_then_returns_config_error() {
    // Arrange
    let dir = TempDir::new().unwrap();
    let config_path = dir.path().join("absent.toml");

    // Act
    let result = Settings::load_layered(None, Some(config_path.as_path()), env_from(&[]));

    // Assert
    assert!(matches!(result, Err(ApplicationError::Config { .. })));
}

#[test]
fn given_unknown_policy_in_config_when_load_then_returns_config_error() {
    // Arrange
    let dir = TempDir::new().unwrap();
    let config_path = dir.path().join("tagtree.toml");
    fs::write(&config_path, "dangling_parents = \"sometimes\"\n").unwrap();

    // Act
    let result = Settings::load_layered(None, Some(config_path.as_path()), env_from(&[]));

    // Assert
    assert!(matches!(result, Err(ApplicationError::Config { .. })));
}

#[test]
fn given_empty_target_when_init_config_then_writes_loadable_template() {
    // Arrange
    let dir = TempDir::new().unwrap();
    let target = dir.path().join("nested").join("tagtree.toml");
    let container = ServiceContainer::new(Settings::default());

    // Act
    init_config(&container, &target, false).unwrap();

    // Assert
    let settings =
        Settings::load_layered(None, Some(target.as_path()), env_from(&[])).unwrap();
    assert_eq!(settings, Settings::default());
}

#[test]
fn given_existing_target_when_init_config_without_force_then_refuses() {
    // Arrange
    let dir = TempDir::new().unwrap();
    let target = dir.path().join("tagtree.toml");
    fs::write(&target, "format = \"ascii\"\n").unwrap();
    let container = ServiceContainer::new(Settings::default());

    // Act
    let result = init_config(&container, &target, false);

    // Assert
    assert!(matches!(result, Err(CliError::Usage(_))));
    assert_eq!(fs::read_to_string(&target).unwrap(), "format = \"ascii\"\n");

    init_config(&container, &target, true).unwrap();
    assert_eq!(fs::read_to_string(&target).unwrap(), Settings::template());
}
