//! Tests for configuration loading and environment overrides.

use std::collections::HashMap;
use std::fs;

use tempfile::TempDir;

use leaderboard_store::{AppConfig, Backend, KeySpace};

fn write_config(dir: &TempDir, content: &str) -> std::path::PathBuf {
    let path = dir.path().join("leaderboard.toml");
    fs::write(&path, content).expect("Failed to write TOML");
    path
}

fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
    let vars: HashMap<String, String> = pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
    move |name| vars.get(name).cloned()
}

#[test]
fn test_defaults() {
    let config = AppConfig::default();
    assert_eq!(config.host(), "127.0.0.1");
    assert_eq!(*config.port(), 3000);
    assert_eq!(*config.backend(), Backend::Redis);
    assert_eq!(config.keys(), &KeySpace::default());
}

#[test]
fn test_missing_file_uses_defaults() {
    let dir = TempDir::new().expect("Failed to create temp dir");
    let config = AppConfig::load_or_default(dir.path().join("absent.toml")).expect("Load failed");
    assert_eq!(*config.port(), 3000);
}

#[test]
fn test_full_file() {
    let dir = TempDir::new().expect("Failed to create temp dir");
    let path = write_config(
        &dir,
        r#"host = "0.0.0.0"
port = 8080
backend = "memory"
redis_url = "redis://cache:6379/2"

[keys]
prefix = "game:user"
leaderboard = "game:leaderboard"
"#,
    );

    let config = AppConfig::from_file(&path).expect("Load failed");
    assert_eq!(config.host(), "0.0.0.0");
    assert_eq!(*config.port(), 8080);
    assert_eq!(*config.backend(), Backend::Memory);
    assert_eq!(config.redis_url(), "redis://cache:6379/2");
    assert_eq!(config.keys().prefix(), "game:user");
    assert_eq!(config.keys().leaderboard(), "game:leaderboard");
}

#[test]
fn test_partial_file_fills_defaults() {
    let dir = TempDir::new().expect("Failed to create temp dir");
    let path = write_config(&dir, "port = 9000\n\n[keys]\nprefix = \"p\"\n");

    let config = AppConfig::from_file(&path).expect("Load failed");
    assert_eq!(*config.port(), 9000);
    assert_eq!(config.host(), "127.0.0.1");
    assert_eq!(config.keys().prefix(), "p");
    assert_eq!(config.keys().leaderboard(), "leaderboard");
}

#[test]
fn test_invalid_file_is_an_error() {
    let dir = TempDir::new().expect("Failed to create temp dir");
    let path = write_config(&dir, "this is not valid toml !!!@@@");
    assert!(AppConfig::from_file(&path).is_err());

    let path = write_config(&dir, "backend = \"postgres\"\n");
    assert!(AppConfig::load_or_default(&path).is_err());
}

#[test]
fn test_overrides_replace_file_values() {
    let config = AppConfig::default()
        .with_overrides(lookup_from(&[
            ("LEADERBOARD_HOST", "0.0.0.0"),
            ("LEADERBOARD_PORT", "4000"),
            ("LEADERBOARD_BACKEND", "Memory"),
            ("REDIS_URL", "redis://elsewhere/"),
            ("LEADERBOARD_KEY", "lb"),
        ]))
        .expect("Overrides failed");

    assert_eq!(config.host(), "0.0.0.0");
    assert_eq!(*config.port(), 4000);
    assert_eq!(*config.backend(), Backend::Memory);
    assert_eq!(config.redis_url(), "redis://elsewhere/");
    assert_eq!(config.keys().prefix(), "user");
    assert_eq!(config.keys().leaderboard(), "lb");
}

#[test]
fn test_invalid_overrides_are_errors() {
    let bad_port = AppConfig::default().with_overrides(lookup_from(&[("LEADERBOARD_PORT", "http")]));
    assert!(bad_port.is_err());

    let bad_backend =
        AppConfig::default().with_overrides(lookup_from(&[("LEADERBOARD_BACKEND", "sqlite")]));
    assert!(bad_backend.is_err());
}

#[test]
fn test_listen_flags_take_precedence() {
    let config = AppConfig::default().with_listen(Some("::1".to_string()), None);
    assert_eq!(config.host(), "::1");
    assert_eq!(*config.port(), 3000);
}
