//! Configuration validation tests
//!
//! Tests that verify configuration defaults, loading and validation.

mod common;

use common::test_config;
use secrecy::{ExposeSecret, SecretString};
use std::path::PathBuf;
use unraid_exporter::config::{Config, MetricsConfig, PoolConfig, ServerConfig};

/// Write `contents` to a uniquely named TOML file in the temp dir.
fn write_config(name: &str, contents: &str) -> PathBuf {
    let path = std::env::temp_dir().join(format!(
        "unraid-exporter-{}-{}.toml",
        name,
        std::process::id()
    ));
    std::fs::write(&path, contents).expect("write temp config");
    path
}

#[test]
fn test_default_server_config() {
    // Given/When: ServerConfig defaults
    let config = ServerConfig::default();

    // Then: Bind to all interfaces on the standard exporter port
    assert_eq!(config.addr, "0.0.0.0");
    assert_eq!(config.port, 9100);
}

#[test]
fn test_metrics_config_defaults() {
    let config = MetricsConfig::default();

    assert_eq!(config.scrape_interval_seconds, 60);
    assert!(config.collect_smart_metrics);
    assert!(config.collect_docker_metrics);
    assert!(config.collect_vm_metrics);
    assert!(config.collect_ups_metrics);
    assert!(config.collect_userscript_metrics);
}

#[test]
fn test_pool_config_defaults() {
    let pool = PoolConfig::default();

    assert_eq!(pool.pool_size, 3);
    assert_eq!(pool.max_lifetime_seconds, 300);
    assert_eq!(pool.command_timeout_seconds, 60);
    assert_eq!(pool.max_retries, 2);
    assert_eq!(pool.backoff_factor, 2.0);
    assert_eq!(pool.circuit_breaker_threshold, 5);
}

#[test]
fn test_minimal_file_fills_defaults() {
    // Given: A file with only the connection details
    let path = write_config(
        "minimal",
        "[unraid]\nhost = \"192.168.1.10\"\npassword = \"hunter2\"\n",
    );

    // When: Loading it
    let config = Config::load(path.to_str().unwrap()).expect("load minimal config");
    std::fs::remove_file(&path).ok();

    // Then: Every other section takes its defaults
    assert_eq!(config.unraid.host, "192.168.1.10");
    assert_eq!(config.unraid.port, 22);
    assert_eq!(config.unraid.username, "root");
    assert_eq!(config.unraid.password.expose_secret(), "hunter2");
    assert_eq!(config.server.port, 9100);
    assert_eq!(config.pool.pool_size, 3);
    assert_eq!(config.logging.level, "info");
    assert!(config.validate().is_ok());
}

#[test]
fn test_file_overrides_defaults() {
    let path = write_config(
        "overrides",
        r#"
[unraid]
host = "tower"
port = 2222
username = "monitor"
password = "pw"

[metrics]
collect_vm_metrics = false

[pool]
pool_size = 5
circuit_breaker_window_seconds = 120

[logging]
level = "debug"
"#,
    );

    let config = Config::load(path.to_str().unwrap()).expect("load config");
    std::fs::remove_file(&path).ok();

    assert_eq!(config.unraid.port, 2222);
    assert_eq!(config.unraid.username, "monitor");
    assert!(!config.metrics.collect_vm_metrics);
    assert!(config.metrics.collect_docker_metrics);
    assert_eq!(config.pool.pool_size, 5);
    assert_eq!(config.pool.circuit_breaker_window_seconds, 120);
    assert_eq!(config.logging.level, "debug");
}

#[test]
fn test_missing_host_fails_to_load() {
    let path = write_config("nohost", "[unraid]\npassword = \"pw\"\n");

    let result = Config::load(path.to_str().unwrap());
    std::fs::remove_file(&path).ok();

    assert!(result.is_err());
}

#[test]
fn test_shipped_config_needs_a_password() {
    // Given: The shipped default configuration
    let config = Config::load("config/Default.toml").expect("load shipped config");

    // Then: It parses, but the empty password is refused
    assert_eq!(config.unraid.host, "tower.local");
    let err = config.validate().unwrap_err();
    assert!(err.to_string().contains("UNRAID_PASSWORD"));
}

#[test]
fn test_validate_accepts_test_config() {
    assert!(test_config().validate().is_ok());
}

#[test]
fn test_validate_rejects_empty_host() {
    let mut config = test_config();
    config.unraid.host = "  ".to_string();

    let err = config.validate().unwrap_err();

    assert!(err.to_string().contains("unraid.host"));
}

#[test]
fn test_validate_rejects_empty_password() {
    let mut config = test_config();
    config.unraid.password = SecretString::from(String::new());

    assert!(config.validate().is_err());
}

#[test]
fn test_validate_rejects_bad_pool_settings() {
    let mut config = test_config();
    config.pool.pool_size = 0;
    assert!(config.validate().is_err());

    let mut config = test_config();
    config.pool.min_idle = config.pool.pool_size + 1;
    assert!(config.validate().is_err());

    let mut config = test_config();
    config.pool.backoff_factor = 0.5;
    assert!(config.validate().is_err());

    let mut config = test_config();
    config.pool.initial_backoff_seconds = 10.0;
    config.pool.max_backoff_seconds = 1.0;
    assert!(config.validate().is_err());

    let mut config = test_config();
    config.pool.circuit_breaker_threshold = 0;
    assert!(config.validate().is_err());
}

#[test]
fn test_validate_rejects_zero_scrape_interval() {
    let mut config = test_config();
    config.metrics.scrape_interval_seconds = 0;

    let err = config.validate().unwrap_err();

    assert!(err.to_string().contains("scrape_interval_seconds"));
}
