//! Integration tests for configuration loading

use rentals::config::{RentalsConfig, StorageBackend};
use rentals::core::error::ConfigError;
use rentals::prelude::*;
use rust_decimal_macros::dec;
use std::io::Write;
use tempfile::NamedTempFile;

fn write_config(yaml: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(yaml.as_bytes()).unwrap();
    file
}

#[test]
fn test_load_full_config_file() {
    let file = write_config(
        r#"
server:
  bind: "0.0.0.0:8080"
  request_timeout_ms: 2500
  cors: false
storage:
  backend: postgres
  database_url: "postgres://rentals@localhost/rentals"
  max_connections: 10
price_adjustments:
  trending: 1.5
  under: 0.25
seed_demo_data: true
"#,
    );

    let config = RentalsConfig::from_yaml_file(file.path().to_str().unwrap()).unwrap();

    assert_eq!(config.server.bind, "0.0.0.0:8080");
    assert_eq!(config.server.request_timeout().as_millis(), 2500);
    assert!(!config.server.cors);
    assert_eq!(config.storage.backend, StorageBackend::Postgres);
    assert_eq!(config.storage.max_connections, 10);
    assert!(config.seed_demo_data);

    let adjustments = config.validate().unwrap();
    assert_eq!(adjustments.multiplier(Tag::Trending), dec!(1.5));
    assert_eq!(adjustments.multiplier(Tag::Under), dec!(0.25));
}

#[test]
fn test_partial_config_keeps_defaults() {
    let file = write_config("server:\n  bind: \"127.0.0.1:9000\"\n");

    let config = RentalsConfig::from_yaml_file(file.path().to_str().unwrap()).unwrap();

    assert_eq!(config.server.bind, "127.0.0.1:9000");
    assert_eq!(config.server.request_timeout_ms, 5000);
    assert_eq!(config.storage.backend, StorageBackend::InMemory);
    assert_eq!(config.validate().unwrap(), PriceAdjustments::default());
}

#[test]
fn test_replacing_adjustments_drops_defaults() {
    let config = RentalsConfig::from_yaml_str("price_adjustments:\n  trending: 2\n").unwrap();

    let adjustments = config.validate().unwrap();

    assert_eq!(adjustments.multiplier(Tag::Trending), dec!(2));
    assert_eq!(adjustments.multiplier(Tag::Under), Decimal::ONE);
}

#[test]
fn test_missing_file() {
    let err = RentalsConfig::from_yaml_file("/nonexistent/rentals.yaml").unwrap_err();
    assert!(matches!(err, ConfigError::FileNotFound { .. }));
}

#[test]
fn test_malformed_file_names_the_path() {
    let file = write_config("server: [unclosed\n");
    let path = file.path().to_str().unwrap().to_string();

    let err = RentalsConfig::from_yaml_file(&path).unwrap_err();

    match err {
        ConfigError::ParseError { file, .. } => assert_eq!(file, Some(path)),
        other => panic!("Expected ParseError, got {:?}", other),
    }
}

#[test]
fn test_unknown_backend_is_rejected() {
    let err = RentalsConfig::from_yaml_str("storage:\n  backend: mongodb\n").unwrap_err();
    assert!(err.to_string().contains("Failed to parse config"));
}

#[test]
fn test_negative_multiplier_is_rejected() {
    let config = RentalsConfig::from_yaml_str("price_adjustments:\n  under: -0.5\n").unwrap();

    let err = config.validate().unwrap_err();

    assert!(err.to_string().contains("price_adjustments.under"));
}

#[test]
fn test_zero_timeout_is_rejected() {
    let config = RentalsConfig::from_yaml_str("server:\n  request_timeout_ms: 0\n").unwrap();
    assert!(config.validate().is_err());
}
