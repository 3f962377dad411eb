//! Configuration Loading Tests

use pso_engine_core::{ConfigError, DriverConfig, RngBackend, RunConfig, SwarmConfig};
use std::path::PathBuf;

fn temp_path(name: &str) -> PathBuf {
    std::env::temp_dir().join(format!("pso-engine-{}-{}.json", std::process::id(), name))
}

#[test]
fn test_partial_json_keeps_defaults() {
    let config = RunConfig::from_json_str(
        r#"{ "swarm": { "lower": [0, -1], "upper": [1, 1], "size": 12 } }"#,
    )
    .unwrap();

    assert_eq!(config.swarm.dimensions(), 2);
    assert_eq!(config.swarm.size, 12);
    assert_eq!(config.swarm.neighbors, SwarmConfig::default().neighbors);
    assert_eq!(config.swarm.c, 1.193);
    assert_eq!(config.swarm.omega, 0.721);
    assert_eq!(config.driver, DriverConfig::default());
}

#[test]
fn test_backend_spellings_in_json() {
    let config = RunConfig::from_json_str(r#"{ "swarm": { "backend": "urandom" } }"#).unwrap();
    assert_eq!(config.swarm.backend, RngBackend::Urandom);

    let config = RunConfig::from_json_str(r#"{ "swarm": { "backend": "xorshift128+" } }"#).unwrap();
    assert_eq!(config.swarm.backend, RngBackend::Xorshift);

    assert!(RunConfig::from_json_str(r#"{ "swarm": { "backend": "mt19937" } }"#).is_err());
}

#[test]
fn test_invalid_json_is_a_parse_error() {
    let err = RunConfig::from_json_str("{ not json").unwrap_err();
    assert!(matches!(err, ConfigError::Parse(_)));
}

#[test]
fn test_from_path_round_trip() {
    let path = temp_path("round-trip");
    let mut config = RunConfig::default();
    config.swarm = SwarmConfig::with_bounds(vec![-2.0; 3], vec![2.0; 3]);
    config.driver.workers = 7;

    std::fs::write(&path, serde_json::to_string_pretty(&config).unwrap()).unwrap();
    let loaded = RunConfig::from_path(&path).unwrap();
    std::fs::remove_file(&path).unwrap();

    assert_eq!(loaded, config);
}

#[test]
fn test_missing_file_is_an_io_error() {
    let path = temp_path("does-not-exist");
    match RunConfig::from_path(&path) {
        Err(ConfigError::Io { path: reported, .. }) => assert_eq!(reported, path),
        other => panic!("expected an IO error, got {:?}", other),
    }
}

#[test]
fn test_fingerprint_tracks_every_field() {
    let base = SwarmConfig::with_bounds(vec![0.0, 0.0], vec![1.0, 1.0]);
    let fingerprint = base.fingerprint().unwrap();

    assert_eq!(fingerprint.len(), 64);
    assert!(fingerprint.chars().all(|c| c.is_ascii_hexdigit()));
    assert_eq!(base.clone().fingerprint().unwrap(), fingerprint);

    let mut changed = base.clone();
    changed.neighbors = 4;
    assert_ne!(changed.fingerprint().unwrap(), fingerprint);

    let mut changed = base;
    changed.upper[1] = 2.0;
    assert_ne!(changed.fingerprint().unwrap(), fingerprint);
}
