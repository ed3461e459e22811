//! Tests for configuration validation

use std::collections::HashMap;
use std::time::Duration;

use prometheus_lease::config::{
    CoordinatorConfig, ScheduleConfig, SingleFlightConfig, DEFAULT_LEASE_SECS, ENV_NAMESPACE,
    ENV_SINGLE_FLIGHT_TTL, MAX_DURATION_SECS,
};

fn schedule(key: &str, interval_secs: u64) -> ScheduleConfig {
    ScheduleConfig {
        key: key.to_string(),
        interval_secs,
        timeout_secs: DEFAULT_LEASE_SECS,
    }
}

#[test]
fn test_single_flight_config_validation() {
    assert!(SingleFlightConfig::default().validate().is_ok());
    assert_eq!(SingleFlightConfig::default().lease_ttl(), Duration::from_secs(30));
    assert!(SingleFlightConfig { lease_ttl_secs: 0 }.validate().is_err());
}

#[test]
fn test_schedule_config_invalid_values() {
    assert!(schedule("cleanup", 60).validate().is_ok());
    assert!(schedule("", 60).validate().is_err());
    assert!(schedule("cleanup", 0).validate().is_err());

    let mut no_timeout = schedule("cleanup", 60);
    no_timeout.timeout_secs = 0;
    assert!(no_timeout.validate().is_err());
}

#[test]
fn test_config_rejects_out_of_range_durations() {
    assert!(SingleFlightConfig { lease_ttl_secs: MAX_DURATION_SECS }.validate().is_ok());
    assert!(SingleFlightConfig { lease_ttl_secs: u64::MAX }.validate().is_err());
    assert!(schedule("cleanup", u64::MAX).validate().is_err());

    let mut long_timeout = schedule("cleanup", 60);
    long_timeout.timeout_secs = MAX_DURATION_SECS + 1;
    assert!(long_timeout.validate().is_err());

    let err = CoordinatorConfig::from_env_with(|name| {
        (name == ENV_SINGLE_FLIGHT_TTL).then(|| u64::MAX.to_string())
    })
    .unwrap_err();
    assert!(err.contains("lease_ttl_secs"));
}

#[test]
fn test_schedule_config_options() {
    let mut cfg = schedule("cleanup", 3_600);
    cfg.timeout_secs = 120;
    let options = cfg.options();
    assert_eq!(options.interval, Duration::from_secs(3_600));
    assert_eq!(options.timeout, Duration::from_secs(120));
}

#[test]
fn test_coordinator_config_rejects_shared_keys() {
    let mut schedules = HashMap::new();
    schedules.insert("a".to_string(), schedule("digest", 60));
    schedules.insert("b".to_string(), schedule("digest", 120));

    let config = CoordinatorConfig {
        schedules,
        ..CoordinatorConfig::default()
    };
    assert!(config.validate().unwrap_err().contains("digest"));
}

#[test]
fn test_coordinator_config_from_json() {
    let json = r#"{
        "namespace": "billing",
        "single_flight": { "lease_ttl_secs": 10 },
        "schedules": {
            "digest": { "key": "daily-digest", "interval_secs": 86400 }
        }
    }"#;

    let config = CoordinatorConfig::from_json_str(json).unwrap();
    assert_eq!(config.namespace.as_deref(), Some("billing"));
    assert_eq!(config.single_flight.lease_ttl_secs, 10);
    assert_eq!(config.schedules["digest"].timeout_secs, DEFAULT_LEASE_SECS);
    assert_eq!(config.key_space().resolve("daily-digest").lock(), "billing:daily-digest:lock");
}

#[test]
fn test_coordinator_config_from_json_invalid() {
    assert!(CoordinatorConfig::from_json_str("{").is_err());
    assert!(CoordinatorConfig::from_json_str(r#"{"single_flight": {"lease_ttl_secs": 0}}"#).is_err());
}

#[test]
fn test_coordinator_config_from_env() {
    let vars: HashMap<&str, &str> = [(ENV_NAMESPACE, "tenant-a"), (ENV_SINGLE_FLIGHT_TTL, " 45 ")]
        .into_iter()
        .collect();

    let config = CoordinatorConfig::from_env_with(|name| vars.get(name).map(ToString::to_string)).unwrap();
    assert_eq!(config.namespace.as_deref(), Some("tenant-a"));
    assert_eq!(config.single_flight.lease_ttl(), Duration::from_secs(45));
    assert!(config.schedules.is_empty());
}

#[test]
fn test_coordinator_config_from_env_defaults_and_errors() {
    let config = CoordinatorConfig::from_env_with(|_| None).unwrap();
    assert_eq!(config, CoordinatorConfig::default());
    assert_eq!(config.key_space().resolve("k").data(), "k");

    let err = CoordinatorConfig::from_env_with(|name| {
        (name == ENV_SINGLE_FLIGHT_TTL).then(|| "soon".to_string())
    })
    .unwrap_err();
    assert!(err.contains(ENV_SINGLE_FLIGHT_TTL));
}
