//! Tests for builder modules

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use prometheus_lease::builders::{build_schedulers, build_single_flight};
use prometheus_lease::config::{CoordinatorConfig, ScheduleConfig, SingleFlightConfig};
use prometheus_lease::core::{
    scheduled_job, CoordinationError, LeaseStore, RecordingObserver, TaskObserver, TickOutcome,
};
use prometheus_lease::infra::InMemoryLeaseStore;

fn config() -> CoordinatorConfig {
    let mut schedules = HashMap::new();
    schedules.insert(
        "digest".to_string(),
        ScheduleConfig {
            key: "daily-digest".to_string(),
            interval_secs: 86_400,
            timeout_secs: 120,
        },
    );
    CoordinatorConfig {
        namespace: Some("billing".to_string()),
        single_flight: SingleFlightConfig { lease_ttl_secs: 12 },
        schedules,
    }
}

#[tokio::test]
async fn test_build_single_flight_applies_config() {
    let store = Arc::new(InMemoryLeaseStore::new());
    let observer: Arc<dyn TaskObserver> = Arc::new(RecordingObserver::default());

    let flight = build_single_flight(&config(), Arc::clone(&store), observer).unwrap();
    assert_eq!(flight.ttl(), Duration::from_secs(12));

    flight.execute("invoice:7", || async { Ok(7_u32) }, None).await.unwrap();
    assert!(store.get("billing:invoice:7").await.unwrap().is_some());
}

#[tokio::test]
async fn test_build_schedulers_per_entry() {
    let store = Arc::new(InMemoryLeaseStore::new());
    let recording = Arc::new(RecordingObserver::default());
    let observer: Arc<dyn TaskObserver> = recording.clone();
    let mut requested = Vec::new();

    let schedulers = build_schedulers(&config(), &store, &observer, |name, _schedule| {
        requested.push(name.to_string());
        Ok(scheduled_job(|| async { Ok(()) }))
    })
    .unwrap();

    assert_eq!(requested, vec!["digest".to_string()]);
    let digest = &schedulers["digest"];
    assert_eq!(digest.keys().data(), "billing:daily-digest");
    assert_eq!(digest.keys().lock(), "billing:daily-digest:lock");
    assert_eq!(digest.options().timeout, Duration::from_secs(120));

    assert_eq!(digest.tick().await, TickOutcome::Ran);
    assert_eq!(recording.successes(), 1);
    assert!(store.get("billing:daily-digest").await.unwrap().is_some());
}

#[test]
fn test_build_rejects_invalid_config() {
    let store = Arc::new(InMemoryLeaseStore::new());
    let observer: Arc<dyn TaskObserver> = Arc::new(RecordingObserver::default());
    let mut cfg = config();
    cfg.single_flight.lease_ttl_secs = 0;

    let result = build_single_flight(&cfg, Arc::clone(&store), Arc::clone(&observer));
    assert!(matches!(result, Err(CoordinationError::InvalidConfig(_))));
}

#[test]
fn test_build_schedulers_propagates_factory_error() {
    let store = Arc::new(InMemoryLeaseStore::new());
    let observer: Arc<dyn TaskObserver> = Arc::new(RecordingObserver::default());

    let result = build_schedulers(&config(), &store, &observer, |name, _schedule| {
        Err(CoordinationError::InvalidConfig(format!("no job registered for `{name}`")))
    });

    let err = result.err().unwrap();
    assert!(err.to_string().contains("digest"));
}
