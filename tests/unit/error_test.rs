//! Tests for error types

use std::error::Error as _;

use prometheus_lease::core::CoordinationError;

#[test]
fn test_lease_busy_error() {
    let err = CoordinationError::LeaseBusy { key: "report:lock".to_string() };
    assert_eq!(format!("{}", err), "lease busy: report:lock");
    assert!(err.is_lease_busy());
}

#[test]
fn test_lease_lost_error() {
    let err = CoordinationError::LeaseLost { key: "report:lock".to_string() };
    assert_eq!(format!("{}", err), "lease lost: report:lock");
    assert!(!err.is_lease_busy());
}

#[test]
fn test_store_error() {
    let err = CoordinationError::store("connection refused");
    assert_eq!(format!("{}", err), "store unavailable: connection refused");
}

#[test]
fn test_malformed_payload_error() {
    let err = CoordinationError::MalformedPayload {
        key: "report".to_string(),
        reason: "expected value".to_string(),
    };
    assert_eq!(format!("{}", err), "malformed payload at `report`: expected value");
}

#[test]
fn test_task_failure_keeps_source() {
    let err = CoordinationError::task(anyhow::anyhow!("upstream timed out"));
    assert_eq!(format!("{}", err), "task failed: upstream timed out");
    assert_eq!(err.source().map(ToString::to_string).as_deref(), Some("upstream timed out"));
}
