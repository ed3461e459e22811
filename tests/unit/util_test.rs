//! Tests for utility functions

use std::time::Duration;

use prometheus_lease::util::{duration_ms, now_ms, Clock, ManualClock, SystemClock};

#[test]
fn test_manual_clock_advance() {
    let clock = ManualClock::new(0);
    clock.advance(Duration::from_millis(1_500));
    assert_eq!(clock.now_ms(), 1_500);
    clock.set(42);
    assert_eq!(clock.now_ms(), 42);
}

#[test]
fn test_system_clock_tracks_now() {
    let before = now_ms();
    let observed = SystemClock.now_ms();
    assert!(observed >= before);
    assert!(observed <= now_ms());
}

#[test]
fn test_duration_ms() {
    assert_eq!(duration_ms(Duration::from_secs(2)), 2_000);
    assert_eq!(duration_ms(Duration::from_micros(1_999)), 1);
    assert_eq!(duration_ms(Duration::MAX), u64::MAX);
}

#[test]
fn test_init_tracing_is_repeatable() {
    prometheus_lease::util::init_tracing();
    prometheus_lease::util::init_tracing();
    tracing::info!(component = "util_test", "subscriber installed");
}
