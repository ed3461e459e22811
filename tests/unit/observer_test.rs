//! Tests for task observers

use prometheus_lease::core::{
    CoordinationError, ErrorCategory, ObservedOutcome, RecordingObserver, TaskObserver,
};

#[test]
fn test_recording_observer_keeps_order() {
    let observer = RecordingObserver::new(10);

    observer.on_success("cleanup");
    observer.on_error("cleanup", ErrorCategory::Lock, &CoordinationError::LeaseBusy {
        key: "cleanup:lock".to_string(),
    });

    let events = observer.events();
    assert_eq!(events.len(), 2);
    assert_eq!(events[0].key, "cleanup");
    assert_eq!(events[0].outcome, ObservedOutcome::Success);
    assert_eq!(
        events[1].outcome,
        ObservedOutcome::Error {
            category: ErrorCategory::Lock,
            message: "lease busy: cleanup:lock".to_string(),
        }
    );
    assert!(events[1].observed_at_ms >= events[0].observed_at_ms);
}

#[test]
fn test_recording_observer_overflow() {
    let observer = RecordingObserver::new(2);

    observer.on_success("a");
    observer.on_success("b");
    observer.on_success("c");

    let events = observer.events();
    assert_eq!(events.len(), 2);
    assert_eq!(events[0].key, "b"); // First one popped
    assert_eq!(events[1].key, "c");
    assert_eq!(observer.successes(), 2);
}

#[test]
fn test_error_counts_by_category() {
    let observer = RecordingObserver::default();
    let parse = CoordinationError::MalformedPayload {
        key: "k".to_string(),
        reason: "eof".to_string(),
    };

    observer.on_error("k", ErrorCategory::Parse, &parse);
    observer.on_error("k", ErrorCategory::Parse, &parse);
    observer.on_error("k", ErrorCategory::Lookup, &CoordinationError::store("down"));

    assert_eq!(observer.errors(ErrorCategory::Parse), 2);
    assert_eq!(observer.errors(ErrorCategory::Lookup), 1);
    assert_eq!(observer.errors(ErrorCategory::Task), 0);
    assert_eq!(observer.total_errors(), 3);
    assert_eq!(observer.successes(), 0);
}
