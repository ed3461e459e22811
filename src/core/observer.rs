//! Success and error callbacks.
//!
//! Scheduled runs report to a [`TaskObserver`] instead of returning errors, and
//! the single-flight executor reports malformed cache entries the same way.
//! Three implementations are provided: [`TracingObserver`] (the default, logs
//! only), [`CallbackObserver`] (plain closures), and [`RecordingObserver`]
//! (bounded in-memory buffer for tests and diagnostics).

use std::collections::VecDeque;
use std::fmt;

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

use crate::core::CoordinationError;
use crate::util::clock::now_ms;

/// Where in the protocol an error was observed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCategory {
    /// Reading the last-run marker failed.
    Lookup,
    /// The lease could not be taken or the leased section failed to commit.
    Lock,
    /// The user task failed.
    Task,
    /// A stored payload could not be decoded.
    Parse,
}

impl ErrorCategory {
    /// Stable lowercase name.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Lookup => "lookup",
            Self::Lock => "lock",
            Self::Task => "task",
            Self::Parse => "parse",
        }
    }
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Receiver for coordination outcomes.
pub trait TaskObserver: Send + Sync {
    /// A scheduled run completed; invoked once per successful run.
    fn on_success(&self, key: &str);

    /// A non-fatal error was swallowed.
    fn on_error(&self, key: &str, category: ErrorCategory, error: &CoordinationError);
}

/// Observer that only logs.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingObserver;

impl TaskObserver for TracingObserver {
    fn on_success(&self, key: &str) {
        tracing::info!(key = %key, "scheduled run completed");
    }

    fn on_error(&self, key: &str, category: ErrorCategory, error: &CoordinationError) {
        tracing::warn!(key = %key, category = %category, error = %error, "coordination error");
    }
}

/// Observer built from two closures.
pub struct CallbackObserver<S, E> {
    on_success: S,
    on_error: E,
}

impl<S, E> CallbackObserver<S, E>
where
    S: Fn(&str) + Send + Sync,
    E: Fn(&str, ErrorCategory, &CoordinationError) + Send + Sync,
{
    /// Wrap the success and error callbacks.
    pub const fn new(on_success: S, on_error: E) -> Self {
        Self {
            on_success,
            on_error,
        }
    }
}

impl<S, E> TaskObserver for CallbackObserver<S, E>
where
    S: Fn(&str) + Send + Sync,
    E: Fn(&str, ErrorCategory, &CoordinationError) + Send + Sync,
{
    fn on_success(&self, key: &str) {
        (self.on_success)(key);
    }

    fn on_error(&self, key: &str, category: ErrorCategory, error: &CoordinationError) {
        (self.on_error)(key, category, error);
    }
}

/// What a [`RecordingObserver`] saw.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ObservedOutcome {
    /// `on_success` fired.
    Success,
    /// `on_error` fired.
    Error {
        /// Reported category.
        category: ErrorCategory,
        /// Rendered error.
        message: String,
    },
}

/// One recorded callback.
#[derive(Debug, Clone)]
pub struct ObservedEvent {
    /// Logical key the callback was for.
    pub key: String,
    /// Callback kind.
    pub outcome: ObservedOutcome,
    /// Wall-clock time of the callback, ms since epoch.
    pub observed_at_ms: u64,
}

/// Observer keeping the most recent callbacks in a bounded buffer.
pub struct RecordingObserver {
    events: Mutex<VecDeque<ObservedEvent>>,
    max_events: usize,
}

impl RecordingObserver {
    /// Create an observer retaining at most `max_events` callbacks.
    pub fn new(max_events: usize) -> Self {
        Self {
            events: Mutex::new(VecDeque::with_capacity(max_events.min(1024))),
            max_events: max_events.max(1),
        }
    }

    /// Snapshot of recorded callbacks, oldest first.
    pub fn events(&self) -> Vec<ObservedEvent> {
        self.events.lock().iter().cloned().collect()
    }

    /// Number of recorded successes.
    pub fn successes(&self) -> usize {
        self.events
            .lock()
            .iter()
            .filter(|e| e.outcome == ObservedOutcome::Success)
            .count()
    }

    /// Number of recorded errors in `category`.
    pub fn errors(&self, category: ErrorCategory) -> usize {
        self.events
            .lock()
            .iter()
            .filter(|e| matches!(&e.outcome, ObservedOutcome::Error { category: c, .. } if *c == category))
            .count()
    }

    /// Number of recorded errors of any category.
    pub fn total_errors(&self) -> usize {
        self.events
            .lock()
            .iter()
            .filter(|e| matches!(e.outcome, ObservedOutcome::Error { .. }))
            .count()
    }

    fn record(&self, key: &str, outcome: ObservedOutcome) {
        let mut events = self.events.lock();
        if events.len() >= self.max_events {
            events.pop_front();
        }
        events.push_back(ObservedEvent {
            key: key.to_owned(),
            outcome,
            observed_at_ms: now_ms(),
        });
    }
}

impl Default for RecordingObserver {
    fn default() -> Self {
        Self::new(256)
    }
}

impl TaskObserver for RecordingObserver {
    fn on_success(&self, key: &str) {
        self.record(key, ObservedOutcome::Success);
    }

    fn on_error(&self, key: &str, category: ErrorCategory, error: &CoordinationError) {
        self.record(
            key,
            ObservedOutcome::Error {
                category,
                message: error.to_string(),
            },
        );
    }
}
