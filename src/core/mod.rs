//! Lease protocol and the two coordinators built on it.

pub mod error;
pub mod keys;
pub mod lease;
pub mod observer;
pub mod payload;
pub mod periodic;
pub mod single_flight;
pub mod spawn;
pub mod store;

pub use error::{AppResult, BoxError, CoordinationError};
pub use keys::{KeySpace, ResourceKeys, LOCK_SUFFIX};
pub use lease::{DistributedLease, LeaseGuard};
pub use observer::{
    CallbackObserver, ErrorCategory, ObservedEvent, ObservedOutcome, RecordingObserver,
    TaskObserver, TracingObserver,
};
pub use payload::{CachedResult, Lookup};
pub use periodic::{
    scheduled_job, JobFuture, PeriodicScheduler, ScheduleHandle, ScheduleOptions, ScheduledJob,
    TickOutcome, DEFAULT_TIMEOUT,
};
pub use single_flight::SingleFlight;
pub use spawn::Spawn;
pub use store::{AcquireOutcome, LeaseStore, LeaseToken, ReleaseOutcome};
