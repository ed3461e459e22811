//! Configuration models for executors, schedules, and key namespaces.

pub mod coordinator;

pub use coordinator::{
    CoordinatorConfig, ScheduleConfig, SingleFlightConfig, DEFAULT_LEASE_SECS, ENV_NAMESPACE,
    ENV_SINGLE_FLIGHT_TTL, MAX_DURATION_SECS,
};
