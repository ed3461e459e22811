//! # Prometheus Lease
//!
//! Lease-backed coordination for processes ("nodes") that share a key-value store.
//!
//! Two primitives are built on one time-bounded lease protocol:
//!
//! - **Single-flight cache-aside** ([`core::SingleFlight`]): an expensive,
//!   idempotent computation runs at most once per cache key, even with
//!   concurrent callers spread across processes. The result is stored
//!   permanently and served to every later caller without taking a lease.
//! - **Cluster-wide periodic tasks** ([`core::PeriodicScheduler`]): every node
//!   runs a local timer, but a last-run marker plus the lease ensure the task
//!   runs at most once per interval across the whole cluster.
//!
//! Both consult the store, take the lease only when needed, and re-check under
//! the lease before doing work, because another node may have finished while
//! this one waited. Leases expire on their own, so a crashed holder blocks
//! others for at most one TTL.
//!
//! ## Lease store
//!
//! Coordinators depend only on the narrow [`core::LeaseStore`] capability
//! (`get`, `set`, `acquire_if_absent`, `release_if_owned`). The crate ships
//! [`infra::InMemoryLeaseStore`] for development and tests; production
//! deployments implement the trait over Redis, etcd, or a database.
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use std::time::Duration;
//! use prometheus_lease::core::{PeriodicScheduler, ScheduleOptions, SingleFlight};
//! use prometheus_lease::infra::InMemoryLeaseStore;
//!
//! let store = Arc::new(InMemoryLeaseStore::new());
//!
//! let flight = SingleFlight::new(store.clone(), Duration::from_secs(30));
//! let report = flight
//!     .execute("report:2024-06", || async { Ok(build_report().await?) }, None)
//!     .await?;
//!
//! let handle = PeriodicScheduler::new(
//!     store,
//!     "cleanup",
//!     ScheduleOptions::every(Duration::from_secs(3600)),
//!     || async { purge_expired_sessions().await },
//! )?
//! .start()?;
//! // ...
//! handle.stop();
//! ```
//!
//! Non-goal: exactly-once execution under arbitrary clock skew or Byzantine
//! nodes. The design tolerates crashes with a bounded staleness window.

#![deny(missing_docs)]
#![deny(unsafe_code)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]

/// Lease protocol, single-flight executor, and periodic scheduler.
pub mod core;
/// Configuration models for executors, schedules, and key namespaces.
pub mod config;
/// Builders to construct coordinators from configuration.
pub mod builders;
/// Lease store backends.
pub mod infra;
/// Runtime adapters.
pub mod runtime;
/// Shared utilities.
pub mod util;
