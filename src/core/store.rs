//! The lease store capability consumed by every coordinator.
//!
//! Any key-value medium that can offer plain reads and writes plus an atomic
//! "set if absent with expiry" and a "delete if value matches" can back the
//! coordinators. Redis (`SET NX PX` + a compare-and-delete script), etcd leases,
//! or a SQL row with an expiry column all fit.

use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use uuid::Uuid;

use crate::core::CoordinationError;

/// Opaque ownership token for one lease acquisition.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct LeaseToken(String);

impl LeaseToken {
    /// Generate a fresh random token.
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    /// Token as a string slice, suitable for storing as the lease value.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<String> for LeaseToken {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl fmt::Display for LeaseToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Result of an atomic acquire attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AcquireOutcome {
    /// The caller now owns the lease.
    Acquired,
    /// A live lease is held by someone else.
    Busy,
}

/// Result of a compare-and-delete release.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReleaseOutcome {
    /// The caller's token matched and the lease was removed.
    Released,
    /// The lease is gone or owned by another token.
    Lost,
}

/// Narrow key-value capability backing leases, cache entries, and last-run markers.
///
/// Implementations report transport failures as
/// [`CoordinationError::StoreUnavailable`]; contention is not an error and is
/// returned through [`AcquireOutcome`] / [`ReleaseOutcome`].
#[async_trait]
pub trait LeaseStore: Send + Sync {
    /// Read a value, `None` when absent.
    async fn get(&self, key: &str) -> Result<Option<String>, CoordinationError>;

    /// Write a value with no expiry, overwriting any previous value.
    async fn set(&self, key: &str, value: String) -> Result<(), CoordinationError>;

    /// Atomically store `token` under `key` if no live lease exists, expiring after `ttl`.
    async fn acquire_if_absent(
        &self,
        key: &str,
        token: &LeaseToken,
        ttl: Duration,
    ) -> Result<AcquireOutcome, CoordinationError>;

    /// Atomically delete the lease under `key` only if it still holds `token`.
    async fn release_if_owned(
        &self,
        key: &str,
        token: &LeaseToken,
    ) -> Result<ReleaseOutcome, CoordinationError>;
}
