//! Distributed lease over a [`LeaseStore`].
//!
//! A lease is exclusive, time-bounded ownership of a named resource. The store's
//! atomic acquire guarantees at most one live token per key; release is
//! compare-and-delete so a holder whose lease already expired (and was taken
//! over by another node) cannot remove the new holder's lease.
//!
//! If a body outlives its TTL the lease silently expires and another node may
//! enter the same critical section while the first is still running. Bodies
//! must therefore be idempotent. A body future that is dropped before
//! completion leaves the lease to expire on its own.

use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Duration;

use futures::FutureExt;
use tokio::time::Instant;

use crate::core::{AcquireOutcome, CoordinationError, LeaseStore, LeaseToken, ReleaseOutcome};

/// Proof of a successful acquisition.
#[derive(Debug, Clone)]
pub struct LeaseGuard {
    key: String,
    token: LeaseToken,
    ttl: Duration,
    deadline: Instant,
}

impl LeaseGuard {
    /// Lease resource key.
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Ownership token written to the store.
    pub const fn token(&self) -> &LeaseToken {
        &self.token
    }

    /// TTL requested at acquisition.
    pub const fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Time left before the lease expires, measured from before the acquire request.
    pub fn remaining(&self) -> Duration {
        self.deadline.saturating_duration_since(Instant::now())
    }

    /// True once the local deadline has passed; the store may have handed the lease to someone else.
    pub fn is_expired(&self) -> bool {
        Instant::now() >= self.deadline
    }
}

/// Time-bounded exclusive ownership of named resources.
pub struct DistributedLease<S: LeaseStore + ?Sized> {
    store: Arc<S>,
}

impl<S: LeaseStore + ?Sized> Clone for DistributedLease<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
        }
    }
}

impl<S: LeaseStore + ?Sized> DistributedLease<S> {
    /// Create a lease coordinator over `store`.
    pub const fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    /// Underlying store.
    pub const fn store(&self) -> &Arc<S> {
        &self.store
    }

    /// Try once to acquire `key` for `ttl`.
    ///
    /// Fails with [`CoordinationError::LeaseBusy`] when another holder owns it.
    pub async fn acquire(&self, key: &str, ttl: Duration) -> Result<LeaseGuard, CoordinationError> {
        if ttl.is_zero() {
            return Err(CoordinationError::InvalidConfig(format!(
                "lease ttl for `{key}` must be positive"
            )));
        }
        // Deadline counts from before the request so it never outlives the store's.
        let deadline = Instant::now().checked_add(ttl).ok_or_else(|| {
            CoordinationError::InvalidConfig(format!("lease ttl for `{key}` is out of range: {ttl:?}"))
        })?;
        let token = LeaseToken::generate();
        match self.store.acquire_if_absent(key, &token, ttl).await? {
            AcquireOutcome::Acquired => {
                tracing::debug!(key = %key, token = %token, ttl = ?ttl, "lease acquired");
                Ok(LeaseGuard {
                    key: key.to_owned(),
                    token,
                    ttl,
                    deadline,
                })
            }
            AcquireOutcome::Busy => {
                tracing::debug!(key = %key, "lease busy");
                Err(CoordinationError::LeaseBusy { key: key.to_owned() })
            }
        }
    }

    /// Release a lease, succeeding only if `guard`'s token is still the current one.
    pub async fn release(&self, guard: LeaseGuard) -> Result<(), CoordinationError> {
        match self.store.release_if_owned(&guard.key, &guard.token).await? {
            ReleaseOutcome::Released => {
                tracing::debug!(key = %guard.key, token = %guard.token, "lease released");
                Ok(())
            }
            ReleaseOutcome::Lost => Err(CoordinationError::LeaseLost { key: guard.key }),
        }
    }

    /// Run `body` while holding `key`.
    ///
    /// The lease is released after `body` returns `Ok`, returns `Err`, or
    /// panics, unless it has already expired. Release failures are logged and
    /// never replace the body's result. If acquisition fails `body` is not
    /// invoked.
    pub async fn with_lease<T, F, Fut>(
        &self,
        key: &str,
        ttl: Duration,
        body: F,
    ) -> Result<T, CoordinationError>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, CoordinationError>>,
    {
        let guard = self.acquire(key, ttl).await?;
        let outcome = AssertUnwindSafe(body()).catch_unwind().await;
        self.finish(guard).await;
        match outcome {
            Ok(result) => result,
            Err(panic) => std::panic::resume_unwind(panic),
        }
    }

    async fn finish(&self, guard: LeaseGuard) {
        if guard.is_expired() {
            tracing::warn!(
                key = %guard.key,
                ttl = ?guard.ttl,
                "lease expired before the body finished; skipping release"
            );
            return;
        }
        let key = guard.key.clone();
        if let Err(err) = self.release(guard).await {
            tracing::warn!(key = %key, error = %err, "lease release failed");
        }
    }
}
