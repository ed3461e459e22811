//! In-memory lease store for development and testing.
//!
//! Values never expire. Leases expire against the tokio clock, so tests can
//! drive expiry with `tokio::time::pause` / `advance`. An optional per-call
//! latency widens race windows and an availability switch simulates an
//! unreachable store.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use tokio::time::Instant;

use crate::core::{AcquireOutcome, CoordinationError, LeaseStore, LeaseToken, ReleaseOutcome};

struct LeaseRecord {
    token: LeaseToken,
    expires_at: Instant,
}

impl LeaseRecord {
    fn is_live(&self, now: Instant) -> bool {
        now < self.expires_at
    }
}

#[derive(Default)]
struct State {
    values: HashMap<String, String>,
    leases: HashMap<String, LeaseRecord>,
}

/// Process-local [`LeaseStore`]. Share it through an `Arc` to simulate several nodes.
pub struct InMemoryLeaseStore {
    state: Mutex<State>,
    available: AtomicBool,
    latency: Option<Duration>,
}

impl InMemoryLeaseStore {
    /// Create an empty, available store.
    pub fn new() -> Self {
        Self {
            state: Mutex::new(State::default()),
            available: AtomicBool::new(true),
            latency: None,
        }
    }

    /// Delay every operation by `latency`.
    #[must_use]
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = Some(latency);
        self
    }

    /// Toggle availability; while unavailable every operation fails with
    /// [`CoordinationError::StoreUnavailable`].
    pub fn set_available(&self, available: bool) {
        self.available.store(available, Ordering::SeqCst);
    }

    /// Token of the live lease under `key`, if any.
    pub fn lease_holder(&self, key: &str) -> Option<LeaseToken> {
        let now = Instant::now();
        self.state
            .lock()
            .leases
            .get(key)
            .filter(|lease| lease.is_live(now))
            .map(|lease| lease.token.clone())
    }

    /// Install a lease for `token` regardless of the current holder, as another node would.
    ///
    /// TTLs past the representable range are clamped to roughly thirty years.
    pub fn force_lease(&self, key: &str, token: impl Into<String>, ttl: Duration) {
        let now = Instant::now();
        let expires_at = now
            .checked_add(ttl)
            .unwrap_or_else(|| now + Duration::from_secs(86_400 * 365 * 30));
        self.state.lock().leases.insert(
            key.to_owned(),
            LeaseRecord {
                token: LeaseToken::from(token.into()),
                expires_at,
            },
        );
    }

    /// Number of stored values (leases excluded).
    pub fn len(&self) -> usize {
        self.state.lock().values.len()
    }

    /// True when no values are stored.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    async fn round_trip(&self) -> Result<(), CoordinationError> {
        if let Some(latency) = self.latency {
            tokio::time::sleep(latency).await;
        }
        if self.available.load(Ordering::SeqCst) {
            Ok(())
        } else {
            Err(CoordinationError::store("in-memory store is offline"))
        }
    }
}

impl Default for InMemoryLeaseStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl LeaseStore for InMemoryLeaseStore {
    async fn get(&self, key: &str) -> Result<Option<String>, CoordinationError> {
        self.round_trip().await?;
        Ok(self.state.lock().values.get(key).cloned())
    }

    async fn set(&self, key: &str, value: String) -> Result<(), CoordinationError> {
        self.round_trip().await?;
        self.state.lock().values.insert(key.to_owned(), value);
        Ok(())
    }

    async fn acquire_if_absent(
        &self,
        key: &str,
        token: &LeaseToken,
        ttl: Duration,
    ) -> Result<AcquireOutcome, CoordinationError> {
        self.round_trip().await?;
        let now = Instant::now();
        let expires_at = now.checked_add(ttl).ok_or_else(|| {
            CoordinationError::InvalidConfig(format!("lease ttl for `{key}` is out of range: {ttl:?}"))
        })?;
        let mut state = self.state.lock();
        if state.leases.get(key).is_some_and(|lease| lease.is_live(now)) {
            return Ok(AcquireOutcome::Busy);
        }
        state.leases.insert(
            key.to_owned(),
            LeaseRecord {
                token: token.clone(),
                expires_at,
            },
        );
        Ok(AcquireOutcome::Acquired)
    }

    async fn release_if_owned(
        &self,
        key: &str,
        token: &LeaseToken,
    ) -> Result<ReleaseOutcome, CoordinationError> {
        self.round_trip().await?;
        let now = Instant::now();
        let mut state = self.state.lock();
        let owned = state
            .leases
            .get(key)
            .is_some_and(|lease| lease.is_live(now) && &lease.token == token);
        if owned {
            state.leases.remove(key);
            Ok(ReleaseOutcome::Released)
        } else {
            Ok(ReleaseOutcome::Lost)
        }
    }
}
