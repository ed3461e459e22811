//! Single-flight, cache-aside executor.
//!
//! `execute` returns the stored [`CachedResult`] for a key when one exists.
//! Otherwise it takes the key's lease, checks the cache again (another node may
//! have filled it while this one waited), and only then runs the task and
//! stores its result permanently. Under any number of concurrent callers,
//! across processes sharing the store, the task runs at most once per key.
//!
//! Callers that lose the lease race get [`CoordinationError::LeaseBusy`]; the
//! executor does not retry.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::core::payload::{decode_entry, Lookup};
use crate::core::{
    AppResult, CachedResult, CoordinationError, DistributedLease, ErrorCategory, KeySpace,
    LeaseStore, ResourceKeys, TaskObserver, TracingObserver,
};
use crate::util::clock::{Clock, SystemClock};

/// Cross-process deduplicating cache-aside executor.
pub struct SingleFlight<S: LeaseStore + ?Sized> {
    store: Arc<S>,
    lease: DistributedLease<S>,
    keys: KeySpace,
    ttl: Duration,
    observer: Arc<dyn TaskObserver>,
    clock: Arc<dyn Clock>,
}

impl<S: LeaseStore + ?Sized> SingleFlight<S> {
    /// Create an executor holding leases for `ttl` by default.
    pub fn new(store: Arc<S>, ttl: Duration) -> Self {
        Self {
            lease: DistributedLease::new(Arc::clone(&store)),
            store,
            keys: KeySpace::new(),
            ttl,
            observer: Arc::new(TracingObserver),
            clock: Arc::new(SystemClock),
        }
    }

    /// Report malformed entries to `observer`.
    #[must_use]
    pub fn with_observer(mut self, observer: Arc<dyn TaskObserver>) -> Self {
        self.observer = observer;
        self
    }

    /// Timestamp entries with `clock`.
    #[must_use]
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Resolve keys inside `keys`.
    #[must_use]
    pub fn with_key_space(mut self, keys: KeySpace) -> Self {
        self.keys = keys;
        self
    }

    /// Default lease TTL.
    pub const fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Return the entry for `key`, running `task` at most once across all callers if absent.
    ///
    /// `ttl` overrides the default lease hold time for this call. A malformed
    /// stored entry is reported with [`ErrorCategory::Parse`] and treated as a
    /// miss. Lease contention and task failures are returned to the caller;
    /// nothing is cached when the task fails.
    pub async fn execute<T, F, Fut>(
        &self,
        key: &str,
        task: F,
        ttl: Option<Duration>,
    ) -> Result<CachedResult<T>, CoordinationError>
    where
        T: Serialize + DeserializeOwned + Send,
        F: FnOnce() -> Fut + Send,
        Fut: Future<Output = AppResult<T>> + Send,
    {
        let keys = self.keys.resolve(key);
        match self.lookup::<T>(&keys).await? {
            Lookup::Hit(entry) => {
                tracing::debug!(key = %keys.data(), "cache hit");
                return Ok(entry);
            }
            Lookup::Malformed(err) => {
                tracing::warn!(key = %keys.data(), error = %err, "discarding malformed cache entry");
                self.observer.on_error(keys.logical(), ErrorCategory::Parse, &err);
            }
            Lookup::Miss => {}
        }

        let ttl = ttl.unwrap_or(self.ttl);
        self.lease
            .with_lease(keys.lock(), ttl, || self.populate(&keys, task))
            .await
    }

    /// Read the entry for `key` without ever running a task.
    ///
    /// Malformed entries read as `None`.
    pub async fn cached<T: DeserializeOwned>(
        &self,
        key: &str,
    ) -> Result<Option<CachedResult<T>>, CoordinationError> {
        let keys = self.keys.resolve(key);
        Ok(match self.lookup::<T>(&keys).await? {
            Lookup::Hit(entry) => Some(entry),
            Lookup::Miss | Lookup::Malformed(_) => None,
        })
    }

    async fn populate<T, F, Fut>(
        &self,
        keys: &ResourceKeys,
        task: F,
    ) -> Result<CachedResult<T>, CoordinationError>
    where
        T: Serialize + DeserializeOwned + Send,
        F: FnOnce() -> Fut + Send,
        Fut: Future<Output = AppResult<T>> + Send,
    {
        match self.lookup::<T>(keys).await? {
            Lookup::Hit(entry) => {
                tracing::debug!(key = %keys.data(), "entry populated while waiting for the lease");
                return Ok(entry);
            }
            // Already reported before the lease was taken.
            Lookup::Malformed(_) | Lookup::Miss => {}
        }

        let data = task().await.map_err(CoordinationError::task)?;
        let entry = CachedResult::new(data, self.clock.now_ms());
        self.store.set(keys.data(), entry.encode(keys.data())?).await?;
        tracing::debug!(key = %keys.data(), time = entry.time, "cache populated");
        Ok(entry)
    }

    async fn lookup<T: DeserializeOwned>(
        &self,
        keys: &ResourceKeys,
    ) -> Result<Lookup<CachedResult<T>>, CoordinationError> {
        let raw = self.store.get(keys.data()).await?;
        Ok(decode_entry(keys.data(), raw))
    }
}
