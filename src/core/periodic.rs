//! Cluster-wide periodic scheduler.
//!
//! Every node runs a local timer per scheduled key. On each tick the node reads
//! the key's last-run marker and skips cheaply when the task ran less than one
//! interval ago. Otherwise it contends for the key's lease, re-reads the marker
//! under the lease, and only then runs the task, reports success, and writes a
//! fresh marker. A node crashing mid-run holds the lease for at most the lease
//! timeout; the marker is not written, so the next tick anywhere retries.
//!
//! Ticks are not serialized against each other. With an interval shorter than
//! the task, a new tick may start while an earlier one is still inside the
//! lease; the marker check and the lease keep the task from running twice.
//!
//! Stopping a [`ScheduleHandle`] only prevents future ticks. A tick already in
//! flight runs to completion and may still write the marker and invoke the
//! observer after `stop` returns.

use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use futures::future::BoxFuture;
use futures::FutureExt;
use tokio::sync::Notify;
use tokio::time::{Instant, MissedTickBehavior};

use crate::core::payload::{decode_marker, encode_marker, Lookup};
use crate::core::{
    AppResult, CoordinationError, DistributedLease, ErrorCategory, KeySpace, LeaseStore,
    ResourceKeys, Spawn, TaskObserver, TracingObserver,
};
use crate::runtime::TokioSpawner;
use crate::util::clock::{duration_ms, Clock, SystemClock};

/// Default lease timeout for a scheduled run.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Boxed future returned by a [`ScheduledJob`].
pub type JobFuture = BoxFuture<'static, AppResult<()>>;

/// Type-erased recurring task.
pub type ScheduledJob = Arc<dyn Fn() -> JobFuture + Send + Sync>;

/// Box an async closure into a [`ScheduledJob`].
pub fn scheduled_job<F, Fut>(task: F) -> ScheduledJob
where
    F: Fn() -> Fut + Send + Sync + 'static,
    Fut: Future<Output = AppResult<()>> + Send + 'static,
{
    Arc::new(move || task().boxed())
}

/// Timing for one scheduled key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScheduleOptions {
    /// Minimum spacing between successful runs; also the local timer period.
    pub interval: Duration,
    /// Lease TTL for the task body.
    pub timeout: Duration,
}

impl ScheduleOptions {
    /// Run at most once per `interval`, with the default 30 s lease timeout.
    pub const fn every(interval: Duration) -> Self {
        Self {
            interval,
            timeout: DEFAULT_TIMEOUT,
        }
    }

    /// Override the lease timeout.
    #[must_use]
    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    fn validate(&self) -> Result<(), CoordinationError> {
        if self.interval.is_zero() {
            return Err(CoordinationError::InvalidConfig("interval must be positive".into()));
        }
        if self.timeout.is_zero() {
            return Err(CoordinationError::InvalidConfig("timeout must be positive".into()));
        }
        let now = Instant::now();
        if now.checked_add(self.interval).is_none() {
            return Err(CoordinationError::InvalidConfig(format!(
                "interval out of range: {:?}",
                self.interval
            )));
        }
        if now.checked_add(self.timeout).is_none() {
            return Err(CoordinationError::InvalidConfig(format!(
                "timeout out of range: {:?}",
                self.timeout
            )));
        }
        Ok(())
    }
}

/// What a single tick did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// Marker was fresh; no lease attempted.
    Skipped,
    /// Marker became fresh while waiting for the lease.
    AlreadyRan,
    /// Task ran, success was reported, and the marker was written.
    Ran,
    /// Reading the marker failed.
    LookupFailed,
    /// Lease unavailable, or the leased section failed after the task.
    LockFailed,
    /// Task failed; marker left untouched.
    TaskFailed,
}

/// Interval-gated, lease-guarded recurring task for one key.
pub struct PeriodicScheduler<S: LeaseStore + ?Sized> {
    runner: TickRunner<S>,
}

struct TickRunner<S: LeaseStore + ?Sized> {
    keys: ResourceKeys,
    options: ScheduleOptions,
    store: Arc<S>,
    lease: DistributedLease<S>,
    observer: Arc<dyn TaskObserver>,
    clock: Arc<dyn Clock>,
    job: ScheduledJob,
}

impl<S: LeaseStore + ?Sized + 'static> PeriodicScheduler<S> {
    /// Schedule `task` under logical `key`.
    pub fn new<F, Fut>(
        store: Arc<S>,
        key: &str,
        options: ScheduleOptions,
        task: F,
    ) -> Result<Self, CoordinationError>
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = AppResult<()>> + Send + 'static,
    {
        Self::from_job(store, key, options, scheduled_job(task))
    }

    /// Schedule an already boxed job under logical `key`.
    pub fn from_job(
        store: Arc<S>,
        key: &str,
        options: ScheduleOptions,
        job: ScheduledJob,
    ) -> Result<Self, CoordinationError> {
        if key.is_empty() {
            return Err(CoordinationError::InvalidConfig("schedule key must not be empty".into()));
        }
        options.validate()?;
        Ok(Self {
            runner: TickRunner {
                keys: KeySpace::new().resolve(key),
                options,
                lease: DistributedLease::new(Arc::clone(&store)),
                store,
                observer: Arc::new(TracingObserver),
                clock: Arc::new(SystemClock),
                job,
            },
        })
    }

    /// Report runs and errors to `observer`.
    #[must_use]
    pub fn with_observer(mut self, observer: Arc<dyn TaskObserver>) -> Self {
        self.runner.observer = observer;
        self
    }

    /// Read and write markers with `clock`.
    #[must_use]
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.runner.clock = clock;
        self
    }

    /// Resolve the schedule key inside `keys`.
    #[must_use]
    pub fn with_key_space(mut self, keys: &KeySpace) -> Self {
        let logical = self.runner.keys.logical().to_owned();
        self.runner.keys = keys.resolve(&logical);
        self
    }

    /// Derived storage keys.
    pub const fn keys(&self) -> &ResourceKeys {
        &self.runner.keys
    }

    /// Timing options.
    pub const fn options(&self) -> ScheduleOptions {
        self.runner.options
    }

    /// Run one tick now, independent of any timer.
    pub async fn tick(&self) -> TickOutcome {
        self.runner.tick().await
    }

    /// Start the timer on the current tokio runtime.
    #[must_use = "dropping the handle stops the schedule"]
    pub fn start(self) -> Result<ScheduleHandle, CoordinationError> {
        let spawner = TokioSpawner::current()?;
        Ok(self.spawn_on(&spawner))
    }

    /// Start the timer on `spawner`. The first tick fires one interval from now.
    #[must_use = "dropping the handle stops the schedule"]
    pub fn spawn_on<Sp>(self, spawner: &Sp) -> ScheduleHandle
    where
        Sp: Spawn + Clone + Send + Sync + 'static,
    {
        let runner = Arc::new(self.runner);
        let signal = Arc::new(StopSignal::default());
        let handle = ScheduleHandle {
            key: runner.keys.logical().to_owned(),
            signal: Arc::clone(&signal),
        };
        let tick_spawner = spawner.clone();

        spawner.spawn(async move {
            let period = runner.options.interval;
            let Some(first) = Instant::now().checked_add(period) else {
                tracing::warn!(key = %runner.keys.logical(), interval = ?period, "interval out of range; schedule not started");
                return;
            };
            let mut ticker = tokio::time::interval_at(first, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            tracing::debug!(key = %runner.keys.logical(), interval = ?period, "schedule started");
            loop {
                tokio::select! {
                    biased;
                    () = signal.wait() => break,
                    _ = ticker.tick() => {}
                }
                if signal.is_stopped() {
                    break;
                }
                let runner = Arc::clone(&runner);
                tick_spawner.spawn(async move {
                    runner.tick().await;
                });
            }
            tracing::debug!(key = %runner.keys.logical(), "schedule stopped");
        });

        handle
    }
}

impl<S: LeaseStore + ?Sized> TickRunner<S> {
    async fn tick(&self) -> TickOutcome {
        match self.read_marker().await {
            Err(err) => {
                self.report(ErrorCategory::Lookup, &err);
                return TickOutcome::LookupFailed;
            }
            Ok(Lookup::Hit(last)) if self.within_interval(last) => {
                tracing::trace!(key = %self.keys.logical(), last, "ran recently; skipping");
                return TickOutcome::Skipped;
            }
            // Read as absent so this run overwrites it.
            Ok(Lookup::Malformed(err)) => self.report(ErrorCategory::Parse, &err),
            Ok(Lookup::Hit(_) | Lookup::Miss) => {}
        }

        let result = self
            .lease
            .with_lease(self.keys.lock(), self.options.timeout, || self.run_leased())
            .await;
        match result {
            Ok(outcome) => outcome,
            Err(err) => {
                self.report(ErrorCategory::Lock, &err);
                TickOutcome::LockFailed
            }
        }
    }

    async fn run_leased(&self) -> Result<TickOutcome, CoordinationError> {
        match self.read_marker().await {
            Err(err) => {
                self.report(ErrorCategory::Lookup, &err);
                return Ok(TickOutcome::LookupFailed);
            }
            Ok(Lookup::Hit(last)) if self.within_interval(last) => {
                tracing::debug!(key = %self.keys.logical(), last, "another node ran first");
                return Ok(TickOutcome::AlreadyRan);
            }
            Ok(_) => {}
        }

        if let Err(err) = (self.job)().await {
            self.report(ErrorCategory::Task, &CoordinationError::task(err));
            return Ok(TickOutcome::TaskFailed);
        }
        self.observer.on_success(self.keys.logical());

        let finished = self.clock.now_ms();
        self.store.set(self.keys.data(), encode_marker(finished)).await?;
        tracing::info!(key = %self.keys.logical(), at = finished, "scheduled run recorded");
        Ok(TickOutcome::Ran)
    }

    async fn read_marker(&self) -> Result<Lookup<u64>, CoordinationError> {
        let raw = self.store.get(self.keys.data()).await?;
        Ok(decode_marker(self.keys.data(), raw))
    }

    fn within_interval(&self, last_ms: u64) -> bool {
        self.clock.now_ms().saturating_sub(last_ms) < duration_ms(self.options.interval)
    }

    fn report(&self, category: ErrorCategory, err: &CoordinationError) {
        tracing::warn!(key = %self.keys.logical(), category = %category, error = %err, "scheduled tick failed");
        self.observer.on_error(self.keys.logical(), category, err);
    }
}

#[derive(Default)]
struct StopSignal {
    stopped: AtomicBool,
    notify: Notify,
}

impl StopSignal {
    fn stop(&self) -> bool {
        let first = !self.stopped.swap(true, Ordering::SeqCst);
        if first {
            // notify_one stores a permit if the timer loop is not waiting yet.
            self.notify.notify_one();
        }
        first
    }

    fn is_stopped(&self) -> bool {
        self.stopped.load(Ordering::SeqCst)
    }

    async fn wait(&self) {
        if self.is_stopped() {
            return;
        }
        self.notify.notified().await;
    }
}

/// Owned handle to a running schedule. Dropping it stops the timer, so bind it
/// for as long as the schedule should run.
#[must_use = "dropping the handle stops the schedule"]
pub struct ScheduleHandle {
    key: String,
    signal: Arc<StopSignal>,
}

impl ScheduleHandle {
    /// Logical key of the schedule.
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Stop scheduling further ticks. Idempotent; an in-flight tick still completes.
    pub fn stop(&self) {
        if self.signal.stop() {
            tracing::debug!(key = %self.key, "schedule stop requested");
        }
    }

    /// True once [`ScheduleHandle::stop`] was called.
    pub fn is_stopped(&self) -> bool {
        self.signal.is_stopped()
    }
}

impl Drop for ScheduleHandle {
    fn drop(&mut self) {
        self.stop();
    }
}

impl std::fmt::Debug for ScheduleHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScheduleHandle")
            .field("key", &self.key)
            .field("stopped", &self.is_stopped())
            .finish()
    }
}
