//! Builders to construct coordinators from configuration.

use std::collections::HashMap;
use std::sync::Arc;

use crate::config::{CoordinatorConfig, ScheduleConfig};
use crate::core::{
    CoordinationError, LeaseStore, PeriodicScheduler, ScheduledJob, SingleFlight, TaskObserver,
};

/// Build the single-flight executor described by `cfg`.
pub fn build_single_flight<S>(
    cfg: &CoordinatorConfig,
    store: Arc<S>,
    observer: Arc<dyn TaskObserver>,
) -> Result<SingleFlight<S>, CoordinationError>
where
    S: LeaseStore + ?Sized,
{
    cfg.validate().map_err(CoordinationError::InvalidConfig)?;
    Ok(SingleFlight::new(store, cfg.single_flight.lease_ttl())
        .with_key_space(cfg.key_space())
        .with_observer(observer))
}

/// Build one scheduler per configured schedule, asking `job_factory` for each task.
///
/// Schedulers are returned unstarted, keyed by schedule name.
pub fn build_schedulers<S, FJ>(
    cfg: &CoordinatorConfig,
    store: &Arc<S>,
    observer: &Arc<dyn TaskObserver>,
    mut job_factory: FJ,
) -> Result<HashMap<String, PeriodicScheduler<S>>, CoordinationError>
where
    S: LeaseStore + ?Sized + 'static,
    FJ: FnMut(&str, &ScheduleConfig) -> Result<ScheduledJob, CoordinationError>,
{
    cfg.validate().map_err(CoordinationError::InvalidConfig)?;
    let keys = cfg.key_space();

    let mut schedulers = HashMap::with_capacity(cfg.schedules.len());
    for (name, schedule) in &cfg.schedules {
        let job = job_factory(name, schedule)?;
        let scheduler =
            PeriodicScheduler::from_job(Arc::clone(store), &schedule.key, schedule.options(), job)?
                .with_key_space(&keys)
                .with_observer(Arc::clone(observer));
        schedulers.insert(name.clone(), scheduler);
    }

    Ok(schedulers)
}
