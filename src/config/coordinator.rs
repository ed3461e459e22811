//! Coordinator configuration structures.

use std::collections::{HashMap, HashSet};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::core::{KeySpace, ScheduleOptions};

/// Default lease hold time for single-flight executions and scheduled runs, in seconds.
pub const DEFAULT_LEASE_SECS: u64 = 30;

/// Upper bound for every configured duration, in seconds (about thirty years).
pub const MAX_DURATION_SECS: u64 = 86_400 * 365 * 30;

/// Environment variable naming the key namespace.
pub const ENV_NAMESPACE: &str = "LEASE_NAMESPACE";
/// Environment variable overriding the single-flight lease TTL in seconds.
pub const ENV_SINGLE_FLIGHT_TTL: &str = "LEASE_SINGLE_FLIGHT_TTL_SECS";

const fn default_lease_secs() -> u64 {
    DEFAULT_LEASE_SECS
}

fn check_secs(field: &str, secs: u64) -> Result<(), String> {
    if secs == 0 {
        return Err(format!("{field} must be greater than 0"));
    }
    if secs > MAX_DURATION_SECS {
        return Err(format!("{field} must be at most {MAX_DURATION_SECS}"));
    }
    Ok(())
}

/// Single-flight executor configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SingleFlightConfig {
    /// Default lease hold time in seconds, overridable per call.
    #[serde(default = "default_lease_secs")]
    pub lease_ttl_secs: u64,
}

impl Default for SingleFlightConfig {
    fn default() -> Self {
        Self {
            lease_ttl_secs: DEFAULT_LEASE_SECS,
        }
    }
}

impl SingleFlightConfig {
    /// Validate configuration values.
    pub fn validate(&self) -> Result<(), String> {
        check_secs("lease_ttl_secs", self.lease_ttl_secs)
    }

    /// Lease TTL as a duration.
    pub const fn lease_ttl(&self) -> Duration {
        Duration::from_secs(self.lease_ttl_secs)
    }
}

/// One periodic task.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduleConfig {
    /// Logical key for the last-run marker and lease.
    pub key: String,
    /// Minimum spacing between successful runs, in seconds.
    pub interval_secs: u64,
    /// Lease TTL for the task body, in seconds.
    #[serde(default = "default_lease_secs")]
    pub timeout_secs: u64,
}

impl ScheduleConfig {
    /// Validate configuration values.
    pub fn validate(&self) -> Result<(), String> {
        if self.key.is_empty() {
            return Err("key must not be empty".into());
        }
        check_secs("interval_secs", self.interval_secs)?;
        check_secs("timeout_secs", self.timeout_secs)
    }

    /// Timing options for the scheduler.
    pub const fn options(&self) -> ScheduleOptions {
        ScheduleOptions::every(Duration::from_secs(self.interval_secs))
            .with_timeout(Duration::from_secs(self.timeout_secs))
    }
}

/// Root configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CoordinatorConfig {
    /// Prefix applied to every storage key.
    #[serde(default)]
    pub namespace: Option<String>,
    /// Single-flight executor settings.
    #[serde(default)]
    pub single_flight: SingleFlightConfig,
    /// Periodic tasks by name.
    #[serde(default)]
    pub schedules: HashMap<String, ScheduleConfig>,
}

impl CoordinatorConfig {
    /// Validate every section; schedule keys must be distinct.
    pub fn validate(&self) -> Result<(), String> {
        self.single_flight
            .validate()
            .map_err(|e| format!("single_flight invalid: {e}"))?;
        let mut keys = HashSet::new();
        for (name, schedule) in &self.schedules {
            schedule
                .validate()
                .map_err(|e| format!("schedule `{name}` invalid: {e}"))?;
            if !keys.insert(schedule.key.as_str()) {
                return Err(format!("schedule `{name}` reuses key `{}`", schedule.key));
            }
        }
        Ok(())
    }

    /// Key space derived from the namespace.
    pub fn key_space(&self) -> KeySpace {
        self.namespace
            .as_deref()
            .map_or_else(KeySpace::new, |ns| KeySpace::with_namespace(ns))
    }

    /// Parse configuration from a JSON string and validate.
    pub fn from_json_str(input: &str) -> Result<Self, String> {
        let cfg: Self = serde_json::from_str(input).map_err(|e| format!("parse error: {e}"))?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Build configuration from the process environment, loading `.env` first if present.
    pub fn from_env() -> Result<Self, String> {
        // A missing .env file is normal outside development.
        let _ = dotenvy::dotenv();
        Self::from_env_with(|name| std::env::var(name).ok())
    }

    /// Build configuration from an arbitrary variable lookup.
    pub fn from_env_with<F>(lookup: F) -> Result<Self, String>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut cfg = Self {
            namespace: lookup(ENV_NAMESPACE).filter(|ns| !ns.is_empty()),
            ..Self::default()
        };
        if let Some(raw) = lookup(ENV_SINGLE_FLIGHT_TTL) {
            cfg.single_flight.lease_ttl_secs = raw
                .trim()
                .parse::<u64>()
                .map_err(|e| format!("{ENV_SINGLE_FLIGHT_TTL}=`{raw}`: {e}"))?;
        }
        cfg.validate()?;
        Ok(cfg)
    }
}
