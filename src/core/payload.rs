//! Codecs for persisted values: cache entries and last-run markers.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::core::CoordinationError;

/// Memoized task result with the time (ms since epoch) it was produced.
///
/// Stored as the JSON object `{"data": ..., "time": ...}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CachedResult<T> {
    /// Task output.
    pub data: T,
    /// Production timestamp, milliseconds since the UNIX epoch.
    pub time: u64,
}

impl<T> CachedResult<T> {
    /// Wrap `data` produced at `time`.
    pub const fn new(data: T, time: u64) -> Self {
        Self { data, time }
    }

    /// Consume the entry, returning the task output.
    pub fn into_data(self) -> T {
        self.data
    }
}

impl<T: Serialize> CachedResult<T> {
    /// Serialize for storage under `key`.
    pub fn encode(&self, key: &str) -> Result<String, CoordinationError> {
        serde_json::to_string(self).map_err(|e| CoordinationError::MalformedPayload {
            key: key.to_owned(),
            reason: e.to_string(),
        })
    }
}

/// Outcome of reading and decoding a stored value.
#[derive(Debug)]
pub enum Lookup<T> {
    /// Value present and well-formed.
    Hit(T),
    /// Nothing stored.
    Miss,
    /// Value present but undecodable; carries a [`CoordinationError::MalformedPayload`].
    Malformed(CoordinationError),
}

/// Decode a stored cache entry.
pub fn decode_entry<T: DeserializeOwned>(key: &str, raw: Option<String>) -> Lookup<CachedResult<T>> {
    let Some(raw) = raw else {
        return Lookup::Miss;
    };
    match serde_json::from_str(&raw) {
        Ok(entry) => Lookup::Hit(entry),
        Err(e) => Lookup::Malformed(CoordinationError::MalformedPayload {
            key: key.to_owned(),
            reason: e.to_string(),
        }),
    }
}

/// Encode a last-run marker as a decimal integer string.
pub fn encode_marker(at_ms: u64) -> String {
    at_ms.to_string()
}

/// Decode a stored last-run marker.
pub fn decode_marker(key: &str, raw: Option<String>) -> Lookup<u64> {
    let Some(raw) = raw else {
        return Lookup::Miss;
    };
    match raw.trim().parse::<u64>() {
        Ok(at_ms) => Lookup::Hit(at_ms),
        Err(e) => Lookup::Malformed(CoordinationError::MalformedPayload {
            key: key.to_owned(),
            reason: format!("last-run marker `{raw}`: {e}"),
        }),
    }
}
