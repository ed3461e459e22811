//! Error types for lease coordination.

use thiserror::Error;

/// Boxed error carried by [`CoordinationError::TaskFailure`].
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Errors produced by the lease store, the distributed lease, and the executors built on it.
#[derive(Debug, Error)]
pub enum CoordinationError {
    /// Transport, read, or write failure against the lease store.
    #[error("store unavailable: {0}")]
    StoreUnavailable(String),
    /// Another holder currently owns the lease.
    #[error("lease busy: {key}")]
    LeaseBusy {
        /// Lease resource key.
        key: String,
    },
    /// Release attempted without current ownership (expired or taken over).
    #[error("lease lost: {key}")]
    LeaseLost {
        /// Lease resource key.
        key: String,
    },
    /// Stored value could not be decoded.
    #[error("malformed payload at `{key}`: {reason}")]
    MalformedPayload {
        /// Storage key holding the bad value.
        key: String,
        /// Decoder message.
        reason: String,
    },
    /// User-supplied task returned an error.
    #[error("task failed: {0}")]
    TaskFailure(#[source] BoxError),
    /// Rejected configuration or argument.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
    /// No async runtime was available to drive a timer.
    #[error("runtime unavailable: {0}")]
    RuntimeUnavailable(String),
}

impl CoordinationError {
    /// Wrap a task error, keeping its source chain.
    pub fn task(err: impl Into<BoxError>) -> Self {
        Self::TaskFailure(err.into())
    }

    /// Build a [`CoordinationError::StoreUnavailable`] from any displayable cause.
    pub fn store(cause: impl std::fmt::Display) -> Self {
        Self::StoreUnavailable(cause.to_string())
    }

    /// True when the error reports lease contention.
    pub const fn is_lease_busy(&self) -> bool {
        matches!(self, Self::LeaseBusy { .. })
    }
}

/// Application-facing result using anyhow, returned by user tasks.
pub type AppResult<T> = Result<T, anyhow::Error>;
