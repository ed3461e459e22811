//! Tokio runtime spawner implementation.

use std::future::Future;

use tokio::runtime::Handle;

use crate::core::{CoordinationError, Spawn};

/// Spawner running timer loops and ticks on a tokio runtime.
#[derive(Clone, Debug)]
pub struct TokioSpawner {
    handle: Handle,
}

impl TokioSpawner {
    /// Spawn onto the runtime behind `handle`.
    pub const fn new(handle: Handle) -> Self {
        Self { handle }
    }

    /// Spawn onto the runtime driving the current task.
    pub fn current() -> Result<Self, CoordinationError> {
        Handle::try_current()
            .map(Self::new)
            .map_err(|e| CoordinationError::RuntimeUnavailable(e.to_string()))
    }

    /// Underlying runtime handle.
    pub const fn handle(&self) -> &Handle {
        &self.handle
    }
}

impl Spawn for TokioSpawner {
    fn spawn<F>(&self, fut: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        drop(self.handle.spawn(fut));
    }
}
