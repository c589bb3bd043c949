use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::runtime::Handle;
use tokio::task::AbortHandle;
use tracing::trace;

use crate::error::SchedulerError;

use super::{Scheduler, TimerCallback, TimerHandle, lock};

/// Spawns one sleeping task per timer on a tokio runtime.
pub struct TokioScheduler {
    runtime: Handle,
    next: AtomicU64,
    pending: Arc<Mutex<HashMap<u64, AbortHandle>>>,
}

impl TokioScheduler {
    /// Binds to the runtime the caller is running on.
    ///
    /// # Errors
    ///
    /// Returns an error when called outside of a tokio runtime.
    pub fn new() -> Result<Self, SchedulerError> {
        let runtime =
            Handle::try_current().map_err(|source| SchedulerError::NoRuntime { source })?;
        Ok(Self::with_handle(runtime))
    }

    pub fn with_handle(runtime: Handle) -> Self {
        Self {
            runtime,
            next: AtomicU64::new(1),
            pending: Arc::new(Mutex::new(HashMap::new())),
        }
    }
}

impl Scheduler for TokioScheduler {
    fn schedule(&self, delay: Duration, callback: TimerCallback) -> TimerHandle {
        let id = self.next.fetch_add(1, Ordering::Relaxed);
        let pending = Arc::clone(&self.pending);

        // Held across spawn so the task cannot look itself up before it is registered.
        let mut registry = lock(&self.pending);
        let task = self.runtime.spawn(async move {
            tokio::time::sleep(delay).await;
            let live = lock(&pending).remove(&id).is_some();
            if live {
                trace!(timer = id, "timer fired");
                callback();
            }
        });
        registry.insert(id, task.abort_handle());
        TimerHandle(id)
    }

    fn cancel(&self, handle: TimerHandle) {
        if let Some(task) = lock(&self.pending).remove(&handle.0) {
            task.abort();
            trace!(timer = handle.0, "timer canceled");
        }
    }

    fn pending(&self) -> usize {
        lock(&self.pending).len()
    }
}

impl Drop for TokioScheduler {
    fn drop(&mut self) {
        for (_, task) in lock(&self.pending).drain() {
            task.abort();
        }
    }
}
