//! One-shot delayed callbacks.
//!
//! [`TokioScheduler`] drives real timers; [`ManualScheduler`] is advanced by
//! hand in tests.

use std::fmt;
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

mod manual;
mod runtime;

pub use self::manual::ManualScheduler;
pub use self::runtime::TokioScheduler;

pub type TimerCallback = Box<dyn FnOnce() + Send + 'static>;

/// Handle to a pending callback. Not `Clone`: whoever holds it owns the timer.
#[derive(Debug, PartialEq, Eq, Hash)]
pub struct TimerHandle(u64);

impl TimerHandle {
    pub const fn from_raw(raw: u64) -> Self {
        Self(raw)
    }

    pub const fn raw(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for TimerHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "timer#{}", self.0)
    }
}

pub trait Scheduler: Send + Sync {
    /// Runs `callback` once, no earlier than `delay` from now.
    ///
    /// Must not run the callback before returning: callers schedule while
    /// holding locks the callback will take.
    fn schedule(&self, delay: Duration, callback: TimerCallback) -> TimerHandle;

    /// Drops the callback behind `handle` if it has not started running.
    /// Canceling a handle that already fired is a no-op.
    fn cancel(&self, handle: TimerHandle);

    fn pending(&self) -> usize;
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}
