//! Named single-flight timers.
//!
//! A session owns a small fixed set of timer slots. Scheduling into a slot
//! cancels whatever was pending there, so at most one task per slot is ever
//! outstanding.

use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};
use std::time::Duration;
use tokio::task::JoinHandle;

/// Timer slots a session uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TimerSlot {
    /// Autosave after a quiet period.
    Debounce,
    /// End of the post-load suppression window.
    Settle,
}

pub type TimerTask = Box<dyn FnOnce() + Send + 'static>;

pub trait Scheduler: Send + Sync {
    /// Runs `task` after `delay`, replacing any task pending in `slot`.
    fn schedule(&self, slot: TimerSlot, delay: Duration, task: TimerTask);

    /// Cancels the task pending in `slot`, if any.
    fn cancel(&self, slot: TimerSlot);

    fn cancel_all(&self);
}

/// Scheduler backed by tokio sleep tasks.
///
/// Must be used from within a tokio runtime.
#[derive(Debug, Default)]
pub struct TokioScheduler {
    pending: Mutex<HashMap<TimerSlot, JoinHandle<()>>>,
}

impl TokioScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    fn pending(&self) -> std::sync::MutexGuard<'_, HashMap<TimerSlot, JoinHandle<()>>> {
        self.pending.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Scheduler for TokioScheduler {
    fn schedule(&self, slot: TimerSlot, delay: Duration, task: TimerTask) {
        let handle = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            task();
        });

        if let Some(previous) = self.pending().insert(slot, handle) {
            previous.abort();
        }
    }

    fn cancel(&self, slot: TimerSlot) {
        if let Some(handle) = self.pending().remove(&slot) {
            handle.abort();
        }
    }

    fn cancel_all(&self) {
        for (_, handle) in self.pending().drain() {
            handle.abort();
        }
    }
}

impl Drop for TokioScheduler {
    fn drop(&mut self) {
        self.cancel_all();
    }
}
