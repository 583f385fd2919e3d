//! Schedulers and workers.
//!
//! A [`Scheduler`] hands out [`Worker`]s. A worker is a serial timeline:
//! everything scheduled on it runs one action at a time, in deadline order,
//! on the worker's own thread. Every `schedule` call returns a
//! [`Subscription`] which revokes that one action.
//!
//! The only scheduler in this crate is [`NewThreadScheduler`], which backs
//! every worker with a fresh dedicated thread.

mod action;
mod new_thread;
mod periodic;

pub use action::ScheduledAction;
pub use new_thread::{NewThreadScheduler, NewThreadWorker};

use crate::error::Result;
use crate::subscription::Subscription;

use std::sync::Arc;
use std::time::{Duration, Instant};

/// A factory of workers.
pub trait Scheduler {
    /// The worker type produced by this scheduler.
    type Worker: Worker;

    /// Creates a new worker with its own execution context.
    ///
    /// # Errors
    ///
    /// Fails if the worker's execution context could not be created.
    fn create_worker(&self) -> Result<Self::Worker>;

    /// The scheduler's notion of the current time.
    fn now(&self) -> Instant {
        Instant::now()
    }
}

/// A serial timeline on which actions execute.
///
/// Unsubscribing a worker closes it: queued actions are discarded, the
/// running one is interrupted (best effort), and every later `schedule`
/// returns an already-unsubscribed handle without running anything.
pub trait Worker: Subscription {
    /// Schedules `action` to run as soon as possible.
    fn schedule<F>(&self, action: F) -> Arc<dyn Subscription>
    where
        F: FnOnce() + Send + 'static,
    {
        self.schedule_after(action, Duration::ZERO)
    }

    /// Schedules `action` to run once `delay` has elapsed.
    ///
    /// A zero delay is the same as [`schedule`](Self::schedule).
    fn schedule_after<F>(&self, action: F, delay: Duration) -> Arc<dyn Subscription>
    where
        F: FnOnce() + Send + 'static;

    /// Schedules `action` to run after `initial_delay` and then at a fixed
    /// rate of one run per `period`, until the returned handle is
    /// unsubscribed or the worker is closed.
    ///
    /// Runs are aligned on `start + n * period`; a slow run delays the next
    /// one but does not shift the ones after it. A panicking run stops the
    /// schedule.
    fn schedule_periodically<F>(
        &self,
        action: F,
        initial_delay: Duration,
        period: Duration,
    ) -> Arc<dyn Subscription>
    where
        F: FnMut() + Send + 'static;

    /// The worker's notion of the current time.
    fn now(&self) -> Instant {
        Instant::now()
    }

    /// Closes the worker. Same as [`unsubscribe`](Subscription::unsubscribe).
    fn close(&self) {
        self.unsubscribe();
    }

    /// Returns `true` once the worker has been closed.
    fn is_closed(&self) -> bool {
        self.is_unsubscribed()
    }
}
