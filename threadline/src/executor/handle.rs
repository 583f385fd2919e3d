use super::context;
use super::core::Shared;
use super::state::{CANCELLED, COMPLETED, PENDING, RUNNING};
use crate::subscription::Subscription;

use std::fmt;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, OnceLock, Weak};
use std::thread::{self, Thread};

/// Lifecycle state of one queued task, shared between the executor
/// thread and every handle to the task.
pub(crate) struct TaskCell {
    /// One of `PENDING`, `RUNNING`, `COMPLETED`, `CANCELLED`.
    state: AtomicUsize,

    /// Set when the running task has been asked to stop.
    interrupted: AtomicBool,

    /// The thread executing the task, recorded when it starts.
    runner: OnceLock<Thread>,
}

impl TaskCell {
    pub(crate) fn new() -> Self {
        Self {
            state: AtomicUsize::new(PENDING),
            interrupted: AtomicBool::new(false),
            runner: OnceLock::new(),
        }
    }

    /// Moves the task from `PENDING` to `RUNNING`.
    ///
    /// Returns `false` if the task was cancelled first; it must then be
    /// dropped without running.
    pub(crate) fn begin(&self) -> bool {
        let _ = self.runner.set(thread::current());

        self.state
            .compare_exchange(PENDING, RUNNING, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
    }

    /// Marks a running task as completed.
    ///
    /// A task cancelled while running stays `CANCELLED`.
    pub(crate) fn finish(&self) {
        let _ = self.state.compare_exchange(
            RUNNING,
            COMPLETED,
            Ordering::AcqRel,
            Ordering::Acquire,
        );
    }

    /// Cancels the task.
    ///
    /// A pending task will never run. A running task is interrupted. A
    /// finished task is left alone.
    ///
    /// Returns `true` if the task was still pending, i.e. it now sits in
    /// the queue as a dead entry.
    pub(crate) fn cancel(&self) -> bool {
        loop {
            let state = self.state.load(Ordering::Acquire);

            if state == COMPLETED || state == CANCELLED {
                return false;
            }

            if self
                .state
                .compare_exchange(state, CANCELLED, Ordering::AcqRel, Ordering::Acquire)
                .is_ok()
            {
                if state == RUNNING {
                    self.interrupt();
                }
                return state == PENDING;
            }
        }
    }

    /// Discards a pending task, or interrupts it if it already started.
    ///
    /// Used on executor shutdown, where a running task is interrupted
    /// without being marked cancelled.
    pub(crate) fn abandon(&self) {
        if self
            .state
            .compare_exchange(PENDING, CANCELLED, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            self.interrupt();
        }
    }

    /// Raises the interrupt flag and unparks the runner thread.
    ///
    /// A task cancelling itself does not unpark its own thread, which would
    /// leave a stale token for the next task.
    pub(crate) fn interrupt(&self) {
        self.interrupted.store(true, Ordering::Release);

        if let Some(runner) = self.runner.get() {
            if runner.id() != thread::current().id() {
                runner.unpark();
            }
        }
    }

    pub(crate) fn is_interrupted(&self) -> bool {
        self.interrupted.load(Ordering::Acquire)
    }

    pub(crate) fn is_cancelled(&self) -> bool {
        self.state.load(Ordering::Acquire) == CANCELLED
    }

    pub(crate) fn is_done(&self) -> bool {
        matches!(self.state.load(Ordering::Acquire), COMPLETED | CANCELLED)
    }
}

/// A handle to one pending execution on a [`ScheduledExecutor`].
///
/// Unsubscribing the handle:
/// - before the task starts, guarantees it never runs,
/// - while it runs, raises its interrupt flag (see
///   [`is_interrupted`](crate::is_interrupted)) and unparks the executor
///   thread; the task is not stopped forcibly,
/// - after it finished, does nothing.
///
/// Unsubscribing from inside the task itself, directly or through a
/// teardown the task triggers, does nothing either: the task finishes as
/// completed.
///
/// Dropping the handle does **not** cancel the task.
///
/// [`ScheduledExecutor`]: super::ScheduledExecutor
pub struct TaskHandle {
    pub(crate) cell: Arc<TaskCell>,

    /// Queue holding the task, told when a pending entry goes dead.
    pub(crate) queue: Weak<Shared>,
}

impl TaskHandle {
    /// Returns `true` if the task was cancelled before finishing.
    pub fn is_cancelled(&self) -> bool {
        self.cell.is_cancelled()
    }

    /// Returns `true` if the task completed or was cancelled.
    pub fn is_done(&self) -> bool {
        self.cell.is_done()
    }
}

impl Subscription for TaskHandle {
    fn unsubscribe(&self) {
        if context::is_current(&self.cell) {
            return;
        }

        if self.cell.cancel() {
            if let Some(queue) = self.queue.upgrade() {
                queue.cancelled();
            }
        }
    }

    fn is_unsubscribed(&self) -> bool {
        self.cell.is_done()
    }
}

impl fmt::Debug for TaskHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TaskHandle")
            .field("state", &self.cell.state.load(Ordering::Acquire))
            .finish()
    }
}
