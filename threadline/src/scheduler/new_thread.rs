use super::action::{ScheduledAction, job_for};
use super::periodic::Periodic;
use super::{Scheduler, Worker};
use crate::builder::SchedulerBuilder;
use crate::error::Result;
use crate::executor::ScheduledExecutor;
use crate::executor::core::ExecutorHandle;
use crate::executor::entry::Job;
use crate::subscription::{self, OnceToken, Subscription};
use crate::thread_factory::ThreadFactory;

use std::fmt;
use std::sync::{Arc, OnceLock};
use std::thread::Thread;
use std::time::Duration;

use tracing::{debug, trace};

/// A scheduler that backs every worker with a new dedicated thread.
///
/// Workers share nothing but the scheduler's [`ThreadFactory`], whose
/// counter keeps their thread names unique.
///
/// Use [`instance`](Self::instance) for the process-wide scheduler, or
/// [`builder`](Self::builder) / [`with_thread_factory`](Self::with_thread_factory)
/// for an independent one (tests, custom thread naming).
///
/// # Examples
///
/// ```rust
/// use threadline::{NewThreadScheduler, Scheduler, Worker};
///
/// let worker = NewThreadScheduler::instance().create_worker().unwrap();
/// let handle = worker.schedule(|| println!("on a worker thread"));
/// # let _ = handle;
/// worker.close();
/// ```
pub struct NewThreadScheduler {
    factory: Arc<ThreadFactory>,
}

impl NewThreadScheduler {
    /// Returns the process-wide scheduler.
    ///
    /// Created on first use with the default [`SchedulerBuilder`]
    /// configuration and never torn down.
    pub fn instance() -> &'static NewThreadScheduler {
        static INSTANCE: OnceLock<NewThreadScheduler> = OnceLock::new();
        INSTANCE.get_or_init(|| SchedulerBuilder::new().build())
    }

    /// Returns a builder for an independent scheduler.
    pub fn builder() -> SchedulerBuilder {
        SchedulerBuilder::new()
    }

    /// Creates a scheduler spawning its threads through `factory`.
    pub fn with_thread_factory(factory: Arc<ThreadFactory>) -> Self {
        Self { factory }
    }

    /// Returns the factory used for worker threads.
    pub fn thread_factory(&self) -> &Arc<ThreadFactory> {
        &self.factory
    }
}

impl Scheduler for NewThreadScheduler {
    type Worker = NewThreadWorker;

    fn create_worker(&self) -> Result<NewThreadWorker> {
        NewThreadWorker::new(&self.factory)
    }
}

impl fmt::Debug for NewThreadScheduler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NewThreadScheduler")
            .field("prefix", &self.factory.prefix())
            .finish()
    }
}

/// A worker running its actions on one dedicated thread.
///
/// The worker exclusively owns a single-thread [`ScheduledExecutor`].
/// Closing it, explicitly or by dropping it, is permanent: queued actions
/// are discarded, the running one is asked to stop through
/// [`is_interrupted`](crate::is_interrupted), and the thread exits once
/// that action returns. `close` does not wait for it.
pub struct NewThreadWorker {
    executor: ScheduledExecutor,
    handle: ExecutorHandle,
    closed: OnceToken,
}

impl NewThreadWorker {
    pub(crate) fn new(factory: &ThreadFactory) -> Result<Self> {
        let executor = ScheduledExecutor::new(factory)?;
        let handle = executor.handle();

        Ok(Self {
            executor,
            handle,
            closed: OnceToken::new(),
        })
    }

    /// Schedules `action` without checking whether the worker is closed.
    ///
    /// Returns the concrete action so callers can link it to a parent bag
    /// with [`ScheduledAction::add_parent`]. On a closed worker the action
    /// is returned already unsubscribed.
    pub fn schedule_actual<F>(&self, action: F, delay: Duration) -> Arc<ScheduledAction>
    where
        F: FnOnce() + Send + 'static,
    {
        schedule_on(&self.handle, Box::new(action), delay)
    }

    /// Returns the thread this worker runs on.
    pub fn thread(&self) -> &Thread {
        self.executor.thread()
    }

    /// Returns the number of actions queued and not yet started.
    pub fn pending(&self) -> usize {
        self.executor.pending()
    }
}

/// Wraps `job` in a [`ScheduledAction`], submits it, and ties the pending
/// execution to the action.
pub(super) fn schedule_on(
    executor: &ExecutorHandle,
    job: Job,
    delay: Duration,
) -> Arc<ScheduledAction> {
    let run = ScheduledAction::from_job(job);
    let pending = executor.schedule(job_for(&run), delay);
    run.add(Arc::new(pending));
    run
}

impl Worker for NewThreadWorker {
    fn schedule_after<F>(&self, action: F, delay: Duration) -> Arc<dyn Subscription>
    where
        F: FnOnce() + Send + 'static,
    {
        if self.closed.is_claimed() {
            trace!(
                thread = self.thread().name().unwrap_or_default(),
                "schedule on closed worker ignored"
            );
            return subscription::unsubscribed();
        }

        self.schedule_actual(action, delay)
    }

    fn schedule_periodically<F>(
        &self,
        action: F,
        initial_delay: Duration,
        period: Duration,
    ) -> Arc<dyn Subscription>
    where
        F: FnMut() + Send + 'static,
    {
        if self.closed.is_claimed() {
            return subscription::unsubscribed();
        }

        Periodic::start(self.handle.clone(), action, initial_delay, period)
    }
}

impl Subscription for NewThreadWorker {
    fn unsubscribe(&self) {
        if !self.closed.claim() {
            return;
        }

        let discarded = self.executor.shutdown_now();
        debug!(
            thread = self.thread().name().unwrap_or_default(),
            discarded,
            "worker closed"
        );
    }

    fn is_unsubscribed(&self) -> bool {
        self.closed.is_claimed()
    }
}

impl fmt::Debug for NewThreadWorker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NewThreadWorker")
            .field("thread", &self.thread().name())
            .field("closed", &self.is_unsubscribed())
            .finish()
    }
}
