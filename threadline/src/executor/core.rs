use super::context::enter_task;
use super::entry::{Job, ScheduledEntry};
use super::handle::{TaskCell, TaskHandle};
use crate::thread_factory::ThreadFactory;

use std::any::Any;
use std::collections::BinaryHeap;
use std::io;
use std::panic::{self, AssertUnwindSafe};
use std::sync::{Arc, Condvar, Mutex, MutexGuard, PoisonError};
use std::thread::Thread;
use std::time::{Duration, Instant};

use tracing::{debug, error, trace};

/// Upper bound applied to delays so deadlines never overflow `Instant`.
const MAX_DELAY: Duration = Duration::from_secs(60 * 60 * 24 * 365 * 30);

/// A single-thread executor with delayed execution.
///
/// The `ScheduledExecutor` is responsible for:
/// - owning exactly one backing thread created by a [`ThreadFactory`],
/// - running submitted tasks one at a time in deadline order,
/// - discarding queued work and interrupting the running task on
///   [`shutdown_now`](Self::shutdown_now).
///
/// Dropping the executor shuts it down. The backing thread is never
/// joined; it exits on its own once the running task returns.
pub struct ScheduledExecutor {
    /// Queue shared with the backing thread.
    shared: Arc<Shared>,

    /// The backing thread.
    thread: Thread,
}

/// Cloneable submission side of an executor, without ownership of its
/// lifecycle.
#[derive(Clone)]
pub(crate) struct ExecutorHandle {
    shared: Arc<Shared>,
}

pub(crate) struct Shared {
    /// Pending tasks and lifecycle flags.
    queue: Mutex<Queue>,

    /// Wakes the backing thread on submission and shutdown.
    condvar: Condvar,
}

struct Queue {
    /// Pending tasks, earliest deadline first.
    heap: BinaryHeap<ScheduledEntry>,

    /// Next submission sequence number.
    seq: u64,

    /// Set once by `shutdown_now`.
    shutdown: bool,

    /// Task taken off the heap and not yet finished.
    current: Option<Arc<TaskCell>>,

    /// Entries cancelled while still in the heap, since the last purge.
    /// An upper bound: an entry cancelled right after being popped is
    /// counted too.
    cancelled: usize,
}

impl ScheduledExecutor {
    /// Creates an executor and spawns its thread through `factory`.
    ///
    /// # Errors
    ///
    /// Returns the OS error if the thread could not be spawned.
    pub fn new(factory: &ThreadFactory) -> io::Result<Self> {
        let shared = Arc::new(Shared {
            queue: Mutex::new(Queue {
                heap: BinaryHeap::new(),
                seq: 0,
                shutdown: false,
                current: None,
                cancelled: 0,
            }),
            condvar: Condvar::new(),
        });

        let worker = shared.clone();
        let handle = factory.new_thread(move || worker.run())?;
        let thread = handle.thread().clone();

        debug!(thread = thread.name().unwrap_or_default(), "executor thread spawned");

        Ok(Self { shared, thread })
    }

    /// Submits `job` for execution as soon as possible.
    pub fn submit<F>(&self, job: F) -> TaskHandle
    where
        F: FnOnce() + Send + 'static,
    {
        self.shared.push(Box::new(job), Duration::ZERO)
    }

    /// Submits `job` for execution once `delay` has elapsed.
    ///
    /// A zero delay is the same as [`submit`](Self::submit).
    pub fn schedule<F>(&self, job: F, delay: Duration) -> TaskHandle
    where
        F: FnOnce() + Send + 'static,
    {
        self.shared.push(Box::new(job), delay)
    }

    /// Shuts the executor down without waiting.
    ///
    /// This method:
    /// - rejects every later submission,
    /// - discards all queued tasks, which will never run,
    /// - raises the interrupt flag of the running task, if any,
    /// - wakes the backing thread so it can exit.
    ///
    /// Returns the number of discarded tasks. Calling it again returns `0`.
    pub fn shutdown_now(&self) -> usize {
        let (discarded, current) = {
            let mut queue = self.shared.lock();
            if queue.shutdown {
                return 0;
            }
            queue.shutdown = true;
            queue.cancelled = 0;
            (std::mem::take(&mut queue.heap), queue.current.clone())
        };

        self.shared.condvar.notify_all();

        if let Some(cell) = current {
            cell.abandon();
        }

        let count = discarded.len();
        for entry in discarded {
            entry.cell.abandon();
        }

        debug!(
            thread = self.thread.name().unwrap_or_default(),
            discarded = count,
            "executor shut down"
        );

        count
    }

    /// Returns `true` once [`shutdown_now`](Self::shutdown_now) was called.
    pub fn is_shutdown(&self) -> bool {
        self.shared.lock().shutdown
    }

    /// Returns the number of tasks waiting in the queue.
    ///
    /// Cancelled tasks are not counted, even before they are purged.
    pub fn pending(&self) -> usize {
        self.shared
            .lock()
            .heap
            .iter()
            .filter(|entry| !entry.cell.is_cancelled())
            .count()
    }

    /// Returns the backing thread.
    pub fn thread(&self) -> &Thread {
        &self.thread
    }

    pub(crate) fn handle(&self) -> ExecutorHandle {
        ExecutorHandle {
            shared: self.shared.clone(),
        }
    }
}

impl Drop for ScheduledExecutor {
    fn drop(&mut self) {
        self.shutdown_now();
    }
}

impl ExecutorHandle {
    /// Submits `job` to run after `delay`. After shutdown the job is
    /// dropped unrun.
    pub(crate) fn schedule(&self, job: Job, delay: Duration) -> TaskHandle {
        self.shared.push(job, delay)
    }

    pub(crate) fn is_shutdown(&self) -> bool {
        self.shared.lock().shutdown
    }
}

impl Shared {
    fn lock(&self) -> MutexGuard<'_, Queue> {
        self.queue.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Enqueues `job`. After shutdown the job is dropped and the returned
    /// handle is already cancelled.
    fn push(self: &Arc<Self>, job: Job, delay: Duration) -> TaskHandle {
        let cell = Arc::new(TaskCell::new());

        let rejected = {
            let mut queue = self.lock();

            if queue.shutdown {
                Some(job)
            } else {
                let seq = queue.seq;
                queue.seq += 1;

                queue.heap.push(ScheduledEntry {
                    deadline: Instant::now() + delay.min(MAX_DELAY),
                    seq,
                    cell: cell.clone(),
                    job,
                });
                None
            }
        };

        match rejected {
            Some(job) => {
                cell.cancel();
                drop(job);
                trace!("submission rejected after shutdown");
            }
            None => self.condvar.notify_one(),
        }

        TaskHandle {
            cell,
            queue: Arc::downgrade(self),
        }
    }

    /// Records that a queued entry was cancelled.
    ///
    /// Once dead entries outnumber live ones the heap is rebuilt without
    /// them. Purged jobs are dropped after the lock is released.
    pub(crate) fn cancelled(&self) {
        let purged: Vec<ScheduledEntry> = {
            let mut queue = self.lock();
            queue.cancelled += 1;

            if queue.cancelled * 2 <= queue.heap.len() {
                return;
            }

            queue.cancelled = 0;
            let (live, dead): (Vec<_>, Vec<_>) = std::mem::take(&mut queue.heap)
                .into_vec()
                .into_iter()
                .partition(|entry| !entry.cell.is_cancelled());
            queue.heap = BinaryHeap::from(live);
            dead
        };

        if !purged.is_empty() {
            trace!(purged = purged.len(), "purged cancelled tasks");
        }
        drop(purged);
    }

    /// Blocks until a task is due or the executor shuts down.
    ///
    /// The returned entry is recorded as the current task.
    fn next(&self) -> Option<ScheduledEntry> {
        let mut queue = self.lock();

        loop {
            if queue.shutdown {
                return None;
            }

            let now = Instant::now();

            // Cancelled entries are handed out early so they leave the heap.
            let head = queue
                .heap
                .peek()
                .map(|entry| (entry.deadline, entry.cell.is_cancelled()));

            let wait = match head {
                None => None,
                Some((deadline, cancelled)) if deadline <= now || cancelled => {
                    if cancelled {
                        queue.cancelled = queue.cancelled.saturating_sub(1);
                    }
                    if let Some(entry) = queue.heap.pop() {
                        queue.current = Some(entry.cell.clone());
                        return Some(entry);
                    }
                    None
                }
                Some((deadline, _)) => Some(deadline - now),
            };

            queue = match wait {
                None => self
                    .condvar
                    .wait(queue)
                    .unwrap_or_else(PoisonError::into_inner),
                Some(timeout) => {
                    self.condvar
                        .wait_timeout(queue, timeout)
                        .unwrap_or_else(PoisonError::into_inner)
                        .0
                }
            };
        }
    }

    /// The backing thread's loop.
    fn run(&self) {
        let current = std::thread::current();
        let name = current.name().unwrap_or_default();

        debug!(thread = name, "executor thread started");

        while let Some(ScheduledEntry { cell, job, .. }) = self.next() {
            if !cell.begin() {
                trace!(thread = name, "skipping cancelled task");
                drop(job);
                self.lock().current = None;
                continue;
            }

            let outcome = enter_task(cell.clone(), || panic::catch_unwind(AssertUnwindSafe(job)));
            cell.finish();

            if let Err(payload) = outcome {
                error!(
                    thread = name,
                    panic = panic_message(payload.as_ref()),
                    "scheduled action panicked"
                );
            }

            self.lock().current = None;
        }

        debug!(thread = name, "executor thread stopped");
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.as_str()
    } else {
        "non-string panic payload"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::subscription::Subscription;

    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::mpsc;

    fn executor() -> ScheduledExecutor {
        ScheduledExecutor::new(&ThreadFactory::new("executor-test-")).unwrap()
    }

    #[test]
    fn zero_delay_tasks_run_in_submission_order() {
        let exec = executor();
        let (tx, rx) = mpsc::channel();

        for i in 0..50 {
            let tx = tx.clone();
            exec.submit(move || tx.send(i).unwrap());
        }

        let order: Vec<i32> = (0..50).map(|_| rx.recv().unwrap()).collect();
        assert_eq!(order, (0..50).collect::<Vec<_>>());
    }

    #[test]
    fn delayed_tasks_run_by_fire_time() {
        let exec = executor();
        let (tx, rx) = mpsc::channel();

        let late = tx.clone();
        exec.schedule(move || late.send("late").unwrap(), Duration::from_millis(60));
        let early = tx.clone();
        exec.schedule(move || early.send("early").unwrap(), Duration::from_millis(20));
        exec.submit(move || tx.send("now").unwrap());

        let order: Vec<&str> = (0..3).map(|_| rx.recv().unwrap()).collect();
        assert_eq!(order, vec!["now", "early", "late"]);
    }

    #[test]
    fn cancelled_task_never_runs() {
        let exec = executor();
        let runs = Arc::new(AtomicUsize::new(0));

        let r = runs.clone();
        let handle = exec.schedule(
            move || {
                r.fetch_add(1, Ordering::SeqCst);
            },
            Duration::from_millis(30),
        );
        handle.unsubscribe();

        std::thread::sleep(Duration::from_millis(80));
        assert!(handle.is_cancelled());
        assert_eq!(runs.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn mass_cancellation_purges_the_queue() {
        let exec = executor();
        let (tx, rx) = mpsc::channel();

        let live = tx.clone();
        exec.schedule(move || live.send(()).unwrap(), Duration::from_millis(200));

        for _ in 0..10_000 {
            let handle = exec.schedule(|| unreachable!(), Duration::from_secs(3600));
            handle.unsubscribe();
        }

        assert_eq!(exec.pending(), 1);
        assert!(exec.shared.lock().heap.len() <= 3);

        // The surviving entry still fires.
        assert!(rx.recv_timeout(Duration::from_secs(2)).is_ok());
        drop(tx);
    }

    #[test]
    fn completed_task_is_not_cancelled() {
        let exec = executor();
        let (tx, rx) = mpsc::channel();

        let handle = exec.submit(move || tx.send(()).unwrap());
        rx.recv_timeout(Duration::from_secs(2)).unwrap();

        let start = Instant::now();
        while !handle.is_done() && start.elapsed() < Duration::from_secs(2) {
            std::thread::yield_now();
        }
        assert!(handle.is_done());
        assert!(!handle.is_cancelled());
    }

    #[test]
    fn thread_survives_panicking_task() {
        let exec = executor();
        let (tx, rx) = mpsc::channel();

        exec.submit(|| panic!("boom"));
        exec.submit(move || tx.send(()).unwrap());

        assert!(rx.recv_timeout(Duration::from_secs(2)).is_ok());
    }

    #[test]
    fn shutdown_discards_queued_tasks() {
        let exec = executor();
        let runs = Arc::new(AtomicUsize::new(0));

        for _ in 0..3 {
            let r = runs.clone();
            exec.schedule(
                move || {
                    r.fetch_add(1, Ordering::SeqCst);
                },
                Duration::from_millis(100),
            );
        }

        assert_eq!(exec.shutdown_now(), 3);
        assert_eq!(exec.shutdown_now(), 0);
        assert!(exec.is_shutdown());

        let rejected = exec.submit(|| unreachable!());
        assert!(rejected.is_cancelled());

        std::thread::sleep(Duration::from_millis(150));
        assert_eq!(runs.load(Ordering::SeqCst), 0);
    }
}
