use super::new_thread::schedule_on;
use crate::executor::core::ExecutorHandle;
use crate::subscription::{self, MultipleAssignmentSubscription, Subscription};

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::{Duration, Instant};

/// A fixed-rate schedule that re-arms itself after every run.
///
/// Each run is an ordinary [`ScheduledAction`](super::ScheduledAction);
/// the slot always holds the one currently pending, so unsubscribing the
/// slot revokes the next run and stops the chain. Once the worker shuts
/// down, the slot is unsubscribed as well.
pub(crate) struct Periodic<F> {
    action: Mutex<F>,
    executor: ExecutorHandle,
    slot: Arc<MultipleAssignmentSubscription>,
    start: Instant,
    period: Duration,
    /// Completed runs.
    count: AtomicU64,
}

impl<F> Periodic<F>
where
    F: FnMut() + Send + 'static,
{
    /// Arms the first run after `initial_delay` and returns the slot
    /// controlling the whole schedule.
    pub(crate) fn start(
        executor: ExecutorHandle,
        action: F,
        initial_delay: Duration,
        period: Duration,
    ) -> Arc<MultipleAssignmentSubscription> {
        let slot = Arc::new(MultipleAssignmentSubscription::new());

        let periodic = Arc::new(Self {
            action: Mutex::new(action),
            executor,
            slot: slot.clone(),
            start: Instant::now()
                .checked_add(initial_delay)
                .unwrap_or_else(Instant::now),
            period,
            count: AtomicU64::new(0),
        });

        periodic.arm(initial_delay);
        slot
    }

    fn arm(self: &Arc<Self>, delay: Duration) {
        let this = self.clone();
        let next = schedule_on(&self.executor, Box::new(move || this.tick()), delay);

        // A tick discarded or rejected by a closed worker ends the schedule.
        let executor = self.executor.clone();
        let slot = Arc::downgrade(&self.slot);
        next.add(subscription::create(move || {
            if executor.is_shutdown() {
                if let Some(slot) = slot.upgrade() {
                    slot.unsubscribe();
                }
            }
        }));

        self.slot.set(next);
    }

    fn tick(self: Arc<Self>) {
        if self.slot.is_unsubscribed() {
            return;
        }

        {
            let mut action = self.action.lock().unwrap_or_else(PoisonError::into_inner);
            (*action)();
        }

        let runs = self.count.fetch_add(1, Ordering::AcqRel).saturating_add(1);
        self.arm(self.next_delay(runs));
    }

    /// Delay until run number `runs`, due at `start + runs * period`.
    ///
    /// Falls back to one `period` when that instant is not representable.
    fn next_delay(&self, runs: u64) -> Duration {
        u32::try_from(runs)
            .ok()
            .and_then(|runs| self.period.checked_mul(runs))
            .and_then(|offset| self.start.checked_add(offset))
            .map_or(self.period, |next| {
                next.saturating_duration_since(Instant::now())
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::executor::ScheduledExecutor;
    use crate::thread_factory::ThreadFactory;

    fn periodic(period: Duration) -> (ScheduledExecutor, Periodic<fn()>) {
        let executor = ScheduledExecutor::new(&ThreadFactory::new("periodic-unit-")).unwrap();
        let periodic = Periodic {
            action: Mutex::new((|| {}) as fn()),
            executor: executor.handle(),
            slot: Arc::new(MultipleAssignmentSubscription::new()),
            start: Instant::now(),
            period,
            count: AtomicU64::new(0),
        };
        (executor, periodic)
    }

    #[test]
    fn next_delay_targets_fixed_rate_slots() {
        let (_executor, periodic) = periodic(Duration::from_secs(10));

        let delay = periodic.next_delay(3);
        assert!(delay <= Duration::from_secs(30));
        assert!(delay > Duration::from_secs(29));
    }

    #[test]
    fn next_delay_falls_back_to_period_past_u32_runs() {
        let (_executor, periodic) = periodic(Duration::from_millis(1));

        assert_eq!(
            periodic.next_delay(u64::from(u32::MAX) + 1),
            Duration::from_millis(1)
        );
        assert_eq!(periodic.next_delay(u64::MAX), Duration::from_millis(1));
    }

    #[test]
    fn next_delay_falls_back_to_period_when_deadline_overflows() {
        let (_executor, periodic) = periodic(Duration::from_secs(u64::MAX / 4));

        assert_eq!(
            periodic.next_delay(u64::from(u32::MAX)),
            Duration::from_secs(u64::MAX / 4)
        );
    }
}
