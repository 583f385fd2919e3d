use super::handle::TaskCell;

use std::cmp::Ordering;
use std::sync::Arc;
use std::time::Instant;

/// A boxed unit of work owned by the executor queue.
pub(crate) type Job = Box<dyn FnOnce() + Send + 'static>;

/// An entry in the executor queue.
///
/// Entries are kept in a `BinaryHeap` and ordered by deadline, then by
/// submission sequence, so tasks due at the same instant run in the order
/// they were submitted.
pub(crate) struct ScheduledEntry {
    /// The time at which the task becomes runnable.
    pub(crate) deadline: Instant,

    /// Submission sequence number, unique per executor.
    pub(crate) seq: u64,

    /// Lifecycle state shared with the task's handle.
    pub(crate) cell: Arc<TaskCell>,

    /// The work itself.
    pub(crate) job: Job,
}

impl Eq for ScheduledEntry {}

impl PartialEq for ScheduledEntry {
    fn eq(&self, other: &Self) -> bool {
        self.deadline == other.deadline && self.seq == other.seq
    }
}

impl Ord for ScheduledEntry {
    /// Reversed so that `BinaryHeap<ScheduledEntry>` pops the earliest
    /// deadline (and lowest sequence among equal deadlines) first.
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .deadline
            .cmp(&self.deadline)
            .then_with(|| other.seq.cmp(&self.seq))
    }
}

impl PartialOrd for ScheduledEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::collections::BinaryHeap;
    use std::time::Duration;

    fn entry(deadline: Instant, seq: u64) -> ScheduledEntry {
        ScheduledEntry {
            deadline,
            seq,
            cell: Arc::new(TaskCell::new()),
            job: Box::new(|| {}),
        }
    }

    #[test]
    fn heap_pops_by_deadline_then_sequence() {
        let now = Instant::now();
        let mut heap = BinaryHeap::new();

        heap.push(entry(now + Duration::from_millis(20), 0));
        heap.push(entry(now, 2));
        heap.push(entry(now, 1));
        heap.push(entry(now + Duration::from_millis(10), 3));

        let order: Vec<u64> = std::iter::from_fn(|| heap.pop().map(|e| e.seq)).collect();
        assert_eq!(order, vec![1, 2, 3, 0]);
    }
}
