use super::handle::TaskCell;

use std::cell::RefCell;
use std::sync::Arc;

thread_local! {
    /// State of the task currently executing on this thread.
    ///
    /// Installed by the executor loop for the duration of one task.
    static CURRENT_TASK: RefCell<Option<Arc<TaskCell>>> = const { RefCell::new(None) };
}

/// Runs `f` with `cell` installed as the current task of this thread.
///
/// The previous value is restored afterwards. `f` must not unwind; the
/// executor wraps the task in `catch_unwind` before calling this.
pub(crate) fn enter_task<R>(cell: Arc<TaskCell>, f: impl FnOnce() -> R) -> R {
    CURRENT_TASK.with(|current| {
        let prev = current.replace(Some(cell));
        let out = f();
        current.replace(prev);
        out
    })
}

/// Returns `true` if `cell` is the task executing on this thread.
pub(crate) fn is_current(cell: &Arc<TaskCell>) -> bool {
    CURRENT_TASK.with(|current| {
        current
            .borrow()
            .as_ref()
            .is_some_and(|running| Arc::ptr_eq(running, cell))
    })
}

/// Returns `true` if the scheduled action running on this thread has been
/// asked to stop.
///
/// Interruption is cooperative. It is requested when the action's handle is
/// unsubscribed while the action runs, or when its worker is closed.
/// Long-running actions should poll this between steps; the executor also
/// unparks the thread, so actions blocked in [`std::thread::park`] or
/// [`std::thread::park_timeout`] wake up to check it.
///
/// Always `false` outside a scheduled action.
///
/// # Examples
///
/// ```rust,ignore
/// worker.schedule(|| {
///     while !threadline::is_interrupted() {
///         step();
///     }
/// });
/// ```
pub fn is_interrupted() -> bool {
    CURRENT_TASK.with(|current| {
        current
            .borrow()
            .as_ref()
            .is_some_and(|cell| cell.is_interrupted())
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flag_is_scoped_to_the_current_task() {
        assert!(!is_interrupted());

        let cell = Arc::new(TaskCell::new());
        cell.interrupt();

        enter_task(cell, || assert!(is_interrupted()));
        assert!(!is_interrupted());
    }

    #[test]
    fn current_task_is_only_visible_inside_it() {
        let cell = Arc::new(TaskCell::new());
        let other = Arc::new(TaskCell::new());

        assert!(!is_current(&cell));
        enter_task(cell.clone(), || {
            assert!(is_current(&cell));
            assert!(!is_current(&other));
        });
        assert!(!is_current(&cell));
    }
}
