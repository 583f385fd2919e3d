/// Task is queued and has not started.
///
/// Cancelling from this state guarantees the task never runs.
pub(crate) const PENDING: usize = 0;

/// Task is currently executing on the executor thread.
pub(crate) const RUNNING: usize = 1;

/// Task ran to completion, normally or by panicking.
pub(crate) const COMPLETED: usize = 2;

/// Task was cancelled before or while running.
///
/// A task cancelled while running keeps executing until it returns or
/// notices its interrupt flag.
pub(crate) const CANCELLED: usize = 3;
