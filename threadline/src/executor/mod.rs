//! Single-thread scheduled execution context.
//!
//! Every worker owns exactly one [`ScheduledExecutor`]: a dedicated thread
//! draining a deadline-ordered queue. It is composed of:
//! - `core`: the executor, its queue and the thread loop,
//! - `entry`: queue entries ordered by fire time,
//! - `handle`: the revocable handle for one pending execution,
//! - `context`: per-thread state exposing cooperative interruption,
//! - `state`: task lifecycle states.

pub(crate) mod context;
pub(crate) mod core;
pub(crate) mod entry;
pub(crate) mod handle;
pub(crate) mod state;

pub use self::core::ScheduledExecutor;
pub use context::is_interrupted;
pub use handle::TaskHandle;
