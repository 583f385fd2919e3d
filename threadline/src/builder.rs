use crate::scheduler::NewThreadScheduler;
use crate::thread_factory::ThreadFactory;

use std::sync::Arc;

/// Thread name prefix used by [`NewThreadScheduler::instance`].
pub const DEFAULT_THREAD_PREFIX: &str = "threadline-new-thread-";

/// Builder for configuring and creating a [`NewThreadScheduler`].
///
/// `SchedulerBuilder` customizes how worker threads are spawned before the
/// scheduler is constructed. Each built scheduler owns its own thread
/// counter.
///
/// # Examples
///
/// ```rust
/// use threadline::SchedulerBuilder;
///
/// let scheduler = SchedulerBuilder::new()
///     .thread_name_prefix("io-")
///     .stack_size(512 * 1024)
///     .build();
/// ```
#[derive(Debug, Clone)]
pub struct SchedulerBuilder {
    /// Prefix of worker thread names.
    thread_name_prefix: String,

    /// Stack size of worker threads, or the platform default.
    stack_size: Option<usize>,
}

impl SchedulerBuilder {
    /// Creates a new `SchedulerBuilder` with default configuration.
    ///
    /// Threads are named [`DEFAULT_THREAD_PREFIX`] followed by a counter
    /// and use the platform's default stack size.
    pub fn new() -> Self {
        Self {
            thread_name_prefix: DEFAULT_THREAD_PREFIX.to_owned(),
            stack_size: None,
        }
    }

    /// Sets the prefix of worker thread names.
    ///
    /// # Panics
    ///
    /// Panics if `prefix` is empty or contains a NUL byte.
    pub fn thread_name_prefix(mut self, prefix: &str) -> Self {
        assert!(!prefix.is_empty(), "thread_name_prefix must not be empty");
        assert!(
            !prefix.contains('\0'),
            "thread_name_prefix must not contain NUL bytes"
        );

        self.thread_name_prefix = prefix.to_owned();
        self
    }

    /// Sets the stack size, in bytes, of worker threads.
    ///
    /// # Panics
    ///
    /// Panics if `size == 0`.
    pub fn stack_size(mut self, size: usize) -> Self {
        assert!(size > 0, "stack_size must be > 0");

        self.stack_size = Some(size);
        self
    }

    /// Builds the scheduler with the configured options.
    pub fn build(self) -> NewThreadScheduler {
        let factory = match self.stack_size {
            Some(size) => ThreadFactory::with_stack_size(self.thread_name_prefix, size),
            None => ThreadFactory::new(self.thread_name_prefix),
        };

        NewThreadScheduler::with_thread_factory(Arc::new(factory))
    }
}

impl Default for SchedulerBuilder {
    fn default() -> Self {
        Self::new()
    }
}
