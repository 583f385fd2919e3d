use std::io;
use std::sync::atomic::{AtomicU64, Ordering};
use std::thread::{self, JoinHandle};

/// Produces uniquely named worker threads.
///
/// Each thread is named `prefix` followed by a counter value. The counter
/// is shared by every thread created through the same factory and is
/// incremented atomically, so names stay unique under concurrent creation.
///
/// Threads are detached once their [`JoinHandle`] is dropped, and a Rust
/// process exits when `main` returns regardless of live threads, so these
/// threads never hold the process open.
#[derive(Debug)]
pub struct ThreadFactory {
    /// Prefix of every thread name.
    prefix: String,

    /// Last counter value handed out.
    counter: AtomicU64,

    /// Stack size for spawned threads, or the platform default.
    stack_size: Option<usize>,
}

impl ThreadFactory {
    /// Creates a factory naming threads `prefix1`, `prefix2`, ...
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            counter: AtomicU64::new(0),
            stack_size: None,
        }
    }

    /// Creates a factory whose threads use a `stack_size`-byte stack.
    pub fn with_stack_size(prefix: impl Into<String>, stack_size: usize) -> Self {
        Self {
            stack_size: Some(stack_size),
            ..Self::new(prefix)
        }
    }

    /// Spawns a new thread running `work`.
    ///
    /// # Errors
    ///
    /// Returns the OS error if the thread could not be created. The counter
    /// value is consumed either way.
    pub fn new_thread<F>(&self, work: F) -> io::Result<JoinHandle<()>>
    where
        F: FnOnce() + Send + 'static,
    {
        let id = self.counter.fetch_add(1, Ordering::AcqRel) + 1;

        let mut builder = thread::Builder::new().name(format!("{}{}", self.prefix, id));
        if let Some(size) = self.stack_size {
            builder = builder.stack_size(size);
        }

        builder.spawn(work)
    }

    /// Returns the thread name prefix.
    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// Returns how many thread names have been handed out.
    pub fn created(&self) -> u64 {
        self.counter.load(Ordering::Acquire)
    }
}

#[cfg(test)]
mod tests {
    use super::ThreadFactory;

    use std::thread;

    #[test]
    fn names_carry_prefix_and_counter() {
        let factory = ThreadFactory::new("unit-");

        let first = factory
            .new_thread(|| {})
            .unwrap()
            .thread()
            .name()
            .map(str::to_owned);
        let second = factory
            .new_thread(|| {})
            .unwrap()
            .thread()
            .name()
            .map(str::to_owned);

        assert_eq!(first.as_deref(), Some("unit-1"));
        assert_eq!(second.as_deref(), Some("unit-2"));
        assert_eq!(factory.created(), 2);
    }

    #[test]
    fn thread_runs_work() {
        let factory = ThreadFactory::with_stack_size("stack-", 256 * 1024);
        let handle = factory
            .new_thread(|| {
                assert_eq!(thread::current().name(), Some("stack-1"));
            })
            .unwrap();

        handle.join().unwrap();
        assert_eq!(factory.prefix(), "stack-");
    }
}
