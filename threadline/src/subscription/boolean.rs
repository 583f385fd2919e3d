use super::{OnceToken, Subscription};

use std::fmt;
use std::sync::{Mutex, PoisonError};

type Teardown = Box<dyn FnOnce() + Send>;

/// A subscription backed by a single one-shot flag.
///
/// The optional teardown closure runs on the thread that wins the first
/// `unsubscribe` call, and never again.
pub struct BooleanSubscription {
    once: OnceToken,
    teardown: Mutex<Option<Teardown>>,
}

impl BooleanSubscription {
    /// Creates a subscription with no teardown.
    pub fn new() -> Self {
        Self {
            once: OnceToken::new(),
            teardown: Mutex::new(None),
        }
    }

    /// Creates a subscription that calls `teardown` on first unsubscribe.
    pub fn with_teardown<F>(teardown: F) -> Self
    where
        F: FnOnce() + Send + 'static,
    {
        Self {
            once: OnceToken::new(),
            teardown: Mutex::new(Some(Box::new(teardown))),
        }
    }
}

impl Subscription for BooleanSubscription {
    fn unsubscribe(&self) {
        if !self.once.claim() {
            return;
        }

        let teardown = self
            .teardown
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();

        if let Some(f) = teardown {
            f();
        }
    }

    fn is_unsubscribed(&self) -> bool {
        self.once.is_claimed()
    }
}

impl Default for BooleanSubscription {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for BooleanSubscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BooleanSubscription")
            .field("unsubscribed", &self.is_unsubscribed())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn teardown_runs_once() {
        let calls = Arc::new(AtomicUsize::new(0));
        let c = calls.clone();
        let s = BooleanSubscription::with_teardown(move || {
            c.fetch_add(1, Ordering::SeqCst);
        });

        assert!(!s.is_unsubscribed());
        s.unsubscribe();
        s.unsubscribe();

        assert!(s.is_unsubscribed());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
