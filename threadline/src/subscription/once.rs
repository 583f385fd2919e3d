use std::sync::atomic::{AtomicBool, Ordering};

/// An exactly-once claim.
///
/// Among any number of threads calling [`claim`](Self::claim), exactly one
/// observes `true`. Everyone else sees the token as already claimed and
/// must do nothing further.
#[derive(Debug, Default)]
pub struct OnceToken {
    claimed: AtomicBool,
}

impl OnceToken {
    /// Creates an unclaimed token.
    pub const fn new() -> Self {
        Self {
            claimed: AtomicBool::new(false),
        }
    }

    /// Attempts the unclaimed -> claimed transition.
    ///
    /// Returns `true` only for the caller that performed it.
    pub fn claim(&self) -> bool {
        self.claimed
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
    }

    /// Returns `true` once some caller has claimed the token.
    pub fn is_claimed(&self) -> bool {
        self.claimed.load(Ordering::Acquire)
    }
}
