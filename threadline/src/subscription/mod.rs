//! Revocation primitives.
//!
//! Every handle returned by a worker implements [`Subscription`]. The
//! building blocks in this module are:
//! - [`OnceToken`]: the atomic exactly-once claim behind every idempotent
//!   cancellation in the crate,
//! - [`BooleanSubscription`]: a handle that flips once and optionally runs
//!   a teardown closure,
//! - [`CompositeSubscription`]: a thread-safe bag of handles that can be
//!   cancelled individually or all at once,
//! - [`MultipleAssignmentSubscription`]: a slot whose inner handle can be
//!   replaced, used for periodic scheduling.

mod boolean;
mod composite;
mod multiple;
mod once;

pub use boolean::BooleanSubscription;
pub use composite::CompositeSubscription;
pub use multiple::MultipleAssignmentSubscription;
pub use once::OnceToken;

use std::sync::Arc;

/// A revocable handle.
///
/// Unsubscribing marks the handle inert and prevents (or, best effort,
/// stops) whatever work it stands for. Implementations must tolerate any
/// number of concurrent `unsubscribe` calls and perform their cleanup
/// exactly once.
pub trait Subscription: Send + Sync {
    /// Revokes the handle. Calling this more than once is a no-op.
    fn unsubscribe(&self);

    /// Returns `true` once the handle has been revoked or its work is done.
    fn is_unsubscribed(&self) -> bool;
}

/// Creates a subscription that runs `teardown` the first time it is
/// unsubscribed.
///
/// # Examples
///
/// ```rust
/// use threadline::subscription::{self, Subscription};
///
/// let s = subscription::create(|| println!("released"));
/// s.unsubscribe();
/// s.unsubscribe(); // prints once
/// assert!(s.is_unsubscribed());
/// ```
pub fn create<F>(teardown: F) -> Arc<BooleanSubscription>
where
    F: FnOnce() + Send + 'static,
{
    Arc::new(BooleanSubscription::with_teardown(teardown))
}

/// Returns a handle that is already unsubscribed.
///
/// Workers hand this out for work submitted after they were closed.
pub fn unsubscribed() -> Arc<dyn Subscription> {
    let s = BooleanSubscription::new();
    s.unsubscribe();
    Arc::new(s)
}
