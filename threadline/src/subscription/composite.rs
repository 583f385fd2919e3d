use super::Subscription;

use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// A thread-safe bag of subscriptions.
///
/// `CompositeSubscription` tracks a dynamic set of handles which can be:
/// - added one by one while the bag is active,
/// - removed individually (the removed handle is unsubscribed),
/// - cancelled all at once via [`unsubscribe`](Subscription::unsubscribe).
///
/// Unsubscribing the bag is permanent. Anything added afterwards is
/// unsubscribed on the spot instead of being tracked.
///
/// Members are always unsubscribed after the internal lock is released,
/// so a member's teardown may safely call back into the bag.
pub struct CompositeSubscription {
    state: Mutex<State>,
}

struct State {
    unsubscribed: bool,
    members: Vec<Arc<dyn Subscription>>,
}

impl CompositeSubscription {
    /// Creates an empty, active bag.
    pub fn new() -> Self {
        Self {
            state: Mutex::new(State {
                unsubscribed: false,
                members: Vec::new(),
            }),
        }
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Adds `s` to the bag.
    ///
    /// If the bag is already unsubscribed, `s` is unsubscribed immediately.
    pub fn add(&self, s: Arc<dyn Subscription>) {
        {
            let mut state = self.lock();
            if !state.unsubscribed {
                state.members.push(s);
                return;
            }
        }

        s.unsubscribe();
    }

    /// Removes `s` from the bag and unsubscribes it.
    ///
    /// Membership is by identity (the `Arc` allocation), so any clone of the
    /// handle that was added will match. Does nothing if `s` is not tracked.
    pub fn remove<S: ?Sized>(&self, s: &Arc<S>) {
        self.remove_addr(Arc::as_ptr(s).cast());
    }

    pub(crate) fn remove_addr(&self, addr: *const ()) {
        let removed = {
            let mut state = self.lock();
            let index = state
                .members
                .iter()
                .position(|m| Arc::as_ptr(m).cast::<()>() == addr);
            index.map(|i| state.members.swap_remove(i))
        };

        if let Some(s) = removed {
            s.unsubscribe();
        }
    }

    /// Returns `true` if `s` is currently tracked.
    pub fn contains<S: ?Sized>(&self, s: &Arc<S>) -> bool {
        let addr = Arc::as_ptr(s).cast::<()>();
        self.lock()
            .members
            .iter()
            .any(|m| Arc::as_ptr(m).cast::<()>() == addr)
    }

    /// Unsubscribes and forgets every current member.
    ///
    /// Unlike [`unsubscribe`](Subscription::unsubscribe), the bag stays
    /// active and accepts new members afterwards.
    pub fn clear(&self) {
        let members = std::mem::take(&mut self.lock().members);
        for s in members {
            s.unsubscribe();
        }
    }

    /// Returns the number of tracked members.
    pub fn len(&self) -> usize {
        self.lock().members.len()
    }

    /// Returns `true` if nothing is tracked.
    pub fn is_empty(&self) -> bool {
        self.lock().members.is_empty()
    }
}

impl Subscription for CompositeSubscription {
    fn unsubscribe(&self) {
        let members = {
            let mut state = self.lock();
            if state.unsubscribed {
                return;
            }
            state.unsubscribed = true;
            std::mem::take(&mut state.members)
        };

        for s in members {
            s.unsubscribe();
        }
    }

    fn is_unsubscribed(&self) -> bool {
        self.lock().unsubscribed
    }
}

impl Default for CompositeSubscription {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for CompositeSubscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.lock();
        f.debug_struct("CompositeSubscription")
            .field("unsubscribed", &state.unsubscribed)
            .field("members", &state.members.len())
            .finish()
    }
}
