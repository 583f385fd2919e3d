use super::Subscription;

use std::sync::{Arc, Mutex, PoisonError};

/// A subscription slot whose inner handle can be swapped.
///
/// [`set`](Self::set) replaces the current inner handle without
/// unsubscribing the previous one. Unsubscribing the slot unsubscribes
/// whatever is current, and anything set afterwards is unsubscribed
/// immediately.
pub struct MultipleAssignmentSubscription {
    state: Mutex<Slot>,
}

struct Slot {
    unsubscribed: bool,
    current: Option<Arc<dyn Subscription>>,
}

impl MultipleAssignmentSubscription {
    /// Creates an empty, active slot.
    pub fn new() -> Self {
        Self {
            state: Mutex::new(Slot {
                unsubscribed: false,
                current: None,
            }),
        }
    }

    /// Replaces the inner handle.
    pub fn set(&self, s: Arc<dyn Subscription>) {
        {
            let mut slot = self.state.lock().unwrap_or_else(PoisonError::into_inner);
            if !slot.unsubscribed {
                slot.current = Some(s);
                return;
            }
        }

        s.unsubscribe();
    }

    /// Returns the current inner handle, if any.
    pub fn get(&self) -> Option<Arc<dyn Subscription>> {
        self.state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .current
            .clone()
    }
}

impl Subscription for MultipleAssignmentSubscription {
    fn unsubscribe(&self) {
        let current = {
            let mut slot = self.state.lock().unwrap_or_else(PoisonError::into_inner);
            if slot.unsubscribed {
                return;
            }
            slot.unsubscribed = true;
            slot.current.take()
        };

        if let Some(s) = current {
            s.unsubscribe();
        }
    }

    fn is_unsubscribed(&self) -> bool {
        self.state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .unsubscribed
    }
}

impl Default for MultipleAssignmentSubscription {
    fn default() -> Self {
        Self::new()
    }
}
