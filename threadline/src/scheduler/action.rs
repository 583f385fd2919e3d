use crate::executor::entry::Job;
use crate::subscription::{CompositeSubscription, OnceToken, Subscription};

use std::fmt;
use std::sync::{Arc, Mutex, PoisonError, Weak};

/// A unit of work that runs at most once and can be revoked at any time.
///
/// A `ScheduledAction` owns a private [`CompositeSubscription`] which is its
/// revocation surface. Everything tied to the action's lifetime goes in
/// there: the handle of its pending execution, and the remover that detaches
/// it from a parent bag.
///
/// The action is unsubscribed exactly once, whichever comes first:
/// - it finishes running, normally or by panicking,
/// - someone calls [`unsubscribe`](Subscription::unsubscribe),
/// - its queued execution is discarded because the worker closed.
pub struct ScheduledAction {
    /// The work, taken out when it runs or is revoked.
    action: Mutex<Option<Job>>,

    /// Handles cancelled together with this action.
    cancel: CompositeSubscription,

    /// Guards the one and only unsubscribe.
    once: OnceToken,
}

impl ScheduledAction {
    /// Wraps `action`.
    pub fn new<F>(action: F) -> Arc<Self>
    where
        F: FnOnce() + Send + 'static,
    {
        Self::from_job(Box::new(action))
    }

    pub(crate) fn from_job(job: Job) -> Arc<Self> {
        Arc::new(Self {
            action: Mutex::new(Some(job)),
            cancel: CompositeSubscription::new(),
            once: OnceToken::new(),
        })
    }

    /// Runs the work, unless the action was already revoked.
    ///
    /// The action unsubscribes itself on every exit path. A panic raised by
    /// the work keeps unwinding to the caller once that cleanup is done.
    pub fn run(&self) {
        let _guard = UnsubscribeOnDrop(self);

        if self.once.is_claimed() {
            return;
        }

        let action = self
            .action
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();

        if let Some(action) = action {
            action();
        }
    }

    /// Ties `s` to this action: unsubscribing the action unsubscribes `s`.
    ///
    /// If the action is already unsubscribed, `s` is unsubscribed at once.
    pub fn add(&self, s: Arc<dyn Subscription>) {
        self.cancel.add(s);
    }

    /// Makes the action remove itself from `parent` when it is unsubscribed
    /// or finishes.
    ///
    /// Adding the action to `parent` is the caller's job. The action does
    /// not keep `parent` alive; if `parent` is gone by then, nothing happens.
    pub fn add_parent(self: &Arc<Self>, parent: &Arc<CompositeSubscription>) {
        self.cancel.add(Arc::new(Remover::new(self, parent)));
    }
}

impl Subscription for ScheduledAction {
    fn unsubscribe(&self) {
        if !self.once.claim() {
            return;
        }

        self.cancel.unsubscribe();

        // Release whatever the work captured if it never ran.
        let action = self
            .action
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        drop(action);
    }

    fn is_unsubscribed(&self) -> bool {
        self.once.is_claimed()
    }
}

impl fmt::Debug for ScheduledAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ScheduledAction")
            .field("unsubscribed", &self.is_unsubscribed())
            .finish()
    }
}

/// Unsubscribes the action when dropped.
struct UnsubscribeOnDrop<'a>(&'a ScheduledAction);

impl Drop for UnsubscribeOnDrop<'_> {
    fn drop(&mut self) {
        self.0.unsubscribe();
    }
}

/// Queue job for one scheduled action.
///
/// Dropping the job without running it, which happens when the executor
/// rejects or discards it, unsubscribes the action.
pub(crate) fn job_for(action: &Arc<ScheduledAction>) -> Job {
    let execution = Execution(action.clone());
    Box::new(move || {
        let execution = execution;
        execution.0.run();
    })
}

struct Execution(Arc<ScheduledAction>);

impl Drop for Execution {
    fn drop(&mut self) {
        self.0.unsubscribe();
    }
}

/// Detaches one action from a parent bag, once.
///
/// Holds both ends weakly: the remover lives inside the child's own bag,
/// so a strong child reference would be a cycle, and it must never extend
/// the parent's lifetime.
pub(crate) struct Remover {
    child: Weak<ScheduledAction>,
    parent: Weak<CompositeSubscription>,
    once: OnceToken,
}

impl Remover {
    pub(crate) fn new(child: &Arc<ScheduledAction>, parent: &Arc<CompositeSubscription>) -> Self {
        Self {
            child: Arc::downgrade(child),
            parent: Arc::downgrade(parent),
            once: OnceToken::new(),
        }
    }
}

impl Subscription for Remover {
    fn unsubscribe(&self) {
        if !self.once.claim() {
            return;
        }

        if let Some(parent) = self.parent.upgrade() {
            parent.remove_addr(self.child.as_ptr().cast());
        }
    }

    fn is_unsubscribed(&self) -> bool {
        self.once.is_claimed()
            || self
                .child
                .upgrade()
                .is_none_or(|child| child.is_unsubscribed())
    }
}
