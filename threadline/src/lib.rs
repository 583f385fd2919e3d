//! # Threadline
//!
//! **Threadline** provides cancellable workers for reactive runtimes in the
//! **Nebula** ecosystem. A worker is a serial timeline backed by one
//! dedicated thread. Actions scheduled on it run one at a time, at most
//! once each, and every one of them can be revoked from any thread.
//!
//! What the crate guarantees:
//!
//! - **Exactly-once cleanup**: any number of concurrent `unsubscribe` calls
//!   on a handle perform its cleanup once
//! - **Revocation before execution** prevents the action from ever running
//! - **Self-cleanup**: an action unsubscribes itself after running, whether
//!   it returned or panicked
//! - **Parent tracking**: an action linked to a parent bag leaves it exactly
//!   once, whoever triggers it
//! - **One-shot shutdown**: closing a worker discards queued actions,
//!   interrupts the running one (best effort), and never blocks
//!
//! ## Quick Start
//!
//! ```rust
//! use threadline::{NewThreadScheduler, Scheduler, Subscription, Worker};
//! use std::sync::mpsc;
//! use std::time::Duration;
//!
//! let worker = NewThreadScheduler::instance().create_worker().unwrap();
//!
//! let (tx, rx) = mpsc::channel();
//! worker.schedule(move || tx.send("hello").unwrap());
//! assert_eq!(rx.recv().unwrap(), "hello");
//!
//! // Revoked before its delay elapses: never runs.
//! let later = worker.schedule_after(|| unreachable!(), Duration::from_secs(60));
//! later.unsubscribe();
//!
//! worker.close();
//! assert!(worker.schedule(|| unreachable!()).is_unsubscribed());
//! ```
//!
//! ## Modules
//!
//! - [`subscription`]: Revocable handles, the one-shot token and bags
//! - [`executor`]: The single-thread scheduled execution context
//! - [`scheduler`]: Schedulers, workers and scheduled actions
//!
//! ## Logging
//!
//! Lifecycle events are emitted through [`tracing`]: worker threads starting
//! and stopping, workers closing, and panicking actions. Install any
//! `tracing` subscriber to see them.

mod builder;
mod error;
mod thread_factory;

pub mod executor;
pub mod scheduler;
pub mod subscription;

pub use builder::{DEFAULT_THREAD_PREFIX, SchedulerBuilder};
pub use error::{Error, Result};
pub use executor::is_interrupted;
pub use scheduler::{NewThreadScheduler, NewThreadWorker, ScheduledAction, Scheduler, Worker};
pub use subscription::{CompositeSubscription, OnceToken, Subscription};
pub use thread_factory::ThreadFactory;
