use threadline::{NewThreadScheduler, Scheduler, SchedulerBuilder, Worker};

use std::sync::mpsc;
use std::thread;
use std::time::Duration;

#[test]
fn test_builder_prefix_names_worker_threads() {
    let scheduler = SchedulerBuilder::new()
        .thread_name_prefix("built-")
        .stack_size(256 * 1024)
        .build();

    let first = scheduler.create_worker().unwrap();
    let second = scheduler.create_worker().unwrap();
    let (tx, rx) = mpsc::channel();

    first.schedule(move || {
        tx.send(thread::current().name().map(str::to_owned)).unwrap();
    });

    assert_eq!(
        rx.recv_timeout(Duration::from_secs(2)).unwrap().as_deref(),
        Some("built-1")
    );
    assert_eq!(second.thread().name(), Some("built-2"));
    assert_eq!(scheduler.thread_factory().created(), 2);
}

#[test]
fn test_default_builder_uses_default_prefix() {
    let scheduler = NewThreadScheduler::builder().build();
    assert_eq!(
        scheduler.thread_factory().prefix(),
        threadline::DEFAULT_THREAD_PREFIX
    );
}

#[test]
fn test_built_schedulers_count_independently() {
    let a = SchedulerBuilder::new().thread_name_prefix("count-").build();
    let b = SchedulerBuilder::new().thread_name_prefix("count-").build();

    let wa = a.create_worker().unwrap();
    let wb = b.create_worker().unwrap();

    assert_eq!(wa.thread().name(), Some("count-1"));
    assert_eq!(wb.thread().name(), Some("count-1"));
}

#[test]
#[should_panic(expected = "thread_name_prefix must not be empty")]
fn test_empty_prefix_panics() {
    let _ = SchedulerBuilder::new().thread_name_prefix("");
}

#[test]
#[should_panic(expected = "thread_name_prefix must not contain NUL bytes")]
fn test_nul_prefix_panics() {
    let _ = SchedulerBuilder::new().thread_name_prefix("bad\0prefix-");
}

#[test]
#[should_panic(expected = "stack_size must be > 0")]
fn test_zero_stack_size_panics() {
    let _ = SchedulerBuilder::new().stack_size(0);
}
