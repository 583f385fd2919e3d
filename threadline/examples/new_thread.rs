//! Example: Scheduling and revoking actions on a new-thread worker

use threadline::{NewThreadScheduler, Scheduler, Subscription, Worker};

use std::thread;
use std::time::Duration;

fn main() -> threadline::Result<()> {
    // Set RUST_LOG=debug to see worker lifecycle events
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let worker = NewThreadScheduler::instance().create_worker()?;

    worker.schedule(|| {
        println!("Hello from {:?}", thread::current().name());
    });

    // Revoked before its delay elapses, so it never prints
    let revoked = worker.schedule_after(
        || println!("This never runs"),
        Duration::from_millis(200),
    );
    revoked.unsubscribe();

    // Long-running work should poll for interruption
    worker.schedule_after(
        || {
            while !threadline::is_interrupted() {
                thread::park_timeout(Duration::from_millis(10));
            }
            println!("Interrupted, stopping");
        },
        Duration::from_millis(50),
    );

    thread::sleep(Duration::from_millis(100));
    worker.close();
    thread::sleep(Duration::from_millis(20));

    Ok(())
}
