use threadline::ThreadFactory;

use std::collections::HashSet;
use std::sync::{Arc, Barrier, mpsc};
use std::thread;

#[test]
fn test_concurrent_creation_yields_unique_names() {
    const CALLERS: usize = 8;
    const PER_CALLER: usize = 125;

    let factory = Arc::new(ThreadFactory::new("unique-"));
    let barrier = Arc::new(Barrier::new(CALLERS));
    let (tx, rx) = mpsc::channel::<String>();

    let callers: Vec<_> = (0..CALLERS)
        .map(|_| {
            let factory = factory.clone();
            let barrier = barrier.clone();
            let tx = tx.clone();
            thread::spawn(move || {
                barrier.wait();
                let mut spawned = Vec::with_capacity(PER_CALLER);
                for _ in 0..PER_CALLER {
                    let tx = tx.clone();
                    let handle = factory
                        .new_thread(move || {
                            let name = thread::current().name().unwrap_or_default().to_owned();
                            tx.send(name).unwrap();
                        })
                        .unwrap();
                    spawned.push(handle);
                }
                for handle in spawned {
                    handle.join().unwrap();
                }
            })
        })
        .collect();
    drop(tx);

    for caller in callers {
        caller.join().unwrap();
    }

    let names: Vec<String> = rx.iter().collect();
    let unique: HashSet<&str> = names.iter().map(String::as_str).collect();

    assert_eq!(names.len(), CALLERS * PER_CALLER);
    assert_eq!(unique.len(), CALLERS * PER_CALLER);
    assert!(names.iter().all(|name| name.starts_with("unique-")));
    assert_eq!(factory.created(), (CALLERS * PER_CALLER) as u64);

    let expected: HashSet<String> = (1..=CALLERS * PER_CALLER)
        .map(|i| format!("unique-{i}"))
        .collect();
    assert_eq!(names.into_iter().collect::<HashSet<_>>(), expected);
}

#[test]
fn test_threads_do_not_need_joining() {
    let factory = ThreadFactory::new("detached-");
    let (tx, rx) = mpsc::channel();

    let handle = factory.new_thread(move || tx.send(()).unwrap()).unwrap();
    drop(handle);

    assert!(rx.recv().is_ok());
}
