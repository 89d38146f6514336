use std::panic::panic_any;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

use crossbeam_utils::sync::WaitGroup;
use panic_control::chain_hook_ignoring;

use taskpool::{PoolError, WorkerPool};

#[test]
fn zero_threads_is_rejected() {
    assert!(matches!(
        WorkerPool::new(0),
        Err(PoolError::InvalidThreadCount(0))
    ));
}

#[test]
fn reports_worker_count() {
    let pool = WorkerPool::new(4).unwrap();
    assert_eq!(pool.workers(), 4);
}

#[test]
fn fifo_dequeue_with_single_worker() {
    let pool = WorkerPool::new(1).unwrap();
    let log: Arc<Mutex<Vec<usize>>> = Arc::new(Mutex::new(Vec::new()));

    // Occupy the lone worker so the numbered jobs all queue up together.
    let started = WaitGroup::new();
    let release = WaitGroup::new();
    let job_started = started.clone();
    let job_release = release.clone();
    let gate = pool
        .submit(move || {
            drop(job_started);
            job_release.wait();
        })
        .unwrap();
    started.wait();

    let mut handles = Vec::new();
    for id in 0..100 {
        let log = Arc::clone(&log);
        handles.push(pool.submit(move || log.lock().unwrap().push(id)).unwrap());
    }

    drop(release);
    gate.get().unwrap();
    for handle in handles {
        handle.get().unwrap();
    }

    assert_eq!(*log.lock().unwrap(), (0..100).collect::<Vec<_>>());
}

fn run_exactly_once(threads: usize, jobs: usize) {
    let pool = WorkerPool::new(threads).unwrap();
    let executed = Arc::new(AtomicUsize::new(0));

    let handles: Vec<_> = (0..jobs)
        .map(|n| {
            let executed = Arc::clone(&executed);
            pool.submit(move || {
                executed.fetch_add(1, Ordering::SeqCst);
                n
            })
            .unwrap()
        })
        .collect();

    let mut results: Vec<usize> = handles.iter().map(|h| h.get().unwrap()).collect();
    results.sort_unstable();

    assert_eq!(results, (0..jobs).collect::<Vec<_>>());
    assert_eq!(executed.load(Ordering::SeqCst), jobs);
}

#[test]
fn all_jobs_complete_exactly_once() {
    run_exactly_once(1, 1000);
    run_exactly_once(4, 250);
    run_exactly_once(16, 1000);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Boom;

#[test]
fn panicking_job_does_not_kill_worker() {
    chain_hook_ignoring::<Boom>();

    let pool = WorkerPool::new(1).unwrap();
    let failing = pool.submit(|| -> i32 { panic_any(Boom) }).unwrap();
    let ok = pool.submit(|| 2 + 3).unwrap();

    assert!(matches!(failing.get(), Err(PoolError::JobPanicked(_))));
    assert_eq!(ok.get().unwrap(), 5);
}

#[test]
fn panic_message_is_captured() {
    chain_hook_ignoring::<&'static str>();

    let pool = WorkerPool::new(1).unwrap();
    let handle = pool
        .submit(|| -> () { panic!("division by zero") })
        .unwrap();

    assert_eq!(
        handle.get(),
        Err(PoolError::JobPanicked("division by zero".to_string()))
    );
}

#[test]
fn submit_after_shutdown_is_rejected() {
    let mut pool = WorkerPool::new(2).unwrap();
    pool.shutdown();

    assert!(matches!(pool.submit(|| ()), Err(PoolError::PoolStopped)));
    assert_eq!(pool.pending_jobs(), 0);
}

#[test]
fn queued_jobs_resolve_at_shutdown() {
    let mut pool = WorkerPool::new(1).unwrap();

    let started = WaitGroup::new();
    let job_started = started.clone();
    let busy = pool
        .submit(move || {
            drop(job_started);
            thread::sleep(Duration::from_millis(200));
            7
        })
        .unwrap();
    // Wait until the worker has dequeued the sleeper, so the next job is
    // guaranteed to still be queued when shutdown begins.
    started.wait();

    let queued = pool.submit(|| 8).unwrap();
    pool.shutdown();

    assert_eq!(busy.get().unwrap(), 7);
    assert_eq!(queued.get(), Err(PoolError::PoolShutdown));
}

#[test]
fn hundred_squares_on_four_workers() {
    let pool = WorkerPool::new(4).unwrap();
    let handles: Vec<_> = (0..100u64)
        .map(|n| pool.submit(move || n * n).unwrap())
        .collect();

    let mut results: Vec<u64> = handles.iter().map(|h| h.get().unwrap()).collect();
    results.sort_unstable();

    assert_eq!(results, (0..100u64).map(|n| n * n).collect::<Vec<_>>());
}

#[test]
fn shutdown_is_idempotent() {
    let mut pool = WorkerPool::new(2).unwrap();
    pool.shutdown();
    pool.shutdown();
    // Drop runs shutdown a third time.
}

#[test]
fn handle_can_be_read_many_times() {
    let pool = WorkerPool::new(1).unwrap();
    let handle = pool.submit(|| String::from("done")).unwrap();

    handle.wait();
    assert!(handle.is_ready());
    assert_eq!(handle.get().unwrap(), "done");
    assert_eq!(handle.get().unwrap(), "done");

    let cloned = handle.clone();
    assert_eq!(cloned.get().unwrap(), "done");
}

#[test]
fn concurrent_submitters() {
    let pool = Arc::new(WorkerPool::new(4).unwrap());
    let total = Arc::new(AtomicUsize::new(0));

    let mut submitters = Vec::new();
    for _ in 0..8 {
        let pool = Arc::clone(&pool);
        let total = Arc::clone(&total);
        submitters.push(thread::spawn(move || {
            let handles: Vec<_> = (0..100)
                .map(|_| {
                    let total = Arc::clone(&total);
                    pool.submit(move || {
                        total.fetch_add(1, Ordering::SeqCst);
                    })
                    .unwrap()
                })
                .collect();
            for handle in handles {
                handle.get().unwrap();
            }
        }));
    }

    for submitter in submitters {
        submitter.join().unwrap();
    }
    assert_eq!(total.load(Ordering::SeqCst), 800);
}
