//! Edge case tests for notascore-core
//!
//! Misuse, panics, re-entrant submission and empty operations.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use notascore_core::*;

// ============================================================================
// PRIORITY VALUES
// ============================================================================

#[test]
fn test_unknown_priority_fails_fast() {
    let err = TaskPriority::try_from(3).unwrap_err();
    assert_eq!(err.to_string(), "Unknown task priority: 3");

    let err = "urgent".parse::<TaskPriority>().unwrap_err();
    assert!(matches!(err, SchedulerError::UnknownPriority(ref s) if s == "urgent"));
}

#[test]
fn test_submit_raw_unknown_priority_buffers_nothing() {
    let scheduler = Scheduler::new(1).unwrap();

    assert!(scheduler.submit_raw(u8::MAX, || {}).is_err());

    let stats = scheduler.stats();
    assert_eq!(stats.submitted.total(), 0);
    assert_eq!(stats.dispatched, 0);
}

// ============================================================================
// EMPTY AND DEGENERATE POOLS
// ============================================================================

#[test]
fn test_flush_on_empty_scheduler_returns() {
    let scheduler = Scheduler::new(2).unwrap();
    scheduler.flush();
    scheduler.flush();
    assert_eq!(scheduler.dispatch(), 0);
}

#[test]
fn test_zero_worker_pool_is_accepted() {
    let pool = ThreadPool::new(0).unwrap();
    assert_eq!(pool.worker_count(), 0);
    assert!(pool.is_idle());

    // Nothing scheduled, so waiting is fine
    pool.wait_idle();

    pool.schedule(|| {});
    assert!(!pool.wait_idle_timeout(Duration::from_millis(5)));
}

#[test]
fn test_zero_worker_config_rejected_by_validate() {
    let config = SchedulerConfig::default().with_worker_count(0);
    assert!(matches!(config.validate(), Err(SchedulerError::NoWorkers)));
}

// ============================================================================
// TASK FAILURES
// ============================================================================

#[test]
fn test_panics_do_not_shrink_capacity() {
    let scheduler = Scheduler::new(2).unwrap();
    let counter = Arc::new(AtomicUsize::new(0));

    for i in 0..20 {
        let counter = Arc::clone(&counter);
        scheduler.submit(TaskPriority::Interactive, move || {
            if i % 2 == 0 {
                panic!("task {i} failed");
            }
            counter.fetch_add(1, Ordering::SeqCst);
        });
    }
    scheduler.flush();

    assert_eq!(counter.load(Ordering::SeqCst), 10);
    let stats = scheduler.stats().pool;
    assert_eq!(stats.panicked, 10);
    assert_eq!(stats.completed, 20);
    assert_eq!(stats.active, 0);
}

// ============================================================================
// RE-ENTRANT SUBMISSION
// ============================================================================

#[test]
fn test_task_submitting_follow_up_is_covered_by_flush() {
    let scheduler = Arc::new(Scheduler::new(2).unwrap());
    let log = Arc::new(Mutex::new(Vec::new()));

    let inner_scheduler = Arc::clone(&scheduler);
    let inner_log = Arc::clone(&log);
    scheduler.submit(TaskPriority::Interactive, move || {
        inner_log.lock().unwrap().push("layout");
        let log = Arc::clone(&inner_log);
        inner_scheduler.submit(TaskPriority::Realtime, move || {
            log.lock().unwrap().push("render");
        });
    });
    scheduler.flush();

    assert_eq!(*log.lock().unwrap(), vec!["layout", "render"]);
}

#[test]
fn test_cooperative_cancellation_flag() {
    use std::sync::atomic::AtomicBool;

    let scheduler = Scheduler::new(1).unwrap();
    let cancelled = Arc::new(AtomicBool::new(false));
    let ran = Arc::new(AtomicUsize::new(0));

    cancelled.store(true, Ordering::SeqCst);
    for _ in 0..5 {
        let cancelled = Arc::clone(&cancelled);
        let ran = Arc::clone(&ran);
        scheduler.submit(TaskPriority::Background, move || {
            if cancelled.load(Ordering::SeqCst) {
                return;
            }
            ran.fetch_add(1, Ordering::SeqCst);
        });
    }
    scheduler.flush();

    assert_eq!(ran.load(Ordering::SeqCst), 0);
    assert_eq!(scheduler.stats().pool.completed, 5);
}

// ============================================================================
// SHUTDOWN
// ============================================================================

#[test]
fn test_shutdown_is_idempotent() {
    let mut scheduler = Scheduler::new(2).unwrap();
    scheduler.submit(TaskPriority::Realtime, || {});
    scheduler.flush();

    assert_eq!(scheduler.shutdown(), 0);
    assert_eq!(scheduler.shutdown(), 0);
}

#[test]
fn test_submit_after_shutdown_never_runs() {
    let mut scheduler = Scheduler::new(1).unwrap();
    scheduler.shutdown();

    let ran = Arc::new(AtomicUsize::new(0));
    let r = Arc::clone(&ran);
    scheduler.submit(TaskPriority::Realtime, move || {
        r.fetch_add(1, Ordering::SeqCst);
    });

    // Pool is stopped and idle, flush must not hang
    scheduler.flush();
    assert_eq!(ran.load(Ordering::SeqCst), 0);

    let stats = scheduler.stats();
    assert_eq!(stats.submitted.total(), 1);
    assert_eq!(stats.dispatched, 1);
    assert_eq!(stats.pool.completed, 0);
    assert_eq!(stats.pool.dropped, 1);
}

#[test]
fn test_shutdown_discard_counts_dropped() {
    /// Sends on drop, so discarding the queued task unblocks the running one
    struct ReleaseOnDrop(std::sync::mpsc::Sender<()>);

    impl Drop for ReleaseOnDrop {
        fn drop(&mut self) {
            let _ = self.0.send(());
        }
    }

    let mut pool = ThreadPool::new(1).unwrap();
    let (started_tx, started_rx) = std::sync::mpsc::channel::<()>();
    let (release_tx, release_rx) = std::sync::mpsc::channel::<()>();

    pool.schedule(move || {
        started_tx.send(()).unwrap();
        let _ = release_rx.recv();
    });
    let guard = ReleaseOnDrop(release_tx);
    pool.schedule(move || drop(guard));
    pool.schedule(|| {});
    started_rx.recv().unwrap();

    assert_eq!(pool.shutdown(), 2);

    let stats = pool.stats();
    assert_eq!(stats.dropped, 2);
    assert_eq!(stats.completed, 1);
}

#[test]
fn test_last_owner_dropped_inside_task() {
    let scheduler = Arc::new(Scheduler::new(2).unwrap());
    let (release_tx, release_rx) = std::sync::mpsc::channel::<()>();
    let (done_tx, done_rx) = std::sync::mpsc::channel::<()>();

    let owned = Arc::clone(&scheduler);
    scheduler.submit(TaskPriority::Background, move || {
        let _ = release_rx.recv();
        // Last reference: shuts the scheduler down on this worker
        drop(owned);
        done_tx.send(()).unwrap();
    });

    drop(scheduler);
    release_tx.send(()).unwrap();

    // A panic inside the drop would skip the send and close the channel
    assert!(done_rx.recv_timeout(Duration::from_secs(5)).is_ok());
}
