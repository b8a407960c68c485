//! Thread Pool
//!
//! Fixed-size worker pool over a single FIFO queue, using std::thread.
//! One mutex guards the queue and the active count; `wakeup` parks idle
//! workers and `idle` parks callers of [`ThreadPool::wait_idle`].

use std::any::Any;
use std::collections::VecDeque;
use std::panic::{self, AssertUnwindSafe};
use std::sync::{Arc, Condvar, Mutex, MutexGuard, PoisonError};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use crate::{Result, SchedulerConfig, SchedulerError};

/// Task function type
pub type TaskFn = Box<dyn FnOnce() + Send + 'static>;

/// What happens to queued-but-not-started tasks when the pool shuts down
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ShutdownPolicy {
    /// Drop pending tasks without running them
    #[default]
    DiscardPending,
    /// Let the workers run every pending task before they exit
    DrainPending,
}

/// Everything the workers and the pool handle share under one lock
struct PoolState {
    tasks: VecDeque<TaskFn>,
    active: usize,
    stopping: bool,
    completed: u64,
    panicked: u64,
    dropped: u64,
}

struct Shared {
    state: Mutex<PoolState>,
    /// Signalled when a task is queued or the pool starts stopping
    wakeup: Condvar,
    /// Signalled whenever a worker finishes a task
    idle: Condvar,
}

impl Shared {
    fn new() -> Self {
        Self {
            state: Mutex::new(PoolState {
                tasks: VecDeque::new(),
                active: 0,
                stopping: false,
                completed: 0,
                panicked: 0,
                dropped: 0,
            }),
            wakeup: Condvar::new(),
            idle: Condvar::new(),
        }
    }

    // Tasks never run under the lock, so poisoning can only come from a bug in
    // this module; the state is still consistent, keep going.
    fn lock(&self) -> MutexGuard<'_, PoolState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

fn is_idle(state: &PoolState) -> bool {
    state.tasks.is_empty() && state.active == 0
}

/// Point-in-time pool statistics
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PoolStats {
    /// Worker threads owned by the pool
    pub workers: usize,
    /// Tasks queued but not yet picked up
    pub pending: usize,
    /// Tasks currently executing
    pub active: usize,
    /// Tasks that finished, including ones that panicked
    pub completed: u64,
    /// Tasks that panicked
    pub panicked: u64,
    /// Tasks that never ran: discarded at shutdown or scheduled after it
    pub dropped: u64,
}

struct Worker {
    id: usize,
    thread: Option<JoinHandle<()>>,
}

impl std::fmt::Debug for Worker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Worker")
            .field("id", &self.id)
            .field("running", &self.thread.is_some())
            .finish()
    }
}

impl Worker {
    fn spawn(id: usize, name: String, shared: Arc<Shared>) -> std::io::Result<Self> {
        let thread = thread::Builder::new()
            .name(name)
            .spawn(move || run_worker(id, &shared))?;

        Ok(Self {
            id,
            thread: Some(thread),
        })
    }
}

fn run_worker(id: usize, shared: &Shared) {
    tracing::debug!(worker = id, "worker started");

    loop {
        let task = {
            let mut state = shared
                .wakeup
                .wait_while(shared.lock(), |s| !s.stopping && s.tasks.is_empty())
                .unwrap_or_else(PoisonError::into_inner);

            let Some(task) = state.tasks.pop_front() else {
                // Stopping with nothing left to run
                break;
            };
            state.active += 1;
            task
        };

        let outcome = panic::catch_unwind(AssertUnwindSafe(task));

        {
            let mut state = shared.lock();
            state.active -= 1;
            state.completed += 1;
            if outcome.is_err() {
                state.panicked += 1;
            }
        }
        shared.idle.notify_all();

        if let Err(payload) = outcome {
            tracing::error!(worker = id, "task panicked: {}", panic_message(payload.as_ref()));
        }
    }

    tracing::debug!(worker = id, "worker terminated");
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    if let Some(msg) = payload.downcast_ref::<&'static str>() {
        msg
    } else if let Some(msg) = payload.downcast_ref::<String>() {
        msg
    } else {
        "<non-string panic payload>"
    }
}

/// Fixed-size thread pool with a single FIFO queue
pub struct ThreadPool {
    /// Worker threads
    workers: Vec<Worker>,
    /// Queue, counters and condition variables
    shared: Arc<Shared>,
    /// Number of workers
    worker_count: usize,
    /// Policy applied by `shutdown` and `Drop`
    shutdown_policy: ShutdownPolicy,
    /// Set once a worker has been left to exit on its own
    detached: bool,
}

impl std::fmt::Debug for ThreadPool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ThreadPool")
            .field("workers", &self.workers)
            .field("worker_count", &self.worker_count)
            .field("shutdown_policy", &self.shutdown_policy)
            .field("stats", &self.stats())
            .finish()
    }
}

impl ThreadPool {
    /// Create new thread pool with specified worker count
    pub fn new(worker_count: usize) -> Result<Self> {
        Self::with_config(&SchedulerConfig::default().with_worker_count(worker_count))
    }

    /// Create with default worker count (num CPUs)
    pub fn default_size() -> Result<Self> {
        let count = thread::available_parallelism()
            .map(|p| p.get())
            .unwrap_or(4);
        Self::new(count)
    }

    /// Create from a configuration.
    ///
    /// A zero worker count is accepted: such a pool never runs anything and
    /// `wait_idle` blocks forever once a task has been scheduled. Use
    /// [`SchedulerConfig::validate`] to reject it up front.
    pub fn with_config(config: &SchedulerConfig) -> Result<Self> {
        if config.worker_count == 0 {
            tracing::warn!("thread pool created with zero workers; scheduled tasks will never run");
        }

        let mut pool = Self {
            workers: Vec::with_capacity(config.worker_count),
            shared: Arc::new(Shared::new()),
            worker_count: config.worker_count,
            shutdown_policy: config.shutdown_policy,
            detached: false,
        };

        for id in 0..config.worker_count {
            let name = format!("{}-{}", config.thread_name, id);
            match Worker::spawn(id, name, Arc::clone(&pool.shared)) {
                Ok(worker) => pool.workers.push(worker),
                Err(source) => {
                    // Join whatever already started before reporting
                    pool.shutdown_with(ShutdownPolicy::DiscardPending);
                    return Err(SchedulerError::Spawn { worker: id, source });
                }
            }
        }

        tracing::info!(
            workers = config.worker_count,
            policy = ?config.shutdown_policy,
            "thread pool started"
        );
        Ok(pool)
    }

    /// Queue a task and wake one idle worker.
    ///
    /// Tasks scheduled after shutdown are dropped with a warning.
    pub fn schedule<F>(&self, task: F)
    where
        F: FnOnce() + Send + 'static,
    {
        self.schedule_boxed(Box::new(task));
    }

    /// Queue an already boxed task
    pub fn schedule_boxed(&self, task: TaskFn) {
        {
            let mut state = self.shared.lock();
            if state.stopping {
                state.dropped += 1;
                drop(state);
                tracing::warn!("task scheduled on a stopped pool; dropped");
                return;
            }
            state.tasks.push_back(task);
        }
        self.shared.wakeup.notify_one();
    }

    /// Block until the queue is empty and no task is executing
    pub fn wait_idle(&self) {
        let _state = self
            .shared
            .idle
            .wait_while(self.shared.lock(), |s| !is_idle(s))
            .unwrap_or_else(PoisonError::into_inner);
    }

    /// Like [`wait_idle`](Self::wait_idle) but gives up after `timeout`.
    /// Returns whether the pool was idle. Nothing is cancelled on timeout.
    pub fn wait_idle_timeout(&self, timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;
        let mut state = self.shared.lock();

        while !is_idle(&state) {
            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                return false;
            }
            state = self
                .shared
                .idle
                .wait_timeout(state, remaining)
                .unwrap_or_else(PoisonError::into_inner)
                .0;
        }
        true
    }

    /// Get worker count
    pub fn worker_count(&self) -> usize {
        self.worker_count
    }

    /// Get pending task count
    pub fn pending_tasks(&self) -> usize {
        self.shared.lock().tasks.len()
    }

    /// Get active task count
    pub fn active_tasks(&self) -> usize {
        self.shared.lock().active
    }

    /// Check if pool is idle
    pub fn is_idle(&self) -> bool {
        is_idle(&self.shared.lock())
    }

    /// Policy used by [`shutdown`](Self::shutdown) and `Drop`
    pub fn shutdown_policy(&self) -> ShutdownPolicy {
        self.shutdown_policy
    }

    /// Snapshot of the pool counters
    pub fn stats(&self) -> PoolStats {
        let state = self.shared.lock();
        PoolStats {
            workers: self.worker_count,
            pending: state.tasks.len(),
            active: state.active,
            completed: state.completed,
            panicked: state.panicked,
            dropped: state.dropped,
        }
    }

    /// Shutdown the pool with its configured policy.
    /// Returns the number of tasks dropped without running.
    pub fn shutdown(&mut self) -> usize {
        self.shutdown_with(self.shutdown_policy)
    }

    /// Shutdown the pool, overriding the configured policy.
    ///
    /// Joins every worker. Calling it again is a no-op.
    ///
    /// When called from one of the pool's own workers (the last owner was
    /// dropped inside a task), that worker is detached instead of joined; it
    /// exits on its own once its current task returns.
    pub fn shutdown_with(&mut self, policy: ShutdownPolicy) -> usize {
        let discarded = {
            let mut state = self.shared.lock();
            state.stopping = true;
            let discarded = match policy {
                ShutdownPolicy::DiscardPending => std::mem::take(&mut state.tasks),
                ShutdownPolicy::DrainPending => VecDeque::new(),
            };
            state.dropped += discarded.len() as u64;
            discarded
        };
        self.shared.wakeup.notify_all();

        // Drop before joining: a discarded task's captures may be what a
        // running task is waiting on
        let mut dropped = discarded.len();
        drop(discarded);

        let current = thread::current().id();
        let mut joined = 0;
        for worker in &mut self.workers {
            if let Some(thread) = worker.thread.take() {
                if thread.thread().id() == current {
                    tracing::debug!(worker = worker.id, "shutdown from inside a task; worker detached");
                    self.detached = true;
                    continue;
                }
                if thread.join().is_err() {
                    tracing::error!(worker = worker.id, "worker thread panicked outside a task");
                }
                joined += 1;
            }
        }

        // Only a pool without workers can still hold tasks here. A detached
        // worker drains what is left itself under `DrainPending`.
        if !self.detached {
            let leftover = {
                let mut state = self.shared.lock();
                let leftover = std::mem::take(&mut state.tasks);
                state.dropped += leftover.len() as u64;
                leftover
            };
            dropped += leftover.len();
            drop(leftover);
        }
        self.shared.idle.notify_all();

        if dropped > 0 {
            tracing::warn!(dropped, ?policy, "pending tasks discarded at shutdown");
        }
        if joined > 0 {
            tracing::info!(workers = joined, "thread pool stopped");
        }
        dropped
    }
}

impl Drop for ThreadPool {
    fn drop(&mut self) {
        self.shutdown();
    }
}
