//! Task Scheduler
//!
//! Priority tiers in front of a [`ThreadPool`]. Tasks wait in one FIFO
//! queue per [`TaskPriority`] and are handed to the pool by a dispatch
//! pass, Realtime tier first, then Interactive, then Background.
//!
//! Priority decides injection order within a pass only. A Background task
//! injected by an earlier pass can still run before a Realtime task
//! submitted later, and tasks already in the pool are never preempted.

use std::collections::VecDeque;
use std::sync::{Mutex, MutexGuard, PoisonError};

use super::{PoolStats, ShutdownPolicy, TaskFn, TaskPriority, ThreadPool};
use crate::{Result, SchedulerConfig};

/// Per-tier task counts
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TierCounts {
    /// Realtime tier
    pub realtime: usize,
    /// Interactive tier
    pub interactive: usize,
    /// Background tier
    pub background: usize,
}

impl TierCounts {
    /// Sum over all tiers
    pub fn total(&self) -> usize {
        self.realtime + self.interactive + self.background
    }

    /// Count for one tier
    pub fn get(&self, priority: TaskPriority) -> usize {
        match priority {
            TaskPriority::Realtime => self.realtime,
            TaskPriority::Interactive => self.interactive,
            TaskPriority::Background => self.background,
        }
    }

    fn bump(&mut self, priority: TaskPriority) {
        match priority {
            TaskPriority::Realtime => self.realtime += 1,
            TaskPriority::Interactive => self.interactive += 1,
            TaskPriority::Background => self.background += 1,
        }
    }
}

/// Scheduler statistics
#[derive(Debug, Clone, Copy)]
pub struct SchedulerStats {
    /// Tasks accepted per tier since creation
    pub submitted: TierCounts,
    /// Tasks handed to the pool since creation
    pub dispatched: u64,
    /// Tasks still waiting in the tier queues
    pub buffered: TierCounts,
    /// Pool counters at the same moment
    pub pool: PoolStats,
}

/// Tier queues plus their counters, guarded together
#[derive(Default)]
struct Tiers {
    /// Indexed by `TaskPriority::tier_index`
    queues: [VecDeque<TaskFn>; 3],
    submitted: TierCounts,
    dispatched: u64,
}

impl Tiers {
    fn push(&mut self, priority: TaskPriority, task: TaskFn) {
        self.queues[priority.tier_index()].push_back(task);
        self.submitted.bump(priority);
    }

    fn buffered(&self) -> TierCounts {
        TierCounts {
            realtime: self.queues[TaskPriority::Realtime.tier_index()].len(),
            interactive: self.queues[TaskPriority::Interactive.tier_index()].len(),
            background: self.queues[TaskPriority::Background.tier_index()].len(),
        }
    }
}

/// Priority scheduler that owns its worker pool.
///
/// Safe to share between producer threads: the tier queues sit behind their
/// own mutex, and a dispatch pass holds it for the whole pass so passes from
/// different threads never interleave.
///
/// Dropping the last owner from inside one of its own tasks is allowed: the
/// worker running that task is detached rather than joined, and exits once
/// the task returns.
pub struct Scheduler {
    pool: ThreadPool,
    tiers: Mutex<Tiers>,
}

impl std::fmt::Debug for Scheduler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Scheduler")
            .field("pool", &self.pool)
            .field("buffered", &self.pending_counts())
            .finish()
    }
}

impl Scheduler {
    /// Create a scheduler over a new pool of `worker_count` threads
    pub fn new(worker_count: usize) -> Result<Self> {
        ThreadPool::new(worker_count).map(Self::from_pool)
    }

    /// Create a scheduler from a configuration
    pub fn with_config(config: &SchedulerConfig) -> Result<Self> {
        ThreadPool::with_config(config).map(Self::from_pool)
    }

    /// Wrap an existing pool
    pub fn from_pool(pool: ThreadPool) -> Self {
        Self {
            pool,
            tiers: Mutex::new(Tiers::default()),
        }
    }

    fn lock_tiers(&self) -> MutexGuard<'_, Tiers> {
        self.tiers.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Queue a task in its tier and immediately run a dispatch pass
    pub fn submit<F>(&self, priority: TaskPriority, task: F)
    where
        F: FnOnce() + Send + 'static,
    {
        let mut tiers = self.lock_tiers();
        tiers.push(priority, Box::new(task));
        self.dispatch_locked(&mut tiers);
    }

    /// Submit with a raw priority value (see `TaskPriority::try_from`).
    ///
    /// Unknown values are rejected and the task is dropped unrun.
    pub fn submit_raw<F>(&self, priority: u8, task: F) -> Result<()>
    where
        F: FnOnce() + Send + 'static,
    {
        let priority = TaskPriority::try_from(priority)?;
        self.submit(priority, task);
        Ok(())
    }

    /// Buffer a task in its tier without dispatching.
    ///
    /// It reaches the pool on the next `submit`, `dispatch` or `flush`.
    pub fn defer<F>(&self, priority: TaskPriority, task: F)
    where
        F: FnOnce() + Send + 'static,
    {
        self.lock_tiers().push(priority, Box::new(task));
    }

    /// Run a dispatch pass. Returns the number of tasks handed to the pool.
    pub fn dispatch(&self) -> usize {
        let mut tiers = self.lock_tiers();
        self.dispatch_locked(&mut tiers)
    }

    fn dispatch_locked(&self, tiers: &mut Tiers) -> usize {
        let mut dispatched = 0;
        for priority in TaskPriority::ALL {
            let queue = &mut tiers.queues[priority.tier_index()];
            while let Some(task) = queue.pop_front() {
                self.pool.schedule_boxed(task);
                dispatched += 1;
            }
        }
        tiers.dispatched += dispatched as u64;

        if dispatched > 0 {
            tracing::trace!(dispatched, "dispatch pass");
        }
        dispatched
    }

    /// Dispatch everything buffered, then block until the pool is idle
    pub fn flush(&self) {
        self.dispatch();
        self.pool.wait_idle();
    }

    /// Tasks waiting in the tier queues
    pub fn pending_counts(&self) -> TierCounts {
        self.lock_tiers().buffered()
    }

    /// Get scheduler stats
    pub fn stats(&self) -> SchedulerStats {
        let tiers = self.lock_tiers();
        SchedulerStats {
            submitted: tiers.submitted,
            dispatched: tiers.dispatched,
            buffered: tiers.buffered(),
            pool: self.pool.stats(),
        }
    }

    /// The underlying pool
    pub fn pool(&self) -> &ThreadPool {
        &self.pool
    }

    /// Get worker count
    pub fn worker_count(&self) -> usize {
        self.pool.worker_count()
    }

    /// Shut down with the pool's configured policy.
    ///
    /// Under `DrainPending` buffered tier tasks are dispatched first and run;
    /// under `DiscardPending` they are dropped along with the pool queue.
    /// Returns the number of tasks that never ran.
    pub fn shutdown(&mut self) -> usize {
        let policy = self.pool.shutdown_policy();
        let discarded: Vec<VecDeque<TaskFn>> = {
            let mut tiers = self.lock_tiers();
            match policy {
                ShutdownPolicy::DrainPending => {
                    self.dispatch_locked(&mut tiers);
                    Vec::new()
                }
                ShutdownPolicy::DiscardPending => tiers.queues.iter_mut().map(std::mem::take).collect(),
            }
        };
        let buffered: usize = discarded.iter().map(VecDeque::len).sum();
        drop(discarded);

        if buffered > 0 {
            tracing::warn!(buffered, "buffered tier tasks discarded at shutdown");
        }
        buffered + self.pool.shutdown()
    }
}

impl Drop for Scheduler {
    fn drop(&mut self) {
        self.shutdown();
    }
}
