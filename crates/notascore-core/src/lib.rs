//! NotaScore Core
//!
//! Task scheduling for the NotaScore notation editor: a priority-tiered
//! task queue in front of a fixed-size worker pool.
//!
//! Work such as "recompute layout" or "render frame" is submitted with a
//! [`TaskPriority`]. Each submission runs a dispatch pass that moves every
//! buffered task into the pool, Realtime first, then Interactive, then
//! Background. Tasks report results through side effects on shared state
//! they capture; there is no result channel.
//!
//! # Example
//! ```rust,no_run
//! use std::sync::Arc;
//! use std::sync::atomic::{AtomicU64, Ordering};
//! use notascore_core::{Scheduler, TaskPriority};
//!
//! let scheduler = Scheduler::new(2)?;
//! let layout_version = Arc::new(AtomicU64::new(0));
//!
//! let version = Arc::clone(&layout_version);
//! scheduler.submit(TaskPriority::Interactive, move || {
//!     version.fetch_add(1, Ordering::SeqCst);
//! });
//! scheduler.flush();
//!
//! assert_eq!(layout_version.load(Ordering::SeqCst), 1);
//! # Ok::<(), notascore_core::SchedulerError>(())
//! ```

mod config;
mod error;
pub mod profile;
pub mod thread;

pub use config::SchedulerConfig;
pub use error::{Result, SchedulerError};
pub use profile::{ExecutionMode, HardwareProfile, PerformanceProfile};
pub use thread::{
    PoolStats, Scheduler, SchedulerStats, ShutdownPolicy, TaskFn, TaskPriority, ThreadPool,
    TierCounts,
};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
