//! Threading Model
//!
//! Fixed worker pool and the priority scheduler that feeds it.
//! - One FIFO pool queue, OS worker threads
//! - Three priority tiers drained highest-first into the pool

mod pool;
mod priority;
mod scheduler;

pub use pool::*;
pub use priority::*;
pub use scheduler::*;
