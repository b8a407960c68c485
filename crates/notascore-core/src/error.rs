//! Scheduler errors

/// Errors raised synchronously by the scheduling core
#[derive(Debug, thiserror::Error)]
pub enum SchedulerError {
    #[error("Unknown task priority: {0}")]
    UnknownPriority(String),

    #[error("Scheduler configured with zero workers")]
    NoWorkers,

    #[error("Failed to spawn worker {worker}: {source}")]
    Spawn {
        worker: usize,
        #[source]
        source: std::io::Error,
    },
}

/// Result alias for scheduling operations
pub type Result<T> = std::result::Result<T, SchedulerError>;
