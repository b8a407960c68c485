//! Scheduler Configuration

use crate::profile::{HardwareProfile, PerformanceProfile};
use crate::{Result, SchedulerError, ShutdownPolicy};

/// Workers used on low-memory machines, and the floor everywhere else
const LOW_END_WORKERS: usize = 2;

/// Upper bound for hardware-derived worker counts
const MAX_DERIVED_WORKERS: usize = 8;

/// Scheduler configuration options
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchedulerConfig {
    /// Number of worker threads in the pool
    pub worker_count: usize,

    /// Worker thread name prefix; workers are named `<prefix>-<index>`
    pub thread_name: String,

    /// What to do with pending tasks at shutdown
    pub shutdown_policy: ShutdownPolicy,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            worker_count: LOW_END_WORKERS,
            thread_name: "notascore-worker".to_string(),
            shutdown_policy: ShutdownPolicy::default(),
        }
    }
}

impl SchedulerConfig {
    /// Derive a configuration from the host hardware.
    ///
    /// `parallelism` is the number of hardware threads available, usually
    /// `std::thread::available_parallelism()`. One is left for the UI thread.
    pub fn for_hardware(hw: &HardwareProfile, parallelism: usize) -> Self {
        let worker_count = if PerformanceProfile::should_use_low_memory_mode(hw) {
            LOW_END_WORKERS
        } else {
            parallelism
                .saturating_sub(1)
                .clamp(LOW_END_WORKERS, MAX_DERIVED_WORKERS)
        };

        Self {
            worker_count,
            ..Self::default()
        }
    }

    /// Set worker count
    pub fn with_worker_count(mut self, worker_count: usize) -> Self {
        self.worker_count = worker_count;
        self
    }

    /// Set worker thread name prefix
    pub fn with_thread_name(mut self, name: impl Into<String>) -> Self {
        self.thread_name = name.into();
        self
    }

    /// Set shutdown policy
    pub fn with_shutdown_policy(mut self, policy: ShutdownPolicy) -> Self {
        self.shutdown_policy = policy;
        self
    }

    /// Reject configurations that would leave submitted work stranded
    pub fn validate(&self) -> Result<()> {
        if self.worker_count == 0 {
            return Err(SchedulerError::NoWorkers);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn workstation() -> HardwareProfile {
        HardwareProfile {
            cpu_model: "Ryzen 7".to_string(),
            ram_mb: 32768,
            has_dedicated_gpu: true,
            legacy_opengl_only: false,
        }
    }

    #[test]
    fn test_default_config() {
        let config = SchedulerConfig::default();
        assert_eq!(config.worker_count, 2);
        assert_eq!(config.shutdown_policy, ShutdownPolicy::DiscardPending);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_zero_workers_rejected() {
        let config = SchedulerConfig::default().with_worker_count(0);
        assert!(matches!(config.validate(), Err(SchedulerError::NoWorkers)));
    }

    #[test]
    fn test_low_end_hardware_gets_two_workers() {
        let config = SchedulerConfig::for_hardware(&HardwareProfile::default(), 16);
        assert_eq!(config.worker_count, 2);
    }

    #[test]
    fn test_workstation_worker_clamp() {
        let hw = workstation();
        assert_eq!(SchedulerConfig::for_hardware(&hw, 1).worker_count, 2);
        assert_eq!(SchedulerConfig::for_hardware(&hw, 6).worker_count, 5);
        assert_eq!(SchedulerConfig::for_hardware(&hw, 64).worker_count, 8);
    }

    #[test]
    fn test_builder_methods() {
        let config = SchedulerConfig::default()
            .with_worker_count(4)
            .with_thread_name("layout")
            .with_shutdown_policy(ShutdownPolicy::DrainPending);

        assert_eq!(config.worker_count, 4);
        assert_eq!(config.thread_name, "layout");
        assert_eq!(config.shutdown_policy, ShutdownPolicy::DrainPending);
    }
}
