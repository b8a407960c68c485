//! Performance Profile
//!
//! Picks the render mode and memory mode from a description of the host.

/// Host hardware as reported at startup
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HardwareProfile {
    /// CPU model string (informational)
    pub cpu_model: String,
    /// Installed RAM in megabytes
    pub ram_mb: u32,
    /// Whether a dedicated GPU is present
    pub has_dedicated_gpu: bool,
    /// Whether only a legacy OpenGL driver is available
    pub legacy_opengl_only: bool,
}

impl Default for HardwareProfile {
    fn default() -> Self {
        Self {
            cpu_model: String::new(),
            ram_mb: 4096,
            has_dedicated_gpu: false,
            legacy_opengl_only: true,
        }
    }
}

/// Where frames are rendered
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExecutionMode {
    /// Software rendering only
    CpuOnly,
    /// CPU with optional GPU acceleration
    Hybrid,
}

/// Hardware-driven performance decisions
#[derive(Debug, Clone, Copy, Default)]
pub struct PerformanceProfile;

/// RAM at or below which the editor runs in low-memory mode
const LOW_MEMORY_THRESHOLD_MB: u32 = 4096;

impl PerformanceProfile {
    /// CPU-only unless there is a modern dedicated GPU and more than 4 GB RAM
    pub fn choose_render_mode(hw: &HardwareProfile) -> ExecutionMode {
        if !hw.has_dedicated_gpu || hw.legacy_opengl_only || hw.ram_mb <= LOW_MEMORY_THRESHOLD_MB {
            return ExecutionMode::CpuOnly;
        }
        ExecutionMode::Hybrid
    }

    /// Low-memory mode at 4 GB RAM or less
    pub fn should_use_low_memory_mode(hw: &HardwareProfile) -> bool {
        hw.ram_mb <= LOW_MEMORY_THRESHOLD_MB
    }
}
