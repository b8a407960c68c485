//! Application - boots the scheduler and drives one editor cycle

use std::sync::Arc;

use anyhow::{Context, bail};
use notascore_core::{
    ExecutionMode, HardwareProfile, PerformanceProfile, Scheduler, SchedulerConfig, ShutdownPolicy,
    TaskPriority,
};

use crate::context::{EditorContext, NoteEvent};

/// Worker count override
const ENV_WORKERS: &str = "NOTASCORE_WORKERS";
/// Shutdown policy override: `discard` or `drain`
const ENV_SHUTDOWN: &str = "NOTASCORE_SHUTDOWN";

pub struct Application {
    scheduler: Scheduler,
    context: Arc<EditorContext>,
    render_mode: ExecutionMode,
    low_memory: bool,
}

impl Application {
    pub fn new() -> anyhow::Result<Self> {
        let hardware = HardwareProfile {
            cpu_model: "Intel i3 1st Gen".to_string(),
            ..HardwareProfile::default()
        };
        let parallelism = std::thread::available_parallelism()
            .map(|p| p.get())
            .unwrap_or(1);

        let config = apply_overrides(
            SchedulerConfig::for_hardware(&hardware, parallelism),
            std::env::var(ENV_WORKERS).ok().as_deref(),
            std::env::var(ENV_SHUTDOWN).ok().as_deref(),
        )?;
        config.validate().context("invalid scheduler configuration")?;

        let scheduler = Scheduler::with_config(&config).context("failed to start scheduler")?;
        tracing::info!(
            cpu = %hardware.cpu_model,
            workers = config.worker_count,
            "NotaScore {} starting",
            notascore_core::VERSION
        );

        Ok(Self {
            scheduler,
            context: Arc::new(EditorContext::new()),
            render_mode: PerformanceProfile::choose_render_mode(&hardware),
            low_memory: PerformanceProfile::should_use_low_memory_mode(&hardware),
        })
    }

    pub fn run(&mut self) -> anyhow::Result<()> {
        self.context.add_note(NoteEvent { tick: 0, duration: 480, midi_pitch: 60 });
        self.context.add_note(NoteEvent { tick: 480, duration: 480, midi_pitch: 64 });

        let ctx = Arc::clone(&self.context);
        self.scheduler.submit(TaskPriority::Interactive, move || ctx.recompute_layout_if_needed());

        let ctx = Arc::clone(&self.context);
        self.scheduler.submit(TaskPriority::Realtime, move || ctx.render_frame());

        self.scheduler.flush();

        let stats = self.scheduler.stats();
        println!(
            "NotaScore booted in CPU-first mode: {}",
            self.render_mode == ExecutionMode::CpuOnly
        );
        println!(
            "Notes: {} | Layout version: {} | Frame: {}",
            self.context.note_count(),
            self.context.layout_version(),
            self.context.frame_count()
        );
        println!(
            "Low memory mode: {} | Tasks completed: {}",
            self.low_memory, stats.pool.completed
        );

        if stats.pool.panicked > 0 {
            bail!("{} scheduled task(s) panicked", stats.pool.panicked);
        }

        let dropped = self.scheduler.shutdown();
        tracing::info!(dropped, "NotaScore shut down");
        Ok(())
    }
}

/// Apply environment overrides on top of the hardware-derived config
fn apply_overrides(
    mut config: SchedulerConfig,
    workers: Option<&str>,
    shutdown: Option<&str>,
) -> anyhow::Result<SchedulerConfig> {
    if let Some(workers) = workers {
        config.worker_count = workers
            .trim()
            .parse()
            .with_context(|| format!("{ENV_WORKERS} must be a worker count, got {workers:?}"))?;
    }

    if let Some(shutdown) = shutdown {
        config.shutdown_policy = match shutdown.trim().to_ascii_lowercase().as_str() {
            "discard" => ShutdownPolicy::DiscardPending,
            "drain" => ShutdownPolicy::DrainPending,
            other => bail!("{ENV_SHUTDOWN} must be 'discard' or 'drain', got {other:?}"),
        };
    }

    Ok(config)
}
