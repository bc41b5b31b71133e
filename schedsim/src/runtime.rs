//! # Simulation Runtime
//!
//! Drives scheduler runs and routes their output.
//!
//! Snapshots and outcomes go to the output stream through the configured
//! [`Renderer`]; audit log entries go to a separate log stream when a log level
//! is configured.

use crate::console::ConsoleError;
use crate::workload::{Workload, WorkloadError};
use crate::{EXIT_FAILURE, EXIT_USAGE};
use sim_scheduler::{
    AlgorithmChoice, RunOutcome, Scheduler, SchedulerConfig, SchedulerError, SchedulingAlgorithm,
    TickOutcome, ValidationError, DEFAULT_MAX_TICKS,
};
use std::io::{self, Write};
use thiserror::Error;
use trace_logger::{EventLogger, LogLevel};
use trace_renderer::{ComparisonRow, OutputFormat, RenderError, Renderer};
use tracing::{debug, info};

/// Round-robin quantum used by comparison runs when none is given
pub const DEFAULT_COMPARE_QUANTUM: u64 = 2;

/// Simulation runtime error types
#[derive(Debug, Error)]
pub enum SimRuntimeError {
    #[error("Workload error: {0}")]
    Workload(#[from] WorkloadError),

    #[error("Input error: {0}")]
    Console(#[from] ConsoleError),

    #[error("Invalid run definition: {0}")]
    Validation(#[from] ValidationError),

    #[error("Scheduler error: {0}")]
    Scheduler(#[from] SchedulerError),

    #[error("Render error: {0}")]
    Render(#[from] RenderError),

    #[error("Output error: {0}")]
    Io(#[from] io::Error),
}

impl SimRuntimeError {
    /// Process exit code for this error
    pub fn exit_code(&self) -> i32 {
        match self {
            SimRuntimeError::Workload(_) | SimRuntimeError::Validation(_) => EXIT_USAGE,
            SimRuntimeError::Console(ConsoleError::Io(_)) => EXIT_FAILURE,
            SimRuntimeError::Console(_) => EXIT_USAGE,
            SimRuntimeError::Scheduler(_)
            | SimRuntimeError::Render(_)
            | SimRuntimeError::Io(_) => EXIT_FAILURE,
        }
    }
}

/// Simulation runtime configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SimRuntimeConfig {
    /// Output format for snapshots and reports
    pub format: OutputFormat,
    /// Tick limit per run (`None` = unbounded)
    pub max_ticks: Option<u64>,
    /// Minimum level for audit log output (`None` = no log output)
    pub log_level: Option<LogLevel>,
    /// Whether to print the per-task statistics table
    pub show_summary: bool,
    /// Whether to stop runs that make no progress
    pub livelock_detection: bool,
}

impl Default for SimRuntimeConfig {
    fn default() -> Self {
        Self {
            format: OutputFormat::Text,
            max_ticks: Some(DEFAULT_MAX_TICKS),
            log_level: None,
            show_summary: true,
            livelock_detection: true,
        }
    }
}

/// Simulation runtime
pub struct SimRuntime {
    config: SimRuntimeConfig,
    renderer: Box<dyn Renderer>,
    logger: Option<EventLogger>,
}

impl SimRuntime {
    pub fn new(config: SimRuntimeConfig) -> Self {
        Self {
            renderer: config.format.renderer(),
            logger: config.log_level.map(EventLogger::new),
            config,
        }
    }

    pub fn config(&self) -> &SimRuntimeConfig {
        &self.config
    }

    fn scheduler_config(&self, algorithm: SchedulingAlgorithm) -> SchedulerConfig {
        SchedulerConfig::new(algorithm)
            .with_max_ticks(self.config.max_ticks)
            .with_livelock_detection(self.config.livelock_detection)
    }

    /// Runs one workload, rendering every tick to `out`
    pub fn run<W: Write, L: Write>(
        &mut self,
        workload: &Workload,
        algorithm: SchedulingAlgorithm,
        out: &mut W,
        log: &mut L,
    ) -> Result<RunOutcome, SimRuntimeError> {
        let mut scheduler = Scheduler::with_config(
            workload.totals,
            workload.tasks.clone(),
            self.scheduler_config(algorithm),
        )?;
        info!(run = %scheduler.run_id(), %algorithm, tasks = workload.tasks.len(), "starting run");

        loop {
            let outcome = scheduler.tick()?;
            self.flush_log(&mut scheduler, log)?;

            match outcome {
                TickOutcome::Advanced(snapshot) => {
                    writeln!(out, "{}", self.renderer.render_tick(&snapshot)?)?;
                }
                terminal => {
                    if let Some(outcome) = terminal.into_run_outcome() {
                        let rendered = self
                            .renderer
                            .render_outcome(&outcome, self.config.show_summary)?;
                        writeln!(out, "{}", rendered)?;
                        out.flush()?;
                        return Ok(outcome);
                    }
                }
            }
        }
    }

    /// Runs the workload under every algorithm and prints a comparison table
    ///
    /// Each run gets its own pool and queues. RR uses `quantum`, then the
    /// workload's quantum, then [`DEFAULT_COMPARE_QUANTUM`].
    pub fn compare<W: Write>(
        &mut self,
        workload: &Workload,
        quantum: Option<u64>,
        out: &mut W,
    ) -> Result<Vec<RunOutcome>, SimRuntimeError> {
        let quantum = quantum
            .or(workload.quantum)
            .unwrap_or(DEFAULT_COMPARE_QUANTUM);

        let mut outcomes = Vec::new();
        for choice in AlgorithmChoice::ALL {
            let algorithm = choice.with_quantum(Some(quantum))?;
            let mut scheduler = Scheduler::with_config(
                workload.totals,
                workload.tasks.clone(),
                self.scheduler_config(algorithm),
            )?;
            let report = scheduler.run_to_completion()?;
            debug!(%algorithm, ticks = report.outcome.summary().total_ticks, "comparison run finished");
            outcomes.push(report.outcome);
        }

        let rows: Vec<ComparisonRow> = outcomes.iter().map(ComparisonRow::from_outcome).collect();
        writeln!(out, "{}", self.renderer.render_comparison(&rows)?)?;
        out.flush()?;
        Ok(outcomes)
    }

    fn flush_log<L: Write>(
        &mut self,
        scheduler: &mut Scheduler,
        log: &mut L,
    ) -> Result<(), SimRuntimeError> {
        if let Some(logger) = self.logger.as_mut() {
            logger.record_events(scheduler.audit_log(), scheduler.tasks());
            for entry in logger.drain() {
                writeln!(log, "{}", entry)?;
            }
        }
        scheduler.clear_audit_log();
        Ok(())
    }
}
