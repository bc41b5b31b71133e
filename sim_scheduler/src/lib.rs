//! # Simulated Scheduler
//!
//! A deterministic, tick-driven single-processor scheduler operating over a
//! shared pool of renewable resources.
//!
//! ## Philosophy
//!
//! - **Determinism first**: Same tasks + same totals + same policy => same trace.
//! - **Policy is pluggable**: Ordering lives in [`SelectionPolicy`], selected once
//!   at run configuration time. The engine never branches on the algorithm.
//! - **No hidden progress**: Every tick is explicit, every decision is audited.
//! - **Correctness over throughput**: Resource conservation is checked after
//!   every tick and a violation aborts the run with full diagnostics.
//!
//! ## Tick Order
//!
//! Each call to [`Scheduler::tick`] performs, in order:
//! 1. Processor-free branch: select a candidate and try to acquire its resources
//! 2. Processor-busy branch: run the occupant for one tick, complete or preempt it
//! 3. Waiting sweep: retry every waiting task once, first success claims the processor
//!
//! ## Example
//!
//! ```
//! use core_types::TaskKind;
//! use resources::ResourceCounts;
//! use sim_scheduler::{AlgorithmChoice, Scheduler, TaskSpec};
//!
//! let tasks = vec![
//!     TaskSpec::new("A", TaskKind::X, 2),
//!     TaskSpec::new("B", TaskKind::Y, 1),
//! ];
//! let mut run = Scheduler::initialize_run(
//!     ResourceCounts::new(1, 1, 1),
//!     tasks,
//!     AlgorithmChoice::Fcfs,
//!     None,
//! )
//! .unwrap();
//!
//! let report = run.run_to_completion().unwrap();
//! assert_eq!(report.snapshots.len(), 3);
//! ```

pub mod audit;
pub mod policy;
pub mod queue;
pub mod scheduler;
pub mod snapshot;
pub mod task;
pub mod validation;

pub use audit::{DispatchSource, PreemptionReason, ScheduleEvent};
pub use policy::{
    AlgorithmChoice, Fcfs, Hrrn, ResortSchedule, RoundRobin, SchedulingAlgorithm,
    SelectionPolicy, Sjf,
};
pub use queue::TaskQueue;
pub use scheduler::{
    InvariantReport, Scheduler, SchedulerConfig, SchedulerError, DEFAULT_MAX_TICKS,
};
pub use snapshot::{HaltReport, RunOutcome, RunReport, RunSummary, TaskStats, TickOutcome, TickSnapshot};
pub use task::{ResponseRatio, Task, TaskSpec, TaskStatus};
pub use validation::{parse_count, parse_positive, parse_resource_totals, ValidationError};
