//! # SchedSim Host Runtime
//!
//! This crate provides the host side of the scheduling simulator.
//!
//! ## Philosophy
//!
//! - **Host owns I/O**: The scheduler never prints or reads
//! - **Output is snapshot rendering**: One rendered frame per tick
//! - **Input is explicit**: Interactive prompts or a workload file, both
//!   validated before the first tick
//! - **Deterministic mode is first-class**: Same workload, same output
//!
//! ## Responsibilities
//!
//! The host runtime:
//! - Collects a run definition from the console or a workload file
//! - Drives the scheduler tick by tick and renders every snapshot
//! - Writes audit log entries to a separate stream on request
//! - Runs the same workload under every algorithm in comparison mode
//! - Maps outcomes and errors to process exit codes
//!
//! ## Exit codes
//!
//! | Code | Meaning |
//! |---|---|
//! | 0 | every task completed |
//! | 1 | runtime failure (I/O, invariant violation) |
//! | 2 | usage or validation error |
//! | 3 | run halted by livelock detection or the tick limit |

pub mod console;
pub mod runtime;
pub mod workload;

pub use console::{Console, ConsoleError};
pub use runtime::{SimRuntime, SimRuntimeConfig, SimRuntimeError, DEFAULT_COMPARE_QUANTUM};
pub use workload::{Workload, WorkloadError};

use sim_scheduler::RunOutcome;

pub const EXIT_SUCCESS: i32 = 0;
pub const EXIT_FAILURE: i32 = 1;
pub const EXIT_USAGE: i32 = 2;
pub const EXIT_HALTED: i32 = 3;

/// Exit code for a finished run
pub fn outcome_exit_code(outcome: &RunOutcome) -> i32 {
    if outcome.is_completed() {
        EXIT_SUCCESS
    } else {
        EXIT_HALTED
    }
}

/// Exit code for a comparison: success only if every run completed
pub fn comparison_exit_code(outcomes: &[RunOutcome]) -> i32 {
    if outcomes.iter().all(RunOutcome::is_completed) {
        EXIT_SUCCESS
    } else {
        EXIT_HALTED
    }
}
