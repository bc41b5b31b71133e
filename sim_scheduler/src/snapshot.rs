//! Per-tick views and end-of-run reports
//!
//! These are plain data handed to the host for rendering; nothing here
//! references engine internals.

use core_types::{RunId, TaskId, TaskKind};
use resources::ResourceCounts;
use serde::{Deserialize, Serialize};

/// State of the system at the end of one tick
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TickSnapshot {
    pub tick: u64,
    pub free: ResourceCounts,
    pub ready: Vec<String>,
    pub waiting: Vec<String>,
    /// Processor occupant, `None` when idle
    pub running: Option<String>,
    pub completed: Vec<String>,
}

impl TickSnapshot {
    pub fn is_idle(&self) -> bool {
        self.running.is_none()
    }
}

/// Final statistics for one task
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskStats {
    pub id: TaskId,
    pub name: String,
    pub kind: TaskKind,
    pub total_duration: u64,
    pub execution_time: u64,
    pub waiting_time: u64,
    pub completion_tick: Option<u64>,
    /// Ticks from submission (tick 0) to the end of the completion tick
    pub turnaround: Option<u64>,
}

/// Summary of a run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunSummary {
    pub run_id: RunId,
    pub algorithm: String,
    pub total_ticks: u64,
    pub completion_order: Vec<String>,
    pub tasks: Vec<TaskStats>,
    pub average_waiting: f64,
    pub average_turnaround: f64,
}

impl RunSummary {
    pub fn all_completed(&self) -> bool {
        self.tasks.iter().all(|t| t.completion_tick.is_some())
    }

    pub fn task(&self, name: &str) -> Option<&TaskStats> {
        self.tasks.iter().find(|t| t.name == name)
    }
}

/// Diagnostic state when a run is halted without completing
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HaltReport {
    pub tick: u64,
    pub stalled_ticks: u64,
    pub free: ResourceCounts,
    pub ready: Vec<String>,
    pub waiting: Vec<String>,
    pub running: Option<String>,
    pub summary: RunSummary,
}

/// Result of one call to [`crate::Scheduler::tick`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum TickOutcome {
    /// A tick was executed
    Advanced(TickSnapshot),
    /// Every task has completed; no tick was executed
    Complete(RunSummary),
    /// The run stopped making progress; no tick was executed
    Livelocked(HaltReport),
    /// The configured tick limit was reached; no tick was executed
    TickLimitReached(HaltReport),
}

impl TickOutcome {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, TickOutcome::Advanced(_))
    }

    /// Converts a terminal outcome into a [`RunOutcome`]
    pub fn into_run_outcome(self) -> Option<RunOutcome> {
        match self {
            TickOutcome::Advanced(_) => None,
            TickOutcome::Complete(summary) => Some(RunOutcome::Completed(summary)),
            TickOutcome::Livelocked(report) => Some(RunOutcome::Livelocked(report)),
            TickOutcome::TickLimitReached(report) => Some(RunOutcome::TickLimitReached(report)),
        }
    }
}

/// Terminal outcome of a whole run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum RunOutcome {
    Completed(RunSummary),
    Livelocked(HaltReport),
    TickLimitReached(HaltReport),
}

impl RunOutcome {
    pub fn summary(&self) -> &RunSummary {
        match self {
            RunOutcome::Completed(summary) => summary,
            RunOutcome::Livelocked(report) | RunOutcome::TickLimitReached(report) => {
                &report.summary
            }
        }
    }

    pub fn is_completed(&self) -> bool {
        matches!(self, RunOutcome::Completed(_))
    }
}

/// Full trace of a run driven to a terminal outcome
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunReport {
    pub snapshots: Vec<TickSnapshot>,
    pub outcome: RunOutcome,
}
