//! Scheduling audit trail
//!
//! Every decision the engine makes is recorded as a [`ScheduleEvent`]. The log
//! is deterministic and serialisable; it is what tests and the host logger
//! consume, and it never feeds back into scheduling.

use core_types::{ResourceKind, TaskId};
use serde::{Deserialize, Serialize};

/// Where a dispatched task came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DispatchSource {
    /// Selected from the ready queue while the processor was free
    ReadyQueue,
    /// Selected from the waiting queue while the processor was free
    WaitingQueue,
    /// Claimed the processor during the waiting-queue sweep
    WaitingSweep,
}

/// Reason for preemption
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PreemptionReason {
    /// Round-robin time quantum expired
    QuantumExpired,
}

/// Scheduling event for audit trail
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ScheduleEvent {
    /// Task acquired its resources and took the processor
    Dispatched {
        task_id: TaskId,
        source: DispatchSource,
        timestamp_ticks: u64,
    },
    /// Task was selected but its resources were not available
    AcquisitionDenied {
        task_id: TaskId,
        missing: Vec<ResourceKind>,
        timestamp_ticks: u64,
    },
    /// Waiting task retried during the sweep and stayed queued
    WaitRetryFailed { task_id: TaskId, timestamp_ticks: u64 },
    /// Task ran for one tick
    Executed {
        task_id: TaskId,
        remaining: u64,
        timestamp_ticks: u64,
    },
    /// Task was preempted and requeued
    Preempted {
        task_id: TaskId,
        reason: PreemptionReason,
        timestamp_ticks: u64,
    },
    /// Task completed and released its resources
    Completed {
        task_id: TaskId,
        execution_time: u64,
        waiting_time: u64,
        timestamp_ticks: u64,
    },
    /// No progress for longer than a full cycle through the live tasks
    LivelockDetected {
        stalled_ticks: u64,
        timestamp_ticks: u64,
    },
}

impl ScheduleEvent {
    /// Returns the tick the event happened in
    pub fn timestamp_ticks(&self) -> u64 {
        match self {
            ScheduleEvent::Dispatched {
                timestamp_ticks, ..
            }
            | ScheduleEvent::AcquisitionDenied {
                timestamp_ticks, ..
            }
            | ScheduleEvent::WaitRetryFailed {
                timestamp_ticks, ..
            }
            | ScheduleEvent::Executed {
                timestamp_ticks, ..
            }
            | ScheduleEvent::Preempted {
                timestamp_ticks, ..
            }
            | ScheduleEvent::Completed {
                timestamp_ticks, ..
            }
            | ScheduleEvent::LivelockDetected {
                timestamp_ticks, ..
            } => *timestamp_ticks,
        }
    }

    /// Returns the task the event concerns, if any
    pub fn task_id(&self) -> Option<TaskId> {
        match self {
            ScheduleEvent::Dispatched { task_id, .. }
            | ScheduleEvent::AcquisitionDenied { task_id, .. }
            | ScheduleEvent::WaitRetryFailed { task_id, .. }
            | ScheduleEvent::Executed { task_id, .. }
            | ScheduleEvent::Preempted { task_id, .. }
            | ScheduleEvent::Completed { task_id, .. } => Some(*task_id),
            ScheduleEvent::LivelockDetected { .. } => None,
        }
    }
}
