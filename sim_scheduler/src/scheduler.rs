//! Tick-driven scheduling engine
//!
//! The [`Scheduler`] exclusively owns the task table, the ready and waiting
//! queues, the processor slot and the resource pool for the duration of a run.
//! Queues hold task ids; the tasks themselves stay in the table.
//!
//! ## Tick order
//!
//! 1. **Processor free**: ask the policy for a candidate (ready queue first,
//!    then the head of the waiting queue; HRRN ranks both queues together) and
//!    try to acquire its two resource units. On failure the candidate goes to
//!    the back of the waiting queue and the processor stays idle.
//! 2. **Processor busy**: run the occupant for one tick. At zero remaining it
//!    releases its units and completes. Under RR, an occupant whose execution
//!    time reaches a multiple of the quantum releases its units and goes to the
//!    back of the ready queue.
//! 3. **Waiting sweep**: every waiting task retries once, in FIFO order. The
//!    first success claims the processor (it runs from the next tick); later
//!    tasks in the same sweep stay queued.
//!
//! After the sweep every queued task that did not run this tick accrues one
//! tick of waiting time, and the resource pool is audited. Resources are only ever held by the processor
//! occupant.
//!
//! ## Termination
//!
//! - All queues empty and the processor idle: [`TickOutcome::Complete`]
//! - More consecutive no-progress ticks than there are live tasks:
//!   [`TickOutcome::Livelocked`]
//! - Configured tick limit reached: [`TickOutcome::TickLimitReached`]

use crate::audit::{DispatchSource, PreemptionReason, ScheduleEvent};
use crate::policy::{AlgorithmChoice, ResortSchedule, SchedulingAlgorithm, SelectionPolicy};
use crate::queue::{rank_feasible_first, TaskQueue};
use crate::snapshot::{
    HaltReport, RunReport, RunSummary, TaskStats, TickOutcome, TickSnapshot,
};
use crate::task::{Task, TaskSpec, TaskStatus};
use crate::validation::ValidationError;
use core_types::{ResourceKind, RunId, TaskId};
use resources::{ResourceCounts, ResourcePool};
use std::cmp::Ordering;
use std::fmt;
use thiserror::Error;
use tracing::{debug, error, info, warn};

/// Default upper bound on ticks per run
pub const DEFAULT_MAX_TICKS: u64 = 1_000_000;

/// Scheduler configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchedulerConfig {
    /// Selection policy and, for RR, its quantum
    pub algorithm: SchedulingAlgorithm,
    /// Hard limit on executed ticks (`None` = unbounded)
    pub max_ticks: Option<u64>,
    /// Whether to stop runs that make no progress
    pub livelock_detection: bool,
}

impl SchedulerConfig {
    pub fn new(algorithm: SchedulingAlgorithm) -> Self {
        Self {
            algorithm,
            ..Self::default()
        }
    }

    /// Builder: sets the tick limit
    pub fn with_max_ticks(mut self, max_ticks: Option<u64>) -> Self {
        self.max_ticks = max_ticks;
        self
    }

    /// Builder: enables or disables livelock detection
    pub fn with_livelock_detection(mut self, enabled: bool) -> Self {
        self.livelock_detection = enabled;
        self
    }
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            algorithm: SchedulingAlgorithm::Fcfs,
            max_ticks: Some(DEFAULT_MAX_TICKS),
            livelock_detection: true,
        }
    }
}

/// Diagnostic state captured when an internal invariant breaks
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvariantReport {
    pub tick: u64,
    pub detail: String,
    pub free: ResourceCounts,
    pub ready: Vec<String>,
    pub waiting: Vec<String>,
    pub running: Option<String>,
}

impl fmt::Display for InvariantReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "tick {}: {} [pool {}; ready {:?}; waiting {:?}; processor {}]",
            self.tick,
            self.detail,
            self.free,
            self.ready,
            self.waiting,
            self.running.as_deref().unwrap_or("Idle")
        )
    }
}

/// Scheduler error types
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SchedulerError {
    #[error("Invariant violation at {0}")]
    InvariantViolation(Box<InvariantReport>),

    #[error("Run already finished")]
    RunFinished,
}

/// Single-processor scheduler over a shared resource pool
///
/// One `Scheduler` is one run. Independent runs share nothing.
#[derive(Debug)]
pub struct Scheduler {
    run_id: RunId,
    config: SchedulerConfig,
    policy: Box<dyn SelectionPolicy>,
    /// Indexed by arrival index
    tasks: Vec<Task>,
    ready: TaskQueue,
    waiting: TaskQueue,
    processor: Option<TaskId>,
    pool: ResourcePool,
    current_tick: u64,
    stalled_ticks: u64,
    completion_order: Vec<TaskId>,
    finished: bool,
    audit_log: Vec<ScheduleEvent>,
}

impl Scheduler {
    /// Validates a run definition and prepares it for the first tick
    pub fn initialize_run(
        totals: ResourceCounts,
        tasks: Vec<TaskSpec>,
        algorithm: AlgorithmChoice,
        quantum: Option<u64>,
    ) -> Result<Self, ValidationError> {
        let algorithm = algorithm.with_quantum(quantum)?;
        Self::with_config(totals, tasks, SchedulerConfig::new(algorithm))
    }

    /// Creates a run with a custom configuration
    pub fn with_config(
        totals: ResourceCounts,
        specs: Vec<TaskSpec>,
        config: SchedulerConfig,
    ) -> Result<Self, ValidationError> {
        for (index, spec) in specs.iter().enumerate() {
            spec.validate(index)?;
        }

        let tasks: Vec<Task> = specs
            .into_iter()
            .enumerate()
            .map(|(index, spec)| Task::from_spec(TaskId::new(index as u32), spec))
            .collect();

        let policy = config.algorithm.policy();
        let mut ready: TaskQueue = tasks.iter().map(Task::id).collect();
        if policy.resort() != ResortSchedule::Never {
            ready.sort_by_policy(policy.as_ref(), &tasks);
        }

        let run_id = RunId::new();
        debug!(
            run = %run_id,
            algorithm = %config.algorithm,
            tasks = tasks.len(),
            totals = %totals,
            "run initialized"
        );

        Ok(Self {
            run_id,
            config,
            policy,
            tasks,
            ready,
            waiting: TaskQueue::new(),
            processor: None,
            pool: ResourcePool::new(totals),
            current_tick: 0,
            stalled_ticks: 0,
            completion_order: Vec::new(),
            finished: false,
            audit_log: Vec::new(),
        })
    }

    /// Executes one tick, or reports that the run has reached a terminal state
    ///
    /// Returns [`SchedulerError::RunFinished`] once a terminal outcome has been
    /// returned.
    pub fn tick(&mut self) -> Result<TickOutcome, SchedulerError> {
        if self.finished {
            return Err(SchedulerError::RunFinished);
        }

        if self.is_drained() {
            self.finished = true;
            info!(run = %self.run_id, ticks = self.current_tick, "run complete");
            return Ok(TickOutcome::Complete(self.summary()));
        }

        if self.config.livelock_detection && self.stalled_ticks > self.active_count() as u64 {
            self.finished = true;
            self.audit_log.push(ScheduleEvent::LivelockDetected {
                stalled_ticks: self.stalled_ticks,
                timestamp_ticks: self.current_tick,
            });
            warn!(
                run = %self.run_id,
                tick = self.current_tick,
                stalled = self.stalled_ticks,
                "livelock detected"
            );
            return Ok(TickOutcome::Livelocked(self.halt_report()));
        }

        if let Some(limit) = self.config.max_ticks {
            if self.current_tick >= limit {
                self.finished = true;
                warn!(run = %self.run_id, limit, "tick limit reached");
                return Ok(TickOutcome::TickLimitReached(self.halt_report()));
            }
        }

        let mut progressed = self.dispatch_if_idle()?;
        let executing = self.processor;
        progressed |= self.advance_running()?;
        progressed |= self.sweep_waiting()?;
        self.accrue_waiting(executing);
        self.check_invariants()?;

        let snapshot = self.snapshot();
        self.current_tick += 1;
        self.stalled_ticks = if progressed { 0 } else { self.stalled_ticks + 1 };

        Ok(TickOutcome::Advanced(snapshot))
    }

    /// Drives the run until a terminal outcome, collecting every snapshot
    pub fn run_to_completion(&mut self) -> Result<RunReport, SchedulerError> {
        let mut snapshots = Vec::new();
        loop {
            match self.tick()? {
                TickOutcome::Advanced(snapshot) => snapshots.push(snapshot),
                terminal => {
                    if let Some(outcome) = terminal.into_run_outcome() {
                        return Ok(RunReport { snapshots, outcome });
                    }
                }
            }
        }
    }

    pub fn run_id(&self) -> RunId {
        self.run_id
    }

    pub fn config(&self) -> &SchedulerConfig {
        &self.config
    }

    pub fn algorithm(&self) -> SchedulingAlgorithm {
        self.config.algorithm
    }

    /// Number of ticks executed so far
    pub fn current_tick(&self) -> u64 {
        self.current_tick
    }

    /// Returns the processor occupant
    pub fn running(&self) -> Option<TaskId> {
        self.processor
    }

    pub fn ready_queue(&self) -> &TaskQueue {
        &self.ready
    }

    pub fn waiting_queue(&self) -> &TaskQueue {
        &self.waiting
    }

    pub fn pool(&self) -> &ResourcePool {
        &self.pool
    }

    /// All tasks, in arrival order
    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    pub fn task(&self, task_id: TaskId) -> Option<&Task> {
        self.tasks.get(task_id.index() as usize)
    }

    pub fn task_by_name(&self, name: &str) -> Option<&Task> {
        self.tasks.iter().find(|t| t.name() == name)
    }

    /// Number of tasks not yet completed
    pub fn active_count(&self) -> usize {
        self.tasks.iter().filter(|t| !t.is_completed()).count()
    }

    /// True when both queues are empty and the processor is idle
    pub fn is_drained(&self) -> bool {
        self.ready.is_empty() && self.waiting.is_empty() && self.processor.is_none()
    }

    /// True once a terminal outcome has been returned
    pub fn is_finished(&self) -> bool {
        self.finished
    }

    /// Returns a reference to the audit log
    ///
    /// Used in tests and by the host logger to observe scheduling decisions.
    pub fn audit_log(&self) -> &[ScheduleEvent] {
        &self.audit_log
    }

    /// Clears the audit log
    pub fn clear_audit_log(&mut self) {
        self.audit_log.clear();
    }

    /// Summary of the run so far
    pub fn summary(&self) -> RunSummary {
        let tasks: Vec<TaskStats> = self
            .tasks
            .iter()
            .map(|t| TaskStats {
                id: t.id(),
                name: t.name().to_string(),
                kind: t.kind(),
                total_duration: t.total_duration(),
                execution_time: t.execution_time(),
                waiting_time: t.waiting_time(),
                completion_tick: t.completion_tick(),
                turnaround: t.completion_tick().map(|tick| tick + 1),
            })
            .collect();

        let average_waiting = if tasks.is_empty() {
            0.0
        } else {
            tasks.iter().map(|t| t.waiting_time).sum::<u64>() as f64 / tasks.len() as f64
        };

        let turnarounds: Vec<u64> = tasks.iter().filter_map(|t| t.turnaround).collect();
        let average_turnaround = if turnarounds.is_empty() {
            0.0
        } else {
            turnarounds.iter().sum::<u64>() as f64 / turnarounds.len() as f64
        };

        RunSummary {
            run_id: self.run_id,
            algorithm: self.config.algorithm.to_string(),
            total_ticks: self.current_tick,
            completion_order: self
                .completion_order
                .iter()
                .map(|id| self.task_ref(*id).name().to_string())
                .collect(),
            tasks,
            average_waiting,
            average_turnaround,
        }
    }

    fn task_ref(&self, task_id: TaskId) -> &Task {
        &self.tasks[task_id.index() as usize]
    }

    fn task_mut(&mut self, task_id: TaskId) -> &mut Task {
        &mut self.tasks[task_id.index() as usize]
    }

    fn dispatch_if_idle(&mut self) -> Result<bool, SchedulerError> {
        if self.processor.is_some() {
            return Ok(false);
        }
        match self.select_candidate() {
            Some((task_id, source)) => self.try_dispatch(task_id, source),
            None => Ok(false),
        }
    }

    /// Removes and returns the policy's next candidate
    fn select_candidate(&mut self) -> Option<(TaskId, DispatchSource)> {
        if self.policy.resort() == ResortSchedule::EveryTick {
            self.ready.sort_by_policy(self.policy.as_ref(), &self.tasks);
        }

        if !self.policy.includes_waiting() {
            if let Some(task_id) = self.ready.pop_front() {
                return Some((task_id, DispatchSource::ReadyQueue));
            }
            return self
                .waiting
                .pop_front()
                .map(|task_id| (task_id, DispatchSource::WaitingQueue));
        }

        // Tasks the pool cannot serve right now never outrank ones it can
        let pool = &self.pool;
        let feasible = |task: &Task| pool.can_satisfy(task.kind());
        let policy = self.policy.as_ref();

        let best_ready = self.ready.best_by_policy(policy, &self.tasks, feasible);
        let best_waiting = self.waiting.best_by_policy(policy, &self.tasks, feasible);
        let (task_id, source) = match (best_ready, best_waiting) {
            (Some(r), Some(w)) => {
                let order =
                    rank_feasible_first(policy, self.task_ref(w), self.task_ref(r), &feasible);
                if order == Ordering::Less {
                    (w, DispatchSource::WaitingQueue)
                } else {
                    (r, DispatchSource::ReadyQueue)
                }
            }
            (Some(r), None) => (r, DispatchSource::ReadyQueue),
            (None, Some(w)) => (w, DispatchSource::WaitingQueue),
            (None, None) => return None,
        };

        match source {
            DispatchSource::ReadyQueue => self.ready.remove(task_id),
            _ => self.waiting.remove(task_id),
        };
        Some((task_id, source))
    }

    /// Returns true if the candidate's status changed
    fn try_dispatch(
        &mut self,
        task_id: TaskId,
        source: DispatchSource,
    ) -> Result<bool, SchedulerError> {
        let kind = self.task_ref(task_id).kind();
        if self.pool.can_satisfy(kind) {
            self.acquire(task_id, source)?;
            return Ok(true);
        }

        let free = self.pool.free();
        let missing: Vec<ResourceKind> = kind
            .demands()
            .into_iter()
            .filter(|r| free.get(*r) == 0)
            .collect();
        let previous = self.task_ref(task_id).status();
        self.task_mut(task_id).set_status(TaskStatus::Waiting);
        self.waiting.push_back(task_id);

        debug!(task = %task_id, tick = self.current_tick, ?missing, "acquisition denied");
        self.audit_log.push(ScheduleEvent::AcquisitionDenied {
            task_id,
            missing,
            timestamp_ticks: self.current_tick,
        });

        Ok(previous != TaskStatus::Waiting)
    }

    fn acquire(&mut self, task_id: TaskId, source: DispatchSource) -> Result<(), SchedulerError> {
        let kind = self.task_ref(task_id).kind();
        self.pool
            .allocate(task_id, kind)
            .map_err(|err| self.violation(err.to_string()))?;
        self.task_mut(task_id).set_status(TaskStatus::Running);
        self.processor = Some(task_id);

        debug!(task = %task_id, tick = self.current_tick, ?source, "dispatched");
        self.audit_log.push(ScheduleEvent::Dispatched {
            task_id,
            source,
            timestamp_ticks: self.current_tick,
        });
        Ok(())
    }

    fn release(&mut self, task_id: TaskId) -> Result<(), SchedulerError> {
        self.pool
            .release(task_id)
            .map(|_| ())
            .map_err(|err| self.violation(err.to_string()))
    }

    /// Runs the occupant for one tick; returns true if a task ran
    fn advance_running(&mut self) -> Result<bool, SchedulerError> {
        let Some(task_id) = self.processor else {
            return Ok(false);
        };
        let tick = self.current_tick;

        let task = self.task_mut(task_id);
        let remaining = task.execute_tick();
        let executed = task.execution_time();
        self.audit_log.push(ScheduleEvent::Executed {
            task_id,
            remaining,
            timestamp_ticks: tick,
        });

        if remaining == 0 {
            self.release(task_id)?;
            self.processor = None;
            self.completion_order.push(task_id);

            let task = self.task_mut(task_id);
            task.complete(tick);
            let execution_time = task.execution_time();
            let waiting_time = task.waiting_time();

            info!(task = %task_id, tick, execution_time, waiting_time, "task completed");
            self.audit_log.push(ScheduleEvent::Completed {
                task_id,
                execution_time,
                waiting_time,
                timestamp_ticks: tick,
            });
        } else if let Some(quantum) = self.policy.quantum() {
            if executed % quantum.get() == 0 {
                self.release(task_id)?;
                self.processor = None;
                self.task_mut(task_id).set_status(TaskStatus::Ready);
                self.ready.push_back(task_id);

                debug!(task = %task_id, tick, "quantum expired");
                self.audit_log.push(ScheduleEvent::Preempted {
                    task_id,
                    reason: PreemptionReason::QuantumExpired,
                    timestamp_ticks: tick,
                });
            }
        }

        Ok(true)
    }

    /// Retries every waiting task once; returns true if one was dispatched
    fn sweep_waiting(&mut self) -> Result<bool, SchedulerError> {
        let mut dispatched = false;
        for _ in 0..self.waiting.len() {
            let Some(task_id) = self.waiting.pop_front() else {
                break;
            };
            let kind = self.task_ref(task_id).kind();
            if self.processor.is_none() && self.pool.can_satisfy(kind) {
                self.acquire(task_id, DispatchSource::WaitingSweep)?;
                dispatched = true;
            } else {
                self.waiting.push_back(task_id);
                self.audit_log.push(ScheduleEvent::WaitRetryFailed {
                    task_id,
                    timestamp_ticks: self.current_tick,
                });
            }
        }
        Ok(dispatched)
    }

    /// A task preempted this tick is back in the ready queue but still ran
    fn accrue_waiting(&mut self, executed: Option<TaskId>) {
        for task_id in self.ready.iter().chain(self.waiting.iter()) {
            if Some(task_id) != executed {
                self.tasks[task_id.index() as usize].accrue_wait();
            }
        }
    }

    fn check_invariants(&self) -> Result<(), SchedulerError> {
        self.pool
            .audit()
            .map_err(|err| self.violation(err.to_string()))?;

        for (holder, _) in self.pool.holders() {
            if self.processor != Some(holder) {
                return Err(self.violation(format!("{} holds resources but is not running", holder)));
            }
        }

        if let Some(task_id) = self.processor {
            if !self.pool.is_held_by(task_id) {
                return Err(self.violation(format!("{} is running without resources", task_id)));
            }
        }

        Ok(())
    }

    fn violation(&self, detail: String) -> SchedulerError {
        let report = InvariantReport {
            tick: self.current_tick,
            detail,
            free: self.pool.free(),
            ready: self.names(&self.ready),
            waiting: self.names(&self.waiting),
            running: self.running_name(),
        };
        error!(run = %self.run_id, %report, "invariant violation");
        SchedulerError::InvariantViolation(Box::new(report))
    }

    fn names(&self, queue: &TaskQueue) -> Vec<String> {
        queue
            .iter()
            .map(|id| self.task_ref(id).name().to_string())
            .collect()
    }

    fn running_name(&self) -> Option<String> {
        self.processor
            .map(|id| self.task_ref(id).name().to_string())
    }

    fn snapshot(&self) -> TickSnapshot {
        TickSnapshot {
            tick: self.current_tick,
            free: self.pool.free(),
            ready: self.names(&self.ready),
            waiting: self.names(&self.waiting),
            running: self.running_name(),
            completed: self
                .completion_order
                .iter()
                .map(|id| self.task_ref(*id).name().to_string())
                .collect(),
        }
    }

    fn halt_report(&self) -> HaltReport {
        HaltReport {
            tick: self.current_tick,
            stalled_ticks: self.stalled_ticks,
            free: self.pool.free(),
            ready: self.names(&self.ready),
            waiting: self.names(&self.waiting),
            running: self.running_name(),
            summary: self.summary(),
        }
    }
}
