//! Scheduling Test Utilities
//!
//! This crate provides shared helpers and proptest strategies for the
//! cross-crate scheduling tests under `tests/`.
//!
//! ## Test Philosophy
//!
//! - **Invariants every tick**: Conservation and holder checks run after each
//!   tick, not only at the end of a run
//! - **Deterministic replays**: Every workload is plain data; a failing case
//!   reproduces exactly
//! - **Outcomes, not traces**: Properties assert on what a run guarantees,
//!   leaving tick-level traces to the unit tests

use core_types::{ResourceKind, TaskKind};
use proptest::prelude::*;
use resources::ResourceCounts;
use sim_scheduler::{
    RunReport, ScheduleEvent, Scheduler, SchedulerConfig, SchedulingAlgorithm, TaskSpec,
    TickOutcome,
};

/// Builds task specs from `(name, kind, duration)` triples
pub fn specs(defs: &[(&str, TaskKind, u64)]) -> Vec<TaskSpec> {
    defs.iter()
        .map(|(name, kind, duration)| TaskSpec::new(*name, *kind, *duration))
        .collect()
}

/// Creates a run with default limits
pub fn start(totals: ResourceCounts, tasks: Vec<TaskSpec>, algorithm: SchedulingAlgorithm) -> Scheduler {
    Scheduler::with_config(totals, tasks, SchedulerConfig::new(algorithm))
        .unwrap_or_else(|e| panic!("invalid run definition: {}", e))
}

/// Asserts pool conservation and holder consistency for the current state
pub fn assert_pool_consistent(scheduler: &Scheduler) {
    let pool = scheduler.pool();
    let totals = pool.totals();
    let free = pool.free();

    let holders: Vec<_> = pool.holders().collect();
    assert!(holders.len() <= 1, "more than one holder: {:?}", holders);
    match (holders.first(), scheduler.running()) {
        (Some((holder, _)), Some(running)) => assert_eq!(*holder, running),
        (None, None) => {}
        (holder, running) => panic!("holder {:?} but processor {:?}", holder, running),
    }

    for kind in ResourceKind::ALL {
        let held: u64 = holders
            .iter()
            .filter(|(_, task_kind)| task_kind.requires(kind))
            .count() as u64;
        assert!(free.get(kind) <= totals.get(kind), "{} above total", kind);
        assert_eq!(
            free.get(kind) + held,
            totals.get(kind),
            "{} not conserved at tick {}",
            kind,
            scheduler.current_tick()
        );
    }
}

/// Drives a run to its terminal outcome, checking the pool after every tick
pub fn drive_checked(scheduler: &mut Scheduler) -> RunReport {
    let mut snapshots = Vec::new();
    loop {
        let outcome = scheduler
            .tick()
            .unwrap_or_else(|e| panic!("scheduler error: {}", e));
        assert_pool_consistent(scheduler);

        match outcome {
            TickOutcome::Advanced(snapshot) => snapshots.push(snapshot),
            terminal => {
                if let Some(outcome) = terminal.into_run_outcome() {
                    return RunReport { snapshots, outcome };
                }
            }
        }
    }
}

/// Every uninterrupted run segment, as `(task name, ticks, completed)`
///
/// A segment starts at a dispatch and ends at the next preemption or
/// completion of that task. Reads the audit log, so call it before the log is
/// cleared.
pub fn run_segments(scheduler: &Scheduler) -> Vec<(String, u64, bool)> {
    let name = |id: core_types::TaskId| {
        scheduler
            .task(id)
            .map(|t| t.name().to_string())
            .unwrap_or_default()
    };

    let mut segments = Vec::new();
    let mut current: Option<(core_types::TaskId, u64)> = None;
    for event in scheduler.audit_log() {
        match event {
            ScheduleEvent::Dispatched { task_id, .. } => current = Some((*task_id, 0)),
            ScheduleEvent::Executed { task_id, .. } => {
                if let Some((running, ticks)) = current.as_mut() {
                    if *running == *task_id {
                        *ticks += 1;
                    }
                }
            }
            ScheduleEvent::Preempted { task_id, .. } => {
                if let Some((running, ticks)) = current.take() {
                    if running == *task_id {
                        segments.push((name(running), ticks, false));
                    }
                }
            }
            ScheduleEvent::Completed { task_id, .. } => {
                if let Some((running, ticks)) = current.take() {
                    if running == *task_id {
                        segments.push((name(running), ticks, true));
                    }
                }
            }
            _ => {}
        }
    }
    segments
}

/// Sum of all task durations
pub fn total_duration(tasks: &[TaskSpec]) -> u64 {
    tasks.iter().map(|t| t.duration).sum()
}

pub fn arb_task_kind() -> impl Strategy<Value = TaskKind> {
    prop_oneof![Just(TaskKind::X), Just(TaskKind::Y), Just(TaskKind::Z)]
}

/// Up to `max_tasks` tasks named `T0`, `T1`, ... with durations 1..=6
pub fn arb_tasks(max_tasks: usize) -> impl Strategy<Value = Vec<TaskSpec>> {
    proptest::collection::vec((arb_task_kind(), 1u64..=6), 0..=max_tasks).prop_map(|defs| {
        defs.into_iter()
            .enumerate()
            .map(|(i, (kind, duration))| TaskSpec::new(format!("T{}", i), kind, duration))
            .collect()
    })
}

/// Any totals, including pools that can never serve some kinds
pub fn arb_totals() -> impl Strategy<Value = ResourceCounts> {
    (0u64..=3, 0u64..=3, 0u64..=3).prop_map(|(r1, r2, r3)| ResourceCounts::new(r1, r2, r3))
}

/// Totals with at least one unit of every kind
pub fn arb_sufficient_totals() -> impl Strategy<Value = ResourceCounts> {
    (1u64..=3, 1u64..=3, 1u64..=3).prop_map(|(r1, r2, r3)| ResourceCounts::new(r1, r2, r3))
}

pub fn arb_round_robin() -> impl Strategy<Value = SchedulingAlgorithm> {
    (1u64..=4).prop_filter_map("positive quantum", |q| SchedulingAlgorithm::round_robin(q).ok())
}

pub fn arb_algorithm() -> impl Strategy<Value = SchedulingAlgorithm> {
    prop_oneof![
        Just(SchedulingAlgorithm::Sjf),
        Just(SchedulingAlgorithm::Fcfs),
        Just(SchedulingAlgorithm::Hrrn),
        arb_round_robin(),
    ]
}
