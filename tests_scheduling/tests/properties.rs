//! Scheduling Property Tests
//!
//! These tests check guarantees that hold for every workload, not just the
//! hand-traced scenarios:
//! - Resource conservation after every tick
//! - Work conservation and completion exactly once
//! - Termination in exactly the total duration when every kind is servable
//! - Round-robin quantum bound
//! - Waiting time accounting
//! - Per-algorithm completion order
//! - Completion versus livelock, decided by the totals alone

use proptest::prelude::*;
use resources::ResourceCounts;
use sim_scheduler::{RunOutcome, SchedulingAlgorithm, TaskSpec, TaskStatus, TickOutcome};
use std::collections::HashSet;
use tests_scheduling::{
    arb_algorithm, arb_round_robin, arb_sufficient_totals, arb_tasks, arb_totals, drive_checked,
    run_segments, start, total_duration,
};

fn all_servable(totals: ResourceCounts, tasks: &[TaskSpec]) -> bool {
    tasks.iter().all(|t| totals.satisfies(t.kind))
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(128))]

    #[test]
    fn prop_pool_conserved_every_tick(
        totals in arb_totals(),
        tasks in arb_tasks(6),
        algorithm in arb_algorithm(),
    ) {
        let mut scheduler = start(totals, tasks, algorithm);
        // drive_checked asserts conservation after each tick
        let report = drive_checked(&mut scheduler);
        prop_assert!(scheduler.is_finished());
        prop_assert!(report.outcome.summary().total_ticks <= 1 + 6 * 6 + 6 * 3);
    }

    #[test]
    fn prop_every_task_completes_once_with_servable_totals(
        totals in arb_sufficient_totals(),
        tasks in arb_tasks(6),
        algorithm in arb_algorithm(),
    ) {
        let names: Vec<String> = tasks.iter().map(|t| t.name.clone()).collect();
        let mut scheduler = start(totals, tasks, algorithm);
        let report = drive_checked(&mut scheduler);

        let summary = match &report.outcome {
            RunOutcome::Completed(summary) => summary,
            other => return Err(TestCaseError::fail(format!("not completed: {:?}", other))),
        };

        prop_assert_eq!(summary.completion_order.len(), names.len());
        let unique: HashSet<&String> = summary.completion_order.iter().collect();
        prop_assert_eq!(unique.len(), names.len());

        for stats in &summary.tasks {
            prop_assert_eq!(stats.execution_time, stats.total_duration);
            prop_assert!(stats.completion_tick.is_some());
        }
        for task in scheduler.tasks() {
            prop_assert_eq!(task.status(), TaskStatus::Completed);
            prop_assert_eq!(task.remaining(), 0);
        }
    }

    #[test]
    fn prop_processor_never_idles_with_servable_totals(
        totals in arb_sufficient_totals(),
        tasks in arb_tasks(6),
        algorithm in arb_algorithm(),
    ) {
        let expected = total_duration(&tasks);
        let mut scheduler = start(totals, tasks, algorithm);
        let report = drive_checked(&mut scheduler);

        prop_assert_eq!(report.outcome.summary().total_ticks, expected);
        prop_assert_eq!(report.snapshots.len() as u64, expected);
        prop_assert!(report.snapshots.iter().all(|s| s.waiting.is_empty()));
    }

    #[test]
    fn prop_round_robin_segments_respect_quantum(
        totals in arb_totals(),
        tasks in arb_tasks(6),
        algorithm in arb_round_robin(),
    ) {
        let quantum = algorithm.quantum().map(|q| q.get()).unwrap_or(0);
        let mut scheduler = start(totals, tasks, algorithm);
        drive_checked(&mut scheduler);

        for (name, ticks, completed) in run_segments(&scheduler) {
            prop_assert!(ticks >= 1, "{} ran an empty segment", name);
            prop_assert!(ticks <= quantum, "{} ran {} ticks past q={}", name, ticks, quantum);
            if !completed {
                prop_assert_eq!(ticks, quantum, "{} preempted early", name);
            }
        }
    }

    #[test]
    fn prop_waiting_time_accounting(
        totals in arb_totals(),
        tasks in arb_tasks(6),
        algorithm in arb_algorithm(),
    ) {
        let mut scheduler = start(totals, tasks, algorithm);
        let mut previous: Vec<(u64, u64)> = scheduler
            .tasks()
            .iter()
            .map(|t| (t.waiting_time(), t.execution_time()))
            .collect();

        loop {
            match scheduler.tick() {
                Ok(TickOutcome::Advanced(_)) => {}
                Ok(_) => break,
                Err(e) => return Err(TestCaseError::fail(e.to_string())),
            }

            let mut executed = 0;
            for (task, (waited_before, ran_before)) in scheduler.tasks().iter().zip(&previous) {
                prop_assert!(task.waiting_time() >= *waited_before);
                prop_assert!(task.waiting_time() <= waited_before + 1);
                let ran = task.execution_time() - ran_before;
                executed += ran;

                let queued = matches!(task.status(), TaskStatus::Ready | TaskStatus::Waiting);
                if ran == 0 && queued {
                    prop_assert_eq!(task.waiting_time(), waited_before + 1, "{} missed a wait tick", task.name());
                } else {
                    prop_assert_eq!(task.waiting_time(), *waited_before, "{} accrued wait", task.name());
                }
            }
            prop_assert!(executed <= 1, "{} units executed in one tick", executed);

            previous = scheduler
                .tasks()
                .iter()
                .map(|t| (t.waiting_time(), t.execution_time()))
                .collect();
        }
    }

    #[test]
    fn prop_fcfs_completes_in_arrival_order(
        totals in arb_sufficient_totals(),
        tasks in arb_tasks(6),
    ) {
        let names: Vec<String> = tasks.iter().map(|t| t.name.clone()).collect();
        let mut scheduler = start(totals, tasks, SchedulingAlgorithm::Fcfs);
        let report = drive_checked(&mut scheduler);

        prop_assert_eq!(&report.outcome.summary().completion_order, &names);
    }

    #[test]
    fn prop_sjf_completes_shortest_first(
        totals in arb_sufficient_totals(),
        tasks in arb_tasks(6),
    ) {
        let mut scheduler = start(totals, tasks, SchedulingAlgorithm::Sjf);
        let report = drive_checked(&mut scheduler);
        let summary = report.outcome.summary();

        let durations: Vec<u64> = summary
            .completion_order
            .iter()
            .filter_map(|name| summary.task(name).map(|t| t.total_duration))
            .collect();
        prop_assert!(durations.windows(2).all(|w| w[0] <= w[1]), "order {:?}", durations);
    }

    #[test]
    fn prop_runs_are_deterministic(
        totals in arb_totals(),
        tasks in arb_tasks(6),
        algorithm in arb_algorithm(),
    ) {
        let first = start(totals, tasks.clone(), algorithm).run_to_completion();
        let second = start(totals, tasks, algorithm).run_to_completion();
        let (first, second) = match (first, second) {
            (Ok(a), Ok(b)) => (a, b),
            (a, b) => return Err(TestCaseError::fail(format!("{:?} / {:?}", a, b))),
        };

        prop_assert_eq!(&first.snapshots, &second.snapshots);
        let (a, b) = (first.outcome.summary(), second.outcome.summary());
        prop_assert_eq!(&a.completion_order, &b.completion_order);
        prop_assert_eq!(&a.tasks, &b.tasks);
        prop_assert_eq!(a.total_ticks, b.total_ticks);
    }

    #[test]
    fn prop_outcome_decided_by_totals(
        totals in arb_totals(),
        tasks in arb_tasks(6),
        algorithm in arb_algorithm(),
    ) {
        let servable = all_servable(totals, &tasks);
        let expected_done: HashSet<String> = tasks
            .iter()
            .filter(|t| totals.satisfies(t.kind))
            .map(|t| t.name.clone())
            .collect();

        let mut scheduler = start(totals, tasks, algorithm);
        let report = drive_checked(&mut scheduler);

        match &report.outcome {
            RunOutcome::Completed(_) => prop_assert!(servable),
            RunOutcome::Livelocked(halt) => {
                prop_assert!(!servable);
                prop_assert!(halt.running.is_none());
                prop_assert!(halt.ready.is_empty());
                for name in &halt.waiting {
                    prop_assert!(!expected_done.contains(name), "{} was servable", name);
                }
            }
            RunOutcome::TickLimitReached(_) => {
                return Err(TestCaseError::fail("tick limit reached"));
            }
        }

        let done: HashSet<String> = report.outcome.summary().completion_order.iter().cloned().collect();
        prop_assert_eq!(done, expected_done);
    }
}
