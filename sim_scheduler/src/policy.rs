//! Selection policies
//!
//! A [`SelectionPolicy`] decides which queued task the processor should try
//! next. Each policy is an ordering over tasks plus a schedule saying when the
//! ready queue must be re-sorted with that ordering.
//!
//! | Policy | Ordering                                  | Re-sorted     |
//! |--------|-------------------------------------------|---------------|
//! | FCFS   | arrival id ascending                      | never         |
//! | SJF    | total duration ascending, then arrival    | once at start |
//! | RR     | arrival; preempted tasks go to the back   | never         |
//! | HRRN   | response ratio descending, then arrival   | every tick    |

use crate::task::Task;
use crate::validation::{parse_positive, ValidationError};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use std::num::NonZeroU64;
use std::str::FromStr;

/// When the ready queue is re-sorted with the policy's ordering
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ResortSchedule {
    /// Queue order is arrival/requeue order
    Never,
    /// Sorted once before the first tick
    OnceAtStart,
    /// Sorted before every selection
    EveryTick,
}

/// Ordering strategy used by the scheduler when the processor is free
pub trait SelectionPolicy: fmt::Debug + Send + Sync {
    /// Short display name
    fn name(&self) -> &'static str;

    /// Orders two candidates; `Less` means `a` should run before `b`
    fn compare(&self, a: &Task, b: &Task) -> Ordering;

    /// When the ready queue has to be re-sorted
    fn resort(&self) -> ResortSchedule;

    /// Whether waiting tasks compete with ready tasks at selection time
    fn includes_waiting(&self) -> bool {
        false
    }

    /// Preemption quantum, if the policy preempts
    fn quantum(&self) -> Option<NonZeroU64> {
        None
    }
}

/// First-Come-First-Served
#[derive(Debug, Clone, Copy, Default)]
pub struct Fcfs;

impl SelectionPolicy for Fcfs {
    fn name(&self) -> &'static str {
        "FCFS"
    }

    fn compare(&self, a: &Task, b: &Task) -> Ordering {
        a.id().cmp(&b.id())
    }

    fn resort(&self) -> ResortSchedule {
        ResortSchedule::Never
    }
}

/// Shortest-Job-First (non-preemptive)
///
/// Orders by the immutable total duration, so the order fixed before the run
/// never needs recomputing.
#[derive(Debug, Clone, Copy, Default)]
pub struct Sjf;

impl SelectionPolicy for Sjf {
    fn name(&self) -> &'static str {
        "SJF"
    }

    fn compare(&self, a: &Task, b: &Task) -> Ordering {
        a.total_duration()
            .cmp(&b.total_duration())
            .then_with(|| a.id().cmp(&b.id()))
    }

    fn resort(&self) -> ResortSchedule {
        ResortSchedule::OnceAtStart
    }
}

/// Round-Robin with a fixed quantum
#[derive(Debug, Clone, Copy)]
pub struct RoundRobin {
    quantum: NonZeroU64,
}

impl RoundRobin {
    pub fn new(quantum: NonZeroU64) -> Self {
        Self { quantum }
    }
}

impl SelectionPolicy for RoundRobin {
    fn name(&self) -> &'static str {
        "RR"
    }

    fn compare(&self, a: &Task, b: &Task) -> Ordering {
        a.id().cmp(&b.id())
    }

    fn resort(&self) -> ResortSchedule {
        ResortSchedule::Never
    }

    fn quantum(&self) -> Option<NonZeroU64> {
        Some(self.quantum)
    }
}

/// Highest-Response-Ratio-Next
///
/// Waiting time changes every tick, so the ordering is re-evaluated before
/// every selection over ready and waiting tasks alike.
#[derive(Debug, Clone, Copy, Default)]
pub struct Hrrn;

impl SelectionPolicy for Hrrn {
    fn name(&self) -> &'static str {
        "HRRN"
    }

    fn compare(&self, a: &Task, b: &Task) -> Ordering {
        b.response_ratio()
            .cmp(&a.response_ratio())
            .then_with(|| a.id().cmp(&b.id()))
    }

    fn resort(&self) -> ResortSchedule {
        ResortSchedule::EveryTick
    }

    fn includes_waiting(&self) -> bool {
        true
    }
}

/// Algorithm selector, as chosen from the menu (without RR's quantum)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AlgorithmChoice {
    Sjf,
    Fcfs,
    RoundRobin,
    Hrrn,
}

impl AlgorithmChoice {
    /// Menu order: 1=SJF, 2=FCFS, 3=RR, 4=HRRN
    pub const ALL: [AlgorithmChoice; 4] = [
        AlgorithmChoice::Sjf,
        AlgorithmChoice::Fcfs,
        AlgorithmChoice::RoundRobin,
        AlgorithmChoice::Hrrn,
    ];

    /// Returns the menu id
    pub fn menu_id(&self) -> u8 {
        match self {
            AlgorithmChoice::Sjf => 1,
            AlgorithmChoice::Fcfs => 2,
            AlgorithmChoice::RoundRobin => 3,
            AlgorithmChoice::Hrrn => 4,
        }
    }

    pub fn needs_quantum(&self) -> bool {
        matches!(self, AlgorithmChoice::RoundRobin)
    }

    /// Combines the choice with an optional quantum
    ///
    /// The quantum is required for RR and ignored otherwise.
    pub fn with_quantum(self, quantum: Option<u64>) -> Result<SchedulingAlgorithm, ValidationError> {
        Ok(match self {
            AlgorithmChoice::Sjf => SchedulingAlgorithm::Sjf,
            AlgorithmChoice::Fcfs => SchedulingAlgorithm::Fcfs,
            AlgorithmChoice::Hrrn => SchedulingAlgorithm::Hrrn,
            AlgorithmChoice::RoundRobin => {
                let quantum = quantum.ok_or(ValidationError::MissingQuantum)?;
                SchedulingAlgorithm::round_robin(quantum)?
            }
        })
    }
}

impl FromStr for AlgorithmChoice {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "1" | "sjf" => Ok(AlgorithmChoice::Sjf),
            "2" | "fcfs" => Ok(AlgorithmChoice::Fcfs),
            "3" | "rr" | "round-robin" => Ok(AlgorithmChoice::RoundRobin),
            "4" | "hrrn" => Ok(AlgorithmChoice::Hrrn),
            other => Err(ValidationError::UnknownAlgorithm(other.to_string())),
        }
    }
}

impl fmt::Display for AlgorithmChoice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AlgorithmChoice::Sjf => write!(f, "Shortest-Job-First (SJF)"),
            AlgorithmChoice::Fcfs => write!(f, "First-Come-First-Served (FCFS)"),
            AlgorithmChoice::RoundRobin => write!(f, "Round-Robin (RR)"),
            AlgorithmChoice::Hrrn => write!(f, "Highest-Response-Ratio-Next (HRRN)"),
        }
    }
}

/// Fully configured scheduling algorithm
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum SchedulingAlgorithm {
    Sjf,
    #[default]
    Fcfs,
    RoundRobin { quantum: NonZeroU64 },
    Hrrn,
}

impl SchedulingAlgorithm {
    /// Builds RR, rejecting a zero quantum
    pub fn round_robin(quantum: u64) -> Result<Self, ValidationError> {
        let quantum = NonZeroU64::new(quantum).ok_or(ValidationError::NonPositiveQuantum)?;
        Ok(SchedulingAlgorithm::RoundRobin { quantum })
    }

    /// Parses an RR quantum token
    pub fn parse_quantum(token: &str) -> Result<u64, ValidationError> {
        parse_positive("time quantum", token)?.ok_or(ValidationError::NonPositiveQuantum)
    }

    pub fn choice(&self) -> AlgorithmChoice {
        match self {
            SchedulingAlgorithm::Sjf => AlgorithmChoice::Sjf,
            SchedulingAlgorithm::Fcfs => AlgorithmChoice::Fcfs,
            SchedulingAlgorithm::RoundRobin { .. } => AlgorithmChoice::RoundRobin,
            SchedulingAlgorithm::Hrrn => AlgorithmChoice::Hrrn,
        }
    }

    pub fn quantum(&self) -> Option<NonZeroU64> {
        match self {
            SchedulingAlgorithm::RoundRobin { quantum } => Some(*quantum),
            _ => None,
        }
    }

    /// Instantiates the policy for this algorithm
    pub fn policy(&self) -> Box<dyn SelectionPolicy> {
        match self {
            SchedulingAlgorithm::Sjf => Box::new(Sjf),
            SchedulingAlgorithm::Fcfs => Box::new(Fcfs),
            SchedulingAlgorithm::RoundRobin { quantum } => Box::new(RoundRobin::new(*quantum)),
            SchedulingAlgorithm::Hrrn => Box::new(Hrrn),
        }
    }
}

impl fmt::Display for SchedulingAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SchedulingAlgorithm::RoundRobin { quantum } => write!(f, "RR(q={})", quantum),
            other => write!(f, "{}", other.policy().name()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::task::TaskSpec;
    use core_types::{TaskId, TaskKind};

    fn task(id: u32, duration: u64) -> Task {
        Task::from_spec(
            TaskId::new(id),
            TaskSpec::new(format!("T{}", id), TaskKind::X, duration),
        )
    }

    #[test]
    fn test_fcfs_orders_by_arrival() {
        let a = task(0, 9);
        let b = task(1, 1);
        assert_eq!(Fcfs.compare(&a, &b), Ordering::Less);
    }

    #[test]
    fn test_sjf_orders_by_duration_then_arrival() {
        let long = task(0, 9);
        let short = task(1, 1);
        let short_late = task(2, 1);
        assert_eq!(Sjf.compare(&short, &long), Ordering::Less);
        assert_eq!(Sjf.compare(&short, &short_late), Ordering::Less);
    }

    #[test]
    fn test_hrrn_prefers_higher_ratio() {
        let mut starved = task(1, 4);
        for _ in 0..8 {
            starved.accrue_wait();
        }
        let fresh = task(0, 1);
        // starved: (8 + 4) / 4 = 3.0, fresh: (0 + 1) / 1 = 1.0
        assert_eq!(Hrrn.compare(&starved, &fresh), Ordering::Less);
    }

    #[test]
    fn test_hrrn_ties_break_by_arrival() {
        let a = task(0, 3);
        let b = task(1, 5);
        assert_eq!(Hrrn.compare(&a, &b), Ordering::Less);
        assert_eq!(Hrrn.compare(&b, &a), Ordering::Greater);
    }

    #[test]
    fn test_resort_schedules() {
        assert_eq!(Fcfs.resort(), ResortSchedule::Never);
        assert_eq!(Sjf.resort(), ResortSchedule::OnceAtStart);
        assert_eq!(Hrrn.resort(), ResortSchedule::EveryTick);
        assert!(Hrrn.includes_waiting());
        assert!(!Sjf.includes_waiting());
    }

    #[test]
    fn test_parse_menu_choice() {
        assert_eq!("1".parse::<AlgorithmChoice>(), Ok(AlgorithmChoice::Sjf));
        assert_eq!("2".parse::<AlgorithmChoice>(), Ok(AlgorithmChoice::Fcfs));
        assert_eq!("3".parse::<AlgorithmChoice>(), Ok(AlgorithmChoice::RoundRobin));
        assert_eq!("HRRN".parse::<AlgorithmChoice>(), Ok(AlgorithmChoice::Hrrn));
        assert_eq!(
            "5".parse::<AlgorithmChoice>(),
            Err(ValidationError::UnknownAlgorithm("5".to_string()))
        );
    }

    #[test]
    fn test_menu_ids_round_trip() {
        for choice in AlgorithmChoice::ALL {
            let parsed: AlgorithmChoice = choice.menu_id().to_string().parse().unwrap();
            assert_eq!(parsed, choice);
        }
    }

    #[test]
    fn test_round_robin_requires_quantum() {
        assert_eq!(
            AlgorithmChoice::RoundRobin.with_quantum(None),
            Err(ValidationError::MissingQuantum)
        );
        assert_eq!(
            AlgorithmChoice::RoundRobin.with_quantum(Some(0)),
            Err(ValidationError::NonPositiveQuantum)
        );
        let rr = AlgorithmChoice::RoundRobin.with_quantum(Some(3)).unwrap();
        assert_eq!(rr.quantum().map(|q| q.get()), Some(3));
        assert_eq!(rr.policy().quantum().map(|q| q.get()), Some(3));
    }

    #[test]
    fn test_quantum_ignored_for_other_algorithms() {
        assert_eq!(
            AlgorithmChoice::Sjf.with_quantum(Some(5)),
            Ok(SchedulingAlgorithm::Sjf)
        );
    }

    #[test]
    fn test_parse_quantum() {
        assert_eq!(SchedulingAlgorithm::parse_quantum("4"), Ok(4));
        assert_eq!(
            SchedulingAlgorithm::parse_quantum("0"),
            Err(ValidationError::NonPositiveQuantum)
        );
        assert!(SchedulingAlgorithm::parse_quantum("-2").is_err());
    }

    #[test]
    fn test_algorithm_display() {
        assert_eq!(SchedulingAlgorithm::Hrrn.to_string(), "HRRN");
        assert_eq!(SchedulingAlgorithm::round_robin(2).unwrap().to_string(), "RR(q=2)");
    }
}
