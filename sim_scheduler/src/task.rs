//! Task model
//!
//! A [`TaskSpec`] is what the caller submits; a [`Task`] is the engine's
//! mutable record of that submission during a run.

use crate::validation::{parse_positive, ValidationError};
use core_types::{TaskId, TaskKind};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;

/// Static definition of a task, as submitted before the run starts
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskSpec {
    pub name: String,
    pub kind: TaskKind,
    pub duration: u64,
}

impl TaskSpec {
    pub fn new(name: impl Into<String>, kind: TaskKind, duration: u64) -> Self {
        Self {
            name: name.into(),
            kind,
            duration,
        }
    }

    /// Parses a `NAME KIND DURATION` line
    pub fn parse(line: &str) -> Result<Self, ValidationError> {
        let tokens: Vec<&str> = line.split_whitespace().collect();
        if tokens.len() != 3 {
            return Err(ValidationError::WrongTokenCount {
                expected: 3,
                found: tokens.len(),
                input: line.trim().to_string(),
            });
        }

        let name = tokens[0];
        let kind: TaskKind = tokens[1].parse()?;
        let duration = parse_positive("duration", tokens[2])?.ok_or_else(|| {
            ValidationError::NonPositiveDuration {
                task: name.to_string(),
            }
        })?;

        Ok(Self::new(name, kind, duration))
    }

    /// Checks the spec at submission position `index`
    pub fn validate(&self, index: usize) -> Result<(), ValidationError> {
        if self.name.trim().is_empty() {
            return Err(ValidationError::EmptyTaskName { index });
        }
        if self.duration == 0 {
            return Err(ValidationError::NonPositiveDuration {
                task: self.name.clone(),
            });
        }
        Ok(())
    }
}

/// Task status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TaskStatus {
    /// Queued in the ready queue
    Ready,
    /// Failed a resource acquisition, queued in the waiting queue
    Waiting,
    /// Holding its resources and occupying the processor
    Running,
    /// Ran for its full duration; resources released
    Completed,
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TaskStatus::Ready => write!(f, "Ready"),
            TaskStatus::Waiting => write!(f, "Waiting"),
            TaskStatus::Running => write!(f, "Running"),
            TaskStatus::Completed => write!(f, "Completed"),
        }
    }
}

/// HRRN priority `(waiting + remaining) / remaining`
///
/// Kept as an exact fraction and compared by cross-multiplication, so equal
/// ratios compare equal regardless of floating point rounding.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct ResponseRatio {
    waiting: u64,
    remaining: u64,
}

impl ResponseRatio {
    pub fn new(waiting: u64, remaining: u64) -> Self {
        Self { waiting, remaining }
    }

    /// Returns the ratio as a float, for display only
    pub fn as_f64(&self) -> f64 {
        if self.remaining == 0 {
            return f64::INFINITY;
        }
        (self.waiting + self.remaining) as f64 / self.remaining as f64
    }

    fn numerator(&self) -> u128 {
        self.waiting as u128 + self.remaining as u128
    }
}

impl PartialEq for ResponseRatio {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for ResponseRatio {}

impl PartialOrd for ResponseRatio {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for ResponseRatio {
    fn cmp(&self, other: &Self) -> Ordering {
        // a/b vs c/d  <=>  a*d vs c*b  (denominators are non-negative)
        let lhs = self.numerator() * other.remaining as u128;
        let rhs = other.numerator() * self.remaining as u128;
        lhs.cmp(&rhs)
    }
}

impl fmt::Display for ResponseRatio {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.3}", self.as_f64())
    }
}

/// A task during a run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    id: TaskId,
    name: String,
    kind: TaskKind,
    total_duration: u64,
    remaining: u64,
    status: TaskStatus,
    execution_time: u64,
    waiting_time: u64,
    completion_tick: Option<u64>,
}

impl Task {
    pub(crate) fn from_spec(id: TaskId, spec: TaskSpec) -> Self {
        Self {
            id,
            name: spec.name,
            kind: spec.kind,
            total_duration: spec.duration,
            remaining: spec.duration,
            status: TaskStatus::Ready,
            execution_time: 0,
            waiting_time: 0,
            completion_tick: None,
        }
    }

    pub fn id(&self) -> TaskId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> TaskKind {
        self.kind
    }

    pub fn total_duration(&self) -> u64 {
        self.total_duration
    }

    pub fn remaining(&self) -> u64 {
        self.remaining
    }

    pub fn status(&self) -> TaskStatus {
        self.status
    }

    /// Ticks actually run so far
    pub fn execution_time(&self) -> u64 {
        self.execution_time
    }

    /// Ticks spent queued (ready or waiting) so far
    pub fn waiting_time(&self) -> u64 {
        self.waiting_time
    }

    /// Tick during which the task completed
    pub fn completion_tick(&self) -> Option<u64> {
        self.completion_tick
    }

    pub fn is_completed(&self) -> bool {
        self.status == TaskStatus::Completed
    }

    /// Returns the current HRRN response ratio
    pub fn response_ratio(&self) -> ResponseRatio {
        ResponseRatio::new(self.waiting_time, self.remaining)
    }

    pub(crate) fn set_status(&mut self, status: TaskStatus) {
        self.status = status;
    }

    /// Runs the task for one tick and returns the remaining duration
    pub(crate) fn execute_tick(&mut self) -> u64 {
        self.remaining = self.remaining.saturating_sub(1);
        self.execution_time += 1;
        self.remaining
    }

    pub(crate) fn accrue_wait(&mut self) {
        self.waiting_time += 1;
    }

    pub(crate) fn complete(&mut self, tick: u64) {
        self.status = TaskStatus::Completed;
        self.completion_tick = Some(tick);
    }
}
