//! Identifiers for simulation entities

use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Identifier for a task
///
/// Task ids are arrival indices: the first task submitted is `TaskId(0)`, the
/// next `TaskId(1)` and so on. Ordering on ids is therefore arrival order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct TaskId(u32);

impl TaskId {
    /// Creates a task ID from an arrival index
    pub fn new(index: u32) -> Self {
        Self(index)
    }

    /// Returns the arrival index
    pub fn index(&self) -> u32 {
        self.0
    }
}

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Task(#{})", self.0)
    }
}

/// Unique identifier for a simulation run
///
/// Independent runs (for example the four runs of a comparison) each get their
/// own id so their audit trails can be told apart.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RunId(Uuid);

impl RunId {
    /// Creates a new random run ID
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Creates a run ID from a UUID
    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Returns the inner UUID
    pub fn as_uuid(&self) -> Uuid {
        self.0
    }
}

impl Default for RunId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for RunId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Run({})", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_task_id_orders_by_arrival() {
        let first = TaskId::new(0);
        let second = TaskId::new(1);
        assert!(first < second);
        assert_eq!(second.index(), 1);
    }

    #[test]
    fn test_task_id_display() {
        assert_eq!(TaskId::new(7).to_string(), "Task(#7)");
    }

    #[test]
    fn test_run_id_creation() {
        let id1 = RunId::new();
        let id2 = RunId::new();
        assert_ne!(id1, id2);
    }

    #[test]
    fn test_run_id_from_uuid() {
        let uuid = Uuid::new_v4();
        let id = RunId::from_uuid(uuid);
        assert_eq!(id.as_uuid(), uuid);
    }

    #[test]
    fn test_run_id_display() {
        let display = format!("{}", RunId::new());
        assert!(display.starts_with("Run("));
    }

    #[test]
    fn test_task_id_serde() {
        let id = TaskId::new(3);
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, "3");
        let back: TaskId = serde_json::from_str(&json).unwrap();
        assert_eq!(back, id);
    }
}
