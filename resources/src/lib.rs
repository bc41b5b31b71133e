//! # Resources
//!
//! This crate provides the shared resource pool primitives for SchedSim.
//!
//! ## Philosophy
//!
//! - **Resources are finite and must be explicit**
//! - **Allocation is all-or-nothing**: a task gets both of its units or neither
//! - **Accounting is deterministic and auditable**
//! - **Conservation is checkable**: free + held always equals the initial total
//!
//! ## Core Concepts
//!
//! - [`ResourceCounts`]: A count for each of R1, R2 and R3
//! - [`ResourcePool`]: Free counts plus the set of tasks currently holding units
//! - [`ResourceError`]: Accounting failures (never expected in a correct run)
//!
//! ## Non-Goals
//!
//! This is NOT:
//! - Deadlock detection or avoidance
//! - Partial allocation (a task never holds one unit while waiting for another)
//! - Requests for more than the two kinds a task kind statically demands

use core_types::{ResourceKind, TaskId, TaskKind};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use thiserror::Error;

/// Unit counts for each resource kind
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct ResourceCounts {
    pub r1: u64,
    pub r2: u64,
    pub r3: u64,
}

impl ResourceCounts {
    pub fn new(r1: u64, r2: u64, r3: u64) -> Self {
        Self { r1, r2, r3 }
    }

    pub fn zero() -> Self {
        Self::new(0, 0, 0)
    }

    /// Returns the count for one resource kind
    pub fn get(&self, kind: ResourceKind) -> u64 {
        match kind {
            ResourceKind::R1 => self.r1,
            ResourceKind::R2 => self.r2,
            ResourceKind::R3 => self.r3,
        }
    }

    /// Builder: sets the count for one resource kind
    pub fn with(mut self, kind: ResourceKind, value: u64) -> Self {
        *self.slot_mut(kind) = value;
        self
    }

    pub fn checked_add(&self, kind: ResourceKind, amount: u64) -> Option<Self> {
        let value = self.get(kind).checked_add(amount)?;
        Some(self.with(kind, value))
    }

    pub fn checked_sub(&self, kind: ResourceKind, amount: u64) -> Option<Self> {
        let value = self.get(kind).checked_sub(amount)?;
        Some(self.with(kind, value))
    }

    /// Returns true if at least one unit of every kind `task_kind` needs is present
    pub fn satisfies(&self, task_kind: TaskKind) -> bool {
        task_kind.demands().iter().all(|r| self.get(*r) >= 1)
    }

    fn slot_mut(&mut self, kind: ResourceKind) -> &mut u64 {
        match kind {
            ResourceKind::R1 => &mut self.r1,
            ResourceKind::R2 => &mut self.r2,
            ResourceKind::R3 => &mut self.r3,
        }
    }
}

impl fmt::Display for ResourceCounts {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "R1: {} R2: {} R3: {}", self.r1, self.r2, self.r3)
    }
}

/// Resource-related errors
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ResourceError {
    #[error("Insufficient {resource} for {task}: {available} free")]
    InsufficientUnits {
        task: TaskId,
        resource: ResourceKind,
        available: u64,
    },

    #[error("{0} already holds resources")]
    AlreadyHeld(TaskId),

    #[error("{0} holds no resources (double release?)")]
    NotHeld(TaskId),

    #[error("Conservation violated for {resource}: free={free}, held={held}, total={total}")]
    ConservationViolated {
        resource: ResourceKind,
        free: u64,
        held: u64,
        total: u64,
    },
}

/// Shared pool of renewable resources
///
/// Tracks which task holds units so that every allocation is matched by
/// exactly one release.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourcePool {
    totals: ResourceCounts,
    free: ResourceCounts,
    holders: BTreeMap<TaskId, TaskKind>,
}

impl ResourcePool {
    /// Creates a pool with every unit free
    pub fn new(totals: ResourceCounts) -> Self {
        Self {
            totals,
            free: totals,
            holders: BTreeMap::new(),
        }
    }

    /// Returns the initial totals
    pub fn totals(&self) -> ResourceCounts {
        self.totals
    }

    /// Returns the currently free counts
    pub fn free(&self) -> ResourceCounts {
        self.free
    }

    /// Returns the tasks currently holding units, in arrival order
    pub fn holders(&self) -> impl Iterator<Item = (TaskId, TaskKind)> + '_ {
        self.holders.iter().map(|(id, kind)| (*id, *kind))
    }

    /// Returns true if `task` currently holds units
    pub fn is_held_by(&self, task: TaskId) -> bool {
        self.holders.contains_key(&task)
    }

    /// Returns true if a task of `kind` could be allocated right now
    pub fn can_satisfy(&self, kind: TaskKind) -> bool {
        self.free.satisfies(kind)
    }

    /// Returns true if the totals alone could ever satisfy `kind`
    pub fn could_ever_satisfy(&self, kind: TaskKind) -> bool {
        self.totals.satisfies(kind)
    }

    /// Allocates one unit of each resource `kind` demands to `task`
    ///
    /// Either both units are taken or the pool is left unchanged.
    pub fn allocate(&mut self, task: TaskId, kind: TaskKind) -> Result<(), ResourceError> {
        if self.holders.contains_key(&task) {
            return Err(ResourceError::AlreadyHeld(task));
        }

        let mut next = self.free;
        for resource in kind.demands() {
            next = next
                .checked_sub(resource, 1)
                .ok_or(ResourceError::InsufficientUnits {
                    task,
                    resource,
                    available: self.free.get(resource),
                })?;
        }

        self.free = next;
        self.holders.insert(task, kind);
        Ok(())
    }

    /// Returns the units held by `task` to the pool
    pub fn release(&mut self, task: TaskId) -> Result<TaskKind, ResourceError> {
        let kind = *self
            .holders
            .get(&task)
            .ok_or(ResourceError::NotHeld(task))?;

        let mut next = self.free;
        for resource in kind.demands() {
            let free = next.get(resource);
            let total = self.totals.get(resource);
            if free >= total {
                return Err(ResourceError::ConservationViolated {
                    resource,
                    free: free + 1,
                    held: self.held_units(resource) - 1,
                    total,
                });
            }
            next = next.with(resource, free + 1);
        }

        self.free = next;
        self.holders.remove(&task);
        Ok(kind)
    }

    /// Returns the number of units of `resource` currently allocated
    pub fn held_units(&self, resource: ResourceKind) -> u64 {
        self.holders
            .values()
            .filter(|kind| kind.requires(resource))
            .count() as u64
    }

    /// Checks that free + held equals the total for every resource kind
    pub fn audit(&self) -> Result<(), ResourceError> {
        for resource in ResourceKind::ALL {
            let free = self.free.get(resource);
            let held = self.held_units(resource);
            let total = self.totals.get(resource);
            if free + held != total {
                return Err(ResourceError::ConservationViolated {
                    resource,
                    free,
                    held,
                    total,
                });
            }
        }
        Ok(())
    }
}

impl fmt::Display for ResourcePool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.free)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pool(r1: u64, r2: u64, r3: u64) -> ResourcePool {
        ResourcePool::new(ResourceCounts::new(r1, r2, r3))
    }

    #[test]
    fn test_counts_arithmetic() {
        let counts = ResourceCounts::new(1, 0, 2);
        assert_eq!(
            counts.checked_sub(ResourceKind::R1, 1),
            Some(ResourceCounts::new(0, 0, 2))
        );
        assert_eq!(counts.checked_sub(ResourceKind::R2, 1), None); // Would underflow
        assert_eq!(
            counts.checked_add(ResourceKind::R2, 3),
            Some(ResourceCounts::new(1, 3, 2))
        );
    }

    #[test]
    fn test_counts_overflow() {
        let counts = ResourceCounts::new(u64::MAX, 0, 0);
        assert_eq!(counts.checked_add(ResourceKind::R1, 1), None);
    }

    #[test]
    fn test_counts_satisfies() {
        let counts = ResourceCounts::new(1, 1, 0);
        assert!(counts.satisfies(TaskKind::X));
        assert!(!counts.satisfies(TaskKind::Y));
        assert!(!counts.satisfies(TaskKind::Z));
    }

    #[test]
    fn test_counts_display() {
        assert_eq!(ResourceCounts::new(1, 2, 3).to_string(), "R1: 1 R2: 2 R3: 3");
    }

    #[test]
    fn test_allocate_and_release() {
        let mut pool = pool(1, 1, 1);
        let task = TaskId::new(0);

        pool.allocate(task, TaskKind::X).unwrap();
        assert_eq!(pool.free(), ResourceCounts::new(0, 0, 1));
        assert!(pool.is_held_by(task));
        assert!(pool.audit().is_ok());

        assert_eq!(pool.release(task).unwrap(), TaskKind::X);
        assert_eq!(pool.free(), ResourceCounts::new(1, 1, 1));
        assert!(!pool.is_held_by(task));
        assert!(pool.audit().is_ok());
    }

    #[test]
    fn test_allocate_is_all_or_nothing() {
        let mut pool = pool(1, 0, 1);
        let result = pool.allocate(TaskId::new(0), TaskKind::X);

        assert_eq!(
            result,
            Err(ResourceError::InsufficientUnits {
                task: TaskId::new(0),
                resource: ResourceKind::R2,
                available: 0,
            })
        );
        // R1 must not have been taken
        assert_eq!(pool.free(), ResourceCounts::new(1, 0, 1));
        assert_eq!(pool.holders().count(), 0);
    }

    #[test]
    fn test_conflicting_kinds() {
        let mut pool = pool(1, 1, 1);
        pool.allocate(TaskId::new(0), TaskKind::X).unwrap();

        assert!(!pool.can_satisfy(TaskKind::Y));
        assert!(!pool.can_satisfy(TaskKind::Z));
        assert!(pool.could_ever_satisfy(TaskKind::Y));
    }

    #[test]
    fn test_double_allocation_rejected() {
        let mut pool = pool(2, 2, 2);
        let task = TaskId::new(0);
        pool.allocate(task, TaskKind::Y).unwrap();
        assert_eq!(
            pool.allocate(task, TaskKind::Y),
            Err(ResourceError::AlreadyHeld(task))
        );
    }

    #[test]
    fn test_double_release_rejected() {
        let mut pool = pool(1, 1, 1);
        let task = TaskId::new(0);
        pool.allocate(task, TaskKind::Z).unwrap();
        pool.release(task).unwrap();
        assert_eq!(pool.release(task), Err(ResourceError::NotHeld(task)));
        assert_eq!(pool.free(), ResourceCounts::new(1, 1, 1));
    }

    #[test]
    fn test_held_units() {
        let mut pool = pool(2, 2, 2);
        pool.allocate(TaskId::new(0), TaskKind::X).unwrap();
        pool.allocate(TaskId::new(1), TaskKind::Y).unwrap();

        assert_eq!(pool.held_units(ResourceKind::R1), 1);
        assert_eq!(pool.held_units(ResourceKind::R2), 2);
        assert_eq!(pool.held_units(ResourceKind::R3), 1);
        assert!(pool.audit().is_ok());
    }

    #[test]
    fn test_zero_totals_never_satisfy() {
        let pool = pool(3, 3, 0);
        assert!(pool.could_ever_satisfy(TaskKind::X));
        assert!(!pool.could_ever_satisfy(TaskKind::Y));
        assert!(!pool.could_ever_satisfy(TaskKind::Z));
    }

    #[test]
    fn test_error_display() {
        let err = ResourceError::ConservationViolated {
            resource: ResourceKind::R2,
            free: 2,
            held: 0,
            total: 1,
        };
        let display = err.to_string();
        assert!(display.contains("R2"));
        assert!(display.contains("total=1"));
    }

    #[test]
    fn test_counts_serde() {
        let counts = ResourceCounts::new(1, 2, 3);
        let json = serde_json::to_string(&counts).unwrap();
        assert_eq!(json, r#"{"r1":1,"r2":2,"r3":3}"#);
    }
}
