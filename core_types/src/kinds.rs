//! Resource kinds and task kinds
//!
//! Each [`TaskKind`] demands exactly two distinct [`ResourceKind`]s, one unit
//! each. The three demands form a cycle: every pair of task kinds shares
//! exactly one resource kind.
//!
//! | Task kind | Demand     |
//! |-----------|------------|
//! | X         | R1, R2     |
//! | Y         | R2, R3     |
//! | Z         | R1, R3     |

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Error returned when a kind token cannot be parsed
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum KindParseError {
    #[error("Unknown resource kind: {0}")]
    UnknownResourceKind(String),

    #[error("Unknown task kind: {0} (expected X, Y or Z)")]
    UnknownTaskKind(String),
}

/// Renewable resource type
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum ResourceKind {
    R1,
    R2,
    R3,
}

impl ResourceKind {
    /// All resource kinds in display order
    pub const ALL: [ResourceKind; 3] = [ResourceKind::R1, ResourceKind::R2, ResourceKind::R3];

    /// Returns the zero-based slot of this kind
    pub fn index(&self) -> usize {
        match self {
            ResourceKind::R1 => 0,
            ResourceKind::R2 => 1,
            ResourceKind::R3 => 2,
        }
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResourceKind::R1 => write!(f, "R1"),
            ResourceKind::R2 => write!(f, "R2"),
            ResourceKind::R3 => write!(f, "R3"),
        }
    }
}

impl FromStr for ResourceKind {
    type Err = KindParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "R1" => Ok(ResourceKind::R1),
            "R2" => Ok(ResourceKind::R2),
            "R3" => Ok(ResourceKind::R3),
            other => Err(KindParseError::UnknownResourceKind(other.to_string())),
        }
    }
}

/// Task class
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TaskKind {
    X,
    Y,
    Z,
}

impl TaskKind {
    /// All task kinds
    pub const ALL: [TaskKind; 3] = [TaskKind::X, TaskKind::Y, TaskKind::Z];

    /// Returns the two resource kinds this task kind holds while running
    pub fn demands(&self) -> [ResourceKind; 2] {
        match self {
            TaskKind::X => [ResourceKind::R1, ResourceKind::R2],
            TaskKind::Y => [ResourceKind::R2, ResourceKind::R3],
            TaskKind::Z => [ResourceKind::R1, ResourceKind::R3],
        }
    }

    /// Returns true if this kind needs one unit of `resource`
    pub fn requires(&self, resource: ResourceKind) -> bool {
        self.demands().contains(&resource)
    }

    /// Returns the resource kinds two task kinds both need
    pub fn shared_with(&self, other: TaskKind) -> Vec<ResourceKind> {
        self.demands()
            .into_iter()
            .filter(|r| other.requires(*r))
            .collect()
    }
}

impl fmt::Display for TaskKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TaskKind::X => write!(f, "X"),
            TaskKind::Y => write!(f, "Y"),
            TaskKind::Z => write!(f, "Z"),
        }
    }
}

impl FromStr for TaskKind {
    type Err = KindParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "X" | "x" => Ok(TaskKind::X),
            "Y" | "y" => Ok(TaskKind::Y),
            "Z" | "z" => Ok(TaskKind::Z),
            other => Err(KindParseError::UnknownTaskKind(other.to_string())),
        }
    }
}
