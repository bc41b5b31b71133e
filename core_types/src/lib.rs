//! # Core Types
//!
//! This crate defines the fundamental types shared by every SchedSim crate.
//!
//! ## Philosophy
//!
//! Core types are designed with these principles:
//! - **Explicit over implicit**: A task's resource demand is a property of its
//!   kind, not something looked up through strings at run time.
//! - **Type safety first**: Resource kinds and task kinds are closed enums, so an
//!   unknown kind cannot reach the scheduler.
//! - **Deterministic identity**: Tasks are identified by their arrival index,
//!   which doubles as the FCFS tie-breaker.
//!
//! ## Key Types
//!
//! - [`TaskId`]: Stable arrival index of a task
//! - [`RunId`]: Unique identifier for one simulation run
//! - [`ResourceKind`]: One of the three renewable resource types
//! - [`TaskKind`]: Task class, statically demanding two resource kinds

pub mod ids;
pub mod kinds;

pub use ids::{RunId, TaskId};
pub use kinds::{KindParseError, ResourceKind, TaskKind};
