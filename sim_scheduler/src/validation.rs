//! Run-definition validation
//!
//! Everything a caller hands to [`crate::Scheduler::initialize_run`] is checked
//! here before the first tick. A malformed definition never starts a run.

use core_types::KindParseError;
use resources::ResourceCounts;
use thiserror::Error;

/// Validation error types
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Expected {expected} values but found {found} in {input:?}")]
    WrongTokenCount {
        expected: usize,
        found: usize,
        input: String,
    },

    #[error("Invalid {field}: {value:?} is not a non-negative integer")]
    InvalidInteger { field: String, value: String },

    #[error("Task {task:?} must have a positive duration")]
    NonPositiveDuration { task: String },

    #[error("Round-robin time quantum must be positive")]
    NonPositiveQuantum,

    #[error("Round-robin requires a time quantum")]
    MissingQuantum,

    #[error("Unknown task kind: {0}")]
    UnknownTaskKind(String),

    #[error("Unknown algorithm: {0} (expected 1=SJF, 2=FCFS, 3=RR, 4=HRRN)")]
    UnknownAlgorithm(String),

    #[error("Task #{index} has an empty name")]
    EmptyTaskName { index: usize },
}

impl From<KindParseError> for ValidationError {
    fn from(err: KindParseError) -> Self {
        match err {
            KindParseError::UnknownTaskKind(kind) => ValidationError::UnknownTaskKind(kind),
            KindParseError::UnknownResourceKind(kind) => ValidationError::UnknownTaskKind(kind),
        }
    }
}

/// Parses a non-negative integer token
pub fn parse_count(field: &str, token: &str) -> Result<u64, ValidationError> {
    token
        .trim()
        .parse::<u64>()
        .map_err(|_| ValidationError::InvalidInteger {
            field: field.to_string(),
            value: token.trim().to_string(),
        })
}

/// Parses a strictly positive integer token
///
/// Returns `Ok(None)` for zero so callers can raise the error that fits the
/// field (duration or quantum).
pub fn parse_positive(field: &str, token: &str) -> Result<Option<u64>, ValidationError> {
    let value = parse_count(field, token)?;
    Ok((value > 0).then_some(value))
}

/// Parses the `R1 R2 R3` resource totals line
pub fn parse_resource_totals(line: &str) -> Result<ResourceCounts, ValidationError> {
    let tokens: Vec<&str> = line.split_whitespace().collect();
    if tokens.len() != 3 {
        return Err(ValidationError::WrongTokenCount {
            expected: 3,
            found: tokens.len(),
            input: line.trim().to_string(),
        });
    }

    Ok(ResourceCounts::new(
        parse_count("R1 count", tokens[0])?,
        parse_count("R2 count", tokens[1])?,
        parse_count("R3 count", tokens[2])?,
    ))
}
