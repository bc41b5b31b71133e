//! # Workload File Parser
//!
//! A workload file describes one run without going through the interactive
//! prompts.
//!
//! ## Format
//!
//! Line-based, one directive per line:
//! - `resources R1 R2 R3`: resource totals (required, once)
//! - `task NAME KIND DURATION`: one task, in arrival order
//! - `algorithm ID`: `1`-`4` or `sjf`, `fcfs`, `rr`, `hrrn` (optional)
//! - `quantum N`: round-robin time quantum (optional)
//! - Comments: `# ...`, on their own line or after a directive
//!
//! ## Example
//!
//! ```text
//! # Cyclic contention on a single unit of each resource
//! resources 1 1 1
//! task A X 2
//! task B Y 2
//! task C Z 2
//! algorithm rr
//! quantum 2
//! ```

use resources::ResourceCounts;
use sim_scheduler::{
    parse_resource_totals, AlgorithmChoice, SchedulingAlgorithm, TaskSpec, ValidationError,
};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Workload error types
#[derive(Debug, Error)]
pub enum WorkloadError {
    #[error("Failed to read workload file {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Line {line}: {source}")]
    Invalid {
        line: usize,
        source: ValidationError,
    },

    #[error("Line {line}: unknown directive {directive:?}")]
    UnknownDirective { line: usize, directive: String },

    #[error("Line {line}: {directive} given more than once")]
    Duplicate { line: usize, directive: String },

    #[error("Workload does not declare resource totals")]
    MissingResources,

    #[error("No algorithm selected (use --algorithm or an `algorithm` line)")]
    MissingAlgorithm,

    #[error(transparent)]
    Validation(#[from] ValidationError),
}

/// A parsed run definition
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Workload {
    pub totals: ResourceCounts,
    pub tasks: Vec<TaskSpec>,
    pub algorithm: Option<AlgorithmChoice>,
    pub quantum: Option<u64>,
}

impl Workload {
    pub fn new(totals: ResourceCounts, tasks: Vec<TaskSpec>) -> Self {
        Self {
            totals,
            tasks,
            algorithm: None,
            quantum: None,
        }
    }

    /// Reads and parses a workload file
    pub fn from_file(path: &Path) -> Result<Self, WorkloadError> {
        let text = fs::read_to_string(path).map_err(|source| WorkloadError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_text(&text)
    }

    /// Parses a workload from text
    pub fn from_text(text: &str) -> Result<Self, WorkloadError> {
        let mut totals = None;
        let mut tasks = Vec::new();
        let mut algorithm = None;
        let mut quantum = None;

        for (index, raw) in text.lines().enumerate() {
            let line_num = index + 1;
            let line = match raw.find('#') {
                Some(pos) => &raw[..pos],
                None => raw,
            }
            .trim();
            if line.is_empty() {
                continue;
            }

            let (directive, rest) = line.split_once(char::is_whitespace).unwrap_or((line, ""));
            let invalid = |source| WorkloadError::Invalid {
                line: line_num,
                source,
            };

            match directive.to_ascii_lowercase().as_str() {
                "resources" => {
                    if totals.is_some() {
                        return Err(duplicate(line_num, "resources"));
                    }
                    totals = Some(parse_resource_totals(rest).map_err(invalid)?);
                }
                "task" => tasks.push(TaskSpec::parse(rest).map_err(invalid)?),
                "algorithm" => {
                    if algorithm.is_some() {
                        return Err(duplicate(line_num, "algorithm"));
                    }
                    algorithm = Some(rest.parse::<AlgorithmChoice>().map_err(invalid)?);
                }
                "quantum" => {
                    if quantum.is_some() {
                        return Err(duplicate(line_num, "quantum"));
                    }
                    quantum = Some(SchedulingAlgorithm::parse_quantum(rest).map_err(invalid)?);
                }
                other => {
                    return Err(WorkloadError::UnknownDirective {
                        line: line_num,
                        directive: other.to_string(),
                    })
                }
            }
        }

        Ok(Self {
            totals: totals.ok_or(WorkloadError::MissingResources)?,
            tasks,
            algorithm,
            quantum,
        })
    }

    /// Resolves the algorithm, letting command-line values override the file
    pub fn resolve_algorithm(
        &self,
        choice: Option<AlgorithmChoice>,
        quantum: Option<u64>,
    ) -> Result<SchedulingAlgorithm, WorkloadError> {
        let choice = choice
            .or(self.algorithm)
            .ok_or(WorkloadError::MissingAlgorithm)?;
        Ok(choice.with_quantum(quantum.or(self.quantum))?)
    }
}

fn duplicate(line: usize, directive: &str) -> WorkloadError {
    WorkloadError::Duplicate {
        line,
        directive: directive.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core_types::TaskKind;

    #[test]
    fn test_parse_full_workload() {
        let text = r#"
            # Cyclic contention
            resources 1 1 1
            task A X 2
            task B Y 2   # trailing comment
            task C z 2
            algorithm rr
            quantum 2
        "#;

        let workload = Workload::from_text(text).unwrap();
        assert_eq!(workload.totals, ResourceCounts::new(1, 1, 1));
        assert_eq!(workload.tasks.len(), 3);
        assert_eq!(workload.tasks[2], TaskSpec::new("C", TaskKind::Z, 2));
        assert_eq!(workload.algorithm, Some(AlgorithmChoice::RoundRobin));
        assert_eq!(workload.quantum, Some(2));
    }

    #[test]
    fn test_missing_resources() {
        let result = Workload::from_text("task A X 1\n");
        assert!(matches!(result, Err(WorkloadError::MissingResources)));
    }

    #[test]
    fn test_error_reports_line_number() {
        let text = "resources 1 1 1\ntask A X 1\ntask B W 1\n";
        match Workload::from_text(text) {
            Err(WorkloadError::Invalid { line, source }) => {
                assert_eq!(line, 3);
                assert_eq!(source, ValidationError::UnknownTaskKind("W".to_string()));
            }
            other => panic!("Expected Invalid, got {:?}", other),
        }
    }

    #[test]
    fn test_zero_duration_rejected() {
        let text = "resources 1 1 1\ntask A X 0\n";
        assert!(matches!(
            Workload::from_text(text),
            Err(WorkloadError::Invalid {
                line: 2,
                source: ValidationError::NonPositiveDuration { .. }
            })
        ));
    }

    #[test]
    fn test_unknown_directive_and_duplicates() {
        assert!(matches!(
            Workload::from_text("resources 1 1 1\nprocessors 2\n"),
            Err(WorkloadError::UnknownDirective { line: 2, .. })
        ));
        assert!(matches!(
            Workload::from_text("resources 1 1 1\nresources 2 2 2\n"),
            Err(WorkloadError::Duplicate { line: 2, .. })
        ));
    }

    #[test]
    fn test_resolve_algorithm_overrides() {
        let mut workload = Workload::from_text("resources 1 1 1\nalgorithm 2\n").unwrap();
        assert_eq!(
            workload.resolve_algorithm(None, None).unwrap(),
            SchedulingAlgorithm::Fcfs
        );
        assert_eq!(
            workload
                .resolve_algorithm(Some(AlgorithmChoice::Hrrn), None)
                .unwrap(),
            SchedulingAlgorithm::Hrrn
        );

        assert!(matches!(
            workload.resolve_algorithm(Some(AlgorithmChoice::RoundRobin), None),
            Err(WorkloadError::Validation(ValidationError::MissingQuantum))
        ));

        workload.quantum = Some(3);
        assert_eq!(
            workload
                .resolve_algorithm(Some(AlgorithmChoice::RoundRobin), None)
                .unwrap(),
            SchedulingAlgorithm::round_robin(3).unwrap()
        );

        workload.algorithm = None;
        assert!(matches!(
            workload.resolve_algorithm(None, None),
            Err(WorkloadError::MissingAlgorithm)
        ));
    }

    #[test]
    fn test_empty_task_list_is_allowed() {
        let workload = Workload::from_text("resources 0 0 0\n").unwrap();
        assert!(workload.tasks.is_empty());
    }
}
