//! # Interactive Console
//!
//! Prompts for a run definition on a line-oriented input stream.
//!
//! The prompt order is fixed: resource totals, task count, one line per task,
//! algorithm menu and, for round-robin only, the time quantum. Any malformed
//! answer aborts with a [`ConsoleError`] before the run starts.

use crate::workload::Workload;
use resources::ResourceCounts;
use sim_scheduler::{
    parse_count, parse_resource_totals, AlgorithmChoice, SchedulingAlgorithm, TaskSpec,
    ValidationError,
};
use std::io::{self, BufRead, Write};
use thiserror::Error;

pub const RESOURCES_PROMPT: &str = "Enter the number of resources for R1 R2 R3: ";
pub const TASK_COUNT_PROMPT: &str = "Enter the number of tasks: ";
pub const TASK_PROMPT: &str = "Enter task details (Task_Name Task_Type Task_Duration): ";
pub const QUANTUM_PROMPT: &str = "Enter the time quantum for Round Robin (RR): ";

/// Console error types
#[derive(Debug, Error)]
pub enum ConsoleError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("Input ended while waiting for: {prompt}")]
    UnexpectedEof { prompt: String },

    #[error(transparent)]
    Validation(#[from] ValidationError),
}

/// Prompt-driven reader over any buffered input and writable output
pub struct Console<R, W> {
    input: R,
    output: W,
}

impl<R: BufRead, W: Write> Console<R, W> {
    pub fn new(input: R, output: W) -> Self {
        Self { input, output }
    }

    /// Writes `prompt` and reads one answer line
    fn ask(&mut self, prompt: &str) -> Result<String, ConsoleError> {
        write!(self.output, "{}", prompt)?;
        self.output.flush()?;

        let mut line = String::new();
        if self.input.read_line(&mut line)? == 0 {
            return Err(ConsoleError::UnexpectedEof {
                prompt: prompt.trim().to_string(),
            });
        }
        Ok(line.trim().to_string())
    }

    pub fn read_totals(&mut self) -> Result<ResourceCounts, ConsoleError> {
        let answer = self.ask(RESOURCES_PROMPT)?;
        Ok(parse_resource_totals(&answer)?)
    }

    pub fn read_tasks(&mut self) -> Result<Vec<TaskSpec>, ConsoleError> {
        let answer = self.ask(TASK_COUNT_PROMPT)?;
        let count = parse_count("task count", &answer)?;

        let mut tasks = Vec::new();
        for _ in 0..count {
            let answer = self.ask(TASK_PROMPT)?;
            tasks.push(TaskSpec::parse(&answer)?);
        }
        Ok(tasks)
    }

    pub fn read_algorithm(&mut self) -> Result<AlgorithmChoice, ConsoleError> {
        let mut menu = String::from("Choose the scheduling algorithm:\n");
        for choice in AlgorithmChoice::ALL {
            menu.push_str(&format!("{}. {}\n", choice.menu_id(), choice));
        }
        menu.push_str("Choice: ");

        let answer = self.ask(&menu)?;
        Ok(answer.parse()?)
    }

    pub fn read_quantum(&mut self) -> Result<u64, ConsoleError> {
        let answer = self.ask(QUANTUM_PROMPT)?;
        Ok(SchedulingAlgorithm::parse_quantum(&answer)?)
    }

    /// Runs the full prompt sequence
    ///
    /// With `ask_algorithm` false the menu and quantum prompts are skipped and
    /// the workload carries no algorithm.
    pub fn read_workload(&mut self, ask_algorithm: bool) -> Result<Workload, ConsoleError> {
        let totals = self.read_totals()?;
        let tasks = self.read_tasks()?;
        let mut workload = Workload::new(totals, tasks);

        if ask_algorithm {
            let choice = self.read_algorithm()?;
            if choice.needs_quantum() {
                workload.quantum = Some(self.read_quantum()?);
            }
            workload.algorithm = Some(choice);
        }
        Ok(workload)
    }

    pub fn into_inner(self) -> (R, W) {
        (self.input, self.output)
    }
}
