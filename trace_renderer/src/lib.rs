//! # Trace Renderer
//!
//! This crate renders scheduler snapshots and run reports for the host.
//!
//! ## Philosophy
//!
//! - **Rendering is a host concern**, not an engine concern
//! - **The engine never prints**: it returns snapshots
//! - **Renderer is dumb and replaceable**: no scheduling logic
//!
//! Two renderers are provided: [`TextRenderer`] for humans and
//! [`JsonRenderer`] for machines (one JSON object per line).

mod json;
mod text;

pub use json::JsonRenderer;
pub use text::TextRenderer;

use serde::{Deserialize, Serialize};
use sim_scheduler::{RunOutcome, RunSummary, TickSnapshot};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Rendering errors
#[derive(Debug, Error)]
pub enum RenderError {
    #[error("JSON encoding failed: {0}")]
    Json(#[from] serde_json::Error),
}

/// Turns scheduler output into printable text
pub trait Renderer {
    /// Renders the state at the end of one tick
    fn render_tick(&self, snapshot: &TickSnapshot) -> Result<String, RenderError>;

    /// Renders the terminal outcome of a run
    fn render_outcome(&self, outcome: &RunOutcome, show_summary: bool)
        -> Result<String, RenderError>;

    /// Renders a side-by-side comparison of several runs
    fn render_comparison(&self, rows: &[ComparisonRow]) -> Result<String, RenderError>;
}

/// Output format selector
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

impl OutputFormat {
    /// Creates the renderer for this format
    pub fn renderer(&self) -> Box<dyn Renderer> {
        match self {
            OutputFormat::Text => Box::new(TextRenderer::new()),
            OutputFormat::Json => Box::new(JsonRenderer::new()),
        }
    }
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("Unknown output format: {0} (expected text or json)")]
pub struct FormatParseError(pub String);

impl FromStr for OutputFormat {
    type Err = FormatParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "text" => Ok(OutputFormat::Text),
            "json" => Ok(OutputFormat::Json),
            _ => Err(FormatParseError(s.to_string())),
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OutputFormat::Text => write!(f, "text"),
            OutputFormat::Json => write!(f, "json"),
        }
    }
}

/// How a run ended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutcomeKind {
    Completed,
    Livelocked,
    TickLimitReached,
}

impl OutcomeKind {
    pub fn of(outcome: &RunOutcome) -> Self {
        match outcome {
            RunOutcome::Completed(_) => OutcomeKind::Completed,
            RunOutcome::Livelocked(_) => OutcomeKind::Livelocked,
            RunOutcome::TickLimitReached(_) => OutcomeKind::TickLimitReached,
        }
    }
}

impl fmt::Display for OutcomeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            OutcomeKind::Completed => "completed",
            OutcomeKind::Livelocked => "livelocked",
            OutcomeKind::TickLimitReached => "tick limit",
        };
        f.pad(label)
    }
}

/// One line of a comparison table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComparisonRow {
    pub algorithm: String,
    pub outcome: OutcomeKind,
    pub total_ticks: u64,
    pub average_waiting: f64,
    pub average_turnaround: f64,
    pub completion_order: Vec<String>,
}

impl ComparisonRow {
    pub fn from_outcome(outcome: &RunOutcome) -> Self {
        let summary: &RunSummary = outcome.summary();
        Self {
            algorithm: summary.algorithm.clone(),
            outcome: OutcomeKind::of(outcome),
            total_ticks: summary.total_ticks,
            average_waiting: summary.average_waiting,
            average_turnaround: summary.average_turnaround,
            completion_order: summary.completion_order.clone(),
        }
    }
}
