//! Plain-text rendering

use crate::{ComparisonRow, OutcomeKind, RenderError, Renderer};
use sim_scheduler::{HaltReport, RunOutcome, RunSummary, TickSnapshot};
use std::fmt::Write;

/// Human-readable renderer
///
/// Per-tick output lists the free resource counts, both queues and the
/// processor occupant:
///
/// ```text
/// Tick 0
/// R1: 0 R2: 0 R3: 1
/// Ready queue: [B, C]
/// Waiting queue: []
/// Processor state: Running task: A
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct TextRenderer;

impl TextRenderer {
    pub fn new() -> Self {
        Self
    }

    fn state_lines(
        out: &mut String,
        free: &resources::ResourceCounts,
        ready: &[String],
        waiting: &[String],
        running: Option<&str>,
    ) {
        let _ = writeln!(out, "{}", free);
        let _ = writeln!(out, "Ready queue: [{}]", ready.join(", "));
        let _ = writeln!(out, "Waiting queue: [{}]", waiting.join(", "));
        match running {
            Some(name) => {
                let _ = write!(out, "Processor state: Running task: {}", name);
            }
            None => {
                let _ = write!(out, "Processor state: Idle");
            }
        }
    }

    fn halt_lines(out: &mut String, headline: String, report: &HaltReport) {
        let _ = writeln!(out, "{}", headline);
        Self::state_lines(
            out,
            &report.free,
            &report.ready,
            &report.waiting,
            report.running.as_deref(),
        );
    }

    /// Renders the per-task statistics table
    pub fn summary_table(summary: &RunSummary) -> String {
        let mut out = String::new();
        let width = summary
            .tasks
            .iter()
            .map(|t| t.name.len())
            .max()
            .unwrap_or(0)
            .max(4);

        let _ = writeln!(
            out,
            "Completion order: [{}]",
            summary.completion_order.join(", ")
        );
        let _ = writeln!(
            out,
            "{:<width$}  Kind  Duration  Waited  Completed  Turnaround",
            "Task",
            width = width
        );
        for task in &summary.tasks {
            let completed = task
                .completion_tick
                .map(|t| t.to_string())
                .unwrap_or_else(|| "-".to_string());
            let turnaround = task
                .turnaround
                .map(|t| t.to_string())
                .unwrap_or_else(|| "-".to_string());
            let _ = writeln!(
                out,
                "{:<width$}  {:<4}  {:>8}  {:>6}  {:>9}  {:>10}",
                task.name,
                task.kind.to_string(),
                task.total_duration,
                task.waiting_time,
                completed,
                turnaround,
                width = width
            );
        }
        let _ = writeln!(out, "Average waiting time: {:.2}", summary.average_waiting);
        let _ = write!(out, "Average turnaround time: {:.2}", summary.average_turnaround);
        out
    }
}

impl Renderer for TextRenderer {
    fn render_tick(&self, snapshot: &TickSnapshot) -> Result<String, RenderError> {
        let mut out = String::new();
        let _ = writeln!(out, "Tick {}", snapshot.tick);
        Self::state_lines(
            &mut out,
            &snapshot.free,
            &snapshot.ready,
            &snapshot.waiting,
            snapshot.running.as_deref(),
        );
        Ok(out)
    }

    fn render_outcome(
        &self,
        outcome: &RunOutcome,
        show_summary: bool,
    ) -> Result<String, RenderError> {
        let mut out = String::new();
        match outcome {
            RunOutcome::Completed(summary) => {
                let _ = write!(
                    out,
                    "All tasks completed in {} ticks ({})",
                    summary.total_ticks, summary.algorithm
                );
            }
            RunOutcome::Livelocked(report) => {
                let headline = format!(
                    "Livelock detected at tick {}: no progress for {} ticks",
                    report.tick, report.stalled_ticks
                );
                Self::halt_lines(&mut out, headline, report);
            }
            RunOutcome::TickLimitReached(report) => {
                let headline = format!("Tick limit reached at tick {}", report.tick);
                Self::halt_lines(&mut out, headline, report);
            }
        }

        if show_summary {
            out.push('\n');
            out.push_str(&Self::summary_table(outcome.summary()));
        }
        Ok(out)
    }

    fn render_comparison(&self, rows: &[ComparisonRow]) -> Result<String, RenderError> {
        let mut out = String::new();
        let width = rows
            .iter()
            .map(|r| r.algorithm.len())
            .max()
            .unwrap_or(0)
            .max(9);

        let _ = write!(
            out,
            "{:<width$}  {:<10}  {:>5}  {:>8}  {:>14}  Order",
            "Algorithm",
            "Outcome",
            "Ticks",
            "Avg wait",
            "Avg turnaround",
            width = width
        );
        for row in rows {
            let _ = write!(
                out,
                "\n{:<width$}  {:<10}  {:>5}  {:>8.2}  {:>14.2}  [{}]",
                row.algorithm,
                row.outcome,
                row.total_ticks,
                row.average_waiting,
                row.average_turnaround,
                row.completion_order.join(", "),
                width = width
            );
        }

        if rows.iter().any(|r| r.outcome != OutcomeKind::Completed) {
            out.push_str("\nRuns that did not complete report partial statistics.");
        }
        Ok(out)
    }
}
