//! JSON-lines rendering

use crate::{ComparisonRow, RenderError, Renderer};
use serde::Serialize;
use sim_scheduler::{HaltReport, RunOutcome, RunSummary, TickSnapshot};

/// One JSON object per call, tagged with a `type` field
#[derive(Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum Record<'a> {
    Tick(&'a TickSnapshot),
    Completed(&'a RunSummary),
    Livelocked(&'a HaltReport),
    TickLimitReached(&'a HaltReport),
    Comparison { runs: &'a [ComparisonRow] },
}

/// Machine-readable renderer
///
/// The summary is always part of the outcome record, so `show_summary` has
/// no effect.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonRenderer;

impl JsonRenderer {
    pub fn new() -> Self {
        Self
    }
}

impl Renderer for JsonRenderer {
    fn render_tick(&self, snapshot: &TickSnapshot) -> Result<String, RenderError> {
        Ok(serde_json::to_string(&Record::Tick(snapshot))?)
    }

    fn render_outcome(
        &self,
        outcome: &RunOutcome,
        _show_summary: bool,
    ) -> Result<String, RenderError> {
        let record = match outcome {
            RunOutcome::Completed(summary) => Record::Completed(summary),
            RunOutcome::Livelocked(report) => Record::Livelocked(report),
            RunOutcome::TickLimitReached(report) => Record::TickLimitReached(report),
        };
        Ok(serde_json::to_string(&record)?)
    }

    fn render_comparison(&self, rows: &[ComparisonRow]) -> Result<String, RenderError> {
        Ok(serde_json::to_string(&Record::Comparison { runs: rows })?)
    }
}
