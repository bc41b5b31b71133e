//! # Trace Logger
//!
//! This crate turns the scheduler's audit trail into structured log entries.
//!
//! ## Philosophy
//!
//! Logging is explicit and structured, not text-based or printf-style.
//! Entries are built from [`ScheduleEvent`]s after the fact; the logger never
//! influences a run.

use core_types::TaskId;
use serde::{Deserialize, Serialize};
use sim_scheduler::{DispatchSource, PreemptionReason, ScheduleEvent, Task};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Log level
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum LogLevel {
    /// Debug information
    Debug,
    /// Informational messages
    Info,
    /// Warnings
    Warn,
    /// Errors
    Error,
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            LogLevel::Debug => "DEBUG",
            LogLevel::Info => "INFO",
            LogLevel::Warn => "WARN",
            LogLevel::Error => "ERROR",
        };
        f.pad(label)
    }
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("Unknown log level: {0} (expected debug, info, warn or error)")]
pub struct LogLevelParseError(pub String);

impl FromStr for LogLevel {
    type Err = LogLevelParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "debug" => Ok(LogLevel::Debug),
            "info" => Ok(LogLevel::Info),
            "warn" | "warning" => Ok(LogLevel::Warn),
            "error" => Ok(LogLevel::Error),
            _ => Err(LogLevelParseError(s.to_string())),
        }
    }
}

/// A structured log entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogEntry {
    /// Log level
    pub level: LogLevel,
    /// Tick the entry refers to
    pub tick: u64,
    /// Source task (if known)
    pub source: Option<TaskId>,
    /// Log message
    pub message: String,
    /// Structured fields
    pub fields: Vec<(String, String)>,
}

impl LogEntry {
    /// Creates a new log entry
    pub fn new(level: LogLevel, tick: u64, message: String) -> Self {
        Self {
            level,
            tick,
            source: None,
            message,
            fields: Vec::new(),
        }
    }

    /// Sets the source task
    pub fn with_source(mut self, source: TaskId) -> Self {
        self.source = Some(source);
        self
    }

    /// Adds a field to the log entry
    pub fn with_field(mut self, key: impl Into<String>, value: impl ToString) -> Self {
        self.fields.push((key.into(), value.to_string()));
        self
    }

    /// Looks up a field value by key
    pub fn field(&self, key: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Builds the entry describing one audit event
    ///
    /// `tasks` is the run's task table, used to resolve names.
    pub fn from_event(event: &ScheduleEvent, tasks: &[Task]) -> Self {
        let tick = event.timestamp_ticks();
        let name = |id: TaskId| {
            tasks
                .get(id.index() as usize)
                .map(|t| t.name().to_string())
                .unwrap_or_else(|| id.to_string())
        };

        let entry = match event {
            ScheduleEvent::Dispatched { task_id, source, .. } => {
                let from = match source {
                    DispatchSource::ReadyQueue => "ready",
                    DispatchSource::WaitingQueue => "waiting",
                    DispatchSource::WaitingSweep => "sweep",
                };
                LogEntry::new(LogLevel::Info, tick, format!("{} dispatched", name(*task_id)))
                    .with_field("from", from)
            }
            ScheduleEvent::AcquisitionDenied {
                task_id, missing, ..
            } => {
                let missing: Vec<String> = missing.iter().map(|r| r.to_string()).collect();
                LogEntry::new(
                    LogLevel::Warn,
                    tick,
                    format!("{} could not acquire resources", name(*task_id)),
                )
                .with_field("missing", missing.join(","))
            }
            ScheduleEvent::WaitRetryFailed { task_id, .. } => LogEntry::new(
                LogLevel::Debug,
                tick,
                format!("{} still waiting", name(*task_id)),
            ),
            ScheduleEvent::Executed {
                task_id, remaining, ..
            } => LogEntry::new(LogLevel::Debug, tick, format!("{} executed", name(*task_id)))
                .with_field("remaining", remaining),
            ScheduleEvent::Preempted {
                task_id, reason, ..
            } => {
                let reason = match reason {
                    PreemptionReason::QuantumExpired => "quantum expired",
                };
                LogEntry::new(LogLevel::Info, tick, format!("{} preempted", name(*task_id)))
                    .with_field("reason", reason)
            }
            ScheduleEvent::Completed {
                task_id,
                execution_time,
                waiting_time,
                ..
            } => LogEntry::new(LogLevel::Info, tick, format!("{} completed", name(*task_id)))
                .with_field("executed", execution_time)
                .with_field("waited", waiting_time),
            ScheduleEvent::LivelockDetected { stalled_ticks, .. } => LogEntry::new(
                LogLevel::Error,
                tick,
                "livelock detected".to_string(),
            )
            .with_field("stalled", stalled_ticks),
        };

        match event.task_id() {
            Some(task_id) => entry.with_source(task_id),
            None => entry,
        }
    }
}

impl fmt::Display for LogEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[tick {:>4}] {:<5} {}", self.tick, self.level, self.message)?;
        for (key, value) in &self.fields {
            write!(f, " {}={}", key, value)?;
        }
        Ok(())
    }
}

/// Collects log entries at or above a minimum level
#[derive(Debug, Clone)]
pub struct EventLogger {
    min_level: LogLevel,
    entries: Vec<LogEntry>,
}

impl EventLogger {
    pub fn new(min_level: LogLevel) -> Self {
        Self {
            min_level,
            entries: Vec::new(),
        }
    }

    pub fn min_level(&self) -> LogLevel {
        self.min_level
    }

    /// Records an entry; returns false if it was filtered out
    pub fn log(&mut self, entry: LogEntry) -> bool {
        if entry.level < self.min_level {
            return false;
        }
        self.entries.push(entry);
        true
    }

    /// Records every event in order
    pub fn record_events(&mut self, events: &[ScheduleEvent], tasks: &[Task]) {
        for event in events {
            self.log(LogEntry::from_event(event, tasks));
        }
    }

    pub fn entries(&self) -> &[LogEntry] {
        &self.entries
    }

    /// Removes and returns all recorded entries
    pub fn drain(&mut self) -> Vec<LogEntry> {
        std::mem::take(&mut self.entries)
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }
}

impl Default for EventLogger {
    fn default() -> Self {
        Self::new(LogLevel::Info)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core_types::{ResourceKind, TaskKind};
    use resources::ResourceCounts;
    use sim_scheduler::{AlgorithmChoice, Scheduler, TaskSpec};

    #[test]
    fn test_log_level_ordering() {
        assert!(LogLevel::Debug < LogLevel::Info);
        assert!(LogLevel::Info < LogLevel::Warn);
        assert!(LogLevel::Warn < LogLevel::Error);
    }

    #[test]
    fn test_log_level_parse() {
        assert_eq!("DEBUG".parse::<LogLevel>(), Ok(LogLevel::Debug));
        assert_eq!("warning".parse::<LogLevel>(), Ok(LogLevel::Warn));
        assert!("verbose".parse::<LogLevel>().is_err());
    }

    #[test]
    fn test_log_entry_with_fields() {
        let entry = LogEntry::new(LogLevel::Info, 3, "test".to_string())
            .with_source(TaskId::new(1))
            .with_field("key1", "value1")
            .with_field("key2", 7);

        assert_eq!(entry.source, Some(TaskId::new(1)));
        assert_eq!(entry.fields.len(), 2);
        assert_eq!(entry.field("key2"), Some("7"));
        assert_eq!(entry.field("missing"), None);
        assert_eq!(entry.to_string(), "[tick    3] INFO  test key1=value1 key2=7");
    }

    #[test]
    fn test_denied_event_names_missing_resources() {
        let event = ScheduleEvent::AcquisitionDenied {
            task_id: TaskId::new(9),
            missing: vec![ResourceKind::R1, ResourceKind::R3],
            timestamp_ticks: 4,
        };
        let entry = LogEntry::from_event(&event, &[]);

        assert_eq!(entry.level, LogLevel::Warn);
        assert_eq!(entry.tick, 4);
        assert_eq!(entry.message, "Task(#9) could not acquire resources");
        assert_eq!(entry.field("missing"), Some("R1,R3"));
    }

    #[test]
    fn test_logger_filters_below_min_level() {
        let mut logger = EventLogger::new(LogLevel::Warn);
        assert!(!logger.log(LogEntry::new(LogLevel::Info, 0, "quiet".to_string())));
        assert!(logger.log(LogEntry::new(LogLevel::Error, 0, "loud".to_string())));
        assert_eq!(logger.len(), 1);

        let drained = logger.drain();
        assert_eq!(drained[0].message, "loud");
        assert!(logger.is_empty());
    }

    #[test]
    fn test_records_scheduler_audit_log() {
        let mut run = Scheduler::initialize_run(
            ResourceCounts::new(1, 1, 1),
            vec![TaskSpec::new("A", TaskKind::X, 1)],
            AlgorithmChoice::Fcfs,
            None,
        )
        .unwrap();
        run.run_to_completion().unwrap();

        let mut logger = EventLogger::new(LogLevel::Info);
        logger.record_events(run.audit_log(), run.tasks());

        let messages: Vec<&str> = logger.entries().iter().map(|e| e.message.as_str()).collect();
        assert_eq!(messages, vec!["A dispatched", "A completed"]);
        assert_eq!(logger.entries()[1].field("executed"), Some("1"));

        let mut verbose = EventLogger::new(LogLevel::Debug);
        verbose.record_events(run.audit_log(), run.tasks());
        assert_eq!(verbose.len(), 3);
    }

    #[test]
    fn test_entry_serializes() {
        let entry = LogEntry::new(LogLevel::Error, 2, "livelock detected".to_string())
            .with_field("stalled", 3);
        let json = serde_json::to_value(&entry).unwrap();
        assert_eq!(json["level"], "Error");
        assert_eq!(json["tick"], 2);
    }
}
