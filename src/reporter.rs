//! Pluggable reporting sink for status changes.
//!
//! The core emits a message to an injected [`Reporter`] on every status
//! change. Callers choose the sink at construction time; the core never builds
//! console or file backends itself. The default [`LogReporter`] forwards to
//! the `log` facade so deployments pick a backend the usual way
//! (`env_logger`, syslog, capture buffers, ...).

use std::fmt;
use std::sync::Mutex;

/// Severity of a reported message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportLevel {
    /// Developer-facing detail (command traffic, state transitions).
    Debug,
    /// Normal operational events.
    Info,
    /// Non-fatal anomalies (e.g. redundant disconnect).
    Warning,
    /// Operation failures.
    Error,
}

impl fmt::Display for ReportLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ReportLevel::Debug => "DEBUG",
            ReportLevel::Info => "INFO",
            ReportLevel::Warning => "WARNING",
            ReportLevel::Error => "ERROR",
        };
        f.write_str(s)
    }
}

/// A sink for status messages.
///
/// Implementations must be cheap to call and must not block on I/O longer
/// than a logging backend would; the core calls this while reporting every
/// operation outcome.
pub trait Reporter: Send + Sync {
    /// Emit one message at the given level.
    fn emit(&self, level: ReportLevel, message: &str);
}

/// Default reporter forwarding to the `log` facade.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogReporter;

impl Reporter for LogReporter {
    fn emit(&self, level: ReportLevel, message: &str) {
        match level {
            ReportLevel::Debug => log::debug!("{message}"),
            ReportLevel::Info => log::info!("{message}"),
            ReportLevel::Warning => log::warn!("{message}"),
            ReportLevel::Error => log::error!("{message}"),
        }
    }
}

/// Reporter that records every emitted message, for test verification.
#[derive(Debug, Default)]
pub struct MemoryReporter {
    records: Mutex<Vec<(ReportLevel, String)>>,
}

impl MemoryReporter {
    /// Create an empty capturing reporter.
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of everything emitted so far.
    pub fn records(&self) -> Vec<(ReportLevel, String)> {
        self.records
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .clone()
    }

    /// Whether any record at `level` contains `needle`.
    pub fn contains(&self, level: ReportLevel, needle: &str) -> bool {
        self.records()
            .iter()
            .any(|(l, m)| *l == level && m.contains(needle))
    }
}

impl Reporter for MemoryReporter {
    fn emit(&self, level: ReportLevel, message: &str) {
        self.records
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .push((level, message.to_string()));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn memory_reporter_captures_in_order() {
        let reporter = MemoryReporter::new();
        reporter.emit(ReportLevel::Info, "connected");
        reporter.emit(ReportLevel::Error, "send failed");

        let records = reporter.records();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0], (ReportLevel::Info, "connected".to_string()));
        assert!(reporter.contains(ReportLevel::Error, "send failed"));
        assert!(!reporter.contains(ReportLevel::Warning, "send failed"));
    }

    #[test]
    fn levels_display_uppercase() {
        assert_eq!(ReportLevel::Warning.to_string(), "WARNING");
        assert_eq!(ReportLevel::Debug.to_string(), "DEBUG");
    }
}
