//! Last-status register shared by every device.
//!
//! A [`StatusRegister`] holds the most recent `(code, message)` pair for a
//! device. Code `0` means success or info, negative codes are errors, and
//! positive codes are reserved. The pair is always overwritten atomically;
//! no history is kept. Callers needing history must wrap this externally.
//!
//! Every update is also emitted to the injected
//! [`Reporter`](crate::reporter::Reporter), so the register doubles as the
//! single choke point for device logging.

use crate::reporter::{LogReporter, ReportLevel, Reporter};
use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex, PoisonError};

/// The `(code, message)` tuple representing the most recent outcome of any
/// device operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusPair {
    /// 0 = success/info, negative = error, positive reserved.
    pub code: i32,
    /// Human-readable description of the last outcome.
    pub message: String,
}

impl StatusPair {
    /// Neutral initial status: `(0, "")`.
    pub fn neutral() -> Self {
        Self {
            code: 0,
            message: String::new(),
        }
    }
}

/// Holds the last status pair for a device and mirrors updates to a reporter.
pub struct StatusRegister {
    current: Mutex<StatusPair>,
    reporter: Arc<dyn Reporter>,
}

impl Default for StatusRegister {
    fn default() -> Self {
        Self::new(Arc::new(LogReporter))
    }
}

impl StatusRegister {
    /// Create a register in the neutral state with the given reporting sink.
    pub fn new(reporter: Arc<dyn Reporter>) -> Self {
        Self {
            current: Mutex::new(StatusPair::neutral()),
            reporter,
        }
    }

    /// Overwrite the status pair and emit at the level implied by the code
    /// (negative = error, otherwise info).
    pub fn report(&self, code: i32, message: impl Into<String>) {
        let level = if code < 0 {
            ReportLevel::Error
        } else {
            ReportLevel::Info
        };
        self.set(code, message.into(), level);
    }

    /// Record a success/info status with code 0.
    pub fn report_info(&self, message: impl Into<String>) {
        self.set(0, message.into(), ReportLevel::Info);
    }

    /// Record a non-fatal anomaly. Warnings keep code 0 so a subsequent
    /// `get()` still reads as a non-failing outcome.
    pub fn report_warning(&self, message: impl Into<String>) {
        self.set(0, message.into(), ReportLevel::Warning);
    }

    /// Record a failure. `code` must be negative.
    pub fn report_error(&self, code: i32, message: impl Into<String>) {
        debug_assert!(code < 0, "error status codes must be negative");
        self.set(code, message.into(), ReportLevel::Error);
    }

    /// Emit a debug message without touching the stored pair.
    pub fn trace(&self, message: &str) {
        self.reporter.emit(ReportLevel::Debug, message);
    }

    /// The most recent status pair.
    pub fn get(&self) -> StatusPair {
        self.current
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn set(&self, code: i32, message: String, level: ReportLevel) {
        // Code and message change together, under one lock acquisition.
        {
            let mut current = self
                .current
                .lock()
                .unwrap_or_else(PoisonError::into_inner);
            current.code = code;
            current.message.clone_from(&message);
        }
        self.reporter.emit(level, &message);
    }
}

impl std::fmt::Debug for StatusRegister {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StatusRegister")
            .field("current", &self.get())
            .finish()
    }
}
