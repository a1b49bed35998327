//! Hardware-free single-axis motion stage driver.
//!
//! Implements the [`Motion`] state machine over a small text protocol:
//! `HOME`, `LOOP CLOSE`, `POS?`, `POS <target>`. The simulated instrument
//! keeps its own position so that a commanded move is observable through a
//! subsequent query, the way a real controller would report it.

use crate::connection::ConnectParams;
use crate::core::{Device, DeviceCore, Motion};
use crate::error::{DeviceError, DeviceResult};
use crate::reporter::Reporter;
use crate::transport::MockTransport;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

const DEFAULT_LOWER_LIMIT: f64 = 0.0;
const DEFAULT_UPPER_LIMIT: f64 = 100.0;

/// Simulated motion stage implementing the [`Motion`] contract.
pub struct MockStage {
    core: DeviceCore,
    homed: AtomicBool,
    closed_loop: AtomicBool,
    limits: Mutex<(f64, f64)>,
}

impl MockStage {
    /// New stage with the default reporter and limits `[0, 100]`.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            core: DeviceCore::new(name),
            homed: AtomicBool::new(false),
            closed_loop: AtomicBool::new(false),
            limits: Mutex::new((DEFAULT_LOWER_LIMIT, DEFAULT_UPPER_LIMIT)),
        }
    }

    /// New stage with an injected reporting sink.
    pub fn with_reporter(name: impl Into<String>, reporter: Arc<dyn Reporter>) -> Self {
        Self {
            core: DeviceCore::new(name).with_reporter(reporter),
            homed: AtomicBool::new(false),
            closed_loop: AtomicBool::new(false),
            limits: Mutex::new((DEFAULT_LOWER_LIMIT, DEFAULT_UPPER_LIMIT)),
        }
    }

    /// Simulated controller link: tracks its own position and answers the
    /// stage command vocabulary.
    fn simulated_link(&self) -> MockTransport {
        let position = Arc::new(Mutex::new(0.0f64));
        MockTransport::new()
            .with_endpoint("mock-stage")
            .with_responder(move |line| {
                let mut pos = position
                    .lock()
                    .unwrap_or_else(PoisonError::into_inner);
                match line {
                    "HOME" => {
                        *pos = 0.0;
                        Some("OK".to_string())
                    }
                    "LOOP CLOSE" => Some("OK".to_string()),
                    "POS?" => Some(format!("{:.3}", *pos)),
                    _ => match line.strip_prefix("POS ") {
                        Some(target) => match target.parse::<f64>() {
                            Ok(target) => {
                                *pos = target;
                                Some("OK".to_string())
                            }
                            Err(_) => Some("ERR".to_string()),
                        },
                        None => Some("ERR".to_string()),
                    },
                }
            })
    }

    fn command_expecting_ok(&self, command: &str, args: &[&str]) -> DeviceResult<()> {
        self.send_command(command, args)?;
        let reply = self.read_reply()?;
        if reply.trim() == "OK" {
            Ok(())
        } else {
            Err(self.core.report_failure(
                DeviceError::Driver(format!("controller rejected '{command}': '{reply}'")),
                "command failed",
            ))
        }
    }

    fn require_connected(&self) -> DeviceResult<()> {
        if self.is_connected() {
            return Ok(());
        }
        let e = DeviceError::NotConnected;
        self.core
            .status_register()
            .report_error(e.code(), format!("{}: {e}", self.name()));
        Err(e)
    }

    fn current_limits(&self) -> (f64, f64) {
        *self.limits.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Device for MockStage {
    fn name(&self) -> &str {
        self.core.name()
    }

    fn core(&self) -> &DeviceCore {
        &self.core
    }

    /// Validates the endpoint parameters, then attaches the simulated link
    /// instead of dialing them. A fresh connection starts not homed, open
    /// loop.
    fn connect(&self, params: &ConnectParams) -> DeviceResult<()> {
        params
            .validate()
            .map_err(|e| self.core.report_failure(e, "connect rejected"))?;
        self.core.connect_with(Box::new(self.simulated_link()))?;
        self.homed.store(false, Ordering::SeqCst);
        self.closed_loop.store(false, Ordering::SeqCst);
        Ok(())
    }

    fn disconnect(&self) -> DeviceResult<()> {
        self.core.disconnect()?;
        self.homed.store(false, Ordering::SeqCst);
        self.closed_loop.store(false, Ordering::SeqCst);
        Ok(())
    }
}

impl Motion for MockStage {
    fn home(&self) -> DeviceResult<()> {
        self.require_connected()?;
        self.command_expecting_ok("HOME", &[])?;
        self.homed.store(true, Ordering::SeqCst);
        self.core
            .status_register()
            .report_info(format!("{}: homed", self.name()));
        Ok(())
    }

    fn is_homed(&self) -> bool {
        self.homed.load(Ordering::SeqCst)
    }

    fn close_loop(&self) -> DeviceResult<()> {
        self.require_connected()?;
        if !self.is_homed() {
            let e = DeviceError::NotHomed;
            self.core
                .status_register()
                .report_error(e.code(), format!("{}: cannot close loop: {e}", self.name()));
            return Err(e);
        }
        self.command_expecting_ok("LOOP", &["CLOSE"])?;
        self.closed_loop.store(true, Ordering::SeqCst);
        self.core
            .status_register()
            .report_info(format!("{}: closed loop", self.name()));
        Ok(())
    }

    fn is_closed_loop(&self) -> bool {
        self.closed_loop.load(Ordering::SeqCst)
    }

    fn position(&self) -> DeviceResult<f64> {
        self.require_connected()?;
        self.send_command("POS?", &[])?;
        let reply = self.read_reply()?;
        let trimmed = reply.trim();
        trimmed.parse::<f64>().map_err(|_| {
            self.core.report_failure(
                DeviceError::Driver(format!("malformed position reply '{trimmed}'")),
                "position query failed",
            )
        })
    }

    fn set_position(&self, target: f64) -> DeviceResult<()> {
        self.require_connected()?;
        if !self.is_closed_loop() {
            let e = DeviceError::NotClosedLoop;
            self.core.status_register().report_error(
                e.code(),
                format!("{}: cannot move to {target}: {e}", self.name()),
            );
            return Err(e);
        }
        let (lower, upper) = self.current_limits();
        if target < lower || target > upper {
            let e = DeviceError::OutOfRange {
                value: target,
                lower,
                upper,
            };
            self.core
                .status_register()
                .report_error(e.code(), format!("{}: {e}", self.name()));
            return Err(e);
        }
        self.command_expecting_ok("POS", &[&format!("{target}")])?;
        self.core
            .status_register()
            .report_info(format!("{}: moved to {target}", self.name()));
        Ok(())
    }

    fn limits(&self) -> DeviceResult<(f64, f64)> {
        self.require_connected()?;
        Ok(self.current_limits())
    }

    fn set_limits(&self, lower: f64, upper: f64) -> DeviceResult<()> {
        if lower > upper {
            let e = DeviceError::InvalidParams(format!(
                "lower limit {lower} exceeds upper limit {upper}"
            ));
            self.core
                .status_register()
                .report_error(e.code(), format!("{}: {e}", self.name()));
            return Err(e);
        }
        *self.limits.lock().unwrap_or_else(PoisonError::into_inner) = (lower, upper);
        self.core
            .status_register()
            .report_info(format!("{}: limits set to [{lower}, {upper}]", self.name()));
        Ok(())
    }
}
