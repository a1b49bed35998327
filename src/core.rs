//! Core traits and shared plumbing for device drivers.
//!
//! This module defines the contract hierarchy every concrete driver
//! implements:
//!
//! - [`Device`]: connection lifecycle, serialized command exchange, status
//!   introspection. Most methods have default implementations delegating to
//!   the driver's embedded [`DeviceCore`], so a driver overrides only what it
//!   customizes.
//! - [`Sensor`]: adds atomic telemetry retrieval ([`Sensor::atomic_value`]).
//! - [`Motion`]: adds the homing / closed-loop / position state machine.
//!
//! [`DeviceCore`] is the shared plumbing a driver owns exactly one of: one
//! [`ConnectionState`], one [`StatusRegister`], one [`CommandChannel`]. It
//! enforces the lifecycle invariants (idempotent connect and disconnect,
//! validation before transport access, fail-safe teardown on I/O errors) so
//! drivers do not re-implement them.

use crate::channel::{join_command, CommandChannel};
use crate::config::Settings;
use crate::connection::{ConnectParams, ConnectionState};
use crate::error::{DeviceError, DeviceResult};
use crate::reporter::Reporter;
use crate::status::{StatusPair, StatusRegister};
use crate::transport::{self, Transport};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

/// A single telemetry value retrieved in one request/response exchange.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    /// Integer reading, e.g. a counter.
    Int(i64),
    /// Floating-point reading, e.g. a temperature.
    Float(f64),
    /// Textual reading, e.g. an identification string.
    Text(String),
}

impl Value {
    /// Numeric view of the value, if it has one.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Float(v) => Some(*v),
            Value::Int(v) => Some(*v as f64),
            Value::Text(_) => None,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Float(v) => write!(f, "{v}"),
            Value::Int(v) => write!(f, "{v}"),
            Value::Text(v) => f.write_str(v),
        }
    }
}

/// Shared lifecycle, command, and status plumbing for one device.
///
/// Owns exactly one connection state, one status register, and one command
/// channel. All methods take `&self`; interior mutability keeps the public
/// trait surface usable behind `Arc` from multiple threads.
pub struct DeviceCore {
    name: String,
    state: ConnectionState,
    status: StatusRegister,
    channel: CommandChannel,
    connect_timeout: Duration,
    // Serializes lifecycle transitions: the connected check, the handle
    // attach/detach, and the flag flip happen as one step. Always acquired
    // before the channel lock, never the other way around.
    lifecycle: Mutex<()>,
}

impl DeviceCore {
    /// New core with the default reporter (the `log` facade) and default
    /// timeouts.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            state: ConnectionState::new(),
            status: StatusRegister::default(),
            channel: CommandChannel::new(),
            connect_timeout: Duration::from_secs(3),
            lifecycle: Mutex::new(()),
        }
    }

    /// Build a core from [`Settings`] (name and timeouts).
    pub fn from_settings(settings: &Settings) -> Self {
        Self::new(settings.name.clone())
            .with_connect_timeout(settings.timeouts.connect_timeout())
            .with_read_timeout(settings.timeouts.read_timeout())
    }

    /// Inject a reporting sink. Call before first use; replaces the default
    /// `log`-facade reporter.
    pub fn with_reporter(mut self, reporter: Arc<dyn Reporter>) -> Self {
        self.status = StatusRegister::new(reporter);
        self
    }

    /// Set the read timeout for replies.
    pub fn with_read_timeout(mut self, timeout: Duration) -> Self {
        self.channel = std::mem::take(&mut self.channel).with_read_timeout(timeout);
        self
    }

    /// Set the timeout for establishing connections.
    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    /// Set a terminator appended to every outgoing command line.
    pub fn with_line_terminator(mut self, terminator: &str) -> Self {
        self.channel = std::mem::take(&mut self.channel).with_line_terminator(terminator);
        self
    }

    /// Device name used in status messages.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Whether the device currently holds an open transport.
    pub fn is_connected(&self) -> bool {
        self.state.is_connected()
    }

    /// The most recent status pair.
    pub fn status(&self) -> StatusPair {
        self.status.get()
    }

    /// The status register, for drivers reporting domain-specific outcomes.
    pub fn status_register(&self) -> &StatusRegister {
        &self.status
    }

    /// Validate `params`, open the matching transport, and transition to
    /// connected.
    ///
    /// Re-entrant connects are idempotent: if already connected this records
    /// a warning and returns success without opening a second transport, so
    /// handles cannot leak. Validation failures and unsupported transport
    /// kinds never mutate state.
    pub fn connect(&self, params: &ConnectParams) -> DeviceResult<()> {
        // Failures are reported after the lifecycle guard drops;
        // report_failure re-acquires it for link-failure teardown.
        let (error, context) = {
            let _lifecycle = self.lock_lifecycle();
            if self.is_connected() {
                self.status
                    .report_warning(format!("{}: already connected", self.name));
                return Ok(());
            }
            if let Err(e) = params.validate() {
                (e, "connect rejected")
            } else {
                match transport::open_transport(
                    params,
                    self.connect_timeout,
                    self.channel.read_timeout(),
                ) {
                    Ok(link) => {
                        self.finish_connect(link);
                        return Ok(());
                    }
                    Err(e) => (e, "connect failed"),
                }
            }
        };
        Err(self.report_failure(error, context))
    }

    /// Transition to connected using an already-opened transport.
    ///
    /// Used by hardware-free drivers and tests that inject a
    /// [`MockTransport`](crate::transport::MockTransport). Same idempotence
    /// policy as [`connect`](Self::connect); a redundant call drops the new
    /// handle unused.
    pub fn connect_with(&self, link: Box<dyn Transport>) -> DeviceResult<()> {
        let _lifecycle = self.lock_lifecycle();
        if self.is_connected() {
            self.status
                .report_warning(format!("{}: already connected", self.name));
            return Ok(());
        }
        self.finish_connect(link);
        Ok(())
    }

    fn lock_lifecycle(&self) -> MutexGuard<'_, ()> {
        self.lifecycle.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn finish_connect(&self, link: Box<dyn Transport>) {
        let endpoint = link.describe();
        self.channel.attach(link);
        self.state.set_connected(true);
        self.status
            .report_info(format!("Connected to {endpoint}"));
    }

    /// Release the transport and transition to disconnected.
    ///
    /// Idempotent: when already disconnected this records a warning and
    /// returns success with no side effects. The transition runs under the
    /// lifecycle lock, so it cannot race a connect; the handle release runs
    /// under the channel lock, so it cannot race an in-flight send or read,
    /// and the transport is closed exactly once.
    pub fn disconnect(&self) -> DeviceResult<()> {
        let _lifecycle = self.lock_lifecycle();
        match self.channel.detach() {
            Some(mut link) => {
                link.close();
                self.state.set_connected(false);
                self.status
                    .report_info(format!("{}: disconnected", self.name));
                Ok(())
            }
            None => {
                self.state.set_connected(false);
                self.status
                    .report_warning(format!("{}: already disconnected", self.name));
                Ok(())
            }
        }
    }

    /// Send `command` with space-joined `args` over the channel.
    ///
    /// Refused with `NotConnected` before any transport access when
    /// disconnected. The whole transmission happens under the channel lock;
    /// concurrent callers block until it is released. Returns `Ok(true)` on a
    /// completed send.
    pub fn send_command(&self, command: &str, args: &[&str]) -> DeviceResult<bool> {
        if !self.is_connected() {
            let e = DeviceError::NotConnected;
            self.status.report_error(
                e.code(),
                format!("{}: command '{command}' refused: {e}", self.name),
            );
            return Err(e);
        }
        let line = join_command(command, args);
        match self.channel.transmit(&line) {
            Ok(()) => {
                self.status
                    .trace(&format!("{}: sent '{}'", self.name, line.escape_default()));
                self.status
                    .report_info(format!("{}: sent '{line}'", self.name));
                Ok(true)
            }
            Err(e) => Err(self.report_failure(e, &format!("send '{line}' failed"))),
        }
    }

    /// Read one reply as decoded text, bounded by the read timeout.
    ///
    /// Refused with `NotConnected` when disconnected. The payload is not
    /// interpreted or framed; that is the calling driver's concern.
    pub fn read_reply(&self) -> DeviceResult<String> {
        if !self.is_connected() {
            let e = DeviceError::NotConnected;
            self.status.report_error(
                e.code(),
                format!("{}: read refused: {e}", self.name),
            );
            return Err(e);
        }
        match self.channel.receive() {
            Ok(reply) => {
                self.status
                    .trace(&format!("{}: received '{}'", self.name, reply.escape_default()));
                self.status
                    .report_info(format!("{}: reply received", self.name));
                Ok(reply)
            }
            Err(e) => Err(self.report_failure(e, "read failed")),
        }
    }

    /// Record a failure in the status register and, for transport I/O
    /// errors, assume the link is dead: drop the handle and force the state
    /// to disconnected before surfacing the error.
    pub fn report_failure(&self, error: DeviceError, context: &str) -> DeviceError {
        if error.is_link_failure() {
            let _lifecycle = self.lock_lifecycle();
            if let Some(mut link) = self.channel.detach() {
                link.close();
            }
            self.state.set_connected(false);
        }
        self.status.report_error(
            error.code(),
            format!("{}: {context}: {error}", self.name),
        );
        error
    }
}

impl fmt::Debug for DeviceCore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DeviceCore")
            .field("name", &self.name)
            .field("connected", &self.is_connected())
            .field("status", &self.status())
            .finish()
    }
}

/// Contract every hardware device driver satisfies.
///
/// Drivers expose their embedded [`DeviceCore`] through [`Device::core`];
/// every other method has a default implementation delegating to it, so a
/// driver customizes by overriding rather than re-implementing the
/// lifecycle.
pub trait Device: Send + Sync {
    /// Device name for status messages and registries.
    fn name(&self) -> &str;

    /// The shared plumbing this driver owns.
    fn core(&self) -> &DeviceCore;

    /// Establish a connection. See [`DeviceCore::connect`].
    fn connect(&self, params: &ConnectParams) -> DeviceResult<()> {
        self.core().connect(params)
    }

    /// Close the connection. See [`DeviceCore::disconnect`].
    fn disconnect(&self) -> DeviceResult<()> {
        self.core().disconnect()
    }

    /// Whether the connection is active.
    fn is_connected(&self) -> bool {
        self.core().is_connected()
    }

    /// Send a command with ordered arguments. See
    /// [`DeviceCore::send_command`].
    fn send_command(&self, command: &str, args: &[&str]) -> DeviceResult<bool> {
        self.core().send_command(command, args)
    }

    /// Read one reply. See [`DeviceCore::read_reply`].
    fn read_reply(&self) -> DeviceResult<String> {
        self.core().read_reply()
    }

    /// The most recent status pair.
    fn status(&self) -> StatusPair {
        self.core().status()
    }
}

/// A device exposing named atomic telemetry readings.
pub trait Sensor: Device {
    /// Retrieve the value of one telemetry item.
    ///
    /// Policy: refused with `NotConnected` (and an error status) before any
    /// transport access when disconnected; an unmatched key fails with
    /// `UnknownItem` and an error status; otherwise the value is returned and
    /// a success status recorded. Whether keys match exactly or by substring
    /// is up to the driver.
    fn atomic_value(&self, item: &str) -> DeviceResult<Value>;
}

/// A motion device with homing, closed-loop control, and soft limits.
///
/// State machine: `Disconnected -> Connected(NotHomed, OpenLoop) ->
/// Connected(Homed, OpenLoop) -> Connected(Homed, ClosedLoop)`. Position and
/// limits are queryable whenever connected; commanding a position requires
/// closed loop and a target within the limits.
pub trait Motion: Device {
    /// Home the axis. Requires an active connection.
    fn home(&self) -> DeviceResult<()>;

    /// Whether the axis has been homed since the last connect.
    fn is_homed(&self) -> bool;

    /// Enter closed-loop mode. Requires a homed axis.
    fn close_loop(&self) -> DeviceResult<()>;

    /// Whether closed-loop mode is active.
    fn is_closed_loop(&self) -> bool;

    /// Current position, queried from the device.
    fn position(&self) -> DeviceResult<f64>;

    /// Command a move to `target`. Requires closed loop and
    /// `lower <= target <= upper`.
    fn set_position(&self, target: f64) -> DeviceResult<()>;

    /// Current soft limits as `(lower, upper)`.
    fn limits(&self) -> DeviceResult<(f64, f64)>;

    /// Replace the soft limits.
    fn set_limits(&self, lower: f64, upper: f64) -> DeviceResult<()>;
}
