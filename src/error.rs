//! Custom error types for the device abstraction layer.
//!
//! This module defines the primary error type, `DeviceError`, used across the
//! crate. Using the `thiserror` crate, it provides a centralized and consistent
//! way to handle the different kinds of failures a device driver can hit, from
//! transport I/O problems to state-machine violations.
//!
//! Every variant carries a stable negative status code (see
//! [`DeviceError::code`]) so that failures can be mirrored into the
//! [`StatusRegister`](crate::status::StatusRegister) as a `(code, message)`
//! pair while still being surfaced to the caller as a typed result.

use std::time::Duration;
use thiserror::Error;

/// Convenience alias for results using the crate error type.
pub type DeviceResult<T> = std::result::Result<T, DeviceError>;

/// Errors produced by device lifecycle, command exchange, and domain operations.
#[derive(Error, Debug)]
pub enum DeviceError {
    /// An operation required an active connection and there was none.
    #[error("Device is not connected")]
    NotConnected,

    /// `connect` was refused because the device is already connected.
    ///
    /// The built-in [`DeviceCore`](crate::core::DeviceCore) treats re-entrant
    /// connects as idempotent success, so it never returns this variant; it
    /// exists for drivers that commit to the rejecting policy instead.
    #[error("Device is already connected")]
    AlreadyConnected,

    /// Connection parameters failed validation before the transport was touched.
    #[error("Invalid connection parameters: {0}")]
    InvalidParams(String),

    /// The requested transport kind is not supported by this build.
    #[error("Unsupported transport: {0}")]
    UnsupportedTransport(String),

    /// No reply arrived within the configured read timeout.
    #[error("Read timed out after {0:?}")]
    ReadTimeout(Duration),

    /// A telemetry item key matched nothing the driver knows about.
    #[error("Unknown telemetry item '{0}'")]
    UnknownItem(String),

    /// A motion command required a homed axis.
    #[error("Axis has not been homed")]
    NotHomed,

    /// A motion command required closed-loop mode.
    #[error("Axis is not in closed-loop mode")]
    NotClosedLoop,

    /// A commanded position fell outside the configured soft limits.
    #[error("Position {value} outside limits [{lower}, {upper}]")]
    OutOfRange {
        /// The commanded position.
        value: f64,
        /// The lower soft limit.
        lower: f64,
        /// The upper soft limit.
        upper: f64,
    },

    /// A driver-specific failure, e.g. a malformed reply from the instrument.
    #[error("Driver error: {0}")]
    Driver(String),

    /// Configuration file parsing or lookup failure.
    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    /// Transport-level I/O failure. Receiving this forces the connection
    /// state to disconnected (the link is assumed dead).
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl DeviceError {
    /// Stable status code for this error, always negative.
    ///
    /// These codes are what the [`StatusRegister`](crate::status::StatusRegister)
    /// records alongside the error message.
    pub fn code(&self) -> i32 {
        match self {
            DeviceError::NotConnected => -1,
            DeviceError::InvalidParams(_) => -2,
            DeviceError::UnsupportedTransport(_) => -3,
            DeviceError::ReadTimeout(_) => -4,
            DeviceError::UnknownItem(_) => -5,
            DeviceError::NotHomed => -6,
            DeviceError::NotClosedLoop => -7,
            DeviceError::OutOfRange { .. } => -8,
            DeviceError::Io(_) => -9,
            DeviceError::Config(_) => -10,
            DeviceError::Driver(_) => -11,
            DeviceError::AlreadyConnected => -12,
        }
    }

    /// Whether this error indicates the transport link itself is dead.
    pub fn is_link_failure(&self) -> bool {
        matches!(self, DeviceError::Io(_))
    }
}
