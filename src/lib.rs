//! # Device Core
//!
//! A hardware-device abstraction layer: a small hierarchy of contracts that
//! any physical instrument driver must satisfy, plus the shared plumbing for
//! connection lifecycle, thread-safe command dispatch, and status/error
//! reporting. It governs exactly one device's connection and one outstanding
//! command at a time; discovery, capability negotiation, and multi-device
//! orchestration belong to higher layers.
//!
//! ## Crate Structure
//!
//! - **`core`**: The [`Device`](core::Device) / [`Sensor`](core::Sensor) /
//!   [`Motion`](core::Motion) contract hierarchy and the shared
//!   [`DeviceCore`](core::DeviceCore) every driver embeds.
//! - **`connection`**: Connection parameters as a tagged union
//!   ([`ConnectParams`](connection::ConnectParams)) plus the observable
//!   connected flag.
//! - **`channel`**: The mutually exclusive command send / reply receive cycle
//!   against one transport handle.
//! - **`status`**: The last `(code, message)` status pair per device, mirrored
//!   to a pluggable reporter on every change.
//! - **`reporter`**: The injected reporting sink; defaults to the `log`
//!   facade.
//! - **`transport`**: Byte transports (TCP, serial behind the
//!   `instrument_serial` feature, and a scripted mock for tests).
//! - **`config`**: TOML-backed settings with defaults and validation.
//! - **`error`**: The [`DeviceError`](error::DeviceError) enum and its stable
//!   status codes.
//! - **`devices`**: Hardware-free reference drivers exercising the contracts.
//!
//! ## Concurrency model
//!
//! Multi-threaded shared state, not cooperative scheduling: operations run on
//! caller threads and the only blocking is transport I/O. The command
//! channel's mutex serializes sends, reads, and disconnect's handle release;
//! a lifecycle mutex in [`DeviceCore`](core::DeviceCore) serializes the
//! connect/disconnect transitions themselves. There are no retries and no
//! cancellation beyond the fixed read timeout.

pub mod channel;
pub mod config;
pub mod connection;
pub mod core;
pub mod devices;
pub mod error;
pub mod reporter;
pub mod status;
pub mod transport;

pub use crate::channel::CommandChannel;
pub use crate::config::{Settings, TimeoutSettings};
pub use crate::connection::{ConnectParams, ConnectionState};
pub use crate::core::{Device, DeviceCore, Motion, Sensor, Value};
pub use crate::error::{DeviceError, DeviceResult};
pub use crate::reporter::{LogReporter, MemoryReporter, ReportLevel, Reporter};
pub use crate::status::{StatusPair, StatusRegister};
pub use crate::transport::{MockTransport, Transport, TransportProbe};
