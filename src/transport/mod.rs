//! Byte transports used to reach physical devices.
//!
//! A [`Transport`] is the narrow interface the command channel writes to and
//! reads from: raw bytes in, raw bytes out, no framing, no interpretation.
//! Concrete kinds:
//!
//! - [`TcpTransport`]: stream socket via `std::net::TcpStream`.
//! - [`SerialTransport`]: RS-232/USB-serial via the `serialport` crate,
//!   behind the `instrument_serial` feature.
//! - [`MockTransport`]: scripted in-memory transport for tests and
//!   hardware-free drivers.
//!
//! Transports own their read timeout, configured at open time; a read that
//! produces no data before the timeout fails with
//! `std::io::ErrorKind::TimedOut` (or `WouldBlock` on some platforms), which
//! the channel maps to a typed read-timeout error.

use crate::connection::ConnectParams;
use crate::error::DeviceResult;
use std::io;
use std::time::Duration;

pub mod mock;
#[cfg(feature = "instrument_serial")]
pub mod serial;
pub mod tcp;

pub use mock::{MockTransport, TransportProbe};
#[cfg(feature = "instrument_serial")]
pub use serial::SerialTransport;
pub use tcp::TcpTransport;

/// A raw byte channel to one physical device.
///
/// Implementations are not required to be safe for interleaved or concurrent
/// access; the command channel serializes every call under its lock.
pub trait Transport: Send {
    /// Transmit `bytes` in full. May block on backpressure.
    fn send(&mut self, bytes: &[u8]) -> io::Result<()>;

    /// Read up to `max_len` bytes, blocking no longer than the transport's
    /// configured read timeout. Returns whatever arrived, possibly less than
    /// `max_len`; never returns an empty buffer on success.
    fn recv(&mut self, max_len: usize) -> io::Result<Vec<u8>>;

    /// Release the underlying handle. Safe to call once; the transport is
    /// unusable afterwards.
    fn close(&mut self);

    /// Endpoint description for status messages, e.g. `127.0.0.1:9999`.
    fn describe(&self) -> String;
}

/// Open a transport for the given parameters.
///
/// Serial support requires the `instrument_serial` feature; without it,
/// serial parameters fail with `UnsupportedTransport` and no state changes.
pub fn open_transport(
    params: &ConnectParams,
    connect_timeout: Duration,
    read_timeout: Duration,
) -> DeviceResult<Box<dyn Transport>> {
    match params {
        ConnectParams::Tcp { host, port } => Ok(Box::new(TcpTransport::open(
            host,
            *port,
            connect_timeout,
            read_timeout,
        )?)),
        #[cfg(feature = "instrument_serial")]
        ConnectParams::Serial { path, baud_rate } => Ok(Box::new(SerialTransport::open(
            path,
            *baud_rate,
            read_timeout,
        )?)),
        #[cfg(not(feature = "instrument_serial"))]
        ConnectParams::Serial { .. } => Err(crate::error::DeviceError::UnsupportedTransport(
            "serial (rebuild with --features instrument_serial)".into(),
        )),
    }
}

/// Whether an I/O error represents a read timeout rather than a dead link.
pub(crate) fn is_timeout(err: &io::Error) -> bool {
    matches!(
        err.kind(),
        io::ErrorKind::TimedOut | io::ErrorKind::WouldBlock
    )
}
