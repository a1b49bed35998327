//! Serial line transport (RS-232/USB-serial).
//!
//! Available behind the `instrument_serial` feature. Wraps the `serialport`
//! crate; the port's own timeout doubles as the transport read timeout.

use crate::transport::Transport;
use log::trace;
use serialport::SerialPort;
use std::io::{self, Read, Write};
use std::time::Duration;

/// Serial transport over a `serialport` handle.
pub struct SerialTransport {
    port: Box<dyn SerialPort>,
    endpoint: String,
}

impl SerialTransport {
    /// Open `path` at `baud_rate` with the given read timeout.
    pub fn open(path: &str, baud_rate: u32, read_timeout: Duration) -> io::Result<Self> {
        let port = serialport::new(path, baud_rate)
            .timeout(read_timeout)
            .open()
            .map_err(|e| io::Error::new(io::ErrorKind::Other, e))?;

        let endpoint = format!("{path}@{baud_rate}");
        trace!("Opened serial transport on {endpoint}");
        Ok(Self { port, endpoint })
    }
}

impl Transport for SerialTransport {
    fn send(&mut self, bytes: &[u8]) -> io::Result<()> {
        self.port.write_all(bytes)?;
        self.port.flush()
    }

    fn recv(&mut self, max_len: usize) -> io::Result<Vec<u8>> {
        let mut buf = vec![0u8; max_len];
        let n = self.port.read(&mut buf)?;
        if n == 0 {
            return Err(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                format!("unexpected EOF from serial port {}", self.endpoint),
            ));
        }
        buf.truncate(n);
        Ok(buf)
    }

    fn close(&mut self) {
        // Dropping the handle releases the port; nothing else to do.
        trace!("Closed serial transport on {}", self.endpoint);
    }

    fn describe(&self) -> String {
        self.endpoint.clone()
    }
}
