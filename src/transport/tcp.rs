//! TCP stream transport.

use crate::transport::Transport;
use log::trace;
use std::io::{self, Read, Write};
use std::net::{Shutdown, TcpStream, ToSocketAddrs};
use std::time::Duration;

/// Stream-socket transport over `std::net::TcpStream`.
pub struct TcpTransport {
    stream: TcpStream,
    endpoint: String,
}

impl TcpTransport {
    /// Connect to `host:port`, bounded by `connect_timeout`, and configure
    /// the read timeout on the resulting stream.
    pub fn open(
        host: &str,
        port: u16,
        connect_timeout: Duration,
        read_timeout: Duration,
    ) -> io::Result<Self> {
        let endpoint = format!("{host}:{port}");
        let addr = (host, port)
            .to_socket_addrs()?
            .next()
            .ok_or_else(|| {
                io::Error::new(
                    io::ErrorKind::AddrNotAvailable,
                    format!("no address resolved for {endpoint}"),
                )
            })?;

        let stream = TcpStream::connect_timeout(&addr, connect_timeout)?;
        stream.set_read_timeout(Some(read_timeout))?;
        stream.set_nodelay(true)?;

        trace!("Opened TCP transport to {endpoint}");
        Ok(Self { stream, endpoint })
    }
}

impl Transport for TcpTransport {
    fn send(&mut self, bytes: &[u8]) -> io::Result<()> {
        self.stream.write_all(bytes)?;
        self.stream.flush()
    }

    fn recv(&mut self, max_len: usize) -> io::Result<Vec<u8>> {
        let mut buf = vec![0u8; max_len];
        let n = self.stream.read(&mut buf)?;
        if n == 0 {
            // Peer closed the connection.
            return Err(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                format!("connection to {} closed by peer", self.endpoint),
            ));
        }
        buf.truncate(n);
        Ok(buf)
    }

    fn close(&mut self) {
        // Best effort; the handle is dropped either way.
        let _ = self.stream.shutdown(Shutdown::Both);
        trace!("Closed TCP transport to {}", self.endpoint);
    }

    fn describe(&self) -> String {
        self.endpoint.clone()
    }
}
