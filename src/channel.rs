//! Serialized command/reply channel over one transport handle.
//!
//! The [`CommandChannel`] owns the transport handle for exactly the connected
//! window (handle present iff connected) and guards it with one mutex. That
//! lock is the single correctness-critical concurrency guarantee in the
//! crate: the transport is not safe for interleaved writes, so a transmit
//! holds the lock for its full duration, reads are serialized under the same
//! lock, and disconnect's handle release goes through it too. The lock is
//! released on every exit path by guard drop.

use crate::error::{DeviceError, DeviceResult};
use crate::transport::{self, Transport};
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

/// Default read timeout, matching typical instrument reply latencies.
pub const DEFAULT_READ_TIMEOUT: Duration = Duration::from_secs(1);

/// Largest reply accepted in one read.
pub const DEFAULT_MAX_REPLY_LEN: usize = 1024;

/// Mutually exclusive command send / reply receive against one transport.
pub struct CommandChannel {
    link: Mutex<Option<Box<dyn Transport>>>,
    read_timeout: Duration,
    line_terminator: String,
    max_reply_len: usize,
}

impl Default for CommandChannel {
    fn default() -> Self {
        Self::new()
    }
}

impl CommandChannel {
    /// New channel with no attached transport and default timeouts.
    pub fn new() -> Self {
        Self {
            link: Mutex::new(None),
            read_timeout: DEFAULT_READ_TIMEOUT,
            line_terminator: String::new(),
            max_reply_len: DEFAULT_MAX_REPLY_LEN,
        }
    }

    /// Set the read timeout used by `receive`.
    pub fn with_read_timeout(mut self, timeout: Duration) -> Self {
        self.read_timeout = timeout;
        self
    }

    /// Set a terminator appended to every transmitted line (e.g. `"\r\n"`).
    /// Default is none: commands go out verbatim.
    pub fn with_line_terminator(mut self, terminator: &str) -> Self {
        self.line_terminator = terminator.to_string();
        self
    }

    /// Set the largest reply accepted in one read.
    pub fn with_max_reply_len(mut self, max_len: usize) -> Self {
        self.max_reply_len = max_len;
        self
    }

    /// The configured read timeout.
    pub fn read_timeout(&self) -> Duration {
        self.read_timeout
    }

    pub(crate) fn attach(&self, transport: Box<dyn Transport>) {
        *self.lock_link() = Some(transport);
    }

    /// Take the handle out, leaving the channel disconnected. Runs under the
    /// channel lock so it cannot race an in-flight send or read.
    pub(crate) fn detach(&self) -> Option<Box<dyn Transport>> {
        self.lock_link().take()
    }

    /// Transmit one line, holding the lock for the whole send.
    pub(crate) fn transmit(&self, line: &str) -> DeviceResult<()> {
        let mut guard = self.lock_link();
        let link = guard.as_mut().ok_or(DeviceError::NotConnected)?;
        if self.line_terminator.is_empty() {
            link.send(line.as_bytes())?;
        } else {
            let payload = format!("{line}{}", self.line_terminator);
            link.send(payload.as_bytes())?;
        }
        Ok(())
    }

    /// Receive one reply as decoded text, bounded by the read timeout.
    /// The payload is not interpreted or framed here.
    pub(crate) fn receive(&self) -> DeviceResult<String> {
        let mut guard = self.lock_link();
        let link = guard.as_mut().ok_or(DeviceError::NotConnected)?;
        match link.recv(self.max_reply_len) {
            Ok(bytes) => Ok(String::from_utf8_lossy(&bytes).into_owned()),
            Err(e) if transport::is_timeout(&e) => {
                Err(DeviceError::ReadTimeout(self.read_timeout))
            }
            Err(e) => Err(DeviceError::Io(e)),
        }
    }

    fn lock_link(&self) -> MutexGuard<'_, Option<Box<dyn Transport>>> {
        self.link.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Join a command with its space-separated arguments, preserving order.
/// With no arguments the command is returned verbatim, no trailing separator.
pub fn join_command(command: &str, args: &[&str]) -> String {
    if args.is_empty() {
        command.to_string()
    } else {
        format!("{command} {}", args.join(" "))
    }
}
