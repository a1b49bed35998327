//! Mock transport for testing drivers without physical hardware.
//!
//! Provides:
//! - scripted canned replies, or a responder closure simulating the remote
//!   instrument,
//! - controllable failure injection,
//! - a shared [`TransportProbe`] for verifying exactly what reached the
//!   "wire", including byte-level ordering across threads.
//!
//! Writes land byte-by-byte in a single flat wire log, with optional pacing
//! between bytes. Two unsynchronized concurrent senders would interleave in
//! that log, which is what the channel-lock tests rely on to prove sends are
//! mutually exclusive.

use crate::transport::Transport;
use std::collections::VecDeque;
use std::io;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

type Responder = dyn Fn(&str) -> Option<String> + Send + Sync;

#[derive(Default)]
struct Shared {
    wire: Mutex<Vec<u8>>,
    sends: AtomicUsize,
    recvs: AtomicUsize,
    closes: AtomicUsize,
    touches: AtomicUsize,
}

impl Shared {
    fn lock_wire(&self) -> std::sync::MutexGuard<'_, Vec<u8>> {
        self.wire.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// In-memory transport scripted by tests or mock drivers.
pub struct MockTransport {
    shared: Arc<Shared>,
    replies: Mutex<VecDeque<Vec<u8>>>,
    responder: Option<Box<Responder>>,
    fail_next_send: AtomicBool,
    write_pacing: Duration,
    endpoint: String,
}

impl Default for MockTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl MockTransport {
    /// New mock with no scripted replies and no pacing.
    pub fn new() -> Self {
        Self {
            shared: Arc::new(Shared::default()),
            replies: Mutex::new(VecDeque::new()),
            responder: None,
            fail_next_send: AtomicBool::new(false),
            write_pacing: Duration::ZERO,
            endpoint: "mock".to_string(),
        }
    }

    /// Queue a canned reply returned by the next unanswered `recv`.
    pub fn push_reply(&self, reply: &str) {
        self.replies
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push_back(reply.as_bytes().to_vec());
    }

    /// Builder form of [`push_reply`](Self::push_reply).
    pub fn with_reply(self, reply: &str) -> Self {
        self.push_reply(reply);
        self
    }

    /// Install a responder closure that plays the remote instrument: for each
    /// decoded outgoing line it may queue a reply.
    pub fn with_responder<F>(mut self, responder: F) -> Self
    where
        F: Fn(&str) -> Option<String> + Send + Sync + 'static,
    {
        self.responder = Some(Box::new(responder));
        self
    }

    /// Sleep this long between individual bytes of a send. Widens the race
    /// window when probing for interleaved writes.
    pub fn with_write_pacing(mut self, pacing: Duration) -> Self {
        self.write_pacing = pacing;
        self
    }

    /// Endpoint label used by `describe()`.
    pub fn with_endpoint(mut self, endpoint: &str) -> Self {
        self.endpoint = endpoint.to_string();
        self
    }

    /// Make the next send fail with a broken-pipe I/O error.
    pub fn fail_next_send(&self) {
        self.fail_next_send.store(true, Ordering::SeqCst);
    }

    /// Handle for inspecting wire traffic after the transport has been boxed
    /// and handed to a device.
    pub fn probe(&self) -> TransportProbe {
        TransportProbe {
            shared: self.shared.clone(),
        }
    }
}

impl Transport for MockTransport {
    fn send(&mut self, bytes: &[u8]) -> io::Result<()> {
        self.shared.touches.fetch_add(1, Ordering::SeqCst);
        if self.fail_next_send.swap(false, Ordering::SeqCst) {
            return Err(io::Error::new(
                io::ErrorKind::BrokenPipe,
                "mock transmit failure",
            ));
        }

        // Byte-at-a-time on purpose: unserialized concurrent senders would
        // interleave here.
        for &b in bytes {
            self.shared.lock_wire().push(b);
            if !self.write_pacing.is_zero() {
                std::thread::sleep(self.write_pacing);
            }
        }
        self.shared.sends.fetch_add(1, Ordering::SeqCst);

        if let Some(responder) = &self.responder {
            let line = String::from_utf8_lossy(bytes);
            if let Some(reply) = responder(line.trim_end()) {
                self.replies
                    .lock()
                    .unwrap_or_else(PoisonError::into_inner)
                    .push_back(reply.into_bytes());
            }
        }
        Ok(())
    }

    fn recv(&mut self, max_len: usize) -> io::Result<Vec<u8>> {
        self.shared.touches.fetch_add(1, Ordering::SeqCst);
        let reply = self
            .replies
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .pop_front();
        match reply {
            Some(mut bytes) => {
                bytes.truncate(max_len);
                self.shared.recvs.fetch_add(1, Ordering::SeqCst);
                Ok(bytes)
            }
            None => Err(io::Error::new(
                io::ErrorKind::TimedOut,
                "mock has no reply queued",
            )),
        }
    }

    fn close(&mut self) {
        self.shared.closes.fetch_add(1, Ordering::SeqCst);
    }

    fn describe(&self) -> String {
        self.endpoint.clone()
    }
}

/// Read-only view into a [`MockTransport`]'s observed traffic.
///
/// Stays valid after the transport itself has been moved into a device, so
/// tests can assert on what the device actually did to the wire.
#[derive(Clone)]
pub struct TransportProbe {
    shared: Arc<Shared>,
}

impl TransportProbe {
    /// Every byte written, in arrival order.
    pub fn wire(&self) -> Vec<u8> {
        self.shared.lock_wire().clone()
    }

    /// Number of completed `send` calls.
    pub fn sends(&self) -> usize {
        self.shared.sends.load(Ordering::SeqCst)
    }

    /// Number of successful `recv` calls.
    pub fn recvs(&self) -> usize {
        self.shared.recvs.load(Ordering::SeqCst)
    }

    /// Number of `close` calls.
    pub fn closes(&self) -> usize {
        self.shared.closes.load(Ordering::SeqCst)
    }

    /// Total send/recv attempts, including failed ones. Zero means the
    /// transport was never touched.
    pub fn touches(&self) -> usize {
        self.shared.touches.load(Ordering::SeqCst)
    }
}
