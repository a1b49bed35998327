//! Integration tests for the device connection lifecycle.
//!
//! These exercise the contract every driver inherits from `DeviceCore`:
//! connect/disconnect transitions, idempotence, refusal without transport
//! access, and status pairing.

use device_core::{
    ConnectParams, Device, DeviceCore, DeviceError, MemoryReporter, MockTransport, ReportLevel,
    StatusPair,
};
use std::sync::Arc;
use std::thread;

/// Minimal driver built from the default trait methods only.
struct BareDevice {
    core: DeviceCore,
}

impl BareDevice {
    fn new() -> Self {
        Self {
            core: DeviceCore::new("bare"),
        }
    }
}

impl Device for BareDevice {
    fn name(&self) -> &str {
        self.core.name()
    }

    fn core(&self) -> &DeviceCore {
        &self.core
    }
}

#[test]
fn connected_flag_tracks_lifecycle() {
    let device = BareDevice::new();
    assert!(!device.is_connected(), "fresh driver must be disconnected");

    device
        .core()
        .connect_with(Box::new(MockTransport::new()))
        .expect("connect");
    assert!(device.is_connected());

    device.disconnect().expect("disconnect");
    assert!(!device.is_connected(), "disconnected after disconnect");
}

#[test]
fn commands_refused_offline_without_touching_transport() {
    let device = BareDevice::new();
    let transport = MockTransport::new();
    let probe = transport.probe();

    // Never connected: both operations refuse before any transport access.
    assert!(matches!(
        device.send_command("MEAS?", &["TEMP"]),
        Err(DeviceError::NotConnected)
    ));
    assert!(matches!(device.read_reply(), Err(DeviceError::NotConnected)));
    assert_eq!(probe.touches(), 0);

    // Connected then disconnected: same refusal, the old handle stays cold.
    device.core().connect_with(Box::new(transport)).expect("connect");
    device.send_command("PING", &[]).expect("send while connected");
    let touches_while_connected = probe.touches();

    device.disconnect().expect("disconnect");
    assert!(matches!(
        device.send_command("PING", &[]),
        Err(DeviceError::NotConnected)
    ));
    assert!(matches!(device.read_reply(), Err(DeviceError::NotConnected)));
    assert_eq!(probe.touches(), touches_while_connected);
}

#[test]
fn disconnect_twice_succeeds_and_closes_once() {
    let device = BareDevice::new();
    let transport = MockTransport::new();
    let probe = transport.probe();
    device.core().connect_with(Box::new(transport)).expect("connect");

    device.disconnect().expect("first disconnect");
    device.disconnect().expect("second disconnect");

    assert_eq!(probe.closes(), 1, "transport close must run exactly once");
}

#[test]
fn reconnect_is_idempotent_success() {
    let reporter = Arc::new(MemoryReporter::new());
    let core = DeviceCore::new("meter").with_reporter(reporter.clone());

    core.connect_with(Box::new(MockTransport::new())).expect("connect");
    core.connect_with(Box::new(MockTransport::new()))
        .expect("re-entrant connect is a success");

    assert!(core.is_connected());
    assert!(reporter.contains(ReportLevel::Warning, "already connected"));
    assert_eq!(core.status().code, 0, "warning keeps a non-negative code");
}

#[test]
fn tcp_connect_validates_before_dialing() {
    let core = DeviceCore::new("meter");

    let err = core
        .connect(&ConnectParams::Tcp {
            host: String::new(),
            port: 5025,
        })
        .expect_err("empty host");
    assert!(matches!(err, DeviceError::InvalidParams(_)));
    assert!(!core.is_connected());
}

#[test]
fn io_failure_mid_operation_forces_disconnected() {
    let core = DeviceCore::new("meter");
    let transport = MockTransport::new();
    transport.fail_next_send();
    core.connect_with(Box::new(transport)).expect("connect");

    let err = core.send_command("PING", &[]).expect_err("dead link");
    assert!(matches!(err, DeviceError::Io(_)));
    assert!(!core.is_connected(), "fail-safe: link assumed dead");
}

#[test]
fn status_pairs_after_failures_and_successes() {
    let core = DeviceCore::new("meter");
    assert_eq!(core.status(), StatusPair::neutral());

    // Failure: negative code paired with a non-empty message.
    let _ = core.send_command("PING", &[]);
    let failed = core.status();
    assert!(failed.code < 0);
    assert!(!failed.message.is_empty());

    // Success: non-negative code.
    core.connect_with(Box::new(MockTransport::new())).expect("connect");
    core.send_command("PING", &[]).expect("send");
    assert!(core.status().code >= 0);
}

#[test]
fn connect_and_disconnect_transitions_are_serialized() {
    // Lifecycle transitions are atomic: either disconnect runs first and the
    // following connect leaves an attached handle, or connect runs first and
    // disconnect closes that handle exactly once. A torn transition would
    // leave the device connected with no handle, refusing sends.
    for _ in 0..500 {
        let core = Arc::new(DeviceCore::new("raced"));
        let transport = MockTransport::new();
        let probe = transport.probe();

        let connector = {
            let core = Arc::clone(&core);
            thread::spawn(move || {
                core.connect_with(Box::new(transport)).expect("connect");
            })
        };
        let disconnector = {
            let core = Arc::clone(&core);
            thread::spawn(move || {
                core.disconnect().expect("disconnect");
            })
        };
        connector.join().expect("connector thread");
        disconnector.join().expect("disconnector thread");

        if core.is_connected() {
            core.send_command("PING", &[])
                .expect("connected core must hold a handle");
            assert_eq!(probe.closes(), 0);
        } else {
            assert_eq!(probe.closes(), 1, "handle closed exactly once");
        }
    }
}

#[test]
fn concurrent_connects_attach_exactly_one_handle() {
    for _ in 0..200 {
        let core = Arc::new(DeviceCore::new("raced"));
        let first = MockTransport::new();
        let first_probe = first.probe();
        let second = MockTransport::new();
        let second_probe = second.probe();

        let handles = [first, second].map(|transport| {
            let core = Arc::clone(&core);
            thread::spawn(move || {
                core.connect_with(Box::new(transport))
                    .expect("either winner or idempotent success");
            })
        });
        for handle in handles {
            handle.join().expect("connector thread");
        }

        assert!(core.is_connected());
        core.send_command("PING", &[]).expect("send");
        // One handle attached and used; the loser was dropped unattached.
        assert_eq!(first_probe.touches() + second_probe.touches(), 1);

        core.disconnect().expect("disconnect");
        assert_eq!(first_probe.closes() + second_probe.closes(), 1);
    }
}

#[test]
fn empty_args_send_command_verbatim() {
    let core = DeviceCore::new("meter");
    let transport = MockTransport::new();
    let probe = transport.probe();
    core.connect_with(Box::new(transport)).expect("connect");

    core.send_command("HOME", &[]).expect("send");
    assert_eq!(probe.wire(), b"HOME", "no trailing separator");
}
