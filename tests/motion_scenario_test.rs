//! End-to-end motion contract scenario.
//!
//! Walks the full state machine: Disconnected -> Connected(NotHomed,
//! OpenLoop) -> Connected(Homed, OpenLoop) -> Connected(Homed, ClosedLoop),
//! with every illegal shortcut verified to fail with the right error kind.

use anyhow::Result;
use device_core::devices::MockStage;
use device_core::{ConnectParams, Device, DeviceError, Motion};

fn params() -> ConnectParams {
    ConnectParams::Tcp {
        host: "127.0.0.1".into(),
        port: 9999,
    }
}

#[test]
fn full_motion_scenario() -> Result<()> {
    let stage = MockStage::new("axis1");

    // home() before connect fails with NotConnected.
    assert!(matches!(
        stage.home().unwrap_err(),
        DeviceError::NotConnected
    ));

    // After connect, home() succeeds.
    stage.connect(&params())?;
    stage.home()?;
    assert!(stage.is_homed());

    // setPosition before closeLoop fails with NotClosedLoop.
    assert!(matches!(
        stage.set_position(5.0).unwrap_err(),
        DeviceError::NotClosedLoop
    ));

    // After closeLoop, out-of-limits targets fail with OutOfRange...
    stage.close_loop()?;
    assert!(stage.is_closed_loop());
    let (lower, upper) = stage.limits()?;
    let err = stage.set_position(upper + 1.0).unwrap_err();
    assert!(matches!(err, DeviceError::OutOfRange { .. }));
    let err = stage.set_position(lower - 1.0).unwrap_err();
    assert!(matches!(err, DeviceError::OutOfRange { .. }));

    // ...and an in-limits move succeeds and is reflected by getPosition.
    stage.set_position(5.0)?;
    assert!((stage.position()? - 5.0).abs() < 1e-9);

    Ok(())
}

#[test]
fn limit_boundaries_are_inclusive() -> Result<()> {
    let stage = MockStage::new("axis1");
    stage.connect(&params())?;
    stage.home()?;
    stage.close_loop()?;

    let (lower, upper) = stage.limits()?;
    stage.set_position(lower)?;
    stage.set_position(upper)?;
    assert!((stage.position()? - upper).abs() < 1e-9);
    Ok(())
}

#[test]
fn narrowed_limits_are_enforced() -> Result<()> {
    let stage = MockStage::new("axis1");
    stage.connect(&params())?;
    stage.home()?;
    stage.close_loop()?;

    stage.set_limits(10.0, 20.0)?;
    assert!(matches!(
        stage.set_position(5.0).unwrap_err(),
        DeviceError::OutOfRange { .. }
    ));
    stage.set_position(15.0)?;
    Ok(())
}

#[test]
fn failure_statuses_pair_negative_codes_with_messages() {
    let stage = MockStage::new("axis1");

    let _ = stage.home();
    let status = stage.status();
    assert!(status.code < 0);
    assert!(!status.message.is_empty());
}
