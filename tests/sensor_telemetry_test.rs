//! Sensor contract tests against the hardware-free reference driver.

use device_core::devices::MockSensor;
use device_core::{ConnectParams, Device, DeviceError, MemoryReporter, ReportLevel, Sensor};
use std::sync::Arc;

fn params() -> ConnectParams {
    ConnectParams::Tcp {
        host: "127.0.0.1".into(),
        port: 9999,
    }
}

#[test]
fn temperature_reads_numeric_on_connected_sensor() {
    let sensor = MockSensor::new("env0");
    sensor.connect(&params()).expect("connect");

    let value = sensor.atomic_value("temperature").expect("temperature");
    let temp = value.as_f64().expect("numeric value");
    assert!(temp.is_finite());
    assert!(sensor.status().code >= 0);
}

#[test]
fn bogus_item_is_unknown_with_error_status() {
    let sensor = MockSensor::new("env0");
    sensor.connect(&params()).expect("connect");

    let err = sensor.atomic_value("bogus").expect_err("unknown item");
    match err {
        DeviceError::UnknownItem(item) => assert_eq!(item, "bogus"),
        other => panic!("expected UnknownItem, got {other:?}"),
    }
    assert!(sensor.status().code < 0);
}

#[test]
fn disconnected_sensor_refuses_and_reports() {
    let reporter = Arc::new(MemoryReporter::new());
    let sensor = MockSensor::with_reporter("env0", reporter.clone());

    let err = sensor.atomic_value("temperature").expect_err("offline");
    assert!(matches!(err, DeviceError::NotConnected));
    assert!(reporter.contains(ReportLevel::Error, "not connected"));
}

#[test]
fn every_read_is_one_command_reply_exchange() {
    let sensor = MockSensor::new("env0");
    sensor.connect(&params()).expect("connect");

    for _ in 0..3 {
        sensor.atomic_value("temperature").expect("temperature");
    }
    // Still alive and consistent after repeated atomic exchanges.
    assert!(sensor.is_connected());
    assert!(sensor.status().code >= 0);

    sensor.disconnect().expect("disconnect");
    assert!(sensor.atomic_value("temperature").is_err());
}
