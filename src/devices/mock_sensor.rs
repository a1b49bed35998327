//! Hardware-free environment sensor driver.
//!
//! Answers `temperature`-like telemetry items over a simulated text protocol
//! (`MEAS? TEMP`, `*IDN?`). Item keys match by substring, mirroring what
//! loose instrument front panels accept; an unmatched key is an
//! `UnknownItem` failure.

use crate::connection::ConnectParams;
use crate::core::{Device, DeviceCore, Sensor, Value};
use crate::error::{DeviceError, DeviceResult};
use crate::reporter::Reporter;
use crate::transport::MockTransport;
use rand::Rng;
use std::sync::Arc;

const BASE_TEMPERATURE_C: f64 = 10.5;

/// Simulated sensor implementing the [`Sensor`] contract.
pub struct MockSensor {
    core: DeviceCore,
}

impl MockSensor {
    /// New sensor with the default reporter.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            core: DeviceCore::new(name),
        }
    }

    /// New sensor with an injected reporting sink.
    pub fn with_reporter(name: impl Into<String>, reporter: Arc<dyn Reporter>) -> Self {
        Self {
            core: DeviceCore::new(name).with_reporter(reporter),
        }
    }

    /// Build the simulated instrument link: a transport whose responder
    /// answers the sensor's command vocabulary.
    fn simulated_link(&self) -> MockTransport {
        MockTransport::new()
            .with_endpoint("mock-sensor")
            .with_responder(|line| match line {
                "MEAS? TEMP" => {
                    // Base reading plus a little thermal jitter.
                    let jitter: f64 = rand::thread_rng().gen_range(-0.25..0.25);
                    Some(format!("{:.2}", BASE_TEMPERATURE_C + jitter))
                }
                "*IDN?" => Some("MOCK,SENSOR-1,0,1.0".to_string()),
                _ => Some("ERR".to_string()),
            })
    }

    fn query(&self, command: &str, args: &[&str]) -> DeviceResult<String> {
        self.send_command(command, args)?;
        let reply = self.read_reply()?;
        Ok(reply.trim().to_string())
    }
}

impl Device for MockSensor {
    fn name(&self) -> &str {
        self.core.name()
    }

    fn core(&self) -> &DeviceCore {
        &self.core
    }

    /// Validates the endpoint parameters, then attaches the simulated link
    /// instead of dialing them.
    fn connect(&self, params: &ConnectParams) -> DeviceResult<()> {
        params
            .validate()
            .map_err(|e| self.core.report_failure(e, "connect rejected"))?;
        self.core.connect_with(Box::new(self.simulated_link()))
    }
}

impl Sensor for MockSensor {
    fn atomic_value(&self, item: &str) -> DeviceResult<Value> {
        if !self.is_connected() {
            let e = DeviceError::NotConnected;
            self.core.status_register().report_error(
                e.code(),
                format!("{}: cannot read '{item}': {e}", self.name()),
            );
            return Err(e);
        }

        if item.contains("temperature") {
            let reply = self.query("MEAS?", &["TEMP"])?;
            let temp: f64 = reply.parse().map_err(|_| {
                self.core.report_failure(
                    DeviceError::Driver(format!("malformed temperature reply '{reply}'")),
                    "telemetry read failed",
                )
            })?;
            self.core
                .status_register()
                .report_info(format!("{}: temperature = {temp}", self.name()));
            return Ok(Value::Float(temp));
        }

        if item.contains("id") {
            let reply = self.query("*IDN?", &[])?;
            self.core
                .status_register()
                .report_info(format!("{}: id = {reply}", self.name()));
            return Ok(Value::Text(reply));
        }

        let e = DeviceError::UnknownItem(item.to_string());
        self.core
            .status_register()
            .report_error(e.code(), format!("{}: {e}", self.name()));
        Err(e)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::connection::ConnectParams;

    fn connected_sensor() -> MockSensor {
        let sensor = MockSensor::new("env0");
        let params = ConnectParams::Tcp {
            host: "127.0.0.1".into(),
            port: 9999,
        };
        sensor.connect(&params).expect("connect");
        sensor
    }

    #[test]
    fn connect_rejects_invalid_params() {
        let sensor = MockSensor::new("env0");
        let err = sensor
            .connect(&ConnectParams::Tcp {
                host: String::new(),
                port: 0,
            })
            .expect_err("empty host");
        assert!(matches!(err, DeviceError::InvalidParams(_)));
        assert!(!sensor.is_connected());
    }

    #[test]
    fn temperature_is_numeric_and_near_base() {
        let sensor = connected_sensor();
        let value = sensor.atomic_value("temperature").expect("temperature");
        let temp = value.as_f64().expect("numeric");
        assert!((temp - BASE_TEMPERATURE_C).abs() < 1.0, "got {temp}");
        assert_eq!(sensor.status().code, 0);
    }

    #[test]
    fn substring_match_accepts_qualified_keys() {
        let sensor = connected_sensor();
        assert!(sensor.atomic_value("ambient temperature").is_ok());
    }

    #[test]
    fn unknown_item_fails_with_error_status() {
        let sensor = connected_sensor();
        let err = sensor.atomic_value("bogus").expect_err("unknown item");
        assert!(matches!(err, DeviceError::UnknownItem(_)));
        assert!(sensor.status().code < 0);
        assert!(sensor.status().message.contains("bogus"));
    }

    #[test]
    fn refuses_when_disconnected() {
        let sensor = MockSensor::new("env0");
        let err = sensor.atomic_value("temperature").expect_err("offline");
        assert!(matches!(err, DeviceError::NotConnected));
        assert!(sensor.status().code < 0);
    }

    #[test]
    fn identification_is_text() {
        let sensor = connected_sensor();
        match sensor.atomic_value("id").expect("id") {
            Value::Text(id) => assert!(id.starts_with("MOCK,SENSOR-1")),
            other => panic!("expected text, got {other:?}"),
        }
    }
}
