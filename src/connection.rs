//! Connection parameters and connection-state tracking.
//!
//! [`ConnectParams`] is a tagged union with one variant per transport kind,
//! so parameter validation is a pattern match instead of runtime
//! argument-count inspection. [`ConnectionState`] tracks the connected flag;
//! it is observable by anyone but only the owning device core's lifecycle
//! methods flip it.

use crate::error::{DeviceError, DeviceResult};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::atomic::{AtomicBool, Ordering};

/// Parameters for establishing a device connection, one variant per
/// transport kind.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ConnectParams {
    /// TCP stream connection to `host:port`.
    Tcp {
        /// Host name or IP address.
        host: String,
        /// TCP port.
        port: u16,
    },
    /// Serial line connection.
    Serial {
        /// Device path, e.g. `/dev/ttyUSB0` or `COM3`.
        path: String,
        /// Baud rate, e.g. 9600 or 115200.
        baud_rate: u32,
    },
}

impl ConnectParams {
    /// Validate parameters without touching any transport.
    ///
    /// Validation failures never mutate device state; `connect` calls this
    /// before opening anything.
    pub fn validate(&self) -> DeviceResult<()> {
        match self {
            ConnectParams::Tcp { host, port } => {
                if host.trim().is_empty() {
                    return Err(DeviceError::InvalidParams("host must not be empty".into()));
                }
                if *port == 0 {
                    return Err(DeviceError::InvalidParams("port must be non-zero".into()));
                }
            }
            ConnectParams::Serial { path, baud_rate } => {
                if path.trim().is_empty() {
                    return Err(DeviceError::InvalidParams(
                        "serial device path must not be empty".into(),
                    ));
                }
                if *baud_rate == 0 {
                    return Err(DeviceError::InvalidParams("baud rate must be non-zero".into()));
                }
            }
        }
        Ok(())
    }

    /// Endpoint string used in status messages, e.g. `127.0.0.1:9999` or
    /// `/dev/ttyUSB0@9600`.
    pub fn endpoint(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for ConnectParams {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConnectParams::Tcp { host, port } => write!(f, "{host}:{port}"),
            ConnectParams::Serial { path, baud_rate } => write!(f, "{path}@{baud_rate}"),
        }
    }
}

impl FromStr for ConnectParams {
    type Err = DeviceError;

    /// Parse `host:port` as TCP or `path@baud` as serial.
    fn from_str(s: &str) -> DeviceResult<Self> {
        if let Some((path, baud)) = s.rsplit_once('@') {
            let baud_rate = baud.parse::<u32>().map_err(|_| {
                DeviceError::InvalidParams(format!("invalid baud rate '{baud}'"))
            })?;
            return Ok(ConnectParams::Serial {
                path: path.to_string(),
                baud_rate,
            });
        }
        if let Some((host, port)) = s.rsplit_once(':') {
            let port = port.parse::<u16>().map_err(|_| {
                DeviceError::InvalidParams(format!("invalid port '{port}'"))
            })?;
            return Ok(ConnectParams::Tcp {
                host: host.to_string(),
                port,
            });
        }
        Err(DeviceError::InvalidParams(format!(
            "expected 'host:port' or 'path@baud', got '{s}'"
        )))
    }
}

/// Tracks whether the owning device currently holds an open transport.
///
/// The flag is true only between a successful connect and the following
/// disconnect (or an internal failure that forces it false). Reads are
/// lock-free; writes are restricted to the crate so external callers can
/// observe but never flip it.
#[derive(Debug, Default)]
pub struct ConnectionState {
    connected: AtomicBool,
}

impl ConnectionState {
    /// New state, initialized disconnected.
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether the device is currently connected.
    pub fn is_connected(&self) -> bool {
        self.connected.load(Ordering::SeqCst)
    }

    pub(crate) fn set_connected(&self, connected: bool) {
        self.connected.store(connected, Ordering::SeqCst);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starts_disconnected() {
        let state = ConnectionState::new();
        assert!(!state.is_connected());
        state.set_connected(true);
        assert!(state.is_connected());
        state.set_connected(false);
        assert!(!state.is_connected());
    }

    #[test]
    fn tcp_params_validate() {
        let good = ConnectParams::Tcp {
            host: "192.168.0.10".into(),
            port: 5025,
        };
        assert!(good.validate().is_ok());

        let empty_host = ConnectParams::Tcp {
            host: "  ".into(),
            port: 5025,
        };
        assert!(matches!(
            empty_host.validate(),
            Err(DeviceError::InvalidParams(_))
        ));

        let zero_port = ConnectParams::Tcp {
            host: "localhost".into(),
            port: 0,
        };
        assert!(matches!(
            zero_port.validate(),
            Err(DeviceError::InvalidParams(_))
        ));
    }

    #[test]
    fn serial_params_validate() {
        let good = ConnectParams::Serial {
            path: "/dev/ttyUSB0".into(),
            baud_rate: 19200,
        };
        assert!(good.validate().is_ok());

        let zero_baud = ConnectParams::Serial {
            path: "/dev/ttyUSB0".into(),
            baud_rate: 0,
        };
        assert!(matches!(
            zero_baud.validate(),
            Err(DeviceError::InvalidParams(_))
        ));
    }

    #[test]
    fn parses_endpoint_strings() {
        let tcp: ConnectParams = "127.0.0.1:9999".parse().expect("tcp endpoint");
        assert_eq!(
            tcp,
            ConnectParams::Tcp {
                host: "127.0.0.1".into(),
                port: 9999
            }
        );

        let serial: ConnectParams = "/dev/ttyUSB0@9600".parse().expect("serial endpoint");
        assert_eq!(
            serial,
            ConnectParams::Serial {
                path: "/dev/ttyUSB0".into(),
                baud_rate: 9600
            }
        );

        assert!("garbage".parse::<ConnectParams>().is_err());
        assert!("host:notaport".parse::<ConnectParams>().is_err());
    }

    #[test]
    fn endpoint_round_trips_through_display() {
        let params = ConnectParams::Tcp {
            host: "10.0.0.5".into(),
            port: 5025,
        };
        let reparsed: ConnectParams = params.endpoint().parse().expect("round trip");
        assert_eq!(params, reparsed);
    }

    #[test]
    fn deserializes_from_tagged_toml() {
        let toml = r#"
            type = "tcp"
            host = "192.168.1.50"
            port = 5025
        "#;
        let params: ConnectParams = toml::from_str(toml).expect("tagged tcp params");
        assert_eq!(
            params,
            ConnectParams::Tcp {
                host: "192.168.1.50".into(),
                port: 5025
            }
        );
    }
}
