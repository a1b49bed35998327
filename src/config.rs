//! Configuration structures for device drivers.
//!
//! Settings load from TOML files via the `config` crate and deserialize into
//! serde structs with sensible defaults, so a missing file section never
//! breaks a driver. Validation is a separate step from parsing: values that
//! parse but are logically wrong (a zero timeout, say) are caught by
//! [`Settings::validate`].
//!
//! ```toml
//! name = "stage_a"
//! endpoint = { type = "tcp", host = "192.168.1.50", port = 5025 }
//!
//! [timeouts]
//! connect_timeout_ms = 3000
//! read_timeout_ms = 1000
//! ```

use crate::connection::ConnectParams;
use crate::error::{DeviceError, DeviceResult};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

fn default_connect_timeout_ms() -> u64 {
    3000
}

fn default_read_timeout_ms() -> u64 {
    1000
}

/// Timeout configuration, all in milliseconds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeoutSettings {
    /// How long `connect` waits for the transport to accept.
    #[serde(default = "default_connect_timeout_ms")]
    pub connect_timeout_ms: u64,
    /// How long `read_reply` waits for data.
    #[serde(default = "default_read_timeout_ms")]
    pub read_timeout_ms: u64,
}

impl Default for TimeoutSettings {
    fn default() -> Self {
        Self {
            connect_timeout_ms: default_connect_timeout_ms(),
            read_timeout_ms: default_read_timeout_ms(),
        }
    }
}

impl TimeoutSettings {
    /// Connect timeout as a `Duration`.
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_millis(self.connect_timeout_ms)
    }

    /// Read timeout as a `Duration`.
    pub fn read_timeout(&self) -> Duration {
        Duration::from_millis(self.read_timeout_ms)
    }
}

fn default_name() -> String {
    "device".to_string()
}

/// Top-level settings for one device.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Device name used in status messages and logs.
    #[serde(default = "default_name")]
    pub name: String,
    /// Where to connect, if configured statically.
    pub endpoint: Option<ConnectParams>,
    /// Timeout configuration.
    pub timeouts: TimeoutSettings,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            name: default_name(),
            endpoint: None,
            timeouts: TimeoutSettings::default(),
        }
    }
}

impl Settings {
    /// Load settings from a TOML file.
    pub fn load(path: &Path) -> DeviceResult<Self> {
        let cfg = config::Config::builder()
            .add_source(config::File::from(path))
            .build()?;
        let settings: Settings = cfg.try_deserialize()?;
        settings.validate()?;
        Ok(settings)
    }

    /// Semantic validation beyond what parsing enforces.
    pub fn validate(&self) -> DeviceResult<()> {
        if self.name.trim().is_empty() {
            return Err(DeviceError::InvalidParams(
                "device name must not be empty".into(),
            ));
        }
        if self.timeouts.read_timeout_ms == 0 {
            return Err(DeviceError::InvalidParams(
                "read_timeout_ms must be non-zero".into(),
            ));
        }
        if self.timeouts.connect_timeout_ms == 0 {
            return Err(DeviceError::InvalidParams(
                "connect_timeout_ms must be non-zero".into(),
            ));
        }
        if let Some(endpoint) = &self.endpoint {
            endpoint.validate()?;
        }
        Ok(())
    }
}
