//! Configuration types for devices and the exchange layer.
//!
//! A [`DeviceConfig`] is supplied once per device and is immutable afterwards;
//! reconfiguring a device means building a new one from a new config.

use std::collections::HashSet;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::protocol_constants::{
    CONNECT_TIMEOUT_SECS, DEFAULT_NAME, DEFAULT_POLL_INTERVAL_SECS, DEFAULT_PORT,
    READ_TIMEOUT_SECS,
};
use crate::sox::{Endpoint, ExchangeTimeouts};

/// Errors found while validating configuration.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    /// A device was configured without a host.
    #[error("Device host must not be empty")]
    EmptyHost,

    /// A device was configured with port 0.
    #[error("Device {0} has an invalid port 0")]
    InvalidPort(String),

    /// Two devices resolve to the same unique id.
    #[error("Duplicate device id: {0}")]
    DuplicateDevice(String),

    /// A timeout or interval was set to zero.
    #[error("{0} must be >= 1 second")]
    ZeroDuration(&'static str),
}

// ─────────────────────────────────────────────────────────────────────────────
// Device Configuration
// ─────────────────────────────────────────────────────────────────────────────

/// Configuration for one sound-server device.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceConfig {
    /// Host name or IP address of the sound server.
    pub host: String,

    /// TCP port of the sound server.
    #[serde(default = "default_port")]
    pub port: u16,

    /// Display name. Derived from the endpoint when absent.
    #[serde(default)]
    pub name: Option<String>,

    /// Explicit unique id. Defaults to `host:port`.
    #[serde(default)]
    pub unique_id: Option<String>,
}

fn default_port() -> u16 {
    DEFAULT_PORT
}

impl DeviceConfig {
    /// Creates a config for `host:port` with a derived name and id.
    #[must_use]
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
            name: None,
            unique_id: None,
        }
    }

    /// Sets the display name.
    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// The endpoint this device talks to.
    #[must_use]
    pub fn endpoint(&self) -> Endpoint {
        Endpoint::new(self.host.clone(), self.port)
    }

    /// Unique id of the device: the explicit id, or `host:port`.
    #[must_use]
    pub fn unique_id(&self) -> String {
        self.unique_id
            .clone()
            .filter(|id| !id.trim().is_empty())
            .unwrap_or_else(|| self.endpoint().to_string())
    }

    /// Display title: the configured name, or `"SoX @ host"` with the port
    /// appended when it is not the default.
    #[must_use]
    pub fn display_title(&self) -> String {
        if let Some(name) = self.name.as_deref().map(str::trim).filter(|n| !n.is_empty()) {
            return name.to_string();
        }

        let mut title = format!("{} @ {}", DEFAULT_NAME, self.host);
        if self.port != DEFAULT_PORT {
            title.push_str(&format!(":{}", self.port));
        }
        title
    }

    /// Validates host and port.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.host.trim().is_empty() {
            return Err(ConfigError::EmptyHost);
        }
        if self.port == 0 {
            return Err(ConfigError::InvalidPort(self.host.clone()));
        }
        Ok(())
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Application Configuration
// ─────────────────────────────────────────────────────────────────────────────

/// Configuration for a set of devices and the exchange layer.
///
/// All fields have sensible defaults.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Devices to control.
    pub devices: Vec<DeviceConfig>,

    /// Timeout for establishing a connection (seconds).
    pub connect_timeout_secs: u64,

    /// Timeout for the reply after the request is sent (seconds).
    pub read_timeout_secs: u64,

    /// Interval between background state polls (seconds).
    pub poll_interval_secs: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            devices: Vec::new(),
            connect_timeout_secs: CONNECT_TIMEOUT_SECS,
            read_timeout_secs: READ_TIMEOUT_SECS,
            poll_interval_secs: DEFAULT_POLL_INTERVAL_SECS,
        }
    }
}

impl Config {
    /// Validates every device, rejects duplicate ids and zero durations.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.connect_timeout_secs == 0 {
            return Err(ConfigError::ZeroDuration("connect_timeout_secs"));
        }
        if self.read_timeout_secs == 0 {
            return Err(ConfigError::ZeroDuration("read_timeout_secs"));
        }
        if self.poll_interval_secs == 0 {
            return Err(ConfigError::ZeroDuration("poll_interval_secs"));
        }

        let mut seen = HashSet::new();
        for device in &self.devices {
            device.validate()?;
            let id = device.unique_id();
            if !seen.insert(id.clone()) {
                return Err(ConfigError::DuplicateDevice(id));
            }
        }
        Ok(())
    }

    /// Exchange timeouts derived from this configuration.
    #[must_use]
    pub fn timeouts(&self) -> ExchangeTimeouts {
        ExchangeTimeouts {
            connect: Duration::from_secs(self.connect_timeout_secs),
            read: Duration::from_secs(self.read_timeout_secs),
        }
    }

    /// Interval between background polls.
    #[must_use]
    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs)
    }
}
