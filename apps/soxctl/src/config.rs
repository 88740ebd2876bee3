//! Command-line configuration.
//!
//! Supports loading from YAML files with environment variable overrides.

use std::path::Path;

use anyhow::{Context, Result};
use serde::Deserialize;
use sox_core::protocol_constants::{
    CONNECT_TIMEOUT_SECS, DEFAULT_POLL_INTERVAL_SECS, READ_TIMEOUT_SECS,
};
use sox_core::DeviceConfig;

/// Configuration loaded from YAML with environment overrides.
///
/// ```yaml
/// devices:
///   - host: 192.168.1.20
///     name: Kitchen
///   - host: sox.local
///     port: 7000
/// poll_interval: 10
/// ```
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct CliConfig {
    /// Sound servers to control.
    pub devices: Vec<DeviceConfig>,

    /// Seconds allowed for establishing a connection.
    /// Override: `SOXCTL_CONNECT_TIMEOUT`
    pub connect_timeout: u64,

    /// Seconds allowed for the reply after connecting.
    /// Override: `SOXCTL_READ_TIMEOUT`
    pub read_timeout: u64,

    /// Seconds between polls in `watch` mode.
    /// Override: `SOXCTL_POLL_INTERVAL`
    pub poll_interval: u64,
}

impl Default for CliConfig {
    fn default() -> Self {
        Self {
            devices: Vec::new(),
            connect_timeout: CONNECT_TIMEOUT_SECS,
            read_timeout: READ_TIMEOUT_SECS,
            poll_interval: DEFAULT_POLL_INTERVAL_SECS,
        }
    }
}

impl CliConfig {
    /// Loads configuration from a YAML file, then applies environment overrides.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut config = if let Some(path) = path {
            let content = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read config file: {}", path.display()))?;
            serde_yaml::from_str(&content)
                .with_context(|| format!("Failed to parse config file: {}", path.display()))?
        } else {
            Self::default()
        };

        config.apply_overrides(|key| std::env::var(key).ok());
        Ok(config)
    }

    /// Applies `SOXCTL_*` overrides looked up through `lookup`.
    ///
    /// Unparseable values are ignored.
    fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(secs) = lookup("SOXCTL_CONNECT_TIMEOUT").and_then(|v| v.parse().ok()) {
            self.connect_timeout = secs;
        }
        if let Some(secs) = lookup("SOXCTL_READ_TIMEOUT").and_then(|v| v.parse().ok()) {
            self.read_timeout = secs;
        }
        if let Some(secs) = lookup("SOXCTL_POLL_INTERVAL").and_then(|v| v.parse().ok()) {
            self.poll_interval = secs;
        }

        // Note: SOXCTL_HOST and SOXCTL_PORT are handled by clap via #[arg(env = ...)] in main.rs
    }

    /// Converts to sox-core's Config type.
    ///
    /// An ad-hoc `host` replaces the configured device list with that one device.
    pub fn to_core_config(&self, host: Option<&str>, port: u16) -> sox_core::Config {
        let devices = match host {
            Some(host) => vec![DeviceConfig::new(host, port)],
            None => self.devices.clone(),
        };

        sox_core::Config {
            devices,
            connect_timeout_secs: self.connect_timeout,
            read_timeout_secs: self.read_timeout,
            poll_interval_secs: self.poll_interval,
        }
    }
}
