//! Centralized error types for the SoX core library.
//!
//! Each layer keeps its own `thiserror` enum ([`ExchangeError`],
//! [`DeviceError`], [`ConfigError`]). [`SoxError`] flattens them for hosts
//! that want a single serializable error with a machine-readable code.

use serde::Serialize;
use thiserror::Error;

use crate::device::DeviceError;
use crate::sox::ExchangeError;
use crate::state::ConfigError;

/// Trait for error types that provide machine-readable error codes.
pub trait ErrorCode {
    /// Returns a machine-readable error code.
    fn code(&self) -> &'static str;
}

impl ErrorCode for ExchangeError {
    fn code(&self) -> &'static str {
        match self {
            Self::Connect { .. } | Self::Io { .. } => "cannot_connect",
            Self::Timeout { .. } => "timeout",
        }
    }
}

impl ErrorCode for DeviceError {
    fn code(&self) -> &'static str {
        match self {
            Self::Exchange(e) => e.code(),
            Self::InvalidMediaType(_) => "invalid_media_type",
        }
    }
}

impl ErrorCode for ConfigError {
    fn code(&self) -> &'static str {
        match self {
            Self::EmptyHost => "empty_host",
            Self::InvalidPort(_) => "invalid_port",
            Self::DuplicateDevice(_) => "duplicate_device",
            Self::ZeroDuration(_) => "invalid_duration",
        }
    }
}

/// Crate-wide error type.
#[derive(Debug, Error, Serialize)]
#[serde(tag = "type", content = "details")]
pub enum SoxError {
    /// The sound server refused the connection or was unreachable.
    #[error("Cannot connect: {0}")]
    CannotConnect(String),

    /// The connect or response window elapsed.
    #[error("Timed out: {0}")]
    Timeout(String),

    /// `play_media` was asked for an unsupported media type.
    #[error("Invalid media type: {0}")]
    InvalidMediaType(String),

    /// No device with the given name or id is registered.
    #[error("Device not found: {0}")]
    DeviceNotFound(String),

    /// Configuration failed validation.
    #[error("Configuration error: {0}")]
    Configuration(String),
}

impl SoxError {
    /// Returns a machine-readable error code.
    pub fn code(&self) -> &'static str {
        match self {
            Self::CannotConnect(_) => "cannot_connect",
            Self::Timeout(_) => "timeout",
            Self::InvalidMediaType(_) => "invalid_media_type",
            Self::DeviceNotFound(_) => "device_not_found",
            Self::Configuration(_) => "configuration_error",
        }
    }
}

impl From<ExchangeError> for SoxError {
    fn from(err: ExchangeError) -> Self {
        if err.is_timeout() {
            Self::Timeout(err.to_string())
        } else {
            Self::CannotConnect(err.to_string())
        }
    }
}

impl From<DeviceError> for SoxError {
    fn from(err: DeviceError) -> Self {
        match err {
            DeviceError::Exchange(e) => e.into(),
            DeviceError::InvalidMediaType(t) => Self::InvalidMediaType(t),
        }
    }
}

impl From<ConfigError> for SoxError {
    fn from(err: ConfigError) -> Self {
        Self::Configuration(err.to_string())
    }
}

/// Convenient Result alias using [`SoxError`].
pub type SoxResult<T> = Result<T, SoxError>;

// Re-export layer Result aliases from their defining modules
pub use crate::device::DeviceResult;
pub use crate::sox::ExchangeResult;

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;
    use std::time::Duration;

    use crate::sox::ExchangePhase;

    fn refused() -> ExchangeError {
        ExchangeError::Connect {
            addr: "h:7777".into(),
            source: io::Error::from(io::ErrorKind::ConnectionRefused),
        }
    }

    #[test]
    fn exchange_codes() {
        assert_eq!(refused().code(), "cannot_connect");
        let timeout = ExchangeError::Timeout {
            addr: "h:7777".into(),
            phase: ExchangePhase::Connect,
            elapsed: Duration::from_secs(5),
        };
        assert_eq!(timeout.code(), "timeout");
        assert_eq!(SoxError::from(timeout).code(), "timeout");
    }

    #[test]
    fn device_error_flattens() {
        let err = SoxError::from(DeviceError::from(refused()));
        assert_eq!(err.code(), "cannot_connect");
        assert!(err.to_string().contains("h:7777"));

        let err = SoxError::from(DeviceError::InvalidMediaType("video".into()));
        assert_eq!(err.code(), "invalid_media_type");
    }

    #[test]
    fn config_error_code() {
        assert_eq!(ConfigError::EmptyHost.code(), "empty_host");
        assert_eq!(SoxError::from(ConfigError::EmptyHost).code(), "configuration_error");
    }

    #[test]
    fn serializes_with_type_and_details() {
        let json = serde_json::to_value(SoxError::DeviceNotFound("den".into())).unwrap();
        assert_eq!(json["type"], "DeviceNotFound");
        assert_eq!(json["details"], "den");
    }
}
