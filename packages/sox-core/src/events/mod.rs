//! Event system for device state changes.
//!
//! This module provides:
//! - [`EventEmitter`] trait for the device tracker to emit events
//! - [`BroadcastEventBridge`] for fan-out to any number of subscribers
//! - [`DeviceEvent`], the state transitions a host may want to react to

mod bridge;
mod emitter;

pub use bridge::BroadcastEventBridge;
pub use emitter::{EventEmitter, LoggingEventEmitter, NoopEventEmitter};

use serde::Serialize;

/// Events emitted when a device's tracked state changes.
///
/// Events are only emitted for actual transitions; an exchange that reports
/// the same values as before emits nothing.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum DeviceEvent {
    /// The device became reachable or unreachable.
    ConnectivityChanged {
        /// The device's unique id (`host:port` by default).
        #[serde(rename = "deviceId")]
        device_id: String,
        connected: bool,
        /// Unix timestamp in milliseconds.
        timestamp: u64,
    },
    /// The server reported a different playback flag.
    PlaybackChanged {
        #[serde(rename = "deviceId")]
        device_id: String,
        #[serde(rename = "isPlaying")]
        is_playing: bool,
        timestamp: u64,
    },
    /// The stored volume level changed (locally or from a reply).
    VolumeChanged {
        #[serde(rename = "deviceId")]
        device_id: String,
        #[serde(rename = "volumeLevel")]
        volume_level: f64,
        timestamp: u64,
    },
    /// The emulated mute flag changed.
    MuteChanged {
        #[serde(rename = "deviceId")]
        device_id: String,
        muted: bool,
        timestamp: u64,
    },
}

impl DeviceEvent {
    /// Unique id of the device the event belongs to.
    #[must_use]
    pub fn device_id(&self) -> &str {
        match self {
            Self::ConnectivityChanged { device_id, .. }
            | Self::PlaybackChanged { device_id, .. }
            | Self::VolumeChanged { device_id, .. }
            | Self::MuteChanged { device_id, .. } => device_id,
        }
    }
}
