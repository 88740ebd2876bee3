//! Tracked device state and the values derived from it.

use std::fmt;
use std::str::FromStr;

use bitflags::bitflags;
use serde::Serialize;

use super::tracker::DeviceError;

/// Last-known state of one device.
///
/// Owned by [`SoxDevice`](super::SoxDevice); hosts read clones of it.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeviceState {
    /// `None` until the first exchange completes or fails.
    pub is_connected: Option<bool>,
    /// Playback flag as last reported by the server.
    pub is_playing: bool,
    /// Volume level in `[0, 1]`, 2 decimals. `None` until known.
    pub volume_level: Option<f64>,
    /// Emulated mute flag.
    pub is_volume_muted: bool,
    /// Volume cached when mute began, restored on unmute.
    pub muted_volume: Option<f64>,
    /// Media id of the last accepted play-media request.
    pub last_media_id: Option<String>,
}

impl DeviceState {
    /// Connectivity as a three-state value.
    #[must_use]
    pub fn connectivity(&self) -> Connectivity {
        match self.is_connected {
            None => Connectivity::Unknown,
            Some(true) => Connectivity::Connected,
            Some(false) => Connectivity::Disconnected,
        }
    }

    /// True once an exchange has succeeded and none has failed since.
    #[must_use]
    pub fn available(&self) -> bool {
        self.is_connected == Some(true)
    }

    /// Playback state as shown to the host.
    #[must_use]
    pub fn playback(&self) -> PlaybackState {
        if self.is_playing {
            PlaybackState::Playing
        } else {
            PlaybackState::Idle
        }
    }

    /// Commands the host may offer for this device right now.
    ///
    /// Volume-related commands (and stop) are only offered once the server
    /// has reported, or the host has set, a volume level.
    #[must_use]
    pub fn supported_features(&self) -> SupportedFeatures {
        let mut features = SupportedFeatures::DEFAULT;
        if self.volume_level.is_some() {
            features |= SupportedFeatures::VOLUME_CONTROLS;
        }
        features
    }
}

/// Connectivity of a device.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Connectivity {
    Unknown,
    Connected,
    Disconnected,
}

impl fmt::Display for Connectivity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unknown => f.write_str("unknown"),
            Self::Connected => f.write_str("connected"),
            Self::Disconnected => f.write_str("disconnected"),
        }
    }
}

/// Playback state exposed to the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PlaybackState {
    Playing,
    Idle,
}

impl fmt::Display for PlaybackState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Playing => f.write_str("playing"),
            Self::Idle => f.write_str("idle"),
        }
    }
}

bitflags! {
    /// Media-player features a device supports.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct SupportedFeatures: u32 {
        const PLAY = 1 << 0;
        const PLAY_MEDIA = 1 << 1;
        const BROWSE_MEDIA = 1 << 2;
        const STOP = 1 << 3;
        const VOLUME_SET = 1 << 4;
        const VOLUME_STEP = 1 << 5;
        const VOLUME_MUTE = 1 << 6;

        /// Always available.
        const DEFAULT = Self::PLAY.bits() | Self::PLAY_MEDIA.bits() | Self::BROWSE_MEDIA.bits();
        /// Available once a volume level is known.
        const VOLUME_CONTROLS = Self::STOP.bits()
            | Self::VOLUME_SET.bits()
            | Self::VOLUME_STEP.bits()
            | Self::VOLUME_MUTE.bits();
    }
}

/// Media types the sound server accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MediaType {
    Music,
    Playlist,
}

impl MediaType {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Music => "music",
            Self::Playlist => "playlist",
        }
    }
}

impl fmt::Display for MediaType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MediaType {
    type Err = DeviceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "music" => Ok(Self::Music),
            "playlist" => Ok(Self::Playlist),
            _ => Err(DeviceError::InvalidMediaType(s.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_state_is_unknown_and_idle() {
        let state = DeviceState::default();
        assert_eq!(state.connectivity(), Connectivity::Unknown);
        assert!(!state.available());
        assert_eq!(state.playback(), PlaybackState::Idle);
        assert!(!state.is_volume_muted);
        assert_eq!(state.volume_level, None);
    }

    #[test]
    fn connectivity_follows_flag() {
        let mut state = DeviceState {
            is_connected: Some(true),
            ..Default::default()
        };
        assert_eq!(state.connectivity(), Connectivity::Connected);
        assert!(state.available());

        state.is_connected = Some(false);
        assert_eq!(state.connectivity(), Connectivity::Disconnected);
        assert!(!state.available());
    }

    #[test]
    fn volume_features_require_known_volume() {
        let mut state = DeviceState::default();
        assert_eq!(state.supported_features(), SupportedFeatures::DEFAULT);
        assert!(!state.supported_features().contains(SupportedFeatures::STOP));

        state.volume_level = Some(0.4);
        let features = state.supported_features();
        assert!(features.contains(SupportedFeatures::DEFAULT));
        assert!(features.contains(SupportedFeatures::VOLUME_MUTE));
        assert!(features.contains(SupportedFeatures::STOP));
    }

    #[test]
    fn media_type_parsing() {
        assert_eq!("music".parse::<MediaType>().unwrap(), MediaType::Music);
        assert_eq!("playlist".parse::<MediaType>().unwrap(), MediaType::Playlist);
        assert!(matches!(
            "video".parse::<MediaType>(),
            Err(DeviceError::InvalidMediaType(t)) if t == "video"
        ));
    }

    #[test]
    fn media_type_must_match_exactly() {
        for input in ["Music", " music ", "PLAYLIST", "playlist\n", ""] {
            assert!(
                matches!(
                    input.parse::<MediaType>(),
                    Err(DeviceError::InvalidMediaType(ref t)) if t == input
                ),
                "{input:?} was accepted"
            );
        }
    }

    #[test]
    fn state_serializes_camel_case() {
        let state = DeviceState {
            is_connected: Some(true),
            volume_level: Some(0.5),
            ..Default::default()
        };
        let json = serde_json::to_value(&state).unwrap();
        assert_eq!(json["isConnected"], true);
        assert_eq!(json["volumeLevel"], 0.5);
        assert_eq!(json["isVolumeMuted"], false);
    }
}
