//! Per-device state tracker.
//!
//! [`SoxDevice`] maps host commands onto protocol exchanges and reconciles
//! its [`DeviceState`] with whatever the server reports back. Commands on one
//! device are serialized by an internal async lock, so concurrent callers
//! never interleave partial updates.

use std::sync::Arc;

use parking_lot::RwLock;
use thiserror::Error;
use tokio::sync::Mutex;

use super::types::{Connectivity, DeviceState, MediaType, PlaybackState, SupportedFeatures};
use crate::events::{DeviceEvent, EventEmitter};
use crate::protocol_constants::{STOP_MEDIA_ID, VOLUME_STEP};
use crate::sox::{Endpoint, ExchangeError, ExchangeReply, ExchangeRequest, SoxTransport};
use crate::state::DeviceConfig;
use crate::utils::{normalize_volume, now_millis};

// ─────────────────────────────────────────────────────────────────────────────
// Error Types
// ─────────────────────────────────────────────────────────────────────────────

/// Errors returned by device commands.
#[derive(Debug, Error)]
pub enum DeviceError {
    /// The exchange with the server failed. The device is now disconnected.
    #[error(transparent)]
    Exchange(#[from] ExchangeError),

    /// `play_media` was called with a type other than music or playlist.
    #[error("Invalid media type {0}. Only music and playlist are supported")]
    InvalidMediaType(String),
}

/// Convenient Result alias for device commands.
pub type DeviceResult<T> = Result<T, DeviceError>;

// ─────────────────────────────────────────────────────────────────────────────
// Device
// ─────────────────────────────────────────────────────────────────────────────

/// One configured sound server and its last-known state.
pub struct SoxDevice {
    unique_id: String,
    name: String,
    endpoint: Endpoint,
    transport: Arc<dyn SoxTransport>,
    emitter: Arc<dyn EventEmitter>,
    /// Held for the whole duration of a command, including its exchanges.
    command_lock: Mutex<()>,
    /// Never held across an await point.
    state: RwLock<DeviceState>,
}

impl SoxDevice {
    /// Creates a device from its configuration.
    ///
    /// # Arguments
    /// * `config` - Host, port, name and optional id of the device
    /// * `transport` - Transport used for every exchange
    /// * `emitter` - Receives an event for every state transition
    pub fn new(
        config: &DeviceConfig,
        transport: Arc<dyn SoxTransport>,
        emitter: Arc<dyn EventEmitter>,
    ) -> Self {
        Self {
            unique_id: config.unique_id(),
            name: config.display_title(),
            endpoint: config.endpoint(),
            transport,
            emitter,
            command_lock: Mutex::new(()),
            state: RwLock::new(DeviceState::default()),
        }
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Accessors
    // ─────────────────────────────────────────────────────────────────────────

    #[must_use]
    pub fn unique_id(&self) -> &str {
        &self.unique_id
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn endpoint(&self) -> &Endpoint {
        &self.endpoint
    }

    /// Snapshot of the tracked state.
    #[must_use]
    pub fn state(&self) -> DeviceState {
        self.state.read().clone()
    }

    #[must_use]
    pub fn connectivity(&self) -> Connectivity {
        self.state.read().connectivity()
    }

    #[must_use]
    pub fn available(&self) -> bool {
        self.state.read().available()
    }

    #[must_use]
    pub fn playback(&self) -> PlaybackState {
        self.state.read().playback()
    }

    #[must_use]
    pub fn volume_level(&self) -> Option<f64> {
        self.state.read().volume_level
    }

    #[must_use]
    pub fn is_volume_muted(&self) -> bool {
        self.state.read().is_volume_muted
    }

    #[must_use]
    pub fn last_media_id(&self) -> Option<String> {
        self.state.read().last_media_id.clone()
    }

    #[must_use]
    pub fn supported_features(&self) -> SupportedFeatures {
        self.state.read().supported_features()
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Commands
    // ─────────────────────────────────────────────────────────────────────────

    /// Replays the last media id requested through [`play_media`](Self::play_media).
    ///
    /// Does nothing when no media has been requested yet.
    pub async fn play(&self) -> DeviceResult<()> {
        let _guard = self.command_lock.lock().await;
        self.play_locked().await
    }

    /// Stops playback.
    pub async fn stop(&self) -> DeviceResult<()> {
        let _guard = self.command_lock.lock().await;
        self.send(STOP_MEDIA_ID).await
    }

    /// Plays `media_id` and remembers it for later [`play`](Self::play) calls.
    ///
    /// # Arguments
    /// * `media_type` - Must parse as [`MediaType`]; anything else is rejected
    ///   before any network action
    /// * `media_id` - Opaque id (usually a URL) handed to the server
    pub async fn play_media(&self, media_type: &str, media_id: &str) -> DeviceResult<()> {
        let media_type = match media_type.parse::<MediaType>() {
            Ok(t) => t,
            Err(e) => {
                log::error!("[Device] {}: {}", self.unique_id, e);
                return Err(e);
            }
        };

        let _guard = self.command_lock.lock().await;
        log::info!(
            "[Device] {} play {} {:?}",
            self.unique_id,
            media_type,
            media_id
        );
        self.state.write().last_media_id = Some(media_id.to_string());
        self.send(media_id).await
    }

    /// Sets the volume level.
    ///
    /// The level is clamped and rounded to 2 decimals, then stored. The server
    /// only takes a volume together with a play command, so while playing the
    /// change is applied by stopping and replaying the current media, which
    /// restarts the track.
    pub async fn set_volume_level(&self, level: f64) -> DeviceResult<()> {
        let _guard = self.command_lock.lock().await;
        self.set_volume_level_locked(level).await
    }

    /// Mutes or unmutes by setting the volume to zero and restoring it.
    ///
    /// No-op while the volume is unknown or when already in the requested state.
    pub async fn mute(&self, mute: bool) -> DeviceResult<()> {
        let _guard = self.command_lock.lock().await;

        let (volume, muted, cached) = {
            let state = self.state.read();
            (state.volume_level, state.is_volume_muted, state.muted_volume)
        };
        let Some(volume) = volume else {
            return Ok(());
        };
        if muted == mute {
            return Ok(());
        }

        if mute {
            self.state.write().muted_volume = Some(volume);
            self.set_volume_level_locked(0.0).await?;
        } else if let Some(cached) = cached {
            self.set_volume_level_locked(cached).await?;
        }

        self.set_muted(mute);
        Ok(())
    }

    /// Raises the volume by one step, clamped to 1.
    pub async fn volume_up(&self) -> DeviceResult<()> {
        self.step_volume(VOLUME_STEP).await
    }

    /// Lowers the volume by one step, clamped to 0.
    pub async fn volume_down(&self) -> DeviceResult<()> {
        self.step_volume(-VOLUME_STEP).await
    }

    /// Best-effort state refresh.
    ///
    /// Sends a status-only exchange when the device is not known to be
    /// connected, or when a volume level is known. Failures only mark the
    /// device disconnected; they are logged and never returned.
    pub async fn poll(&self) {
        let _guard = self.command_lock.lock().await;

        let should_poll = {
            let state = self.state.read();
            !state.available() || state.volume_level.is_some()
        };
        if !should_poll {
            log::trace!("[Device] {} skipping poll", self.unique_id);
            return;
        }

        if let Err(e) = self.send("").await {
            log::debug!("[Device] Poll of {} failed: {}", self.unique_id, e);
        }
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Internals (command lock held)
    // ─────────────────────────────────────────────────────────────────────────

    async fn play_locked(&self) -> DeviceResult<()> {
        let media_id = self.state.read().last_media_id.clone();
        match media_id {
            Some(media_id) => {
                log::info!("[Device] {} play {:?}", self.unique_id, media_id);
                self.send(&media_id).await
            }
            None => {
                log::debug!("[Device] {} has no media to play", self.unique_id);
                Ok(())
            }
        }
    }

    async fn set_volume_level_locked(&self, level: f64) -> DeviceResult<()> {
        let level = normalize_volume(level);
        self.store_volume(level);

        let is_playing = self.state.read().is_playing;
        if is_playing {
            log::info!(
                "[Device] {} restarting playback at volume {}",
                self.unique_id,
                level
            );
            self.send(STOP_MEDIA_ID).await?;
            self.play_locked().await?;
        }
        Ok(())
    }

    async fn step_volume(&self, delta: f64) -> DeviceResult<()> {
        let _guard = self.command_lock.lock().await;

        let current = self.state.read().volume_level;
        let Some(current) = current else {
            return Ok(());
        };

        // Already at the bound: skip the stop/replay round trip.
        if (delta > 0.0 && current >= 1.0) || (delta < 0.0 && current <= 0.0) {
            return Ok(());
        }

        self.set_volume_level_locked((current + delta).clamp(0.0, 1.0)).await
    }

    /// Performs one exchange carrying the current volume hint and applies
    /// the reply.
    async fn send(&self, media_id: &str) -> DeviceResult<()> {
        let volume_hint = self.state.read().volume_level;
        let request = ExchangeRequest::new(media_id, volume_hint);

        match self.transport.exchange(&self.endpoint, &request).await {
            Ok(reply) => {
                self.apply_reply(&reply);
                Ok(())
            }
            Err(e) => {
                self.set_connected(false);
                Err(e.into())
            }
        }
    }

    // ─────────────────────────────────────────────────────────────────────────
    // State Transitions
    // ─────────────────────────────────────────────────────────────────────────

    /// Marks the device connected and overwrites only the fields the reply
    /// carried.
    fn apply_reply(&self, reply: &ExchangeReply) {
        let mut events = Vec::new();
        {
            let mut state = self.state.write();

            if state.is_connected != Some(true) {
                state.is_connected = Some(true);
                events.push(self.connectivity_event(true));
            }
            if let Some(is_playing) = reply.is_playing {
                if state.is_playing != is_playing {
                    state.is_playing = is_playing;
                    events.push(DeviceEvent::PlaybackChanged {
                        device_id: self.unique_id.clone(),
                        is_playing,
                        timestamp: now_millis(),
                    });
                }
            }
            if let Some(volume_level) = reply.volume_level {
                if state.volume_level != Some(volume_level) {
                    state.volume_level = Some(volume_level);
                    events.push(self.volume_event(volume_level));
                }
            }
        }

        for event in events {
            self.emitter.emit_device(event);
        }
    }

    fn set_connected(&self, connected: bool) {
        let changed = {
            let mut state = self.state.write();
            let changed = state.is_connected != Some(connected);
            state.is_connected = Some(connected);
            changed
        };
        if changed {
            log::info!(
                "[Device] {} is now {}",
                self.unique_id,
                if connected { "available" } else { "unavailable" }
            );
            self.emitter.emit_device(self.connectivity_event(connected));
        }
    }

    fn store_volume(&self, level: f64) {
        let changed = {
            let mut state = self.state.write();
            let changed = state.volume_level != Some(level);
            state.volume_level = Some(level);
            changed
        };
        if changed {
            self.emitter.emit_device(self.volume_event(level));
        }
    }

    fn set_muted(&self, muted: bool) {
        self.state.write().is_volume_muted = muted;
        self.emitter.emit_device(DeviceEvent::MuteChanged {
            device_id: self.unique_id.clone(),
            muted,
            timestamp: now_millis(),
        });
    }

    fn connectivity_event(&self, connected: bool) -> DeviceEvent {
        DeviceEvent::ConnectivityChanged {
            device_id: self.unique_id.clone(),
            connected,
            timestamp: now_millis(),
        }
    }

    fn volume_event(&self, volume_level: f64) -> DeviceEvent {
        DeviceEvent::VolumeChanged {
            device_id: self.unique_id.clone(),
            volume_level,
            timestamp: now_millis(),
        }
    }
}

impl std::fmt::Debug for SoxDevice {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SoxDevice")
            .field("unique_id", &self.unique_id)
            .field("name", &self.name)
            .field("endpoint", &self.endpoint)
            .field("state", &*self.state.read())
            .finish_non_exhaustive()
    }
}
