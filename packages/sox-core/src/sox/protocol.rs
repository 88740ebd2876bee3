//! Request line building and reply parsing for the SoX line protocol.
//!
//! A request is a single `"<media_id>;<volume>;"` line. A reply is free text;
//! when it contains both `=` and `;` it is read as a `key=value;` list.
//! Everything here is pure string handling, the socket work lives in
//! [`exchange`](super::exchange).

use std::collections::HashMap;

use crate::protocol_constants::{
    FIELD_SEPARATOR, PAIR_SEPARATOR, REPLY_KEY_PLAYING, REPLY_KEY_VOLUME, REPLY_PLAYING_TRUE,
    STOP_MEDIA_ID,
};
use crate::utils::{format_volume, normalize_volume};

// ─────────────────────────────────────────────────────────────────────────────
// Request
// ─────────────────────────────────────────────────────────────────────────────

/// One command sent to the sound server.
#[derive(Debug, Clone, PartialEq)]
pub struct ExchangeRequest {
    /// Opaque media id interpreted by the server. Empty means "status only".
    pub media_id: String,
    /// Desired volume, normalized to `[0, 1]` with 2 decimals. `None` leaves the field empty.
    pub volume_level: Option<f64>,
}

impl ExchangeRequest {
    /// Creates a request, normalizing the volume hint.
    #[must_use]
    pub fn new(media_id: impl Into<String>, volume_level: Option<f64>) -> Self {
        Self {
            media_id: media_id.into(),
            volume_level: volume_level.map(normalize_volume),
        }
    }

    /// Request that only asks the server for its status.
    #[must_use]
    pub fn status(volume_level: Option<f64>) -> Self {
        Self::new("", volume_level)
    }

    /// Request that stops playback.
    #[must_use]
    pub fn stop(volume_level: Option<f64>) -> Self {
        Self::new(STOP_MEDIA_ID, volume_level)
    }

    /// Serializes the request into its wire form.
    #[must_use]
    pub fn to_line(&self) -> String {
        let volume = self.volume_level.map(format_volume).unwrap_or_default();
        format!(
            "{}{sep}{}{sep}",
            self.media_id,
            volume,
            sep = FIELD_SEPARATOR
        )
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Reply
// ─────────────────────────────────────────────────────────────────────────────

/// Fields the server reported in one reply.
///
/// Each field is `None` when the reply did not carry it. Callers must leave
/// their own state untouched for absent fields.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ExchangeReply {
    pub is_playing: Option<bool>,
    pub volume_level: Option<f64>,
}

impl ExchangeReply {
    /// Returns true if the reply carried no recognized field.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.is_playing.is_none() && self.volume_level.is_none()
    }
}

/// Splits a reply into its `key=value` pairs.
///
/// Returns an empty map unless the text contains both `=` and `;`. Segments
/// without `=` (including the empty tail after a trailing `;`) are skipped.
/// Keys and values are trimmed; the first `=` splits a segment.
#[must_use]
pub fn parse_reply_fields(text: &str) -> HashMap<String, String> {
    if !(text.contains(PAIR_SEPARATOR) && text.contains(FIELD_SEPARATOR)) {
        return HashMap::new();
    }

    text.split(FIELD_SEPARATOR)
        .filter_map(|segment| segment.split_once(PAIR_SEPARATOR))
        .map(|(k, v)| (k.trim().to_string(), v.trim().to_string()))
        .filter(|(k, _)| !k.is_empty())
        .collect()
}

/// Parses a decoded reply into the recognized status fields.
///
/// Trailing whitespace is stripped first. Unparseable volume values are
/// logged and treated as absent; parsed volumes are normalized.
#[must_use]
pub fn parse_reply(text: &str) -> ExchangeReply {
    let fields = parse_reply_fields(text.trim_end());

    let volume_level = fields.get(REPLY_KEY_VOLUME).and_then(|raw| {
        match raw.parse::<f64>() {
            Ok(v) if v.is_finite() => Some(normalize_volume(v)),
            _ => {
                log::warn!("[SoX] Ignoring unparseable volume in reply: {:?}", raw);
                None
            }
        }
    });

    let is_playing = fields
        .get(REPLY_KEY_PLAYING)
        .map(|raw| raw == REPLY_PLAYING_TRUE);

    ExchangeReply {
        is_playing,
        volume_level,
    }
}

/// Decodes raw reply bytes and parses them.
///
/// Bytes that are not valid UTF-8 are a protocol anomaly, not an error: the
/// reply degrades to "no fields reported".
#[must_use]
pub fn decode_reply(bytes: &[u8]) -> ExchangeReply {
    match std::str::from_utf8(bytes) {
        Ok(text) => parse_reply(text),
        Err(e) => {
            log::warn!("[SoX] Reply is not valid UTF-8 ({}), treating as empty", e);
            ExchangeReply::default()
        }
    }
}
