//! Fixed protocol constants that should NOT be changed.
//!
//! These values are defined by the SoX sound server's line protocol and
//! changing them would break compatibility with deployed servers.

// ─────────────────────────────────────────────────────────────────────────────
// Transport
// ─────────────────────────────────────────────────────────────────────────────

/// TCP port the sound server listens on unless configured otherwise.
pub const DEFAULT_PORT: u16 = 7777;

/// Timeout for establishing the TCP connection (seconds).
pub const CONNECT_TIMEOUT_SECS: u64 = 5;

/// Timeout for writing the request and reading the reply (seconds).
pub const READ_TIMEOUT_SECS: u64 = 5;

/// Maximum size of a server reply (bytes).
///
/// The server answers with a single short status line; anything beyond this
/// is not read.
pub const MAX_REPLY_BYTES: usize = 256;

// ─────────────────────────────────────────────────────────────────────────────
// Request / Reply Grammar
// ─────────────────────────────────────────────────────────────────────────────

/// Separator between request fields and between reply pairs.
pub const FIELD_SEPARATOR: char = ';';

/// Separator between a reply key and its value.
pub const PAIR_SEPARATOR: char = '=';

/// Media id the server interprets as "stop playback".
pub const STOP_MEDIA_ID: &str = "stop";

/// Reply key carrying the server's volume level.
pub const REPLY_KEY_VOLUME: &str = "volume";

/// Reply key carrying the server's playback flag.
pub const REPLY_KEY_PLAYING: &str = "playing";

/// The only `playing` value the server uses for "true".
pub const REPLY_PLAYING_TRUE: &str = "True";

// ─────────────────────────────────────────────────────────────────────────────
// Volume
// ─────────────────────────────────────────────────────────────────────────────

/// Increment applied by a single volume-up / volume-down step.
pub const VOLUME_STEP: f64 = 0.05;

// ─────────────────────────────────────────────────────────────────────────────
// Host Integration
// ─────────────────────────────────────────────────────────────────────────────

/// Default display name for a device that was configured without one.
pub const DEFAULT_NAME: &str = "SoX";

/// Default interval between state refresh polls (seconds).
pub const DEFAULT_POLL_INTERVAL_SECS: u64 = 10;
