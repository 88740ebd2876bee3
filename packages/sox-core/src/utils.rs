//! General utilities shared across the crate.

use std::time::{SystemTime, UNIX_EPOCH};

// ─────────────────────────────────────────────────────────────────────────────
// Time Utilities
// ─────────────────────────────────────────────────────────────────────────────

/// Returns the current Unix timestamp in milliseconds.
///
/// Returns 0 if the system clock is before the Unix epoch (shouldn't happen in practice).
#[must_use]
pub fn now_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}

// ─────────────────────────────────────────────────────────────────────────────
// Volume Utilities
// ─────────────────────────────────────────────────────────────────────────────

/// Clamps a volume level into `[0.0, 1.0]` and rounds it to 2 decimals.
///
/// Every volume the crate sends or stores passes through here. NaN maps to 0.
#[must_use]
pub fn normalize_volume(level: f64) -> f64 {
    if level.is_nan() {
        return 0.0;
    }
    let rounded = (level.clamp(0.0, 1.0) * 100.0).round() / 100.0;
    // Avoid emitting "-0.0" on the wire.
    rounded + 0.0
}

/// Formats a volume level for the request line.
///
/// Whole numbers keep one decimal place (`1.0`, `0.0`) so the server always
/// receives a float literal; other values use the shortest representation.
#[must_use]
pub fn format_volume(level: f64) -> String {
    if level.fract() == 0.0 {
        format!("{:.1}", level)
    } else {
        level.to_string()
    }
}
