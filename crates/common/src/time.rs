//! Wall-clock helpers. Components take `now` as a parameter wherever a
//! decision depends on time; only the outermost callers reach for these.

use std::time::{SystemTime, UNIX_EPOCH};

/// Current Unix time in seconds. Clamps to 0 on a pre-epoch clock.
#[must_use]
pub fn unix_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}

/// Current Unix time in milliseconds.
#[must_use]
pub fn unix_now_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}
