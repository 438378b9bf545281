//! Wall-clock access shared by the store and its consumers.

use std::time::SystemTime;
use std::time::UNIX_EPOCH;

/// Current Unix timestamp in milliseconds.
///
/// Returns 0 if system time is before the Unix epoch (should never
/// happen on properly configured systems, but prevents panics).
#[inline]
pub fn now_unix_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}
