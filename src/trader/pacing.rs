//! Real-time pacing math

use crate::level::Level;
use chrono::{DateTime, Utc};
use std::time::Duration;

/// Waits at or below this many seconds are not worth sleeping for
pub const PACING_THRESHOLD_SECS: i64 = 10;

/// Timestamp up to which data of a `level` bar stamped `timestamp` is observable
pub fn observable_timestamp(
    timestamp: DateTime<Utc>,
    level: Level,
    uses_begin_timestamp: bool,
) -> DateTime<Utc> {
    if uses_begin_timestamp {
        timestamp + level.duration()
    } else {
        timestamp
    }
}

/// How long the loop should sleep before handling the tick after `handled`.
///
/// The wait runs until one bar after the handled bar became observable; the
/// loop sleeps half of it, and only when it exceeds [`PACING_THRESHOLD_SECS`].
pub fn pacing_wait(
    handled: DateTime<Utc>,
    level: Level,
    uses_begin_timestamp: bool,
    now: DateTime<Utc>,
) -> Option<Duration> {
    let touching = observable_timestamp(handled, level, uses_begin_timestamp);
    let waiting_seconds = level.seconds_until_boundary(touching, now);
    if waiting_seconds > PACING_THRESHOLD_SECS {
        Some(Duration::from_millis(waiting_seconds as u64 * 500))
    } else {
        None
    }
}
