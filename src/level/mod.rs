//! Trading cadence levels
//!
//! A [`Level`] is the granularity at which a selector decides and at which the
//! trader iterates ticks. Levels are totally ordered: finer levels compare
//! less than coarser ones.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Trading cadence
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Level {
    #[serde(rename = "1m")]
    Min1,
    #[serde(rename = "5m")]
    Min5,
    #[serde(rename = "15m")]
    Min15,
    #[serde(rename = "30m")]
    Min30,
    #[serde(rename = "1h")]
    Hour1,
    #[serde(rename = "4h")]
    Hour4,
    #[serde(rename = "1d")]
    Day1,
}

/// Error returned when parsing an unknown level string
#[derive(Debug, Error, PartialEq, Eq)]
#[error("Unknown level: {0}")]
pub struct ParseLevelError(pub String);

impl Level {
    /// All supported levels, finest first
    pub const ALL: [Level; 7] = [
        Level::Min1,
        Level::Min5,
        Level::Min15,
        Level::Min30,
        Level::Hour1,
        Level::Hour4,
        Level::Day1,
    ];

    /// Length of one bar in seconds
    pub const fn duration_seconds(self) -> i64 {
        match self {
            Level::Min1 => 60,
            Level::Min5 => 5 * 60,
            Level::Min15 => 15 * 60,
            Level::Min30 => 30 * 60,
            Level::Hour1 => 60 * 60,
            Level::Hour4 => 4 * 60 * 60,
            Level::Day1 => 24 * 60 * 60,
        }
    }

    /// Length of one bar
    pub fn duration(self) -> Duration {
        Duration::seconds(self.duration_seconds())
    }

    /// Short label, e.g. `5m`
    pub const fn as_str(self) -> &'static str {
        match self {
            Level::Min1 => "1m",
            Level::Min5 => "5m",
            Level::Min15 => "15m",
            Level::Min30 => "30m",
            Level::Hour1 => "1h",
            Level::Hour4 => "4h",
            Level::Day1 => "1d",
        }
    }

    /// The coarsest supported level
    pub const fn coarsest() -> Level {
        Level::Day1
    }

    /// Seconds from `now` until the bar starting at `from` has fully elapsed.
    ///
    /// Negative when that point already lies in the past.
    pub fn seconds_until_boundary(self, from: DateTime<Utc>, now: DateTime<Utc>) -> i64 {
        (from + self.duration() - now).num_seconds()
    }

    /// Whether `timestamp` sits exactly on a boundary of this level (UTC epoch aligned)
    pub fn is_boundary(self, timestamp: DateTime<Utc>) -> bool {
        timestamp.timestamp().rem_euclid(self.duration_seconds()) == 0
            && timestamp.timestamp_subsec_nanos() == 0
    }

    /// Latest boundary of this level at or before `timestamp`
    pub fn floor(self, timestamp: DateTime<Utc>) -> DateTime<Utc> {
        let secs = timestamp.timestamp();
        let floored = secs - secs.rem_euclid(self.duration_seconds());
        DateTime::from_timestamp(floored, 0).unwrap_or(timestamp)
    }

    /// Earliest boundary of this level at or after `timestamp`
    pub fn ceil(self, timestamp: DateTime<Utc>) -> DateTime<Utc> {
        if self.is_boundary(timestamp) {
            timestamp
        } else {
            self.floor(timestamp) + self.duration()
        }
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Level {
    type Err = ParseLevelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Level::ALL
            .into_iter()
            .find(|level| level.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| ParseLevelError(s.to_string()))
    }
}
