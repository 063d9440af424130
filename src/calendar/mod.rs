//! Trading calendar module
//!
//! Timestamp iteration and session/bar-boundary predicates consumed by the
//! trader loop

mod continuous;

pub use continuous::{ContinuousCalendar, TimestampIter};

use crate::level::Level;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Class of instrument traded
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum InstrumentType {
    #[default]
    Stock,
    Future,
    Coin,
    Index,
}

impl fmt::Display for InstrumentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            InstrumentType::Stock => "stock",
            InstrumentType::Future => "future",
            InstrumentType::Coin => "coin",
            InstrumentType::Index => "index",
        };
        f.write_str(s)
    }
}

/// Where the traded instruments are listed
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Venue {
    pub instrument_type: InstrumentType,
    pub exchange: String,
}

impl Venue {
    pub fn new(instrument_type: InstrumentType, exchange: impl Into<String>) -> Self {
        Self {
            instrument_type,
            exchange: exchange.into(),
        }
    }
}

/// Calendar predicates for a venue
pub trait TradingCalendar: Send + Sync {
    /// Ascending tick timestamps in `[start, end]`, spaced by `level`
    fn iterate_timestamps<'a>(
        &'a self,
        venue: &Venue,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        level: Level,
    ) -> Box<dyn Iterator<Item = DateTime<Utc>> + Send + 'a>;

    /// Whether ticks are stamped with the begin of their bar rather than its end
    fn uses_begin_timestamp(&self) -> bool;

    /// Whether `timestamp` is the first tick of a trading session
    fn is_open_time(&self, venue: &Venue, timestamp: DateTime<Utc>) -> bool;

    /// Whether `timestamp` is the last tick of a trading session
    fn is_close_time(&self, venue: &Venue, timestamp: DateTime<Utc>) -> bool;

    /// Whether the bar of `level` has closed at the tick `timestamp`
    fn is_in_finished_timestamps(
        &self,
        venue: &Venue,
        timestamp: DateTime<Utc>,
        level: Level,
    ) -> bool;
}
