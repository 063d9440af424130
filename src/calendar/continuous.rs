//! Round-the-clock calendar with UTC-day sessions

use super::{TradingCalendar, Venue};
use crate::level::Level;
use chrono::{DateTime, Utc};

/// Calendar for venues that trade continuously
///
/// Ticks are aligned on UTC epoch multiples of the tick level. A session is
/// one UTC day. `uses_begin_timestamp` selects whether a tick is stamped with
/// the start (`[t, t + tick)`) or the end (`[t - tick, t)`) of its bar.
#[derive(Debug, Clone)]
pub struct ContinuousCalendar {
    tick: Level,
    uses_begin_timestamp: bool,
}

impl ContinuousCalendar {
    pub fn new(tick: Level, uses_begin_timestamp: bool) -> Self {
        Self {
            tick,
            uses_begin_timestamp,
        }
    }

    /// Time at which the bar stamped `timestamp` has ended
    fn bar_end(&self, timestamp: DateTime<Utc>) -> DateTime<Utc> {
        if self.uses_begin_timestamp {
            timestamp + self.tick.duration()
        } else {
            timestamp
        }
    }

    /// Time at which the bar stamped `timestamp` started
    fn bar_begin(&self, timestamp: DateTime<Utc>) -> DateTime<Utc> {
        if self.uses_begin_timestamp {
            timestamp
        } else {
            timestamp - self.tick.duration()
        }
    }
}

impl TradingCalendar for ContinuousCalendar {
    fn iterate_timestamps<'a>(
        &'a self,
        _venue: &Venue,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        level: Level,
    ) -> Box<dyn Iterator<Item = DateTime<Utc>> + Send + 'a> {
        Box::new(TimestampIter::new(start, end, level))
    }

    fn uses_begin_timestamp(&self) -> bool {
        self.uses_begin_timestamp
    }

    fn is_open_time(&self, _venue: &Venue, timestamp: DateTime<Utc>) -> bool {
        Level::Day1.is_boundary(self.bar_begin(timestamp))
    }

    fn is_close_time(&self, venue: &Venue, timestamp: DateTime<Utc>) -> bool {
        self.is_in_finished_timestamps(venue, timestamp, Level::Day1)
    }

    fn is_in_finished_timestamps(
        &self,
        _venue: &Venue,
        timestamp: DateTime<Utc>,
        level: Level,
    ) -> bool {
        level.is_boundary(self.bar_end(timestamp))
    }
}

/// Iterates level-aligned timestamps between two bounds (inclusive)
#[derive(Debug, Clone)]
pub struct TimestampIter {
    next: DateTime<Utc>,
    end: DateTime<Utc>,
    level: Level,
}

impl TimestampIter {
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>, level: Level) -> Self {
        Self {
            next: level.ceil(start),
            end,
            level,
        }
    }
}

impl Iterator for TimestampIter {
    type Item = DateTime<Utc>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.next > self.end {
            return None;
        }
        let current = self.next;
        self.next = current + self.level.duration();
        Some(current)
    }
}
