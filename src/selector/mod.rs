//! Target selection module
//!
//! Selectors score candidate instruments at their own cadence; a comparator
//! reduces the selectors of one level into a bounded candidate set

mod comparator;
mod scripted;

pub use comparator::{LimitSelectorsComparator, SelectorsComparator, DEFAULT_LIMIT};
pub use scripted::StaticSelector;

use crate::level::Level;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A scored candidate instrument
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Target {
    /// Instrument identifier
    pub instrument_id: String,
    /// Selector score
    pub score: f64,
}

impl Target {
    pub fn new(instrument_id: impl Into<String>, score: f64) -> Self {
        Self {
            instrument_id: instrument_id.into(),
            score,
        }
    }
}

/// Trait for target selection strategies
pub trait TargetSelector: Send {
    /// Name used in logs and errors
    fn name(&self) -> &str;

    /// Cadence this selector decides at
    fn level(&self) -> Level;

    /// Scored targets for the bar at `timestamp`
    fn get_targets(&self, timestamp: DateTime<Utc>) -> anyhow::Result<Vec<Target>>;

    /// Advance internal state so data up to `observable_timestamp` is loaded.
    ///
    /// Called in real-time mode; must be idempotent for identical arguments.
    fn move_on(
        &mut self,
        timestamp: DateTime<Utc>,
        observable_timestamp: DateTime<Utc>,
    ) -> anyhow::Result<()>;
}
