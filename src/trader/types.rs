//! Trader types

use crate::calendar::{InstrumentType, Venue};
use crate::level::Level;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Trader errors
#[derive(Debug, Error)]
pub enum TraderError {
    /// Start or end timestamp not configured
    #[error("Start and end timestamps are required")]
    MissingTimeRange,
    /// Start lies after end
    #[error("Start {start} is after end {end}")]
    InvalidTimeRange {
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    },
    /// Real-time mode with an end timestamp already in the past
    #[error("Real-time mode needs an end timestamp in the future (end {end}, now {now})")]
    RealTimeEndInPast {
        end: DateTime<Utc>,
        now: DateTime<Utc>,
    },
    /// Universe without any exchange
    #[error("At least one exchange is required")]
    NoExchange,
    /// Comparator without selectors
    #[error("No selectors configured")]
    NoSelectors,
    /// Loop level coarser than the finest selector level
    #[error("Trader level {level} is coarser than the finest selector level {finest}")]
    LevelTooCoarse { level: Level, finest: Level },
    /// Trader and calendar disagree on how bars are stamped
    #[error("Calendar bar stamping does not match kdata_uses_begin_timestamp = {configured}")]
    TimestampConventionMismatch { configured: bool },
    /// Non-positive comparator limit
    #[error("Comparator limit must be positive")]
    InvalidLimit,
    /// A selector failed while deciding or moving on
    #[error("Selector {name} failed at level {level}: {source}")]
    Selector {
        name: String,
        level: Level,
        #[source]
        source: anyhow::Error,
    },
    /// The account collaborator failed
    #[error("Account failed: {source}")]
    Account {
        #[source]
        source: anyhow::Error,
    },
    /// A signal listener failed
    #[error("Listener {name} failed: {source}")]
    Listener {
        name: String,
        #[source]
        source: anyhow::Error,
    },
}

impl TraderError {
    pub(crate) fn account_failed(source: anyhow::Error) -> Self {
        TraderError::Account { source }
    }
}

/// How a level without any decision yet takes part in the consensus
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UndecidedLevelPolicy {
    /// Leave the level out of the intersection
    #[default]
    Skip,
    /// Treat the level as decided-empty, blocking any consensus
    Block,
}

/// Instrument universe the trader works on
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Universe {
    /// Explicit instrument ids; `None` admits any
    #[serde(default)]
    pub instruments: Option<Vec<String>>,
    #[serde(default)]
    pub instrument_type: InstrumentType,
    pub exchanges: Vec<String>,
    /// Instrument codes, matched against the last `_`-separated id segment
    #[serde(default)]
    pub codes: Option<Vec<String>>,
}

impl Universe {
    /// Venue of the primary exchange
    pub fn venue(&self) -> Option<Venue> {
        self.exchanges
            .first()
            .map(|exchange| Venue::new(self.instrument_type, exchange.clone()))
    }

    /// Whether `instrument_id` passes the instrument and code filters
    pub fn accepts(&self, instrument_id: &str) -> bool {
        let listed = self
            .instruments
            .as_ref()
            .map_or(true, |ids| ids.iter().any(|id| id == instrument_id));
        let code = instrument_id.rsplit('_').next().unwrap_or(instrument_id);
        let coded = self
            .codes
            .as_ref()
            .map_or(true, |codes| codes.iter().any(|c| c == code));
        listed && coded
    }
}

impl Default for Universe {
    fn default() -> Self {
        Self {
            instruments: None,
            instrument_type: InstrumentType::Stock,
            exchanges: vec!["sh".to_string(), "sz".to_string()],
            codes: None,
        }
    }
}

/// Construction-time trader configuration
#[derive(Debug, Clone)]
pub struct TraderConfig {
    /// Trader name, used for the account and logs
    pub name: String,
    pub universe: Universe,
    pub start: Option<DateTime<Utc>>,
    pub end: Option<DateTime<Utc>>,
    /// Cadence the loop ticks at
    pub level: Level,
    /// Pace the loop against the wall clock
    pub real_time: bool,
    /// Bars are stamped with their begin time rather than their end time
    pub kdata_uses_begin_timestamp: bool,
    pub undecided_level: UndecidedLevelPolicy,
}

impl Default for TraderConfig {
    fn default() -> Self {
        Self {
            name: "trader".to_string(),
            universe: Universe::default(),
            start: None,
            end: None,
            level: Level::Day1,
            real_time: false,
            kdata_uses_begin_timestamp: false,
            undecided_level: UndecidedLevelPolicy::Skip,
        }
    }
}

/// Outcome of a trader run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunSummary {
    /// Ticks fully handled
    pub ticks: u64,
    pub open_signals: u64,
    pub close_signals: u64,
    /// Last tick handled
    pub handled_timestamp: Option<DateTime<Utc>>,
    /// Run stopped by the shutdown token
    pub cancelled: bool,
}
