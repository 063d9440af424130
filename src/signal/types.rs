//! Signal types

use crate::level::Level;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Direction of a trading signal
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SignalKind {
    /// Open a long position
    OpenLong,
    /// Close a long position
    CloseLong,
}

impl SignalKind {
    pub const fn as_str(self) -> &'static str {
        match self {
            SignalKind::OpenLong => "open_long",
            SignalKind::CloseLong => "close_long",
        }
    }
}

/// An instruction to open or close a long position in one instrument
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TradingSignal {
    /// Unique signal identifier
    pub id: Uuid,
    /// Instrument to trade
    pub instrument_id: String,
    /// Tick the signal was decided at
    pub timestamp: DateTime<Utc>,
    /// Signal direction
    pub kind: SignalKind,
    /// Cadence of the trader that emitted it
    pub level: Level,
    /// Cash to commit, present on open signals
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub order_money: Option<Decimal>,
    /// Fraction of the position to close, present on close signals
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub position_pct: Option<Decimal>,
}

impl TradingSignal {
    /// Open a long position with `order_money` of cash
    pub fn open_long(
        instrument_id: impl Into<String>,
        timestamp: DateTime<Utc>,
        level: Level,
        order_money: Decimal,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            instrument_id: instrument_id.into(),
            timestamp,
            kind: SignalKind::OpenLong,
            level,
            order_money: Some(order_money),
            position_pct: None,
        }
    }

    /// Close `position_pct` of a long position
    pub fn close_long(
        instrument_id: impl Into<String>,
        timestamp: DateTime<Utc>,
        level: Level,
        position_pct: Decimal,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            instrument_id: instrument_id.into(),
            timestamp,
            kind: SignalKind::CloseLong,
            level,
            order_money: None,
            position_pct: Some(position_pct),
        }
    }
}
