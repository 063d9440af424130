//! Account module
//!
//! The account is the trader's position-state source and the first listener
//! of every emitted signal

mod prices;
mod sim;

pub use prices::{PriceSource, StaticPrices};
pub use sim::{SimAccount, SimPosition, SimTrade};

use crate::signal::TradingSignalListener;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// A held position as seen by the trader
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PositionSnapshot {
    pub instrument_id: String,
    /// Long quantity that can be sold right now
    pub available_long: Decimal,
}

/// Read-only view of the account
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct AccountSnapshot {
    pub cash: Decimal,
    pub positions: Vec<PositionSnapshot>,
}

impl AccountSnapshot {
    /// Instruments with a positive available long quantity
    pub fn long_holdings(&self) -> BTreeSet<String> {
        self.positions
            .iter()
            .filter(|p| p.available_long > Decimal::ZERO)
            .map(|p| p.instrument_id.clone())
            .collect()
    }
}

/// Account collaborator driven by the trader
pub trait Account: TradingSignalListener {
    /// Latest state of cash and positions
    fn latest_account(&self) -> anyhow::Result<AccountSnapshot>;

    /// Called on the first tick of a trading session
    fn on_trading_open(&mut self, timestamp: DateTime<Utc>) -> anyhow::Result<()>;

    /// Called on the last tick of a trading session
    fn on_trading_close(&mut self, timestamp: DateTime<Utc>) -> anyhow::Result<()>;

    /// Called once when the run ends
    fn on_finish(&mut self, _last_timestamp: Option<DateTime<Utc>>) -> anyhow::Result<()> {
        Ok(())
    }
}
