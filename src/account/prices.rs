//! Price lookup for the simulated account

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use std::collections::HashMap;

/// Source of execution prices
pub trait PriceSource: Send {
    /// Price of `instrument_id` at `timestamp`, if known
    fn price(&self, instrument_id: &str, timestamp: DateTime<Utc>) -> Option<Decimal>;
}

/// Fixed price per instrument
#[derive(Debug, Clone, Default)]
pub struct StaticPrices {
    prices: HashMap<String, Decimal>,
}

impl StaticPrices {
    pub fn new(prices: HashMap<String, Decimal>) -> Self {
        Self { prices }
    }

    pub fn with_price(mut self, instrument_id: impl Into<String>, price: Decimal) -> Self {
        self.prices.insert(instrument_id.into(), price);
        self
    }
}

impl PriceSource for StaticPrices {
    fn price(&self, instrument_id: &str, _timestamp: DateTime<Utc>) -> Option<Decimal> {
        self.prices.get(instrument_id).copied()
    }
}
