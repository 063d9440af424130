//! Simulated paper account

use super::{Account, AccountSnapshot, PositionSnapshot, PriceSource};
use crate::signal::{SignalKind, TradingSignal, TradingSignalListener};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A long position held by the simulated account
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimPosition {
    /// Total long quantity
    pub long_amount: Decimal,
    /// Quantity that can be sold
    pub available_long: Decimal,
    /// Volume weighted entry price
    pub average_cost: Decimal,
}

/// A simulated execution
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimTrade {
    pub instrument_id: String,
    pub kind: SignalKind,
    pub price: Decimal,
    pub quantity: Decimal,
    pub fees: Decimal,
    pub timestamp: DateTime<Utc>,
}

/// Paper account filling every signal at the price source's quote
pub struct SimAccount {
    name: String,
    cash: Decimal,
    fee_rate: Decimal,
    prices: Box<dyn PriceSource>,
    positions: BTreeMap<String, SimPosition>,
    trades: Vec<SimTrade>,
    equity_history: Vec<(DateTime<Utc>, Decimal)>,
}

impl SimAccount {
    /// Create a new simulated account
    pub fn new(
        name: impl Into<String>,
        initial_cash: Decimal,
        fee_rate: Decimal,
        prices: Box<dyn PriceSource>,
    ) -> Self {
        Self {
            name: name.into(),
            cash: initial_cash,
            fee_rate,
            prices,
            positions: BTreeMap::new(),
            trades: vec![],
            equity_history: vec![],
        }
    }

    pub fn cash(&self) -> Decimal {
        self.cash
    }

    pub fn positions(&self) -> &BTreeMap<String, SimPosition> {
        &self.positions
    }

    pub fn trades(&self) -> &[SimTrade] {
        &self.trades
    }

    /// Equity recorded at each session close
    pub fn equity_history(&self) -> &[(DateTime<Utc>, Decimal)] {
        &self.equity_history
    }

    /// Cash plus positions marked at the current quote (entry price when unquoted)
    pub fn equity(&self, timestamp: DateTime<Utc>) -> Decimal {
        let marked: Decimal = self
            .positions
            .iter()
            .map(|(id, p)| {
                let price = self.prices.price(id, timestamp).unwrap_or(p.average_cost);
                p.long_amount * price
            })
            .sum();
        self.cash + marked
    }

    fn open_long(&mut self, signal: &TradingSignal) {
        let Some(order_money) = signal.order_money else {
            tracing::warn!(instrument = %signal.instrument_id, "Open signal without order money");
            return;
        };
        let order_money = order_money.min(self.cash);
        let Some(price) = self.quote(signal) else {
            return;
        };

        let fees = order_money * self.fee_rate;
        let quantity = (order_money - fees) / price;
        if quantity <= Decimal::ZERO {
            tracing::warn!(instrument = %signal.instrument_id, %order_money, "Nothing to buy");
            return;
        }

        self.cash -= order_money;
        let position = self
            .positions
            .entry(signal.instrument_id.clone())
            .or_insert(SimPosition {
                long_amount: Decimal::ZERO,
                available_long: Decimal::ZERO,
                average_cost: Decimal::ZERO,
            });
        let cost = position.long_amount * position.average_cost + quantity * price;
        position.long_amount += quantity;
        position.available_long += quantity;
        position.average_cost = cost / position.long_amount;

        self.record(signal, price, quantity, fees);
    }

    fn close_long(&mut self, signal: &TradingSignal) {
        let pct = signal.position_pct.unwrap_or(Decimal::ONE);
        let Some(available) = self
            .positions
            .get(&signal.instrument_id)
            .map(|p| p.available_long)
        else {
            tracing::warn!(
                instrument = %signal.instrument_id,
                "Close signal for unheld instrument"
            );
            return;
        };
        let Some(price) = self.quote(signal) else {
            return;
        };

        let quantity = available * pct;
        let proceeds = quantity * price;
        let fees = proceeds * self.fee_rate;
        self.cash += proceeds - fees;

        if let Some(position) = self.positions.get_mut(&signal.instrument_id) {
            position.long_amount -= quantity;
            position.available_long -= quantity;
            if position.long_amount <= Decimal::ZERO {
                self.positions.remove(&signal.instrument_id);
            }
        }

        self.record(signal, price, quantity, fees);
    }

    fn quote(&self, signal: &TradingSignal) -> Option<Decimal> {
        let price = self
            .prices
            .price(&signal.instrument_id, signal.timestamp)
            .filter(|p| *p > Decimal::ZERO);
        if price.is_none() {
            tracing::warn!(
                instrument = %signal.instrument_id,
                timestamp = %signal.timestamp,
                "No price, signal skipped"
            );
        }
        price
    }

    fn record(&mut self, signal: &TradingSignal, price: Decimal, quantity: Decimal, fees: Decimal) {
        tracing::info!(
            account = %self.name,
            instrument = %signal.instrument_id,
            kind = signal.kind.as_str(),
            %price,
            %quantity,
            %fees,
            cash = %self.cash,
            "Simulated fill"
        );
        self.trades.push(SimTrade {
            instrument_id: signal.instrument_id.clone(),
            kind: signal.kind,
            price,
            quantity,
            fees,
            timestamp: signal.timestamp,
        });
    }
}

impl TradingSignalListener for SimAccount {
    fn name(&self) -> &str {
        &self.name
    }

    fn on_trading_signal(&mut self, signal: &TradingSignal) -> anyhow::Result<()> {
        match signal.kind {
            SignalKind::OpenLong => self.open_long(signal),
            SignalKind::CloseLong => self.close_long(signal),
        }
        Ok(())
    }
}

impl Account for SimAccount {
    fn latest_account(&self) -> anyhow::Result<AccountSnapshot> {
        Ok(AccountSnapshot {
            cash: self.cash,
            positions: self
                .positions
                .iter()
                .map(|(id, p)| PositionSnapshot {
                    instrument_id: id.clone(),
                    available_long: p.available_long,
                })
                .collect(),
        })
    }

    fn on_trading_open(&mut self, timestamp: DateTime<Utc>) -> anyhow::Result<()> {
        tracing::debug!(account = %self.name, %timestamp, "Trading session open");
        Ok(())
    }

    fn on_trading_close(&mut self, timestamp: DateTime<Utc>) -> anyhow::Result<()> {
        let equity = self.equity(timestamp);
        tracing::info!(
            account = %self.name,
            %timestamp,
            %equity,
            cash = %self.cash,
            "Trading session close"
        );
        self.equity_history.push((timestamp, equity));
        Ok(())
    }

    fn on_finish(&mut self, last_timestamp: Option<DateTime<Utc>>) -> anyhow::Result<()> {
        let equity = last_timestamp
            .map(|ts| self.equity(ts))
            .unwrap_or(self.cash);
        tracing::info!(
            account = %self.name,
            %equity,
            trades = self.trades.len(),
            open_positions = self.positions.len(),
            "Account finished"
        );
        Ok(())
    }
}
