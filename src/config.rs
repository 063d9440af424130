//! Configuration types for mtf-trader

use crate::account::{SimAccount, StaticPrices};
use crate::level::Level;
use crate::selector::{StaticSelector, Target, TargetSelector, DEFAULT_LIMIT};
use crate::telemetry::LogFormat;
use crate::trader::{TraderConfig, UndecidedLevelPolicy, Universe};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Deserialize;
use std::collections::HashMap;

/// Root configuration structure
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub trader: TraderSection,
    #[serde(default)]
    pub comparator: ComparatorConfig,
    pub account: AccountConfig,
    pub telemetry: TelemetryConfig,
    #[serde(default)]
    pub selectors: Vec<SelectorConfig>,
}

/// Trader loop configuration
#[derive(Debug, Clone, Deserialize)]
pub struct TraderSection {
    #[serde(default = "default_trader_name")]
    pub name: String,
    #[serde(default)]
    pub universe: Universe,
    pub start: Option<DateTime<Utc>>,
    pub end: Option<DateTime<Utc>>,
    #[serde(default = "default_level")]
    pub level: Level,
    #[serde(default)]
    pub real_time: bool,
    #[serde(default)]
    pub kdata_uses_begin_timestamp: bool,
    #[serde(default)]
    pub undecided_level: UndecidedLevelPolicy,
}

fn default_trader_name() -> String {
    "trader".to_string()
}
fn default_level() -> Level {
    Level::Day1
}

/// Selector comparator configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ComparatorConfig {
    /// Maximum instruments kept per level
    #[serde(default = "default_limit")]
    pub limit: usize,
}

fn default_limit() -> usize {
    DEFAULT_LIMIT
}

impl Default for ComparatorConfig {
    fn default() -> Self {
        Self {
            limit: DEFAULT_LIMIT,
        }
    }
}

/// Simulated account configuration
#[derive(Debug, Clone, Deserialize)]
pub struct AccountConfig {
    pub initial_cash: Decimal,
    #[serde(default)]
    pub fee_rate: Decimal,
    /// Fill price per instrument
    #[serde(default)]
    pub prices: HashMap<String, Decimal>,
}

/// Telemetry configuration
#[derive(Debug, Clone, Deserialize)]
pub struct TelemetryConfig {
    pub metrics_port: Option<u16>,
    pub log_level: String,
    #[serde(default)]
    pub log_format: LogFormat,
}

/// A selector returning fixed targets
#[derive(Debug, Clone, Deserialize)]
pub struct SelectorConfig {
    pub name: String,
    pub level: Level,
    #[serde(default)]
    pub targets: Vec<Target>,
}

impl Config {
    /// Load configuration from a TOML file
    pub fn load(path: impl AsRef<std::path::Path>) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        Ok(config)
    }

    /// Trader construction settings
    pub fn trader_config(&self) -> TraderConfig {
        TraderConfig {
            name: self.trader.name.clone(),
            universe: self.trader.universe.clone(),
            start: self.trader.start,
            end: self.trader.end,
            level: self.trader.level,
            real_time: self.trader.real_time,
            kdata_uses_begin_timestamp: self.trader.kdata_uses_begin_timestamp,
            undecided_level: self.trader.undecided_level,
        }
    }

    /// Configured selectors, with targets outside the universe dropped
    pub fn build_selectors(&self) -> Vec<Box<dyn TargetSelector>> {
        let universe = &self.trader.universe;
        self.selectors
            .iter()
            .map(|s| {
                let targets = s
                    .targets
                    .iter()
                    .filter(|t| universe.accepts(&t.instrument_id))
                    .cloned()
                    .collect();
                Box::new(StaticSelector::new(s.name.clone(), s.level, targets))
                    as Box<dyn TargetSelector>
            })
            .collect()
    }

    /// Simulated account named after the trader
    pub fn build_account(&self) -> SimAccount {
        SimAccount::new(
            self.trader.name.clone(),
            self.account.initial_cash,
            self.account.fee_rate,
            Box::new(StaticPrices::new(self.account.prices.clone())),
        )
    }
}
