//! mtf-trader: multi-timeframe target selection and trading signal loop
//!
//! This library provides:
//! - Cadence levels and trading calendar predicates
//! - Pluggable target selectors and a limiting comparator per level
//! - A per-level targets slot and cross-level consensus
//! - The tick-driven trader emitting open/close signals to listeners
//! - A simulated account for paper runs
//! - Logging and Prometheus metrics

pub mod account;
pub mod calendar;
pub mod cli;
pub mod clock;
pub mod config;
pub mod level;
pub mod selector;
pub mod signal;
pub mod telemetry;
pub mod trader;
