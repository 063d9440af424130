//! Trading signal module
//!
//! Signals emitted by the trader and the listeners that consume them

mod listener;
mod types;

pub use listener::LoggingListener;
pub use types::{SignalKind, TradingSignal};

/// Consumer of emitted trading signals
pub trait TradingSignalListener: Send {
    /// Name used for registration and error reporting
    fn name(&self) -> &str;

    /// Handle one signal; errors abort the trader run
    fn on_trading_signal(&mut self, signal: &TradingSignal) -> anyhow::Result<()>;
}
