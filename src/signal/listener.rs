//! Listener that logs signals in their wire shape

use super::{TradingSignal, TradingSignalListener};

/// Logs every signal as JSON
#[derive(Debug, Default)]
pub struct LoggingListener {
    received: u64,
}

impl LoggingListener {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of signals logged so far
    pub fn received(&self) -> u64 {
        self.received
    }
}

impl TradingSignalListener for LoggingListener {
    fn name(&self) -> &str {
        "logging"
    }

    fn on_trading_signal(&mut self, signal: &TradingSignal) -> anyhow::Result<()> {
        let payload = serde_json::to_string(signal)?;
        self.received += 1;
        tracing::info!(signal = %payload, "Trading signal");
        Ok(())
    }
}
