//! Run command implementation

use crate::calendar::ContinuousCalendar;
use crate::clock::SystemClock;
use crate::config::Config;
use crate::selector::LimitSelectorsComparator;
use crate::signal::LoggingListener;
use crate::trader::Trader;
use chrono::{DateTime, Utc};
use clap::Args;
use std::sync::Arc;

#[derive(Args, Debug)]
pub struct RunArgs {
    /// Pace the loop against the wall clock
    #[arg(long)]
    pub real_time: bool,

    /// Override the start timestamp (RFC 3339)
    #[arg(long)]
    pub start: Option<DateTime<Utc>>,

    /// Override the end timestamp (RFC 3339)
    #[arg(long)]
    pub end: Option<DateTime<Utc>>,

    /// Log every signal as JSON
    #[arg(long)]
    pub log_signals: bool,
}

impl RunArgs {
    pub async fn execute(&self, config: &Config) -> anyhow::Result<()> {
        let mut trader_config = config.trader_config();
        trader_config.real_time |= self.real_time;
        if self.start.is_some() {
            trader_config.start = self.start;
        }
        if self.end.is_some() {
            trader_config.end = self.end;
        }

        let comparator =
            LimitSelectorsComparator::new(config.build_selectors(), config.comparator.limit)?;
        let calendar = ContinuousCalendar::new(
            trader_config.level,
            trader_config.kdata_uses_begin_timestamp,
        );

        let mut trader = Trader::new(
            trader_config,
            Box::new(comparator),
            config.build_account(),
            Arc::new(calendar),
            Arc::new(SystemClock),
        )?;
        if self.log_signals {
            trader.add_listener(Box::new(LoggingListener::new()));
        }

        let shutdown = trader.shutdown_token();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                tracing::info!("Ctrl-C received, stopping trader");
                shutdown.cancel();
            }
        });

        let summary = trader.run().await?;
        let account = trader.account();

        println!("Run finished");
        println!("  Ticks: {}", summary.ticks);
        println!("  Open signals: {}", summary.open_signals);
        println!("  Close signals: {}", summary.close_signals);
        if let Some(last) = summary.handled_timestamp {
            println!("  Last tick: {}", last);
            println!("  Equity: {}", account.equity(last));
        }
        println!("  Cash: {}", account.cash());
        for (id, position) in account.positions() {
            println!("  Position {}: {}", id, position.long_amount);
        }
        if summary.cancelled {
            println!("  (cancelled)");
        }
        Ok(())
    }
}
