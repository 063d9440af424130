//! Trader control loop

use super::consensus::{consensus, plan_signals};
use super::pacing::{observable_timestamp, pacing_wait};
use super::{RunSummary, TargetsSlot, TraderConfig, TraderError};
use crate::account::Account;
use crate::calendar::{TradingCalendar, Venue};
use crate::clock::Clock;
use crate::level::Level;
use crate::selector::SelectorsComparator;
use crate::signal::{SignalKind, TradingSignal, TradingSignalListener};
use crate::telemetry;
use chrono::{DateTime, Utc};
use std::collections::BTreeSet;
use std::sync::Arc;
use std::time::Instant;
use tokio_util::sync::CancellationToken;

/// Tick-driven multi-level trader
///
/// Every tick at the configured level it computes the consensus of the
/// per-level decisions, sends open/close signals to the account and the
/// registered listeners, and refreshes the decisions of the levels whose bar
/// just closed.
pub struct Trader<A: Account> {
    config: TraderConfig,
    venue: Venue,
    start: DateTime<Utc>,
    end: DateTime<Utc>,
    calendar: Arc<dyn TradingCalendar>,
    clock: Arc<dyn Clock>,
    comparator: Box<dyn SelectorsComparator>,
    account: A,
    listeners: Vec<Box<dyn TradingSignalListener>>,
    levels_asc: Vec<Level>,
    levels_desc: Vec<Level>,
    slot: TargetsSlot,
    handled_timestamp: Option<DateTime<Utc>>,
    shutdown: CancellationToken,
}

impl<A: Account> Trader<A> {
    /// Create a trader, rejecting invalid configuration before any tick runs
    pub fn new(
        config: TraderConfig,
        comparator: Box<dyn SelectorsComparator>,
        account: A,
        calendar: Arc<dyn TradingCalendar>,
        clock: Arc<dyn Clock>,
    ) -> Result<Self, TraderError> {
        let (start, end) = match (config.start, config.end) {
            (Some(start), Some(end)) => (start, end),
            _ => return Err(TraderError::MissingTimeRange),
        };
        if start > end {
            return Err(TraderError::InvalidTimeRange { start, end });
        }

        if config.real_time {
            let now = clock.now_utc();
            tracing::info!(
                %end,
                "Real-time mode; set the end far ahead to run forever"
            );
            if end < now {
                return Err(TraderError::RealTimeEndInPast { end, now });
            }
        }

        let venue = config.universe.venue().ok_or(TraderError::NoExchange)?;

        if calendar.uses_begin_timestamp() != config.kdata_uses_begin_timestamp {
            return Err(TraderError::TimestampConventionMismatch {
                configured: config.kdata_uses_begin_timestamp,
            });
        }

        let levels: BTreeSet<Level> = comparator.selectors().iter().map(|s| s.level()).collect();
        if levels.is_empty() {
            return Err(TraderError::NoSelectors);
        }
        let levels_asc: Vec<Level> = levels.into_iter().collect();
        let finest = levels_asc[0];
        if config.level > finest {
            return Err(TraderError::LevelTooCoarse {
                level: config.level,
                finest,
            });
        }
        let levels_desc: Vec<Level> = levels_asc.iter().rev().copied().collect();

        tracing::info!(
            trader = %config.name,
            level = %config.level,
            %start,
            %end,
            real_time = config.real_time,
            levels = ?levels_asc,
            "Trader created"
        );

        Ok(Self {
            config,
            venue,
            start,
            end,
            calendar,
            clock,
            comparator,
            account,
            listeners: vec![],
            levels_asc,
            levels_desc,
            slot: TargetsSlot::new(),
            handled_timestamp: None,
            shutdown: CancellationToken::new(),
        })
    }

    /// Use `token` to stop the run; a pending pacing sleep is interrupted
    pub fn with_shutdown(mut self, token: CancellationToken) -> Self {
        self.shutdown = token;
        self
    }

    /// Token that stops the run when cancelled
    pub fn shutdown_token(&self) -> CancellationToken {
        self.shutdown.clone()
    }

    /// Register a listener after the account; a name already registered is ignored
    pub fn add_listener(&mut self, listener: Box<dyn TradingSignalListener>) {
        if self.listeners.iter().any(|l| l.name() == listener.name()) {
            tracing::warn!(listener = listener.name(), "Listener already registered");
            return;
        }
        self.listeners.push(listener);
    }

    /// Unregister a listener by name
    pub fn remove_listener(&mut self, name: &str) -> Option<Box<dyn TradingSignalListener>> {
        let index = self.listeners.iter().position(|l| l.name() == name)?;
        Some(self.listeners.remove(index))
    }

    /// Names of extra listeners in dispatch order
    pub fn listener_names(&self) -> Vec<&str> {
        self.listeners.iter().map(|l| l.name()).collect()
    }

    pub fn config(&self) -> &TraderConfig {
        &self.config
    }

    pub fn account(&self) -> &A {
        &self.account
    }

    pub fn into_account(self) -> A {
        self.account
    }

    pub fn slot(&self) -> &TargetsSlot {
        &self.slot
    }

    pub fn slot_mut(&mut self) -> &mut TargetsSlot {
        &mut self.slot
    }

    /// Selector levels, finest first
    pub fn levels(&self) -> &[Level] {
        &self.levels_asc
    }

    /// Last tick fully handled; a restarted run can resume after it
    pub fn handled_timestamp(&self) -> Option<DateTime<Utc>> {
        self.handled_timestamp
    }

    /// Run the loop until the tick iterator is exhausted or shutdown is requested
    pub async fn run(&mut self) -> Result<RunSummary, TraderError> {
        let mut summary = RunSummary::default();
        let calendar = Arc::clone(&self.calendar);
        let ticks =
            calendar.iterate_timestamps(&self.venue, self.start, self.end, self.config.level);

        for timestamp in ticks {
            if self.shutdown.is_cancelled() {
                summary.cancelled = true;
                break;
            }

            if self.config.real_time {
                if let Some(handled) = self.handled_timestamp {
                    if !self.pace(handled, timestamp).await? {
                        summary.cancelled = true;
                        break;
                    }
                }
            }

            self.handle_tick(timestamp, &mut summary)?;
        }

        summary.handled_timestamp = self.handled_timestamp;
        self.on_finish(&summary)?;
        Ok(summary)
    }

    /// Sleep until the next bar is close to observable, then let finished
    /// selectors move on. Returns `false` when shutdown interrupted the sleep.
    async fn pace(
        &mut self,
        handled: DateTime<Utc>,
        timestamp: DateTime<Utc>,
    ) -> Result<bool, TraderError> {
        let now = self.clock.now_utc();
        let uses_begin = self.config.kdata_uses_begin_timestamp;
        let Some(wait) = pacing_wait(handled, self.config.level, uses_begin, now) else {
            return Ok(true);
        };

        tracing::info!(
            level = %self.config.level,
            %handled,
            touching = %observable_timestamp(handled, self.config.level, uses_begin),
            current_time = %now,
            sleep_secs = wait.as_secs_f64(),
            "Waiting for data"
        );

        tokio::select! {
            _ = tokio::time::sleep(wait) => {}
            _ = self.shutdown.cancelled() => {
                tracing::info!(%timestamp, "Shutdown requested while pacing");
                return Ok(false);
            }
        }

        for selector in self.comparator.selectors_mut() {
            let level = selector.level();
            if !self
                .calendar
                .is_in_finished_timestamps(&self.venue, timestamp, level)
            {
                continue;
            }
            let observable = observable_timestamp(timestamp, level, uses_begin);
            selector
                .move_on(timestamp, observable)
                .map_err(|source| TraderError::Selector {
                    name: selector.name().to_string(),
                    level,
                    source,
                })?;
        }

        Ok(true)
    }

    fn handle_tick(
        &mut self,
        timestamp: DateTime<Utc>,
        summary: &mut RunSummary,
    ) -> Result<(), TraderError> {
        let every_tick_is_session = self.config.level == Level::coarsest();

        if every_tick_is_session || self.calendar.is_open_time(&self.venue, timestamp) {
            self.account
                .on_trading_open(timestamp)
                .map_err(TraderError::account_failed)?;
        }

        for signal in self.handle_targets_slot(timestamp)? {
            match signal.kind {
                SignalKind::OpenLong => summary.open_signals += 1,
                SignalKind::CloseLong => summary.close_signals += 1,
            }
        }

        let levels = self.levels_asc.clone();
        for level in levels {
            if self
                .calendar
                .is_in_finished_timestamps(&self.venue, timestamp, level)
            {
                self.refresh_level(timestamp, level)?;
            }
        }

        self.handled_timestamp = Some(timestamp);
        summary.ticks += 1;
        telemetry::record_tick();

        if every_tick_is_session || self.calendar.is_close_time(&self.venue, timestamp) {
            self.account
                .on_trading_close(timestamp)
                .map_err(TraderError::account_failed)?;
        }

        Ok(())
    }

    /// Decide `level` at `timestamp` and cache the result
    pub fn refresh_level(
        &mut self,
        timestamp: DateTime<Utc>,
        level: Level,
    ) -> Result<(), TraderError> {
        let started = Instant::now();
        let decided = self.comparator.make_decision(timestamp, level)?;
        telemetry::record_latency(telemetry::LatencyMetric::Decision, started.elapsed());
        self.slot.input_targets(level, decided);
        Ok(())
    }

    /// Compute the consensus of all levels and send the resulting signals
    pub fn handle_targets_slot(
        &mut self,
        timestamp: DateTime<Utc>,
    ) -> Result<Vec<TradingSignal>, TraderError> {
        let selected = consensus(&self.slot, &self.levels_desc, self.config.undecided_level);
        telemetry::set_gauge(telemetry::GaugeMetric::ConsensusSize, selected.len() as f64);
        if !selected.is_empty() {
            tracing::info!(%timestamp, selected = ?selected, "Consensus selected");
        }
        self.send_trading_signals(timestamp, &selected)
    }

    /// Diff `selected` against the account holdings and dispatch the signals
    pub fn send_trading_signals(
        &mut self,
        timestamp: DateTime<Utc>,
        selected: &BTreeSet<String>,
    ) -> Result<Vec<TradingSignal>, TraderError> {
        let snapshot = self
            .account
            .latest_account()
            .map_err(TraderError::account_failed)?;
        let signals = plan_signals(selected, &snapshot, timestamp, self.config.level);

        for signal in &signals {
            self.dispatch(signal)?;
            telemetry::record_signal(signal.kind);
        }
        Ok(signals)
    }

    fn dispatch(&mut self, signal: &TradingSignal) -> Result<(), TraderError> {
        tracing::debug!(
            instrument = %signal.instrument_id,
            kind = signal.kind.as_str(),
            timestamp = %signal.timestamp,
            "Dispatching signal"
        );

        self.account
            .on_trading_signal(signal)
            .map_err(TraderError::account_failed)?;

        for listener in self.listeners.iter_mut() {
            listener
                .on_trading_signal(signal)
                .map_err(|source| TraderError::Listener {
                    name: listener.name().to_string(),
                    source,
                })?;
        }
        Ok(())
    }

    fn on_finish(&mut self, summary: &RunSummary) -> Result<(), TraderError> {
        tracing::info!(
            trader = %self.config.name,
            ticks = summary.ticks,
            open_signals = summary.open_signals,
            close_signals = summary.close_signals,
            cancelled = summary.cancelled,
            "Trader finished"
        );
        self.account
            .on_finish(self.handled_timestamp)
            .map_err(TraderError::account_failed)
    }
}
