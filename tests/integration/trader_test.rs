//! Integration tests for the trader loop

use crate::support::{
    at, sim_account, CountingAccount, RecordingListener, ScriptedSelector, Sequence,
};
use chrono::{DateTime, Utc};
use mtf_trader::account::{Account, AccountSnapshot, PositionSnapshot};
use mtf_trader::calendar::ContinuousCalendar;
use mtf_trader::clock::{ManualClock, SystemClock};
use mtf_trader::level::Level;
use mtf_trader::selector::{LimitSelectorsComparator, Target, TargetSelector};
use mtf_trader::signal::SignalKind;
use mtf_trader::trader::{Trader, TraderConfig, TraderError, UndecidedLevelPolicy, Universe};
use rust_decimal_macros::dec;
use std::sync::Arc;

fn config(level: Level, start: DateTime<Utc>, end: DateTime<Utc>) -> TraderConfig {
    TraderConfig {
        name: "test".to_string(),
        universe: Universe {
            exchanges: vec!["binance".to_string()],
            ..Default::default()
        },
        start: Some(start),
        end: Some(end),
        level,
        ..Default::default()
    }
}

fn build<A: Account>(
    config: TraderConfig,
    selectors: Vec<Box<dyn TargetSelector>>,
    limit: usize,
    account: A,
) -> Result<Trader<A>, TraderError> {
    let calendar = ContinuousCalendar::new(config.level, config.kdata_uses_begin_timestamp);
    let comparator = LimitSelectorsComparator::new(selectors, limit)?;
    Trader::new(
        config,
        Box::new(comparator),
        account,
        Arc::new(calendar),
        Arc::new(SystemClock),
    )
}

fn snapshot(cash: rust_decimal::Decimal, held: &[&str]) -> AccountSnapshot {
    AccountSnapshot {
        cash,
        positions: held
            .iter()
            .map(|id| PositionSnapshot {
                instrument_id: id.to_string(),
                available_long: dec!(10),
            })
            .collect(),
    }
}

#[tokio::test]
async fn test_two_level_backtest_opens_consensus() {
    let selectors: Vec<Box<dyn TargetSelector>> = vec![
        Box::new(ScriptedSelector::fixed(
            "daily",
            Level::Day1,
            &[("BTC", 0.3), ("ETH", 0.5), ("SOL", 0.9)],
        )),
        Box::new(ScriptedSelector::fixed("hourly", Level::Hour1, &[("ETH", 0.2), ("SOL", 0.4)])),
    ];
    let prices = [
        ("BTC", dec!(40000)),
        ("ETH", dec!(2000)),
        ("SOL", dec!(100)),
    ];
    let account = sim_account(dec!(10000), &prices);
    let trader_config = config(Level::Hour1, at(1, 0, 0), at(3, 0, 0));
    let mut trader = build(trader_config, selectors, 2, account).unwrap();

    let listener = RecordingListener::new("recorder");
    let received = listener.signals();
    trader.add_listener(Box::new(listener));

    let summary = trader.run().await.unwrap();

    assert_eq!(summary.ticks, 49);
    assert_eq!(summary.open_signals, 1);
    assert_eq!(summary.close_signals, 0);
    assert!(!summary.cancelled);
    assert_eq!(summary.handled_timestamp, Some(at(3, 0, 0)));

    let received = received.lock().unwrap();
    assert_eq!(received.len(), 1);
    assert_eq!(received[0].instrument_id, "ETH");
    assert_eq!(received[0].kind, SignalKind::OpenLong);
    assert_eq!(received[0].timestamp, at(1, 1, 0));
    assert_eq!(received[0].order_money, Some(dec!(10000)));
    assert_eq!(received[0].level, Level::Hour1);

    assert_eq!(trader.levels(), &[Level::Hour1, Level::Day1]);
    let account = trader.account();
    assert_eq!(account.cash(), dec!(0));
    assert_eq!(account.positions()["ETH"].long_amount, dec!(5));
}

#[tokio::test]
async fn test_rotation_closes_dropped_instrument() {
    let selectors: Vec<Box<dyn TargetSelector>> = vec![
        Box::new(ScriptedSelector::fixed("daily", Level::Day1, &[("A", 0.1), ("B", 0.2)])),
        Box::new(ScriptedSelector::new("hourly", Level::Hour1, |ts| {
            if ts < at(1, 12, 0) {
                Ok(vec![Target::new("A", 0.1), Target::new("B", 0.2)])
            } else {
                Ok(vec![Target::new("B", 0.1)])
            }
        })),
    ];
    let account = sim_account(dec!(1000), &[("A", dec!(10)), ("B", dec!(20))]);
    let trader_config = config(Level::Hour1, at(1, 0, 0), at(1, 18, 0));
    let mut trader = build(trader_config, selectors, 10, account).unwrap();

    let listener = RecordingListener::new("recorder");
    let received = listener.signals();
    trader.add_listener(Box::new(listener));

    let summary = trader.run().await.unwrap();
    assert_eq!(summary.open_signals, 2);
    assert_eq!(summary.close_signals, 1);

    let received = received.lock().unwrap();
    let seen: Vec<(&str, SignalKind, DateTime<Utc>)> = received
        .iter()
        .map(|s| (s.instrument_id.as_str(), s.kind, s.timestamp))
        .collect();
    assert_eq!(
        seen,
        vec![
            ("A", SignalKind::OpenLong, at(1, 1, 0)),
            ("B", SignalKind::OpenLong, at(1, 1, 0)),
            ("A", SignalKind::CloseLong, at(1, 13, 0)),
        ]
    );
    assert_eq!(received[0].order_money, Some(dec!(500)));
    assert_eq!(received[2].position_pct, Some(dec!(1)));

    let account = trader.account();
    assert_eq!(account.cash(), dec!(500));
    assert!(!account.positions().contains_key("A"));
    assert_eq!(account.positions()["B"].long_amount, dec!(25));
}

#[tokio::test]
async fn test_empty_decision_closes_everything() {
    let selectors: Vec<Box<dyn TargetSelector>> = vec![
        Box::new(ScriptedSelector::new("daily", Level::Day1, |ts| {
            if ts < at(2, 0, 0) {
                Ok(vec![Target::new("X", 1.0)])
            } else {
                Ok(vec![])
            }
        })),
        Box::new(ScriptedSelector::fixed("hourly", Level::Hour1, &[("X", 1.0)])),
    ];
    let account = sim_account(dec!(1000), &[("X", dec!(10))]);
    let trader_config = config(Level::Hour1, at(1, 0, 0), at(2, 3, 0));
    let mut trader = build(trader_config, selectors, 5, account).unwrap();

    let summary = trader.run().await.unwrap();
    assert_eq!(summary.open_signals, 1);
    assert_eq!(summary.close_signals, 1);
    let daily_targets = trader.slot().get_targets(Level::Day1).map(|t| t.len());
    assert_eq!(daily_targets, Some(0));

    let account = trader.account();
    assert_eq!(account.cash(), dec!(1000));
    assert!(account.positions().is_empty());
    assert_eq!(account.trades().len(), 2);
    assert_eq!(account.trades()[1].timestamp, at(2, 1, 0));
}

#[tokio::test]
async fn test_undecided_level_policies() {
    let selectors = || -> Vec<Box<dyn TargetSelector>> {
        vec![
            Box::new(ScriptedSelector::fixed("daily", Level::Day1, &[("X", 1.0)])),
            Box::new(ScriptedSelector::fixed("hourly", Level::Hour1, &[("X", 1.0)])),
        ]
    };

    let mut skip = build(
        config(Level::Hour1, at(1, 1, 0), at(2, 2, 0)),
        selectors(),
        5,
        sim_account(dec!(100), &[("X", dec!(1))]),
    )
    .unwrap();
    skip.run().await.unwrap();
    assert_eq!(skip.account().trades()[0].timestamp, at(1, 2, 0));

    let mut block_config = config(Level::Hour1, at(1, 1, 0), at(2, 2, 0));
    block_config.undecided_level = UndecidedLevelPolicy::Block;
    let account = sim_account(dec!(100), &[("X", dec!(1))]);
    let mut block = build(block_config, selectors(), 5, account).unwrap();
    block.run().await.unwrap();
    assert_eq!(block.account().trades()[0].timestamp, at(2, 1, 0));
}

#[tokio::test]
async fn test_session_hooks_follow_calendar() {
    let hourly = || -> Vec<Box<dyn TargetSelector>> {
        vec![Box::new(ScriptedSelector::fixed("hourly", Level::Hour1, &[]))]
    };

    let account = CountingAccount::new(AccountSnapshot::default());
    let log = account.log();
    let trader_config = config(Level::Hour1, at(1, 0, 0), at(3, 0, 0));
    let mut trader = build(trader_config, hourly(), 5, account).unwrap();
    trader.run().await.unwrap();
    {
        let log = log.lock().unwrap();
        assert_eq!(log.opens, vec![at(1, 1, 0), at(2, 1, 0)]);
        assert_eq!(log.closes, vec![at(1, 0, 0), at(2, 0, 0), at(3, 0, 0)]);
        assert_eq!(log.signals, 0);
        assert!(log.finished);
    }

    let daily: Vec<Box<dyn TargetSelector>> =
        vec![Box::new(ScriptedSelector::fixed("daily", Level::Day1, &[]))];
    let account = CountingAccount::new(AccountSnapshot::default());
    let log = account.log();
    let trader_config = config(Level::Day1, at(1, 0, 0), at(3, 0, 0));
    let mut trader = build(trader_config, daily, 5, account).unwrap();
    trader.run().await.unwrap();
    let log = log.lock().unwrap();
    assert_eq!(log.opens.len(), 3);
    assert_eq!(log.closes.len(), 3);
}

#[tokio::test]
async fn test_selector_error_aborts_run() {
    let broken = ScriptedSelector::new("broken", Level::Hour1, |_| anyhow::bail!("feed down"));
    let selectors: Vec<Box<dyn TargetSelector>> = vec![Box::new(broken)];
    let account = CountingAccount::new(AccountSnapshot::default());
    let log = account.log();
    let trader_config = config(Level::Hour1, at(1, 0, 0), at(1, 5, 0));
    let mut trader = build(trader_config, selectors, 5, account).unwrap();

    let err = trader.run().await.unwrap_err();
    match err {
        TraderError::Selector { name, level, .. } => {
            assert_eq!(name, "broken");
            assert_eq!(level, Level::Hour1);
        }
        other => panic!("unexpected error: {other:?}"),
    }
    assert!(trader.handled_timestamp().is_none());
    assert!(!log.lock().unwrap().finished);
}

#[tokio::test]
async fn test_listener_error_aborts_run() {
    let selectors: Vec<Box<dyn TargetSelector>> =
        vec![Box::new(ScriptedSelector::fixed("hourly", Level::Hour1, &[("X", 1.0)]))];
    let account = sim_account(dec!(100), &[("X", dec!(1))]);
    let trader_config = config(Level::Hour1, at(1, 0, 0), at(1, 5, 0));
    let mut trader = build(trader_config, selectors, 5, account).unwrap();
    trader.add_listener(Box::new(RecordingListener::failing("broken")));

    let err = trader.run().await.unwrap_err();
    assert!(matches!(err, TraderError::Listener { ref name, .. } if name == "broken"));
    assert_eq!(trader.handled_timestamp(), Some(at(1, 0, 0)));
}

#[tokio::test]
async fn test_signals_reach_account_then_listeners_in_order() {
    let sequence = Sequence::default();
    let hourly = ScriptedSelector::fixed("hourly", Level::Hour1, &[("X", 1.0), ("Y", 2.0)]);
    let selectors: Vec<Box<dyn TargetSelector>> = vec![Box::new(hourly)];
    let account = CountingAccount::new(snapshot(dec!(100), &[])).with_sequence(&sequence);
    let trader_config = config(Level::Hour1, at(1, 0, 0), at(1, 1, 0));
    let mut trader = build(trader_config, selectors, 5, account).unwrap();

    trader.add_listener(Box::new(RecordingListener::new("first").with_sequence(&sequence)));
    trader.add_listener(Box::new(RecordingListener::new("second").with_sequence(&sequence)));

    let summary = trader.run().await.unwrap();
    assert_eq!(summary.open_signals, 2);

    let sequence = sequence.lock().unwrap();
    assert_eq!(
        *sequence,
        vec![
            "counting:X",
            "first:X",
            "second:X",
            "counting:Y",
            "first:Y",
            "second:Y",
        ]
    );
}

#[tokio::test]
async fn test_failing_listener_stops_delivery_to_later_listeners() {
    let sequence = Sequence::default();
    let hourly = ScriptedSelector::fixed("hourly", Level::Hour1, &[("X", 1.0), ("Y", 2.0)]);
    let selectors: Vec<Box<dyn TargetSelector>> = vec![Box::new(hourly)];
    let account = CountingAccount::new(snapshot(dec!(100), &[])).with_sequence(&sequence);
    let trader_config = config(Level::Hour1, at(1, 0, 0), at(1, 1, 0));
    let mut trader = build(trader_config, selectors, 5, account).unwrap();

    let last = RecordingListener::new("last").with_sequence(&sequence);
    let last_received = last.signals();
    trader.add_listener(Box::new(RecordingListener::new("first").with_sequence(&sequence)));
    trader.add_listener(Box::new(RecordingListener::failing("broken").with_sequence(&sequence)));
    trader.add_listener(Box::new(last));

    match trader.run().await {
        Err(TraderError::Listener { name, .. }) => assert_eq!(name, "broken"),
        other => panic!("unexpected result: {other:?}"),
    }
    assert_eq!(trader.handled_timestamp(), Some(at(1, 0, 0)));
    assert_eq!(*sequence.lock().unwrap(), vec!["counting:X", "first:X"]);
    assert!(last_received.lock().unwrap().is_empty());
}

#[test]
fn test_listener_registration() {
    let selectors: Vec<Box<dyn TargetSelector>> =
        vec![Box::new(ScriptedSelector::fixed("hourly", Level::Hour1, &[]))];
    let mut trader = build(
        config(Level::Hour1, at(1, 0, 0), at(1, 5, 0)),
        selectors,
        5,
        CountingAccount::new(AccountSnapshot::default()),
    )
    .unwrap();

    trader.add_listener(Box::new(RecordingListener::new("first")));
    trader.add_listener(Box::new(RecordingListener::new("second")));
    trader.add_listener(Box::new(RecordingListener::new("first")));
    assert_eq!(trader.listener_names(), vec!["first", "second"]);

    assert!(trader.remove_listener("first").is_some());
    assert!(trader.remove_listener("first").is_none());
    assert_eq!(trader.listener_names(), vec!["second"]);
}

#[test]
fn test_consensus_and_signals_on_demand() {
    let selectors: Vec<Box<dyn TargetSelector>> = vec![
        Box::new(ScriptedSelector::fixed("daily", Level::Day1, &[])),
        Box::new(ScriptedSelector::fixed("fast", Level::Min5, &[])),
    ];
    let mut trader = build(
        config(Level::Min5, at(1, 0, 0), at(1, 1, 0)),
        selectors,
        5,
        CountingAccount::new(snapshot(dec!(10000), &["X"])),
    )
    .unwrap();

    let slot = trader.slot_mut();
    slot.input_targets(Level::Day1, ["X", "Y"]);
    slot.input_targets(Level::Min5, ["Y", "Z"]);
    let signals = trader.handle_targets_slot(at(1, 0, 5)).unwrap();

    assert_eq!(signals.len(), 2);
    assert_eq!(signals[0].instrument_id, "Y");
    assert_eq!(signals[0].kind, SignalKind::OpenLong);
    assert_eq!(signals[0].order_money, Some(dec!(10000)));
    assert_eq!(signals[1].instrument_id, "X");
    assert_eq!(signals[1].kind, SignalKind::CloseLong);
    assert_eq!(signals[1].position_pct, Some(dec!(1)));
}

#[test]
fn test_empty_consensus_closes_all_holdings() {
    let selectors: Vec<Box<dyn TargetSelector>> = vec![
        Box::new(ScriptedSelector::fixed("daily", Level::Day1, &[])),
        Box::new(ScriptedSelector::fixed("fast", Level::Min5, &[])),
    ];
    let account = CountingAccount::new(snapshot(dec!(500), &["X", "Y"]));
    let log = account.log();
    let trader_config = config(Level::Min5, at(1, 0, 0), at(1, 1, 0));
    let mut trader = build(trader_config, selectors, 5, account).unwrap();

    let slot = trader.slot_mut();
    slot.input_targets(Level::Day1, Vec::<String>::new());
    slot.input_targets(Level::Min5, ["Y"]);
    let signals = trader.handle_targets_slot(at(1, 0, 5)).unwrap();

    assert_eq!(signals.len(), 2);
    assert!(signals.iter().all(|s| s.kind == SignalKind::CloseLong));
    assert_eq!(log.lock().unwrap().signals, 2);
}

#[test]
fn test_construction_rejects_bad_config() {
    let selectors = || -> Vec<Box<dyn TargetSelector>> {
        vec![Box::new(ScriptedSelector::fixed("hourly", Level::Hour1, &[]))]
    };
    let account = || CountingAccount::new(AccountSnapshot::default());
    let valid = || config(Level::Hour1, at(1, 0, 0), at(2, 0, 0));

    let mut missing = config(Level::Hour1, at(1, 0, 0), at(2, 0, 0));
    missing.end = None;
    assert!(matches!(
        build(missing, selectors(), 5, account()),
        Err(TraderError::MissingTimeRange)
    ));

    let reversed = config(Level::Hour1, at(2, 0, 0), at(1, 0, 0));
    assert!(matches!(
        build(reversed, selectors(), 5, account()),
        Err(TraderError::InvalidTimeRange { .. })
    ));

    let mut no_exchange = config(Level::Hour1, at(1, 0, 0), at(2, 0, 0));
    no_exchange.universe.exchanges.clear();
    assert!(matches!(
        build(no_exchange, selectors(), 5, account()),
        Err(TraderError::NoExchange)
    ));

    assert!(matches!(
        build(valid(), vec![], 5, account()),
        Err(TraderError::NoSelectors)
    ));

    assert!(matches!(
        build(valid(), selectors(), 0, account()),
        Err(TraderError::InvalidLimit)
    ));

    let five_minute: Vec<Box<dyn TargetSelector>> =
        vec![Box::new(ScriptedSelector::fixed("fast", Level::Min5, &[]))];
    match build(valid(), five_minute, 5, account()) {
        Err(TraderError::LevelTooCoarse { level, finest }) => {
            assert_eq!(level, Level::Hour1);
            assert_eq!(finest, Level::Min5);
        }
        Err(other) => panic!("unexpected error: {other:?}"),
        Ok(_) => panic!("loop coarser than a selector level was accepted"),
    }
}

#[test]
fn test_calendar_stamp_convention_must_match_config() {
    let comparator = LimitSelectorsComparator::new(
        vec![Box::new(ScriptedSelector::fixed("hourly", Level::Hour1, &[]))],
        5,
    )
    .unwrap();
    let end_stamped = config(Level::Hour1, at(1, 0, 0), at(2, 0, 0));
    assert!(!end_stamped.kdata_uses_begin_timestamp);

    let result = Trader::new(
        end_stamped,
        Box::new(comparator),
        CountingAccount::new(AccountSnapshot::default()),
        Arc::new(ContinuousCalendar::new(Level::Hour1, true)),
        Arc::new(SystemClock),
    );

    assert!(matches!(
        result,
        Err(TraderError::TimestampConventionMismatch { configured: false })
    ));
}

#[test]
fn test_real_time_end_in_past_fails_at_construction() {
    let mut real_time = config(Level::Hour1, at(1, 0, 0), at(2, 0, 0));
    real_time.real_time = true;
    let comparator = LimitSelectorsComparator::new(
        vec![Box::new(ScriptedSelector::fixed("hourly", Level::Hour1, &[]))],
        5,
    )
    .unwrap();
    let clock = ManualClock::new(at(20, 0, 0));

    let result = Trader::new(
        real_time,
        Box::new(comparator),
        CountingAccount::new(AccountSnapshot::default()),
        Arc::new(ContinuousCalendar::new(Level::Hour1, false)),
        Arc::new(clock),
    );

    match result {
        Err(TraderError::RealTimeEndInPast { end, now }) => {
            assert_eq!(end, at(2, 0, 0));
            assert_eq!(now, at(20, 0, 0));
        }
        Err(other) => panic!("unexpected error: {other:?}"),
        Ok(_) => panic!("real-time trader with past end was accepted"),
    }
}
