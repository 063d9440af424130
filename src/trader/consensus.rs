//! Cross-level consensus and signal planning

use super::{TargetsSlot, UndecidedLevelPolicy};
use crate::account::AccountSnapshot;
use crate::level::Level;
use crate::signal::TradingSignal;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use std::collections::BTreeSet;

/// Intersection of the cached targets of `levels_desc` (coarsest first)
///
/// A decided-empty level forces an empty result. Undecided levels follow
/// `policy`. With no decided level at all the result is empty.
pub fn consensus(
    slot: &TargetsSlot,
    levels_desc: &[Level],
    policy: UndecidedLevelPolicy,
) -> BTreeSet<String> {
    let mut selected: Option<BTreeSet<String>> = None;

    for &level in levels_desc {
        let targets = match (slot.get_targets(level), policy) {
            (Some(targets), _) => targets,
            (None, UndecidedLevelPolicy::Skip) => continue,
            (None, UndecidedLevelPolicy::Block) => return BTreeSet::new(),
        };

        let next = match selected {
            None => targets.clone(),
            Some(acc) => acc.intersection(targets).cloned().collect(),
        };
        if next.is_empty() {
            return next;
        }
        selected = Some(next);
    }

    selected.unwrap_or_default()
}

/// Signals moving the account from its holdings to `selected`
///
/// Opens `selected \ holdings` with cash split equally, then closes
/// `holdings \ selected` (every holding when `selected` is empty) in full.
pub fn plan_signals(
    selected: &BTreeSet<String>,
    account: &AccountSnapshot,
    timestamp: DateTime<Utc>,
    level: Level,
) -> Vec<TradingSignal> {
    let holdings = account.long_holdings();
    let mut signals = Vec::new();

    let longed: Vec<&String> = selected.difference(&holdings).collect();
    if !longed.is_empty() {
        let order_money = account.cash / Decimal::from(longed.len());
        signals.extend(
            longed
                .into_iter()
                .map(|id| TradingSignal::open_long(id.clone(), timestamp, level, order_money)),
        );
    }

    signals.extend(
        holdings
            .difference(selected)
            .map(|id| TradingSignal::close_long(id.clone(), timestamp, level, Decimal::ONE)),
    );

    signals
}
