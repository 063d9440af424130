//! Multi-level trader
//!
//! Drives the tick loop: pacing against the wall clock in real-time mode,
//! per-level decisions cached in a [`TargetsSlot`], cross-level consensus and
//! open/close signal emission

mod consensus;
mod engine;
mod pacing;
mod slot;
mod types;

pub use consensus::{consensus, plan_signals};
pub use engine::Trader;
pub use pacing::{observable_timestamp, pacing_wait, PACING_THRESHOLD_SECS};
pub use slot::TargetsSlot;
pub use types::{RunSummary, TraderConfig, TraderError, UndecidedLevelPolicy, Universe};
