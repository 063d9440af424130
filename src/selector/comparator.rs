//! Per-level ranking and limiting of selector outputs

use super::{Target, TargetSelector};
use crate::level::Level;
use crate::trader::TraderError;
use chrono::{DateTime, Utc};
use std::collections::HashSet;

/// Default number of instruments kept per level
pub const DEFAULT_LIMIT: usize = 10;

/// Reduces the selectors of one level into an ordered candidate set
pub trait SelectorsComparator: Send {
    /// Ordered, duplicate-free instrument ids decided for `level` at `timestamp`
    fn make_decision(
        &self,
        timestamp: DateTime<Utc>,
        level: Level,
    ) -> Result<Vec<String>, TraderError>;

    /// Selectors owned by this comparator
    fn selectors(&self) -> &[Box<dyn TargetSelector>];

    fn selectors_mut(&mut self) -> &mut [Box<dyn TargetSelector>];
}

/// Keeps the first `limit` targets ordered ascending by `(score, instrument_id)`
pub struct LimitSelectorsComparator {
    selectors: Vec<Box<dyn TargetSelector>>,
    limit: usize,
}

impl LimitSelectorsComparator {
    /// Create a comparator; `limit` must be positive
    pub fn new(selectors: Vec<Box<dyn TargetSelector>>, limit: usize) -> Result<Self, TraderError> {
        if limit == 0 {
            return Err(TraderError::InvalidLimit);
        }
        Ok(Self { selectors, limit })
    }

    pub fn limit(&self) -> usize {
        self.limit
    }

    /// Sort, deduplicate and truncate a raw target list
    pub fn rank(&self, mut targets: Vec<Target>) -> Vec<String> {
        targets.sort_by(|a, b| {
            a.score
                .total_cmp(&b.score)
                .then_with(|| a.instrument_id.cmp(&b.instrument_id))
        });

        let mut seen = HashSet::new();
        targets
            .into_iter()
            .filter(|t| seen.insert(t.instrument_id.clone()))
            .take(self.limit)
            .map(|t| t.instrument_id)
            .collect()
    }
}

impl SelectorsComparator for LimitSelectorsComparator {
    fn make_decision(
        &self,
        timestamp: DateTime<Utc>,
        level: Level,
    ) -> Result<Vec<String>, TraderError> {
        let mut targets = Vec::new();
        for selector in self.selectors.iter().filter(|s| s.level() == level) {
            tracing::debug!(%level, selector = selector.name(), %timestamp, "make_decision");
            let produced = selector
                .get_targets(timestamp)
                .map_err(|source| TraderError::Selector {
                    name: selector.name().to_string(),
                    level,
                    source,
                })?;
            targets.extend(produced);
        }

        let candidates = targets.len();
        let decided = self.rank(targets);
        tracing::info!(
            %level,
            %timestamp,
            candidates,
            decided = ?decided,
            "Level decision made"
        );
        Ok(decided)
    }

    fn selectors(&self) -> &[Box<dyn TargetSelector>] {
        &self.selectors
    }

    fn selectors_mut(&mut self) -> &mut [Box<dyn TargetSelector>] {
        &mut self.selectors
    }
}
