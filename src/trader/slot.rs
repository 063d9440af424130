//! Per-level target cache

use crate::level::Level;
use std::collections::{BTreeMap, BTreeSet};

/// Most recent decision of each level
///
/// Every update replaces the level's previous set. A level with no entry has
/// not decided yet, which is distinct from having decided on nothing.
#[derive(Debug, Clone, Default)]
pub struct TargetsSlot {
    level_map_targets: BTreeMap<Level, BTreeSet<String>>,
}

impl TargetsSlot {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the targets of `level`
    pub fn input_targets<I, S>(&mut self, level: Level, targets: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let targets: BTreeSet<String> = targets.into_iter().map(Into::into).collect();
        tracing::info!(
            %level,
            old_targets = ?self.get_targets(level),
            new_targets = ?targets,
            "Targets slot updated"
        );
        self.level_map_targets.insert(level, targets);
    }

    /// Targets of `level`, `None` if the level never decided
    pub fn get_targets(&self, level: Level) -> Option<&BTreeSet<String>> {
        self.level_map_targets.get(&level)
    }

    /// Levels holding a decision, finest first
    pub fn levels(&self) -> impl Iterator<Item = Level> + '_ {
        self.level_map_targets.keys().copied()
    }

    /// Forget every decision
    pub fn clear(&mut self) {
        self.level_map_targets.clear();
    }
}
