//! Selector returning a fixed target list

use super::{Target, TargetSelector};
use crate::level::Level;
use chrono::{DateTime, Utc};

/// Selector that returns the same scored targets at every timestamp
#[derive(Debug, Clone)]
pub struct StaticSelector {
    name: String,
    level: Level,
    targets: Vec<Target>,
    observed_until: Option<DateTime<Utc>>,
}

impl StaticSelector {
    pub fn new(name: impl Into<String>, level: Level, targets: Vec<Target>) -> Self {
        Self {
            name: name.into(),
            level,
            targets,
            observed_until: None,
        }
    }

    /// Latest observable timestamp passed to `move_on`
    pub fn observed_until(&self) -> Option<DateTime<Utc>> {
        self.observed_until
    }
}

impl TargetSelector for StaticSelector {
    fn name(&self) -> &str {
        &self.name
    }

    fn level(&self) -> Level {
        self.level
    }

    fn get_targets(&self, _timestamp: DateTime<Utc>) -> anyhow::Result<Vec<Target>> {
        Ok(self.targets.clone())
    }

    fn move_on(
        &mut self,
        timestamp: DateTime<Utc>,
        observable_timestamp: DateTime<Utc>,
    ) -> anyhow::Result<()> {
        tracing::debug!(
            selector = %self.name,
            %timestamp,
            %observable_timestamp,
            "Selector moved on"
        );
        self.observed_until = Some(observable_timestamp);
        Ok(())
    }
}
