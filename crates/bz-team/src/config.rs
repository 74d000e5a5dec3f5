//! Team-level configuration.

use std::time::Duration;

use bz_field::PlannerConfig;

use crate::{TeamError, TeamResult};

#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct TeamConfig {
    pub planner:          PlannerConfig,
    /// Minimum wall time between polls.  0 polls as fast as the server answers.
    pub tick_interval_ms: u64,
    /// Stop after this many ticks; `None` runs until stopped.
    pub max_ticks:        Option<u64>,
}

impl Default for TeamConfig {
    fn default() -> Self {
        Self {
            planner:          PlannerConfig::default(),
            tick_interval_ms: 0,
            max_ticks:        None,
        }
    }
}

impl TeamConfig {
    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_interval_ms)
    }

    pub fn validate(&self) -> TeamResult<()> {
        self.planner.validate()?;
        if self.max_ticks == Some(0) {
            return Err(TeamError::Config("max_ticks must be at least 1".into()));
        }
        Ok(())
    }
}
