use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::shared::ValidationError;

/// Settings for periodic probes.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct PollConfig {
    /// Interval between two probe ticks, in milliseconds.
    #[serde(default = "default_period_ms")]
    pub period_ms: u64,
}

impl PollConfig {
    pub const DEFAULT_PERIOD_MS: u64 = 50;

    /// Returns the tick period as a [`Duration`].
    pub fn period(&self) -> Duration {
        Duration::from_millis(self.period_ms)
    }

    /// Ensures the period is non-zero, since a zero period cannot drive a ticker.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.period_ms == 0 {
            return Err(ValidationError::must_be_positive("poll.period_ms"));
        }

        Ok(())
    }
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            period_ms: default_period_ms(),
        }
    }
}

fn default_period_ms() -> u64 {
    PollConfig::DEFAULT_PERIOD_MS
}
