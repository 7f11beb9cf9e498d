use serde::{Deserialize, Serialize};

use crate::shared::ValidationError;

/// Concurrency settings for the worker-based combinators.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct WorkersConfig {
    /// Number of workers spawned by filter, transform and workerpool stages.
    #[serde(default = "default_count")]
    pub count: usize,
    /// Number of output streams produced by fan-out stages.
    #[serde(default = "default_fan_out")]
    pub fan_out: usize,
}

impl WorkersConfig {
    pub const DEFAULT_COUNT: usize = 4;

    pub const DEFAULT_FAN_OUT: usize = 2;

    /// Ensures both the worker count and the fan-out width are non-zero.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.count == 0 {
            return Err(ValidationError::must_be_positive("workers.count"));
        }
        if self.fan_out == 0 {
            return Err(ValidationError::must_be_positive("workers.fan_out"));
        }

        Ok(())
    }
}

impl Default for WorkersConfig {
    fn default() -> Self {
        Self {
            count: default_count(),
            fan_out: default_fan_out(),
        }
    }
}

fn default_count() -> usize {
    WorkersConfig::DEFAULT_COUNT
}

fn default_fan_out() -> usize {
    WorkersConfig::DEFAULT_FAN_OUT
}
