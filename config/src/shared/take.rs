use serde::{Deserialize, Serialize};

use crate::shared::ValidationError;

/// Settings for bounded consumption at the end of a pipeline.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct TakeConfig {
    /// Number of values taken before the pipeline is considered done.
    #[serde(default = "default_count")]
    pub count: usize,
    /// Upper bound on the whole run, in milliseconds. Cancellation fires once it elapses.
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
}

impl TakeConfig {
    pub const DEFAULT_COUNT: usize = 10;

    pub const DEFAULT_TIMEOUT_MS: u64 = 5_000;

    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.count == 0 {
            return Err(ValidationError::must_be_positive("take.count"));
        }
        if self.timeout_ms == 0 {
            return Err(ValidationError::must_be_positive("take.timeout_ms"));
        }

        Ok(())
    }
}

impl Default for TakeConfig {
    fn default() -> Self {
        Self {
            count: default_count(),
            timeout_ms: default_timeout_ms(),
        }
    }
}

fn default_count() -> usize {
    TakeConfig::DEFAULT_COUNT
}

fn default_timeout_ms() -> u64 {
    TakeConfig::DEFAULT_TIMEOUT_MS
}
