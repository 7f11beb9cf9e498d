use serde::{Deserialize, Serialize};

use crate::load::Config;
use crate::shared::{PollConfig, TakeConfig, ValidationError, WorkersConfig};

/// Top-level configuration of the demo pipeline.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct DemoConfig {
    #[serde(default)]
    pub workers: WorkersConfig,
    #[serde(default)]
    pub poll: PollConfig,
    #[serde(default)]
    pub take: TakeConfig,
}

impl Config for DemoConfig {
    fn validate(&self) -> Result<(), ValidationError> {
        self.workers.validate()?;
        self.poll.validate()?;
        self.take.validate()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        assert!(DemoConfig::default().validate().is_ok());
    }

    #[test]
    fn zero_worker_count_is_rejected() {
        let mut config = DemoConfig::default();
        config.workers.count = 0;

        assert_eq!(
            config.validate(),
            Err(ValidationError::InvalidFieldValue {
                field: "workers.count".to_string(),
                constraint: "must be greater than 0".to_string(),
            })
        );
    }

    #[test]
    fn zero_poll_period_is_rejected() {
        let mut config = DemoConfig::default();
        config.poll.period_ms = 0;

        let err = config.validate().unwrap_err();
        assert_eq!(err.to_string(), "`poll.period_ms` must be greater than 0");
    }
}
