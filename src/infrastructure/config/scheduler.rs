//! Scheduler and background sync timing.

use std::time::Duration;

use serde::Deserialize;

use crate::application::scheduler::{BackoffPolicy, SchedulerServiceConfig};
use crate::error::ConfigError;

const MAX_BACKOFF_SECS: u64 = 86_400;

/// `[scheduler]` section.
#[derive(Debug, Clone, Deserialize)]
pub struct SchedulerConfig {
    /// Delay for the first overdue order of a batch.
    #[serde(default = "default_backoff_base_secs")]
    pub backoff_base_secs: u64,

    /// Extra delay per further overdue order in the same batch.
    #[serde(default = "default_backoff_increment_secs")]
    pub backoff_increment_secs: u64,

    #[serde(default = "default_reconcile_interval_secs")]
    pub reconcile_interval_secs: u64,

    /// `0` disables periodic config sync.
    #[serde(default = "default_config_sync_interval_secs")]
    pub config_sync_interval_secs: u64,

    /// `0` disables periodic user sync.
    #[serde(default = "default_user_sync_interval_secs")]
    pub user_sync_interval_secs: u64,

    /// Re-read the owner's orders from the chain after every attempt.
    #[serde(default = "default_resync_after_purchase")]
    pub resync_after_purchase: bool,
}

const fn default_backoff_base_secs() -> u64 {
    10
}

const fn default_backoff_increment_secs() -> u64 {
    5
}

const fn default_reconcile_interval_secs() -> u64 {
    60
}

const fn default_config_sync_interval_secs() -> u64 {
    3_600
}

const fn default_user_sync_interval_secs() -> u64 {
    300
}

const fn default_resync_after_purchase() -> bool {
    true
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            backoff_base_secs: default_backoff_base_secs(),
            backoff_increment_secs: default_backoff_increment_secs(),
            reconcile_interval_secs: default_reconcile_interval_secs(),
            config_sync_interval_secs: default_config_sync_interval_secs(),
            user_sync_interval_secs: default_user_sync_interval_secs(),
            resync_after_purchase: default_resync_after_purchase(),
        }
    }
}

impl SchedulerConfig {
    pub(crate) fn validate(&self) -> Result<(), ConfigError> {
        if self.backoff_base_secs == 0 {
            return Err(ConfigError::InvalidValue {
                field: "scheduler.backoff_base_secs",
                reason: "must be greater than 0".to_string(),
            });
        }
        if self.reconcile_interval_secs == 0 {
            return Err(ConfigError::InvalidValue {
                field: "scheduler.reconcile_interval_secs",
                reason: "must be greater than 0".to_string(),
            });
        }
        for (field, value) in [
            ("scheduler.backoff_base_secs", self.backoff_base_secs),
            ("scheduler.backoff_increment_secs", self.backoff_increment_secs),
        ] {
            if value > MAX_BACKOFF_SECS {
                return Err(ConfigError::InvalidValue {
                    field,
                    reason: format!("must be at most {MAX_BACKOFF_SECS}"),
                });
            }
        }
        Ok(())
    }

    #[must_use]
    #[allow(clippy::cast_possible_wrap)]
    pub fn backoff_policy(&self) -> BackoffPolicy {
        let secs = |v: u64| chrono::Duration::seconds(v.min(MAX_BACKOFF_SECS) as i64);
        BackoffPolicy {
            base: secs(self.backoff_base_secs),
            increment: secs(self.backoff_increment_secs),
        }
    }

    #[must_use]
    pub fn service_config(&self) -> SchedulerServiceConfig {
        SchedulerServiceConfig {
            reconcile_interval: Duration::from_secs(self.reconcile_interval_secs),
            config_sync_interval: enabled(self.config_sync_interval_secs),
            user_sync_interval: enabled(self.user_sync_interval_secs),
        }
    }
}

fn enabled(secs: u64) -> Option<Duration> {
    (secs > 0).then(|| Duration::from_secs(secs))
}
