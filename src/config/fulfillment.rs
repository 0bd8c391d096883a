//! Fulfillment configuration
//!
//! Claim staleness, collaborator timeouts and the unfulfilled-payment sweep.

use serde::Deserialize;
use std::time::Duration;

use super::error::ValidationError;

const STORE_MARGIN_SECS: u64 = 10;

#[derive(Debug, Clone, Deserialize)]
pub struct FulfillmentConfig {
    /// An in-progress activation claim older than this may be taken over
    #[serde(default = "default_claim_stale_after")]
    pub claim_stale_after_secs: u64,

    /// Per-call limit for control-plane requests
    #[serde(default = "default_control_plane_timeout")]
    pub control_plane_timeout_secs: u64,

    /// Per-call limit for client notifications
    #[serde(default = "default_notification_timeout")]
    pub notification_timeout_secs: u64,

    #[serde(default = "default_true")]
    pub sweep_enabled: bool,

    #[serde(default = "default_sweep_interval")]
    pub sweep_interval_secs: u64,

    #[serde(default = "default_sweep_batch_size")]
    pub sweep_batch_size: u32,

    /// Days of webhook journal to keep; 0 keeps everything
    #[serde(default = "default_journal_retention_days")]
    pub journal_retention_days: u32,
}

impl FulfillmentConfig {
    pub fn claim_stale_after(&self) -> chrono::Duration {
        // chrono durations are bounded by i64 milliseconds
        let secs = self.claim_stale_after_secs.min(i64::MAX as u64 / 1000);
        chrono::Duration::seconds(secs as i64)
    }

    pub fn control_plane_timeout(&self) -> Duration {
        Duration::from_secs(self.control_plane_timeout_secs)
    }

    pub fn notification_timeout(&self) -> Duration {
        Duration::from_secs(self.notification_timeout_secs)
    }

    /// Seconds one webhook may spend in collaborators: a read and a grant on
    /// the control plane, up to four notifications, plus store round trips.
    pub fn webhook_budget_secs(&self) -> u64 {
        2 * self.control_plane_timeout_secs
            + 4 * self.notification_timeout_secs
            + STORE_MARGIN_SECS
    }

    pub fn sweep_interval(&self) -> Duration {
        Duration::from_secs(self.sweep_interval_secs)
    }

    pub fn journal_retention(&self) -> Option<chrono::Duration> {
        (self.journal_retention_days > 0)
            .then(|| chrono::Duration::days(i64::from(self.journal_retention_days)))
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.claim_stale_after_secs == 0 {
            return Err(ValidationError::InvalidTimeout("fulfillment.claim_stale_after_secs"));
        }
        if self.control_plane_timeout_secs == 0 {
            return Err(ValidationError::InvalidTimeout("fulfillment.control_plane_timeout_secs"));
        }
        // A claim must outlive the call it protects.
        if self.control_plane_timeout_secs >= self.claim_stale_after_secs {
            return Err(ValidationError::InvalidTimeout("fulfillment.control_plane_timeout_secs"));
        }
        if self.notification_timeout_secs == 0 {
            return Err(ValidationError::InvalidTimeout("fulfillment.notification_timeout_secs"));
        }
        if self.sweep_enabled && self.sweep_interval_secs == 0 {
            return Err(ValidationError::InvalidTimeout("fulfillment.sweep_interval_secs"));
        }
        if self.sweep_batch_size == 0 || self.sweep_batch_size > 1000 {
            return Err(ValidationError::InvalidBatchSize);
        }
        Ok(())
    }
}

impl Default for FulfillmentConfig {
    fn default() -> Self {
        Self {
            claim_stale_after_secs: default_claim_stale_after(),
            control_plane_timeout_secs: default_control_plane_timeout(),
            notification_timeout_secs: default_notification_timeout(),
            sweep_enabled: true,
            sweep_interval_secs: default_sweep_interval(),
            sweep_batch_size: default_sweep_batch_size(),
            journal_retention_days: default_journal_retention_days(),
        }
    }
}

fn default_claim_stale_after() -> u64 {
    600
}

fn default_control_plane_timeout() -> u64 {
    20
}

fn default_notification_timeout() -> u64 {
    5
}

fn default_true() -> bool {
    true
}

fn default_sweep_interval() -> u64 {
    300
}

fn default_sweep_batch_size() -> u32 {
    50
}

fn default_journal_retention_days() -> u32 {
    30
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = FulfillmentConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.claim_stale_after(), chrono::Duration::minutes(10));
        assert_eq!(config.control_plane_timeout(), Duration::from_secs(20));
        assert_eq!(config.journal_retention(), Some(chrono::Duration::days(30)));
        assert_eq!(config.webhook_budget_secs(), 70);
    }

    #[test]
    fn test_timeout_must_be_shorter_than_staleness() {
        let config = FulfillmentConfig {
            claim_stale_after_secs: 10,
            control_plane_timeout_secs: 20,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_zero_retention_keeps_journal() {
        let config = FulfillmentConfig {
            journal_retention_days: 0,
            ..Default::default()
        };
        assert_eq!(config.journal_retention(), None);
    }

    #[test]
    fn test_batch_size_bounds() {
        let config = FulfillmentConfig {
            sweep_batch_size: 0,
            ..Default::default()
        };
        assert_eq!(config.validate(), Err(ValidationError::InvalidBatchSize));
    }
}
