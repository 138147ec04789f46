//! Engine configuration.
//!
//! One explicit struct built at process start and passed into every
//! component constructor. No ambient global state.

use crate::alerting::EscalationPolicy;
use crate::core::{Error, Result, TimeWindow};
use crate::health::HealthThresholds;
use crate::notify::{ChannelsConfig, DEFAULT_SEND_TIMEOUT_SECS};
use serde::{Deserialize, Serialize};

/// Data store connection settings, consumed by a relational
/// `MonitoringStore` implementation.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Connection URL
    pub url: String,
    /// Service credential
    pub service_key: String,
    /// Connection pool size
    pub max_connections: u32,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            url: String::new(),
            service_key: String::new(),
            max_connections: 10,
        }
    }
}

impl StoreConfig {
    /// Validate required credentials.
    pub fn validate(&self) -> Result<()> {
        if self.url.is_empty() {
            return Err(Error::Configuration("store url is required".to_string()));
        }
        if self.service_key.is_empty() {
            return Err(Error::Configuration(
                "store service_key is required".to_string(),
            ));
        }
        Ok(())
    }
}

/// Full engine configuration.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Data store settings
    pub store: StoreConfig,
    /// Notification channel settings
    pub channels: ChannelsConfig,
    /// Escalation policy tables
    pub escalation: EscalationPolicy,
    /// Health classification thresholds
    pub thresholds: HealthThresholds,
    /// Default digest window
    pub digest_window: TimeWindow,
    /// Per-send notification timeout in seconds
    pub send_timeout_secs: u64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            store: StoreConfig::default(),
            channels: ChannelsConfig::default(),
            escalation: EscalationPolicy::default(),
            thresholds: HealthThresholds::default(),
            digest_window: TimeWindow::last_day(),
            send_timeout_secs: DEFAULT_SEND_TIMEOUT_SECS,
        }
    }
}

impl EngineConfig {
    /// Config with all channels enabled and in-memory-friendly defaults.
    /// Test/demo use; production fills `store` and real channel settings.
    pub fn for_testing() -> Self {
        Self {
            channels: ChannelsConfig::all_channels(),
            ..Self::default()
        }
    }

    /// Validate the policy tables. Store credentials are validated by
    /// the store implementation that consumes them.
    pub fn validate(&self) -> Result<()> {
        self.escalation.validate()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_valid() {
        assert!(EngineConfig::default().validate().is_ok());
    }

    #[test]
    fn test_store_config_requires_credentials() {
        assert!(StoreConfig::default().validate().is_err());

        let config = StoreConfig {
            url: "postgres://localhost/monitoring".to_string(),
            service_key: "key".to_string(),
            max_connections: 10,
        };
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_bad_policy_rejected() {
        let mut config = EngineConfig::default();
        config
            .escalation
            .rules
            .remove(&crate::model::Severity::Critical);
        assert!(config.validate().is_err());
    }
}
