//! Configuration validation logic, run once at startup.

use crate::config::Config;
use crate::error::{Error, Result};

impl Config {
    /// Validate configuration. Called once by [`Config::from_env`]; a
    /// failure here means the process exits non-zero before binding any
    /// listener or starting the scheduler.
    pub fn validate(&self) -> Result<()> {
        if self.meraki.api_key.trim().is_empty() {
            return Err(Error::Config("meraki.api_key (MERAKI__API_KEY) is required".to_string()));
        }

        if self.meraki.api_base_url.trim().is_empty() {
            return Err(Error::Config("meraki.api_base_url must not be empty".to_string()));
        }

        if self.api.concurrency_limit == 0 {
            return Err(Error::Config("api.concurrency_limit must be non-zero".to_string()));
        }

        if self.api.page_size == 0 {
            return Err(Error::Config("api.page_size must be non-zero".to_string()));
        }

        if self.api.batch_size == 0 {
            return Err(Error::Config("api.batch_size must be non-zero".to_string()));
        }

        if self.server.port == 0 {
            return Err(Error::Config("server.port must be non-zero".to_string()));
        }

        let intervals = &self.update_intervals;
        if intervals.fast == 0 || intervals.medium == 0 || intervals.slow == 0 {
            return Err(Error::Config("update_intervals must all be non-zero".to_string()));
        }

        if !(intervals.fast < intervals.medium && intervals.medium < intervals.slow) {
            return Err(Error::Config(
                "update_intervals must satisfy fast < medium < slow".to_string(),
            ));
        }

        if self.collectors.collector_timeout == 0 {
            return Err(Error::Config("collectors.collector_timeout must be non-zero".to_string()));
        }

        if self.monitoring.metric_ttl_multiplier <= 1.0 {
            return Err(Error::Config(
                "monitoring.metric_ttl_multiplier must be greater than 1.0".to_string(),
            ));
        }

        if self.clients.enabled && self.clients.max_clients_per_network == 0 {
            return Err(Error::Config(
                "clients.max_clients_per_network must be non-zero when clients.enabled is true"
                    .to_string(),
            ));
        }

        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&self.logging.level.as_str()) {
            return Err(Error::Config(format!(
                "invalid logging.level: {}. Valid options: {:?}",
                self.logging.level, valid_levels
            )));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid_config() -> Config {
        let mut cfg = Config::default();
        cfg.meraki.api_key = "test-key".to_string();
        cfg
    }

    #[test]
    fn test_valid_config() {
        assert!(valid_config().validate().is_ok());
    }

    #[test]
    fn test_missing_api_key() {
        let config = Config::default();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_invalid_port() {
        let mut config = valid_config();
        config.server.port = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_interval_ordering_enforced() {
        let mut config = valid_config();
        config.update_intervals.fast = 600;
        config.update_intervals.medium = 300;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_ttl_multiplier_must_exceed_one() {
        let mut config = valid_config();
        config.monitoring.metric_ttl_multiplier = 1.0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_clients_enabled_requires_nonzero_cap() {
        let mut config = valid_config();
        config.clients.enabled = true;
        config.clients.max_clients_per_network = 0;
        assert!(config.validate().is_err());
    }
}
