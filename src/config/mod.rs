//! Configuration for the exporter.
//!
//! Loaded once at startup from environment variables (double-underscore
//! nested, e.g. `MERAKI__API_KEY`, `UPDATE_INTERVALS__MEDIUM`) via the
//! `config` crate, validated, and then held immutably behind an
//! `Arc<Config>` for the lifetime of the process. There is no hot-reload:
//! a config change requires a restart.

use std::time::Duration;

use serde::Deserialize;

pub mod validation;

use crate::error::{Error, Result};
use crate::types::Tier;

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Config {
    pub meraki: MerakiConfig,
    pub api: ApiConfig,
    pub update_intervals: UpdateIntervalsConfig,
    pub collectors: CollectorsConfig,
    pub monitoring: MonitoringConfig,
    pub clients: ClientsConfig,
    pub server: ServerConfig,
    pub logging: LoggingConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            meraki: MerakiConfig::default(),
            api: ApiConfig::default(),
            update_intervals: UpdateIntervalsConfig::default(),
            collectors: CollectorsConfig::default(),
            monitoring: MonitoringConfig::default(),
            clients: ClientsConfig::default(),
            server: ServerConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

/// `MERAKI__*` — identity and target of the upstream Dashboard API.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct MerakiConfig {
    pub api_key: String,
    /// Optional organization allow-list (`MERAKI__ORG_ID`, comma-separated).
    /// Empty means "every organization the API key can see".
    #[serde(default)]
    pub org_id: Vec<String>,
    pub api_base_url: String,
}

impl Default for MerakiConfig {
    fn default() -> Self {
        Self { api_key: String::new(), org_id: Vec::new(), api_base_url: default_base_url() }
    }
}

/// `API__*` — tuning knobs for the Upstream Client.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    pub timeout: u64,
    pub max_retries: u32,
    pub concurrency_limit: usize,
    pub batch_size: usize,
    pub batch_delay: u64,
    pub rate_limit_retry_wait: u64,
    pub page_size: u32,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            timeout: 30,
            max_retries: 5,
            concurrency_limit: 10,
            batch_size: 10,
            batch_delay: 1,
            rate_limit_retry_wait: 1,
            page_size: 1000,
        }
    }
}

impl ApiConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout)
    }
    pub fn batch_delay(&self) -> Duration {
        Duration::from_secs(self.batch_delay)
    }
    pub fn rate_limit_retry_wait(&self) -> Duration {
        Duration::from_secs(self.rate_limit_retry_wait)
    }
}

/// `UPDATE_INTERVALS__*` — the three tier cadences, in seconds.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct UpdateIntervalsConfig {
    pub fast: u64,
    pub medium: u64,
    pub slow: u64,
}

impl Default for UpdateIntervalsConfig {
    fn default() -> Self {
        Self { fast: 60, medium: 300, slow: 900 }
    }
}

impl UpdateIntervalsConfig {
    pub fn fast_interval(&self) -> Duration {
        Duration::from_secs(self.fast)
    }
    pub fn medium_interval(&self) -> Duration {
        Duration::from_secs(self.medium)
    }
    pub fn slow_interval(&self) -> Duration {
        Duration::from_secs(self.slow)
    }
    pub fn interval_for(&self, tier: Tier) -> Duration {
        match tier {
            Tier::Fast => self.fast_interval(),
            Tier::Medium => self.medium_interval(),
            Tier::Slow => self.slow_interval(),
        }
    }
}

/// `COLLECTORS__*` — selective enable/disable, applied once at startup.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CollectorsConfig {
    /// Allow-list: if non-empty, only these collector names run.
    #[serde(default)]
    pub enabled_collectors: Vec<String>,
    /// Deny-list: always wins over `enabled_collectors`.
    #[serde(default)]
    pub disable_collectors: Vec<String>,
    pub collector_timeout: u64,
}

impl Default for CollectorsConfig {
    fn default() -> Self {
        Self {
            enabled_collectors: Vec::new(),
            disable_collectors: Vec::new(),
            collector_timeout: 120,
        }
    }
}

impl CollectorsConfig {
    pub fn collector_timeout(&self) -> Duration {
        Duration::from_secs(self.collector_timeout)
    }

    /// Whether `name` should run, honoring the allow-list and deny-list.
    /// The `clients` collector additionally needs `CLIENTS__ENABLED`,
    /// checked separately by the caller via [`ClientsConfig`].
    pub fn is_enabled(&self, name: &str) -> bool {
        if self.disable_collectors.iter().any(|d| d == name) {
            return false;
        }
        if !self.enabled_collectors.is_empty() {
            return self.enabled_collectors.iter().any(|e| e == name);
        }
        true
    }
}

/// `MONITORING__*` — metric lifecycle and histogram tuning.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct MonitoringConfig {
    pub metric_ttl_multiplier: f64,
    pub unhealthy_after_seconds: Option<u64>,
    /// Inventory cache TTL, in seconds. Defaults to the MEDIUM tier
    /// interval per spec §4.2 when unset.
    pub inventory_ttl_seconds: Option<u64>,
    pub license_expiration_warning_days: i64,
}

impl Default for MonitoringConfig {
    fn default() -> Self {
        Self {
            metric_ttl_multiplier: 2.5,
            unhealthy_after_seconds: None,
            inventory_ttl_seconds: None,
            license_expiration_warning_days: 30,
        }
    }
}

impl MonitoringConfig {
    pub fn unhealthy_after(&self, medium_interval: Duration) -> Duration {
        match self.unhealthy_after_seconds {
            Some(s) => Duration::from_secs(s),
            None => medium_interval * 3,
        }
    }

    pub fn inventory_ttl(&self, medium_interval: Duration) -> Duration {
        match self.inventory_ttl_seconds {
            Some(s) => Duration::from_secs(s),
            None => medium_interval,
        }
    }
}

/// `CLIENTS__*` — the opt-in, per-client collector. Off by default because
/// per-client metrics are the one place cardinality and privacy collide.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ClientsConfig {
    pub enabled: bool,
    pub cache_ttl: u64,
    pub dns_enabled: bool,
    pub dns_cache_ttl: u64,
    pub max_clients_per_network: usize,
}

impl Default for ClientsConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            cache_ttl: 300,
            dns_enabled: false,
            dns_cache_ttl: 3600,
            max_clients_per_network: 500,
        }
    }
}

impl ClientsConfig {
    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl)
    }
    pub fn dns_cache_ttl(&self) -> Duration {
        Duration::from_secs(self.dns_cache_ttl)
    }
}

/// `SERVER__*` — the HTTP exposition surface.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub path_prefix: String,
    pub enable_health_check: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            path_prefix: String::new(),
            enable_health_check: true,
        }
    }
}

/// `LOGGING__*`.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self { level: default_log_level() }
    }
}

fn default_base_url() -> String {
    "https://api.meraki.com/api/v1".to_string()
}
fn default_host() -> String {
    "0.0.0.0".to_string()
}
fn default_port() -> u16 {
    9363
}
fn default_log_level() -> String {
    "info".to_string()
}

impl Config {
    /// Load configuration from the process environment.
    ///
    /// Variables are double-underscore separated and upper-cased, e.g.
    /// `MERAKI__API_KEY`, `API__CONCURRENCY_LIMIT`,
    /// `UPDATE_INTERVALS__MEDIUM`, `MONITORING__METRIC_TTL_MULTIPLIER`.
    pub fn from_env() -> Result<Self> {
        let source = config::Config::builder()
            .add_source(
                config::Environment::default()
                    .separator("__")
                    .list_separator(",")
                    .with_list_parse_key("meraki.org_id")
                    .with_list_parse_key("collectors.enabled_collectors")
                    .with_list_parse_key("collectors.disable_collectors")
                    .try_parsing(true),
            )
            .build()
            .map_err(|e| Error::Config(format!("failed to build config sources: {e}")))?;

        let cfg: Self = source
            .try_deserialize()
            .map_err(|e| Error::Config(format!("failed to deserialize config: {e}")))?;

        cfg.validate()?;
        Ok(cfg)
    }
}
