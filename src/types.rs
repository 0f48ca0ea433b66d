//! Core data model shared across the client, inventory cache, collectors
//! and manager.

use std::time::Instant;

use serde::{Deserialize, Serialize};

/// A Meraki organization id, as returned by the Dashboard API. Kept as a
/// `String` rather than a numeric type: Meraki ids are large decimal
/// strings that are never arithmetically manipulated.
pub type OrgId = String;
pub type NetworkId = String;
pub type DeviceSerial = String;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Organization {
    #[serde(rename = "id")]
    pub id: OrgId,
    pub name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Network {
    pub id: NetworkId,
    pub organization_id: OrgId,
    pub name: String,
    #[serde(default)]
    pub product_types: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Device {
    pub serial: DeviceSerial,
    pub network_id: NetworkId,
    #[serde(default)]
    pub name: Option<String>,
    pub model: String,
    #[serde(default)]
    pub product_type: Option<String>,
}

impl Device {
    /// The device family used to route this device to the right
    /// sub-collector (MS/MR/MX/MV/MG/MT), derived from the model prefix.
    pub fn family(&self) -> &'static str {
        let model = self.model.to_uppercase();
        if model.starts_with("MS") {
            "MS"
        } else if model.starts_with("MR") || model.starts_with("CW") {
            "MR"
        } else if model.starts_with("MX")
            || model.starts_with("Z1")
            || model.starts_with("Z3")
            || model.starts_with("Z4")
        {
            "MX"
        } else if model.starts_with("MV") {
            "MV"
        } else if model.starts_with("MG") {
            "MG"
        } else if model.starts_with("MT") {
            "MT"
        } else {
            "UNKNOWN"
        }
    }
}

/// Meraki licensing mode. `PerDevice` orgs report device counts, `CoTermination`
/// orgs report seat counts; the two are mutually exclusive per organization.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum LicenseMode {
    PerDevice,
    CoTermination,
    Unknown,
}

/// Cached PTR-lookup result used by the opt-in `ClientsCollector` to avoid
/// emitting raw client identifiers while still labeling traffic by hostname
/// when one resolves.
#[derive(Debug, Clone)]
pub struct DnsCacheEntry {
    pub ip: String,
    pub hostname: Option<String>,
    pub resolved_monotonic: Instant,
}

/// One polling tier. The manager runs one scheduler loop per tier, each on
/// its own interval.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Tier {
    Fast,
    Medium,
    Slow,
}

impl Tier {
    pub fn as_label(&self) -> &'static str {
        match self {
            Tier::Fast => "fast",
            Tier::Medium => "medium",
            Tier::Slow => "slow",
        }
    }
}

/// Rolling health record for a single collector, keyed by collector name
/// in the manager. Drives both the `/health` endpoint and the
/// `exporter_collector_*` self-instrumentation metrics.
#[derive(Debug, Clone)]
pub struct CollectorHealth {
    pub name: String,
    pub tier: Tier,
    pub last_success: Option<Instant>,
    pub last_attempt: Option<Instant>,
    pub consecutive_failures: u32,
    pub last_error: Option<String>,
}

impl CollectorHealth {
    pub fn new(name: impl Into<String>, tier: Tier) -> Self {
        Self {
            name: name.into(),
            tier,
            last_success: None,
            last_attempt: None,
            consecutive_failures: 0,
            last_error: None,
        }
    }

    pub fn record_outcome(&mut self, outcome: &RequestOutcome) {
        self.last_attempt = Some(outcome.at);
        match &outcome.result {
            Ok(()) => {
                self.last_success = Some(outcome.at);
                self.consecutive_failures = 0;
                self.last_error = None;
            }
            Err(msg) => {
                self.consecutive_failures += 1;
                self.last_error = Some(msg.clone());
            }
        }
    }
}

/// Outcome of a single collector run, fed into `CollectorHealth` and the
/// manager's overrun-suppression logic.
#[derive(Debug, Clone)]
pub struct RequestOutcome {
    pub at: Instant,
    pub duration: std::time::Duration,
    pub result: std::result::Result<(), String>,
}

/// A single sample destined for the metric registry: handle + label
/// values + numeric value. Collectors build these; the registry applies
/// them to the underlying Prometheus series and records freshness.
#[derive(Debug, Clone)]
pub struct MetricSample {
    pub handle: crate::metrics::MetricHandle,
    pub labels: Vec<String>,
    pub value: f64,
}

impl MetricSample {
    pub fn new(handle: crate::metrics::MetricHandle, labels: Vec<String>, value: f64) -> Self {
        Self { handle, labels, value }
    }
}

/// A cached inventory entry: the value plus when it was fetched, used by
/// the inventory cache to decide freshness independent of any particular
/// TTL constant (each call site supplies its own TTL).
#[derive(Debug, Clone)]
pub struct InventoryEntry<T> {
    pub value: std::sync::Arc<T>,
    pub fetched_at: Instant,
}

impl<T> InventoryEntry<T> {
    pub fn is_fresh(&self, ttl: std::time::Duration) -> bool {
        self.fetched_at.elapsed() < ttl
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn device_family_detection() {
        let d = |model: &str| Device {
            serial: "Q2XX-0000-0000".into(),
            network_id: "N_1".into(),
            name: None,
            model: model.into(),
            product_type: None,
        };
        assert_eq!(d("MS120-8").family(), "MS");
        assert_eq!(d("MR36").family(), "MR");
        assert_eq!(d("MX68").family(), "MX");
        assert_eq!(d("MV12").family(), "MV");
        assert_eq!(d("MG21").family(), "MG");
        assert_eq!(d("MT10").family(), "MT");
        assert_eq!(d("ZZZ99").family(), "UNKNOWN");
    }

    #[test]
    fn collector_health_tracks_streaks() {
        let mut h = CollectorHealth::new("sensor", Tier::Fast);
        let now = Instant::now();
        h.record_outcome(&RequestOutcome {
            at: now,
            duration: std::time::Duration::from_millis(10),
            result: Err("boom".into()),
        });
        assert_eq!(h.consecutive_failures, 1);
        h.record_outcome(&RequestOutcome {
            at: now,
            duration: std::time::Duration::from_millis(10),
            result: Ok(()),
        });
        assert_eq!(h.consecutive_failures, 0);
        assert!(h.last_success.is_some());
    }
}
