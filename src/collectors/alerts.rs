//! MEDIUM tier: active assurance alerts, grouped by type/category/severity.
//!
//! A single upstream endpoint drives three distinct metric families
//! (organization-wide, network-health, sensor), split by `category`, so a
//! malformed or missing entry in one group doesn't block the others.

use std::collections::HashMap;

use async_trait::async_trait;
use serde::Deserialize;

use crate::client::EndpointId;
use crate::error::{ErrorCategory, Result};
use crate::metrics::MetricHandle;
use crate::types::{MetricSample, Tier};

use super::{Collector, CollectorContext, CollectorFactory};

pub struct AlertsCollector;

inventory::submit! { CollectorFactory(|| Box::new(AlertsCollector)) }

#[derive(Deserialize)]
struct Alert {
    #[serde(rename = "type")]
    alert_type: String,
    category: String,
    #[serde(default)]
    severity: Option<String>,
    #[serde(rename = "deviceType", default)]
    device_type: Option<String>,
    #[serde(rename = "network", default)]
    network: Option<AlertNetwork>,
}

#[derive(Deserialize)]
struct AlertNetwork {
    id: String,
}

/// Key used to fold individual alert instances into per-group counts.
#[derive(PartialEq, Eq, Hash)]
struct GroupKey {
    network_id: String,
    alert_type: String,
    severity: String,
}

#[async_trait]
impl Collector for AlertsCollector {
    fn name(&self) -> &'static str {
        "alerts"
    }

    fn tier(&self) -> Tier {
        Tier::Medium
    }

    async fn collect(&self, ctx: &CollectorContext) -> Result<Vec<MetricSample>> {
        let mut samples = Vec::new();

        for org in ctx.inventory.organizations().await?.iter() {
            let path = format!("/organizations/{}/assurance/alerts", org.id);
            super::track_api_call(self.name(), self.tier(), EndpointId::AssuranceAlerts.as_label());
            let alerts: Vec<Alert> =
                match ctx.client.get_json_paginated(&path, EndpointId::AssuranceAlerts).await {
                    Ok(a) => a,
                    Err(e) if e.category() == ErrorCategory::NotAvailable => continue,
                    Err(e) => {
                        super::isolate_error(self.name(), self.tier(), &e);
                        continue;
                    }
                };

            let mut org_counts: HashMap<(String, String), u64> = HashMap::new();
            let mut network_counts: HashMap<GroupKey, u64> = HashMap::new();
            let mut sensor_counts: HashMap<GroupKey, u64> = HashMap::new();

            for alert in &alerts {
                let severity = alert.severity.clone().unwrap_or_else(|| "info".to_string());
                *org_counts.entry((alert.alert_type.clone(), severity.clone())).or_default() += 1;

                let Some(network) = &alert.network else { continue };
                let key = GroupKey {
                    network_id: network.id.clone(),
                    alert_type: alert.alert_type.clone(),
                    severity: severity.clone(),
                };

                match alert.device_type.as_deref() {
                    Some("sensor") => *sensor_counts.entry(key).or_default() += 1,
                    _ => *network_counts.entry(key).or_default() += 1,
                }
            }

            for ((alert_type, severity), count) in org_counts {
                samples.push(MetricSample::new(
                    MetricHandle::OrgAlertsTotal,
                    vec![org.id.clone(), alert_type, severity],
                    count as f64,
                ));
            }

            for (key, count) in network_counts {
                samples.push(MetricSample::new(
                    MetricHandle::NetworkHealthAlertsTotal,
                    vec![org.id.clone(), key.network_id, key.alert_type, key.severity],
                    count as f64,
                ));
            }

            for (key, count) in sensor_counts {
                samples.push(MetricSample::new(
                    MetricHandle::SensorAlertsTotal,
                    vec![org.id.clone(), key.network_id, key.alert_type, key.severity],
                    count as f64,
                ));
            }
        }

        Ok(samples)
    }
}
