//! MEDIUM tier: organization-scoped collectors.
//!
//! `OrganizationCollector` is the coordinator; `ApiUsageCollector`,
//! `LicenseCollector` and `ClientOverviewCollector` are its leaves. All
//! four self-register independently so the manager schedules and times
//! each one separately, but they share the same organization inventory
//! fetch through [`crate::inventory::InventoryCache`].

use async_trait::async_trait;
use serde::Deserialize;

use crate::client::EndpointId;
use crate::error::{ErrorCategory, Result};
use crate::metrics::MetricHandle;
use crate::types::{LicenseMode, MetricSample, Organization, Tier};

use super::{fan_out_batched, Collector, CollectorContext, CollectorFactory};

pub struct OrganizationCollector;

inventory::submit! { CollectorFactory(|| Box::new(OrganizationCollector)) }

#[derive(Deserialize)]
struct DeviceStatusOverview {
    #[serde(default)]
    counts: DeviceStatusCounts,
}

#[derive(Deserialize, Default)]
struct DeviceStatusCounts {
    #[serde(default)]
    by_status: std::collections::HashMap<String, u64>,
}

#[async_trait]
impl Collector for OrganizationCollector {
    fn name(&self) -> &'static str {
        "organization"
    }

    fn tier(&self) -> Tier {
        Tier::Medium
    }

    async fn collect(&self, ctx: &CollectorContext) -> Result<Vec<MetricSample>> {
        let orgs = ctx.inventory.organizations().await?.as_ref().clone();

        let samples = fan_out_batched(self.name(), self.tier(), &ctx.config, orgs, |org: Organization| async move {
            let mut samples = Vec::new();

            let networks = match ctx.inventory.networks(&org.id).await {
                Ok(networks) => networks,
                Err(e) => {
                    super::isolate_error(self.name(), self.tier(), &e);
                    return samples;
                }
            };
            samples.push(MetricSample::new(
                MetricHandle::OrgNetworksTotal,
                vec![org.id.clone()],
                networks.len() as f64,
            ));

            let devices = match ctx.inventory.devices(&org.id).await {
                Ok(devices) => devices,
                Err(e) => {
                    super::isolate_error(self.name(), self.tier(), &e);
                    return samples;
                }
            };
            samples.push(MetricSample::new(
                MetricHandle::OrgDevicesTotal,
                vec![org.id.clone()],
                devices.len() as f64,
            ));

            let mut by_model: std::collections::HashMap<String, u64> = std::collections::HashMap::new();
            for device in devices.iter() {
                *by_model.entry(device.model.clone()).or_default() += 1;
            }
            for (model, count) in by_model {
                samples.push(MetricSample::new(
                    MetricHandle::OrgDevicesTotalByModel,
                    vec![org.id.clone(), model],
                    count as f64,
                ));
            }

            let path = format!("/organizations/{}/devices/statuses/overview", org.id);
            super::track_api_call(self.name(), self.tier(), EndpointId::DeviceStatuses.as_label());
            match ctx
                .client
                .get_json::<DeviceStatusOverview>(&path, EndpointId::DeviceStatuses)
                .await
            {
                Ok(overview) => {
                    for (status, count) in overview.counts.by_status {
                        samples.push(MetricSample::new(
                            MetricHandle::OrgDevicesAvailabilityTotal,
                            vec![org.id.clone(), status],
                            count as f64,
                        ));
                    }
                }
                Err(e) if e.category() == ErrorCategory::NotAvailable => {}
                Err(e) => super::isolate_error(self.name(), self.tier(), &e),
            }

            samples
        })
        .await;

        Ok(samples)
    }
}

pub struct ApiUsageCollector;

inventory::submit! { CollectorFactory(|| Box::new(ApiUsageCollector)) }

#[derive(Deserialize)]
struct ApiRequestOverview {
    #[serde(rename = "responseCodeCounts")]
    #[serde(default)]
    response_code_counts: std::collections::HashMap<String, u64>,
}

#[async_trait]
impl Collector for ApiUsageCollector {
    fn name(&self) -> &'static str {
        "api_usage"
    }

    fn tier(&self) -> Tier {
        Tier::Medium
    }

    async fn collect(&self, ctx: &CollectorContext) -> Result<Vec<MetricSample>> {
        let mut samples = Vec::new();

        for org in ctx.inventory.organizations().await?.iter() {
            let path = format!("/organizations/{}/apiRequests/overview", org.id);
            super::track_api_call(self.name(), self.tier(), EndpointId::ApiUsage.as_label());
            let usage: ApiRequestOverview = ctx.client.get_json(&path, EndpointId::ApiUsage).await?;
            let remaining: u64 = usage
                .response_code_counts
                .iter()
                .filter(|(code, _)| *code != "429")
                .map(|(_, c)| *c)
                .sum();

            samples.push(MetricSample::new(
                MetricHandle::OrgApiRequestsRemaining,
                vec![org.id.clone()],
                remaining as f64,
            ));
        }

        Ok(samples)
    }
}

pub struct LicenseCollector;

inventory::submit! { CollectorFactory(|| Box::new(LicenseCollector)) }

#[derive(Deserialize)]
struct LicenseOverview {
    status: String,
    #[serde(default, rename = "expirationDate")]
    expiration_date: Option<chrono::DateTime<chrono::Utc>>,
    #[serde(default, rename = "licensedDeviceCounts")]
    licensed_device_counts: Option<std::collections::HashMap<String, u64>>,
    #[serde(default, rename = "licenseCount")]
    license_count: Option<u64>,
    #[serde(default, rename = "licensesUsed")]
    licenses_used: Option<u64>,
}

#[async_trait]
impl Collector for LicenseCollector {
    fn name(&self) -> &'static str {
        "license"
    }

    fn tier(&self) -> Tier {
        Tier::Medium
    }

    async fn collect(&self, ctx: &CollectorContext) -> Result<Vec<MetricSample>> {
        let mut samples = Vec::new();

        for org in ctx.inventory.organizations().await?.iter() {
            let path = format!("/organizations/{}/licenses/overview", org.id);
            super::track_api_call(self.name(), self.tier(), EndpointId::License.as_label());
            let overview: LicenseOverview = match ctx
                .client
                .get_json(&path, EndpointId::License)
                .await
            {
                Ok(o) => o,
                Err(e) if e.category() == ErrorCategory::NotAvailable => continue,
                Err(e) => {
                    super::isolate_error(self.name(), self.tier(), &e);
                    continue;
                }
            };

            let (mode, total, used) = if let Some(counts) = &overview.licensed_device_counts {
                let total: u64 = counts.values().sum();
                (LicenseMode::PerDevice, Some(total), None)
            } else if overview.license_count.is_some() || overview.licenses_used.is_some() {
                (LicenseMode::CoTermination, overview.license_count, overview.licenses_used)
            } else {
                // Open Question #2: unrecognized payload shape, emit nothing
                // for this organization rather than guessing a mode.
                continue;
            };

            let mode_label = match mode {
                LicenseMode::PerDevice => "per_device",
                LicenseMode::CoTermination => "co_termination",
                LicenseMode::Unknown => "unknown",
            };

            samples.push(MetricSample::new(
                MetricHandle::OrgLicenseState,
                vec![org.id.clone(), mode_label.to_string(), overview.status.clone()],
                1.0,
            ));

            if let Some(expiry) = overview.expiration_date {
                let expiring_soon = expiry - chrono::Utc::now() < chrono::Duration::days(30);
                samples.push(MetricSample::new(
                    MetricHandle::OrgLicenseExpiringSoon,
                    vec![org.id.clone()],
                    expiring_soon as u8 as f64,
                ));
            }

            if let Some(total) = total {
                samples.push(MetricSample::new(
                    MetricHandle::OrgLicenseSeatsTotal,
                    vec![org.id.clone()],
                    total as f64,
                ));
            }
            if let Some(used) = used {
                samples.push(MetricSample::new(
                    MetricHandle::OrgLicenseSeatsUsed,
                    vec![org.id.clone()],
                    used as f64,
                ));
            }
        }

        Ok(samples)
    }
}

pub struct ClientOverviewCollector;

inventory::submit! { CollectorFactory(|| Box::new(ClientOverviewCollector)) }

#[derive(Deserialize)]
struct ClientsOverview {
    counts: ClientCounts,
    usage: ClientUsage,
}

#[derive(Deserialize)]
struct ClientCounts {
    total: u64,
}

#[derive(Deserialize)]
struct ClientUsage {
    #[serde(default)]
    overall: Option<ClientUsageOverall>,
}

#[derive(Deserialize)]
struct ClientUsageOverall {
    #[serde(default)]
    downstream: f64,
    #[serde(default)]
    upstream: f64,
}

#[async_trait]
impl Collector for ClientOverviewCollector {
    fn name(&self) -> &'static str {
        "client_overview"
    }

    fn tier(&self) -> Tier {
        Tier::Medium
    }

    async fn collect(&self, ctx: &CollectorContext) -> Result<Vec<MetricSample>> {
        let mut samples = Vec::new();

        for org in ctx.inventory.organizations().await?.iter() {
            let path = format!("/organizations/{}/clients/overview", org.id);
            super::track_api_call(self.name(), self.tier(), EndpointId::ClientOverview.as_label());
            let overview: ClientsOverview =
                match ctx.client.get_json(&path, EndpointId::ClientOverview).await {
                    Ok(o) => o,
                    Err(e) if e.category() == ErrorCategory::NotAvailable => continue,
                    Err(e) => {
                        super::isolate_error(self.name(), self.tier(), &e);
                        continue;
                    }
                };

            samples.push(MetricSample::new(
                MetricHandle::OrgClientsOnlineTotal,
                vec![org.id.clone()],
                overview.counts.total as f64,
            ));

            if let Some(usage) = overview.usage.overall {
                samples.push(MetricSample::new(
                    MetricHandle::OrgClientsUsageBytes,
                    vec![org.id.clone(), "downstream".to_string()],
                    usage.downstream,
                ));
                samples.push(MetricSample::new(
                    MetricHandle::OrgClientsUsageBytes,
                    vec![org.id.clone(), "upstream".to_string()],
                    usage.upstream,
                ));
            }

            let usage_path = format!("/organizations/{}/summary/top/applications/byUsage", org.id);
            super::track_api_call(self.name(), self.tier(), EndpointId::ApplicationUsage.as_label());
            let app_usage: Vec<ApplicationUsageEntry> = ctx
                .client
                .get_json(&usage_path, EndpointId::ApplicationUsage)
                .await
                .unwrap_or_default();

            for entry in app_usage {
                samples.push(MetricSample::new(
                    MetricHandle::OrgApplicationUsageBytes,
                    vec![org.id.clone(), entry.category, entry.application],
                    entry.total as f64,
                ));
            }
        }

        Ok(samples)
    }
}

#[derive(Deserialize, Default)]
struct ApplicationUsageEntry {
    application: String,
    #[serde(default)]
    category: String,
    total: f64,
}
