//! MEDIUM tier: network health collectors.
//!
//! `NetworkHealthCollector` is the coordinator; `RFHealthCollector`,
//! `ConnectionStatsCollector`, `DataRatesCollector` and
//! `BluetoothCollector` are its leaves, each hitting a distinct endpoint
//! so a single slow/unavailable endpoint doesn't block the others.

use async_trait::async_trait;
use serde::Deserialize;

use crate::client::EndpointId;
use crate::error::{ErrorCategory, Result};
use crate::metrics::MetricHandle;
use crate::types::{MetricSample, Tier};

use super::{Collector, CollectorContext, CollectorFactory};

pub struct NetworkHealthCollector;
inventory::submit! { CollectorFactory(|| Box::new(NetworkHealthCollector)) }

#[async_trait]
impl Collector for NetworkHealthCollector {
    fn name(&self) -> &'static str {
        "network_health"
    }

    fn tier(&self) -> Tier {
        Tier::Medium
    }

    async fn collect(&self, _ctx: &CollectorContext) -> Result<Vec<MetricSample>> {
        // Coordinator only; leaves below emit the actual series.
        Ok(Vec::new())
    }
}

pub struct RFHealthCollector;
inventory::submit! { CollectorFactory(|| Box::new(RFHealthCollector)) }

#[derive(Deserialize)]
struct ChannelUtilizationHistory {
    #[serde(default)]
    utilization: f64,
}

#[async_trait]
impl Collector for RFHealthCollector {
    fn name(&self) -> &'static str {
        "rf_health"
    }

    fn tier(&self) -> Tier {
        Tier::Medium
    }

    async fn collect(&self, ctx: &CollectorContext) -> Result<Vec<MetricSample>> {
        let mut samples = Vec::new();

        for org in ctx.inventory.organizations().await?.iter() {
            for network in ctx
                .inventory
                .networks(&org.id)
                .await?
                .iter()
                .filter(|n| n.product_types.iter().any(|p| p == "wireless"))
            {
                let path = format!("/networks/{}/networkHealth/channelUtilization", network.id);
                super::track_api_call(self.name(), self.tier(), EndpointId::NetworkHealthRf.as_label());
                let history: Vec<ChannelUtilizationHistory> = match ctx
                    .client
                    .get_json(&path, EndpointId::NetworkHealthRf)
                    .await
                {
                    Ok(v) => v,
                    Err(e) if e.category() == ErrorCategory::NotAvailable => continue,
                    Err(e) => {
                        super::isolate_error(self.name(), self.tier(), &e);
                        continue;
                    }
                };

                if history.is_empty() {
                    continue;
                }
                let avg = history.iter().map(|h| h.utilization).sum::<f64>() / history.len() as f64;
                let score = (100.0 - avg).max(0.0);

                samples.push(MetricSample::new(
                    MetricHandle::NetworkRfHealthScore,
                    vec![network.id.clone()],
                    score,
                ));
            }
        }

        Ok(samples)
    }
}

pub struct ConnectionStatsCollector;
inventory::submit! { CollectorFactory(|| Box::new(ConnectionStatsCollector)) }

#[derive(Deserialize)]
struct ConnectionStats {
    #[serde(default)]
    assoc: u64,
    #[serde(default)]
    auth: u64,
    #[serde(default)]
    dhcp: u64,
    #[serde(default)]
    dns: u64,
    #[serde(default)]
    success: u64,
}

#[async_trait]
impl Collector for ConnectionStatsCollector {
    fn name(&self) -> &'static str {
        "connection_stats"
    }

    fn tier(&self) -> Tier {
        Tier::Medium
    }

    async fn collect(&self, ctx: &CollectorContext) -> Result<Vec<MetricSample>> {
        let mut samples = Vec::new();

        for org in ctx.inventory.organizations().await?.iter() {
            for network in ctx
                .inventory
                .networks(&org.id)
                .await?
                .iter()
                .filter(|n| n.product_types.iter().any(|p| p == "wireless"))
            {
                let path = format!("/networks/{}/wireless/connectionStats", network.id);
                super::track_api_call(
                    self.name(),
                    self.tier(),
                    EndpointId::NetworkHealthConnectionStats.as_label(),
                );
                let stats: ConnectionStats = match ctx
                    .client
                    .get_json(&path, EndpointId::NetworkHealthConnectionStats)
                    .await
                {
                    Ok(v) => v,
                    Err(e) if e.category() == ErrorCategory::NotAvailable => continue,
                    Err(e) => {
                        super::isolate_error(self.name(), self.tier(), &e);
                        continue;
                    }
                };

                let attempts = stats.assoc + stats.auth + stats.dhcp + stats.dns + stats.success;
                if attempts == 0 {
                    continue;
                }
                let success_pct = (stats.success as f64 / attempts as f64) * 100.0;

                for (stage, count) in [
                    ("association", stats.assoc),
                    ("authentication", stats.auth),
                    ("dhcp", stats.dhcp),
                    ("dns", stats.dns),
                ] {
                    let stage_success_pct = 100.0 - (count as f64 / attempts as f64) * 100.0;
                    samples.push(MetricSample::new(
                        MetricHandle::NetworkConnectionSuccessPercent,
                        vec![network.id.clone(), stage.to_string()],
                        stage_success_pct,
                    ));
                }

                samples.push(MetricSample::new(
                    MetricHandle::NetworkConnectionSuccessPercent,
                    vec![network.id.clone(), "overall".to_string()],
                    success_pct,
                ));
            }
        }

        Ok(samples)
    }
}

pub struct DataRatesCollector;
inventory::submit! { CollectorFactory(|| Box::new(DataRatesCollector)) }

#[derive(Deserialize)]
struct DataRateHistoryEntry {
    #[serde(rename = "downloadKbps", default)]
    download_kbps: f64,
    #[serde(rename = "uploadKbps", default)]
    upload_kbps: f64,
}

#[async_trait]
impl Collector for DataRatesCollector {
    fn name(&self) -> &'static str {
        "data_rates"
    }

    fn tier(&self) -> Tier {
        Tier::Medium
    }

    async fn collect(&self, ctx: &CollectorContext) -> Result<Vec<MetricSample>> {
        let mut samples = Vec::new();

        for org in ctx.inventory.organizations().await?.iter() {
            for network in ctx.inventory.networks(&org.id).await?.iter() {
                let path = format!("/networks/{}/clients/dataUsageHistory", network.id);
                super::track_api_call(self.name(), self.tier(), EndpointId::NetworkHealthDataRates.as_label());
                let history: Vec<DataRateHistoryEntry> = match ctx
                    .client
                    .get_json(&path, EndpointId::NetworkHealthDataRates)
                    .await
                {
                    Ok(v) => v,
                    Err(e) if e.category() == ErrorCategory::NotAvailable => continue,
                    Err(e) => {
                        super::isolate_error(self.name(), self.tier(), &e);
                        continue;
                    }
                };

                if history.is_empty() {
                    continue;
                }

                let down_bps = history.iter().map(|h| h.download_kbps).sum::<f64>()
                    / history.len() as f64
                    * 1000.0;
                let up_bps = history.iter().map(|h| h.upload_kbps).sum::<f64>()
                    / history.len() as f64
                    * 1000.0;

                samples.push(MetricSample::new(
                    MetricHandle::NetworkDataRateBps,
                    vec![network.id.clone(), "download".to_string()],
                    down_bps,
                ));
                samples.push(MetricSample::new(
                    MetricHandle::NetworkDataRateBps,
                    vec![network.id.clone(), "upload".to_string()],
                    up_bps,
                ));
            }
        }

        Ok(samples)
    }
}

pub struct BluetoothCollector;
inventory::submit! { CollectorFactory(|| Box::new(BluetoothCollector)) }

#[derive(Deserialize)]
struct BluetoothClient {
    #[allow(dead_code)]
    mac: String,
}

#[async_trait]
impl Collector for BluetoothCollector {
    fn name(&self) -> &'static str {
        "bluetooth"
    }

    fn tier(&self) -> Tier {
        Tier::Medium
    }

    async fn collect(&self, ctx: &CollectorContext) -> Result<Vec<MetricSample>> {
        let mut samples = Vec::new();

        for org in ctx.inventory.organizations().await?.iter() {
            for network in ctx
                .inventory
                .networks(&org.id)
                .await?
                .iter()
                .filter(|n| n.product_types.iter().any(|p| p == "wireless"))
            {
                let path = format!("/networks/{}/bluetoothClients", network.id);
                super::track_api_call(self.name(), self.tier(), EndpointId::NetworkHealthBluetooth.as_label());
                let clients: Vec<BluetoothClient> = match ctx
                    .client
                    .get_json_paginated(&path, EndpointId::NetworkHealthBluetooth)
                    .await
                {
                    Ok(v) => v,
                    Err(e) if e.category() == ErrorCategory::NotAvailable => continue,
                    Err(e) => {
                        super::isolate_error(self.name(), self.tier(), &e);
                        continue;
                    }
                };

                samples.push(MetricSample::new(
                    MetricHandle::NetworkBluetoothClientsTotal,
                    vec![network.id.clone()],
                    clients.len() as f64,
                ));
            }
        }

        Ok(samples)
    }
}
