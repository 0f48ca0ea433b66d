//! MEDIUM tier: device-scoped collectors.
//!
//! `DeviceCollector` emits the generic per-device series every product
//! type shares (`mt_device_up`, `mt_device_status_info`,
//! `mt_device_memory_used_percent`). The product-specific leaves
//! (`MSCollector`, `MRCollector` and its own three leaves,
//! `MXCollector`, `MVCollector`, `MGCollector`, `MTCollector`) each filter
//! the shared device inventory down to their family via
//! [`crate::types::Device::family`].

use async_trait::async_trait;
use serde::Deserialize;

use crate::client::EndpointId;
use crate::error::{ErrorCategory, Result};
use crate::metrics::MetricHandle;
use crate::types::{Device, MetricSample, Tier};

use super::{fan_out_batched, Collector, CollectorContext, CollectorFactory};

async fn devices_by_family(ctx: &CollectorContext, family: &str) -> Result<Vec<(String, Device)>> {
    let mut out = Vec::new();
    for org in ctx.inventory.organizations().await?.iter() {
        let devices = ctx.inventory.devices(&org.id).await?;
        out.extend(
            devices
                .iter()
                .filter(|d| d.family() == family)
                .map(|d| (org.id.clone(), d.clone())),
        );
    }
    Ok(out)
}

pub struct DeviceCollector;

inventory::submit! { CollectorFactory(|| Box::new(DeviceCollector)) }

#[derive(Deserialize)]
struct DeviceStatus {
    serial: String,
    #[serde(rename = "networkId")]
    network_id: String,
    status: String,
}

#[derive(Deserialize)]
struct MemoryHistoryEntry {
    serial: String,
    #[serde(default)]
    intervals: Vec<MemoryInterval>,
}

#[derive(Deserialize)]
struct MemoryInterval {
    memory: MemoryIntervalUsage,
}

#[derive(Deserialize)]
struct MemoryIntervalUsage {
    used: MemoryUsedStat,
}

#[derive(Deserialize)]
struct MemoryUsedStat {
    percentages: MemoryPercentages,
}

#[derive(Deserialize)]
struct MemoryPercentages {
    median: f64,
}

#[async_trait]
impl Collector for DeviceCollector {
    fn name(&self) -> &'static str {
        "device"
    }

    fn tier(&self) -> Tier {
        Tier::Medium
    }

    async fn collect(&self, ctx: &CollectorContext) -> Result<Vec<MetricSample>> {
        let mut samples = Vec::new();

        for org in ctx.inventory.organizations().await?.iter() {
            let devices = ctx.inventory.devices(&org.id).await?;
            let path = format!("/organizations/{}/devices/statuses", org.id);
            super::track_api_call(self.name(), self.tier(), EndpointId::DeviceStatuses.as_label());
            let statuses: Vec<DeviceStatus> =
                ctx.client.get_json_paginated(&path, EndpointId::DeviceStatuses).await?;

            let status_by_serial: std::collections::HashMap<_, _> =
                statuses.into_iter().map(|s| (s.serial.clone(), s)).collect();

            for device in devices.iter() {
                let status = status_by_serial.get(&device.serial);
                let up = status.map(|s| s.status == "online").unwrap_or(false);

                samples.push(MetricSample::new(
                    MetricHandle::DeviceUp,
                    vec![device.network_id.clone(), device.serial.clone(), device.model.clone()],
                    up as u8 as f64,
                ));

                samples.push(MetricSample::new(
                    MetricHandle::DeviceStatusInfo,
                    vec![
                        device.network_id.clone(),
                        device.serial.clone(),
                        device.model.clone(),
                        device.name.clone().unwrap_or_default(),
                        status.map(|s| s.status.clone()).unwrap_or_else(|| "unknown".into()),
                    ],
                    1.0,
                ));
            }

            let memory_path = format!(
                "/organizations/{}/devices/system/memory/usage/history/byInterval",
                org.id
            );
            super::track_api_call(self.name(), self.tier(), EndpointId::DeviceMemoryHistory.as_label());
            let memory_history: Vec<MemoryHistoryEntry> = match ctx
                .client
                .get_time_window(&memory_path, EndpointId::DeviceMemoryHistory, 300)
                .await
            {
                Ok(v) => v,
                Err(e) if e.category() == ErrorCategory::NotAvailable => Vec::new(),
                Err(e) => {
                    super::isolate_error(self.name(), self.tier(), &e);
                    Vec::new()
                }
            };

            let network_by_serial: std::collections::HashMap<_, _> =
                devices.iter().map(|d| (d.serial.clone(), d.network_id.clone())).collect();

            for entry in memory_history {
                let Some(network_id) = network_by_serial.get(&entry.serial) else { continue };
                for interval in &entry.intervals {
                    samples.push(MetricSample::new(
                        MetricHandle::DeviceMemoryUsedPercent,
                        vec![network_id.clone(), entry.serial.clone()],
                        interval.memory.used.percentages.median,
                    ));
                }
            }
        }

        Ok(samples)
    }
}

pub struct MSCollector;
inventory::submit! { CollectorFactory(|| Box::new(MSCollector)) }

#[derive(Deserialize)]
struct SwitchPort {
    #[serde(rename = "portId")]
    port_id: String,
    status: String,
    #[serde(default)]
    traffic: Option<PortTraffic>,
    #[serde(rename = "powerUsageInWh", default)]
    power_usage_wh: Option<f64>,
}

#[derive(Deserialize)]
struct PortTraffic {
    #[serde(default)]
    recv: f64,
    #[serde(default)]
    sent: f64,
}

#[async_trait]
impl Collector for MSCollector {
    fn name(&self) -> &'static str {
        "ms"
    }

    fn tier(&self) -> Tier {
        Tier::Medium
    }

    async fn collect(&self, ctx: &CollectorContext) -> Result<Vec<MetricSample>> {
        let devices: Vec<Device> =
            devices_by_family(ctx, "MS").await?.into_iter().map(|(_, d)| d).collect();

        let samples = fan_out_batched(self.name(), self.tier(), &ctx.config, devices, |device: Device| async move {
            let mut samples = Vec::new();

            let path = format!("/devices/{}/switch/ports/statuses", device.serial);
            super::track_api_call(self.name(), self.tier(), EndpointId::SwitchPortStatuses.as_label());
            let ports: Vec<SwitchPort> =
                match ctx.client.get_json(&path, EndpointId::SwitchPortStatuses).await {
                    Ok(p) => p,
                    Err(e) if e.category() == ErrorCategory::NotAvailable => return samples,
                    Err(e) => {
                        super::isolate_error(self.name(), self.tier(), &e);
                        return samples;
                    }
                };

            for port in ports {
                samples.push(MetricSample::new(
                    MetricHandle::SwitchPortStatus,
                    vec![device.network_id.clone(), device.serial.clone(), port.port_id.clone()],
                    (port.status == "Connected") as u8 as f64,
                ));

                if let Some(traffic) = &port.traffic {
                    samples.push(MetricSample::new(
                        MetricHandle::SwitchPortTrafficBytes,
                        vec![device.network_id.clone(), device.serial.clone(), port.port_id.clone(), "recv".into()],
                        traffic.recv,
                    ));
                    samples.push(MetricSample::new(
                        MetricHandle::SwitchPortTrafficBytes,
                        vec![device.network_id.clone(), device.serial.clone(), port.port_id.clone(), "sent".into()],
                        traffic.sent,
                    ));
                }

                if let Some(watts) = port.power_usage_wh {
                    samples.push(MetricSample::new(
                        MetricHandle::SwitchPoePowerWatts,
                        vec![device.network_id.clone(), device.serial.clone(), port.port_id],
                        watts,
                    ));
                }
            }

            samples
        })
        .await;

        Ok(samples)
    }
}

pub struct MRCollector;
inventory::submit! { CollectorFactory(|| Box::new(MRCollector)) }

#[async_trait]
impl Collector for MRCollector {
    fn name(&self) -> &'static str {
        "mr"
    }

    fn tier(&self) -> Tier {
        Tier::Medium
    }

    async fn collect(&self, ctx: &CollectorContext) -> Result<Vec<MetricSample>> {
        // Coordinator only: the actual series are emitted by its three
        // leaves (clients, performance, wireless) so each can be retried
        // and timed independently.
        let _ = devices_by_family(ctx, "MR").await?;
        Ok(Vec::new())
    }
}

pub struct MRClientsCollector;
inventory::submit! { CollectorFactory(|| Box::new(MRClientsCollector)) }

#[derive(Deserialize)]
struct WirelessClientCountLatest {
    #[serde(rename = "clientCount")]
    client_count: u64,
}

#[async_trait]
impl Collector for MRClientsCollector {
    fn name(&self) -> &'static str {
        "mr_clients"
    }

    fn tier(&self) -> Tier {
        Tier::Medium
    }

    async fn collect(&self, ctx: &CollectorContext) -> Result<Vec<MetricSample>> {
        let devices: Vec<Device> =
            devices_by_family(ctx, "MR").await?.into_iter().map(|(_, d)| d).collect();

        let samples = fan_out_batched(self.name(), self.tier(), &ctx.config, devices, |device: Device| async move {
            let mut samples = Vec::new();

            let path = format!("/devices/{}/wireless/status", device.serial);
            super::track_api_call(self.name(), self.tier(), EndpointId::WirelessClientCount.as_label());
            let latest: WirelessClientCountLatest = match ctx
                .client
                .get_json(&path, EndpointId::WirelessClientCount)
                .await
            {
                Ok(v) => v,
                Err(e) if e.category() == ErrorCategory::NotAvailable => return samples,
                Err(e) => {
                    super::isolate_error(self.name(), self.tier(), &e);
                    return samples;
                }
            };

            samples.push(MetricSample::new(
                MetricHandle::WirelessClientsConnected,
                vec![device.network_id.clone(), device.serial.clone()],
                latest.client_count as f64,
            ));

            samples
        })
        .await;

        Ok(samples)
    }
}

pub struct MRPerformanceCollector;
inventory::submit! { CollectorFactory(|| Box::new(MRPerformanceCollector)) }

#[derive(Deserialize)]
struct ChannelUtilization {
    band: String,
    #[serde(rename = "utilization")]
    utilization_percentage: f64,
}

#[async_trait]
impl Collector for MRPerformanceCollector {
    fn name(&self) -> &'static str {
        "mr_performance"
    }

    fn tier(&self) -> Tier {
        Tier::Medium
    }

    async fn collect(&self, ctx: &CollectorContext) -> Result<Vec<MetricSample>> {
        let devices: Vec<Device> =
            devices_by_family(ctx, "MR").await?.into_iter().map(|(_, d)| d).collect();

        let samples = fan_out_batched(self.name(), self.tier(), &ctx.config, devices, |device: Device| async move {
            let mut samples = Vec::new();

            let path = format!("/devices/{}/wireless/channelUtilization", device.serial);
            super::track_api_call(self.name(), self.tier(), EndpointId::WirelessChannelUtilization.as_label());
            let utilization: Vec<ChannelUtilization> = match ctx
                .client
                .get_json(&path, EndpointId::WirelessChannelUtilization)
                .await
            {
                Ok(v) => v,
                Err(e) if e.category() == ErrorCategory::NotAvailable => return samples,
                Err(e) => {
                    super::isolate_error(self.name(), self.tier(), &e);
                    return samples;
                }
            };

            for u in utilization {
                samples.push(MetricSample::new(
                    MetricHandle::WirelessChannelUtilizationPercent,
                    vec![device.network_id.clone(), device.serial.clone(), u.band],
                    u.utilization_percentage,
                ));
            }

            samples
        })
        .await;

        Ok(samples)
    }
}

pub struct MRWirelessCollector;
inventory::submit! { CollectorFactory(|| Box::new(MRWirelessCollector)) }

#[derive(Deserialize)]
struct SsidUsage {
    ssid: String,
    #[serde(default)]
    total: f64,
}

#[async_trait]
impl Collector for MRWirelessCollector {
    fn name(&self) -> &'static str {
        "mr_wireless"
    }

    fn tier(&self) -> Tier {
        Tier::Medium
    }

    async fn collect(&self, ctx: &CollectorContext) -> Result<Vec<MetricSample>> {
        let mut samples = Vec::new();

        for org in ctx.inventory.organizations().await?.iter() {
            let networks = ctx.inventory.networks(&org.id).await?;
            for network in networks
                .iter()
                .filter(|n| n.product_types.iter().any(|p| p == "wireless"))
            {
                let path = format!("/networks/{}/wireless/usageHistory", network.id);
                super::track_api_call(self.name(), self.tier(), EndpointId::WirelessChannelUtilization.as_label());
                let usage: Vec<SsidUsage> = ctx
                    .client
                    .get_json(&path, EndpointId::WirelessChannelUtilization)
                    .await
                    .unwrap_or_default();

                for entry in usage {
                    samples.push(MetricSample::new(
                        MetricHandle::WirelessSsidUsageBytes,
                        vec![network.id.clone(), entry.ssid],
                        entry.total,
                    ));
                }
            }
        }

        Ok(samples)
    }
}

pub struct MXCollector;
inventory::submit! { CollectorFactory(|| Box::new(MXCollector)) }

#[derive(Deserialize)]
struct UplinkStatus {
    interface: String,
    status: String,
}

#[derive(Deserialize)]
struct UplinksStatusEntry {
    serial: String,
    #[serde(rename = "networkId")]
    network_id: String,
    uplinks: Vec<UplinkStatus>,
}

#[derive(Deserialize)]
struct VpnStatusEntry {
    #[serde(rename = "networkId")]
    network_id: String,
    #[serde(rename = "deviceSerial")]
    device_serial: String,
    #[serde(rename = "merakiVpnPeers", default)]
    peers: Vec<VpnPeer>,
}

#[derive(Deserialize)]
struct VpnPeer {
    #[serde(rename = "networkId")]
    network_id: String,
    reachability: String,
}

#[async_trait]
impl Collector for MXCollector {
    fn name(&self) -> &'static str {
        "mx"
    }

    fn tier(&self) -> Tier {
        Tier::Medium
    }

    async fn collect(&self, ctx: &CollectorContext) -> Result<Vec<MetricSample>> {
        let mut samples = Vec::new();

        for org in ctx.inventory.organizations().await?.iter() {
            let path = format!("/organizations/{}/appliance/uplink/statuses", org.id);
            super::track_api_call(self.name(), self.tier(), EndpointId::ApplianceUplinkStatuses.as_label());
            let uplinks: Vec<UplinksStatusEntry> = match ctx
                .client
                .get_json_paginated(&path, EndpointId::ApplianceUplinkStatuses)
                .await
            {
                Ok(v) => v,
                Err(e) if e.category() == ErrorCategory::NotAvailable => continue,
                Err(e) => {
                    super::isolate_error(self.name(), self.tier(), &e);
                    continue;
                }
            };

            for entry in uplinks {
                for uplink in entry.uplinks {
                    samples.push(MetricSample::new(
                        MetricHandle::ApplianceUplinkStatus,
                        vec![entry.network_id.clone(), entry.serial.clone(), uplink.interface],
                        (uplink.status == "active") as u8 as f64,
                    ));
                }
            }

            let vpn_path = format!("/organizations/{}/appliance/vpn/statuses", org.id);
            super::track_api_call(self.name(), self.tier(), EndpointId::ApplianceVpnStatuses.as_label());
            let vpn: Vec<VpnStatusEntry> = match ctx
                .client
                .get_json_paginated(&vpn_path, EndpointId::ApplianceVpnStatuses)
                .await
            {
                Ok(v) => v,
                Err(e) if e.category() == ErrorCategory::NotAvailable => continue,
                Err(e) => {
                    super::isolate_error(self.name(), self.tier(), &e);
                    continue;
                }
            };

            for entry in vpn {
                for peer in entry.peers {
                    samples.push(MetricSample::new(
                        MetricHandle::ApplianceVpnStatus,
                        vec![entry.network_id.clone(), entry.device_serial.clone(), peer.network_id],
                        (peer.reachability == "reachable") as u8 as f64,
                    ));
                }
            }
        }

        Ok(samples)
    }
}

pub struct MVCollector;
inventory::submit! { CollectorFactory(|| Box::new(MVCollector)) }

#[async_trait]
impl Collector for MVCollector {
    fn name(&self) -> &'static str {
        "mv"
    }

    fn tier(&self) -> Tier {
        Tier::Medium
    }

    async fn collect(&self, ctx: &CollectorContext) -> Result<Vec<MetricSample>> {
        let mut samples = Vec::new();
        for (org_id, device) in devices_by_family(ctx, "MV").await? {
            let path = format!("/organizations/{org_id}/camera/devices/statuses");
            super::track_api_call(self.name(), self.tier(), EndpointId::CameraStatuses.as_label());
            let statuses: Vec<CameraDeviceStatus> = ctx
                .client
                .get_json(&path, EndpointId::CameraStatuses)
                .await
                .unwrap_or_default();

            if let Some(status) = statuses.into_iter().find(|s| s.serial == device.serial) {
                samples.push(MetricSample::new(
                    MetricHandle::CameraStatus,
                    vec![device.network_id.clone(), device.serial.clone()],
                    (status.status == "online") as u8 as f64,
                ));
            }
        }
        Ok(samples)
    }
}

#[derive(Deserialize, Default)]
struct CameraDeviceStatus {
    serial: String,
    status: String,
}

pub struct MGCollector;
inventory::submit! { CollectorFactory(|| Box::new(MGCollector)) }

#[derive(Deserialize)]
struct CellularStatus {
    serial: String,
    #[serde(rename = "signalStat", default)]
    signal: Option<SignalStat>,
}

#[derive(Deserialize)]
struct SignalStat {
    #[serde(default)]
    quality: f64,
}

#[async_trait]
impl Collector for MGCollector {
    fn name(&self) -> &'static str {
        "mg"
    }

    fn tier(&self) -> Tier {
        Tier::Medium
    }

    async fn collect(&self, ctx: &CollectorContext) -> Result<Vec<MetricSample>> {
        let mut samples = Vec::new();
        for org in ctx.inventory.organizations().await?.iter() {
            let path = format!("/organizations/{}/cellularGateway/uplink/statuses", org.id);
            super::track_api_call(self.name(), self.tier(), EndpointId::CellularGatewayStatuses.as_label());
            let statuses: Vec<CellularStatus> = match ctx
                .client
                .get_json_paginated(&path, EndpointId::CellularGatewayStatuses)
                .await
            {
                Ok(v) => v,
                Err(e) if e.category() == ErrorCategory::NotAvailable => continue,
                Err(e) => {
                    super::isolate_error(self.name(), self.tier(), &e);
                    continue;
                }
            };

            let devices = devices_by_family(ctx, "MG").await?;
            let network_by_serial: std::collections::HashMap<_, _> =
                devices.into_iter().map(|(_, d)| (d.serial.clone(), d.network_id)).collect();

            for status in statuses {
                if let (Some(network_id), Some(signal)) =
                    (network_by_serial.get(&status.serial), &status.signal)
                {
                    samples.push(MetricSample::new(
                        MetricHandle::CellularSignalQualityPercent,
                        vec![network_id.clone(), status.serial.clone()],
                        signal.quality,
                    ));
                }
            }
        }
        Ok(samples)
    }
}

pub struct MTCollector;
inventory::submit! { CollectorFactory(|| Box::new(MTCollector)) }

#[async_trait]
impl Collector for MTCollector {
    fn name(&self) -> &'static str {
        "mt"
    }

    fn tier(&self) -> Tier {
        Tier::Fast
    }

    async fn collect(&self, ctx: &CollectorContext) -> Result<Vec<MetricSample>> {
        // All MT telemetry is already covered by SensorCollector's
        // organization-wide `/sensor/readings/latest` sweep; this leaf
        // exists only so MT has a named, independently health-tracked
        // entry in the catalog, matching every other device family.
        let _ = devices_by_family(ctx, "MT").await?;
        Ok(Vec::new())
    }
}
