//! The opt-in, per-network clients collector.
//!
//! Disabled by default (`CLIENTS__ENABLED=false`): per-client identifiers
//! are the one place cardinality and privacy collide, so this collector
//! only ever emits network-level aggregates, never a per-client series.
//! When `CLIENTS__DNS_ENABLED` is also set, resolved hostnames stay inside
//! a process-local reverse-DNS cache and are never attached as a metric
//! label — the cache exists purely to bound repeat PTR lookups, observed
//! through the `mt_client_dns_cache_*` counters.

use std::time::Instant;

use async_trait::async_trait;
use dashmap::DashMap;
use serde::Deserialize;

use crate::client::EndpointId;
use crate::error::{ErrorCategory, Result};
use crate::metrics::MetricHandle;
use crate::types::{DnsCacheEntry, MetricSample, Tier};

use super::{Collector, CollectorContext, CollectorFactory};

pub struct ClientsCollector {
    dns_cache: DashMap<String, DnsCacheEntry>,
}

impl ClientsCollector {
    fn new() -> Self {
        Self { dns_cache: DashMap::new() }
    }
}

inventory::submit! { CollectorFactory(|| Box::new(ClientsCollector::new())) }

#[derive(Deserialize)]
struct ClientEntry {
    #[serde(default)]
    ip: Option<String>,
    #[serde(default)]
    status: Option<String>,
    #[serde(default)]
    usage: Option<ClientUsage>,
    #[serde(rename = "rssi", default)]
    rssi: Option<f64>,
    #[serde(default)]
    ssid: Option<String>,
    #[serde(default)]
    vlan: Option<u64>,
}

#[derive(Deserialize)]
struct ClientUsage {
    #[serde(default)]
    sent: f64,
    #[serde(default)]
    recv: f64,
}

#[async_trait]
impl Collector for ClientsCollector {
    fn name(&self) -> &'static str {
        "clients"
    }

    fn tier(&self) -> Tier {
        Tier::Medium
    }

    async fn collect(&self, ctx: &CollectorContext) -> Result<Vec<MetricSample>> {
        if !ctx.config.clients.enabled {
            return Ok(Vec::new());
        }

        let mut samples = Vec::new();
        let cap = ctx.config.clients.max_clients_per_network;

        for org in ctx.inventory.organizations().await?.iter() {
            for network in ctx.inventory.networks(&org.id).await?.iter() {
                let path = format!("/networks/{}/clients", network.id);
                super::track_api_call(self.name(), self.tier(), EndpointId::Clients.as_label());
                let mut clients: Vec<ClientEntry> =
                    match ctx.client.get_json_paginated(&path, EndpointId::Clients).await {
                        Ok(c) => c,
                        Err(e) if e.category() == ErrorCategory::NotAvailable => continue,
                        Err(e) => {
                            super::isolate_error(self.name(), self.tier(), &e);
                            continue;
                        }
                    };

                if clients.len() > cap {
                    tracing::warn!(
                        network_id = %network.id,
                        total = clients.len(),
                        cap,
                        "truncating client list to configured cap"
                    );
                    clients.truncate(cap);
                }

                let mut upstream = 0.0;
                let mut downstream = 0.0;
                let mut rssi_sum = 0.0;
                let mut rssi_count = 0u64;
                let mut status_counts: std::collections::HashMap<String, u64> =
                    std::collections::HashMap::new();
                let mut ssid_counts: std::collections::HashMap<String, u64> =
                    std::collections::HashMap::new();
                let mut vlan_counts: std::collections::HashMap<String, u64> =
                    std::collections::HashMap::new();

                for client in &clients {
                    if let Some(usage) = &client.usage {
                        upstream += usage.sent;
                        downstream += usage.recv;
                    }
                    if let Some(rssi) = client.rssi {
                        rssi_sum += rssi;
                        rssi_count += 1;
                    }
                    let status = client.status.clone().unwrap_or_else(|| "unknown".to_string());
                    *status_counts.entry(status).or_default() += 1;

                    if let Some(ssid) = &client.ssid {
                        *ssid_counts.entry(ssid.clone()).or_default() += 1;
                    }
                    if let Some(vlan) = client.vlan {
                        *vlan_counts.entry(vlan.to_string()).or_default() += 1;
                    }

                    if ctx.config.clients.dns_enabled {
                        if let Some(ip) = &client.ip {
                            self.resolve(ip, &network.id, ctx.config.clients.dns_cache_ttl()).await;
                        }
                    }
                }

                samples.push(MetricSample::new(
                    MetricHandle::ClientUsageBytes,
                    vec![network.id.clone(), "upstream".to_string()],
                    upstream,
                ));
                samples.push(MetricSample::new(
                    MetricHandle::ClientUsageBytes,
                    vec![network.id.clone(), "downstream".to_string()],
                    downstream,
                ));

                if rssi_count > 0 {
                    samples.push(MetricSample::new(
                        MetricHandle::ClientRssiDbm,
                        vec![network.id.clone()],
                        rssi_sum / rssi_count as f64,
                    ));
                }

                for (status, count) in status_counts {
                    samples.push(MetricSample::new(
                        MetricHandle::ClientStatus,
                        vec![network.id.clone(), status],
                        count as f64,
                    ));
                }

                for (ssid, count) in ssid_counts {
                    samples.push(MetricSample::new(
                        MetricHandle::ClientSsidCount,
                        vec![network.id.clone(), ssid],
                        count as f64,
                    ));
                }

                for (vlan, count) in vlan_counts {
                    samples.push(MetricSample::new(
                        MetricHandle::ClientVlanCount,
                        vec![network.id.clone(), vlan],
                        count as f64,
                    ));
                }
            }
        }

        Ok(samples)
    }
}

impl ClientsCollector {
    /// Resolve `ip` to a hostname through the process-local cache, recording
    /// a hit or miss. The resolved hostname itself is kept only in the
    /// cache entry — it is never forwarded into a metric label. The PTR
    /// lookup itself is blocking libc I/O, so it runs on the blocking pool
    /// rather than the async collector task (spec.md 5: no blocking I/O
    /// inside a collector).
    async fn resolve(&self, ip: &str, network_id: &str, ttl: std::time::Duration) {
        use crate::metrics::catalog::{
            CLIENT_DNS_CACHE_EXPIRED_TOTAL, CLIENT_DNS_CACHE_HITS_TOTAL, CLIENT_DNS_CACHE_MISSES_TOTAL,
        };

        match self.dns_cache.get(ip) {
            Some(entry) if entry.resolved_monotonic.elapsed() < ttl => {
                CLIENT_DNS_CACHE_HITS_TOTAL.with_label_values(&[network_id]).inc();
                return;
            }
            Some(_) => {
                CLIENT_DNS_CACHE_EXPIRED_TOTAL.with_label_values(&[network_id]).inc();
            }
            None => {
                CLIENT_DNS_CACHE_MISSES_TOTAL.with_label_values(&[network_id]).inc();
            }
        }

        let owned_ip = ip.to_string();
        let hostname = tokio::task::spawn_blocking(move || {
            owned_ip.parse().ok().and_then(|addr| dns_lookup::lookup_addr(&addr).ok())
        })
        .await
        .unwrap_or(None);

        self.dns_cache.insert(
            ip.to_string(),
            DnsCacheEntry { ip: ip.to_string(), hostname, resolved_monotonic: Instant::now() },
        );
    }
}
