//! Concrete inventory cache wiring [`SingleFlightCache`] to the upstream
//! client for organizations, networks and devices.

use std::sync::Arc;

use crate::client::UpstreamClient;
use crate::config::{MerakiConfig, MonitoringConfig, UpdateIntervalsConfig};
use crate::error::Result;
use crate::types::{Device, Network, NetworkId, Organization, OrgId};

use super::SingleFlightCache;

pub struct InventoryCache {
    client: UpstreamClient,
    ttl: std::time::Duration,
    org_allow_list: Vec<String>,
    organizations: SingleFlightCache<(), Vec<Organization>>,
    networks: SingleFlightCache<OrgId, Vec<Network>>,
    devices: SingleFlightCache<OrgId, Vec<Device>>,
}

impl InventoryCache {
    /// The cache TTL defaults to the MEDIUM tier interval (spec.md 4.2)
    /// unless `MONITORING__INVENTORY_TTL_SECONDS` overrides it.
    pub fn new(
        client: UpstreamClient,
        meraki: &MerakiConfig,
        monitoring: &MonitoringConfig,
        update_intervals: &UpdateIntervalsConfig,
    ) -> Self {
        Self {
            client,
            ttl: monitoring.inventory_ttl(update_intervals.medium_interval()),
            org_allow_list: meraki.org_id.clone(),
            organizations: SingleFlightCache::new(),
            networks: SingleFlightCache::new(),
            devices: SingleFlightCache::new(),
        }
    }

    /// Every organization the API key can see, filtered down to
    /// `MERAKI__ORG_ID` when that allow-list is non-empty (spec.md 6).
    pub async fn organizations(&self) -> Result<Arc<Vec<Organization>>> {
        let all = self
            .organizations
            .get_or_fetch((), self.ttl, || self.client.list_organizations())
            .await?;

        if self.org_allow_list.is_empty() {
            return Ok(all);
        }

        Ok(Arc::new(
            all.iter().filter(|org| self.org_allow_list.iter().any(|id| id == &org.id)).cloned().collect(),
        ))
    }

    pub async fn networks(&self, org_id: &OrgId) -> Result<Arc<Vec<Network>>> {
        self.networks
            .get_or_fetch(org_id.clone(), self.ttl, || {
                self.client.list_org_networks(org_id, None)
            })
            .await
    }

    pub async fn devices(&self, org_id: &OrgId) -> Result<Arc<Vec<Device>>> {
        self.devices
            .get_or_fetch(org_id.clone(), self.ttl, || {
                self.client.list_org_devices(org_id, None, None)
            })
            .await
    }

    /// Devices within a specific network, derived from the org-wide device
    /// list (which is itself single-flighted and TTL'd).
    pub async fn devices_in_network(&self, org_id: &OrgId, network_id: &NetworkId) -> Result<Vec<Device>> {
        let all = self.devices(org_id).await?;
        Ok(all.iter().filter(|d| &d.network_id == network_id).cloned().collect())
    }
}
