//! S4 — a failing sub-fetch for one organization's device-status overview
//! must not erase the samples already gathered for that organization's
//! networks/devices counts, and the coordinator must still report success.

mod common;

use std::sync::Arc;

use meraki_exporter::collectors::organization::OrganizationCollector;
use meraki_exporter::collectors::{Collector, CollectorContext};
use meraki_exporter::config::{Config, MerakiConfig, MonitoringConfig, UpdateIntervalsConfig};
use meraki_exporter::inventory::InventoryCache;
use meraki_exporter::metrics::MetricHandle;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

#[tokio::test]
async fn failing_device_overview_does_not_erase_network_and_device_counts() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/organizations"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(serde_json::json!([{"id": "O1", "name": "Acme"}])),
        )
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/organizations/O1/networks"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(serde_json::json!([{"id": "N_1", "organizationId": "O1", "name": "HQ"}])),
        )
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/organizations/O1/devices"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([])))
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/organizations/O1/devices/statuses/overview"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&mock_server)
        .await;

    let client = common::test_client(&mock_server.uri());
    let meraki = MerakiConfig::default();
    let monitoring = MonitoringConfig::default();
    let update_intervals = UpdateIntervalsConfig { fast: 10, medium: 300, slow: 900 };
    let inventory =
        Arc::new(InventoryCache::new(client.clone(), &meraki, &monitoring, &update_intervals));

    let ctx = CollectorContext { client, inventory, config: Arc::new(Config::default()) };

    let collector = OrganizationCollector;
    let samples = collector.collect(&ctx).await.expect("coordinator completes despite sub-fetch failure");

    let networks_sample = samples
        .iter()
        .find(|s| s.handle == MetricHandle::OrgNetworksTotal && s.labels == vec!["O1".to_string()]);
    assert!(networks_sample.is_some(), "org_networks_total must still be written");
    assert_eq!(networks_sample.unwrap().value, 1.0);

    let devices_sample = samples
        .iter()
        .find(|s| s.handle == MetricHandle::OrgDevicesTotal && s.labels == vec!["O1".to_string()]);
    assert!(devices_sample.is_some(), "org_devices_total must still be written");

    let availability_sample =
        samples.iter().find(|s| s.handle == MetricHandle::OrgDevicesAvailabilityTotal);
    assert!(availability_sample.is_none(), "no availability sample from the failed endpoint");
}
