//! S1 — concurrent collectors sharing one inventory fetch within a TTL
//! window see exactly one outbound `GET /organizations`.

mod common;

use std::sync::Arc;
use std::time::Duration;

use meraki_exporter::config::{MerakiConfig, MonitoringConfig, UpdateIntervalsConfig};
use meraki_exporter::inventory::InventoryCache;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

#[tokio::test]
async fn three_collectors_issue_one_outbound_call() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/organizations"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(serde_json::json!([{"id": "1", "name": "Acme"}])),
        )
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = common::test_client(&mock_server.uri());
    let meraki = MerakiConfig::default();
    let monitoring = MonitoringConfig::default();
    let update_intervals = UpdateIntervalsConfig { fast: 10, medium: 300, slow: 900 };
    let cache = Arc::new(InventoryCache::new(client, &meraki, &monitoring, &update_intervals));

    let mut handles = Vec::new();
    for _ in 0..3 {
        let cache = cache.clone();
        handles.push(tokio::spawn(async move { cache.organizations().await }));
    }

    for handle in handles {
        let orgs = handle.await.unwrap().unwrap();
        assert_eq!(orgs.len(), 1);
        assert_eq!(orgs[0].name, "Acme");
    }

    // `expect(1)` on the mock above fails the test at drop time if more
    // than one call landed; reaching here means the single-flight held.
}
