//! Shared test fixtures for the integration suite.

use meraki_exporter::client::UpstreamClient;
use meraki_exporter::config::{ApiConfig, MerakiConfig};

/// An `UpstreamClient` pointed at a `wiremock::MockServer`, with retries
/// tight enough that retry-path tests don't sleep for real backoff
/// windows.
pub fn test_client(mock_server_uri: &str) -> UpstreamClient {
    let meraki = MerakiConfig {
        api_key: "test-key".to_string(),
        org_id: Vec::new(),
        api_base_url: mock_server_uri.to_string(),
    };
    let api = ApiConfig {
        timeout: 5,
        max_retries: 3,
        concurrency_limit: 8,
        batch_size: 10,
        batch_delay: 0,
        rate_limit_retry_wait: 0,
        page_size: 1000,
    };
    UpstreamClient::new(&meraki, &api).expect("client builds with a valid base url")
}
