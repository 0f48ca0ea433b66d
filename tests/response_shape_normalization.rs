//! S5 — upstream responses are accepted whether they're wrapped in
//! `{"items": [...]}`, a bare array, or rejected as a validation error for
//! anything else.

mod common;

use meraki_exporter::client::EndpointId;
use meraki_exporter::error::ErrorCategory;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

#[tokio::test]
async fn items_wrapper_and_bare_array_both_decode() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/networks/N_1/clients"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "items": [{"ip": "10.0.0.1"}],
            "meta": {"total": 1},
        })))
        .mount(&mock_server)
        .await;

    let client = common::test_client(&mock_server.uri());
    let page: Vec<serde_json::Value> = client
        .get_paginated("/networks/N_1/clients", EndpointId::Clients, false)
        .await
        .unwrap();
    assert_eq!(page.len(), 1);
}

#[tokio::test]
async fn unrecognized_shape_is_a_validation_error() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/organizations/O1/loginSecurity"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({"ok": true})))
        .mount(&mock_server)
        .await;

    let client = common::test_client(&mock_server.uri());
    let result: Result<Vec<serde_json::Value>, _> = client
        .get_paginated("/organizations/O1/loginSecurity", EndpointId::LoginSecurity, false)
        .await;

    let err = result.unwrap_err();
    assert_eq!(err.category(), ErrorCategory::Validation);
}
