//! Upstream HTTP client for the Meraki Dashboard API.
//!
//! A single shared `reqwest::Client` services every outbound call. Rather
//! than pooling per-backend connections (the teacher's proxy talked to many
//! MCP backends and pooled via `bb8`), this exporter talks to exactly one
//! upstream host, so `reqwest`'s own internal connection pool is enough.
//! Concurrency is bounded process-wide by a [`tokio::sync::Semaphore`]
//! acquired around every outbound call, including retries of that call.

use std::sync::Arc;
use std::time::{Duration, Instant};

use rand::Rng;
use reqwest::{header::HeaderMap, Client, StatusCode};
use serde::de::DeserializeOwned;
use serde_json::Value;
use tokio::sync::Semaphore;
use tracing::warn;

use crate::config::{ApiConfig, MerakiConfig};
use crate::error::{Error, Result};
use crate::metrics::catalog::{
    API_RATE_LIMIT_REMAINING, API_RATE_LIMIT_TOTAL, API_REQUESTS_TOTAL,
    API_REQUEST_DURATION_SECONDS, API_RETRY_ATTEMPTS_TOTAL,
};
use crate::types::{Device, Network, Organization, OrgId};

mod endpoint;
pub mod pagination;

pub use endpoint::EndpointId;

/// Shared upstream client. Cheap to clone: everything inside is `Arc`'d or
/// `Copy`.
#[derive(Clone)]
pub struct UpstreamClient {
    inner: Arc<Inner>,
}

struct Inner {
    http: Client,
    base_url: String,
    api_key: String,
    semaphore: Semaphore,
    max_retries: u32,
    rate_limit_retry_wait: Duration,
    page_size: u32,
}

/// Availability of a single device, as reported by the org-wide
/// availabilities endpoint (spec.md 4.1 `list_org_device_availabilities`).
#[derive(Debug, Clone, serde::Deserialize)]
pub struct DeviceAvailability {
    pub serial: String,
    #[serde(default, rename = "productType")]
    pub product_type: Option<String>,
    pub status: String,
}

impl UpstreamClient {
    pub fn new(meraki: &MerakiConfig, api: &ApiConfig) -> Result<Self> {
        let http = Client::builder()
            .timeout(api.timeout())
            .user_agent(concat!("meraki-exporter/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(Error::Transport)?;

        Ok(Self {
            inner: Arc::new(Inner {
                http,
                base_url: meraki.api_base_url.trim_end_matches('/').to_string(),
                api_key: meraki.api_key.clone(),
                semaphore: Semaphore::new(api.concurrency_limit),
                max_retries: api.max_retries,
                rate_limit_retry_wait: api.rate_limit_retry_wait(),
                page_size: api.page_size,
            }),
        })
    }

    // --- Named operations (spec.md 4.1) ---

    pub async fn list_organizations(&self) -> Result<Vec<Organization>> {
        self.get_json_paginated("/organizations", EndpointId::Organizations).await
    }

    pub async fn list_org_networks(
        &self,
        org_id: &OrgId,
        product_type: Option<&str>,
    ) -> Result<Vec<Network>> {
        let mut path = format!("/organizations/{org_id}/networks");
        if let Some(pt) = product_type {
            path.push_str(&format!("?productType={pt}"));
        }
        self.get_json_paginated(&path, EndpointId::Networks).await
    }

    pub async fn list_org_devices(
        &self,
        org_id: &OrgId,
        product_types: Option<&[String]>,
        model_prefix: Option<&str>,
    ) -> Result<Vec<Device>> {
        let devices: Vec<Device> = self
            .get_json_paginated(&format!("/organizations/{org_id}/devices"), EndpointId::Devices)
            .await?;

        Ok(devices
            .into_iter()
            .filter(|d| {
                product_types.map_or(true, |types| {
                    d.product_type.as_deref().is_some_and(|pt| types.iter().any(|t| t == pt))
                })
            })
            .filter(|d| model_prefix.map_or(true, |prefix| d.model.starts_with(prefix)))
            .collect())
    }

    pub async fn list_org_device_availabilities(
        &self,
        org_id: &OrgId,
    ) -> Result<Vec<DeviceAvailability>> {
        self.get_json_paginated(
            &format!("/organizations/{org_id}/devices/availabilities"),
            EndpointId::DeviceStatuses,
        )
        .await
    }

    /// A parameterized time-windowed fetch, e.g. channel utilization,
    /// client overview, sensor readings, connection stats.
    pub async fn get_time_window<T: DeserializeOwned>(
        &self,
        path: &str,
        endpoint: EndpointId,
        timespan_seconds: u64,
    ) -> Result<T> {
        let sep = if path.contains('?') { "&" } else { "?" };
        let url = format!("{path}{sep}timespan={timespan_seconds}");
        self.get_json(&url, endpoint).await
    }

    /// Fetch one page, or every page, of a list endpoint.
    pub async fn get_paginated<T: DeserializeOwned>(
        &self,
        path: &str,
        endpoint: EndpointId,
        all_pages: bool,
    ) -> Result<Vec<T>> {
        if all_pages {
            self.get_json_paginated(path, endpoint).await
        } else {
            let url = format!("{}{}", self.inner.base_url, path);
            let (_, body, _) = self.execute_with_retry_headers(&url, endpoint, None).await?;
            normalize_list(&body)
        }
    }

    // --- Lower-level primitives, used directly by collectors ---

    /// `GET` a single page at `path` (no pagination). Used for endpoints
    /// that never paginate, such as license or org-level license state.
    pub async fn get_json<T: DeserializeOwned>(&self, path: &str, endpoint: EndpointId) -> Result<T> {
        let url = format!("{}{}", self.inner.base_url, path);
        let (_, body, _) = self.execute_with_retry_headers(&url, endpoint, None).await?;
        serde_json::from_str(&body).map_err(Error::Decode)
    }

    /// `GET` every page at `path`, following the `Link: rel="next"` header
    /// until exhausted, and return the full concatenation of `items`
    /// arrays. Atomic at the page boundary: if any page fails after
    /// `max_retries`, no partial result is returned.
    pub async fn get_json_paginated<T: DeserializeOwned>(
        &self,
        path: &str,
        endpoint: EndpointId,
    ) -> Result<Vec<T>> {
        let mut items = Vec::new();
        let sep = if path.contains('?') { "&" } else { "?" };
        let mut url = format!(
            "{}{}{}perPage={}",
            self.inner.base_url, path, sep, self.inner.page_size
        );
        let mut org_id_for_rate_limit = extract_org_id(path);

        loop {
            let (_, body, headers) = self
                .execute_with_retry_headers(&url, endpoint, org_id_for_rate_limit.as_deref())
                .await?;
            let page: Vec<T> = normalize_list(&body)?;
            items.extend(page);

            match pagination::next_link(&headers) {
                Some(next) => {
                    url = next;
                    org_id_for_rate_limit = None; // already recorded once per call
                }
                None => break,
            }
        }

        Ok(items)
    }

    async fn execute_with_retry_headers(
        &self,
        url: &str,
        endpoint: EndpointId,
        org_id_for_rate_limit: Option<&str>,
    ) -> Result<(u16, String, HeaderMap)> {
        let mut attempt = 0u32;
        let mut delay = self.inner.rate_limit_retry_wait;

        loop {
            let _permit = self
                .inner
                .semaphore
                .acquire()
                .await
                .expect("semaphore is never closed");

            let started = Instant::now();
            let result = self.send_once(url, endpoint).await;
            drop(_permit);

            let status_label = match &result {
                Ok((status, _, _)) => status.to_string(),
                Err(Error::RateLimited { .. }) => "429".to_string(),
                Err(Error::Upstream { status, .. }) => status.to_string(),
                Err(Error::NotAvailable(_)) => "404".to_string(),
                Err(Error::Timeout(_)) => "timeout".to_string(),
                Err(_) => "error".to_string(),
            };

            API_REQUESTS_TOTAL
                .with_label_values(&[endpoint.as_label(), "GET", &status_label])
                .inc();
            API_REQUEST_DURATION_SECONDS
                .with_label_values(&[endpoint.as_label(), "GET", &status_label])
                .observe(started.elapsed().as_secs_f64());

            if let Ok((_, _, headers)) = &result {
                if let Some(org_id) = org_id_for_rate_limit {
                    record_rate_limit_headers(org_id, headers);
                }
            }

            match result {
                Ok(ok) => return Ok(ok),
                Err(err) => {
                    if attempt >= self.inner.max_retries || !err.is_retryable() {
                        return Err(err);
                    }

                    let retry_reason = retry_reason_of(&err);
                    API_RETRY_ATTEMPTS_TOTAL
                        .with_label_values(&[endpoint.as_label(), retry_reason])
                        .inc();

                    let wait = match &err {
                        Error::RateLimited { retry_after: Some(d) } => *d,
                        _ => jittered(delay),
                    };

                    warn!(
                        endpoint = endpoint.as_label(),
                        attempt,
                        error = %err,
                        wait_ms = wait.as_millis() as u64,
                        "retrying upstream request"
                    );

                    tokio::time::sleep(wait).await;
                    delay *= 2;
                    attempt += 1;
                }
            }
        }
    }

    async fn send_once(
        &self,
        url: &str,
        endpoint: EndpointId,
    ) -> Result<(u16, String, HeaderMap)> {
        let response = self
            .inner
            .http
            .get(url)
            .header("X-Cisco-Meraki-API-Key", &self.inner.api_key)
            .send()
            .await?;

        let status = response.status();
        let headers = response.headers().clone();

        if status == StatusCode::TOO_MANY_REQUESTS {
            let retry_after = headers
                .get("Retry-After")
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.parse::<u64>().ok())
                .map(Duration::from_secs);
            return Err(Error::RateLimited { retry_after });
        }

        if status == StatusCode::NOT_FOUND && endpoint.optional() {
            let message = response.text().await.unwrap_or_default();
            return Err(Error::NotAvailable(message));
        }

        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(Error::Upstream { status: status.as_u16(), message });
        }

        let body = response.text().await?;
        Ok((status.as_u16(), body, headers))
    }
}

/// Normalize a response body into a list per spec.md 4.1: `{"items":[...]}`
/// unwraps, a bare array passes through, anything else is a validation
/// error.
fn normalize_list<T: DeserializeOwned>(body: &str) -> Result<Vec<T>> {
    let value: Value = serde_json::from_str(body).map_err(Error::Decode)?;

    let list = match value {
        Value::Array(_) => value,
        Value::Object(ref map) => match map.get("items") {
            Some(items @ Value::Array(_)) => items.clone(),
            _ => {
                return Err(Error::Validation(
                    "expected an {\"items\": [...]} wrapper or a bare array".to_string(),
                ))
            }
        },
        _ => {
            return Err(Error::Validation(
                "expected an object-with-list or array response shape".to_string(),
            ))
        }
    };

    serde_json::from_value(list).map_err(Error::Decode)
}

fn retry_reason_of(err: &Error) -> &'static str {
    match err.category() {
        crate::error::ErrorCategory::RateLimit => "rate_limit",
        crate::error::ErrorCategory::Timeout => "timeout",
        crate::error::ErrorCategory::ServerError => "server_error",
        _ => "unknown",
    }
}

fn record_rate_limit_headers(org_id: &str, headers: &HeaderMap) {
    if let Some(remaining) = header_as_f64(headers, "X-RateLimit-Remaining") {
        API_RATE_LIMIT_REMAINING.with_label_values(&[org_id]).set(remaining);
    }
    if let Some(total) = header_as_f64(headers, "X-RateLimit-Limit") {
        API_RATE_LIMIT_TOTAL.with_label_values(&[org_id]).set(total);
    }
}

fn header_as_f64(headers: &HeaderMap, name: &str) -> Option<f64> {
    headers.get(name)?.to_str().ok()?.parse().ok()
}

/// Best-effort org_id extraction from a request path, for labeling the
/// rate-limit gauges. Returns `None` for paths with no organization scope.
fn extract_org_id(path: &str) -> Option<String> {
    let rest = path.strip_prefix("/organizations/")?;
    let org_id = rest.split(['/', '?']).next()?;
    if org_id.is_empty() {
        None
    } else {
        Some(org_id.to_string())
    }
}

fn jittered(base: Duration) -> Duration {
    let jitter_ms = rand::thread_rng().gen_range(0..=(base.as_millis() as u64 / 4).max(1));
    base + Duration::from_millis(jitter_ms)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn jitter_never_shrinks_the_base_delay() {
        let base = Duration::from_millis(1000);
        for _ in 0..20 {
            assert!(jittered(base) >= base);
        }
    }

    #[test]
    fn normalize_list_unwraps_items_wrapper() {
        let body = r#"{"items":[{"id":"1"}],"meta":{"total":1}}"#;
        let out: Vec<serde_json::Value> = normalize_list(body).unwrap();
        assert_eq!(out.len(), 1);
    }

    #[test]
    fn normalize_list_accepts_bare_array() {
        let body = r#"[{"id":"1"},{"id":"2"}]"#;
        let out: Vec<serde_json::Value> = normalize_list(body).unwrap();
        assert_eq!(out.len(), 2);
    }

    #[test]
    fn normalize_list_rejects_unrecognized_shape() {
        let body = r#"{"id":"1"}"#;
        let out: Result<Vec<serde_json::Value>> = normalize_list(body);
        assert!(matches!(out, Err(Error::Validation(_))));
    }

    #[test]
    fn extract_org_id_reads_scoped_paths() {
        assert_eq!(extract_org_id("/organizations/123/networks").as_deref(), Some("123"));
        assert_eq!(extract_org_id("/organizations/123?perPage=10").as_deref(), Some("123"));
        assert_eq!(extract_org_id("/networks/N1/clients"), None);
    }
}
