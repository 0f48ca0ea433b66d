//! External Interfaces: the `/metrics` and `/health` HTTP surface.
//!
//! Grounded on `proxy::server::ProxyServer` — a thin Axum wrapper around
//! a shared `AppState`, bound once and run with graceful shutdown — but
//! trimmed to what a metrics exporter actually exposes: no CORS, no
//! compression, no admin namespace. A scrape is a plain unauthenticated
//! `GET`, same as every other Prometheus exporter.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Json, Router};
use serde::Serialize;
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::config::Config;
use crate::error::{Error, Result};
use crate::manager::CollectorManager;
use crate::metrics::metrics_handler;
use crate::types::CollectorHealth;

#[derive(Clone)]
struct AppState {
    config: Arc<Config>,
    manager: Arc<CollectorManager>,
}

pub struct ExporterServer {
    config: Arc<Config>,
    manager: Arc<CollectorManager>,
}

impl ExporterServer {
    pub fn new(config: Arc<Config>, manager: Arc<CollectorManager>) -> Self {
        Self { config, manager }
    }

    fn build_router(&self) -> Router {
        let state = AppState { config: self.config.clone(), manager: self.manager.clone() };
        let prefix = self.config.server.path_prefix.trim_end_matches('/');

        let mut router = Router::new().route(&format!("{prefix}/metrics"), get(metrics_handler));

        if self.config.server.enable_health_check {
            router = router.route(&format!("{prefix}/health"), get(health_handler));
        }

        router.layer(TraceLayer::new_for_http()).with_state(state)
    }

    /// Bind and serve until `shutdown` fires, completing in-flight scrapes
    /// before returning.
    pub async fn run(&self, mut shutdown: tokio::sync::broadcast::Receiver<()>) -> Result<()> {
        let router = self.build_router();

        let addr = format!("{}:{}", self.config.server.host, self.config.server.port)
            .parse::<SocketAddr>()
            .map_err(|e| Error::Config(format!("invalid server address: {e}")))?;

        let listener = tokio::net::TcpListener::bind(addr)
            .await
            .map_err(|e| Error::Config(format!("failed to bind {addr}: {e}")))?;

        info!(%addr, "metrics server listening");

        axum::serve(listener, router)
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
                info!("metrics server shutting down");
            })
            .await
            .map_err(|e| Error::Server(format!("server error: {e}")))?;

        Ok(())
    }
}

#[derive(Serialize)]
struct HealthBody {
    status: &'static str,
    stale_collectors: Vec<String>,
}

/// Per spec.md 6/7: `/health` flips to 503 only when **no** collector has
/// succeeded within `monitoring.unhealthy_after(medium_interval)` (default:
/// 3x the MEDIUM cadence) — a handful of stale collectors alongside healthy
/// ones is a degraded-but-live exporter, not a dead one. `stale_collectors`
/// still lists every individually-stale collector for diagnosis. Kept as a
/// pure function, separate from the Axum handler, so the decision logic is
/// unit-testable without standing up a router or a real collector manager.
fn evaluate_health(
    snapshot: &[CollectorHealth],
    threshold: std::time::Duration,
) -> (StatusCode, HealthBody) {
    let stale: Vec<String> = snapshot
        .iter()
        .filter_map(|health| match health.last_success {
            Some(at) if at.elapsed() <= threshold => None,
            Some(_) => Some(health.name.clone()),
            None => None,
        })
        .collect();

    let any_recent_success = snapshot
        .iter()
        .any(|health| health.last_success.is_some_and(|at| at.elapsed() <= threshold));

    let status_code =
        if any_recent_success { StatusCode::OK } else { StatusCode::SERVICE_UNAVAILABLE };
    let status = if any_recent_success { "ok" } else { "degraded" };

    (status_code, HealthBody { status, stale_collectors: stale })
}

async fn health_handler(State(state): State<AppState>) -> impl IntoResponse {
    let threshold = state
        .config
        .monitoring
        .unhealthy_after(state.config.update_intervals.medium_interval());

    let (status_code, body) = evaluate_health(&state.manager.health_snapshot(), threshold);
    (status_code, Json(body))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Tier;
    use std::time::{Duration, Instant};

    fn healthy(name: &str, age: Duration) -> CollectorHealth {
        let mut health = CollectorHealth::new(name, Tier::Medium);
        health.last_success = Some(Instant::now() - age);
        health
    }

    fn never_run(name: &str) -> CollectorHealth {
        CollectorHealth::new(name, Tier::Medium)
    }

    #[test]
    fn one_fresh_collector_among_stale_ones_is_still_ok() {
        let threshold = Duration::from_secs(60);
        let snapshot =
            vec![healthy("organization", Duration::from_secs(1000)), healthy("device", Duration::from_secs(1))];

        let (status, body) = evaluate_health(&snapshot, threshold);

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body.status, "ok");
        assert_eq!(body.stale_collectors, vec!["organization".to_string()]);
    }

    #[test]
    fn no_collector_has_ever_succeeded_is_degraded() {
        let threshold = Duration::from_secs(60);
        let snapshot = vec![never_run("organization"), never_run("device")];

        let (status, body) = evaluate_health(&snapshot, threshold);

        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(body.status, "degraded");
    }

    #[test]
    fn every_collector_stale_past_threshold_is_degraded() {
        let threshold = Duration::from_secs(60);
        let snapshot = vec![
            healthy("organization", Duration::from_secs(1000)),
            healthy("device", Duration::from_secs(2000)),
        ];

        let (status, _body) = evaluate_health(&snapshot, threshold);

        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    }
}
