//! Meraki Exporter
//!
//! A Prometheus exporter for the Cisco Meraki Dashboard API. Runs in the
//! foreground under a process supervisor; configuration is entirely
//! environment-sourced (`MERAKI__*`, `API__*`, `UPDATE_INTERVALS__*`, ...),
//! there is no config file and no subcommand surface.

use std::sync::Arc;

use meraki_exporter::client::UpstreamClient;
use meraki_exporter::config::Config;
use meraki_exporter::daemon::signals::setup_signal_handlers;
use meraki_exporter::inventory::InventoryCache;
use meraki_exporter::manager::CollectorManager;
use meraki_exporter::metrics::MetricRegistry;
use meraki_exporter::server::ExporterServer;
use meraki_exporter::Result;
use tracing::info;

#[tokio::main]
async fn main() -> Result<()> {
    let config = Config::from_env()?;
    init_tracing(&config.logging.level);

    info!(version = env!("CARGO_PKG_VERSION"), "meraki-exporter starting");

    let config = Arc::new(config);
    let client = UpstreamClient::new(&config.meraki, &config.api)?;
    let inventory = Arc::new(InventoryCache::new(
        client.clone(),
        &config.meraki,
        &config.monitoring,
        &config.update_intervals,
    ));
    let registry = Arc::new(MetricRegistry::new(config.monitoring.metric_ttl_multiplier));

    let manager = CollectorManager::new(config.clone(), client, inventory, registry.clone());
    let server = ExporterServer::new(config.clone(), manager.clone());

    let (shutdown_tx, shutdown_rx) = setup_signal_handlers();

    let manager_task = tokio::spawn(manager.run(shutdown_tx.clone()));
    let reaper_task = tokio::spawn(run_expiration_reaper(
        registry,
        config.clone(),
        shutdown_tx.subscribe(),
    ));

    server.run(shutdown_rx).await?;

    let _ = manager_task.await;
    let _ = reaper_task.await;
    info!("meraki-exporter stopped");
    Ok(())
}

/// Periodically reaps metric series whose last write is older than
/// `ttl_multiplier * owning_tier.interval` (spec.md 4.3). Runs at the FAST
/// tier cadence — the finest cadence in the system — so no series outlives
/// its TTL by more than one FAST interval regardless of which tier wrote it.
async fn run_expiration_reaper(
    registry: Arc<MetricRegistry>,
    config: Arc<Config>,
    mut shutdown: tokio::sync::broadcast::Receiver<()>,
) {
    let mut ticker = tokio::time::interval(config.update_intervals.fast_interval());
    ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

    loop {
        tokio::select! {
            _ = ticker.tick() => {}
            _ = shutdown.recv() => {
                info!("expiration reaper shutting down");
                return;
            }
        }

        let intervals = config.update_intervals.clone();
        let reaped = registry.reap(move |tier| intervals.interval_for(tier));
        if reaped > 0 {
            info!(reaped, "expired stale metric series");
        }
    }
}

fn init_tracing(log_level: &str) {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level));

    tracing_subscriber::registry().with(filter).with(fmt::layer().json()).init();
}
