//! Collector Manager: the tiered scheduler.
//!
//! Three independent scheduler loops, one per [`Tier`], each its own
//! `tokio::time::interval` with `MissedTickBehavior::Skip` — the same
//! idiom `health::checker::HealthChecker::start` uses for a single
//! backend, generalized here to three cadences so a slow SLOW-tier run
//! never delays a FAST tick. A tier run never overlaps its own previous
//! run: if a tick arrives while the prior run is still in flight, the
//! tick is dropped and counted as an overrun rather than queued.

use std::sync::Arc;
use std::time::{Duration, Instant};

use dashmap::DashMap;
use futures::future::join_all;
use tokio::sync::broadcast;
use tokio::time::{interval, MissedTickBehavior};
use tracing::{info, warn};

use crate::client::UpstreamClient;
use crate::collectors::{build_enabled, Collector, CollectorContext};
use crate::config::Config;
use crate::inventory::InventoryCache;
use crate::metrics::catalog::{
    COLLECTOR_FAILURE_STREAK, COLLECTOR_LAST_SUCCESS_AGE_SECONDS, EXPORTER_COLLECTOR_DURATION_SECONDS,
    EXPORTER_COLLECTOR_ERRORS_TOTAL, EXPORTER_COLLECTOR_LAST_SUCCESS_TIMESTAMP,
    EXPORTER_COLLECTOR_RUNS_TOTAL,
};
use crate::metrics::MetricRegistry;
use crate::types::{CollectorHealth, RequestOutcome, Tier};

const TIERS: [Tier; 3] = [Tier::Fast, Tier::Medium, Tier::Slow];

/// Owns the three cadences, launches a tier run at each tick, enforces
/// per-collector timeout, and records per-collector health.
pub struct CollectorManager {
    config: Arc<Config>,
    registry: Arc<MetricRegistry>,
    ctx: CollectorContext,
    tiers: [Vec<Box<dyn Collector>>; 3],
    health: Arc<DashMap<String, CollectorHealth>>,
}

impl CollectorManager {
    pub fn new(
        config: Arc<Config>,
        client: UpstreamClient,
        inventory: Arc<InventoryCache>,
        registry: Arc<MetricRegistry>,
    ) -> Arc<Self> {
        let health = Arc::new(DashMap::new());
        let mut fast = Vec::new();
        let mut medium = Vec::new();
        let mut slow = Vec::new();

        for collector in build_enabled(&config) {
            health.insert(
                collector.name().to_string(),
                CollectorHealth::new(collector.name(), collector.tier()),
            );
            match collector.tier() {
                Tier::Fast => fast.push(collector),
                Tier::Medium => medium.push(collector),
                Tier::Slow => slow.push(collector),
            }
        }

        info!(
            fast = fast.len(),
            medium = medium.len(),
            slow = slow.len(),
            "collector manager assembled"
        );

        let ctx = CollectorContext { client, inventory, config: config.clone() };

        Arc::new(Self { config, registry, ctx, tiers: [fast, medium, slow], health })
    }

    /// Snapshot of every collector's current health, for the `/health`
    /// endpoint.
    pub fn health_snapshot(&self) -> Vec<CollectorHealth> {
        self.health.iter().map(|entry| entry.value().clone()).collect()
    }

    /// Run every tier's scheduler loop until `shutdown` fires. Each tier
    /// runs as its own task so a slow tier can never delay a faster one.
    pub async fn run(self: Arc<Self>, shutdown: broadcast::Sender<()>) {
        let mut handles = Vec::with_capacity(TIERS.len());

        for (index, tier) in TIERS.into_iter().enumerate() {
            let manager = self.clone();
            let shutdown_rx = shutdown.subscribe();
            handles.push(tokio::spawn(async move {
                manager.run_tier(index, tier, shutdown_rx).await;
            }));
        }

        for handle in handles {
            let _ = handle.await;
        }
    }

    /// Drive one tier's cadence. Each run is itself spawned as a detached
    /// task rather than awaited inline: awaiting it inline would make
    /// every tick wait for the previous run to finish, which serializes
    /// ticks instead of ever actually overlapping them and so could never
    /// observe (or count) an overrun. Spawning lets a tick legitimately
    /// arrive while the previous run's task is still in flight, so the
    /// overlap this guards against (spec.md invariant 1 / S6 in §8) is one
    /// that can really happen, not one ruled out by construction.
    async fn run_tier(
        self: Arc<Self>,
        index: usize,
        tier: Tier,
        mut shutdown: broadcast::Receiver<()>,
    ) {
        if self.tiers[index].is_empty() {
            return;
        }

        let period = self.config.update_intervals.interval_for(tier);
        let mut ticker = interval(period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        let mut in_flight: Option<tokio::task::JoinHandle<()>> = None;

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    let overlapping = in_flight.as_ref().is_some_and(|h| !h.is_finished());
                    if overlapping {
                        warn!(tier = tier.as_label(), "tick dropped, previous run still in flight");
                        EXPORTER_COLLECTOR_ERRORS_TOTAL
                            .with_label_values(&["_manager_", tier.as_label(), "overrun"])
                            .inc();
                        continue;
                    }

                    let manager = self.clone();
                    in_flight = Some(tokio::spawn(async move {
                        manager.run_once(tier).await;
                    }));
                }
                _ = shutdown.recv() => {
                    info!(tier = tier.as_label(), "tier scheduler shutting down");
                    if let Some(handle) = in_flight.take() {
                        let _ = handle.await;
                    }
                    return;
                }
            }
        }
    }

    /// Launch every enabled collector of `tier` concurrently, each bounded
    /// by `collectors.collector_timeout`, and record the outcome of each.
    async fn run_once(&self, tier: Tier) {
        let collectors = match tier {
            Tier::Fast => &self.tiers[0],
            Tier::Medium => &self.tiers[1],
            Tier::Slow => &self.tiers[2],
        };
        let timeout = self.config.collectors.collector_timeout();

        let runs = collectors.iter().map(|collector| {
            let name = collector.name();
            async move {
                let started = Instant::now();
                EXPORTER_COLLECTOR_RUNS_TOTAL.with_label_values(&[name, tier.as_label()]).inc();

                let outcome = match tokio::time::timeout(timeout, collector.collect(&self.ctx)).await
                {
                    Ok(Ok(samples)) => {
                        for sample in &samples {
                            self.registry.record(sample, tier);
                        }
                        Ok(samples.len())
                    }
                    Ok(Err(err)) => Err(err.category().as_label().to_string()),
                    Err(_) => Err("timeout".to_string()),
                };

                let duration = started.elapsed();
                EXPORTER_COLLECTOR_DURATION_SECONDS
                    .with_label_values(&[name, tier.as_label()])
                    .observe(duration.as_secs_f64());

                let result = match &outcome {
                    Ok(count) => {
                        EXPORTER_COLLECTOR_LAST_SUCCESS_TIMESTAMP
                            .with_label_values(&[name, tier.as_label()])
                            .set(unix_timestamp());
                        tracing::debug!(collector = name, samples = *count, ?duration, "collector run ok");
                        Ok(())
                    }
                    Err(category) => {
                        EXPORTER_COLLECTOR_ERRORS_TOTAL
                            .with_label_values(&[name, tier.as_label(), category.as_str()])
                            .inc();
                        warn!(collector = name, %category, ?duration, "collector run failed");
                        Err(category.clone())
                    }
                };

                (name, RequestOutcome { at: Instant::now(), duration, result })
            }
        });

        for (name, outcome) in join_all(runs).await {
            if let Some(mut health) = self.health.get_mut(name) {
                health.record_outcome(&outcome);

                let tier_label = tier.as_label();
                COLLECTOR_FAILURE_STREAK
                    .with_label_values(&[name, tier_label])
                    .set(health.consecutive_failures as f64);

                let age = health
                    .last_success
                    .map(|at| at.elapsed().as_secs_f64())
                    .unwrap_or(f64::INFINITY);
                COLLECTOR_LAST_SUCCESS_AGE_SECONDS.with_label_values(&[name, tier_label]).set(age);
            }
        }
    }
}

fn unix_timestamp() -> f64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs_f64()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collectors::CollectorContext;
    use crate::config::{ApiConfig, Config, MerakiConfig, MonitoringConfig, UpdateIntervalsConfig};
    use crate::error::Result;
    use crate::types::MetricSample;
    use async_trait::async_trait;

    /// A fake FAST-tier collector that always takes longer than its tier
    /// interval, to exercise the overrun-suppression path (S6 in §8)
    /// without depending on a real upstream response.
    struct SlowCollector;

    #[async_trait]
    impl Collector for SlowCollector {
        fn name(&self) -> &'static str {
            "_test_slow_"
        }
        fn tier(&self) -> Tier {
            Tier::Fast
        }
        async fn collect(&self, _ctx: &CollectorContext) -> Result<Vec<MetricSample>> {
            tokio::time::sleep(Duration::from_millis(1300)).await;
            Ok(Vec::new())
        }
    }

    #[tokio::test(start_paused = false)]
    async fn overlapping_tick_is_dropped_and_counted_as_overrun() {
        let mut config = Config::default();
        config.update_intervals = UpdateIntervalsConfig { fast: 1, medium: 300, slow: 900 };
        let config = Arc::new(config);

        let meraki = MerakiConfig::default();
        let api = ApiConfig::default();
        let client = crate::client::UpstreamClient::new(&meraki, &api).unwrap();
        let inventory = Arc::new(crate::inventory::InventoryCache::new(
            client.clone(),
            &meraki,
            &MonitoringConfig::default(),
            &config.update_intervals,
        ));
        let registry = Arc::new(crate::metrics::MetricRegistry::new(config.monitoring.metric_ttl_multiplier));

        let health = Arc::new(DashMap::new());
        health.insert("_test_slow_".to_string(), CollectorHealth::new("_test_slow_", Tier::Fast));

        let manager = Arc::new(CollectorManager {
            config: config.clone(),
            registry,
            ctx: CollectorContext { client, inventory, config: config.clone() },
            tiers: [vec![Box::new(SlowCollector)], Vec::new(), Vec::new()],
            health,
        });

        let before = EXPORTER_COLLECTOR_ERRORS_TOTAL
            .with_label_values(&["_manager_", "fast", "overrun"])
            .get();

        let (shutdown_tx, _keep_alive) = broadcast::channel(1);
        let shutdown_rx = shutdown_tx.subscribe();
        let mgr = manager.clone();
        let task = tokio::spawn(async move { mgr.run_tier(0, Tier::Fast, shutdown_rx).await });

        tokio::time::sleep(Duration::from_millis(2600)).await;
        let _ = shutdown_tx.send(());
        let _ = task.await;

        let after = EXPORTER_COLLECTOR_ERRORS_TOTAL
            .with_label_values(&["_manager_", "fast", "overrun"])
            .get();
        assert!(after > before, "expected at least one overrun to be recorded");
    }
}
