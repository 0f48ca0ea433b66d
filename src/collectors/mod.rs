//! Collector Base and the full Collector Catalog.
//!
//! Every collector implements [`Collector`] and self-registers via the
//! `inventory` crate (`CollectorFactory`), so the manager builds its
//! schedule by iterating `inventory::iter::<CollectorFactory>()` instead
//! of consulting a hand-maintained list — grounded on `unikmhz-uxum`'s use
//! of the same crate for handler auto-discovery.

use std::sync::Arc;
use std::time::Instant;

use async_trait::async_trait;
use futures::stream::{self, StreamExt};

use crate::client::UpstreamClient;
use crate::config::Config;
use crate::error::{Error, Result};
use crate::inventory::InventoryCache;
use crate::metrics::catalog::{
    COLLECTOR_API_CALLS_TOTAL, EXPORTER_COLLECTOR_ERRORS_TOTAL, ORG_COLLECTION_WAIT_TIME_SECONDS,
};
use crate::types::{MetricSample, Tier};

pub mod alerts;
pub mod clients;
pub mod config_collector;
pub mod device;
pub mod network_health;
pub mod organization;
pub mod sensor;

/// Shared, read-only context every collector runs with.
pub struct CollectorContext {
    pub client: UpstreamClient,
    pub inventory: Arc<InventoryCache>,
    pub config: Arc<Config>,
}

/// A unit of work the manager schedules on a fixed tier interval.
///
/// Coordinators (e.g. `DeviceCollector`) fan out inventory into
/// per-device-family leaves and flatten their samples; leaves
/// (e.g. `MSCollector`) call the upstream client directly. Both shapes
/// implement the same trait, so the manager treats them identically.
#[async_trait]
pub trait Collector: Send + Sync {
    /// Stable identifier used for metric labels, logs and config
    /// enable/disable lookups (`collectors.disabled`).
    fn name(&self) -> &'static str;

    fn tier(&self) -> Tier;

    async fn collect(&self, ctx: &CollectorContext) -> Result<Vec<MetricSample>>;
}

/// Record a sub-fetch failure without aborting the wider collector run
/// (spec's "partial-failure isolation": one org's failed endpoint must
/// not erase samples already gathered for other orgs or other endpoints
/// in the same tick). Callers `continue` their loop after calling this
/// rather than propagating `err` up through `collect()`.
pub fn isolate_error(name: &'static str, tier: Tier, err: &Error) {
    tracing::warn!(collector = name, tier = tier.as_label(), error = %err, "sub-fetch failed, continuing");
    EXPORTER_COLLECTOR_ERRORS_TOTAL
        .with_label_values(&[name, tier.as_label(), err.category().as_label()])
        .inc();
}

/// The Collector Base's `_track_api_call` (spec.md 4.4): both logs and
/// increments `collector_api_calls_total{collector,tier,endpoint}`.
/// Callers pass the `EndpointId`'s label right before or after issuing
/// the request the label describes.
pub fn track_api_call(name: &'static str, tier: Tier, endpoint: &'static str) {
    tracing::debug!(collector = name, tier = tier.as_label(), endpoint, "api call");
    COLLECTOR_API_CALLS_TOTAL.with_label_values(&[name, tier.as_label(), endpoint]).inc();
}

/// The fan-out pattern common to every coordinator (spec.md 4.5.4): chop
/// `items` into `batch_size` chunks, run at most `concurrency_limit` of
/// `unit` concurrently within a chunk, sleep `batch_delay` between chunks,
/// and record how long each chunk spent queued behind the concurrency cap
/// via `org_collection_wait_time_seconds`. `unit` is expected to perform
/// its own error isolation (classify + [`isolate_error`] + recover to an
/// empty `Vec`) — this helper only owns the batching shape, not recovery.
pub async fn fan_out_batched<T, F, Fut>(
    collector: &'static str,
    tier: Tier,
    config: &Config,
    items: Vec<T>,
    unit: F,
) -> Vec<MetricSample>
where
    T: Send + 'static,
    F: Fn(T) -> Fut + Send + Sync,
    Fut: std::future::Future<Output = Vec<MetricSample>> + Send,
{
    let batch_size = config.api.batch_size.max(1);
    let concurrency_limit = config.api.concurrency_limit.max(1);
    let batch_delay = config.api.batch_delay();

    let mut samples = Vec::new();
    let chunks: Vec<Vec<T>> = items
        .into_iter()
        .fold(Vec::new(), |mut chunks: Vec<Vec<T>>, item| {
            match chunks.last_mut() {
                Some(chunk) if chunk.len() < batch_size => chunk.push(item),
                _ => chunks.push(vec![item]),
            }
            chunks
        });

    let chunk_count = chunks.len();
    for (index, chunk) in chunks.into_iter().enumerate() {
        let queued_at = Instant::now();
        let results: Vec<Vec<MetricSample>> = stream::iter(chunk)
            .map(|item| unit(item))
            .buffer_unordered(concurrency_limit)
            .collect()
            .await;

        ORG_COLLECTION_WAIT_TIME_SECONDS
            .with_label_values(&[collector, tier.as_label()])
            .observe(queued_at.elapsed().as_secs_f64());

        samples.extend(results.into_iter().flatten());

        if index + 1 < chunk_count && !batch_delay.is_zero() {
            tokio::time::sleep(batch_delay).await;
        }
    }

    samples
}

/// Registration entry collected at link time by the `inventory` crate.
pub struct CollectorFactory(pub fn() -> Box<dyn Collector>);

inventory::collect!(CollectorFactory);

/// Build every registered, non-disabled collector.
pub fn build_enabled(config: &Config) -> Vec<Box<dyn Collector>> {
    inventory::iter::<CollectorFactory>()
        .map(|factory| (factory.0)())
        .filter(|collector| config.collectors.is_enabled(collector.name()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn catalog_registers_every_collector_exactly_once() {
        let names: Vec<&'static str> =
            inventory::iter::<CollectorFactory>().map(|f| (f.0)().name()).collect();
        let mut sorted = names.clone();
        sorted.sort_unstable();
        sorted.dedup();
        assert_eq!(names.len(), sorted.len(), "duplicate collector name registered");
        assert!(!names.is_empty(), "no collectors registered");
    }
}
