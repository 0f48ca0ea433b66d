//! TTL-based expiration of metric series.
//!
//! Prometheus vectors never forget a label combination on their own: once
//! a device disappears from inventory, its series would otherwise report
//! its last-known value forever. A side table tracks when each label
//! tuple was last written; a periodic reaper removes any tuple untouched
//! for longer than `tier_interval * ttl_multiplier`.

use std::time::Instant;

use dashmap::DashMap;
use tracing::debug;

use crate::metrics::catalog::{MetricHandle, Vec_, EXPORTER_SERIES_EXPIRED_TOTAL};
use crate::types::{MetricSample, Tier};

#[derive(Clone)]
struct SampleMeta {
    last_written: Instant,
    owning_tier: Tier,
}

/// Owns the side table and applies samples to both the side table and the
/// underlying Prometheus vectors.
pub struct MetricRegistry {
    meta: DashMap<(MetricHandle, Vec<String>), SampleMeta>,
    ttl_multiplier: f64,
}

impl MetricRegistry {
    pub fn new(ttl_multiplier: f64) -> Self {
        crate::metrics::catalog::register_all();
        Self { meta: DashMap::new(), ttl_multiplier }
    }

    /// Apply one sample from a collector, writing both the Prometheus
    /// series and the freshness side table.
    pub fn record(&self, sample: &MetricSample, tier: Tier) {
        match sample.handle.vec() {
            Vec_::Gauge(g) => {
                g.with_label_values(&label_refs(&sample.labels)).set(sample.value);
            }
            Vec_::Counter(c) => {
                // Counters are monotonic; collectors pass the delta to add,
                // never an absolute value.
                c.with_label_values(&label_refs(&sample.labels)).inc_by(sample.value);
            }
            Vec_::Histogram(h) => {
                h.with_label_values(&label_refs(&sample.labels)).observe(sample.value);
            }
        }

        self.meta.insert(
            (sample.handle, sample.labels.clone()),
            SampleMeta { last_written: Instant::now(), owning_tier: tier },
        );
    }

    /// Remove every series untouched for longer than its owning tier's
    /// interval times the configured TTL multiplier. Returns the number
    /// of series reaped.
    pub fn reap(&self, interval_for: impl Fn(Tier) -> std::time::Duration) -> usize {
        let mut expired = Vec::new();

        for entry in self.meta.iter() {
            let (handle, labels) = entry.key();
            let meta = entry.value();
            let ttl = interval_for(meta.owning_tier).mul_f64(self.ttl_multiplier);
            if meta.last_written.elapsed() > ttl {
                expired.push((*handle, labels.clone(), meta.owning_tier));
            }
        }

        for (handle, labels, owning_tier) in &expired {
            match handle.vec() {
                Vec_::Gauge(g) => {
                    let _ = g.remove_label_values(&label_refs(labels));
                }
                Vec_::Counter(c) => {
                    let _ = c.remove_label_values(&label_refs(labels));
                }
                Vec_::Histogram(h) => {
                    let _ = h.remove_label_values(&label_refs(labels));
                }
            }
            self.meta.remove(&(*handle, labels.clone()));
            EXPORTER_SERIES_EXPIRED_TOTAL.with_label_values(&[owning_tier.as_label()]).inc();
            debug!(?handle, ?labels, "expired stale metric series");
        }

        expired.len()
    }
}

fn label_refs(labels: &[String]) -> Vec<&str> {
    labels.iter().map(|s| s.as_str()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn reap_removes_stale_series_but_keeps_fresh_ones() {
        let registry = MetricRegistry::new(2.0);

        registry.record(
            &MetricSample::new(MetricHandle::DeviceUp, vec!["N_1".into(), "Q1".into(), "MS120".into()], 1.0),
            Tier::Fast,
        );

        // Force staleness by inserting a meta entry far in the past.
        registry.meta.alter(
            &(MetricHandle::DeviceUp, vec!["N_1".into(), "Q1".into(), "MS120".into()]),
            |_, mut v| {
                v.last_written = Instant::now() - Duration::from_secs(10_000);
                v
            },
        );

        registry.record(
            &MetricSample::new(MetricHandle::DeviceUp, vec!["N_2".into(), "Q2".into(), "MS120".into()], 1.0),
            Tier::Fast,
        );

        let reaped = registry.reap(|_| Duration::from_secs(60));
        assert_eq!(reaped, 1);
        assert_eq!(registry.meta.len(), 1);
    }
}
