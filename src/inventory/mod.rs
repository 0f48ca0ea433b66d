//! Single-flight, TTL'd inventory cache.
//!
//! Organizations, networks and devices change rarely compared to the
//! cadence collectors poll at, so every collector that needs "the list of
//! networks in org X" shares one fetch per TTL window instead of each
//! issuing its own upstream call. Concurrent callers arriving while a
//! fetch is already in flight await that fetch's result rather than
//! starting a second one.

use std::collections::HashMap;
use std::hash::Hash;
use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::sync::{watch, Mutex};

use crate::error::{Error, Result};
use crate::types::InventoryEntry;

mod cache;
pub use cache::InventoryCache;

type PendingValue<T> = Option<Arc<std::result::Result<T, String>>>;

enum Slot<T> {
    Fresh(InventoryEntry<T>),
    Pending(watch::Receiver<PendingValue<T>>),
}

/// A single-flight cache keyed by `K`, producing `Arc<T>` values.
pub struct SingleFlightCache<K, T> {
    slots: Mutex<HashMap<K, Slot<T>>>,
}

impl<K, T> Default for SingleFlightCache<K, T>
where
    K: Eq + Hash + Clone,
{
    fn default() -> Self {
        Self { slots: Mutex::new(HashMap::new()) }
    }
}

impl<K, T> SingleFlightCache<K, T>
where
    K: Eq + Hash + Clone,
    T: Clone,
{
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the cached value for `key` if fresh, otherwise call `fetch`
    /// exactly once across all concurrently-waiting callers and cache the
    /// result. Errors are never cached: a failed fetch leaves the slot
    /// empty so the next caller retries.
    pub async fn get_or_fetch<F, Fut>(&self, key: K, ttl: Duration, mut fetch: F) -> Result<Arc<T>>
    where
        F: FnMut() -> Fut,
        Fut: std::future::Future<Output = Result<T>>,
    {
        loop {
            let mut rx = {
                let mut slots = self.slots.lock().await;
                match slots.get(&key) {
                    Some(Slot::Fresh(entry)) if entry.is_fresh(ttl) => {
                        return Ok(entry.value.clone());
                    }
                    Some(Slot::Pending(rx)) => rx.clone(),
                    _ => {
                        let (tx, rx) = watch::channel(None);
                        slots.insert(key.clone(), Slot::Pending(rx));
                        drop(slots);
                        return self.fetch_and_install(key, tx, fetch).await;
                    }
                }
            };

            loop {
                if let Some(result) = rx.borrow().clone() {
                    return (*result).clone().map(Arc::new).map_err(Error::Unknown);
                }
                if rx.changed().await.is_err() {
                    // Sender dropped without ever publishing a value: whoever
                    // owned the fetch panicked or was cancelled. Loop back
                    // around and become the new owner.
                    break;
                }
            }
        }
    }

    async fn fetch_and_install<F, Fut>(
        &self,
        key: K,
        tx: watch::Sender<PendingValue<T>>,
        mut fetch: F,
    ) -> Result<Arc<T>>
    where
        F: FnMut() -> Fut,
        Fut: std::future::Future<Output = Result<T>>,
    {
        let result = fetch().await;

        {
            let mut slots = self.slots.lock().await;
            match &result {
                Ok(value) => {
                    slots.insert(
                        key,
                        Slot::Fresh(InventoryEntry {
                            value: Arc::new(value.clone()),
                            fetched_at: Instant::now(),
                        }),
                    );
                }
                Err(_) => {
                    slots.remove(&key);
                }
            }
        }

        let published = result.as_ref().map(|v| v.clone()).map_err(|e| e.to_string());
        let _ = tx.send(Some(Arc::new(published)));

        result.map(Arc::new)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    #[tokio::test]
    async fn concurrent_callers_share_one_fetch() {
        let cache: Arc<SingleFlightCache<&'static str, u32>> = Arc::new(SingleFlightCache::new());
        let calls = Arc::new(AtomicU32::new(0));

        let mut handles = Vec::new();
        for _ in 0..8 {
            let cache = cache.clone();
            let calls = calls.clone();
            handles.push(tokio::spawn(async move {
                cache
                    .get_or_fetch("org-1", Duration::from_secs(60), || async move {
                        calls.fetch_add(1, Ordering::SeqCst);
                        tokio::time::sleep(Duration::from_millis(20)).await;
                        Ok(42u32)
                    })
                    .await
            }));
        }

        for h in handles {
            assert_eq!(*h.await.unwrap().unwrap(), 42);
        }

        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn fetch_errors_are_not_cached() {
        let cache: SingleFlightCache<&'static str, u32> = SingleFlightCache::new();
        let calls = AtomicU32::new(0);

        let first = cache
            .get_or_fetch("org-1", Duration::from_secs(60), || async {
                calls.fetch_add(1, Ordering::SeqCst);
                Err(Error::Unknown("boom".into()))
            })
            .await;
        assert!(first.is_err());

        let second = cache
            .get_or_fetch("org-1", Duration::from_secs(60), || async {
                calls.fetch_add(1, Ordering::SeqCst);
                Ok(7u32)
            })
            .await
            .unwrap();

        assert_eq!(*second, 7);
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn stale_entries_are_refetched() {
        let cache: SingleFlightCache<&'static str, u32> = SingleFlightCache::new();
        let calls = AtomicU32::new(0);

        let ttl = Duration::from_millis(10);
        let v1 = cache
            .get_or_fetch("k", ttl, || async {
                calls.fetch_add(1, Ordering::SeqCst);
                Ok(1u32)
            })
            .await
            .unwrap();
        assert_eq!(*v1, 1);

        tokio::time::sleep(Duration::from_millis(30)).await;

        let v2 = cache
            .get_or_fetch("k", ttl, || async {
                calls.fetch_add(1, Ordering::SeqCst);
                Ok(2u32)
            })
            .await
            .unwrap();
        assert_eq!(*v2, 2);
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }
}
