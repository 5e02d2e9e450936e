//! Bounded in-memory cache of parsed runs.
//!
//! Lookups take the shared lock only. Misses load through the backing
//! [`RunLoader`] with no lock held, then take the exclusive lock to insert.
//! Two callers missing the same run at once may both load it; the later
//! insert wins.

use std::num::NonZeroUsize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use lru::LruCache;
use metrics::counter;
use tokio::sync::RwLock;
use tracing::{debug, info};

use wind_common::{RunKey, RunRecord, WindError, WindResult};

use super::RunLoader;
use crate::config::{EvictionPolicy, WorkingSetConfig};
use crate::types::CacheStats;

pub struct WorkingSetCache {
    entries: RwLock<LruCache<RunKey, Arc<RunRecord>>>,
    capacity: NonZeroUsize,
    policy: EvictionPolicy,
    loader: Arc<dyn RunLoader>,
    hits: AtomicU64,
    misses: AtomicU64,
    evictions: AtomicU64,
}

impl WorkingSetCache {
    pub fn new(config: &WorkingSetConfig, loader: Arc<dyn RunLoader>) -> WindResult<Self> {
        config.validate()?;
        let capacity = NonZeroUsize::new(config.capacity).ok_or_else(|| {
            WindError::ConfigError("working set capacity must be at least 1".to_string())
        })?;

        Ok(Self {
            entries: RwLock::new(LruCache::new(capacity)),
            capacity,
            policy: config.policy,
            loader,
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
            evictions: AtomicU64::new(0),
        })
    }

    pub fn policy(&self) -> EvictionPolicy {
        self.policy
    }

    /// Return the cached record for `key`, loading it on a miss.
    pub async fn get_or_load(&self, key: &RunKey) -> WindResult<Arc<RunRecord>> {
        if let Some(record) = self.lookup(key).await {
            self.hits.fetch_add(1, Ordering::Relaxed);
            counter!("wind_working_set_hits_total").increment(1);
            return Ok(record);
        }

        self.misses.fetch_add(1, Ordering::Relaxed);
        counter!("wind_working_set_misses_total").increment(1);

        let record = self.loader.load_run(key).await?;
        self.insert(*key, record.clone()).await;
        Ok(record)
    }

    async fn lookup(&self, key: &RunKey) -> Option<Arc<RunRecord>> {
        let record = self.entries.read().await.peek(key).cloned()?;

        // Recency is best effort: skip the bump rather than wait for writers.
        if self.policy == EvictionPolicy::Lru {
            if let Ok(mut entries) = self.entries.try_write() {
                entries.promote(key);
            }
        }
        Some(record)
    }

    async fn insert(&self, key: RunKey, record: Arc<RunRecord>) {
        let mut entries = self.entries.write().await;

        match self.policy {
            EvictionPolicy::ClearAll => {
                if !entries.contains(&key) && entries.len() >= self.capacity.get() {
                    let dropped = entries.len() as u64;
                    entries.clear();
                    self.evictions.fetch_add(dropped, Ordering::Relaxed);
                    info!(dropped, capacity = self.capacity.get(), "Working set full, cleared");
                }
                entries.put(key, record);
            }
            EvictionPolicy::Lru => {
                if let Some((evicted, _)) = entries.push(key, record) {
                    if evicted != key {
                        self.evictions.fetch_add(1, Ordering::Relaxed);
                        debug!(run = %evicted, "Evicted run from working set");
                    }
                }
            }
        }
    }

    /// Drop every cached run.
    pub async fn clear(&self) -> usize {
        let mut entries = self.entries.write().await;
        let dropped = entries.len();
        entries.clear();
        info!(dropped, "Working set cleared");
        dropped
    }

    pub async fn contains(&self, key: &RunKey) -> bool {
        self.entries.read().await.contains(key)
    }

    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }

    pub async fn stats(&self) -> CacheStats {
        CacheStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            evictions: self.evictions.load(Ordering::Relaxed),
            entries: self.len().await,
            capacity: self.capacity.get(),
        }
    }
}

#[async_trait]
impl RunLoader for WorkingSetCache {
    async fn load_run(&self, key: &RunKey) -> WindResult<Arc<RunRecord>> {
        self.get_or_load(key).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Datelike, NaiveDate};
    use std::collections::HashMap;
    use std::sync::Mutex;
    use test_utils::{ramp_record, test_grid};
    use wind_common::Batch;

    /// Hands out a distinct ramp record per day and counts loads per key.
    #[derive(Default)]
    struct CountingLoader {
        loads: Mutex<HashMap<RunKey, usize>>,
    }

    impl CountingLoader {
        fn loads(&self, key: &RunKey) -> usize {
            self.loads.lock().unwrap().get(key).copied().unwrap_or(0)
        }
    }

    #[async_trait]
    impl RunLoader for CountingLoader {
        async fn load_run(&self, key: &RunKey) -> WindResult<Arc<RunRecord>> {
            *self.loads.lock().unwrap().entry(*key).or_default() += 1;
            if key.date() == NaiveDate::from_ymd_opt(1999, 1, 1).unwrap() {
                return Err(WindError::NoData("no such run".to_string()));
            }
            Ok(Arc::new(ramp_record(&test_grid(), key.date().day())))
        }
    }

    fn day(d: u32) -> RunKey {
        RunKey::new(NaiveDate::from_ymd_opt(2024, 1, d).unwrap(), Batch::Z00)
    }

    fn cache(capacity: usize, policy: EvictionPolicy) -> (WorkingSetCache, Arc<CountingLoader>) {
        let loader = Arc::new(CountingLoader::default());
        let cache = WorkingSetCache::new(
            &WorkingSetConfig { capacity, policy },
            loader.clone(),
        )
        .unwrap();
        (cache, loader)
    }

    #[tokio::test]
    async fn test_hit_after_load() {
        let (cache, loader) = cache(4, EvictionPolicy::Lru);

        let first = cache.get_or_load(&day(1)).await.unwrap();
        let second = cache.get_or_load(&day(1)).await.unwrap();

        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(loader.loads(&day(1)), 1);
        let stats = cache.stats().await;
        assert_eq!((stats.hits, stats.misses, stats.entries), (1, 1, 1));
    }

    #[tokio::test]
    async fn test_clear_all_keeps_only_newest() {
        let (cache, _) = cache(3, EvictionPolicy::ClearAll);

        for d in 1..=4 {
            cache.get_or_load(&day(d)).await.unwrap();
        }

        assert_eq!(cache.len().await, 1);
        assert!(cache.contains(&day(4)).await);
        assert_eq!(cache.stats().await.evictions, 3);
    }

    #[tokio::test]
    async fn test_lru_keeps_most_recently_used() {
        let (cache, loader) = cache(3, EvictionPolicy::Lru);

        for d in 1..=3 {
            cache.get_or_load(&day(d)).await.unwrap();
        }
        // Touch day 1 so day 2 becomes least recently used.
        cache.get_or_load(&day(1)).await.unwrap();
        cache.get_or_load(&day(4)).await.unwrap();

        assert_eq!(cache.len().await, 3);
        assert!(cache.contains(&day(1)).await);
        assert!(!cache.contains(&day(2)).await);
        assert!(cache.contains(&day(3)).await);
        assert!(cache.contains(&day(4)).await);
        assert_eq!(cache.stats().await.evictions, 1);

        cache.get_or_load(&day(2)).await.unwrap();
        assert_eq!(loader.loads(&day(2)), 2);
    }

    #[tokio::test]
    async fn test_failed_load_is_not_cached() {
        let (cache, loader) = cache(3, EvictionPolicy::Lru);
        let missing = RunKey::new(NaiveDate::from_ymd_opt(1999, 1, 1).unwrap(), Batch::Z00);

        assert!(cache.get_or_load(&missing).await.is_err());
        assert!(cache.get_or_load(&missing).await.is_err());
        assert_eq!(loader.loads(&missing), 2);
        assert!(cache.is_empty().await);
    }

    #[tokio::test]
    async fn test_clear() {
        let (cache, loader) = cache(3, EvictionPolicy::Lru);
        cache.get_or_load(&day(1)).await.unwrap();
        cache.get_or_load(&day(2)).await.unwrap();

        assert_eq!(cache.clear().await, 2);
        assert!(cache.is_empty().await);

        cache.get_or_load(&day(1)).await.unwrap();
        assert_eq!(loader.loads(&day(1)), 2);
    }

    #[test]
    fn test_zero_capacity_rejected() {
        let result = WorkingSetCache::new(
            &WorkingSetConfig {
                capacity: 0,
                policy: EvictionPolicy::Lru,
            },
            Arc::new(CountingLoader::default()),
        );
        assert!(result.is_err());
    }
}
