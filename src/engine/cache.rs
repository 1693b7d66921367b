// Read-through LRU cache of readings with hit/miss accounting.

use std::num::NonZeroUsize;
use std::sync::Arc;

use lru::LruCache;
use parking_lot::Mutex;
use serde::Serialize;
use tracing::debug;

use super::stats::{CacheStats, HitCounters};
use crate::error::{EngineError, Result};
use crate::source::traits::{Reading, ReadingId, ReadingStore};

/// Result of a `get`: the reading plus whether it was already cached.
#[derive(Debug, Clone, Serialize)]
pub struct CacheLookup {
    pub item: Reading,
    pub hit: bool,
    pub stats: CacheStats,
}

/// Result of a `put`: the stored reading and the stats after insertion.
#[derive(Debug, Clone, Serialize)]
pub struct PutOutcome {
    pub item: Reading,
    pub stats: CacheStats,
}

/// Full cache contents, most-recently-used first.
#[derive(Debug, Clone, Serialize)]
pub struct CacheSnapshot {
    pub capacity: usize,
    pub size: usize,
    pub hits: u64,
    pub misses: u64,
    pub items: Vec<(ReadingId, Reading)>,
}

struct CacheState {
    entries: LruCache<ReadingId, Reading>,
    counters: HitCounters,
}

impl CacheState {
    /// Insert at the MRU position. An existing key is refreshed in place;
    /// a new key past capacity pushes out the LRU entry, which is returned.
    fn insert(&mut self, key: ReadingId, value: Reading) -> Option<ReadingId> {
        if self.entries.contains(&key) {
            self.entries.put(key, value);
            return None;
        }
        self.entries.push(key, value).map(|(evicted, _)| evicted)
    }

    fn stats(&self) -> CacheStats {
        self.counters
            .snapshot(self.entries.cap().get(), self.entries.len())
    }
}

pub struct ReadingCache {
    state: Mutex<CacheState>,
    store: Arc<dyn ReadingStore>,
}

/// Reject ids that cannot name a reading.
pub fn validate_reading_id(raw: i64) -> Result<ReadingId> {
    if raw <= 0 {
        return Err(EngineError::InvalidArgument(format!(
            "reading id must be a positive integer, got {}",
            raw
        )));
    }
    Ok(raw as ReadingId)
}

impl ReadingCache {
    /// Create an empty cache holding at most `capacity` readings.
    pub fn new(capacity: usize, store: Arc<dyn ReadingStore>) -> Result<Self> {
        let capacity = NonZeroUsize::new(capacity).ok_or_else(|| {
            EngineError::InvalidArgument("cache capacity must be > 0".to_string())
        })?;
        Ok(Self {
            state: Mutex::new(CacheState {
                entries: LruCache::new(capacity),
                counters: HitCounters::default(),
            }),
            store,
        })
    }

    /// Look up a reading, reading through to the store on a miss.
    ///
    /// The store fetch runs without the lock held; a concurrent insert of the
    /// same key in the meantime is absorbed by the refresh path of `insert`.
    /// A failed fetch leaves counters and entries untouched.
    pub async fn get(&self, key: ReadingId) -> Result<CacheLookup> {
        if key == 0 {
            return Err(EngineError::InvalidArgument(
                "reading id must be a positive integer".to_string(),
            ));
        }

        {
            let mut state = self.state.lock();
            if let Some(item) = state.entries.get(&key).cloned() {
                state.counters.record_hit();
                debug!("cache hit key={}", key);
                return Ok(CacheLookup {
                    item,
                    hit: true,
                    stats: state.stats(),
                });
            }
        }

        let item = self.store.fetch_reading(key).await?;

        let mut state = self.state.lock();
        state.counters.record_miss();
        if let Some(evicted) = state.insert(key, item.clone()) {
            debug!("cache miss key={} evicted={}", key, evicted);
        } else {
            debug!("cache miss key={}", key);
        }
        Ok(CacheLookup {
            item,
            hit: false,
            stats: state.stats(),
        })
    }

    /// Prime the cache with a reading from the store. Counters are not touched.
    pub async fn put(&self, key: ReadingId) -> Result<PutOutcome> {
        if key == 0 {
            return Err(EngineError::InvalidArgument(
                "reading id must be a positive integer".to_string(),
            ));
        }

        let item = self.store.fetch_reading(key).await?;

        let mut state = self.state.lock();
        if let Some(evicted) = state.insert(key, item.clone()) {
            debug!("cache put key={} evicted={}", key, evicted);
        } else {
            debug!("cache put key={}", key);
        }
        Ok(PutOutcome {
            item,
            stats: state.stats(),
        })
    }

    pub fn stats(&self) -> CacheStats {
        self.state.lock().stats()
    }

    pub fn snapshot(&self) -> CacheSnapshot {
        let state = self.state.lock();
        let stats = state.stats();
        let items = state
            .entries
            .iter()
            .map(|(k, v)| (*k, v.clone()))
            .collect();
        CacheSnapshot {
            capacity: stats.capacity,
            size: stats.size,
            hits: stats.hits,
            misses: stats.misses,
            items,
        }
    }
}
