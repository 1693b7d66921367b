// Cache accounting: cumulative hit/miss counters and the stats snapshot reported to clients.

use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CacheStats {
    pub capacity: usize,
    pub size: usize,
    pub hits: u64,
    pub misses: u64,
}

/// Counters owned by the cache state and mutated under its lock.
#[derive(Debug, Default)]
pub struct HitCounters {
    hits: u64,
    misses: u64,
}

impl HitCounters {
    pub fn record_hit(&mut self) {
        self.hits += 1;
    }

    pub fn record_miss(&mut self) {
        self.misses += 1;
    }

    pub fn snapshot(&self, capacity: usize, size: usize) -> CacheStats {
        CacheStats {
            capacity,
            size,
            hits: self.hits,
            misses: self.misses,
        }
    }
}
