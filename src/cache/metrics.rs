//! Cache Metrics Module
//!
//! Session counters for hits, misses and removals, plus the derived snapshot
//! returned to callers.

use std::sync::atomic::{AtomicU64, Ordering};

use serde::{Deserialize, Serialize};

// == Session Counters ==
/// Monotonic counters since process start. Not persisted.
#[derive(Debug, Default)]
pub struct SessionCounters {
    total_queries: AtomicU64,
    cache_hits: AtomicU64,
    cache_misses: AtomicU64,
    evictions: AtomicU64,
    expirations: AtomicU64,
}

impl SessionCounters {
    pub fn new() -> Self {
        Self::default()
    }

    // == Record Hit ==
    pub fn record_hit(&self) {
        self.total_queries.fetch_add(1, Ordering::Relaxed);
        self.cache_hits.fetch_add(1, Ordering::Relaxed);
    }

    // == Record Miss ==
    pub fn record_miss(&self) {
        self.total_queries.fetch_add(1, Ordering::Relaxed);
        self.cache_misses.fetch_add(1, Ordering::Relaxed);
    }

    // == Record Eviction ==
    pub fn record_evictions(&self, count: usize) {
        self.evictions.fetch_add(count as u64, Ordering::Relaxed);
    }

    // == Record Expiration ==
    pub fn record_expirations(&self, count: usize) {
        self.expirations.fetch_add(count as u64, Ordering::Relaxed);
    }

    /// Builds a metrics snapshot around the live totals computed by the caller.
    pub fn snapshot(&self, total_size: u64, entry_count: usize) -> CacheMetrics {
        let total_queries = self.total_queries.load(Ordering::Relaxed);
        let cache_hits = self.cache_hits.load(Ordering::Relaxed);
        CacheMetrics {
            total_queries,
            cache_hits,
            cache_misses: self.cache_misses.load(Ordering::Relaxed),
            evictions: self.evictions.load(Ordering::Relaxed),
            expirations: self.expirations.load(Ordering::Relaxed),
            total_size,
            entry_count,
            hit_rate: hit_rate(cache_hits, total_queries),
        }
    }
}

// == Cache Metrics ==
/// Point-in-time view of cache performance.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CacheMetrics {
    pub total_queries: u64,
    pub cache_hits: u64,
    pub cache_misses: u64,
    /// Live entries removed to make room
    pub evictions: u64,
    /// Entries removed after their TTL elapsed
    pub expirations: u64,
    /// Bytes held by live entries
    pub total_size: u64,
    /// Number of live entries
    pub entry_count: usize,
    pub hit_rate: f64,
}

/// `hits / total`, or 0.0 if no requests have been made.
pub fn hit_rate(hits: u64, total: u64) -> f64 {
    if total == 0 {
        0.0
    } else {
        hits as f64 / total as f64
    }
}
