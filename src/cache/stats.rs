//! Cache Statistics Module
//!
//! Snapshot of cache contents plus running hit/miss counters.

use serde::Serialize;

// == Cache Stats ==
/// Point-in-time view of a cache.
///
/// `size` always equals `keys.len()`; both are taken under the same lock.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CacheStats {
    /// Number of entries currently stored
    pub size: usize,
    /// Stored keys, sorted
    pub keys: Vec<String>,
    /// Number of lookups that returned a live value
    pub hits: u64,
    /// Number of lookups that found nothing or a stale entry
    pub misses: u64,
    /// Number of entries dropped for being stale (lazily or by the sweep)
    pub expired: u64,
}

impl CacheStats {
    // == Constructor ==
    /// Creates an empty snapshot with all counters at zero.
    pub fn new() -> Self {
        Self::default()
    }

    // == Hit Rate ==
    /// Calculates the cache hit rate.
    ///
    /// Returns hits / (hits + misses), or 0.0 if no lookups have been made.
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }
}

// == Counters ==
/// Running counters kept by the store between snapshots.
#[derive(Debug, Clone, Copy, Default)]
pub(crate) struct Counters {
    pub hits: u64,
    pub misses: u64,
    pub expired: u64,
}

impl Counters {
    pub fn record_hit(&mut self) {
        self.hits += 1;
    }

    pub fn record_miss(&mut self) {
        self.misses += 1;
    }

    pub fn record_expired(&mut self, count: usize) {
        self.expired += count as u64;
    }
}
