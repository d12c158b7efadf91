//! Cache Store Module
//!
//! Synchronous key/value map with per-entry TTL and lazy expiry on read.
//! Callers that share a store across tasks wrap it in a lock; see
//! [`TtlCache`](crate::cache::TtlCache).

use std::collections::HashMap;

use crate::cache::entry::current_timestamp_ms;
use crate::cache::stats::Counters;
use crate::cache::{CacheEntry, CacheStats};

// == Cache Store ==
/// Main cache storage with TTL support.
#[derive(Debug)]
pub struct CacheStore<V> {
    /// Key-value storage
    entries: HashMap<String, CacheEntry<V>>,
    /// Hit/miss/expiry counters
    counters: Counters,
    /// TTL in milliseconds for entries stored without an explicit TTL
    default_ttl_ms: u64,
}

impl<V: Clone> CacheStore<V> {
    // == Constructor ==
    /// Creates an empty store.
    ///
    /// # Arguments
    /// * `default_ttl_ms` - TTL applied when `set` is called without one
    pub fn new(default_ttl_ms: u64) -> Self {
        Self {
            entries: HashMap::new(),
            counters: Counters::default(),
            default_ttl_ms,
        }
    }

    /// Returns the TTL applied to entries stored without one.
    pub fn default_ttl_ms(&self) -> u64 {
        self.default_ttl_ms
    }

    // == Set ==
    /// Stores a value, replacing any existing entry for the key.
    ///
    /// # Arguments
    /// * `key` - The key to store
    /// * `value` - The value to store
    /// * `ttl_ms` - Optional TTL in milliseconds (uses the default if None)
    pub fn set(&mut self, key: String, value: V, ttl_ms: Option<u64>) {
        self.set_at(key, value, ttl_ms, current_timestamp_ms());
    }

    pub(crate) fn set_at(&mut self, key: String, value: V, ttl_ms: Option<u64>, now: u64) {
        let entry = CacheEntry {
            value,
            stored_at: now,
            ttl_ms: ttl_ms.unwrap_or(self.default_ttl_ms),
        };
        self.entries.insert(key, entry);
    }

    // == Get ==
    /// Retrieves a value by key.
    ///
    /// Expiry is re-checked on every read, so a stale entry is never
    /// returned even if the sweep has not run. Stale entries found here are
    /// removed.
    pub fn get(&mut self, key: &str) -> Option<V> {
        self.get_at(key, current_timestamp_ms())
    }

    pub(crate) fn get_at(&mut self, key: &str, now: u64) -> Option<V> {
        match self.entries.get(key) {
            Some(entry) if !entry.is_expired_at(now) => {
                self.counters.record_hit();
                Some(entry.value.clone())
            }
            Some(_) => {
                self.entries.remove(key);
                self.counters.record_expired(1);
                self.counters.record_miss();
                None
            }
            None => {
                self.counters.record_miss();
                None
            }
        }
    }

    // == Has ==
    /// Returns true if a live entry exists for the key.
    ///
    /// Does not count as a hit or miss. A stale entry found here is removed
    /// and counted as expired, as in `get`.
    pub fn has(&mut self, key: &str) -> bool {
        self.has_at(key, current_timestamp_ms())
    }

    pub(crate) fn has_at(&mut self, key: &str, now: u64) -> bool {
        match self.entries.get(key) {
            Some(entry) if !entry.is_expired_at(now) => true,
            Some(_) => {
                self.entries.remove(key);
                self.counters.record_expired(1);
                false
            }
            None => false,
        }
    }

    // == Delete ==
    /// Removes an entry by key, returning whether it was present.
    pub fn delete(&mut self, key: &str) -> bool {
        self.entries.remove(key).is_some()
    }

    // == Clear ==
    /// Removes every entry, returning how many were removed. Counters are kept.
    pub fn clear(&mut self) -> usize {
        let removed = self.entries.len();
        self.entries.clear();
        removed
    }

    // == Stats ==
    /// Returns a consistent snapshot of the store.
    pub fn stats(&self) -> CacheStats {
        let mut keys: Vec<String> = self.entries.keys().cloned().collect();
        keys.sort();

        CacheStats {
            size: keys.len(),
            keys,
            hits: self.counters.hits,
            misses: self.counters.misses,
            expired: self.counters.expired,
        }
    }

    // == Cleanup Expired ==
    /// Removes all expired entries from the store.
    ///
    /// Returns the number of entries removed.
    pub fn cleanup_expired(&mut self) -> usize {
        self.cleanup_expired_at(current_timestamp_ms())
    }

    pub(crate) fn cleanup_expired_at(&mut self, now: u64) -> usize {
        let before = self.entries.len();
        self.entries.retain(|_, entry| !entry.is_expired_at(now));
        let removed = before - self.entries.len();
        self.counters.record_expired(removed);
        removed
    }

    // == Length ==
    /// Returns the number of stored entries, including stale ones not yet swept.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    // == Is Empty ==
    /// Returns true if the store holds no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
