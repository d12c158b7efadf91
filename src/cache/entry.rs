//! Cache Entry Module
//!
//! Defines the structure for individual cache entries with TTL support.

use std::time::{SystemTime, UNIX_EPOCH};

// == Cache Entry ==
/// Represents a single cache entry with value and expiry metadata.
///
/// Entries are never mutated after creation; a new `set` on the same key
/// replaces the entry wholesale.
#[derive(Debug, Clone)]
pub struct CacheEntry<V> {
    /// The stored value
    pub value: V,
    /// Storage timestamp (Unix milliseconds)
    pub stored_at: u64,
    /// Lifetime in milliseconds, measured from `stored_at`
    pub ttl_ms: u64,
}

impl<V> CacheEntry<V> {
    // == Constructor ==
    /// Creates a new cache entry stamped with the current time.
    ///
    /// # Arguments
    /// * `value` - The value to store
    /// * `ttl_ms` - Lifetime in milliseconds
    pub fn new(value: V, ttl_ms: u64) -> Self {
        Self {
            value,
            stored_at: current_timestamp_ms(),
            ttl_ms,
        }
    }

    // == Age ==
    /// Milliseconds elapsed between `stored_at` and `now`.
    pub fn age_ms(&self, now: u64) -> u64 {
        now.saturating_sub(self.stored_at)
    }

    // == Is Expired ==
    /// Checks whether the entry is stale at the given instant.
    ///
    /// Boundary condition: an entry stays live while its age is less than or
    /// equal to its TTL, and is expired once the age strictly exceeds it.
    pub fn is_expired_at(&self, now: u64) -> bool {
        self.age_ms(now) > self.ttl_ms
    }

    /// Checks whether the entry is stale right now.
    pub fn is_expired(&self) -> bool {
        self.is_expired_at(current_timestamp_ms())
    }

    // == Time To Live ==
    /// Returns remaining lifetime in milliseconds, `0` once expired.
    pub fn ttl_remaining_ms(&self) -> u64 {
        self.ttl_ms.saturating_sub(self.age_ms(current_timestamp_ms()))
    }
}

// == Utility Functions ==
/// Returns current Unix timestamp in milliseconds.
///
/// A clock set before the epoch reads as `0` rather than panicking.
pub fn current_timestamp_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or_default()
}
