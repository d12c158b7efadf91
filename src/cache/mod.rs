//! Cache Module
//!
//! Provides in-memory caching with per-entry TTL, lazy and swept expiry,
//! and deterministic cache key fingerprints.

mod entry;
pub mod key;
mod stats;
mod store;
mod ttl;


// Re-export public types
pub use entry::CacheEntry;
pub use key::{build_key, CacheKeyParts};
pub use stats::CacheStats;
pub use store::CacheStore;
pub use ttl::TtlCache;
