//! Response DTOs for the chat API
//!
//! Defines the structure of outgoing HTTP response bodies.

use serde::{Deserialize, Serialize};

use crate::cache::CacheStats;
use crate::invoker::InvocationResult;

/// Answer produced by the LLM for a chat request.
///
/// This is the value stored in the response cache.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatResponse {
    /// Assistant text
    pub text: String,
    /// Model that produced the answer, when the API reports it
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
}

impl ChatResponse {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            model: None,
        }
    }
}

/// Response body for POST /chat
pub type InvokeResponse = InvocationResult<ChatResponse>;

/// Response body for POST /images; the payload is the image URL
pub type ImageInvokeResponse = InvocationResult<String>;

/// Stats for one named cache, as returned by GET /cache/stats
#[derive(Debug, Clone, Serialize)]
pub struct NamedCacheStats {
    /// Cache name
    pub name: String,
    /// Snapshot contents and counters
    #[serde(flatten)]
    pub stats: CacheStats,
    /// Hit rate (hits / (hits + misses))
    pub hit_rate: f64,
}

impl NamedCacheStats {
    pub fn new(name: impl Into<String>, stats: CacheStats) -> Self {
        Self {
            name: name.into(),
            hit_rate: stats.hit_rate(),
            stats,
        }
    }
}

/// Response body for GET /cache/stats
#[derive(Debug, Clone, Serialize)]
pub struct CacheStatsResponse {
    /// One entry per registered cache
    pub caches: Vec<NamedCacheStats>,
    /// Snapshot time in ISO 8601 format
    pub timestamp: String,
}

impl CacheStatsResponse {
    pub fn new(caches: Vec<NamedCacheStats>) -> Self {
        Self {
            caches,
            timestamp: chrono::Utc::now().to_rfc3339(),
        }
    }
}

/// Response body for DELETE /cache/:name and DELETE /cache/:name/:key
#[derive(Debug, Clone, Serialize)]
pub struct ClearResponse {
    /// Success message
    pub message: String,
    /// Cache that was cleared
    pub cache: String,
    /// Key that was removed, if a single key was targeted
    #[serde(skip_serializing_if = "Option::is_none")]
    pub key: Option<String>,
    /// Number of entries removed
    pub removed: usize,
}

impl ClearResponse {
    pub fn new(cache: impl Into<String>, key: Option<String>, removed: usize) -> Self {
        let cache = cache.into();
        let message = match &key {
            Some(key) if removed > 0 => format!("Key '{}' removed from cache '{}'", key, cache),
            Some(key) => format!("Key '{}' not present in cache '{}'", key, cache),
            None => format!("Cache '{}' cleared ({} entries)", cache, removed),
        };
        Self {
            message,
            cache,
            key,
            removed,
        }
    }
}

/// Response body for the health endpoint (GET /health)
#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    /// Health status (e.g., "healthy")
    pub status: String,
    /// Current timestamp in ISO 8601 format
    pub timestamp: String,
}

impl HealthResponse {
    /// Creates a new HealthResponse with current timestamp
    pub fn healthy() -> Self {
        Self {
            status: "healthy".to_string(),
            timestamp: chrono::Utc::now().to_rfc3339(),
        }
    }
}

/// Error response body for all error conditions
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Error message describing what went wrong
    pub error: String,
}
