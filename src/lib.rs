//! Clinic LLM Cache - response caching and retrying LLM calls for the
//! clinic chat assistant.
//!
//! Provides a TTL cache with background sweep, deterministic request
//! fingerprints, and a cache-first invoker with bounded retries.

pub mod api;
pub mod cache;
pub mod config;
pub mod error;
pub mod invoker;
pub mod llm;
pub mod models;
pub mod tasks;

pub use api::AppState;
pub use cache::{build_key, CacheKeyParts, CacheStats, TtlCache};
pub use config::Config;
pub use invoker::{InvocationResult, InvokeOptions, RetryPolicy, RetryableInvoker};
