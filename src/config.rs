//! Configuration Module
//!
//! Handles loading and managing service configuration from environment variables.

use std::env;
use std::str::FromStr;
use std::time::Duration;

use crate::invoker::RetryPolicy;

/// Service configuration parameters.
///
/// All values can be configured via environment variables with sensible defaults.
#[derive(Debug, Clone)]
pub struct Config {
    /// Default TTL in milliseconds for cached chat responses
    pub response_cache_ttl_ms: u64,
    /// Default TTL in milliseconds for cached generated images
    pub image_cache_ttl_ms: u64,
    /// Background sweep interval in milliseconds, shared by both caches
    pub sweep_interval_ms: u64,
    /// Retries after the first failed LLM attempt
    pub max_retries: u32,
    /// Base retry delay in milliseconds
    pub retry_delay_ms: u64,
    /// HTTP server port
    pub server_port: u16,
    /// Base URL of the OpenAI-compatible LLM API
    pub llm_api_url: String,
    /// Bearer token for the LLM API
    pub llm_api_key: Option<String>,
    /// Model requested from the LLM API
    pub llm_model: String,
    /// Model requested for image generation
    pub llm_image_model: String,
    /// Per-request timeout for LLM calls in seconds
    pub llm_timeout_secs: u64,
}

impl Config {
    /// Creates a new Config by loading values from environment variables.
    ///
    /// # Environment Variables
    /// - `RESPONSE_CACHE_TTL_MS` - Chat response TTL (default: 1800000, 30 minutes)
    /// - `IMAGE_CACHE_TTL_MS` - Image TTL (default: 86400000, 24 hours)
    /// - `SWEEP_INTERVAL_MS` - Sweep frequency (default: 300000, 5 minutes)
    /// - `MAX_RETRIES` - Retry budget per call (default: 3)
    /// - `RETRY_DELAY_MS` - Base retry delay (default: 1000)
    /// - `SERVER_PORT` - HTTP server port (default: 3000)
    /// - `LLM_API_URL` - LLM API base URL (default: https://api.openai.com)
    /// - `LLM_API_KEY` - LLM API key (default: unset)
    /// - `LLM_MODEL` - Model name (default: gpt-4o-mini)
    /// - `LLM_IMAGE_MODEL` - Image model name (default: dall-e-3)
    /// - `LLM_TIMEOUT_SECS` - LLM request timeout (default: 60)
    pub fn from_env() -> Self {
        let defaults = Self::default();

        Self {
            response_cache_ttl_ms: parse_var("RESPONSE_CACHE_TTL_MS")
                .unwrap_or(defaults.response_cache_ttl_ms),
            image_cache_ttl_ms: parse_var("IMAGE_CACHE_TTL_MS")
                .unwrap_or(defaults.image_cache_ttl_ms),
            sweep_interval_ms: parse_var("SWEEP_INTERVAL_MS")
                .unwrap_or(defaults.sweep_interval_ms),
            max_retries: parse_var("MAX_RETRIES").unwrap_or(defaults.max_retries),
            retry_delay_ms: parse_var("RETRY_DELAY_MS").unwrap_or(defaults.retry_delay_ms),
            server_port: parse_var("SERVER_PORT").unwrap_or(defaults.server_port),
            llm_api_url: env::var("LLM_API_URL")
                .ok()
                .filter(|v| !v.is_empty())
                .unwrap_or(defaults.llm_api_url),
            llm_api_key: env::var("LLM_API_KEY").ok().filter(|v| !v.is_empty()),
            llm_model: env::var("LLM_MODEL")
                .ok()
                .filter(|v| !v.is_empty())
                .unwrap_or(defaults.llm_model),
            llm_image_model: env::var("LLM_IMAGE_MODEL")
                .ok()
                .filter(|v| !v.is_empty())
                .unwrap_or(defaults.llm_image_model),
            llm_timeout_secs: parse_var("LLM_TIMEOUT_SECS").unwrap_or(defaults.llm_timeout_secs),
        }
    }

    pub fn response_cache_ttl(&self) -> Duration {
        Duration::from_millis(self.response_cache_ttl_ms)
    }

    pub fn image_cache_ttl(&self) -> Duration {
        Duration::from_millis(self.image_cache_ttl_ms)
    }

    pub fn sweep_interval(&self) -> Duration {
        Duration::from_millis(self.sweep_interval_ms)
    }

    pub fn llm_timeout(&self) -> Duration {
        Duration::from_secs(self.llm_timeout_secs)
    }

    /// Retry defaults shared by the chat and image invokers.
    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            max_retries: self.max_retries,
            retry_delay: Duration::from_millis(self.retry_delay_ms),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            response_cache_ttl_ms: 30 * 60 * 1000,
            image_cache_ttl_ms: 24 * 60 * 60 * 1000,
            sweep_interval_ms: 5 * 60 * 1000,
            max_retries: 3,
            retry_delay_ms: 1000,
            server_port: 3000,
            llm_api_url: "https://api.openai.com".to_string(),
            llm_api_key: None,
            llm_model: "gpt-4o-mini".to_string(),
            llm_image_model: "dall-e-3".to_string(),
            llm_timeout_secs: 60,
        }
    }
}

fn parse_var<T: FromStr>(name: &str) -> Option<T> {
    env::var(name).ok().and_then(|v| v.trim().parse().ok())
}
