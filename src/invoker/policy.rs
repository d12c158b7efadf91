//! Retry policy and per-call options.

use std::fmt::Display;
use std::time::Duration;

/// Lowercase phrases that identify a transient upstream failure.
const RETRYABLE_PHRASES: &[&str] = &[
    "rate limit",
    "rate_limit",
    "too many requests",
    "internal server error",
    "bad gateway",
    "service unavailable",
    "overloaded",
    "timeout",
    "timed out",
];

/// Returns true if a bare HTTP status code is transient: 429 or any 5xx.
pub fn is_retryable_status(status: u16) -> bool {
    status == 429 || (500..600).contains(&status)
}

/// Returns true if an error message looks transient.
///
/// Matching is case-insensitive. Status codes only count as standalone
/// three-digit tokens, so ids like `req_4291` do not match.
pub fn is_retryable(message: &str) -> bool {
    let message = message.to_ascii_lowercase();
    if RETRYABLE_PHRASES.iter().any(|phrase| message.contains(phrase)) {
        return true;
    }
    message
        .split(|c: char| !c.is_ascii_alphanumeric())
        .filter(|token| token.len() == 3)
        .filter_map(|token| token.parse::<u16>().ok())
        .any(is_retryable_status)
}

// == Retryable Error ==
/// Classifies a failed call as transient or terminal.
///
/// The default looks at the Display text. Errors that know their own
/// status should override it so that payload text is never matched.
pub trait RetryableError: Display {
    fn is_retryable(&self) -> bool {
        is_retryable(&self.to_string())
    }
}

impl RetryableError for String {}
impl RetryableError for &str {}

// == Retry Policy ==
/// Process-wide retry defaults for an invoker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Retries after the first attempt
    pub max_retries: u32,
    /// Base delay, scaled by the attempt index
    pub retry_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 3,
            retry_delay: Duration::from_millis(1000),
        }
    }
}

impl RetryPolicy {
    /// Delay to wait before attempt `attempt` (0-based).
    ///
    /// Linear: `retry_delay * attempt`, so the first attempt never waits.
    pub fn delay_before(&self, attempt: u32) -> Duration {
        self.retry_delay.saturating_mul(attempt)
    }
}

// == Invoke Options ==
/// Per-call overrides. Unset fields fall back to the invoker defaults.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvokeOptions {
    /// Look up and store results in the cache
    pub enable_cache: bool,
    /// Overrides [`RetryPolicy::max_retries`]
    pub max_retries: Option<u32>,
    /// Overrides [`RetryPolicy::retry_delay`]
    pub retry_delay: Option<Duration>,
    /// Use this key instead of fingerprinting the request
    pub cache_key: Option<String>,
    /// TTL for the stored result, cache default when `None`
    pub cache_ttl: Option<Duration>,
}

impl Default for InvokeOptions {
    fn default() -> Self {
        Self {
            enable_cache: true,
            max_retries: None,
            retry_delay: None,
            cache_key: None,
            cache_ttl: None,
        }
    }
}

impl InvokeOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn without_cache(mut self) -> Self {
        self.enable_cache = false;
        self
    }

    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = Some(max_retries);
        self
    }

    pub fn with_retry_delay(mut self, delay: Duration) -> Self {
        self.retry_delay = Some(delay);
        self
    }

    pub fn with_cache_key(mut self, key: impl Into<String>) -> Self {
        self.cache_key = Some(key.into());
        self
    }

    pub fn with_cache_ttl(mut self, ttl: Duration) -> Self {
        self.cache_ttl = Some(ttl);
        self
    }

    /// Resolves the effective retry policy for this call.
    pub fn policy(&self, defaults: RetryPolicy) -> RetryPolicy {
        RetryPolicy {
            max_retries: self.max_retries.unwrap_or(defaults.max_retries),
            retry_delay: self.retry_delay.unwrap_or(defaults.retry_delay),
        }
    }
}
