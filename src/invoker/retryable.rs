//! Cache-first, retrying wrapper around a single external call.

use std::future::Future;
use std::sync::Arc;

use serde::Serialize;
use tracing::{error, info, warn};

use crate::cache::{build_key, CacheKeyParts, CacheStats, TtlCache};
use crate::error::InvokeError;
use crate::invoker::policy::{InvokeOptions, RetryPolicy, RetryableError};

/// Outcome of a successful [`RetryableInvoker::invoke`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InvocationResult<R> {
    /// The upstream result, fresh or cached
    pub payload: R,
    /// True when served from the cache without calling upstream
    pub from_cache: bool,
    /// Index of the attempt that succeeded; 0 for cache hits
    pub retry_count: u32,
}

/// Runs an external call with cache-first lookup and bounded linear-backoff
/// retries.
///
/// Concurrent identical requests are not coalesced: each caller that misses
/// the cache performs its own upstream call.
#[derive(Debug, Clone)]
pub struct RetryableInvoker<R> {
    cache: Arc<TtlCache<R>>,
    policy: RetryPolicy,
}

impl<R> RetryableInvoker<R>
where
    R: Clone + Send + Sync + 'static,
{
    pub fn new(cache: Arc<TtlCache<R>>, policy: RetryPolicy) -> Self {
        Self { cache, policy }
    }

    pub fn cache(&self) -> &Arc<TtlCache<R>> {
        &self.cache
    }

    pub fn policy(&self) -> RetryPolicy {
        self.policy
    }

    /// Invokes `call` for `request`, consulting the cache first.
    ///
    /// `call` is invoked once per attempt. A failure that is not transient
    /// (see [`RetryableError`]), or that happens on the last allowed attempt,
    /// is returned unchanged as [`InvokeError::Call`].
    pub async fn invoke<Q, F, Fut, E>(
        &self,
        request: &Q,
        mut call: F,
        options: InvokeOptions,
    ) -> Result<InvocationResult<R>, InvokeError<E>>
    where
        Q: CacheKeyParts + ?Sized,
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<R, E>>,
        E: RetryableError,
    {
        let policy = options.policy(self.policy);

        let key = if options.enable_cache {
            let key = match options.cache_key {
                Some(key) => key,
                None => build_key(request)?,
            };
            if let Some(payload) = self.cache.get(&key).await {
                info!(cache = %self.cache.name(), key = %short_key(&key), "Cache hit");
                return Ok(InvocationResult {
                    payload,
                    from_cache: true,
                    retry_count: 0,
                });
            }
            Some(key)
        } else {
            None
        };

        let mut attempt: u32 = 0;
        loop {
            if attempt > 0 {
                tokio::time::sleep(policy.delay_before(attempt)).await;
            }

            match call().await {
                Ok(payload) => {
                    if let Some(key) = key {
                        self.cache
                            .set(key, payload.clone(), options.cache_ttl)
                            .await;
                    }
                    return Ok(InvocationResult {
                        payload,
                        from_cache: false,
                        retry_count: attempt,
                    });
                }
                Err(e) => {
                    let retryable = e.is_retryable();
                    let attempts = attempt.saturating_add(1);

                    if !retryable || attempt >= policy.max_retries {
                        error!(
                            attempts,
                            retryable,
                            error = %e,
                            "External call failed"
                        );
                        return Err(InvokeError::Call(e));
                    }

                    warn!(
                        attempt = attempts,
                        max_retries = policy.max_retries,
                        delay_ms = policy.delay_before(attempts).as_millis() as u64,
                        error = %e,
                        "Retryable failure, retrying"
                    );
                    attempt = attempts;
                }
            }
        }
    }

    /// Removes one key, or every key when `key` is `None`.
    ///
    /// Returns the number of entries removed.
    pub async fn clear_cache(&self, key: Option<&str>) -> usize {
        match key {
            Some(key) => usize::from(self.cache.delete(key).await),
            None => self.cache.clear().await,
        }
    }

    pub async fn cache_stats(&self) -> CacheStats {
        self.cache.stats().await
    }
}

fn short_key(key: &str) -> &str {
    key.get(..12).unwrap_or(key)
}
