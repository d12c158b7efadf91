//! Shared TTL Cache
//!
//! Async, shareable handle over a [`CacheStore`] that owns its background
//! sweep task. One instance is built per purpose at startup and handed to
//! consumers as `Arc<TtlCache<V>>`.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::runtime::Handle;
use tokio::sync::RwLock;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::cache::{CacheStats, CacheStore};
use crate::tasks::spawn_sweep_task;

// == TTL Cache ==
/// Key/value cache with per-entry expiry and a periodic background sweep.
///
/// Reads re-check expiry themselves, so correctness never depends on the
/// sweep having run. All mutations go through a single `RwLock`.
#[derive(Debug)]
pub struct TtlCache<V> {
    /// Name used in log events and the admin API
    name: String,
    /// Shared entry store
    store: Arc<RwLock<CacheStore<V>>>,
    /// Sweep task handle, `None` once destroyed or when no sweep was started
    sweep: Mutex<Option<JoinHandle<()>>>,
}

impl<V> TtlCache<V>
where
    V: Clone + Send + Sync + 'static,
{
    // == Constructor ==
    /// Creates a cache and starts its sweep task.
    ///
    /// When called outside a tokio runtime no sweep is started; expiry is
    /// then purely lazy.
    ///
    /// # Arguments
    /// * `name` - Cache name for logs
    /// * `default_ttl` - TTL for entries stored without one
    /// * `sweep_interval` - Time between sweep passes
    pub fn new(name: impl Into<String>, default_ttl: Duration, sweep_interval: Duration) -> Self {
        let cache = Self::without_sweep(name, default_ttl);

        match Handle::try_current() {
            Ok(_) => {
                let handle = spawn_sweep_task(
                    Arc::downgrade(&cache.store),
                    sweep_interval,
                    cache.name.clone(),
                );
                if let Ok(mut slot) = cache.sweep.lock() {
                    *slot = Some(handle);
                }
            }
            Err(_) => {
                warn!(cache = %cache.name, "No tokio runtime, cache will expire lazily only");
            }
        }

        cache
    }

    /// Creates a cache with lazy expiry only.
    pub fn without_sweep(name: impl Into<String>, default_ttl: Duration) -> Self {
        Self {
            name: name.into(),
            store: Arc::new(RwLock::new(CacheStore::new(default_ttl.as_millis() as u64))),
            sweep: Mutex::new(None),
        }
    }

    /// Returns the cache name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns true while the background sweep is scheduled.
    pub fn is_sweeping(&self) -> bool {
        self.sweep
            .lock()
            .map(|slot| slot.as_ref().is_some_and(|h| !h.is_finished()))
            .unwrap_or(false)
    }

    // == Set ==
    /// Stores a value under `key`, replacing any previous entry.
    ///
    /// `ttl` falls back to the cache default when `None`.
    pub async fn set(&self, key: impl Into<String>, value: V, ttl: Option<Duration>) {
        let ttl_ms = ttl.map(|d| d.as_millis() as u64);
        self.store.write().await.set(key.into(), value, ttl_ms);
    }

    // == Get ==
    /// Returns the live value for `key`, or `None` if absent or stale.
    ///
    /// Takes the write lock because stale entries are removed on read.
    pub async fn get(&self, key: &str) -> Option<V> {
        self.store.write().await.get(key)
    }

    // == Has ==
    /// Returns true if a live value exists for `key`. Not counted as a hit
    /// or miss.
    pub async fn has(&self, key: &str) -> bool {
        self.store.write().await.has(key)
    }

    // == Delete ==
    /// Removes `key`, returning whether it was present.
    pub async fn delete(&self, key: &str) -> bool {
        self.store.write().await.delete(key)
    }

    // == Clear ==
    /// Removes every entry, returning how many were removed.
    pub async fn clear(&self) -> usize {
        let removed = self.store.write().await.clear();
        debug!(cache = %self.name, removed, "Cache cleared");
        removed
    }

    // == Stats ==
    /// Returns a snapshot taken under the lock.
    pub async fn stats(&self) -> CacheStats {
        self.store.read().await.stats()
    }

    // == Destroy ==
    /// Stops the sweep and clears all entries. Safe to call more than once.
    pub async fn destroy(&self) {
        if let Some(handle) = self.take_sweep() {
            handle.abort();
            info!(cache = %self.name, "Sweep task stopped");
        }
        self.store.write().await.clear();
    }

    fn take_sweep(&self) -> Option<JoinHandle<()>> {
        self.sweep.lock().ok().and_then(|mut slot| slot.take())
    }
}

impl<V> Drop for TtlCache<V> {
    fn drop(&mut self) {
        if let Ok(slot) = self.sweep.get_mut() {
            if let Some(handle) = slot.take() {
                handle.abort();
            }
        }
    }
}
