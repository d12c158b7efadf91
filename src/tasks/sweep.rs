//! TTL Sweep Task
//!
//! Background task that periodically removes expired cache entries.

use std::sync::Weak;
use std::time::Duration;

use tokio::sync::RwLock;
use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::cache::CacheStore;

/// Shortest interval the sweep will run at.
const MIN_SWEEP_INTERVAL: Duration = Duration::from_millis(1);

/// Spawns a background task that periodically sweeps expired entries.
///
/// The task sleeps for `interval` between passes and takes the store's write
/// lock only for the duration of a pass. It holds a weak reference, so it
/// stops on its own once the owning cache is dropped; callers abort the
/// returned handle to stop it earlier.
///
/// # Arguments
/// * `store` - Weak reference to the shared store
/// * `interval` - Time between sweep passes
/// * `cache_name` - Name used in log events
///
/// # Example
/// ```ignore
/// let store = Arc::new(RwLock::new(CacheStore::<String>::new(60_000)));
/// let handle = spawn_sweep_task(Arc::downgrade(&store), Duration::from_secs(300), "responses".into());
/// // Later, during shutdown:
/// handle.abort();
/// ```
pub fn spawn_sweep_task<V>(
    store: Weak<RwLock<CacheStore<V>>>,
    interval: Duration,
    cache_name: String,
) -> JoinHandle<()>
where
    V: Clone + Send + Sync + 'static,
{
    let interval = interval.max(MIN_SWEEP_INTERVAL);

    tokio::spawn(async move {
        info!(
            cache = %cache_name,
            interval_ms = interval.as_millis() as u64,
            "Starting TTL sweep task"
        );

        loop {
            tokio::time::sleep(interval).await;

            let Some(store) = store.upgrade() else {
                debug!(cache = %cache_name, "Cache dropped, stopping sweep task");
                break;
            };

            let (removed, remaining) = {
                let mut guard = store.write().await;
                let removed = guard.cleanup_expired();
                (removed, guard.len())
            };

            if removed > 0 {
                info!(cache = %cache_name, removed, remaining, "TTL sweep removed expired entries");
            } else {
                debug!(cache = %cache_name, "TTL sweep: no expired entries found");
            }
        }
    })
}
