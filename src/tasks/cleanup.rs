//! TTL Cleanup Task
//!
//! Background task that periodically purges expired cache entries.

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::cache::CacheManager;

/// Spawns a background task that periodically purges expired entries.
///
/// Expired entries already read as misses, so this only reclaims space.
/// An interval of 0 is treated as 1 second. A failed purge is logged and
/// retried on the next tick.
///
/// Returns the task handle so it can be aborted on shutdown.
pub fn spawn_cleanup_task(cache: Arc<CacheManager>, cleanup_interval_secs: u64) -> JoinHandle<()> {
    let interval_secs = cleanup_interval_secs.max(1);
    let interval = Duration::from_secs(interval_secs);

    tokio::spawn(async move {
        info!(
            "Starting TTL cleanup task with interval of {} seconds",
            interval_secs
        );

        loop {
            tokio::time::sleep(interval).await;

            match cache.purge_expired().await {
                Ok(0) => debug!("TTL cleanup: no expired entries found"),
                Ok(removed) => info!("TTL cleanup: removed {} expired entries", removed),
                Err(e) => warn!("TTL cleanup failed: {}", e),
            }
        }
    })
}
