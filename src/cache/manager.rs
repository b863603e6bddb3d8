//! Cache Manager Module
//!
//! The facade the query subsystem talks to. Combines a store adapter, the
//! policy engine and session counters. Storage problems never escape the
//! read and write paths: a failed read is a miss, a failed write is skipped.

use std::sync::Arc;

use serde::{de::DeserializeOwned, Serialize};
use serde_json::Value;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::cache::snapshot::{CacheSnapshot, ImportReport, SnapshotEntry};
use crate::cache::{
    lru_order, CacheMetrics, CachePolicy, Clock, SessionCounters, SystemClock, MAX_KEY_LENGTH,
};
use crate::error::{CacheError, Result};
use crate::storage::KvStore;

// == Cache Manager ==
/// Bounded query-result cache with TTL and LRU eviction.
///
/// Build one per application and share it behind an `Arc`.
pub struct CacheManager {
    /// Backing store, touched by nothing else
    store: Arc<dyn KvStore>,
    /// Admission, expiry and eviction rules
    policy: CachePolicy,
    /// Time source
    clock: Arc<dyn Clock>,
    /// Session counters
    counters: Arc<SessionCounters>,
    /// Serializes the insertion algorithm so concurrent puts cannot overshoot
    admission: Mutex<()>,
}

impl CacheManager {
    // == Constructor ==
    pub fn new(store: Arc<dyn KvStore>, policy: CachePolicy) -> Self {
        Self::with_clock(store, policy, Arc::new(SystemClock))
    }

    pub fn with_clock(store: Arc<dyn KvStore>, policy: CachePolicy, clock: Arc<dyn Clock>) -> Self {
        Self {
            store,
            policy,
            clock,
            counters: Arc::new(SessionCounters::new()),
            admission: Mutex::new(()),
        }
    }

    pub fn policy(&self) -> &CachePolicy {
        &self.policy
    }

    // == Get ==
    /// Returns the cached result for `fingerprint`, or `None` on a miss.
    ///
    /// Expired entries, storage failures and payloads that do not decode as
    /// `T` all count as misses.
    pub async fn get_cached_result<T: DeserializeOwned>(&self, fingerprint: &str) -> Option<T> {
        let Some(payload) = self.lookup(fingerprint).await else {
            self.counters.record_miss();
            debug!("Cache miss: {}", fingerprint);
            return None;
        };

        match serde_json::from_slice(&payload) {
            Ok(value) => {
                self.counters.record_hit();
                debug!("Cache hit: {}", fingerprint);
                Some(value)
            }
            Err(e) => {
                self.counters.record_miss();
                warn!("Cached payload for {} failed to decode: {}", fingerprint, e);
                None
            }
        }
    }

    async fn lookup(&self, key: &str) -> Option<Vec<u8>> {
        let now = self.clock.now_ms();

        let entry = match self.store.get(key).await {
            Ok(Some(entry)) => entry,
            Ok(None) => return None,
            Err(e) => {
                warn!("Cache lookup for {} degraded to miss: {}", key, e);
                return None;
            }
        };

        if entry.meta.is_expired(now) {
            self.spawn_expired_delete(key, entry.meta.expires_at);
            return None;
        }

        if let Err(e) = self.store.touch(key, now).await {
            warn!("Failed to record access for {}: {}", key, e);
        }
        Some(entry.payload)
    }

    /// Deletes a stale entry off the lookup path. Without a tokio runtime the
    /// entry is left for the next purge.
    ///
    /// Only the entry that was seen expired is removed: a put for the same
    /// fingerprint that lands first keeps its fresh entry.
    fn spawn_expired_delete(&self, key: &str, expires_at: u64) {
        let Ok(handle) = tokio::runtime::Handle::try_current() else {
            return;
        };
        let store = Arc::clone(&self.store);
        let counters = Arc::clone(&self.counters);
        let key = key.to_string();

        handle.spawn(async move {
            match store.delete_if_expires_at(&key, expires_at).await {
                Ok(true) => {
                    counters.record_expirations(1);
                    debug!("Removed expired entry {}", key);
                }
                Ok(false) => {}
                Err(e) => debug!("Failed to remove expired entry {}: {}", key, e),
            }
        });
    }

    // == Put ==
    /// Caches `result` under `fingerprint`. Returns `true` if it was stored.
    ///
    /// Oversized or unserializable results and storage failures are logged
    /// and skipped; the caller keeps using its uncached result.
    pub async fn put_cached_result<T: Serialize + ?Sized>(
        &self,
        fingerprint: &str,
        result: &T,
    ) -> bool {
        match self.try_put_cached_result(fingerprint, result).await {
            Ok(()) => true,
            Err(e @ CacheError::StorageUnavailable(_)) => {
                warn!("Skipping cache write for {}: {}", fingerprint, e);
                false
            }
            Err(e) => {
                debug!("Skipping cache write for {}: {}", fingerprint, e);
                false
            }
        }
    }

    /// Like [`put_cached_result`](Self::put_cached_result) but reports why a
    /// write was skipped.
    pub async fn try_put_cached_result<T: Serialize + ?Sized>(
        &self,
        fingerprint: &str,
        result: &T,
    ) -> Result<()> {
        validate_fingerprint(fingerprint)?;
        let payload = serde_json::to_vec(result)?;
        self.insert(fingerprint, payload).await
    }

    async fn insert(&self, key: &str, payload: Vec<u8>) -> Result<()> {
        self.insert_backdated(key, payload, 0).await
    }

    /// Inserts with `last_accessed_at` set `backdate_ms` before now, which
    /// lets an import keep the relative access order of its entries.
    async fn insert_backdated(
        &self,
        key: &str,
        payload: Vec<u8>,
        backdate_ms: u64,
    ) -> Result<()> {
        let size = payload.len() as u64;
        self.policy.admit(size)?;

        let _guard = self.admission.lock().await;
        let now = self.clock.now_ms();
        let existing = self.store.enumerate().await?;
        let plan = self.policy.plan_insertion(&existing, key, size, now)?;

        for stale in &plan.expired {
            self.store.delete(stale).await?;
        }
        for victim in &plan.evicted {
            self.store.delete(victim).await?;
            debug!("Evicted {} to admit {}", victim, key);
        }
        self.counters.record_expirations(plan.expired.len());
        self.counters.record_evictions(plan.evicted.len());

        let mut entry = self.policy.new_entry(key, payload, now);
        entry.meta.last_accessed_at = now.saturating_sub(backdate_ms);
        self.store.set(entry).await
    }

    // == Invalidate ==
    /// Removes every entry whose fingerprint matches `pattern`.
    pub async fn invalidate(&self, pattern: &str) -> Result<usize> {
        let removed = self.store.delete_matching(pattern).await?;
        info!("Invalidated {} entries matching '{}'", removed, pattern);
        Ok(removed)
    }

    // == Clear ==
    /// Removes all entries. Session counters are kept.
    pub async fn clear_all(&self) -> Result<usize> {
        let _guard = self.admission.lock().await;
        let removed = self.store.clear().await?;
        info!("Cleared {} cache entries", removed);
        Ok(removed)
    }

    // == Purge ==
    /// Physically removes every expired entry.
    pub async fn purge_expired(&self) -> Result<usize> {
        let _guard = self.admission.lock().await;
        let now = self.clock.now_ms();
        let expired: Vec<String> = self
            .store
            .enumerate()
            .await?
            .into_iter()
            .filter(|m| m.is_expired(now))
            .map(|m| m.key)
            .collect();

        let mut removed = 0;
        for key in &expired {
            if self.store.delete(key).await? {
                removed += 1;
            }
        }
        self.counters.record_expirations(removed);
        Ok(removed)
    }

    // == Metrics ==
    /// Counters plus size and count of live entries.
    pub async fn get_metrics(&self) -> CacheMetrics {
        let now = self.clock.now_ms();
        let (total_size, entry_count) = match self.store.enumerate().await {
            Ok(metas) => metas
                .iter()
                .filter(|m| self.policy.is_live(m, now))
                .fold((0u64, 0usize), |(bytes, count), m| {
                    (bytes + m.size_bytes, count + 1)
                }),
            Err(e) => {
                warn!("Cache metrics without storage totals: {}", e);
                (0, 0)
            }
        };
        self.counters.snapshot(total_size, entry_count)
    }

    // == Export ==
    /// Serializes every live entry into a snapshot document.
    pub async fn export_snapshot(&self) -> Result<Vec<u8>> {
        let now = self.clock.now_ms();
        let metas = self.store.enumerate().await?;
        let mut entries = Vec::with_capacity(metas.len());

        for meta in metas.into_iter().filter(|m| !m.is_expired(now)) {
            let Some(entry) = self.store.get(&meta.key).await? else {
                continue;
            };
            match serde_json::from_slice::<Value>(&entry.payload) {
                Ok(payload) => entries.push(SnapshotEntry::new(entry.meta, payload)),
                Err(e) => warn!("Leaving {} out of snapshot: {}", meta.key, e),
            }
        }

        info!("Exported {} cache entries", entries.len());
        CacheSnapshot::new(entries).to_bytes()
    }

    // == Import ==
    /// Loads a snapshot produced by [`export_snapshot`](Self::export_snapshot).
    ///
    /// The whole document is validated before anything is written. Entries
    /// then go through the normal insertion path, least recently used first,
    /// so budget rules apply and may evict existing entries. Imported access
    /// times are spaced one millisecond apart and end at now, so eviction
    /// order among imported entries follows the snapshot.
    pub async fn import_snapshot(&self, bytes: &[u8]) -> Result<ImportReport> {
        let snapshot = CacheSnapshot::from_bytes(bytes)?;

        let mut staged = Vec::with_capacity(snapshot.entries.len());
        for entry in &snapshot.entries {
            validate_fingerprint(&entry.key)
                .map_err(|e| CacheError::ImportMalformed(e.to_string()))?;
            let payload = serde_json::to_vec(&entry.payload)
                .map_err(|e| CacheError::ImportMalformed(e.to_string()))?;
            staged.push((entry, payload));
        }
        staged.sort_by(|(a, _), (b, _)| {
            a.last_accessed_at
                .cmp(&b.last_accessed_at)
                .then(a.created_at.cmp(&b.created_at))
                .then_with(|| a.key.cmp(&b.key))
        });

        let mut report = ImportReport::default();
        let last = staged.len().saturating_sub(1);
        for (i, (entry, payload)) in staged.into_iter().enumerate() {
            let backdate_ms = (last - i) as u64;
            match self.insert_backdated(&entry.key, payload, backdate_ms).await {
                Ok(()) => report.imported += 1,
                Err(CacheError::EntryTooLarge { .. }) => report.skipped += 1,
                Err(e) => return Err(e),
            }
        }

        info!(
            "Imported {} cache entries ({} skipped as too large)",
            report.imported, report.skipped
        );
        Ok(report)
    }

    /// Fingerprints of live entries, least recently used first.
    pub async fn lru_keys(&self) -> Result<Vec<String>> {
        let now = self.clock.now_ms();
        let mut metas: Vec<_> = self
            .store
            .enumerate()
            .await?
            .into_iter()
            .filter(|m| !m.is_expired(now))
            .collect();
        metas.sort_by(lru_order);
        Ok(metas.into_iter().map(|m| m.key).collect())
    }
}

fn validate_fingerprint(fingerprint: &str) -> Result<()> {
    if fingerprint.is_empty() {
        return Err(CacheError::InvalidRequest(
            "Fingerprint cannot be empty".to_string(),
        ));
    }
    if fingerprint.len() > MAX_KEY_LENGTH {
        return Err(CacheError::InvalidRequest(format!(
            "Fingerprint exceeds maximum length of {} bytes",
            MAX_KEY_LENGTH
        )));
    }
    Ok(())
}
