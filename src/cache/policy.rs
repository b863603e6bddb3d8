//! Cache Policy Module
//!
//! Admission, TTL expiry and size/count-bounded LRU eviction. Everything here
//! is pure decision logic: callers hand in metadata and a timestamp, and get
//! back a plan that the cache manager applies against the store.

use std::cmp::Ordering;
use std::time::Duration;

use crate::cache::{CacheEntry, EntryMeta};
use crate::error::{CacheError, Result};

// == Capacity Budget ==
/// Process-wide capacity ceilings. Immutable once built.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CapacityBudget {
    max_total_bytes: u64,
    max_entry_count: usize,
}

impl CapacityBudget {
    /// A budget always admits at least one entry, so `max_entry_count` is
    /// raised to 1 when given as 0.
    pub fn new(max_total_bytes: u64, max_entry_count: usize) -> Self {
        Self {
            max_total_bytes,
            max_entry_count: max_entry_count.max(1),
        }
    }

    pub fn max_total_bytes(&self) -> u64 {
        self.max_total_bytes
    }

    pub fn max_entry_count(&self) -> usize {
        self.max_entry_count
    }
}

impl Default for CapacityBudget {
    fn default() -> Self {
        Self::new(100 * 1024 * 1024, 1000)
    }
}

// == Eviction Plan ==
/// Keys to remove before a new entry can be written.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EvictionPlan {
    /// Entries already past their TTL
    pub expired: Vec<String>,
    /// Live entries evicted in LRU order
    pub evicted: Vec<String>,
    /// The incoming key overwrites a live entry
    pub replaces_existing: bool,
}

impl EvictionPlan {
    pub fn is_empty(&self) -> bool {
        self.expired.is_empty() && self.evicted.is_empty()
    }

    /// All keys to delete, expired ones first.
    pub fn removals(&self) -> impl Iterator<Item = &String> {
        self.expired.iter().chain(self.evicted.iter())
    }
}

// == Cache Policy ==
#[derive(Debug, Clone, Copy)]
pub struct CachePolicy {
    budget: CapacityBudget,
    default_ttl: Duration,
}

impl CachePolicy {
    pub fn new(budget: CapacityBudget, default_ttl: Duration) -> Self {
        Self {
            budget,
            default_ttl,
        }
    }

    pub fn budget(&self) -> &CapacityBudget {
        &self.budget
    }

    pub fn default_ttl(&self) -> Duration {
        self.default_ttl
    }

    /// TTL in milliseconds, never zero so that `expires_at > created_at`.
    fn ttl_ms(&self) -> u64 {
        (self.default_ttl.as_millis() as u64).max(1)
    }

    // == Liveness ==
    pub fn is_live(&self, meta: &EntryMeta, now: u64) -> bool {
        !meta.is_expired(now)
    }

    // == Admission ==
    /// Rejects payloads that could never fit, even in an empty cache.
    pub fn admit(&self, size_bytes: u64) -> Result<()> {
        if size_bytes > self.budget.max_total_bytes {
            return Err(CacheError::EntryTooLarge {
                size: size_bytes,
                limit: self.budget.max_total_bytes,
            });
        }
        Ok(())
    }

    // == Insertion Planning ==
    /// Decides which entries must go before `key` (of `size_bytes`) is written.
    ///
    /// Expired entries are always purged. A live entry with the same key is
    /// replaced rather than evicted, so its size is not counted. Remaining
    /// live entries are evicted in LRU order until both ceilings hold.
    pub fn plan_insertion(
        &self,
        existing: &[EntryMeta],
        key: &str,
        size_bytes: u64,
        now: u64,
    ) -> Result<EvictionPlan> {
        self.admit(size_bytes)?;

        let mut plan = EvictionPlan::default();
        let mut live: Vec<&EntryMeta> = Vec::with_capacity(existing.len());

        for meta in existing {
            if meta.is_expired(now) {
                plan.expired.push(meta.key.clone());
            } else if meta.key == key {
                plan.replaces_existing = true;
            } else {
                live.push(meta);
            }
        }

        let mut total_bytes: u64 = live.iter().map(|m| m.size_bytes).sum();
        let mut count = live.len();

        live.sort_by(|a, b| lru_order(a, b));
        let mut candidates = live.into_iter();

        while total_bytes.saturating_add(size_bytes) > self.budget.max_total_bytes
            || count + 1 > self.budget.max_entry_count
        {
            let Some(victim) = candidates.next() else {
                break;
            };
            total_bytes -= victim.size_bytes;
            count -= 1;
            plan.evicted.push(victim.key.clone());
        }

        Ok(plan)
    }

    // == Entry Construction ==
    pub fn new_entry(&self, key: impl Into<String>, payload: Vec<u8>, now: u64) -> CacheEntry {
        CacheEntry {
            meta: EntryMeta {
                key: key.into(),
                size_bytes: payload.len() as u64,
                created_at: now,
                expires_at: now.saturating_add(self.ttl_ms()),
                last_accessed_at: now,
            },
            payload,
        }
    }
}

impl Default for CachePolicy {
    fn default() -> Self {
        Self::new(CapacityBudget::default(), Duration::from_secs(3600))
    }
}

/// Least recently used first. Ties fall back to creation time, then key, so
/// eviction is deterministic.
pub fn lru_order(a: &EntryMeta, b: &EntryMeta) -> Ordering {
    a.last_accessed_at
        .cmp(&b.last_accessed_at)
        .then(a.created_at.cmp(&b.created_at))
        .then_with(|| a.key.cmp(&b.key))
}
