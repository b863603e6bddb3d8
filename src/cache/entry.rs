//! Cache Entry Module
//!
//! Defines cached query results and the metadata used for TTL and LRU decisions.

use serde::{Deserialize, Serialize};

// == Entry Metadata ==
/// Everything about an entry except its payload.
///
/// Store adapters enumerate metadata without loading payloads, so the policy
/// engine can compute totals and LRU order cheaply.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntryMeta {
    /// Query fingerprint
    pub key: String,
    /// Payload length in bytes
    pub size_bytes: u64,
    /// Creation timestamp (Unix milliseconds)
    pub created_at: u64,
    /// Expiration timestamp (Unix milliseconds)
    pub expires_at: u64,
    /// Last read or write (Unix milliseconds)
    pub last_accessed_at: u64,
}

impl EntryMeta {
    // == Is Expired ==
    /// Checks if the entry has expired at `now`.
    ///
    /// Boundary condition: an entry is expired once `now >= expires_at`.
    pub fn is_expired(&self, now: u64) -> bool {
        now >= self.expires_at
    }

    // == Time To Live ==
    /// Returns remaining TTL in milliseconds, `0` once expired.
    pub fn ttl_remaining_ms(&self, now: u64) -> u64 {
        self.expires_at.saturating_sub(now)
    }
}

// == Cache Entry ==
/// A cached query result: metadata plus the serialized payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheEntry {
    #[serde(flatten)]
    pub meta: EntryMeta,
    pub payload: Vec<u8>,
}

impl CacheEntry {
    pub fn key(&self) -> &str {
        &self.meta.key
    }

    pub fn size_bytes(&self) -> u64 {
        self.meta.size_bytes
    }
}
