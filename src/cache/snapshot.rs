//! Snapshot Module
//!
//! JSON document used to download and re-upload the whole cache.

use std::collections::HashSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::cache::EntryMeta;
use crate::error::{CacheError, Result};

/// Current snapshot format version.
pub const SNAPSHOT_VERSION: u32 = 1;

// == Snapshot ==
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheSnapshot {
    pub version: u32,
    /// RFC 3339 export time
    pub exported_at: String,
    pub entries: Vec<SnapshotEntry>,
}

/// One exported entry. The payload is embedded as JSON rather than bytes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SnapshotEntry {
    pub key: String,
    pub payload: Value,
    #[serde(default)]
    pub size_bytes: u64,
    #[serde(default)]
    pub created_at: u64,
    #[serde(default)]
    pub expires_at: u64,
    #[serde(default)]
    pub last_accessed_at: u64,
}

impl SnapshotEntry {
    pub fn new(meta: EntryMeta, payload: Value) -> Self {
        Self {
            key: meta.key,
            payload,
            size_bytes: meta.size_bytes,
            created_at: meta.created_at,
            expires_at: meta.expires_at,
            last_accessed_at: meta.last_accessed_at,
        }
    }
}

/// Outcome of an import.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ImportReport {
    /// Entries written to the cache
    pub imported: usize,
    /// Entries larger than the whole budget
    pub skipped: usize,
}

impl CacheSnapshot {
    /// Builds a snapshot stamped with the current time, entries sorted by key.
    pub fn new(mut entries: Vec<SnapshotEntry>) -> Self {
        entries.sort_by(|a, b| a.key.cmp(&b.key));
        Self {
            version: SNAPSHOT_VERSION,
            exported_at: Utc::now().to_rfc3339(),
            entries,
        }
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        Ok(serde_json::to_vec(self)?)
    }

    /// Parses and fully validates a snapshot.
    ///
    /// Any problem is `ImportMalformed`; nothing is returned for partial use.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let snapshot: CacheSnapshot = serde_json::from_slice(bytes)
            .map_err(|e| CacheError::ImportMalformed(e.to_string()))?;
        snapshot.validate()?;
        Ok(snapshot)
    }

    fn validate(&self) -> Result<()> {
        if self.version != SNAPSHOT_VERSION {
            return Err(CacheError::ImportMalformed(format!(
                "unsupported snapshot version {} (expected {})",
                self.version, SNAPSHOT_VERSION
            )));
        }

        DateTime::parse_from_rfc3339(&self.exported_at).map_err(|e| {
            CacheError::ImportMalformed(format!(
                "invalid exported_at '{}': {}",
                self.exported_at, e
            ))
        })?;

        let mut seen = HashSet::with_capacity(self.entries.len());
        for (i, entry) in self.entries.iter().enumerate() {
            if entry.key.is_empty() {
                return Err(CacheError::ImportMalformed(format!(
                    "entry {} has an empty key",
                    i
                )));
            }
            if !seen.insert(entry.key.as_str()) {
                return Err(CacheError::ImportMalformed(format!(
                    "duplicate key '{}'",
                    entry.key
                )));
            }
        }
        Ok(())
    }
}
