//! Storage Module
//!
//! Asynchronous key-value store adapters that hold cache entries.
//!
//! # Backends
//! - `MemoryStore`: in-process map, lost on restart
//! - `FileStore`: one JSON record per entry under a directory
//! - `DisabledStore`: always unavailable, the cache then only ever misses
//!
//! Only the cache manager talks to a store directly.

mod disabled;
mod file;
mod memory;
mod pattern;

use async_trait::async_trait;

use crate::cache::{CacheEntry, EntryMeta};
use crate::error::Result;

pub use disabled::DisabledStore;
pub use file::FileStore;
pub use memory::MemoryStore;
pub use pattern::KeyPattern;

/// Durable or in-memory store for cache entries.
///
/// All operations are async and fallible. A failure means the store cannot
/// currently be used; callers treat it as a miss or a skipped write. No
/// ordering is guaranteed between concurrent writes.
#[async_trait]
pub trait KvStore: Send + Sync {
    /// Get an entry by key, expired or not.
    async fn get(&self, key: &str) -> Result<Option<CacheEntry>>;

    /// Store an entry, overwriting any entry with the same key.
    async fn set(&self, entry: CacheEntry) -> Result<()>;

    /// Update `last_accessed_at`. Returns `false` if the key is absent.
    async fn touch(&self, key: &str, accessed_at: u64) -> Result<bool>;

    /// Delete one entry. Returns `true` if it existed.
    async fn delete(&self, key: &str) -> Result<bool>;

    /// Delete `key` only while the stored entry still has this `expires_at`.
    ///
    /// A rewrite of the key in the meantime leaves the new entry alone.
    async fn delete_if_expires_at(&self, key: &str, expires_at: u64) -> Result<bool>;

    /// Delete every key matching `pattern` (see [`KeyPattern`]).
    async fn delete_matching(&self, pattern: &str) -> Result<usize>;

    /// Metadata of every stored entry, without payloads.
    async fn enumerate(&self) -> Result<Vec<EntryMeta>>;

    /// Remove everything. Returns the number of entries removed.
    async fn clear(&self) -> Result<usize>;
}
