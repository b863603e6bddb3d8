//! In-memory store backed by a HashMap.

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::cache::{CacheEntry, EntryMeta};
use crate::error::Result;
use crate::storage::{KeyPattern, KvStore};

/// Process-local store. Never fails.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: RwLock<HashMap<String, CacheEntry>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of physically stored entries, expired ones included.
    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }
}

#[async_trait]
impl KvStore for MemoryStore {
    async fn get(&self, key: &str) -> Result<Option<CacheEntry>> {
        Ok(self.entries.read().await.get(key).cloned())
    }

    async fn set(&self, entry: CacheEntry) -> Result<()> {
        self.entries
            .write()
            .await
            .insert(entry.meta.key.clone(), entry);
        Ok(())
    }

    async fn touch(&self, key: &str, accessed_at: u64) -> Result<bool> {
        let mut entries = self.entries.write().await;
        match entries.get_mut(key) {
            Some(entry) => {
                entry.meta.last_accessed_at = accessed_at;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn delete(&self, key: &str) -> Result<bool> {
        Ok(self.entries.write().await.remove(key).is_some())
    }

    async fn delete_if_expires_at(&self, key: &str, expires_at: u64) -> Result<bool> {
        let mut entries = self.entries.write().await;
        match entries.get(key) {
            Some(entry) if entry.meta.expires_at == expires_at => {
                entries.remove(key);
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn delete_matching(&self, pattern: &str) -> Result<usize> {
        let pattern = KeyPattern::parse(pattern);
        let mut entries = self.entries.write().await;
        let before = entries.len();
        entries.retain(|key, _| !pattern.matches(key));
        Ok(before - entries.len())
    }

    async fn enumerate(&self) -> Result<Vec<EntryMeta>> {
        Ok(self
            .entries
            .read()
            .await
            .values()
            .map(|e| e.meta.clone())
            .collect())
    }

    async fn clear(&self) -> Result<usize> {
        let mut entries = self.entries.write().await;
        let count = entries.len();
        entries.clear();
        Ok(count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(key: &str, payload: &[u8]) -> CacheEntry {
        CacheEntry {
            meta: EntryMeta {
                key: key.to_string(),
                size_bytes: payload.len() as u64,
                created_at: 0,
                expires_at: 1_000,
                last_accessed_at: 0,
            },
            payload: payload.to_vec(),
        }
    }

    #[tokio::test]
    async fn test_set_get_overwrite() {
        let store = MemoryStore::new();
        store.set(entry("a", b"1")).await.unwrap();
        store.set(entry("a", b"22")).await.unwrap();

        let got = store.get("a").await.unwrap().unwrap();
        assert_eq!(got.payload, b"22");
        assert_eq!(store.len().await, 1);
        assert!(store.get("missing").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_touch() {
        let store = MemoryStore::new();
        store.set(entry("a", b"1")).await.unwrap();

        assert!(store.touch("a", 42).await.unwrap());
        assert!(!store.touch("b", 42).await.unwrap());
        assert_eq!(store.get("a").await.unwrap().unwrap().meta.last_accessed_at, 42);
    }

    #[tokio::test]
    async fn test_delete_and_delete_matching() {
        let store = MemoryStore::new();
        store.set(entry("orders:1", b"1")).await.unwrap();
        store.set(entry("orders:2", b"1")).await.unwrap();
        store.set(entry("users:1", b"1")).await.unwrap();

        assert!(store.delete("users:1").await.unwrap());
        assert!(!store.delete("users:1").await.unwrap());
        assert_eq!(store.delete_matching("orders:*").await.unwrap(), 2);
        assert!(store.is_empty().await);
    }

    #[tokio::test]
    async fn test_delete_if_expires_at_skips_rewritten_entry() {
        let store = MemoryStore::new();
        store.set(entry("a", b"1")).await.unwrap();

        assert!(!store.delete_if_expires_at("a", 999).await.unwrap());
        assert!(store.delete_if_expires_at("a", 1_000).await.unwrap());
        assert!(!store.delete_if_expires_at("a", 1_000).await.unwrap());
        assert!(store.is_empty().await);
    }

    #[tokio::test]
    async fn test_enumerate_and_clear() {
        let store = MemoryStore::new();
        store.set(entry("a", b"123")).await.unwrap();
        store.set(entry("b", b"45")).await.unwrap();

        let mut metas = store.enumerate().await.unwrap();
        metas.sort_by(|x, y| x.key.cmp(&y.key));
        assert_eq!(metas.len(), 2);
        assert_eq!(metas[0].size_bytes, 3);
        assert_eq!(metas[1].size_bytes, 2);

        assert_eq!(store.clear().await.unwrap(), 2);
        assert!(store.enumerate().await.unwrap().is_empty());
    }
}
