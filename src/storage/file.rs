//! Directory-backed durable store.
//!
//! Each entry lives in its own `<id>.json` record holding key, metadata and
//! payload. Metadata is indexed in memory at open time so enumeration never
//! touches the disk.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::fs;
use tokio::sync::RwLock;
use tracing::{debug, warn};

use crate::cache::{CacheEntry, EntryMeta};
use crate::error::{CacheError, Result};
use crate::storage::{KeyPattern, KvStore};

const RECORD_EXT: &str = "json";

#[derive(Debug)]
struct Slot {
    meta: EntryMeta,
    path: PathBuf,
}

#[derive(Debug, Default)]
struct Index {
    slots: HashMap<String, Slot>,
    next_id: u64,
}

impl Index {
    /// Removes the record file, then the slot. A failed removal keeps the
    /// slot so the index never forgets a file that is still on disk.
    async fn remove(&mut self, key: &str) -> Result<bool> {
        let Some(slot) = self.slots.get(key) else {
            return Ok(false);
        };
        FileStore::remove_record(&slot.path).await?;
        self.slots.remove(key);
        Ok(true)
    }
}

/// Durable store rooted at a directory.
#[derive(Debug)]
pub struct FileStore {
    dir: PathBuf,
    index: RwLock<Index>,
}

impl FileStore {
    /// Opens (creating if needed) the store directory and indexes its records.
    ///
    /// Unreadable records are skipped with a warning. Failure to create or
    /// list the directory is `StorageUnavailable`.
    pub async fn open(dir: impl AsRef<Path>) -> Result<Self> {
        let dir = dir.as_ref().to_path_buf();
        fs::create_dir_all(&dir)
            .await
            .map_err(|e| unavailable(&dir, e))?;

        let mut index = Index::default();
        let mut listing = fs::read_dir(&dir).await.map_err(|e| unavailable(&dir, e))?;

        while let Some(item) = listing.next_entry().await.map_err(|e| unavailable(&dir, e))? {
            let path = item.path();
            if path.extension().and_then(|e| e.to_str()) != Some(RECORD_EXT) {
                continue;
            }
            let Some(id) = record_id(&path) else {
                continue;
            };
            index.next_id = index.next_id.max(id.saturating_add(1));

            match read_record(&path).await {
                Ok(entry) => {
                    index.slots.insert(
                        entry.meta.key.clone(),
                        Slot {
                            meta: entry.meta,
                            path,
                        },
                    );
                }
                Err(e) => warn!("Skipping unreadable cache record {}: {}", path.display(), e),
            }
        }

        debug!(
            "Opened file store at {} with {} entries",
            dir.display(),
            index.slots.len()
        );

        Ok(Self {
            dir,
            index: RwLock::new(index),
        })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    async fn write_record(path: &Path, entry: &CacheEntry) -> Result<()> {
        let bytes = serde_json::to_vec(entry)?;
        let tmp = path.with_extension("tmp");
        fs::write(&tmp, &bytes).await?;
        fs::rename(&tmp, path).await?;
        Ok(())
    }

    async fn remove_record(path: &Path) -> Result<()> {
        match fs::remove_file(path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

#[async_trait]
impl KvStore for FileStore {
    async fn get(&self, key: &str) -> Result<Option<CacheEntry>> {
        let index = self.index.read().await;
        let Some(slot) = index.slots.get(key) else {
            return Ok(None);
        };

        let mut entry = read_record(&slot.path).await?;
        // The index holds the latest access time.
        entry.meta = slot.meta.clone();
        Ok(Some(entry))
    }

    async fn set(&self, entry: CacheEntry) -> Result<()> {
        let mut index = self.index.write().await;

        let path = match index.slots.get(&entry.meta.key) {
            Some(slot) => slot.path.clone(),
            None => {
                let id = index.next_id;
                index.next_id += 1;
                self.dir.join(format!("{:016x}.{}", id, RECORD_EXT))
            }
        };

        Self::write_record(&path, &entry).await?;
        index.slots.insert(
            entry.meta.key.clone(),
            Slot {
                meta: entry.meta,
                path,
            },
        );
        Ok(())
    }

    async fn touch(&self, key: &str, accessed_at: u64) -> Result<bool> {
        let mut index = self.index.write().await;
        let Some(slot) = index.slots.get_mut(key) else {
            return Ok(false);
        };

        let mut entry = read_record(&slot.path).await?;
        entry.meta = slot.meta.clone();
        entry.meta.last_accessed_at = accessed_at;
        Self::write_record(&slot.path, &entry).await?;
        slot.meta.last_accessed_at = accessed_at;
        Ok(true)
    }

    async fn delete(&self, key: &str) -> Result<bool> {
        let mut index = self.index.write().await;
        index.remove(key).await
    }

    async fn delete_if_expires_at(&self, key: &str, expires_at: u64) -> Result<bool> {
        let mut index = self.index.write().await;
        let stale = index
            .slots
            .get(key)
            .map_or(false, |slot| slot.meta.expires_at == expires_at);
        if !stale {
            return Ok(false);
        }
        index.remove(key).await
    }

    async fn delete_matching(&self, pattern: &str) -> Result<usize> {
        let pattern = KeyPattern::parse(pattern);
        let mut index = self.index.write().await;

        let keys: Vec<String> = index
            .slots
            .keys()
            .filter(|k| pattern.matches(k))
            .cloned()
            .collect();

        let mut removed = 0;
        for key in &keys {
            if index.remove(key).await? {
                removed += 1;
            }
        }
        Ok(removed)
    }

    async fn enumerate(&self) -> Result<Vec<EntryMeta>> {
        let index = self.index.read().await;
        Ok(index.slots.values().map(|s| s.meta.clone()).collect())
    }

    async fn clear(&self) -> Result<usize> {
        let mut index = self.index.write().await;
        let keys: Vec<String> = index.slots.keys().cloned().collect();

        let mut removed = 0;
        for key in &keys {
            if index.remove(key).await? {
                removed += 1;
            }
        }
        Ok(removed)
    }
}

async fn read_record(path: &Path) -> Result<CacheEntry> {
    let bytes = fs::read(path).await?;
    Ok(serde_json::from_slice(&bytes)?)
}

fn record_id(path: &Path) -> Option<u64> {
    let stem = path.file_stem()?.to_str()?;
    u64::from_str_radix(stem, 16).ok()
}

fn unavailable(dir: &Path, err: std::io::Error) -> CacheError {
    CacheError::StorageUnavailable(format!("{}: {}", dir.display(), err))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn entry(key: &str, payload: &[u8], accessed: u64) -> CacheEntry {
        CacheEntry {
            meta: EntryMeta {
                key: key.to_string(),
                size_bytes: payload.len() as u64,
                created_at: 0,
                expires_at: 1_000,
                last_accessed_at: accessed,
            },
            payload: payload.to_vec(),
        }
    }

    #[tokio::test]
    async fn test_set_get_survives_reopen() {
        let dir = TempDir::new().unwrap();

        {
            let store = FileStore::open(dir.path()).await.unwrap();
            store.set(entry("q:1", b"[1,2,3]", 5)).await.unwrap();
            store.set(entry("q:2", b"{}", 6)).await.unwrap();
            assert!(store.touch("q:1", 9).await.unwrap());
        }

        let store = FileStore::open(dir.path()).await.unwrap();
        let got = store.get("q:1").await.unwrap().unwrap();
        assert_eq!(got.payload, b"[1,2,3]");
        assert_eq!(got.meta.last_accessed_at, 9);
        assert_eq!(store.enumerate().await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_overwrite_reuses_record() {
        let dir = TempDir::new().unwrap();
        let store = FileStore::open(dir.path()).await.unwrap();

        store.set(entry("k", b"1", 0)).await.unwrap();
        store.set(entry("k", b"22", 1)).await.unwrap();

        let files = std::fs::read_dir(dir.path()).unwrap().count();
        assert_eq!(files, 1);
        assert_eq!(store.get("k").await.unwrap().unwrap().payload, b"22");
    }

    #[tokio::test]
    async fn test_delete_matching_and_clear() {
        let dir = TempDir::new().unwrap();
        let store = FileStore::open(dir.path()).await.unwrap();

        store.set(entry("orders:a", b"1", 0)).await.unwrap();
        store.set(entry("orders:b", b"1", 0)).await.unwrap();
        store.set(entry("users:a", b"1", 0)).await.unwrap();

        assert_eq!(store.delete_matching("orders").await.unwrap(), 2);
        assert!(store.get("orders:a").await.unwrap().is_none());
        assert!(store.delete("users:a").await.unwrap());
        assert!(!store.delete("users:a").await.unwrap());

        store.set(entry("x", b"1", 0)).await.unwrap();
        assert_eq!(store.clear().await.unwrap(), 1);
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[tokio::test]
    async fn test_delete_if_expires_at() {
        let dir = TempDir::new().unwrap();
        let store = FileStore::open(dir.path()).await.unwrap();
        store.set(entry("k", b"1", 0)).await.unwrap();

        assert!(!store.delete_if_expires_at("k", 5).await.unwrap());
        assert!(store.get("k").await.unwrap().is_some());
        assert!(store.delete_if_expires_at("k", 1_000).await.unwrap());
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[tokio::test]
    async fn test_failed_removal_keeps_index_in_step_with_disk() {
        let dir = TempDir::new().unwrap();
        let store = FileStore::open(dir.path()).await.unwrap();
        store.set(entry("a", b"1", 0)).await.unwrap();
        store.set(entry("b", b"1", 0)).await.unwrap();

        // A directory in place of b's record makes its removal fail
        let b_path = store.index.read().await.slots["b"].path.clone();
        std::fs::remove_file(&b_path).unwrap();
        std::fs::create_dir(&b_path).unwrap();

        assert!(store.clear().await.is_err());
        assert!(store.delete_matching("b").await.is_err());

        let indexed = store.enumerate().await.unwrap();
        let on_disk = std::fs::read_dir(dir.path()).unwrap().count();
        assert!(indexed.iter().any(|m| m.key == "b"));
        assert_eq!(indexed.len(), on_disk);
    }

    #[tokio::test]
    async fn test_corrupt_record_is_skipped() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("0000000000000007.json"), b"not json").unwrap();

        let store = FileStore::open(dir.path()).await.unwrap();
        assert!(store.enumerate().await.unwrap().is_empty());

        // New records must not collide with the skipped file name
        store.set(entry("k", b"1", 0)).await.unwrap();
        assert!(store.get("k").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_open_on_file_path_is_unavailable() {
        let dir = TempDir::new().unwrap();
        let blocker = dir.path().join("blocker");
        std::fs::write(&blocker, b"x").unwrap();

        let result = FileStore::open(&blocker).await;
        assert!(matches!(result, Err(CacheError::StorageUnavailable(_))));
    }
}
