//! Store used when no backing storage can be opened.

use async_trait::async_trait;

use crate::cache::{CacheEntry, EntryMeta};
use crate::error::{CacheError, Result};
use crate::storage::KvStore;

/// A store that fails every call with `StorageUnavailable`.
#[derive(Debug, Clone)]
pub struct DisabledStore {
    reason: String,
}

impl DisabledStore {
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }

    fn unavailable<T>(&self) -> Result<T> {
        Err(CacheError::StorageUnavailable(self.reason.clone()))
    }
}

#[async_trait]
impl KvStore for DisabledStore {
    async fn get(&self, _key: &str) -> Result<Option<CacheEntry>> {
        self.unavailable()
    }

    async fn set(&self, _entry: CacheEntry) -> Result<()> {
        self.unavailable()
    }

    async fn touch(&self, _key: &str, _accessed_at: u64) -> Result<bool> {
        self.unavailable()
    }

    async fn delete(&self, _key: &str) -> Result<bool> {
        self.unavailable()
    }

    async fn delete_if_expires_at(&self, _key: &str, _expires_at: u64) -> Result<bool> {
        self.unavailable()
    }

    async fn delete_matching(&self, _pattern: &str) -> Result<usize> {
        self.unavailable()
    }

    async fn enumerate(&self) -> Result<Vec<EntryMeta>> {
        self.unavailable()
    }

    async fn clear(&self) -> Result<usize> {
        self.unavailable()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_every_call_fails() {
        let store = DisabledStore::new("private mode");
        assert!(matches!(
            store.get("k").await,
            Err(CacheError::StorageUnavailable(ref r)) if r == "private mode"
        ));
        assert!(store.enumerate().await.is_err());
        assert!(store.clear().await.is_err());
    }
}
