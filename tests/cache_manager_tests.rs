//! Integration Tests for the Cache Manager over a durable store
//!
//! Exercises persistence, LRU order and snapshots across store reopen.

use std::sync::Arc;
use std::time::Duration;

use query_cache::{
    cache::{CachePolicy, CapacityBudget, ManualClock},
    storage::FileStore,
    CacheManager,
};
use serde::{Deserialize, Serialize};
use tempfile::TempDir;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct QueryResult {
    columns: Vec<String>,
    rows: Vec<Vec<i64>>,
}

fn result(n: i64) -> QueryResult {
    QueryResult {
        columns: vec!["id".to_string()],
        rows: vec![vec![n]],
    }
}

fn policy(max_entries: usize) -> CachePolicy {
    CachePolicy::new(
        CapacityBudget::new(1024 * 1024, max_entries),
        Duration::from_secs(60),
    )
}

async fn manager(dir: &TempDir, clock: Arc<ManualClock>, max_entries: usize) -> CacheManager {
    let store = FileStore::open(dir.path()).await.unwrap();
    CacheManager::with_clock(Arc::new(store), policy(max_entries), clock)
}

#[tokio::test]
async fn test_results_survive_reopen() {
    let dir = TempDir::new().unwrap();
    let clock = Arc::new(ManualClock::new(1_000));

    {
        let cache = manager(&dir, clock.clone(), 10).await;
        assert!(cache.put_cached_result("q:1", &result(1)).await);
    }

    let cache = manager(&dir, clock, 10).await;
    assert_eq!(
        cache.get_cached_result::<QueryResult>("q:1").await,
        Some(result(1))
    );
}

#[tokio::test]
async fn test_expiry_applies_after_reopen() {
    let dir = TempDir::new().unwrap();
    let clock = Arc::new(ManualClock::new(1_000));

    {
        let cache = manager(&dir, clock.clone(), 10).await;
        cache.put_cached_result("q:1", &result(1)).await;
    }

    clock.advance(60_000);
    let cache = manager(&dir, clock, 10).await;
    assert_eq!(cache.purge_expired().await.unwrap(), 1);
    assert!(cache.get_cached_result::<QueryResult>("q:1").await.is_none());
}

#[tokio::test]
async fn test_refill_after_expired_read_persists() {
    let dir = TempDir::new().unwrap();
    let clock = Arc::new(ManualClock::new(1_000));
    let cache = manager(&dir, clock.clone(), 10).await;

    cache.put_cached_result("q:1", &result(1)).await;
    clock.advance(60_000);
    assert!(cache.get_cached_result::<QueryResult>("q:1").await.is_none());
    assert!(cache.put_cached_result("q:1", &result(2)).await);

    tokio::time::sleep(Duration::from_millis(50)).await;
    assert_eq!(
        cache.get_cached_result::<QueryResult>("q:1").await,
        Some(result(2))
    );
    drop(cache);

    let cache = manager(&dir, clock, 10).await;
    assert_eq!(cache.lru_keys().await.unwrap(), vec!["q:1"]);
}

#[tokio::test]
async fn test_access_order_survives_reopen() {
    let dir = TempDir::new().unwrap();
    let clock = Arc::new(ManualClock::new(1_000));

    {
        let cache = manager(&dir, clock.clone(), 2).await;
        cache.put_cached_result("a", &result(1)).await;
        clock.advance(10);
        cache.put_cached_result("b", &result(2)).await;
        clock.advance(10);
        // Touching "a" makes "b" the least recently used
        assert!(cache.get_cached_result::<QueryResult>("a").await.is_some());
    }

    clock.advance(10);
    let cache = manager(&dir, clock, 2).await;
    assert_eq!(cache.lru_keys().await.unwrap(), vec!["b", "a"]);

    cache.put_cached_result("c", &result(3)).await;
    assert!(cache.get_cached_result::<QueryResult>("b").await.is_none());
    assert!(cache.get_cached_result::<QueryResult>("a").await.is_some());
    assert!(cache.get_cached_result::<QueryResult>("c").await.is_some());
}

#[tokio::test]
async fn test_snapshot_moves_between_stores() {
    let source_dir = TempDir::new().unwrap();
    let target_dir = TempDir::new().unwrap();
    let clock = Arc::new(ManualClock::new(1_000));

    let source = manager(&source_dir, clock.clone(), 10).await;
    for i in 0..3 {
        source.put_cached_result(&format!("q:{}", i), &result(i)).await;
        clock.advance(10);
    }
    let bytes = source.export_snapshot().await.unwrap();

    let target = manager(&target_dir, clock, 10).await;
    let report = target.import_snapshot(&bytes).await.unwrap();
    assert_eq!(report.imported, 3);
    assert_eq!(report.skipped, 0);

    for i in 0..3 {
        assert_eq!(
            target
                .get_cached_result::<QueryResult>(&format!("q:{}", i))
                .await,
            Some(result(i))
        );
    }
}

#[tokio::test]
async fn test_invalidate_removes_records_on_disk() {
    let dir = TempDir::new().unwrap();
    let clock = Arc::new(ManualClock::new(1_000));

    let cache = manager(&dir, clock.clone(), 10).await;
    cache.put_cached_result("orders:1", &result(1)).await;
    cache.put_cached_result("orders:2", &result(2)).await;
    cache.put_cached_result("users:1", &result(3)).await;
    assert_eq!(cache.invalidate("orders:*").await.unwrap(), 2);
    drop(cache);

    let records = std::fs::read_dir(dir.path()).unwrap().count();
    assert_eq!(records, 1);

    let cache = manager(&dir, clock, 10).await;
    assert_eq!(cache.lru_keys().await.unwrap(), vec!["users:1"]);
}
