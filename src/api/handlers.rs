//! API Handlers
//!
//! HTTP request handlers for the cache administration endpoints.

use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::{
        rejection::{BytesRejection, JsonRejection},
        Path, Query, State,
    },
    http::header,
    response::IntoResponse,
    Json,
};
use serde_json::Value;
use tracing::warn;

use crate::cache::{CacheManager, CacheMetrics, ImportReport};
use crate::config::Config;
use crate::error::{CacheError, Result};
use crate::models::{
    ClearResponse, GetResponse, HealthResponse, InvalidateQuery, InvalidateResponse, PutResponse,
};
use crate::storage::{DisabledStore, FileStore, KvStore, MemoryStore};

/// File name offered for snapshot downloads.
pub const SNAPSHOT_FILE_NAME: &str = "query-cache-snapshot.json";

/// Application state shared across all handlers.
///
/// Holds the one cache manager wired at startup.
#[derive(Clone)]
pub struct AppState {
    pub cache: Arc<CacheManager>,
}

impl AppState {
    pub fn new(cache: CacheManager) -> Self {
        Self {
            cache: Arc::new(cache),
        }
    }

    /// Creates a new AppState from configuration.
    ///
    /// Uses a `FileStore` when `cache_dir` is set, falling back to a
    /// `DisabledStore` if it cannot be opened; otherwise a `MemoryStore`.
    pub async fn from_config(config: &Config) -> Self {
        let store: Arc<dyn KvStore> = match &config.cache_dir {
            Some(dir) => match FileStore::open(dir).await {
                Ok(store) => Arc::new(store),
                Err(e) => {
                    warn!("Cache storage disabled, every lookup will miss: {}", e);
                    Arc::new(DisabledStore::new(e.to_string()))
                }
            },
            None => Arc::new(MemoryStore::new()),
        };
        Self::new(CacheManager::new(store, config.policy()))
    }
}

/// Handler for GET /cache/:fingerprint
pub async fn get_handler(
    State(state): State<AppState>,
    Path(fingerprint): Path<String>,
) -> Result<Json<GetResponse>> {
    let result = state
        .cache
        .get_cached_result::<Value>(&fingerprint)
        .await
        .ok_or_else(|| CacheError::NotFound(fingerprint.clone()))?;

    Ok(Json(GetResponse::new(fingerprint, result)))
}

/// Handler for PUT /cache/:fingerprint
///
/// The request body is the result to cache.
pub async fn put_handler(
    State(state): State<AppState>,
    Path(fingerprint): Path<String>,
    body: std::result::Result<Json<Value>, JsonRejection>,
) -> Result<Json<PutResponse>> {
    let Json(result) = body?;
    state
        .cache
        .try_put_cached_result(&fingerprint, &result)
        .await?;

    Ok(Json(PutResponse::new(fingerprint)))
}

/// Handler for DELETE /cache?pattern=...
pub async fn invalidate_handler(
    State(state): State<AppState>,
    Query(query): Query<InvalidateQuery>,
) -> Result<Json<InvalidateResponse>> {
    if let Some(error_msg) = query.validate() {
        return Err(CacheError::InvalidRequest(error_msg));
    }

    let removed = state.cache.invalidate(&query.pattern).await?;
    Ok(Json(InvalidateResponse::new(query.pattern, removed)))
}

/// Handler for POST /clear
pub async fn clear_handler(State(state): State<AppState>) -> Result<Json<ClearResponse>> {
    let removed = state.cache.clear_all().await?;
    Ok(Json(ClearResponse { removed }))
}

/// Handler for GET /metrics
pub async fn metrics_handler(State(state): State<AppState>) -> Json<CacheMetrics> {
    Json(state.cache.get_metrics().await)
}

/// Handler for GET /snapshot
///
/// Returns the snapshot as a JSON file download.
pub async fn export_handler(State(state): State<AppState>) -> Result<impl IntoResponse> {
    let body = state.cache.export_snapshot().await?;
    let disposition = format!("attachment; filename=\"{}\"", SNAPSHOT_FILE_NAME);

    Ok((
        [
            (header::CONTENT_TYPE, "application/json".to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        body,
    ))
}

/// Handler for POST /snapshot
///
/// The raw request body must be a snapshot document.
pub async fn import_handler(
    State(state): State<AppState>,
    body: std::result::Result<Bytes, BytesRejection>,
) -> Result<Json<ImportReport>> {
    let body = body?;
    let report = state.cache.import_snapshot(&body).await?;
    Ok(Json(report))
}

/// Handler for GET /health
pub async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse::healthy())
}
