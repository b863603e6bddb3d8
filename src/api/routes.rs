//! API Routes
//!
//! Configures the Axum router with all cache administration endpoints.

use axum::{
    extract::DefaultBodyLimit,
    routing::{delete, get, post},
    Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use super::handlers::{
    clear_handler, export_handler, get_handler, health_handler, import_handler, invalidate_handler,
    metrics_handler, put_handler, AppState,
};
use crate::cache::{CapacityBudget, MAX_KEY_LENGTH};

/// Snapshot bytes per entry beyond its payload: key, metadata and framing.
const SNAPSHOT_ENTRY_OVERHEAD: u64 = MAX_KEY_LENGTH as u64 + 256;

/// Largest request body accepted, derived from the capacity budget.
///
/// A full snapshot re-encodes every payload and adds per-entry metadata, so
/// the limit is twice the byte budget plus the per-entry overhead.
pub fn body_limit(budget: &CapacityBudget) -> usize {
    let entries = budget.max_entry_count() as u64;
    let limit = budget
        .max_total_bytes()
        .saturating_mul(2)
        .saturating_add(entries.saturating_mul(SNAPSHOT_ENTRY_OVERHEAD));
    usize::try_from(limit).unwrap_or(usize::MAX)
}

/// Creates the main router with all endpoints configured.
///
/// # Endpoints
/// - `GET /cache/:fingerprint` - Read a cached result
/// - `PUT /cache/:fingerprint` - Cache a result
/// - `DELETE /cache?pattern=` - Invalidate matching entries
/// - `POST /clear` - Remove every entry
/// - `GET /metrics` - Hit/miss counters and live size
/// - `GET /snapshot` - Download all entries
/// - `POST /snapshot` - Upload a snapshot
/// - `GET /health` - Health check endpoint
///
/// # Middleware
/// - Body limit: sized from the cache budget (see [`body_limit`])
/// - CORS: Allows any origin (configurable for production)
/// - Tracing: Logs all requests for debugging
pub fn create_router(state: AppState) -> Router {
    let limit = body_limit(state.cache.policy().budget());

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/cache", delete(invalidate_handler))
        .route("/cache/:fingerprint", get(get_handler).put(put_handler))
        .route("/clear", post(clear_handler))
        .route("/metrics", get(metrics_handler))
        .route("/snapshot", get(export_handler).post(import_handler))
        .route("/health", get(health_handler))
        .layer(DefaultBodyLimit::max(limit))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
