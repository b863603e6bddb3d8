//! API Module
//!
//! HTTP handlers and routing for the cache administration API.
//!
//! # Endpoints
//! - `GET /cache/:fingerprint` - Read a cached result
//! - `PUT /cache/:fingerprint` - Cache a result
//! - `DELETE /cache?pattern=` - Invalidate matching entries
//! - `POST /clear` - Remove every entry
//! - `GET /metrics` - Cache metrics
//! - `GET /snapshot`, `POST /snapshot` - Export and import
//! - `GET /health` - Health check endpoint

pub mod handlers;
pub mod routes;

pub use handlers::*;
pub use routes::create_router;
