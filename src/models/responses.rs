//! Response DTOs for the admin API
//!
//! Defines the structure of outgoing HTTP response bodies.

use serde::Serialize;
use serde_json::Value;

/// Response body for GET /cache/:fingerprint
#[derive(Debug, Clone, Serialize)]
pub struct GetResponse {
    pub fingerprint: String,
    /// The cached query result
    pub result: Value,
}

impl GetResponse {
    pub fn new(fingerprint: impl Into<String>, result: Value) -> Self {
        Self {
            fingerprint: fingerprint.into(),
            result,
        }
    }
}

/// Response body for PUT /cache/:fingerprint
#[derive(Debug, Clone, Serialize)]
pub struct PutResponse {
    /// Success message
    pub message: String,
    pub fingerprint: String,
}

impl PutResponse {
    pub fn new(fingerprint: impl Into<String>) -> Self {
        let fingerprint = fingerprint.into();
        Self {
            message: format!("Result for '{}' cached successfully", fingerprint),
            fingerprint,
        }
    }
}

/// Response body for DELETE /cache?pattern=...
#[derive(Debug, Clone, Serialize)]
pub struct InvalidateResponse {
    pub pattern: String,
    /// Number of entries removed
    pub removed: usize,
}

impl InvalidateResponse {
    pub fn new(pattern: impl Into<String>, removed: usize) -> Self {
        Self {
            pattern: pattern.into(),
            removed,
        }
    }
}

/// Response body for POST /clear
#[derive(Debug, Clone, Serialize)]
pub struct ClearResponse {
    pub removed: usize,
}

/// Response body for the health endpoint (GET /health)
#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    /// Health status (e.g., "healthy")
    pub status: String,
    /// Current timestamp in ISO 8601 format
    pub timestamp: String,
}

impl HealthResponse {
    /// Creates a new HealthResponse with current timestamp
    pub fn healthy() -> Self {
        Self {
            status: "healthy".to_string(),
            timestamp: chrono::Utc::now().to_rfc3339(),
        }
    }
}

/// Error response body for all error conditions
#[derive(Debug, Clone, Serialize)]
pub struct ErrorResponse {
    /// Error message describing what went wrong
    pub error: String,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
        }
    }
}
