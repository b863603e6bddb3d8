//! Error types for the query cache
//!
//! Provides unified error handling using thiserror.

use axum::{
    extract::rejection::{BytesRejection, JsonRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use thiserror::Error;

use crate::models::ErrorResponse;

// == Cache Error Enum ==
/// Unified error type for the query cache.
///
/// Only `ImportMalformed`, `NotFound` and `InvalidRequest` are meant to reach
/// a user. Everything else is recovered inside the cache manager by treating
/// the operation as a miss or skipping the write.
#[derive(Error, Debug)]
pub enum CacheError {
    /// The backing store cannot be opened or used
    #[error("Storage unavailable: {0}")]
    StorageUnavailable(String),

    /// A single entry is larger than the whole capacity budget
    #[error("Entry too large: {size} bytes exceeds budget of {limit} bytes")]
    EntryTooLarge { size: u64, limit: u64 },

    /// Snapshot data failed to parse or validate
    #[error("Malformed snapshot: {0}")]
    ImportMalformed(String),

    /// A value could not be serialized or deserialized
    #[error("Serialization failure: {0}")]
    SerializationFailure(String),

    /// Fingerprint not present in the cache
    #[error("Key not found: {0}")]
    NotFound(String),

    /// Invalid request data
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Request body over the router's size limit
    #[error("Request body too large: {0}")]
    BodyTooLarge(String),

    /// Internal server error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<std::io::Error> for CacheError {
    fn from(err: std::io::Error) -> Self {
        CacheError::StorageUnavailable(err.to_string())
    }
}

impl From<serde_json::Error> for CacheError {
    fn from(err: serde_json::Error) -> Self {
        CacheError::SerializationFailure(err.to_string())
    }
}

impl From<JsonRejection> for CacheError {
    fn from(rejection: JsonRejection) -> Self {
        rejected(rejection.status(), rejection.body_text())
    }
}

impl From<BytesRejection> for CacheError {
    fn from(rejection: BytesRejection) -> Self {
        rejected(rejection.status(), rejection.body_text())
    }
}

fn rejected(status: StatusCode, message: String) -> CacheError {
    if status == StatusCode::PAYLOAD_TOO_LARGE {
        CacheError::BodyTooLarge(message)
    } else {
        CacheError::InvalidRequest(message)
    }
}

// == IntoResponse Implementation ==
impl IntoResponse for CacheError {
    fn into_response(self) -> Response {
        let status = match &self {
            CacheError::NotFound(_) => StatusCode::NOT_FOUND,
            CacheError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            CacheError::ImportMalformed(_) => StatusCode::BAD_REQUEST,
            CacheError::SerializationFailure(_) => StatusCode::UNPROCESSABLE_ENTITY,
            CacheError::EntryTooLarge { .. } => StatusCode::PAYLOAD_TOO_LARGE,
            CacheError::BodyTooLarge(_) => StatusCode::PAYLOAD_TOO_LARGE,
            CacheError::StorageUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            CacheError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        let body = Json(ErrorResponse::new(self.to_string()));

        (status, body).into_response()
    }
}

// == Result Type Alias ==
/// Convenience Result type for the query cache.
pub type Result<T> = std::result::Result<T, CacheError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_io_error_maps_to_storage_unavailable() {
        let io = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied");
        let err: CacheError = io.into();
        assert!(matches!(err, CacheError::StorageUnavailable(_)));
    }

    #[test]
    fn test_json_error_maps_to_serialization_failure() {
        let json_err = serde_json::from_str::<serde_json::Value>("{not json").unwrap_err();
        let err: CacheError = json_err.into();
        assert!(matches!(err, CacheError::SerializationFailure(_)));
    }

    #[test]
    fn test_entry_too_large_message() {
        let err = CacheError::EntryTooLarge {
            size: 2048,
            limit: 1024,
        };
        assert_eq!(
            err.to_string(),
            "Entry too large: 2048 bytes exceeds budget of 1024 bytes"
        );
    }

    #[test]
    fn test_error_status_codes() {
        let cases = vec![
            (CacheError::NotFound("k".into()), StatusCode::NOT_FOUND),
            (CacheError::InvalidRequest("bad".into()), StatusCode::BAD_REQUEST),
            (CacheError::ImportMalformed("bad".into()), StatusCode::BAD_REQUEST),
            (
                CacheError::EntryTooLarge { size: 2, limit: 1 },
                StatusCode::PAYLOAD_TOO_LARGE,
            ),
            (
                CacheError::BodyTooLarge("limit".into()),
                StatusCode::PAYLOAD_TOO_LARGE,
            ),
            (
                CacheError::StorageUnavailable("down".into()),
                StatusCode::SERVICE_UNAVAILABLE,
            ),
            (
                CacheError::Internal("boom".into()),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];

        for (error, expected) in cases {
            assert_eq!(error.into_response().status(), expected);
        }
    }
}
