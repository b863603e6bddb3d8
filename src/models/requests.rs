//! Request DTOs for the admin API
//!
//! Defines the structure of incoming query strings.

use serde::Deserialize;

/// Query string for invalidation (DELETE /cache?pattern=...)
///
/// # Fields
/// - `pattern`: substring, or glob when it contains `*` or `?`
#[derive(Debug, Clone, Deserialize)]
pub struct InvalidateQuery {
    #[serde(default)]
    pub pattern: String,
}

impl InvalidateQuery {
    /// Validates the request data
    ///
    /// Returns an error message if validation fails, None if valid.
    pub fn validate(&self) -> Option<String> {
        if self.pattern.trim().is_empty() {
            return Some("Pattern cannot be empty".to_string());
        }
        None
    }
}
