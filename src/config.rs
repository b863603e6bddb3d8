//! Configuration Module
//!
//! Handles loading cache and server configuration from environment variables.

use std::env;
use std::path::PathBuf;
use std::time::Duration;

use crate::cache::{CachePolicy, CapacityBudget};

/// Cache and server configuration parameters.
///
/// All values can be configured via environment variables with sensible defaults.
#[derive(Debug, Clone)]
pub struct Config {
    /// Maximum combined payload size of all cached results, in bytes
    pub max_total_bytes: u64,
    /// Maximum number of cached results
    pub max_entry_count: usize,
    /// TTL in seconds applied to every new entry
    pub default_ttl: u64,
    /// HTTP server port
    pub server_port: u16,
    /// Background purge interval in seconds
    pub cleanup_interval: u64,
    /// Directory for the durable store, None = in-memory store
    pub cache_dir: Option<PathBuf>,
}

impl Config {
    /// Creates a new Config by loading values from environment variables.
    ///
    /// # Environment Variables
    /// - `MAX_TOTAL_BYTES` - Capacity budget in bytes (default: 100 MiB)
    /// - `MAX_ENTRY_COUNT` - Maximum cached results (default: 1000)
    /// - `DEFAULT_TTL` - TTL in seconds (default: 3600)
    /// - `SERVER_PORT` - HTTP server port (default: 3000)
    /// - `CLEANUP_INTERVAL` - Purge frequency in seconds (default: 60)
    /// - `CACHE_DIR` - Durable store directory (default: unset, memory only)
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            max_total_bytes: parse_env("MAX_TOTAL_BYTES").unwrap_or(defaults.max_total_bytes),
            max_entry_count: parse_env("MAX_ENTRY_COUNT").unwrap_or(defaults.max_entry_count),
            default_ttl: parse_env("DEFAULT_TTL").unwrap_or(defaults.default_ttl),
            server_port: parse_env("SERVER_PORT").unwrap_or(defaults.server_port),
            cleanup_interval: parse_env("CLEANUP_INTERVAL").unwrap_or(defaults.cleanup_interval),
            cache_dir: env::var("CACHE_DIR")
                .ok()
                .filter(|v| !v.trim().is_empty())
                .map(PathBuf::from),
        }
    }

    /// Capacity ceilings for the policy engine.
    pub fn budget(&self) -> CapacityBudget {
        CapacityBudget::new(self.max_total_bytes, self.max_entry_count)
    }

    /// Full cache policy (budget plus TTL).
    pub fn policy(&self) -> CachePolicy {
        CachePolicy::new(self.budget(), Duration::from_secs(self.default_ttl))
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            max_total_bytes: 100 * 1024 * 1024,
            max_entry_count: 1000,
            default_ttl: 3600,
            server_port: 3000,
            cleanup_interval: 60,
            cache_dir: None,
        }
    }
}

fn parse_env<T: std::str::FromStr>(name: &str) -> Option<T> {
    env::var(name).ok().and_then(|v| v.parse().ok())
}
