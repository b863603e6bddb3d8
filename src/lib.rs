//! Query Cache - A bounded cache for database query results
//!
//! Stores serialized query results under opaque fingerprints with TTL
//! expiration and LRU eviction against a byte and entry budget. Also ships
//! a fixed-height virtualized list window calculator for rendering large
//! result sets.

pub mod api;
pub mod cache;
pub mod config;
pub mod error;
pub mod models;
pub mod storage;
pub mod tasks;
pub mod virtual_list;

pub use api::AppState;
pub use cache::CacheManager;
pub use config::Config;
pub use error::{CacheError, Result};
pub use tasks::spawn_cleanup_task;
pub use virtual_list::VirtualList;
