//! Cache Module
//!
//! Query-result caching with TTL expiration and size/count-bounded LRU eviction.

mod clock;
mod entry;
mod manager;
mod metrics;
mod policy;
pub mod snapshot;


// Re-export public types
pub use clock::{current_timestamp_ms, Clock, ManualClock, SystemClock};
pub use entry::{CacheEntry, EntryMeta};
pub use manager::CacheManager;
pub use metrics::{hit_rate, CacheMetrics, SessionCounters};
pub use policy::{lru_order, CachePolicy, CapacityBudget, EvictionPlan};
pub use snapshot::{CacheSnapshot, ImportReport, SnapshotEntry};

// == Public Constants ==
/// Maximum allowed fingerprint length in bytes
pub const MAX_KEY_LENGTH: usize = 1024;
