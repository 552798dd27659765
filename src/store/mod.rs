//! Store Module
//!
//! Per-node bounded key/value storage with LRU eviction and TTL expiration.

mod entry;
mod lru;
mod node_store;
mod stats;

#[cfg(test)]
mod property_tests;

// Re-export public types
pub use entry::{current_timestamp_ms, CacheEntry};
pub use lru::LruArena;
pub use node_store::NodeStore;
pub use stats::NodeStats;

// == Public Constants ==
/// Maximum allowed key length in bytes
pub const MAX_KEY_LENGTH: usize = 256;

/// Maximum allowed value size in bytes
pub const MAX_VALUE_SIZE: usize = 1024 * 1024; // 1 MB
