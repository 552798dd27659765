//! Cache Entry Module
//!
//! Defines the structure for individual cache entries with TTL support.

use std::time::{SystemTime, UNIX_EPOCH};

// == Cache Entry ==
/// Represents a single cache entry with value and metadata.
///
/// Owned exclusively by the node store that holds it; never shared
/// across nodes.
#[derive(Debug, Clone)]
pub struct CacheEntry {
    /// The cache key, kept alongside the value so tail eviction can
    /// unlink the map entry without a reverse lookup
    pub key: String,
    /// The stored value
    pub value: String,
    /// Insertion timestamp (Unix milliseconds)
    pub inserted_at_ms: u64,
    /// Last access timestamp (Unix milliseconds), updated on every hit
    pub last_accessed_at_ms: u64,
    /// Expiration timestamp (Unix milliseconds), None = no expiration
    pub expires_at_ms: Option<u64>,
    /// Approximate in-memory footprint in bytes
    pub size_hint: u32,
}

impl CacheEntry {
    // == Constructor ==
    /// Creates a new cache entry with optional TTL.
    ///
    /// # Arguments
    /// * `key` - The cache key
    /// * `value` - The value to store
    /// * `ttl_ms` - Optional TTL in milliseconds
    pub fn new(key: String, value: String, ttl_ms: Option<u64>) -> Self {
        let now = current_timestamp_ms();
        let expires_at_ms = ttl_ms.map(|ttl| now.saturating_add(ttl));
        let size_hint = (key.len() + value.len()) as u32;

        Self {
            key,
            value,
            inserted_at_ms: now,
            last_accessed_at_ms: now,
            expires_at_ms,
            size_hint,
        }
    }

    // == Is Expired ==
    /// Checks if the entry has expired.
    ///
    /// Boundary condition: an entry is expired when the current time is
    /// greater than or equal to the expiration time.
    pub fn is_expired(&self) -> bool {
        match self.expires_at_ms {
            Some(expires) => current_timestamp_ms() >= expires,
            None => false,
        }
    }

    // == Touch ==
    /// Records an access, refreshing the recency timestamp.
    pub fn touch(&mut self) {
        self.last_accessed_at_ms = current_timestamp_ms();
    }

    // == Time To Live ==
    /// Returns remaining TTL in milliseconds, or None if no expiration is set.
    ///
    /// Returns `Some(0)` once the TTL has elapsed.
    pub fn ttl_remaining_ms(&self) -> Option<u64> {
        self.expires_at_ms.map(|expires| {
            let now = current_timestamp_ms();
            expires.saturating_sub(now)
        })
    }
}

// == Utility Functions ==
/// Returns current Unix timestamp in milliseconds.
pub fn current_timestamp_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("Time went backwards")
        .as_millis() as u64
}
