//! Node Store Module
//!
//! Per-shard cache engine combining HashMap storage with arena-based LRU
//! ordering and TTL expiration. Capacity pressure is relieved in two
//! phases: expired entries near the LRU tail go first, live entries are
//! evicted from the tail only if the store is still over capacity.

use std::collections::HashMap;

use crate::error::{CacheError, Result};
use crate::store::{CacheEntry, LruArena, NodeStats, MAX_KEY_LENGTH, MAX_VALUE_SIZE};

/// How many tail entries a capacity check inspects for expiry before
/// falling back to plain LRU eviction.
const EXPIRED_SCAN_LIMIT: usize = 8;

// == Node Store ==
/// Bounded key/value store for one physical node.
#[derive(Debug)]
pub struct NodeStore {
    /// Cache key to arena slot index
    index: HashMap<String, usize>,
    /// Entries ordered by recency (front = most recently used)
    entries: LruArena<CacheEntry>,
    /// Performance statistics
    stats: NodeStats,
    /// Maximum number of entries allowed
    max_entries: usize,
    /// Default TTL in milliseconds for entries without explicit TTL
    default_ttl_ms: Option<u64>,
}

impl NodeStore {
    // == Constructor ==
    /// Creates a new NodeStore with specified capacity and default TTL.
    ///
    /// # Arguments
    /// * `max_entries` - Maximum number of entries the store can hold
    /// * `default_ttl_ms` - Default TTL in milliseconds (None = entries never expire by default)
    pub fn new(max_entries: usize, default_ttl_ms: Option<u64>) -> Self {
        Self {
            index: HashMap::new(),
            entries: LruArena::new(),
            stats: NodeStats::new(),
            max_entries,
            default_ttl_ms,
        }
    }

    // == Set ==
    /// Stores a key-value pair with optional TTL.
    ///
    /// If the key already exists, the value is overwritten, the TTL is
    /// reset and the entry becomes most recently used. After insertion
    /// the store enforces its capacity bound.
    ///
    /// # Arguments
    /// * `key` - The key to store
    /// * `value` - The value to store
    /// * `ttl_ms` - Optional TTL in milliseconds (falls back to the default TTL)
    pub fn set(&mut self, key: String, value: String, ttl_ms: Option<u64>) -> Result<()> {
        if key.is_empty() {
            return Err(CacheError::InvalidRequest(
                "Key must not be empty".to_string(),
            ));
        }
        if key.len() > MAX_KEY_LENGTH {
            return Err(CacheError::InvalidRequest(format!(
                "Key exceeds maximum length of {} bytes",
                MAX_KEY_LENGTH
            )));
        }
        if value.len() > MAX_VALUE_SIZE {
            return Err(CacheError::InvalidRequest(format!(
                "Value exceeds maximum size of {} bytes",
                MAX_VALUE_SIZE
            )));
        }

        let effective_ttl = ttl_ms.or(self.default_ttl_ms);

        match self.index.get(&key).copied() {
            Some(slot) => {
                // Overwrite in place and refresh recency
                let replacement = CacheEntry::new(key, value, effective_ttl);
                if let Some(entry) = self.entries.get_mut(slot) {
                    *entry = replacement;
                }
                self.entries.move_to_front(slot);
            }
            None => {
                let entry = CacheEntry::new(key.clone(), value, effective_ttl);
                let slot = self.entries.push_front(entry);
                self.index.insert(key, slot);
            }
        }

        self.enforce_capacity();
        self.stats.set_total_entries(self.entries.len());
        Ok(())
    }

    // == Get ==
    /// Retrieves a value by key.
    ///
    /// A live hit refreshes the entry's recency. An expired entry is
    /// removed and reported as a miss; misses are never errors.
    pub fn get(&mut self, key: &str) -> Option<String> {
        let slot = match self.index.get(key).copied() {
            Some(slot) => slot,
            None => {
                self.stats.record_miss();
                return None;
            }
        };

        let expired = self
            .entries
            .get(slot)
            .map(|entry| entry.is_expired())
            .unwrap_or(true);

        if expired {
            self.remove_slot(slot, key);
            self.stats.record_expiration();
            self.stats.record_miss();
            self.stats.set_total_entries(self.entries.len());
            return None;
        }

        let value = self.entries.get_mut(slot).map(|entry| {
            entry.touch();
            entry.value.clone()
        });
        self.entries.move_to_front(slot);
        self.stats.record_hit();
        value
    }

    // == Has ==
    /// Checks whether a live (non-expired) entry exists for a key.
    ///
    /// Does not promote the entry in LRU order, so probes cannot distort
    /// eviction decisions.
    pub fn has(&self, key: &str) -> bool {
        self.index
            .get(key)
            .and_then(|&slot| self.entries.get(slot))
            .map(|entry| !entry.is_expired())
            .unwrap_or(false)
    }

    // == Delete ==
    /// Removes an entry by key. Returns true if an entry was present.
    pub fn delete(&mut self, key: &str) -> bool {
        match self.index.get(key).copied() {
            Some(slot) => {
                self.remove_slot(slot, key);
                self.stats.set_total_entries(self.entries.len());
                true
            }
            None => false,
        }
    }

    // == Sweep Expired ==
    /// Removes expired entries, at most `batch_limit` per call.
    ///
    /// Returns the number of entries removed. Bounding the batch keeps
    /// lock hold times short for the background sweep task.
    pub fn sweep_expired(&mut self, batch_limit: usize) -> usize {
        let mut expired: Vec<(usize, String)> = Vec::new();
        let mut cursor = self.entries.back();

        while let Some(slot) = cursor {
            if expired.len() >= batch_limit {
                break;
            }
            if let Some(entry) = self.entries.get(slot) {
                if entry.is_expired() {
                    expired.push((slot, entry.key.clone()));
                }
            }
            cursor = self.entries.prev_toward_front(slot);
        }

        for (slot, key) in &expired {
            self.remove_slot(*slot, key);
            self.stats.record_expiration();
        }
        self.stats.set_total_entries(self.entries.len());
        expired.len()
    }

    // == Drain ==
    /// Removes and returns every entry, oldest first.
    ///
    /// Used when a node leaves the cluster under the migrate policy.
    pub fn drain(&mut self) -> Vec<CacheEntry> {
        let mut drained = Vec::with_capacity(self.entries.len());
        while let Some(entry) = self.entries.pop_back() {
            self.index.remove(&entry.key);
            drained.push(entry);
        }
        self.stats.set_total_entries(0);
        drained
    }

    // == Stats ==
    /// Returns current store statistics.
    pub fn stats(&self) -> NodeStats {
        let mut stats = self.stats.clone();
        stats.set_total_entries(self.entries.len());
        stats
    }

    // == Length ==
    /// Returns the current number of entries in the store.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if the store is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    // == Capacity Enforcement ==
    /// Restores the `len <= max_entries` invariant after an insert.
    ///
    /// Phase 1 removes expired entries found near the LRU tail so stale
    /// data goes before live data. Phase 2 evicts from the tail until
    /// the store is back under its bound.
    fn enforce_capacity(&mut self) {
        if self.entries.len() <= self.max_entries {
            return;
        }

        // Phase 1: expired entries near the tail
        let mut expired: Vec<(usize, String)> = Vec::new();
        let mut cursor = self.entries.back();
        let mut examined = 0;

        while let Some(slot) = cursor {
            if examined >= EXPIRED_SCAN_LIMIT {
                break;
            }
            if let Some(entry) = self.entries.get(slot) {
                if entry.is_expired() {
                    expired.push((slot, entry.key.clone()));
                }
            }
            examined += 1;
            cursor = self.entries.prev_toward_front(slot);
        }

        for (slot, key) in &expired {
            self.remove_slot(*slot, key);
            self.stats.record_expiration();
        }

        // Phase 2: true LRU eviction from the tail
        while self.entries.len() > self.max_entries {
            if let Some(evicted) = self.entries.pop_back() {
                self.index.remove(&evicted.key);
                self.stats.record_eviction();
            } else {
                break;
            }
        }
    }

    // == Remove Slot ==
    /// Unlinks one entry from both the arena and the key index.
    fn remove_slot(&mut self, slot: usize, key: &str) {
        self.entries.remove(slot);
        self.index.remove(key);
    }
}
