//! Configuration Module
//!
//! Handles loading and validating engine configuration from environment variables.

use std::env;

use crate::error::{CacheError, Result};

// == Removal Policy ==
/// What happens to a node's entries when the node is removed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RemovalPolicy {
    /// Entries are discarded; they become misses under the new topology.
    Drop,
    /// Surviving non-expired entries are re-inserted into the nodes now
    /// responsible for their keys.
    Migrate,
}

/// Engine configuration parameters.
///
/// All values can be configured via environment variables with sensible defaults.
#[derive(Debug, Clone)]
pub struct CacheConfig {
    /// Maximum number of live entries each node store can hold
    pub max_entries_per_node: usize,
    /// Default TTL in milliseconds for entries without explicit TTL (None = no expiry)
    pub default_ttl_ms: Option<u64>,
    /// Virtual nodes per physical node in small clusters; larger clusters
    /// step down from this value to bound ring size
    pub initial_virtual_nodes: u32,
    /// Capacity of the key-distribution tracker
    pub max_tracked_keys: usize,
    /// Background TTL sweep interval in milliseconds
    pub sweep_interval_ms: u64,
    /// Maximum entries removed per sweep tick
    pub sweep_batch_limit: usize,
    /// Maximum distinct-node hops attempted during failover
    pub failover_hop_limit: usize,
    /// Disposition of entries on node removal
    pub removal_policy: RemovalPolicy,
}

impl CacheConfig {
    /// Creates a new CacheConfig by loading values from environment variables.
    ///
    /// # Environment Variables
    /// - `MAX_ENTRIES_PER_NODE` - Maximum entries per node store (default: 1000)
    /// - `DEFAULT_TTL_MS` - Default TTL in milliseconds, 0 disables (default: 0)
    /// - `INITIAL_VIRTUAL_NODES` - Virtual nodes per physical node (default: 128)
    /// - `MAX_TRACKED_KEYS` - Key-distribution tracker capacity (default: 1024)
    /// - `SWEEP_INTERVAL_MS` - TTL sweep frequency (default: 60000)
    /// - `SWEEP_BATCH_LIMIT` - Max removals per sweep tick (default: 128)
    /// - `FAILOVER_HOP_LIMIT` - Max failover hops (default: 3)
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            max_entries_per_node: env::var("MAX_ENTRIES_PER_NODE")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.max_entries_per_node),
            default_ttl_ms: env::var("DEFAULT_TTL_MS")
                .ok()
                .and_then(|v| v.parse::<u64>().ok())
                .filter(|&ms| ms > 0)
                .or(defaults.default_ttl_ms),
            initial_virtual_nodes: env::var("INITIAL_VIRTUAL_NODES")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.initial_virtual_nodes),
            max_tracked_keys: env::var("MAX_TRACKED_KEYS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.max_tracked_keys),
            sweep_interval_ms: env::var("SWEEP_INTERVAL_MS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.sweep_interval_ms),
            sweep_batch_limit: env::var("SWEEP_BATCH_LIMIT")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.sweep_batch_limit),
            failover_hop_limit: env::var("FAILOVER_HOP_LIMIT")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.failover_hop_limit),
            removal_policy: defaults.removal_policy,
        }
    }

    /// Validates the configuration, failing fast on unusable values.
    pub fn validate(&self) -> Result<()> {
        if self.max_entries_per_node == 0 {
            return Err(CacheError::Configuration(
                "max_entries_per_node must be greater than zero".to_string(),
            ));
        }
        if self.initial_virtual_nodes == 0 {
            return Err(CacheError::Configuration(
                "initial_virtual_nodes must be greater than zero".to_string(),
            ));
        }
        if self.max_tracked_keys == 0 {
            return Err(CacheError::Configuration(
                "max_tracked_keys must be greater than zero".to_string(),
            ));
        }
        if self.sweep_interval_ms == 0 {
            return Err(CacheError::Configuration(
                "sweep_interval_ms must be greater than zero".to_string(),
            ));
        }
        if self.sweep_batch_limit == 0 {
            return Err(CacheError::Configuration(
                "sweep_batch_limit must be greater than zero".to_string(),
            ));
        }
        if self.failover_hop_limit == 0 {
            return Err(CacheError::Configuration(
                "failover_hop_limit must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            max_entries_per_node: 1000,
            default_ttl_ms: None,
            initial_virtual_nodes: 128,
            max_tracked_keys: 1024,
            sweep_interval_ms: 60_000,
            sweep_batch_limit: 128,
            failover_hop_limit: 3,
            removal_policy: RemovalPolicy::Drop,
        }
    }
}
