//! Distributed Cache Facade
//!
//! Public API surface of the engine. Routes get/set/delete/has through
//! the cluster manager, samples key distribution as a side effect,
//! aggregates stats across shards and drives the engine lifecycle
//! (`Running -> Draining -> Stopped`).

use std::collections::HashMap;
use std::sync::Arc;

use serde::Serialize;
use tokio::sync::{Mutex, RwLock};
use tokio::task::JoinHandle;
use tracing::info;

use crate::cluster::{ClusterManager, KeyDistributionTracker};
use crate::config::CacheConfig;
use crate::error::{CacheError, Result};
use crate::tasks::spawn_sweep_task;

// == Engine State ==
/// Lifecycle state of the whole engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum EngineState {
    Running,
    Draining,
    Stopped,
}

// == Stats Snapshot ==
/// Aggregated statistics across every shard, suitable for a metrics sink.
#[derive(Debug, Clone, Serialize)]
pub struct StatsSnapshot {
    /// Hits / (hits + misses) across all shards
    pub hit_rate: f64,
    /// Total successful retrievals
    pub total_hits: u64,
    /// Total failed retrievals
    pub total_misses: u64,
    /// Total LRU evictions
    pub total_evictions: u64,
    /// Total TTL expirations
    pub total_expirations: u64,
    /// Number of routable physical nodes
    pub node_count: u32,
    /// Current entry count per physical node
    pub per_node_sizes: HashMap<String, usize>,
    /// Relative deviation of the busiest node from the mean share
    pub skew_index: f64,
    /// Snapshot timestamp (RFC 3339)
    pub captured_at: String,
}

// == Distributed Cache ==
/// Sharded in-process cache with consistent hashing, LRU and TTL.
///
/// Constructed explicitly and passed to callers; multiple independent
/// caches can coexist (e.g., in tests).
#[derive(Debug)]
pub struct DistributedCache {
    cluster: ClusterManager,
    tracker: Mutex<KeyDistributionTracker>,
    sweeps: Mutex<HashMap<String, JoinHandle<()>>>,
    state: RwLock<EngineState>,
    config: CacheConfig,
}

impl DistributedCache {
    // == Constructor ==
    /// Creates a new cache engine with no nodes.
    ///
    /// Fails fast with `Configuration` if the config is unusable.
    pub fn new(config: CacheConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            cluster: ClusterManager::new(config.clone()),
            tracker: Mutex::new(KeyDistributionTracker::new(config.max_tracked_keys)),
            sweeps: Mutex::new(HashMap::new()),
            state: RwLock::new(EngineState::Running),
            config,
        })
    }

    /// Creates a cache engine pre-populated with the given nodes.
    pub async fn with_nodes(config: CacheConfig, node_ids: &[&str]) -> Result<Self> {
        let cache = Self::new(config)?;
        for id in node_ids {
            cache.add_node(id).await?;
        }
        Ok(cache)
    }

    // == Get ==
    /// Retrieves a value by key.
    ///
    /// Misses (absent key, expired entry, failover exhaustion) are
    /// `Ok(None)`, never errors. Routing falls back to the next ring
    /// node when the primary is unavailable.
    pub async fn get(&self, key: &str) -> Result<Option<String>> {
        self.ensure_readable().await?;

        match self.cluster.locate_for_read(key).await? {
            Some((node_id, store)) => {
                let value = store.write().await.get(key);
                self.tracker.lock().await.record(key, &node_id);
                Ok(value)
            }
            None => Ok(None),
        }
    }

    // == Set ==
    /// Stores a key-value pair with optional TTL in milliseconds.
    pub async fn set(&self, key: &str, value: &str, ttl_ms: Option<u64>) -> Result<()> {
        self.ensure_running().await?;

        let (node_id, store) = self.cluster.locate_for_write(key).await?;
        store
            .write()
            .await
            .set(key.to_string(), value.to_string(), ttl_ms)?;
        self.tracker.lock().await.record(key, &node_id);
        Ok(())
    }

    // == Delete ==
    /// Removes a key. Returns true if an entry was present.
    pub async fn delete(&self, key: &str) -> Result<bool> {
        self.ensure_running().await?;

        match self.cluster.locate_for_read(key).await? {
            Some((_, store)) => Ok(store.write().await.delete(key)),
            None => Ok(false),
        }
    }

    // == Has ==
    /// Checks whether a live entry exists for a key, without promoting
    /// it in LRU order.
    pub async fn has(&self, key: &str) -> Result<bool> {
        self.ensure_readable().await?;

        match self.cluster.locate_for_read(key).await? {
            Some((_, store)) => Ok(store.read().await.has(key)),
            None => Ok(false),
        }
    }

    // == Cluster Administration ==
    /// Adds a physical node with weight 1 and starts its TTL sweep task.
    pub async fn add_node(&self, id: &str) -> Result<()> {
        self.add_weighted_node(id, 1).await
    }

    /// Adds a physical node with a relative capacity weight; heavier
    /// nodes take proportionally more ring positions and therefore more
    /// keys.
    pub async fn add_weighted_node(&self, id: &str, weight: u32) -> Result<()> {
        self.ensure_running().await?;

        let store = self.cluster.add_node(id, weight).await?;
        let handle = spawn_sweep_task(
            id.to_string(),
            Arc::clone(&store),
            self.config.sweep_interval_ms,
            self.config.sweep_batch_limit,
        );
        self.sweeps.lock().await.insert(id.to_string(), handle);
        Ok(())
    }

    /// Removes a physical node, stopping its sweep task and disposing
    /// its entries per the configured removal policy.
    pub async fn remove_node(&self, id: &str) -> Result<()> {
        self.ensure_running().await?;

        if let Some(handle) = self.sweeps.lock().await.remove(id) {
            handle.abort();
        }
        self.cluster.remove_node(id).await?;
        self.tracker.lock().await.forget_node(id);
        Ok(())
    }

    /// Ids of routable nodes, sorted.
    pub async fn node_ids(&self) -> Vec<String> {
        self.cluster.node_ids().await
    }

    // == Stats ==
    /// Aggregated statistics across all shards.
    pub async fn stats(&self) -> StatsSnapshot {
        let mut total_hits = 0u64;
        let mut total_misses = 0u64;
        let mut total_evictions = 0u64;
        let mut total_expirations = 0u64;
        let mut per_node_sizes = HashMap::new();

        let snapshot = self.cluster.stores_snapshot().await;
        for (node_id, store) in &snapshot {
            let stats = store.read().await.stats();
            total_hits += stats.hits;
            total_misses += stats.misses;
            total_evictions += stats.evictions;
            total_expirations += stats.expirations;
            per_node_sizes.insert(node_id.clone(), stats.total_entries);
        }

        let requests = total_hits + total_misses;
        let hit_rate = if requests == 0 {
            0.0
        } else {
            total_hits as f64 / requests as f64
        };

        StatsSnapshot {
            hit_rate,
            total_hits,
            total_misses,
            total_evictions,
            total_expirations,
            node_count: snapshot.len() as u32,
            per_node_sizes,
            skew_index: self.tracker.lock().await.skew_index(),
            captured_at: chrono::Utc::now().to_rfc3339(),
        }
    }

    /// Sampled key counts per physical node, bounded by
    /// `max_tracked_keys` independently of the cache itself.
    pub async fn key_distribution(&self) -> HashMap<String, u64> {
        self.tracker.lock().await.distribution()
    }

    // == Shutdown ==
    /// Stops the engine: cancels background tasks and rejects further
    /// mutating calls with `Shutdown`. Idempotent.
    pub async fn shutdown(&self) {
        let mut state = self.state.write().await;
        if *state == EngineState::Stopped {
            return;
        }

        *state = EngineState::Draining;
        info!("Cache engine draining");

        let mut sweeps = self.sweeps.lock().await;
        for (node_id, handle) in sweeps.drain() {
            handle.abort();
            info!(node_id = %node_id, "TTL sweep task stopped");
        }

        *state = EngineState::Stopped;
        info!("Cache engine stopped");
    }

    // == State Checks ==
    async fn ensure_running(&self) -> Result<()> {
        match *self.state.read().await {
            EngineState::Running => Ok(()),
            _ => Err(CacheError::Shutdown),
        }
    }

    async fn ensure_readable(&self) -> Result<()> {
        match *self.state.read().await {
            EngineState::Stopped => Err(CacheError::Shutdown),
            _ => Ok(()),
        }
    }
}
