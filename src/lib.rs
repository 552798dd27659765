//! Shardcache - A sharded in-process cache engine
//!
//! Distributes keys across logical nodes with consistent hashing; each
//! shard bounds its memory with combined LRU eviction and TTL expiration.

pub mod cache;
pub mod cluster;
pub mod config;
pub mod error;
pub mod ring;
pub mod store;
pub mod tasks;

pub use cache::{DistributedCache, StatsSnapshot};
pub use cluster::{ClusterManager, KeyDistributionTracker, NodeState};
pub use config::{CacheConfig, RemovalPolicy};
pub use error::{CacheError, Result};
pub use ring::HashRing;
pub use store::NodeStore;
