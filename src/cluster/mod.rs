//! Cluster Module
//!
//! Topology management: physical nodes, ring membership and per-node
//! stores, plus bounded key-distribution monitoring.

mod manager;
mod tracker;

pub use manager::{ClusterManager, NodeState, PhysicalNode};
pub use tracker::KeyDistributionTracker;
