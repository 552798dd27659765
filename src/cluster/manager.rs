//! Cluster Manager Module
//!
//! Owns the hash ring, the physical node table and one store per node.
//! Topology is read-mostly: lookups share a read lock while node
//! add/remove takes a brief exclusive write. Each store sits behind its
//! own lock so operations against different shards never contend.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use tokio::sync::RwLock;
use tracing::{debug, info};

use crate::config::{CacheConfig, RemovalPolicy};
use crate::error::{CacheError, Result};
use crate::ring::HashRing;
use crate::store::NodeStore;

// == Node State ==
/// Lifecycle state of a physical node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeState {
    /// Serving reads and writes
    Active,
    /// Leaving the cluster: still readable, no longer receives writes
    Draining,
    /// Left the cluster; no longer present in the node table
    Removed,
}

// == Physical Node ==
/// A logical shard owner registered with the cluster.
#[derive(Debug, Clone)]
pub struct PhysicalNode {
    /// Unique node id
    pub id: String,
    /// Relative capacity weight; heavier nodes take proportionally more
    /// ring positions and therefore more keys
    pub weight: u32,
    /// Number of ring positions allocated to this node
    pub virtual_node_count: u32,
    /// Current lifecycle state
    pub state: NodeState,
}

// == Topology ==
/// Ring plus node table plus per-node stores, guarded as one unit so a
/// reader always observes a consistent view.
#[derive(Debug, Default)]
struct Topology {
    ring: HashRing,
    nodes: HashMap<String, PhysicalNode>,
    stores: HashMap<String, Arc<RwLock<NodeStore>>>,
}

// == Cluster Manager ==
/// Manages cluster membership and key-to-store resolution.
#[derive(Debug)]
pub struct ClusterManager {
    topology: RwLock<Topology>,
    config: CacheConfig,
}

impl ClusterManager {
    // == Constructor ==
    /// Creates an empty cluster with the given configuration.
    pub fn new(config: CacheConfig) -> Self {
        Self {
            topology: RwLock::new(Topology::default()),
            config,
        }
    }

    // == Virtual Node Curve ==
    /// Virtual nodes per physical node for a cluster of `node_count`
    /// members.
    ///
    /// Smaller clusters use more virtual nodes per physical node for
    /// distribution uniformity; larger clusters use fewer to bound ring
    /// size and lookup cost. The curve is a step function so the count
    /// is stable across a wide band of cluster sizes: up to 16 nodes
    /// every node carries `initial` positions, up to 64 nodes half
    /// that, beyond that a quarter, floored at 16. This is the
    /// weight-1 base; a node's actual allocation is the base scaled by
    /// its weight, so equal-weight nodes carry equal key shares and
    /// inside a band membership changes remap only the joining or
    /// leaving node's arcs.
    fn virtual_nodes_for(node_count: usize, initial: u32) -> u32 {
        let step = if node_count <= 16 {
            initial
        } else if node_count <= 64 {
            initial / 2
        } else {
            initial / 4
        };
        step.max(16)
    }

    /// Brings every routable node to the vnode count for the current
    /// cluster size. Shrinking drops only the highest replica indices,
    /// so surviving positions never move.
    fn rebalance(topology: &mut Topology, initial: u32) {
        let base = Self::virtual_nodes_for(Self::routable_count(topology), initial);
        let stale: Vec<(String, u32)> = topology
            .nodes
            .values()
            .filter(|node| node.virtual_node_count != base.saturating_mul(node.weight))
            .map(|node| (node.id.clone(), base.saturating_mul(node.weight)))
            .collect();

        for (id, target) in stale {
            topology.ring.remove_virtual_nodes(&id);
            topology.ring.add_virtual_nodes(&id, target);
            if let Some(node) = topology.nodes.get_mut(&id) {
                node.virtual_node_count = target;
            }
        }
    }

    // == Add Node ==
    /// Registers a physical node, allocates its ring positions and
    /// creates its store. Returns the new store so callers can attach
    /// background tasks to it.
    ///
    /// `weight` scales the node's virtual-node allocation relative to a
    /// weight-1 node; it must be non-zero.
    pub async fn add_node(&self, id: &str, weight: u32) -> Result<Arc<RwLock<NodeStore>>> {
        if id.is_empty() {
            return Err(CacheError::Configuration(
                "node id must not be empty".to_string(),
            ));
        }
        if weight == 0 {
            return Err(CacheError::Configuration(
                "node weight must be greater than zero".to_string(),
            ));
        }

        let mut topology = self.topology.write().await;

        if topology.nodes.contains_key(id) {
            return Err(CacheError::NodeAlreadyExists(id.to_string()));
        }

        topology.nodes.insert(
            id.to_string(),
            PhysicalNode {
                id: id.to_string(),
                weight,
                virtual_node_count: 0,
                state: NodeState::Active,
            },
        );
        let store = Arc::new(RwLock::new(NodeStore::new(
            self.config.max_entries_per_node,
            self.config.default_ttl_ms,
        )));
        topology.stores.insert(id.to_string(), Arc::clone(&store));

        Self::rebalance(&mut topology, self.config.initial_virtual_nodes);

        info!(
            node_id = id,
            virtual_nodes = topology
                .nodes
                .get(id)
                .map(|node| node.virtual_node_count)
                .unwrap_or(0),
            cluster_size = Self::routable_count(&topology),
            "Node added to cluster"
        );
        Ok(store)
    }

    // == Remove Node ==
    /// Removes a physical node from the cluster.
    ///
    /// The node passes through Draining to Removed inside one topology
    /// write lock, so the Draining state is never observable from
    /// outside: in-process there is no separate grace window to wait
    /// out. Readers that resolved the store before the change hold
    /// their own Arc and finish normally, while writers route away the
    /// moment the lock drops. The node's table entry is deleted; a
    /// removed id can rejoin as a fresh node. Entries are dropped or
    /// migrated per the configured removal policy.
    pub async fn remove_node(&self, id: &str) -> Result<()> {
        let (store, policy) = {
            let mut topology = self.topology.write().await;

            match topology.nodes.get_mut(id) {
                Some(node) => node.state = NodeState::Draining,
                None => return Err(CacheError::NodeNotFound(id.to_string())),
            }

            topology.ring.remove_virtual_nodes(id);
            let store = topology.stores.remove(id);
            if let Some(mut node) = topology.nodes.remove(id) {
                node.state = NodeState::Removed;
                debug!(node_id = %node.id, state = ?node.state, "Node left the topology");
            }
            Self::rebalance(&mut topology, self.config.initial_virtual_nodes);
            (store, self.config.removal_policy)
        };

        match (store, policy) {
            (Some(store), RemovalPolicy::Migrate) => {
                let migrated = self.migrate_entries(store).await;
                info!(node_id = id, migrated, "Node removed, entries migrated");
            }
            (Some(store), RemovalPolicy::Drop) => {
                let dropped = store.read().await.len();
                info!(node_id = id, dropped, "Node removed, entries dropped");
            }
            (None, _) => {}
        }
        Ok(())
    }

    /// Re-inserts surviving non-expired entries into the nodes now
    /// responsible for their keys. Returns the number migrated.
    async fn migrate_entries(&self, store: Arc<RwLock<NodeStore>>) -> usize {
        let entries = store.write().await.drain();
        let mut migrated = 0;

        for entry in entries {
            if entry.is_expired() {
                continue;
            }
            let target = match self.locate_for_write(&entry.key).await {
                Ok((_, target)) => target,
                Err(_) => break, // last node left the cluster, nothing to migrate into
            };
            let ttl = entry.ttl_remaining_ms();
            if target
                .write()
                .await
                .set(entry.key, entry.value, ttl)
                .is_ok()
            {
                migrated += 1;
            }
        }
        migrated
    }

    // == Locate ==
    /// Resolves a key to a readable node (Active or Draining).
    ///
    /// `Ok(None)` means the failover hop limit was exhausted; the caller
    /// reports a Miss. An empty ring is a topology error instead.
    pub async fn locate_for_read(
        &self,
        key: &str,
    ) -> Result<Option<(String, Arc<RwLock<NodeStore>>)>> {
        self.resolve(key, false).await
    }

    /// Resolves a key to a writable node (Active only). Unlike reads,
    /// a write has to land somewhere, so exhaustion is an error.
    pub async fn locate_for_write(&self, key: &str) -> Result<(String, Arc<RwLock<NodeStore>>)> {
        self.resolve(key, true)
            .await?
            .ok_or(CacheError::NoNodesAvailable)
    }

    async fn resolve(
        &self,
        key: &str,
        for_write: bool,
    ) -> Result<Option<(String, Arc<RwLock<NodeStore>>)>> {
        let topology = self.topology.read().await;
        let primary = topology.ring.locate(key)?.to_string();

        if let Some(store) = Self::acceptable_store(&topology, &primary, for_write) {
            return Ok(Some((primary, store)));
        }

        // Failover: walk the ring clockwise, bounded by the hop limit
        let mut excluding: HashSet<String> = HashSet::new();
        excluding.insert(primary);
        for _ in 0..self.config.failover_hop_limit {
            let candidate = match topology.ring.locate_next(
                key,
                &excluding,
                self.config.failover_hop_limit + excluding.len(),
            ) {
                Some(candidate) => candidate.to_string(),
                None => break,
            };
            if let Some(store) = Self::acceptable_store(&topology, &candidate, for_write) {
                debug!(key, node_id = %candidate, "Failover resolved key to fallback node");
                return Ok(Some((candidate, store)));
            }
            excluding.insert(candidate);
        }

        Ok(None)
    }

    fn acceptable_store(
        topology: &Topology,
        id: &str,
        for_write: bool,
    ) -> Option<Arc<RwLock<NodeStore>>> {
        let node = topology.nodes.get(id)?;
        let acceptable = match node.state {
            NodeState::Active => true,
            NodeState::Draining => !for_write,
            NodeState::Removed => false,
        };
        if !acceptable {
            return None;
        }
        topology.stores.get(id).cloned()
    }

    // == Introspection ==
    /// Ids of registered nodes, sorted.
    pub async fn node_ids(&self) -> Vec<String> {
        let topology = self.topology.read().await;
        let mut ids: Vec<String> = topology.nodes.keys().cloned().collect();
        ids.sort();
        ids
    }

    /// Number of registered nodes.
    pub async fn node_count(&self) -> usize {
        Self::routable_count(&*self.topology.read().await)
    }

    /// State of a registered node; None once it has been removed.
    pub async fn node_state(&self, id: &str) -> Option<NodeState> {
        self.topology
            .read()
            .await
            .nodes
            .get(id)
            .map(|node| node.state)
    }

    /// Snapshot of every routable node's store for stats aggregation.
    pub async fn stores_snapshot(&self) -> Vec<(String, Arc<RwLock<NodeStore>>)> {
        let topology = self.topology.read().await;
        let mut snapshot: Vec<(String, Arc<RwLock<NodeStore>>)> = topology
            .stores
            .iter()
            .map(|(id, store)| (id.clone(), Arc::clone(store)))
            .collect();
        snapshot.sort_by(|a, b| a.0.cmp(&b.0));
        snapshot
    }

    fn routable_count(topology: &Topology) -> usize {
        topology.nodes.len()
    }
}
