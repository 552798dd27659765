//! Hash Ring Module
//!
//! Sorted array of virtual-node positions resolving keys to physical nodes.
//!
//! Each physical node owns several ring positions (virtual nodes) derived
//! by hashing `"{physical_id}:{replica_index}"`, which smooths key
//! distribution and keeps placement reproducible for the same inputs.

use std::collections::HashSet;

use crate::error::{CacheError, Result};
use crate::ring::hasher::fnv1a;

// == Virtual Node ==
/// A single ring position mapped to one physical node.
///
/// Immutable once created; the ring owns a hash-sorted sequence of these.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VirtualNode {
    /// Position on the ring
    pub hash: u32,
    /// Id of the owning physical node
    pub physical_id: String,
}

// == Hash Ring ==
/// Consistent-hash ring over virtual nodes.
///
/// Lookup is O(log V) via binary search for the first position with
/// `hash >= target`, wrapping to index 0 past the highest position.
#[derive(Debug, Clone, Default)]
pub struct HashRing {
    /// Virtual nodes sorted by `(hash, physical_id)`
    vnodes: Vec<VirtualNode>,
}

impl HashRing {
    // == Constructor ==
    /// Creates a new empty ring.
    pub fn new() -> Self {
        Self { vnodes: Vec::new() }
    }

    // == Add Virtual Nodes ==
    /// Inserts `count` virtual nodes for a physical node.
    ///
    /// Positions derive from `"{physical_id}:{replica_index}"` for each
    /// replica index in `[0, count)`, so the same id and count always
    /// reproduce the same placement. The label digest is hashed a second
    /// time: sequential replica labels land on correlated FNV-1a values,
    /// and rehashing the digest bytes decorrelates them.
    pub fn add_virtual_nodes(&mut self, physical_id: &str, count: u32) {
        for replica_index in 0..count {
            let label = fnv1a(format!("{}:{}", physical_id, replica_index).as_bytes());
            let position = fnv1a(&label.to_le_bytes());
            self.vnodes.push(VirtualNode {
                hash: position,
                physical_id: physical_id.to_string(),
            });
        }
        // Secondary sort on id keeps ordering total under hash collisions
        self.vnodes
            .sort_by(|a, b| a.hash.cmp(&b.hash).then_with(|| a.physical_id.cmp(&b.physical_id)));
    }

    // == Remove Virtual Nodes ==
    /// Removes every virtual node belonging to a physical node.
    pub fn remove_virtual_nodes(&mut self, physical_id: &str) {
        self.vnodes.retain(|vnode| vnode.physical_id != physical_id);
    }

    // == Locate ==
    /// Resolves a key to its owning physical node id.
    ///
    /// Returns `NoNodesAvailable` if the ring is empty.
    pub fn locate(&self, key: &str) -> Result<&str> {
        if self.vnodes.is_empty() {
            return Err(CacheError::NoNodesAvailable);
        }
        let index = self.successor_index(fnv1a(key.as_bytes()));
        Ok(&self.vnodes[index].physical_id)
    }

    // == Locate Next ==
    /// Resolves a key to the next distinct physical node clockwise,
    /// skipping any id in `excluding`.
    ///
    /// Examines at most `hop_limit` distinct physical nodes before
    /// reporting exhaustion with `None`. Used for failover.
    pub fn locate_next(
        &self,
        key: &str,
        excluding: &HashSet<String>,
        hop_limit: usize,
    ) -> Option<&str> {
        if self.vnodes.is_empty() {
            return None;
        }

        let start = self.successor_index(fnv1a(key.as_bytes()));
        let mut seen: HashSet<&str> = HashSet::new();

        for offset in 0..self.vnodes.len() {
            let vnode = &self.vnodes[(start + offset) % self.vnodes.len()];
            let id = vnode.physical_id.as_str();
            if !seen.insert(id) {
                continue;
            }
            if !excluding.contains(id) {
                return Some(id);
            }
            if seen.len() >= hop_limit {
                return None;
            }
        }
        None
    }

    // == Successor Index ==
    /// Index of the first virtual node with `hash >= target`, wrapping to 0.
    fn successor_index(&self, target: u32) -> usize {
        let index = self.vnodes.partition_point(|vnode| vnode.hash < target);
        if index == self.vnodes.len() {
            0
        } else {
            index
        }
    }

    // == Virtual Node Count ==
    /// Total number of virtual nodes on the ring.
    pub fn len(&self) -> usize {
        self.vnodes.len()
    }

    /// Returns true if the ring holds no virtual nodes.
    pub fn is_empty(&self) -> bool {
        self.vnodes.is_empty()
    }

    // == Physical Ids ==
    /// Distinct physical node ids present on the ring.
    pub fn physical_ids(&self) -> HashSet<&str> {
        self.vnodes
            .iter()
            .map(|vnode| vnode.physical_id.as_str())
            .collect()
    }
}
