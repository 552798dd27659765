//! Key Distribution Tracker Module
//!
//! Bounded observer sampling which physical node serves which keys, for
//! skew monitoring. The sample map is itself LRU-bounded so the
//! monitoring structure can never outgrow the cache it watches.

use std::collections::HashMap;

use crate::store::LruArena;

// == Tracked Key ==
#[derive(Debug)]
struct TrackedKey {
    key: String,
    node_id: String,
}

// == Key Distribution Tracker ==
/// LRU-bounded sample of key-to-node assignments.
///
/// Per-node counts are maintained incrementally, so reading the
/// distribution is O(nodes) rather than O(samples).
#[derive(Debug)]
pub struct KeyDistributionTracker {
    /// Cache key to sample slot
    index: HashMap<String, usize>,
    /// Samples ordered by observation recency
    samples: LruArena<TrackedKey>,
    /// Tracked-key count per physical node
    counts: HashMap<String, u64>,
    /// Maximum number of keys sampled at once
    max_tracked_keys: usize,
}

impl KeyDistributionTracker {
    // == Constructor ==
    /// Creates a tracker bounded at `max_tracked_keys` samples.
    pub fn new(max_tracked_keys: usize) -> Self {
        Self {
            index: HashMap::new(),
            samples: LruArena::new(),
            counts: HashMap::new(),
            max_tracked_keys,
        }
    }

    // == Record ==
    /// Records that `key` was served by `node_id`.
    ///
    /// Re-observing a key refreshes its recency and, if the assignment
    /// moved, shifts the per-node counts. When the sample bound is
    /// reached the least recently observed key is dropped first.
    pub fn record(&mut self, key: &str, node_id: &str) {
        if let Some(&slot) = self.index.get(key) {
            let previous = self
                .samples
                .get(slot)
                .map(|sample| sample.node_id.clone());
            if let Some(previous_node) = previous {
                if previous_node != node_id {
                    self.decrement(&previous_node);
                    *self.counts.entry(node_id.to_string()).or_insert(0) += 1;
                    if let Some(sample) = self.samples.get_mut(slot) {
                        sample.node_id = node_id.to_string();
                    }
                }
            }
            self.samples.move_to_front(slot);
            return;
        }

        if self.samples.len() >= self.max_tracked_keys {
            if let Some(dropped) = self.samples.pop_back() {
                self.index.remove(&dropped.key);
                self.decrement(&dropped.node_id);
            }
        }

        let slot = self.samples.push_front(TrackedKey {
            key: key.to_string(),
            node_id: node_id.to_string(),
        });
        self.index.insert(key.to_string(), slot);
        *self.counts.entry(node_id.to_string()).or_insert(0) += 1;
    }

    // == Forget Node ==
    /// Drops every sample pointing at a removed node.
    pub fn forget_node(&mut self, node_id: &str) {
        let keys: Vec<(String, usize)> = self
            .index
            .iter()
            .filter(|(_, &slot)| {
                self.samples
                    .get(slot)
                    .map(|sample| sample.node_id == node_id)
                    .unwrap_or(false)
            })
            .map(|(key, &slot)| (key.clone(), slot))
            .collect();

        for (key, slot) in keys {
            self.samples.remove(slot);
            self.index.remove(&key);
        }
        self.counts.remove(node_id);
    }

    // == Distribution ==
    /// Tracked-key counts per physical node.
    pub fn distribution(&self) -> HashMap<String, u64> {
        self.counts
            .iter()
            .filter(|(_, &count)| count > 0)
            .map(|(node, &count)| (node.clone(), count))
            .collect()
    }

    // == Skew Index ==
    /// Relative deviation of the busiest node from the mean share.
    ///
    /// 0.0 means perfectly uniform (or nothing sampled yet); 0.2 means
    /// the busiest node holds 20% more tracked keys than the mean.
    pub fn skew_index(&self) -> f64 {
        let populated: Vec<u64> = self.counts.values().copied().filter(|&c| c > 0).collect();
        if populated.len() < 2 {
            return 0.0;
        }
        let total: u64 = populated.iter().sum();
        let mean = total as f64 / populated.len() as f64;
        let max = populated.iter().copied().max().unwrap_or(0) as f64;
        (max - mean) / mean
    }

    // == Length ==
    /// Number of keys currently sampled.
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    /// Returns true if nothing has been sampled.
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    fn decrement(&mut self, node_id: &str) {
        if let Some(count) = self.counts.get_mut(node_id) {
            *count = count.saturating_sub(1);
        }
    }
}
