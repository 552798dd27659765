//! Property-Based Tests for the Store and Ring Modules
//!
//! Uses proptest to verify correctness properties of the bounded node
//! store and the consistent-hash ring.

use proptest::prelude::*;

use crate::ring::HashRing;
use crate::store::NodeStore;

// == Test Configuration ==
const TEST_MAX_ENTRIES: usize = 100;

// == Strategies ==
/// Generates valid cache keys (non-empty, within length limit)
fn valid_key_strategy() -> impl Strategy<Value = String> {
    "[a-zA-Z0-9_]{1,64}".prop_map(|s| s)
}

/// Generates valid cache values (within size limit)
fn valid_value_strategy() -> impl Strategy<Value = String> {
    "[a-zA-Z0-9 ]{1,256}".prop_map(|s| s)
}

/// Generates a sequence of cache operations for testing
#[derive(Debug, Clone)]
enum CacheOp {
    Set { key: String, value: String },
    Get { key: String },
    Delete { key: String },
}

fn cache_op_strategy() -> impl Strategy<Value = CacheOp> {
    prop_oneof![
        (valid_key_strategy(), valid_value_strategy())
            .prop_map(|(key, value)| CacheOp::Set { key, value }),
        valid_key_strategy().prop_map(|key| CacheOp::Get { key }),
        valid_key_strategy().prop_map(|key| CacheOp::Delete { key }),
    ]
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    // *For any* sequence of cache operations, the statistics (hits, misses)
    // accurately reflect the number of each outcome that occurred.
    #[test]
    fn prop_statistics_accuracy(ops in prop::collection::vec(cache_op_strategy(), 1..50)) {
        let mut store = NodeStore::new(TEST_MAX_ENTRIES, None);
        let mut expected_hits: u64 = 0;
        let mut expected_misses: u64 = 0;

        for op in ops {
            match op {
                CacheOp::Set { key, value } => {
                    let _ = store.set(key, value, None);
                }
                CacheOp::Get { key } => {
                    match store.get(&key) {
                        Some(_) => expected_hits += 1,
                        None => expected_misses += 1,
                    }
                }
                CacheOp::Delete { key } => {
                    let _ = store.delete(&key);
                }
            }
        }

        let stats = store.stats();
        prop_assert_eq!(stats.hits, expected_hits, "Hits mismatch");
        prop_assert_eq!(stats.misses, expected_misses, "Misses mismatch");
        prop_assert_eq!(stats.total_entries, store.len(), "Total entries mismatch");
    }

    // *For any* valid key-value pair, storing the pair and then retrieving it
    // (before expiration) returns the exact same value that was stored.
    #[test]
    fn prop_roundtrip_storage(key in valid_key_strategy(), value in valid_value_strategy()) {
        let mut store = NodeStore::new(TEST_MAX_ENTRIES, None);

        store.set(key.clone(), value.clone(), None).unwrap();
        prop_assert_eq!(store.get(&key), Some(value), "Round-trip value mismatch");
    }

    // *For any* key that exists in the store, after a delete a subsequent
    // get reports a miss.
    #[test]
    fn prop_delete_removes_entry(key in valid_key_strategy(), value in valid_value_strategy()) {
        let mut store = NodeStore::new(TEST_MAX_ENTRIES, None);

        store.set(key.clone(), value, None).unwrap();
        prop_assert!(store.get(&key).is_some(), "Key should exist before delete");

        prop_assert!(store.delete(&key));
        prop_assert!(store.get(&key).is_none(), "Key should not exist after delete");
    }

    // *For any* key, storing V1 and then V2 results in get returning V2.
    #[test]
    fn prop_overwrite_semantics(
        key in valid_key_strategy(),
        value1 in valid_value_strategy(),
        value2 in valid_value_strategy()
    ) {
        let mut store = NodeStore::new(TEST_MAX_ENTRIES, None);

        store.set(key.clone(), value1, None).unwrap();
        store.set(key.clone(), value2.clone(), None).unwrap();

        prop_assert_eq!(store.get(&key), Some(value2), "Overwrite should return new value");
        prop_assert_eq!(store.len(), 1, "Should have exactly one entry after overwrite");
    }

    // *For any* sequence of set operations, the number of entries in the
    // store never exceeds max_entries.
    #[test]
    fn prop_capacity_enforcement(
        entries in prop::collection::vec(
            (valid_key_strategy(), valid_value_strategy()),
            1..200
        )
    ) {
        let max_entries = 50;
        let mut store = NodeStore::new(max_entries, None);

        for (key, value) in entries {
            let _ = store.set(key, value, None);
            prop_assert!(
                store.len() <= max_entries,
                "Store size {} exceeds max {}",
                store.len(),
                max_entries
            );
        }
    }

    // *For any* fixed topology, locate is a pure function of the key.
    #[test]
    fn prop_ring_locate_deterministic(
        keys in prop::collection::vec(valid_key_strategy(), 1..50),
        node_count in 1usize..8
    ) {
        let mut ring = HashRing::new();
        for n in 0..node_count {
            ring.add_virtual_nodes(&format!("node-{}", n), 32);
        }

        for key in keys {
            let first = ring.locate(&key).unwrap().to_string();
            let second = ring.locate(&key).unwrap().to_string();
            prop_assert_eq!(first, second, "locate must be deterministic");
        }
    }

    // *For any* topology, removing a node never routes a key to it again.
    #[test]
    fn prop_ring_removed_node_unroutable(
        keys in prop::collection::vec(valid_key_strategy(), 1..50),
        node_count in 2usize..8
    ) {
        let mut ring = HashRing::new();
        for n in 0..node_count {
            ring.add_virtual_nodes(&format!("node-{}", n), 32);
        }
        ring.remove_virtual_nodes("node-0");

        for key in keys {
            prop_assert_ne!(ring.locate(&key).unwrap(), "node-0");
        }
    }
}

// Property tests for LRU eviction behavior
proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    // *For any* sequence of inserts that fills the store to capacity,
    // adding a new entry evicts the least recently used one.
    #[test]
    fn prop_lru_eviction_order(
        initial_keys in prop::collection::vec(valid_key_strategy(), 3..10),
        new_key in valid_key_strategy(),
        new_value in valid_value_strategy()
    ) {
        // Deduplicate keys to ensure we have unique entries
        let mut unique_keys: Vec<String> = Vec::new();
        for key in initial_keys {
            if !unique_keys.contains(&key) {
                unique_keys.push(key);
            }
        }

        prop_assume!(unique_keys.len() >= 2);
        prop_assume!(!unique_keys.contains(&new_key));

        let capacity = unique_keys.len();
        let mut store = NodeStore::new(capacity, None);

        // Fill to capacity - first key added is the LRU candidate
        let oldest_key = unique_keys[0].clone();
        for key in &unique_keys {
            store.set(key.clone(), format!("value_{}", key), None).unwrap();
        }
        prop_assert_eq!(store.len(), capacity, "Store should be at capacity");

        store.set(new_key.clone(), new_value, None).unwrap();

        prop_assert_eq!(store.len(), capacity, "Store should remain at capacity after eviction");
        prop_assert!(
            store.get(&oldest_key).is_none(),
            "Oldest key '{}' should have been evicted",
            oldest_key
        );
        prop_assert!(store.get(&new_key).is_some(), "New key should exist after insertion");

        for key in unique_keys.iter().skip(1) {
            prop_assert!(
                store.has(key),
                "Key '{}' should still exist (not the oldest)",
                key
            );
        }
    }

    // *For any* get on an existing key, that key becomes the most recently
    // used and is not the next eviction candidate.
    #[test]
    fn prop_lru_access_tracking(
        keys in prop::collection::vec(valid_key_strategy(), 3..8),
        new_key in valid_key_strategy(),
        new_value in valid_value_strategy()
    ) {
        let mut unique_keys: Vec<String> = Vec::new();
        for key in keys {
            if !unique_keys.contains(&key) {
                unique_keys.push(key);
            }
        }

        prop_assume!(unique_keys.len() >= 3);
        prop_assume!(!unique_keys.contains(&new_key));

        let capacity = unique_keys.len();
        let mut store = NodeStore::new(capacity, None);

        for key in &unique_keys {
            store.set(key.clone(), format!("value_{}", key), None).unwrap();
        }

        // Touch the current LRU candidate; the next key becomes oldest
        let accessed_key = unique_keys[0].clone();
        let _ = store.get(&accessed_key);
        let expected_evicted = unique_keys[1].clone();

        store.set(new_key.clone(), new_value, None).unwrap();

        prop_assert!(
            store.has(&accessed_key),
            "Accessed key '{}' should not be evicted after being touched",
            accessed_key
        );
        prop_assert!(
            !store.has(&expected_evicted),
            "Key '{}' should have been evicted as the oldest after access",
            expected_evicted
        );
        prop_assert!(store.has(&new_key), "New key should exist");
    }
}
