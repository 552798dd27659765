//! Integration tests for the sharded cache engine
//!
//! Exercises ring topology guarantees, cluster membership changes,
//! failover behavior and engine lifecycle through the public API.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::Duration;

use shardcache::{CacheConfig, CacheError, DistributedCache, HashRing};

fn engine_config() -> CacheConfig {
    CacheConfig {
        max_entries_per_node: 5_000,
        ..CacheConfig::default()
    }
}

fn eight_node_ring() -> HashRing {
    let mut ring = HashRing::new();
    for n in 1..=8 {
        ring.add_virtual_nodes(&format!("node-{}", n), 128);
    }
    ring
}

// == Ring Topology ==

#[test]
fn locate_is_deterministic_for_fixed_topology() {
    let ring = eight_node_ring();
    for i in 0..10_000 {
        let key = format!("key-{}", i);
        let first = ring.locate(&key).unwrap().to_string();
        assert_eq!(ring.locate(&key).unwrap(), first);
    }
}

#[test]
fn adding_ninth_node_remaps_bounded_fraction() {
    let before = eight_node_ring();
    let mut after = eight_node_ring();
    after.add_virtual_nodes("node-9", 128);

    let total = 10_000;
    let mut remapped = 0;
    for i in 0..total {
        let key = format!("key-{}", i);
        if before.locate(&key).unwrap() != after.locate(&key).unwrap() {
            remapped += 1;
        }
    }

    // Consistent hashing promises minimal disruption: roughly 1/9 of
    // keys move, generously bounded at 20%
    assert!(
        remapped <= total / 5,
        "{} of {} keys remapped",
        remapped,
        total
    );
    assert!(remapped > 0, "some keys must map to the new node");
}

#[test]
fn key_distribution_is_balanced() {
    let ring = eight_node_ring();

    let mut counts: HashMap<String, usize> = HashMap::new();
    let total = 10_000usize;
    for i in 0..total {
        let key = format!("key-{}", i);
        *counts
            .entry(ring.locate(&key).unwrap().to_string())
            .or_insert(0) += 1;
    }

    assert_eq!(counts.len(), 8, "every node should receive keys");
    let mean = total as f64 / 8.0;
    for (node, count) in &counts {
        assert!(
            (*count as f64) <= mean * 1.2,
            "node {} holds {} keys, more than 20% above the mean {}",
            node,
            count,
            mean
        );
    }
}

// == Cluster Membership ==

#[tokio::test]
async fn adding_a_node_keeps_most_entries_reachable() {
    let cache = DistributedCache::with_nodes(
        engine_config(),
        &[
            "node-1", "node-2", "node-3", "node-4", "node-5", "node-6", "node-7", "node-8",
        ],
    )
    .await
    .unwrap();

    let total = 10_000;
    for i in 0..total {
        cache
            .set(&format!("key-{}", i), &format!("value-{}", i), None)
            .await
            .unwrap();
    }

    cache.add_node("node-9").await.unwrap();
    assert_eq!(cache.node_ids().await.len(), 9);

    // Keys remapped to the new node become misses; the bounded-remap
    // guarantee means most entries stay reachable
    let mut hits = 0;
    for i in 0..total {
        if cache
            .get(&format!("key-{}", i))
            .await
            .unwrap()
            .is_some()
        {
            hits += 1;
        }
    }
    assert!(
        hits >= total * 4 / 5,
        "only {} of {} entries survived the topology change",
        hits,
        total
    );

    cache.shutdown().await;
}

#[tokio::test]
async fn removed_node_entries_become_misses_not_errors() {
    let cache = DistributedCache::with_nodes(engine_config(), &["node-1", "node-2", "node-3"])
        .await
        .unwrap();

    for i in 0..300 {
        cache.set(&format!("key-{}", i), "v", None).await.unwrap();
    }

    cache.remove_node("node-2").await.unwrap();

    // Every get must still succeed; lost entries surface as None
    for i in 0..300 {
        let result = cache.get(&format!("key-{}", i)).await;
        assert!(result.is_ok(), "get errored after node removal");
    }

    cache.shutdown().await;
}

#[tokio::test]
async fn last_node_removal_empties_the_cluster() {
    let cache = DistributedCache::with_nodes(engine_config(), &["node-1"])
        .await
        .unwrap();

    cache.set("key", "value", None).await.unwrap();
    cache.remove_node("node-1").await.unwrap();

    assert!(cache.node_ids().await.is_empty());
    assert!(matches!(
        cache.get("key").await,
        Err(CacheError::NoNodesAvailable)
    ));

    cache.shutdown().await;
}

// == Distribution Tracking ==

#[tokio::test]
async fn tracker_map_never_exceeds_its_bound() {
    let config = CacheConfig {
        max_tracked_keys: 100,
        ..engine_config()
    };
    let cache = DistributedCache::with_nodes(config, &["node-1", "node-2", "node-3"])
        .await
        .unwrap();

    for i in 0..5_000 {
        cache.set(&format!("key-{}", i), "v", None).await.unwrap();
    }

    let distribution = cache.key_distribution().await;
    let tracked: u64 = distribution.values().sum();
    assert!(
        tracked <= 100,
        "tracker grew to {} samples past its bound",
        tracked
    );

    cache.shutdown().await;
}

#[tokio::test]
async fn skew_index_reflects_observed_balance() {
    let cache = DistributedCache::with_nodes(engine_config(), &["node-1", "node-2", "node-3"])
        .await
        .unwrap();

    for i in 0..1_000 {
        cache.set(&format!("key-{}", i), "v", None).await.unwrap();
    }

    let stats = cache.stats().await;
    assert!(stats.skew_index >= 0.0);
    assert!(
        stats.skew_index < 1.0,
        "skew {} implies a badly imbalanced ring",
        stats.skew_index
    );

    cache.shutdown().await;
}

// == Concurrency ==

#[tokio::test]
async fn concurrent_callers_against_different_shards() {
    let cache = Arc::new(
        DistributedCache::with_nodes(engine_config(), &["node-1", "node-2", "node-3", "node-4"])
            .await
            .unwrap(),
    );

    let mut handles = Vec::new();
    for task in 0..8 {
        let cache = Arc::clone(&cache);
        handles.push(tokio::spawn(async move {
            for i in 0..200 {
                let key = format!("task-{}-key-{}", task, i);
                cache.set(&key, &format!("value-{}", i), None).await?;
                let value = cache.get(&key).await?;
                assert_eq!(value, Some(format!("value-{}", i)));
            }
            Ok::<_, CacheError>(())
        }));
    }

    for handle in handles {
        handle.await.unwrap().unwrap();
    }

    let stats = cache.stats().await;
    assert_eq!(stats.total_hits, 8 * 200);

    cache.shutdown().await;
}

#[tokio::test]
async fn concurrent_reads_during_topology_change() {
    let cache = Arc::new(
        DistributedCache::with_nodes(engine_config(), &["node-1", "node-2", "node-3"])
            .await
            .unwrap(),
    );

    for i in 0..500 {
        cache.set(&format!("key-{}", i), "v", None).await.unwrap();
    }

    let reader = {
        let cache = Arc::clone(&cache);
        tokio::spawn(async move {
            for round in 0..20u64 {
                for i in 0..500 {
                    // Misses are fine mid-rebalance; errors are not
                    cache.get(&format!("key-{}", i)).await?;
                }
                tokio::time::sleep(Duration::from_millis(round % 3)).await;
            }
            Ok::<_, CacheError>(())
        })
    };

    cache.remove_node("node-3").await.unwrap();
    cache.add_node("node-4").await.unwrap();

    reader.await.unwrap().unwrap();
    cache.shutdown().await;
}

// == Lifecycle ==

#[tokio::test]
async fn shutdown_rejects_mutations_but_is_idempotent() {
    let cache = DistributedCache::with_nodes(engine_config(), &["node-1", "node-2"])
        .await
        .unwrap();

    cache.set("key", "value", None).await.unwrap();
    cache.shutdown().await;
    cache.shutdown().await;

    assert!(matches!(
        cache.set("key", "other", None).await,
        Err(CacheError::Shutdown)
    ));
    assert!(matches!(
        cache.delete("key").await,
        Err(CacheError::Shutdown)
    ));
    assert!(matches!(
        cache.remove_node("node-1").await,
        Err(CacheError::Shutdown)
    ));
}

#[tokio::test]
async fn ttl_expiry_observed_across_the_cluster() {
    let cache = DistributedCache::with_nodes(engine_config(), &["node-1", "node-2", "node-3"])
        .await
        .unwrap();

    for i in 0..30 {
        cache
            .set(&format!("short-{}", i), "v", Some(50))
            .await
            .unwrap();
    }

    tokio::time::sleep(Duration::from_millis(60)).await;

    for i in 0..30 {
        assert_eq!(cache.get(&format!("short-{}", i)).await.unwrap(), None);
    }

    let stats = cache.stats().await;
    assert_eq!(stats.total_expirations, 30);

    cache.shutdown().await;
}

// == Determinism Across Instances ==

#[tokio::test]
async fn two_engines_with_same_topology_agree_on_placement() {
    let a = DistributedCache::with_nodes(engine_config(), &["node-1", "node-2", "node-3"])
        .await
        .unwrap();
    let b = DistributedCache::with_nodes(engine_config(), &["node-1", "node-2", "node-3"])
        .await
        .unwrap();

    for i in 0..100 {
        let key = format!("key-{}", i);
        a.set(&key, "from-a", None).await.unwrap();
        b.set(&key, "from-b", None).await.unwrap();
    }

    // Identical topology must shard identically: per-node sizes match
    let sizes_a = a.stats().await.per_node_sizes;
    let sizes_b = b.stats().await.per_node_sizes;
    assert_eq!(sizes_a, sizes_b);

    let ids_a: HashSet<String> = a.node_ids().await.into_iter().collect();
    let ids_b: HashSet<String> = b.node_ids().await.into_iter().collect();
    assert_eq!(ids_a, ids_b);

    a.shutdown().await;
    b.shutdown().await;
}
