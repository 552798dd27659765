//! TTL Sweep Task
//!
//! Background task that periodically removes expired entries from one
//! node store, bounding memory even without active reads.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::RwLock;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::store::NodeStore;

/// Spawns a background task that periodically sweeps expired entries
/// from one node store.
///
/// Each pass removes at most `batch_limit` entries so the store's lock
/// is never held for unbounded time; leftovers wait for the next tick.
/// A failed pass is logged and the loop keeps running.
///
/// # Arguments
/// * `node_id` - Id of the node the store belongs to (for logging)
/// * `store` - Shared reference to the node store
/// * `interval_ms` - Interval between sweep passes in milliseconds
/// * `batch_limit` - Maximum entries removed per pass
///
/// # Returns
/// A JoinHandle for the spawned task, which is aborted on node removal
/// or engine shutdown.
pub fn spawn_sweep_task(
    node_id: String,
    store: Arc<RwLock<NodeStore>>,
    interval_ms: u64,
    batch_limit: usize,
) -> JoinHandle<()> {
    let interval = Duration::from_millis(interval_ms);

    tokio::spawn(async move {
        info!(
            node_id = %node_id,
            interval_ms,
            batch_limit,
            "Starting TTL sweep task"
        );

        loop {
            tokio::time::sleep(interval).await;

            let removed = match tokio::spawn({
                let store = Arc::clone(&store);
                async move { store.write().await.sweep_expired(batch_limit) }
            })
            .await
            {
                Ok(removed) => removed,
                Err(join_error) => {
                    // A panicking pass must not kill the sweep loop
                    warn!(node_id = %node_id, error = %join_error, "TTL sweep pass failed");
                    continue;
                }
            };

            if removed > 0 {
                info!(node_id = %node_id, removed, "TTL sweep removed expired entries");
            } else {
                debug!(node_id = %node_id, "TTL sweep found no expired entries");
            }
        }
    })
}
