//! Shardcache - sharded in-process cache engine demo
//!
//! Drives a multi-node cache with a synthetic workload and periodically
//! logs an aggregated stats snapshot.

mod cache;
mod cluster;
mod config;
mod error;
mod ring;
mod store;
mod tasks;

use std::time::Duration;

use anyhow::Context;
use tokio::signal;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use cache::DistributedCache;
use config::CacheConfig;

/// Main entry point for the shardcache demo driver.
///
/// # Startup Sequence
/// 1. Initialize tracing subscriber for logging
/// 2. Load configuration from environment variables
/// 3. Build a cache engine with a handful of nodes
/// 4. Run a synthetic workload, logging stats snapshots
/// 5. Handle graceful shutdown on SIGINT/SIGTERM
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing subscriber with env filter
    // Defaults to "info" level, can be overridden with RUST_LOG env var
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "shardcache=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting shardcache demo");

    let config = CacheConfig::from_env();
    info!(
        "Configuration loaded: max_entries_per_node={}, sweep_interval_ms={}, initial_virtual_nodes={}",
        config.max_entries_per_node, config.sweep_interval_ms, config.initial_virtual_nodes
    );

    let cache = DistributedCache::with_nodes(config, &["node-1", "node-2", "node-3", "node-4"])
        .await
        .context("failed to build cache engine")?;
    info!(nodes = ?cache.node_ids().await, "Cluster initialized");

    tokio::select! {
        result = run_workload(&cache) => result?,
        _ = shutdown_signal() => {
            info!("Shutdown signal received");
        }
    }

    cache.shutdown().await;
    info!("Shutdown complete");
    Ok(())
}

/// Endless synthetic workload: mixed sets and gets over a rotating key
/// space, with a stats snapshot logged every few seconds.
async fn run_workload(cache: &DistributedCache) -> anyhow::Result<()> {
    let mut round: u64 = 0;
    loop {
        for i in 0..100 {
            let key = format!("key-{}", (round * 37 + i) % 5000);
            if i % 3 == 0 {
                cache.set(&key, &format!("value-{}", round), Some(30_000)).await?;
            } else {
                let _ = cache.get(&key).await?;
            }
        }
        round += 1;

        if round % 50 == 0 {
            let snapshot = cache.stats().await;
            info!(
                stats = %serde_json::to_string(&snapshot)?,
                "Periodic stats snapshot"
            );
        }
        tokio::time::sleep(Duration::from_millis(100)).await;
    }
}

/// Waits for shutdown signal (Ctrl+C or SIGTERM).
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, initiating shutdown...");
        }
        _ = terminate => {
            info!("Received SIGTERM, initiating shutdown...");
        }
    }
}
