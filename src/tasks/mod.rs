//! Background Tasks Module
//!
//! Contains background tasks that run periodically while the engine is up.
//!
//! # Tasks
//! - TTL Sweep: removes expired entries from a node store at fixed intervals

mod sweep;

pub use sweep::spawn_sweep_task;
