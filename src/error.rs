//! Error types for the cache engine
//!
//! Provides unified error handling using thiserror.
//!
//! Cache misses are not errors: `get` returns `None` and `has` returns
//! `false` for absent or expired keys. Errors are reserved for invalid
//! input, topology problems and lifecycle violations.

use thiserror::Error;

// == Cache Error Enum ==
/// Unified error type for the cache engine.
#[derive(Error, Debug)]
pub enum CacheError {
    /// Invalid request data (oversized key/value, empty node id, ...)
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Invalid configuration detected at construction time
    #[error("Invalid configuration: {0}")]
    Configuration(String),

    /// The hash ring has no routable nodes
    #[error("No nodes available in the cluster")]
    NoNodesAvailable,

    /// Referenced physical node does not exist
    #[error("Node not found: {0}")]
    NodeNotFound(String),

    /// Physical node id is already registered
    #[error("Node already exists: {0}")]
    NodeAlreadyExists(String),

    /// Mutating call received after shutdown began
    #[error("Cache is shutting down")]
    Shutdown,
}

// == Result Type Alias ==
/// Convenience Result type for the cache engine.
pub type Result<T> = std::result::Result<T, CacheError>;
