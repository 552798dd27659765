//! Ring Module
//!
//! Consistent-hash ring with virtual nodes for key-to-node placement.

mod hasher;
#[allow(clippy::module_inception)]
mod ring;

pub use hasher::fnv1a;
pub use ring::{HashRing, VirtualNode};
