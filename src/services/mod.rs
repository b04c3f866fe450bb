//! Service layer
//!
//! - `store`: document store trait and its PostgreSQL implementation
//! - `reader` / `merger`: the fetch and create-or-merge operations
//! - `key_lock`: per-user serialization for merges
//! - `metrics`: Prometheus collectors

pub mod key_lock;
pub mod merger;
pub mod metrics;
pub mod reader;
pub mod store;

#[cfg(test)]
pub mod memory_store;
