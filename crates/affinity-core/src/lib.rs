//! Affinity Core Library
//!
//! This crate provides the core functionality for Affinity, including:
//! - Weighted, reinforced edges between nodes (link, closest, fan-out)
//! - Interchangeable edge stores (SQLite table store, sorted-set range store)
//! - Multi-hop traversal with path frequencies
//! - Firehose ingestion with coalescing of queued events
//! - Node metadata documents
//! - Configuration and storage assembly

pub mod config;
pub mod domain;
pub mod error;
pub mod infrastructure;
pub mod storage;

pub use error::{Error, Result};

/// Re-export commonly used types
pub mod prelude {
    pub use crate::config::Config;
    pub use crate::domain::edge::{Direction, Edge, EdgeFilter, EdgeKey, EdgeScope, EdgeStoreBackend};
    pub use crate::domain::graph::{ClosestQuery, GraphEngine, LinkRequest};
    pub use crate::domain::traversal::{TraversalJob, TraversalOptions, TraversalResult};
    pub use crate::error::{Error, Result};
    pub use crate::storage::GraphStore;
}
