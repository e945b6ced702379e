//! Graph domain module
//!
//! [`GraphEngine`] sits between callers and an [`EdgeStoreBackend`]:
//!
//! - **link**: writes or reinforces the forward record and its inverse as a unit
//! - **closest**: neighbors ordered by distance
//! - **all_all / cross_link**: bounded fan-out over many links
//! - **count / edges / delete / delete_by_node**: reads and removal
//!
//! [`EdgeStoreBackend`]: crate::domain::edge::EdgeStoreBackend

mod config;
mod engine;
mod fanout;
mod link;

pub use config::{
    DEFAULT_CROSS_SUFFIX, DEFAULT_DECREMENT_PATH, DEFAULT_FANOUT_CONCURRENCY, DEFAULT_NAMESPACE,
    EngineConfig,
};
pub use engine::GraphEngine;
pub use fanout::{AllAllRequest, CrossLinkRequest, PairWeight, WeightFn};
pub use link::{ClosestQuery, LinkRequest};
