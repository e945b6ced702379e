//! Edge domain module
//!
//! Records, keys and the [`EdgeStoreBackend`] contract.
//!
//! ## Data Model
//!
//! - **Edge**: `(namespace, from_node, entity, direction, to_node, distance)`
//! - **EdgeKey**: address of one record
//! - **EdgeScope**: one adjacency set (`namespace, from_node, entity, direction`)
//! - **EdgeFilter**: key prefix for bulk reads and deletes
//!
//! Every link is stored twice, once from each endpoint, so a scope read from
//! either side sees the relation.

mod direction;
mod record;
mod repository;
mod validation;

pub use direction::Direction;
pub use record::{
    DistanceQuery, DistanceRange, Edge, EdgeFilter, EdgeKey, EdgeScope, REINFORCEMENT_BASELINE,
    UndirectedKey, with_inverses,
};
pub use repository::{EdgeStoreBackend, EdgeStream, edge_stream};
pub use validation::FieldCheck;
