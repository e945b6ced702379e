//! Table-store backend family
//!
//! Edges are rows keyed by a partition key and a sort key, with a secondary
//! index on (base_key, distance) for proximity reads. Backed by SQLite.

mod keys;
mod store;

pub use keys::{RowKeys, base_key, partition_key};
pub use store::SqliteEdgeStore;
