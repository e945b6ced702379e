//! Range-store backend family
//!
//! Edges live in sorted sets keyed by colon-joined scope components, with the
//! target node as member and the distance as score. The datastore is reached
//! through [`SortedSetClient`]; [`MemorySortedSets`] is the in-process client.

mod client;
mod keys;
mod memory;
mod store;

pub use client::{ScoreBounds, SortedSetClient};
pub use keys::{filter_pattern, parse_scope_key, scope_key};
pub use memory::MemorySortedSets;
pub use store::RangeEdgeStore;
