//! Infrastructure layer
//!
//! Concrete edge store backends, node stores and backend decorators.

pub mod keys;
pub mod node;
pub mod range;
pub mod table;
pub mod timeout;

pub use node::{MemoryNodeStore, SqliteNodeStore};
pub use range::{MemorySortedSets, RangeEdgeStore, SortedSetClient};
pub use table::SqliteEdgeStore;
pub use timeout::TimeoutBackend;
