//! Node metadata store implementations

mod memory;
mod sqlite;

pub use memory::MemoryNodeStore;
pub use sqlite::SqliteNodeStore;
