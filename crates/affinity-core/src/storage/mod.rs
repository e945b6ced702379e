//! Storage layer - SQLite persistence and backend assembly
//!
//! # Architecture
//!
//! - `database`: Connection pool management and initialization
//! - `migrations`: Schema versioning and automatic migration
//! - `backend`: Builds the configured edge and node stores
//!
//! # Usage
//!
//! ```ignore
//! use affinity_core::config::Config;
//! use affinity_core::storage::GraphStore;
//!
//! let store = GraphStore::open(&Config::load()?).await?;
//! let edges = store.engine.closest(&ClosestQuery::new("viewed", "u1")).await?;
//! ```

pub mod backend;
pub mod database;
pub mod migrations;

// Re-export commonly used types
pub use backend::GraphStore;
pub use database::{DEFAULT_MAX_CONNECTIONS, Database, DatabaseConfig, default_database_path};
pub use migrations::{CURRENT_VERSION, MigrationStatus, migration_status, run_migrations};
