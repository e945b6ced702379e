//! Domain layer
//!
//! Backend-agnostic types and algorithms: edge records and the store contract,
//! the graph engine, traversal, ingestion and node metadata.

pub mod edge;
pub mod graph;
pub mod ingest;
pub mod node;
pub mod traversal;
