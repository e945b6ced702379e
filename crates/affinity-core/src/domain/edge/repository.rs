//! Edge store contract
//!
//! This module defines the trait every storage backend implements. The graph
//! engine, traversal and ingestion layers depend on nothing else, so any store
//! offering an atomic numeric increment plus ordered range reads can back them.

use async_trait::async_trait;
use futures_core::Stream;
use futures_util::stream::BoxStream;

use crate::error::Result;

use super::record::{DistanceQuery, Edge, EdgeFilter, EdgeKey, EdgeScope};

/// Lazily produced stream of deleted edges
pub type EdgeStream<'a> = BoxStream<'a, Result<Edge>>;

/// Box a concrete edge stream, pinning down its item type
pub fn edge_stream<'a, S>(stream: S) -> EdgeStream<'a>
where
    S: Stream<Item = Result<Edge>> + Send + 'a,
{
    Box::pin(stream)
}

/// Backend-agnostic edge store
///
/// Implementations validate their inputs before touching storage and must keep
/// identical external semantics; they differ only in how keys are laid out.
#[async_trait]
pub trait EdgeStoreBackend: Send + Sync {
    /// Short backend name used in logs
    fn name(&self) -> &'static str;

    /// Number of records in one adjacency set
    async fn count_edges(&self, scope: &EdgeScope) -> Result<u64>;

    /// Write one record and return its stored distance
    ///
    /// With `increment == false` the distance is written as given. With
    /// `increment == true`, `distance` is a delta added atomically to the stored
    /// value; a record that does not exist yet starts from
    /// [`REINFORCEMENT_BASELINE`](super::record::REINFORCEMENT_BASELINE). The
    /// result never goes below zero.
    async fn set_edge(&self, key: &EdgeKey, distance: f64, increment: bool) -> Result<f64>;

    /// Records under a key prefix
    ///
    /// When the filter names a `from_node` and `inverse` is set, each record is
    /// followed by its synthesized inverse.
    async fn get_edges(&self, filter: &EdgeFilter, inverse: bool) -> Result<Vec<Edge>>;

    /// One adjacency set ordered by distance, ascending unless `query.desc`
    async fn get_edges_by_distance(&self, query: &DistanceQuery) -> Result<Vec<Edge>>;

    /// Remove one record, or the record and its inverse. Absent records are skipped.
    async fn delete_edge(&self, key: &EdgeKey, inverse: bool) -> Result<Vec<Edge>>;

    /// Remove every record under a key prefix, yielding each as it is deleted
    fn delete_edges<'a>(&'a self, filter: &'a EdgeFilter) -> EdgeStream<'a>;
}
