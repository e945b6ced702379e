//! Neighbor sources for traversal hops

use async_trait::async_trait;

use crate::domain::edge::{Direction, Edge, EdgeStoreBackend};
use crate::domain::graph::{ClosestQuery, GraphEngine};
use crate::error::Result;

/// Anything that can answer "closest neighbors of this node"
///
/// The local engine implements it; a federated peer can too, and traversal
/// treats both the same way.
#[async_trait]
pub trait ClosestSource: Send + Sync {
    /// Neighbors ascending by distance
    async fn closest(
        &self,
        namespace: &str,
        entity: &str,
        from_node: &str,
        direction: Direction,
    ) -> Result<Vec<Edge>>;
}

#[async_trait]
impl<B: EdgeStoreBackend + ?Sized> ClosestSource for GraphEngine<B> {
    async fn closest(
        &self,
        namespace: &str,
        entity: &str,
        from_node: &str,
        direction: Direction,
    ) -> Result<Vec<Edge>> {
        let query = ClosestQuery::new(entity, from_node)
            .namespace(namespace)
            .direction(direction);
        GraphEngine::closest(self, &query).await
    }
}
