//! Backend-agnostic graph engine
//!
//! Keeps both records of every relation in step, turns repeated links into a
//! shrinking distance, and answers proximity queries.

use std::sync::Arc;

use futures_util::TryStreamExt;
use tracing::{debug, info};

use crate::domain::edge::{
    Direction, DistanceQuery, Edge, EdgeFilter, EdgeKey, EdgeScope, EdgeStoreBackend, FieldCheck,
};
use crate::error::Result;

use super::config::EngineConfig;
use super::link::{ClosestQuery, LinkRequest};

pub struct GraphEngine<B: ?Sized = dyn EdgeStoreBackend> {
    backend: Arc<B>,
    config: EngineConfig,
}

impl<B: ?Sized> Clone for GraphEngine<B> {
    fn clone(&self) -> Self {
        Self {
            backend: Arc::clone(&self.backend),
            config: self.config.clone(),
        }
    }
}

impl<B: EdgeStoreBackend + ?Sized> GraphEngine<B> {
    /// Build an engine; invalid settings fail here rather than on first use
    pub fn new(backend: Arc<B>, config: EngineConfig) -> Result<Self> {
        config.validate()?;
        debug!(backend = backend.name(), namespace = %config.namespace, "Graph engine created");
        Ok(Self { backend, config })
    }

    pub fn backend(&self) -> &Arc<B> {
        &self.backend
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    fn namespace_or<'a>(&'a self, namespace: Option<&'a str>) -> &'a str {
        namespace.unwrap_or(&self.config.namespace)
    }

    /// Scope in the engine namespace
    pub fn scope(&self, from_node: &str, entity: &str, direction: Direction) -> EdgeScope {
        EdgeScope::new(self.config.namespace.as_str(), from_node, entity, direction)
    }

    /// Filter covering the whole engine namespace
    pub fn filter(&self) -> EdgeFilter {
        EdgeFilter::namespace(self.config.namespace.as_str())
    }

    /// Record or reinforce a relation, returning `[forward, inverse]`
    ///
    /// Without an absolute distance each record moves by
    /// `-(weight * decrement_path)`; a new record starts from the baseline.
    /// Both records are written concurrently and the call fails if either does.
    pub async fn link(&self, request: &LinkRequest) -> Result<[Edge; 2]> {
        request.validate()?;

        let key = EdgeKey::new(
            self.namespace_or(request.namespace.as_deref()),
            request.from_node.as_str(),
            request.entity.as_str(),
            request.direction,
            request.to_node.as_str(),
        );
        let inverse = key.inverse();

        let (distance, increment) = match request.absolute_distance {
            Some(absolute) => (absolute, false),
            None => (-(request.weight * self.config.decrement_path), true),
        };

        let (forward_distance, inverse_distance) = tokio::try_join!(
            self.backend.set_edge(&key, distance, increment),
            self.backend.set_edge(&inverse, distance, increment),
        )?;

        debug!(
            namespace = %key.namespace,
            entity = %key.entity,
            from_node = %key.from_node,
            to_node = %key.to_node,
            direction = %key.direction,
            distance = forward_distance,
            "Link written"
        );
        Ok([key.with_distance(forward_distance), inverse.with_distance(inverse_distance)])
    }

    /// Neighbors of a node, strongest first unless descending
    pub async fn closest(&self, query: &ClosestQuery) -> Result<Vec<Edge>> {
        let scope = EdgeScope::new(
            self.namespace_or(query.namespace.as_deref()),
            query.from_node.as_str(),
            query.entity.as_str(),
            query.direction,
        );
        let mut distance_query = DistanceQuery::new(scope);
        distance_query.range = query.range;
        distance_query.limit = query.limit;
        distance_query.desc = query.desc;

        self.backend.get_edges_by_distance(&distance_query).await
    }

    pub async fn count(&self, scope: &EdgeScope) -> Result<u64> {
        self.backend.count_edges(scope).await
    }

    pub async fn edges(&self, filter: &EdgeFilter, inverse: bool) -> Result<Vec<Edge>> {
        self.backend.get_edges(filter, inverse).await
    }

    /// Remove a relation: the record and its inverse
    pub async fn delete(&self, key: &EdgeKey) -> Result<Vec<Edge>> {
        let removed = self.backend.delete_edge(key, true).await?;
        debug!(from_node = %key.from_node, to_node = %key.to_node, removed = removed.len(), "Link deleted");
        Ok(removed)
    }

    /// Remove every record leaving a node along with each record's inverse
    ///
    /// The filter must name `from_node`; entity and direction narrow it further.
    pub async fn delete_by_node(&self, filter: &EdgeFilter) -> Result<Vec<Edge>> {
        FieldCheck::new()
            .check("from_node", filter.from_node.is_some())
            .finish("delete by node requires a from_node")?;

        let mut removed = Vec::new();
        let mut deleted = self.backend.delete_edges(filter);
        while let Some(edge) = deleted.try_next().await? {
            let inverse = self.backend.delete_edge(&edge.key().inverse(), false).await?;
            removed.push(edge);
            removed.extend(inverse);
        }

        info!(
            namespace = %filter.namespace,
            from_node = filter.from_node.as_deref().unwrap_or_default(),
            removed = removed.len(),
            "Node edges deleted"
        );
        Ok(removed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::edge::DistanceRange;
    use crate::infrastructure::range::{MemorySortedSets, RangeEdgeStore};

    fn engine() -> GraphEngine {
        let backend: Arc<dyn EdgeStoreBackend> = Arc::new(RangeEdgeStore::new(Arc::new(MemorySortedSets::new())));
        GraphEngine::new(backend, EngineConfig::default().with_namespace("ns")).unwrap()
    }

    #[tokio::test]
    async fn test_link_writes_both_records() {
        let engine = engine();
        let [forward, inverse] = engine.link(&LinkRequest::new("e", "1", "2")).await.unwrap();

        assert_eq!(forward.distance, 0.999999999999999);
        assert_eq!(inverse.distance, 0.999999999999999);
        assert_eq!(forward.direction, Direction::None);
        assert_eq!(inverse.from_node, "2");

        let from_b = engine.edges(&engine.filter().from_node("2"), false).await.unwrap();
        assert_eq!(from_b.len(), 1);
        assert_eq!(from_b[0].to_node, "1");
    }

    #[tokio::test]
    async fn test_weight_scales_and_zero_weight_is_neutral() {
        let engine = engine();
        let [first, _] = engine.link(&LinkRequest::new("e", "1", "2").weight(5.0)).await.unwrap();
        assert_eq!(first.distance, 0.999999999999995);

        let [second, _] = engine.link(&LinkRequest::new("e", "1", "2").weight(0.0)).await.unwrap();
        assert_eq!(second.distance, 0.999999999999995);

        let [fresh, _] = engine.link(&LinkRequest::new("e", "1", "9").weight(0.0)).await.unwrap();
        assert_eq!(fresh.distance, 1.0);
    }

    #[tokio::test]
    async fn test_directed_link_inverts_direction() {
        let engine = engine();
        let [forward, inverse] = engine
            .link(&LinkRequest::new("follows", "a", "b").direction(Direction::Out))
            .await
            .unwrap();
        assert_eq!(forward.direction, Direction::Out);
        assert_eq!(inverse.direction, Direction::In);

        let incoming = engine.scope("b", "follows", Direction::In);
        assert_eq!(engine.count(&incoming).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_closest_orders_by_strength() {
        let engine = engine();
        engine.link(&LinkRequest::new("e", "1", "2")).await.unwrap();
        engine
            .link(&LinkRequest::new("e", "1", "3").absolute(0.999999999999998))
            .await
            .unwrap();

        let closest = engine.closest(&ClosestQuery::new("e", "1")).await.unwrap();
        let order: Vec<_> = closest.iter().map(|e| e.to_node.as_str()).collect();
        assert_eq!(order, ["3", "2"]);

        let farthest = engine
            .closest(&ClosestQuery::new("e", "1").descending().limit(1))
            .await
            .unwrap();
        assert_eq!(farthest[0].to_node, "2");

        let none = engine
            .closest(&ClosestQuery::new("e", "1").range(DistanceRange::new(0.0, 0.5)))
            .await
            .unwrap();
        assert!(none.is_empty());
    }

    #[tokio::test]
    async fn test_invalid_link_reaches_no_backend() {
        let engine = engine();
        let err = engine
            .link(&LinkRequest::new("e", "1", "2").absolute(f64::INFINITY))
            .await
            .unwrap_err();
        assert_eq!(err.fields(), ["absolute_distance"]);
        assert!(engine.edges(&engine.filter(), false).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_delete_removes_pair() {
        let engine = engine();
        engine.link(&LinkRequest::new("e", "a", "b")).await.unwrap();

        let key = EdgeKey::new("ns", "a", "e", Direction::None, "b");
        assert_eq!(engine.delete(&key).await.unwrap().len(), 2);
        assert!(engine.delete(&key).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_delete_by_node_removes_inverses() {
        let engine = engine();
        engine.link(&LinkRequest::new("e", "a", "b")).await.unwrap();
        engine.link(&LinkRequest::new("e", "a", "c")).await.unwrap();
        engine.link(&LinkRequest::new("e", "b", "c")).await.unwrap();

        let removed = engine.delete_by_node(&engine.filter().from_node("a")).await.unwrap();
        assert_eq!(removed.len(), 4);

        let remaining = engine.edges(&engine.filter(), false).await.unwrap();
        assert_eq!(remaining.len(), 2);
        assert!(remaining.iter().all(|e| e.from_node != "a" && e.to_node != "a"));

        let err = engine.delete_by_node(&engine.filter()).await.unwrap_err();
        assert_eq!(err.fields(), ["from_node"]);
    }
}
