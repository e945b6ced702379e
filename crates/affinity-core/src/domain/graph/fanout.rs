//! Fan-out linking
//!
//! `all_all` links every pair in a collection; `cross_link` links an origin hub
//! to each element and optionally cross-links the elements under a derived
//! entity. Links run through a bounded stream of `fanout_concurrency` calls.

use std::fmt;
use std::sync::Arc;

use futures_util::{StreamExt, TryStreamExt, stream};
use tracing::info;

use crate::domain::edge::{Direction, Edge, EdgeStoreBackend, FieldCheck};
use crate::error::Result;

use super::engine::GraphEngine;
use super::link::LinkRequest;

/// Weight function over `(len, i, j)`
pub type WeightFn = Arc<dyn Fn(usize, usize, usize) -> f64 + Send + Sync>;

/// Weight given to the pair `(i, j)` of an all-pairs link
#[derive(Clone, Default)]
pub enum PairWeight {
    /// `len - |i - j|`: neighbors in the collection bind tighter
    #[default]
    Positional,
    Constant(f64),
    Custom(WeightFn),
}

impl PairWeight {
    pub fn weight(&self, len: usize, i: usize, j: usize) -> f64 {
        match self {
            Self::Positional => (len - i.abs_diff(j)) as f64,
            Self::Constant(weight) => *weight,
            Self::Custom(f) => f(len, i, j),
        }
    }
}

impl fmt::Debug for PairWeight {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Positional => f.write_str("Positional"),
            Self::Constant(weight) => f.debug_tuple("Constant").field(weight).finish(),
            Self::Custom(_) => f.write_str("Custom(..)"),
        }
    }
}

/// Link every pair of a collection
#[derive(Debug, Clone)]
pub struct AllAllRequest {
    pub namespace: Option<String>,
    pub entity: String,
    pub direction: Direction,
    pub nodes: Vec<String>,
    pub weight: PairWeight,
}

impl AllAllRequest {
    pub fn new(entity: impl Into<String>, nodes: Vec<String>) -> Self {
        Self {
            namespace: None,
            entity: entity.into(),
            direction: Direction::None,
            nodes,
            weight: PairWeight::default(),
        }
    }

    pub fn namespace(mut self, namespace: impl Into<String>) -> Self {
        self.namespace = Some(namespace.into());
        self
    }

    pub fn direction(mut self, direction: Direction) -> Self {
        self.direction = direction;
        self
    }

    pub fn weight(mut self, weight: PairWeight) -> Self {
        self.weight = weight;
        self
    }
}

/// Hub-and-spoke linking with optional cross links between the spokes
#[derive(Debug, Clone)]
pub struct CrossLinkRequest {
    pub namespace: Option<String>,
    pub entity: String,
    pub direction: Direction,
    pub nodes: Vec<String>,
    pub origin: Option<String>,
    /// With an origin, also link the elements to each other
    pub cross: bool,
    /// Absolute distance for every link instead of reinforcement
    pub distance: Option<f64>,
}

impl CrossLinkRequest {
    pub fn new(entity: impl Into<String>, nodes: Vec<String>) -> Self {
        Self {
            namespace: None,
            entity: entity.into(),
            direction: Direction::None,
            nodes,
            origin: None,
            cross: true,
            distance: None,
        }
    }

    pub fn namespace(mut self, namespace: impl Into<String>) -> Self {
        self.namespace = Some(namespace.into());
        self
    }

    pub fn direction(mut self, direction: Direction) -> Self {
        self.direction = direction;
        self
    }

    pub fn origin(mut self, origin: impl Into<String>) -> Self {
        self.origin = Some(origin.into());
        self
    }

    pub fn cross(mut self, cross: bool) -> Self {
        self.cross = cross;
        self
    }

    pub fn distance(mut self, distance: f64) -> Self {
        self.distance = Some(distance);
        self
    }
}

fn check_nodes(check: FieldCheck, nodes: &[String]) -> FieldCheck {
    check.check("nodes", nodes.iter().all(|n| !n.trim().is_empty()))
}

/// Index pairs `(i, j)` with `j > i` whose ids differ
fn distinct_pairs(nodes: &[String]) -> impl Iterator<Item = (usize, usize)> + '_ {
    (0..nodes.len())
        .flat_map(move |i| (i + 1..nodes.len()).map(move |j| (i, j)))
        .filter(move |&(i, j)| nodes[i] != nodes[j])
}

impl<B: EdgeStoreBackend + ?Sized> GraphEngine<B> {
    /// Run link requests with bounded concurrency, flattening the pairs in order
    async fn link_all(&self, requests: Vec<LinkRequest>) -> Result<Vec<Edge>> {
        let concurrency = self.config().fanout_concurrency;
        let pairs: Vec<[Edge; 2]> = stream::iter(requests.iter())
            .map(|request| self.link(request))
            .buffered(concurrency)
            .try_collect()
            .await?;
        Ok(pairs.into_iter().flatten().collect())
    }

    /// Link every pair `(i, j)`, `j > i`, of the collection
    ///
    /// Pairs of equal ids are skipped.
    pub async fn all_all(&self, request: &AllAllRequest) -> Result<Vec<Edge>> {
        check_nodes(
            FieldCheck::new()
                .optional("namespace", request.namespace.as_deref())
                .require("entity", &request.entity),
            &request.nodes,
        )
        .finish("all-pairs link request is invalid")?;

        let len = request.nodes.len();
        let links = distinct_pairs(&request.nodes)
            .map(|(i, j)| {
                let mut link = LinkRequest::new(request.entity.as_str(), request.nodes[i].as_str(), request.nodes[j].as_str())
                    .direction(request.direction)
                    .weight(request.weight.weight(len, i, j));
                link.namespace = request.namespace.clone();
                link
            })
            .collect::<Vec<_>>();

        let pairs = links.len();
        let edges = self.link_all(links).await?;
        info!(entity = %request.entity, nodes = len, pairs, "All-pairs link complete");
        Ok(edges)
    }

    /// Origin-hub linking
    ///
    /// With an origin: origin to every element under `entity`, and with `cross`
    /// every element pair under `entity` + cross suffix. Without an origin:
    /// every element pair under `entity`.
    pub async fn cross_link(&self, request: &CrossLinkRequest) -> Result<Vec<Edge>> {
        check_nodes(
            FieldCheck::new()
                .optional("namespace", request.namespace.as_deref())
                .require("entity", &request.entity)
                .optional("origin", request.origin.as_deref())
                .check("distance", request.distance.is_none_or(|d| d.is_finite() && d >= 0.0)),
            &request.nodes,
        )
        .finish("cross link request is invalid")?;

        let make = |entity: &str, from: &str, to: &str| {
            let mut link = LinkRequest::new(entity, from, to).direction(request.direction);
            link.namespace = request.namespace.clone();
            link.absolute_distance = request.distance;
            link
        };
        let all_pairs = |entity: &str| {
            distinct_pairs(&request.nodes)
                .map(|(i, j)| make(entity, &request.nodes[i], &request.nodes[j]))
                .collect::<Vec<_>>()
        };

        let links = match &request.origin {
            Some(origin) => {
                let mut links: Vec<LinkRequest> = request
                    .nodes
                    .iter()
                    .filter(|node| *node != origin)
                    .map(|node| make(&request.entity, origin, node))
                    .collect();
                if request.cross {
                    let cross_entity = format!("{}{}", request.entity, self.config().cross_suffix);
                    links.extend(all_pairs(&cross_entity));
                }
                links
            }
            None => all_pairs(&request.entity),
        };

        let edges = self.link_all(links).await?;
        info!(
            entity = %request.entity,
            origin = request.origin.as_deref().unwrap_or_default(),
            records = edges.len(),
            "Cross link complete"
        );
        Ok(edges)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::graph::EngineConfig;
    use crate::infrastructure::range::{MemorySortedSets, RangeEdgeStore};

    fn engine() -> GraphEngine {
        let backend: Arc<dyn EdgeStoreBackend> = Arc::new(RangeEdgeStore::new(Arc::new(MemorySortedSets::new())));
        GraphEngine::new(backend, EngineConfig::default().with_namespace("ns")).unwrap()
    }

    fn nodes(ids: &[&str]) -> Vec<String> {
        ids.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_positional_weight() {
        let weight = PairWeight::Positional;
        assert_eq!(weight.weight(4, 0, 1), 3.0);
        assert_eq!(weight.weight(4, 0, 3), 1.0);
        assert_eq!(PairWeight::Constant(2.5).weight(4, 0, 3), 2.5);

        let custom = PairWeight::Custom(Arc::new(|len, i, j| (len * 10 + i + j) as f64));
        assert_eq!(custom.weight(3, 1, 2), 33.0);
    }

    #[tokio::test]
    async fn test_all_all_links_every_pair() {
        let engine = engine();
        let edges = engine
            .all_all(&AllAllRequest::new("e", nodes(&["a", "b", "c"])))
            .await
            .unwrap();
        assert_eq!(edges.len(), 6);

        // a-b sits at distance 1, weight len - 1 = 2
        assert_eq!(edges[0].to_node, "b");
        assert_eq!(edges[0].distance, 1.0 - 2.0 * 1e-15);
        // a-c sits at distance 2, weight 1
        assert_eq!(edges[2].to_node, "c");
        assert_eq!(edges[2].distance, 1.0 - 1e-15);
    }

    #[tokio::test]
    async fn test_all_all_skips_self_pairs() {
        let engine = engine();
        let edges = engine
            .all_all(&AllAllRequest::new("e", nodes(&["a", "a", "b"])).weight(PairWeight::Constant(1.0)))
            .await
            .unwrap();
        assert_eq!(edges.len(), 4);
        assert!(edges.iter().all(|e| e.from_node != e.to_node));
    }

    #[tokio::test]
    async fn test_cross_link_with_origin() {
        let engine = engine();
        let edges = engine
            .cross_link(&CrossLinkRequest::new("e", nodes(&["1", "2", "3"])).origin("0"))
            .await
            .unwrap();
        assert_eq!(edges.len(), 12);
        assert_eq!(edges.iter().filter(|e| e.entity == "e").count(), 6);
        assert_eq!(edges.iter().filter(|e| e.entity == "e_cross").count(), 6);
    }

    #[tokio::test]
    async fn test_cross_link_without_cross_or_origin() {
        let engine = engine();
        let hub_only = engine
            .cross_link(&CrossLinkRequest::new("e", nodes(&["1", "2"])).origin("0").cross(false))
            .await
            .unwrap();
        assert_eq!(hub_only.len(), 4);

        let pairs = engine
            .cross_link(&CrossLinkRequest::new("f", nodes(&["1", "2", "3"])).distance(0.5))
            .await
            .unwrap();
        assert_eq!(pairs.len(), 6);
        assert!(pairs.iter().all(|e| e.distance == 0.5));

        let singleton = engine
            .cross_link(&CrossLinkRequest::new("g", nodes(&["1"])))
            .await
            .unwrap();
        assert!(singleton.is_empty());
    }

    #[tokio::test]
    async fn test_blank_node_rejected() {
        let engine = engine();
        let err = engine
            .all_all(&AllAllRequest::new("", nodes(&["a", " "])))
            .await
            .unwrap_err();
        assert_eq!(err.fields(), ["entity", "nodes"]);
    }
}
