//! Range-store implementation of the EdgeStoreBackend
//!
//! Translates the edge contract onto sorted-set commands. Reinforcement seeds
//! absent members at the baseline with `zadd_nx` and then applies the delta with
//! `zincrby_floor`, which clamps at zero inside the same command. Both are
//! single-key atomic commands, so concurrent first writers to the same edge each
//! land their delta on top of one shared baseline.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, warn};

use crate::domain::edge::{
    DistanceQuery, Edge, EdgeFilter, EdgeKey, EdgeScope, EdgeStoreBackend, EdgeStream,
    REINFORCEMENT_BASELINE, edge_stream, with_inverses,
};
use crate::error::{Error, Result};

use super::client::{ScoreBounds, SortedSetClient};
use super::keys::{filter_pattern, parse_scope_key, scope_key};

/// Edge store over any [`SortedSetClient`]
pub struct RangeEdgeStore<C: ?Sized> {
    client: Arc<C>,
}

impl<C: ?Sized> Clone for RangeEdgeStore<C> {
    fn clone(&self) -> Self {
        Self {
            client: Arc::clone(&self.client),
        }
    }
}

impl<C: SortedSetClient + ?Sized> RangeEdgeStore<C> {
    pub fn new(client: Arc<C>) -> Self {
        Self { client }
    }

    pub fn client(&self) -> &Arc<C> {
        &self.client
    }

    /// Every record under a filter, in key order then distance order
    async fn scan_edges(&self, filter: &EdgeFilter) -> Result<Vec<Edge>> {
        let mut keys = self.client.scan(&filter_pattern(filter)).await?;
        keys.sort();

        let mut edges = Vec::new();
        for key in keys {
            let Some(scope) = parse_scope_key(&key) else {
                warn!(key = %key, "Skipping unparseable edge key");
                continue;
            };
            if scope.namespace != filter.namespace {
                continue;
            }
            for (member, score) in self.client.zrange_by_score(&key, ScoreBounds::all()).await? {
                edges.push(scope.key_to(member).with_distance(score));
            }
        }
        Ok(edges)
    }

    async fn remove(&self, key: &EdgeKey) -> Result<Option<Edge>> {
        let removed = self
            .client
            .zrem(&scope_key(&key.scope()), &key.to_node)
            .await?;
        Ok(removed.map(|distance| key.with_distance(distance)))
    }
}

#[async_trait]
impl<C: SortedSetClient + ?Sized> EdgeStoreBackend for RangeEdgeStore<C> {
    fn name(&self) -> &'static str {
        "range"
    }

    async fn count_edges(&self, scope: &EdgeScope) -> Result<u64> {
        scope.validate()?;
        self.client.zcard(&scope_key(scope)).await
    }

    async fn set_edge(&self, key: &EdgeKey, distance: f64, increment: bool) -> Result<f64> {
        key.validate()?;
        if !distance.is_finite() || (!increment && distance < 0.0) {
            return Err(Error::invalid_field(
                "distance",
                "must be a finite number, non-negative unless incrementing",
            ));
        }

        let set_key = scope_key(&key.scope());
        if !increment {
            self.client.zadd(&set_key, &key.to_node, distance).await?;
            debug!(key = %set_key, to_node = %key.to_node, distance, "Edge distance set");
            return Ok(distance);
        }

        self.client
            .zadd_nx(&set_key, &key.to_node, REINFORCEMENT_BASELINE)
            .await?;
        let stored = self
            .client
            .zincrby_floor(&set_key, &key.to_node, distance, 0.0)
            .await?;

        debug!(key = %set_key, to_node = %key.to_node, delta = distance, stored, "Edge reinforced");
        Ok(stored)
    }

    async fn get_edges(&self, filter: &EdgeFilter, inverse: bool) -> Result<Vec<Edge>> {
        filter.validate()?;
        let edges = self.scan_edges(filter).await?;
        if inverse && filter.from_node.is_some() {
            Ok(with_inverses(edges))
        } else {
            Ok(edges)
        }
    }

    async fn get_edges_by_distance(&self, query: &DistanceQuery) -> Result<Vec<Edge>> {
        query.validate()?;
        let range = query.bounds();
        let bounds = ScoreBounds {
            min: range.min,
            max: range.max,
            limit: query.limit,
            rev: query.desc,
        };

        let members = self
            .client
            .zrange_by_score(&scope_key(&query.scope), bounds)
            .await?;
        Ok(members
            .into_iter()
            .map(|(member, score)| query.scope.key_to(member).with_distance(score))
            .collect())
    }

    async fn delete_edge(&self, key: &EdgeKey, inverse: bool) -> Result<Vec<Edge>> {
        key.validate()?;
        let removed = if inverse {
            let reverse = key.inverse();
            let (forward, backward) = tokio::try_join!(self.remove(key), self.remove(&reverse))?;
            vec![forward, backward]
        } else {
            vec![self.remove(key).await?]
        };
        Ok(removed.into_iter().flatten().collect())
    }

    fn delete_edges<'a>(&'a self, filter: &'a EdgeFilter) -> EdgeStream<'a> {
        edge_stream(async_stream::try_stream! {
            filter.validate()?;
            let mut keys = self.client.scan(&filter_pattern(filter)).await?;
            keys.sort();

            for key in keys {
                let Some(scope) = parse_scope_key(&key).filter(|s| s.namespace == filter.namespace) else {
                    continue;
                };
                for (member, _) in self.client.zrange_by_score(&key, ScoreBounds::all()).await? {
                    if let Some(distance) = self.client.zrem(&key, &member).await? {
                        yield scope.key_to(member).with_distance(distance);
                    }
                }
            }
        })
    }
}
