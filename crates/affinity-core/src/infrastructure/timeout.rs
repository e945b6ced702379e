//! Per-call timeout decorator for edge stores
//!
//! Every backend call is bounded by one deadline. A call that exceeds it fails
//! with [`Error::Timeout`]; the core never retries it.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use futures_util::{FutureExt, StreamExt};
use tracing::warn;

use crate::domain::edge::{
    DistanceQuery, Edge, EdgeFilter, EdgeKey, EdgeScope, EdgeStoreBackend, EdgeStream, edge_stream,
};
use crate::error::{Error, Result};

pub struct TimeoutBackend<B: ?Sized = dyn EdgeStoreBackend> {
    inner: Arc<B>,
    timeout: Duration,
}

impl<B: EdgeStoreBackend + ?Sized> TimeoutBackend<B> {
    pub fn new(inner: Arc<B>, timeout: Duration) -> Self {
        Self { inner, timeout }
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    async fn bounded<T>(&self, operation: &str, call: impl Future<Output = Result<T>>) -> Result<T> {
        match tokio::time::timeout(self.timeout, call).await {
            Ok(result) => result,
            Err(_) => {
                let millis = u64::try_from(self.timeout.as_millis()).unwrap_or(u64::MAX);
                warn!(backend = self.inner.name(), operation, millis, "Backend call timed out");
                Err(Error::Timeout {
                    operation: operation.to_string(),
                    millis,
                })
            }
        }
    }
}

#[async_trait]
impl<B: EdgeStoreBackend + ?Sized> EdgeStoreBackend for TimeoutBackend<B> {
    fn name(&self) -> &'static str {
        self.inner.name()
    }

    async fn count_edges(&self, scope: &EdgeScope) -> Result<u64> {
        self.bounded("count_edges", self.inner.count_edges(scope)).await
    }

    async fn set_edge(&self, key: &EdgeKey, distance: f64, increment: bool) -> Result<f64> {
        self.bounded("set_edge", self.inner.set_edge(key, distance, increment))
            .await
    }

    async fn get_edges(&self, filter: &EdgeFilter, inverse: bool) -> Result<Vec<Edge>> {
        self.bounded("get_edges", self.inner.get_edges(filter, inverse)).await
    }

    async fn get_edges_by_distance(&self, query: &DistanceQuery) -> Result<Vec<Edge>> {
        self.bounded("get_edges_by_distance", self.inner.get_edges_by_distance(query))
            .await
    }

    async fn delete_edge(&self, key: &EdgeKey, inverse: bool) -> Result<Vec<Edge>> {
        self.bounded("delete_edge", self.inner.delete_edge(key, inverse)).await
    }

    /// The deadline applies to each yielded record rather than the whole stream
    fn delete_edges<'a>(&'a self, filter: &'a EdgeFilter) -> EdgeStream<'a> {
        edge_stream(async_stream::try_stream! {
            let mut inner = self.inner.delete_edges(filter);
            while let Some(edge) = self.bounded("delete_edges", inner.next().map(Option::transpose)).await? {
                yield edge;
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::edge::Direction;
    use crate::infrastructure::range::{MemorySortedSets, RangeEdgeStore};
    use futures_util::TryStreamExt;

    /// Delays every call before delegating
    struct Sluggish {
        inner: RangeEdgeStore<MemorySortedSets>,
        delay: Duration,
    }

    #[async_trait]
    impl EdgeStoreBackend for Sluggish {
        fn name(&self) -> &'static str {
            "sluggish"
        }

        async fn count_edges(&self, scope: &EdgeScope) -> Result<u64> {
            tokio::time::sleep(self.delay).await;
            self.inner.count_edges(scope).await
        }

        async fn set_edge(&self, key: &EdgeKey, distance: f64, increment: bool) -> Result<f64> {
            tokio::time::sleep(self.delay).await;
            self.inner.set_edge(key, distance, increment).await
        }

        async fn get_edges(&self, filter: &EdgeFilter, inverse: bool) -> Result<Vec<Edge>> {
            self.inner.get_edges(filter, inverse).await
        }

        async fn get_edges_by_distance(&self, query: &DistanceQuery) -> Result<Vec<Edge>> {
            self.inner.get_edges_by_distance(query).await
        }

        async fn delete_edge(&self, key: &EdgeKey, inverse: bool) -> Result<Vec<Edge>> {
            self.inner.delete_edge(key, inverse).await
        }

        fn delete_edges<'a>(&'a self, filter: &'a EdgeFilter) -> EdgeStream<'a> {
            self.inner.delete_edges(filter)
        }
    }

    fn sluggish(delay: Duration) -> Arc<Sluggish> {
        Arc::new(Sluggish {
            inner: RangeEdgeStore::new(Arc::new(MemorySortedSets::new())),
            delay,
        })
    }

    fn key() -> EdgeKey {
        EdgeKey::new("ns", "a", "friend", Direction::None, "b")
    }

    #[tokio::test(start_paused = true)]
    async fn test_slow_call_times_out() {
        let backend = TimeoutBackend::new(sluggish(Duration::from_secs(10)), Duration::from_millis(50));

        let err = backend.set_edge(&key(), 0.5, false).await.unwrap_err();
        assert!(matches!(err, Error::Timeout { ref operation, millis: 50 } if operation == "set_edge"));
        assert!(err.is_retryable());
    }

    #[tokio::test(start_paused = true)]
    async fn test_fast_call_passes_through() {
        let backend = TimeoutBackend::new(sluggish(Duration::from_millis(1)), Duration::from_secs(1));

        assert_eq!(backend.set_edge(&key(), 0.5, false).await.unwrap(), 0.5);
        assert_eq!(backend.count_edges(&key().scope()).await.unwrap(), 1);
        assert_eq!(backend.name(), "sluggish");

        let deleted: Vec<Edge> = backend
            .delete_edges(&EdgeFilter::namespace("ns"))
            .try_collect()
            .await
            .unwrap();
        assert_eq!(deleted.len(), 1);
    }
}
