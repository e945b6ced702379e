//! Table-store implementation of the EdgeStoreBackend
//!
//! One row per edge record in the `edges` table. Reinforcement is a single
//! upsert with `RETURNING`, so the read-modify-write happens inside SQLite.

use async_trait::async_trait;
use sqlx::{FromRow, SqlitePool};
use tracing::debug;

use crate::domain::edge::{
    Direction, DistanceQuery, Edge, EdgeFilter, EdgeKey, EdgeScope, EdgeStoreBackend, EdgeStream,
    REINFORCEMENT_BASELINE, edge_stream, with_inverses,
};
use crate::error::{Error, Result};

use super::keys::{RowKeys, base_key};

const EDGE_COLUMNS: &str = "namespace, from_node, entity, direction, to_node, distance";

const FILTER_CLAUSE: &str = "namespace = ? \
     AND (? IS NULL OR from_node = ?) \
     AND (? IS NULL OR entity = ?) \
     AND (? IS NULL OR direction = ?)";

/// SQLite implementation of the edge store
#[derive(Clone)]
pub struct SqliteEdgeStore {
    pool: SqlitePool,
}

impl SqliteEdgeStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    async fn upsert(&self, key: &EdgeKey, distance: f64, increment: bool) -> Result<f64> {
        let keys = RowKeys::of(key);
        let sql = if increment {
            format!(
                "INSERT INTO edges (partition_key, sort_key, base_key, {EDGE_COLUMNS})
                 VALUES (?, ?, ?, ?, ?, ?, ?, ?, MAX(0.0, ?))
                 ON CONFLICT(partition_key, sort_key) DO UPDATE SET
                     distance = MAX(0.0, edges.distance + ?),
                     updated_at = CURRENT_TIMESTAMP
                 RETURNING distance"
            )
        } else {
            format!(
                "INSERT INTO edges (partition_key, sort_key, base_key, {EDGE_COLUMNS})
                 VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
                 ON CONFLICT(partition_key, sort_key) DO UPDATE SET
                     distance = excluded.distance,
                     updated_at = CURRENT_TIMESTAMP
                 RETURNING distance"
            )
        };
        let initial = if increment {
            REINFORCEMENT_BASELINE + distance
        } else {
            distance
        };

        let mut query = sqlx::query_as::<_, (f64,)>(&sql)
            .bind(&keys.partition_key)
            .bind(&keys.sort_key)
            .bind(&keys.base_key)
            .bind(&key.namespace)
            .bind(&key.from_node)
            .bind(&key.entity)
            .bind(key.direction.as_str())
            .bind(&key.to_node)
            .bind(initial);
        if increment {
            query = query.bind(distance);
        }

        let (stored,) = query.fetch_one(&self.pool).await?;
        Ok(stored)
    }

    async fn select(&self, filter: &EdgeFilter) -> Result<Vec<Edge>> {
        let sql = format!(
            "SELECT {EDGE_COLUMNS} FROM edges WHERE {FILTER_CLAUSE} ORDER BY base_key, distance, to_node"
        );
        let direction = filter.direction.map(Direction::as_str);
        let rows: Vec<EdgeRow> = sqlx::query_as(&sql)
            .bind(&filter.namespace)
            .bind(filter.from_node.as_deref())
            .bind(filter.from_node.as_deref())
            .bind(filter.entity.as_deref())
            .bind(filter.entity.as_deref())
            .bind(direction)
            .bind(direction)
            .fetch_all(&self.pool)
            .await?;

        rows.into_iter().map(EdgeRow::into_edge).collect()
    }

    async fn remove<'e, E>(executor: E, key: &EdgeKey) -> Result<Option<Edge>>
    where
        E: sqlx::SqliteExecutor<'e>,
    {
        let keys = RowKeys::of(key);
        let sql = format!(
            "DELETE FROM edges WHERE partition_key = ? AND sort_key = ? RETURNING {EDGE_COLUMNS}"
        );
        let row: Option<EdgeRow> = sqlx::query_as(&sql)
            .bind(&keys.partition_key)
            .bind(&keys.sort_key)
            .fetch_optional(executor)
            .await?;

        row.map(EdgeRow::into_edge).transpose()
    }
}

#[async_trait]
impl EdgeStoreBackend for SqliteEdgeStore {
    fn name(&self) -> &'static str {
        "table"
    }

    async fn count_edges(&self, scope: &EdgeScope) -> Result<u64> {
        scope.validate()?;
        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM edges WHERE base_key = ?")
            .bind(base_key(scope))
            .fetch_one(&self.pool)
            .await?;
        Ok(count as u64)
    }

    async fn set_edge(&self, key: &EdgeKey, distance: f64, increment: bool) -> Result<f64> {
        key.validate()?;
        if !distance.is_finite() || (!increment && distance < 0.0) {
            return Err(Error::invalid_field(
                "distance",
                "must be a finite number, non-negative unless incrementing",
            ));
        }

        let stored = self.upsert(key, distance, increment).await?;
        debug!(
            namespace = %key.namespace,
            from_node = %key.from_node,
            to_node = %key.to_node,
            increment,
            stored,
            "Edge row written"
        );
        Ok(stored)
    }

    async fn get_edges(&self, filter: &EdgeFilter, inverse: bool) -> Result<Vec<Edge>> {
        filter.validate()?;
        let edges = self.select(filter).await?;
        if inverse && filter.from_node.is_some() {
            Ok(with_inverses(edges))
        } else {
            Ok(edges)
        }
    }

    async fn get_edges_by_distance(&self, query: &DistanceQuery) -> Result<Vec<Edge>> {
        query.validate()?;
        let range = query.bounds();
        let order = if query.desc { "DESC" } else { "ASC" };
        let sql = format!(
            "SELECT {EDGE_COLUMNS} FROM edges
             WHERE base_key = ?
               AND (? IS NULL OR distance >= ?)
               AND (? IS NULL OR distance <= ?)
             ORDER BY distance {order}, to_node {order}
             LIMIT ?"
        );
        let min = range.min.is_finite().then_some(range.min);
        let max = range.max.is_finite().then_some(range.max);
        // SQLite treats a negative LIMIT as unbounded
        let limit = query.limit.map_or(-1, |l| i64::try_from(l).unwrap_or(i64::MAX));

        let rows: Vec<EdgeRow> = sqlx::query_as(&sql)
            .bind(base_key(&query.scope))
            .bind(min)
            .bind(min)
            .bind(max)
            .bind(max)
            .bind(limit)
            .fetch_all(&self.pool)
            .await?;

        rows.into_iter().map(EdgeRow::into_edge).collect()
    }

    async fn delete_edge(&self, key: &EdgeKey, inverse: bool) -> Result<Vec<Edge>> {
        key.validate()?;
        let mut tx = self.pool.begin().await?;
        let mut removed = vec![Self::remove(&mut *tx, key).await?];
        if inverse {
            removed.push(Self::remove(&mut *tx, &key.inverse()).await?);
        }
        tx.commit().await?;
        Ok(removed.into_iter().flatten().collect())
    }

    fn delete_edges<'a>(&'a self, filter: &'a EdgeFilter) -> EdgeStream<'a> {
        edge_stream(async_stream::try_stream! {
            filter.validate()?;
            for edge in self.select(filter).await? {
                if let Some(deleted) = Self::remove(&self.pool, &edge.key()).await? {
                    yield deleted;
                }
            }
        })
    }
}

// ========== Row Types ==========

#[derive(Debug, FromRow)]
struct EdgeRow {
    namespace: String,
    from_node: String,
    entity: String,
    direction: String,
    to_node: String,
    distance: f64,
}

impl EdgeRow {
    fn into_edge(self) -> Result<Edge> {
        let direction = Direction::parse(&self.direction)
            .ok_or_else(|| Error::backend(format!("Invalid direction in edges row: {}", self.direction)))?;
        Ok(Edge {
            namespace: self.namespace,
            from_node: self.from_node,
            entity: self.entity,
            direction,
            to_node: self.to_node,
            distance: self.distance,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::edge::DistanceRange;
    use crate::storage::migrations::run_migrations;
    use futures_util::TryStreamExt;
    use sqlx::sqlite::SqlitePoolOptions;

    async fn store() -> SqliteEdgeStore {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .unwrap();
        run_migrations(&pool).await.unwrap();
        SqliteEdgeStore::new(pool)
    }

    fn key(from: &str, to: &str) -> EdgeKey {
        EdgeKey::new("ns", from, "friend", Direction::None, to)
    }

    #[tokio::test]
    async fn test_reinforcement_starts_from_baseline() {
        let store = store().await;
        let stored = store.set_edge(&key("a", "b"), -1e-15, true).await.unwrap();
        assert_eq!(stored, 0.999999999999999);

        let stored = store.set_edge(&key("a", "b"), -5e-15 + 1e-15, true).await.unwrap();
        assert_eq!(stored, 0.999999999999999 + (-5e-15 + 1e-15));
    }

    #[tokio::test]
    async fn test_reinforcement_clamps_at_zero() {
        let store = store().await;
        store.set_edge(&key("a", "b"), 0.25, false).await.unwrap();
        let stored = store.set_edge(&key("a", "b"), -3.0, true).await.unwrap();
        assert_eq!(stored, 0.0);

        let fresh = store.set_edge(&key("a", "c"), -3.0, true).await.unwrap();
        assert_eq!(fresh, 0.0);
    }

    #[tokio::test]
    async fn test_absolute_write_overwrites() {
        let store = store().await;
        store.set_edge(&key("a", "b"), 0.9, false).await.unwrap();
        store.set_edge(&key("a", "b"), 0.4, false).await.unwrap();

        let scope = EdgeScope::new("ns", "a", "friend", Direction::None);
        assert_eq!(store.count_edges(&scope).await.unwrap(), 1);
        let edges = store.get_edges_by_distance(&DistanceQuery::new(scope)).await.unwrap();
        assert_eq!(edges[0].distance, 0.4);
    }

    #[tokio::test]
    async fn test_by_distance_range_limit_desc() {
        let store = store().await;
        for (to, d) in [("b", 0.3), ("c", 0.1), ("d", 0.7), ("e", 1.5)] {
            store.set_edge(&key("a", to), d, false).await.unwrap();
        }
        let scope = EdgeScope::new("ns", "a", "friend", Direction::None);

        let asc = store.get_edges_by_distance(&DistanceQuery::new(scope.clone())).await.unwrap();
        let order: Vec<_> = asc.iter().map(|e| e.to_node.as_str()).collect();
        assert_eq!(order, ["c", "b", "d", "e"]);

        let windowed = store
            .get_edges_by_distance(
                &DistanceQuery::new(scope)
                    .range(DistanceRange::new(0.2, 1.0))
                    .limit(1)
                    .descending(),
            )
            .await
            .unwrap();
        assert_eq!(windowed.len(), 1);
        assert_eq!(windowed[0].to_node, "d");
    }

    #[tokio::test]
    async fn test_delete_edge_with_inverse() {
        let store = store().await;
        let forward = EdgeKey::new("ns", "a", "follows", Direction::Out, "b");
        store.set_edge(&forward, 0.5, false).await.unwrap();
        store.set_edge(&forward.inverse(), 0.5, false).await.unwrap();

        let removed = store.delete_edge(&forward, true).await.unwrap();
        assert_eq!(removed.len(), 2);
        assert_eq!(removed[1].direction, Direction::In);

        let again = store.delete_edge(&forward, true).await.unwrap();
        assert!(again.is_empty());
    }

    #[tokio::test]
    async fn test_get_edges_filters_and_inverts() {
        let store = store().await;
        store.set_edge(&key("a", "b"), 0.5, false).await.unwrap();
        store
            .set_edge(&EdgeKey::new("ns", "a", "viewed", Direction::Out, "c"), 0.2, false)
            .await
            .unwrap();
        store.set_edge(&key("b", "a"), 0.5, false).await.unwrap();

        let all = store.get_edges(&EdgeFilter::namespace("ns"), false).await.unwrap();
        assert_eq!(all.len(), 3);

        let viewed = store
            .get_edges(&EdgeFilter::namespace("ns").from_node("a").entity("viewed"), true)
            .await
            .unwrap();
        assert_eq!(viewed.len(), 2);
        assert_eq!(viewed[1].from_node, "c");
        assert_eq!(viewed[1].direction, Direction::In);
    }

    #[tokio::test]
    async fn test_delete_edges_streams_each_record() {
        let store = store().await;
        store.set_edge(&key("a", "b"), 0.5, false).await.unwrap();
        store.set_edge(&key("a", "c"), 0.6, false).await.unwrap();
        store.set_edge(&key("b", "a"), 0.5, false).await.unwrap();

        let filter = EdgeFilter::namespace("ns").from_node("a");
        let deleted: Vec<Edge> = store.delete_edges(&filter).try_collect().await.unwrap();
        assert_eq!(deleted.len(), 2);

        let remaining = store.get_edges(&EdgeFilter::namespace("ns"), false).await.unwrap();
        assert_eq!(remaining.len(), 1);
        assert_eq!(remaining[0].from_node, "b");
    }

    #[tokio::test]
    async fn test_validation_happens_before_storage() {
        let store = store().await;
        let err = store.set_edge(&key("", "b"), 0.5, false).await.unwrap_err();
        assert_eq!(err.fields(), ["from_node"]);

        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM edges")
            .fetch_one(store.pool())
            .await
            .unwrap();
        assert_eq!(count, 0);
    }
}
