//! SQLite node store over the `nodes` table

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::Utc;
use serde_json::Value;
use sqlx::{FromRow, SqlitePool};
use tracing::debug;

use crate::domain::node::{NodeStore, merge_patch, validate_node};
use crate::error::Result;

const UPSERT_NODE: &str = r#"
    INSERT INTO nodes (namespace, id, data, updated_at) VALUES (?, ?, ?, ?)
    ON CONFLICT(namespace, id) DO UPDATE SET
        data = excluded.data,
        updated_at = excluded.updated_at
"#;

#[derive(Clone)]
pub struct SqliteNodeStore {
    pool: SqlitePool,
}

impl SqliteNodeStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    async fn write<'e, E>(executor: E, namespace: &str, id: &str, data: &Value) -> Result<()>
    where
        E: sqlx::SqliteExecutor<'e>,
    {
        sqlx::query(UPSERT_NODE)
            .bind(namespace)
            .bind(id)
            .bind(serde_json::to_string(data)?)
            .bind(Utc::now().to_rfc3339())
            .execute(executor)
            .await?;
        Ok(())
    }
}

#[derive(Debug, FromRow)]
struct NodeRow {
    id: String,
    data: String,
}

impl NodeRow {
    fn into_document(self) -> Result<(String, Value)> {
        Ok((self.id, serde_json::from_str(&self.data)?))
    }
}

#[async_trait]
impl NodeStore for SqliteNodeStore {
    async fn get(&self, namespace: &str, id: &str) -> Result<Option<Value>> {
        validate_node(namespace, id)?;
        let row: Option<NodeRow> = sqlx::query_as("SELECT id, data FROM nodes WHERE namespace = ? AND id = ?")
            .bind(namespace)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.map(NodeRow::into_document).transpose()?.map(|(_, data)| data))
    }

    async fn set(&self, namespace: &str, id: &str, data: Value) -> Result<()> {
        validate_node(namespace, id)?;
        Self::write(&self.pool, namespace, id, &data).await?;
        debug!(namespace = %namespace, node_id = %id, "Node document saved");
        Ok(())
    }

    async fn multi_get(&self, namespace: &str, ids: &[String]) -> Result<Vec<Option<Value>>> {
        for id in ids {
            validate_node(namespace, id)?;
        }
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let rows: Vec<NodeRow> = sqlx::query_as(
            "SELECT id, data FROM nodes WHERE namespace = ? AND id IN (SELECT value FROM json_each(?))",
        )
        .bind(namespace)
        .bind(serde_json::to_string(ids)?)
        .fetch_all(&self.pool)
        .await?;

        let found = rows
            .into_iter()
            .map(NodeRow::into_document)
            .collect::<Result<HashMap<_, _>>>()?;
        Ok(ids.iter().map(|id| found.get(id).cloned()).collect())
    }

    async fn multi_set(&self, namespace: &str, entries: Vec<(String, Value)>) -> Result<()> {
        for (id, _) in &entries {
            validate_node(namespace, id)?;
        }
        let mut tx = self.pool.begin().await?;
        for (id, data) in &entries {
            Self::write(&mut *tx, namespace, id, data).await?;
        }
        tx.commit().await?;
        debug!(namespace = %namespace, count = entries.len(), "Node documents saved");
        Ok(())
    }

    async fn patch(&self, namespace: &str, id: &str, patch: Value) -> Result<Value> {
        validate_node(namespace, id)?;
        let mut tx = self.pool.begin().await?;
        let row: Option<NodeRow> = sqlx::query_as("SELECT id, data FROM nodes WHERE namespace = ? AND id = ?")
            .bind(namespace)
            .bind(id)
            .fetch_optional(&mut *tx)
            .await?;
        let current = row.map(NodeRow::into_document).transpose()?.map(|(_, data)| data);

        let merged = merge_patch(current, patch)?;
        Self::write(&mut *tx, namespace, id, &merged).await?;
        tx.commit().await?;
        Ok(merged)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::migrations::run_migrations;
    use serde_json::json;
    use sqlx::sqlite::SqlitePoolOptions;

    async fn store() -> SqliteNodeStore {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .unwrap();
        run_migrations(&pool).await.unwrap();
        SqliteNodeStore::new(pool)
    }

    #[tokio::test]
    async fn test_set_and_get() {
        let store = store().await;
        assert_eq!(store.get("ns", "a").await.unwrap(), None);

        store.set("ns", "a", json!({"views": 10})).await.unwrap();
        assert_eq!(store.get("ns", "a").await.unwrap(), Some(json!({"views": 10})));

        store.set("ns", "a", json!({"views": 11})).await.unwrap();
        assert_eq!(store.get("ns", "a").await.unwrap(), Some(json!({"views": 11})));
    }

    #[tokio::test]
    async fn test_multi_get_and_set() {
        let store = store().await;
        store
            .multi_set("ns", vec![("a".into(), json!({"n": 1})), ("b".into(), json!({"n": 2}))])
            .await
            .unwrap();

        let docs = store
            .multi_get("ns", &["b".to_string(), "missing".to_string(), "a".to_string()])
            .await
            .unwrap();
        assert_eq!(docs, vec![Some(json!({"n": 2})), None, Some(json!({"n": 1}))]);
        assert!(store.multi_get("ns", &[]).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_patch_merges_top_level_keys() {
        let store = store().await;
        store.set("ns", "a", json!({"name": "alpha", "tags": ["x"]})).await.unwrap();

        let merged = store.patch("ns", "a", json!({"tags": ["y"], "score": 2})).await.unwrap();
        assert_eq!(merged, json!({"name": "alpha", "tags": ["y"], "score": 2}));
        assert_eq!(store.get("ns", "a").await.unwrap(), Some(merged));

        let created = store.patch("ns", "b", json!({"score": 1})).await.unwrap();
        assert_eq!(created, json!({"score": 1}));
    }

    #[tokio::test]
    async fn test_invalid_address_rejected() {
        let store = store().await;
        let err = store.set("ns", "", json!({})).await.unwrap_err();
        assert_eq!(err.fields(), ["id"]);
    }
}
