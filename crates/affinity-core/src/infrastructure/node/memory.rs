//! In-memory node store

use std::collections::HashMap;

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::RwLock;

use crate::domain::node::{NodeStore, merge_patch, validate_node};
use crate::error::Result;

#[derive(Debug, Default)]
pub struct MemoryNodeStore {
    documents: RwLock<HashMap<(String, String), Value>>,
}

impl MemoryNodeStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn address(namespace: &str, id: &str) -> (String, String) {
    (namespace.to_string(), id.to_string())
}

#[async_trait]
impl NodeStore for MemoryNodeStore {
    async fn get(&self, namespace: &str, id: &str) -> Result<Option<Value>> {
        validate_node(namespace, id)?;
        Ok(self.documents.read().await.get(&address(namespace, id)).cloned())
    }

    async fn set(&self, namespace: &str, id: &str, data: Value) -> Result<()> {
        validate_node(namespace, id)?;
        self.documents.write().await.insert(address(namespace, id), data);
        Ok(())
    }

    async fn multi_get(&self, namespace: &str, ids: &[String]) -> Result<Vec<Option<Value>>> {
        for id in ids {
            validate_node(namespace, id)?;
        }
        let documents = self.documents.read().await;
        Ok(ids
            .iter()
            .map(|id| documents.get(&address(namespace, id)).cloned())
            .collect())
    }

    async fn multi_set(&self, namespace: &str, entries: Vec<(String, Value)>) -> Result<()> {
        for (id, _) in &entries {
            validate_node(namespace, id)?;
        }
        let mut documents = self.documents.write().await;
        for (id, data) in entries {
            documents.insert(address(namespace, &id), data);
        }
        Ok(())
    }

    async fn patch(&self, namespace: &str, id: &str, patch: Value) -> Result<Value> {
        validate_node(namespace, id)?;
        let mut documents = self.documents.write().await;
        let key = address(namespace, id);
        let merged = merge_patch(documents.get(&key).cloned(), patch)?;
        documents.insert(key, merged.clone());
        Ok(merged)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_set_get_and_namespaces() {
        let store = MemoryNodeStore::new();
        store.set("ns", "a", json!({"score": 3})).await.unwrap();

        assert_eq!(store.get("ns", "a").await.unwrap(), Some(json!({"score": 3})));
        assert_eq!(store.get("other", "a").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_multi_get_preserves_order() {
        let store = MemoryNodeStore::new();
        store
            .multi_set("ns", vec![("a".into(), json!(1)), ("c".into(), json!(3))])
            .await
            .unwrap();

        let docs = store
            .multi_get("ns", &["c".to_string(), "b".to_string(), "a".to_string()])
            .await
            .unwrap();
        assert_eq!(docs, vec![Some(json!(3)), None, Some(json!(1))]);
    }

    #[tokio::test]
    async fn test_failed_patch_keeps_document() {
        let store = MemoryNodeStore::new();
        store.set("ns", "a", json!({"x": 1})).await.unwrap();

        assert!(store.patch("ns", "a", json!("scalar")).await.is_err());
        assert_eq!(store.get("ns", "a").await.unwrap(), Some(json!({"x": 1})));
    }
}
