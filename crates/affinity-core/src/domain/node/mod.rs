//! Node metadata
//!
//! Nodes need no existence record for edges to refer to them. Callers that want
//! to attach data to a node store a JSON document per `(namespace, id)`; the
//! traversal metadata filter reads it back.

use async_trait::async_trait;
use serde_json::{Map, Value};

use crate::domain::edge::FieldCheck;
use crate::error::{Error, Result};

/// Key/value store of per-node JSON documents
#[async_trait]
pub trait NodeStore: Send + Sync {
    async fn get(&self, namespace: &str, id: &str) -> Result<Option<Value>>;

    async fn set(&self, namespace: &str, id: &str, data: Value) -> Result<()>;

    /// Documents for `ids`, in the same order, `None` where absent
    async fn multi_get(&self, namespace: &str, ids: &[String]) -> Result<Vec<Option<Value>>>;

    async fn multi_set(&self, namespace: &str, entries: Vec<(String, Value)>) -> Result<()>;

    /// Shallow-merge `patch` into the stored document and return the result
    ///
    /// An absent node starts from an empty object.
    async fn patch(&self, namespace: &str, id: &str, patch: Value) -> Result<Value>;
}

/// Validate a node address
pub fn validate_node(namespace: &str, id: &str) -> Result<()> {
    FieldCheck::new()
        .require("namespace", namespace)
        .require("id", id)
        .finish("node address is missing required fields")
}

/// Shallow JSON-object merge
///
/// Top-level keys of `patch` replace those in `base`; a `null` value removes
/// the key. A non-object base is replaced by an empty object first.
pub fn merge_patch(base: Option<Value>, patch: Value) -> Result<Value> {
    let Value::Object(changes) = patch else {
        return Err(Error::invalid_field("data", "node patch must be a JSON object"));
    };

    let mut merged = match base {
        Some(Value::Object(map)) => map,
        _ => Map::new(),
    };
    for (key, value) in changes {
        if value.is_null() {
            merged.remove(&key);
        } else {
            merged.insert(key, value);
        }
    }
    Ok(Value::Object(merged))
}
