//! Key layout for the table-store family
//!
//! ```text
//! partition_key = {namespace}:{from_node}
//! sort_key      = {entity}:{direction}:{to_node}
//! base_key      = {namespace}:{from_node}:{entity}:{direction}
//! ```
//!
//! `base_key` carries the secondary (base_key, distance) index that serves
//! ordered proximity reads.

use crate::domain::edge::{EdgeKey, EdgeScope};
use crate::infrastructure::keys::{escape, join};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RowKeys {
    pub partition_key: String,
    pub sort_key: String,
    pub base_key: String,
}

impl RowKeys {
    pub fn of(key: &EdgeKey) -> Self {
        Self {
            partition_key: partition_key(&key.namespace, &key.from_node),
            sort_key: join([
                escape(&key.entity).as_str(),
                key.direction.as_str(),
                escape(&key.to_node).as_str(),
            ]),
            base_key: base_key(&key.scope()),
        }
    }
}

pub fn partition_key(namespace: &str, from_node: &str) -> String {
    join([escape(namespace).as_str(), escape(from_node).as_str()])
}

pub fn base_key(scope: &EdgeScope) -> String {
    join([
        escape(&scope.namespace).as_str(),
        escape(&scope.from_node).as_str(),
        escape(&scope.entity).as_str(),
        scope.direction.as_str(),
    ])
}
