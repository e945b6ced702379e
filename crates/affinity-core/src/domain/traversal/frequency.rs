//! Node visit counters

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::domain::edge::{Direction, Edge};

/// Visit counts per node, aggregate and per entity
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FrequencyTable {
    pub total: BTreeMap<String, u64>,
    pub by_entity: BTreeMap<String, BTreeMap<String, u64>>,
}

impl FrequencyTable {
    /// Count an accepted edge
    ///
    /// `None` and `In` credit the source node; `None` and `Out` credit the target.
    pub fn record(&mut self, edge: &Edge) {
        if matches!(edge.direction, Direction::None | Direction::In) {
            self.bump(&edge.entity, &edge.from_node);
        }
        if matches!(edge.direction, Direction::None | Direction::Out) {
            self.bump(&edge.entity, &edge.to_node);
        }
    }

    fn bump(&mut self, entity: &str, node: &str) {
        *self.total.entry(node.to_string()).or_default() += 1;
        *self
            .by_entity
            .entry(entity.to_string())
            .or_default()
            .entry(node.to_string())
            .or_default() += 1;
    }

    pub fn count(&self, node: &str) -> u64 {
        self.total.get(node).copied().unwrap_or(0)
    }

    pub fn count_for(&self, entity: &str, node: &str) -> u64 {
        self.by_entity
            .get(entity)
            .and_then(|counts| counts.get(node))
            .copied()
            .unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.total.is_empty()
    }
}
