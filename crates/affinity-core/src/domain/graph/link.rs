//! Link and closest-neighbor requests

use serde::{Deserialize, Serialize};

use crate::domain::edge::{Direction, DistanceRange, FieldCheck};
use crate::error::Result;

/// One logical relation to record or reinforce
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LinkRequest {
    /// Falls back to the engine namespace
    #[serde(default)]
    pub namespace: Option<String>,
    pub entity: String,
    pub from_node: String,
    pub to_node: String,
    #[serde(default)]
    pub direction: Direction,
    /// Reinforcement multiplier
    #[serde(default = "default_weight")]
    pub weight: f64,
    /// Set both records to this value instead of reinforcing
    #[serde(default)]
    pub absolute_distance: Option<f64>,
}

fn default_weight() -> f64 {
    1.0
}

impl LinkRequest {
    pub fn new(entity: impl Into<String>, from_node: impl Into<String>, to_node: impl Into<String>) -> Self {
        Self {
            namespace: None,
            entity: entity.into(),
            from_node: from_node.into(),
            to_node: to_node.into(),
            direction: Direction::None,
            weight: default_weight(),
            absolute_distance: None,
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

    pub fn weight(mut self, weight: f64) -> Self {
        self.weight = weight;
        self
    }

    pub fn absolute(mut self, distance: f64) -> Self {
        self.absolute_distance = Some(distance);
        self
    }

    pub fn validate(&self) -> Result<()> {
        FieldCheck::new()
            .optional("namespace", self.namespace.as_deref())
            .require("entity", &self.entity)
            .require("from_node", &self.from_node)
            .require("to_node", &self.to_node)
            .finite("weight", self.weight)
            .check(
                "absolute_distance",
                self.absolute_distance.is_none_or(|d| d.is_finite() && d >= 0.0),
            )
            .finish("link request is invalid")
    }
}

/// Nearest neighbors of one node
#[derive(Debug, Clone, PartialEq)]
pub struct ClosestQuery {
    pub namespace: Option<String>,
    pub entity: String,
    pub from_node: String,
    pub direction: Direction,
    pub range: Option<DistanceRange>,
    pub limit: Option<usize>,
    pub desc: bool,
}

impl ClosestQuery {
    pub fn new(entity: impl Into<String>, from_node: impl Into<String>) -> Self {
        Self {
            namespace: None,
            entity: entity.into(),
            from_node: from_node.into(),
            direction: Direction::None,
            range: None,
            limit: None,
            desc: false,
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

    pub fn range(mut self, range: DistanceRange) -> Self {
        self.range = Some(range);
        self
    }

    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn descending(mut self) -> Self {
        self.desc = true;
        self
    }
}
