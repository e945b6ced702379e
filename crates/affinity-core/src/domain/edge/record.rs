//! Edge records and the keys used to address them
//!
//! An [`Edge`] is one stored record. A `link` always maintains two of them:
//! the forward record and its inverse (endpoints swapped, direction inverted).

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

use super::direction::Direction;
use super::validation::FieldCheck;

/// Distance a brand-new edge starts from before reinforcement is applied
pub const REINFORCEMENT_BASELINE: f64 = 1.0;

/// A stored edge record
///
/// `distance` is a strength score: smaller means stronger/closer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Edge {
    pub namespace: String,
    pub from_node: String,
    pub entity: String,
    pub direction: Direction,
    pub to_node: String,
    pub distance: f64,
}

impl Edge {
    /// Key addressing this record
    pub fn key(&self) -> EdgeKey {
        EdgeKey {
            namespace: self.namespace.clone(),
            from_node: self.from_node.clone(),
            entity: self.entity.clone(),
            direction: self.direction,
            to_node: self.to_node.clone(),
        }
    }

    /// The complementary record, carrying the same distance
    pub fn inverse(&self) -> Edge {
        Edge {
            namespace: self.namespace.clone(),
            from_node: self.to_node.clone(),
            entity: self.entity.clone(),
            direction: self.direction.inverse(),
            to_node: self.from_node.clone(),
            distance: self.distance,
        }
    }

    /// Identity shared by a record and its inverse
    pub fn undirected_key(&self) -> UndirectedKey {
        UndirectedKey::of(&self.from_node, &self.to_node, self.direction)
    }
}

/// Physical-edge identity used for traversal dedup
///
/// Endpoints are sorted; when sorting swaps them the direction is inverted,
/// so `a -out-> b` and its stored inverse `b -in-> a` produce the same key.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct UndirectedKey {
    pub low: String,
    pub high: String,
    pub direction: Direction,
}

impl UndirectedKey {
    pub fn of(from_node: &str, to_node: &str, direction: Direction) -> Self {
        if from_node <= to_node {
            Self {
                low: from_node.to_string(),
                high: to_node.to_string(),
                direction,
            }
        } else {
            Self {
                low: to_node.to_string(),
                high: from_node.to_string(),
                direction: direction.inverse(),
            }
        }
    }
}

/// Address of exactly one edge record
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EdgeKey {
    pub namespace: String,
    pub from_node: String,
    pub entity: String,
    #[serde(default)]
    pub direction: Direction,
    pub to_node: String,
}

impl EdgeKey {
    pub fn new(
        namespace: impl Into<String>,
        from_node: impl Into<String>,
        entity: impl Into<String>,
        direction: Direction,
        to_node: impl Into<String>,
    ) -> Self {
        Self {
            namespace: namespace.into(),
            from_node: from_node.into(),
            entity: entity.into(),
            direction,
            to_node: to_node.into(),
        }
    }

    /// Key of the complementary record
    pub fn inverse(&self) -> EdgeKey {
        EdgeKey {
            namespace: self.namespace.clone(),
            from_node: self.to_node.clone(),
            entity: self.entity.clone(),
            direction: self.direction.inverse(),
            to_node: self.from_node.clone(),
        }
    }

    /// Adjacency set this record belongs to
    pub fn scope(&self) -> EdgeScope {
        EdgeScope {
            namespace: self.namespace.clone(),
            from_node: self.from_node.clone(),
            entity: self.entity.clone(),
            direction: self.direction,
        }
    }

    pub fn with_distance(&self, distance: f64) -> Edge {
        Edge {
            namespace: self.namespace.clone(),
            from_node: self.from_node.clone(),
            entity: self.entity.clone(),
            direction: self.direction,
            to_node: self.to_node.clone(),
            distance,
        }
    }

    pub fn validate(&self) -> Result<()> {
        FieldCheck::new()
            .require("namespace", &self.namespace)
            .require("entity", &self.entity)
            .require("from_node", &self.from_node)
            .require("to_node", &self.to_node)
            .finish("edge key is missing required fields")
    }
}

/// All records leaving one node under one entity and direction
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EdgeScope {
    pub namespace: String,
    pub from_node: String,
    pub entity: String,
    #[serde(default)]
    pub direction: Direction,
}

impl EdgeScope {
    pub fn new(
        namespace: impl Into<String>,
        from_node: impl Into<String>,
        entity: impl Into<String>,
        direction: Direction,
    ) -> Self {
        Self {
            namespace: namespace.into(),
            from_node: from_node.into(),
            entity: entity.into(),
            direction,
        }
    }

    pub fn key_to(&self, to_node: impl Into<String>) -> EdgeKey {
        EdgeKey {
            namespace: self.namespace.clone(),
            from_node: self.from_node.clone(),
            entity: self.entity.clone(),
            direction: self.direction,
            to_node: to_node.into(),
        }
    }

    pub fn validate(&self) -> Result<()> {
        FieldCheck::new()
            .require("namespace", &self.namespace)
            .require("entity", &self.entity)
            .require("from_node", &self.from_node)
            .finish("edge scope is missing required fields")
    }
}

/// Key-prefix filter for bulk reads and deletes
///
/// Unset components match anything.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EdgeFilter {
    pub namespace: String,
    pub from_node: Option<String>,
    pub entity: Option<String>,
    pub direction: Option<Direction>,
}

impl EdgeFilter {
    pub fn namespace(namespace: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            ..Default::default()
        }
    }

    pub fn from_node(mut self, node: impl Into<String>) -> Self {
        self.from_node = Some(node.into());
        self
    }

    pub fn entity(mut self, entity: impl Into<String>) -> Self {
        self.entity = Some(entity.into());
        self
    }

    pub fn direction(mut self, direction: Direction) -> Self {
        self.direction = Some(direction);
        self
    }

    /// Whether a record falls under this filter
    pub fn matches(&self, edge: &Edge) -> bool {
        edge.namespace == self.namespace
            && self.from_node.as_ref().is_none_or(|n| *n == edge.from_node)
            && self.entity.as_ref().is_none_or(|e| *e == edge.entity)
            && self.direction.is_none_or(|d| d == edge.direction)
    }

    pub fn validate(&self) -> Result<()> {
        FieldCheck::new()
            .require("namespace", &self.namespace)
            .optional("from_node", self.from_node.as_deref())
            .optional("entity", self.entity.as_deref())
            .finish("edge filter is invalid")
    }
}

/// Inclusive distance bounds
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DistanceRange {
    pub min: f64,
    pub max: f64,
}

impl DistanceRange {
    pub const UNBOUNDED: DistanceRange = DistanceRange {
        min: f64::NEG_INFINITY,
        max: f64::INFINITY,
    };

    pub fn new(min: f64, max: f64) -> Self {
        Self { min, max }
    }

    pub fn contains(&self, distance: f64) -> bool {
        distance >= self.min && distance <= self.max
    }

    pub fn validate(&self) -> Result<()> {
        FieldCheck::new()
            .check("range", !self.min.is_nan() && !self.max.is_nan() && self.min <= self.max)
            .finish("distance range must be [min, max] with min <= max")
    }
}

impl std::str::FromStr for DistanceRange {
    type Err = Error;

    /// Parses `min,max`; either side may be empty for an open bound
    fn from_str(s: &str) -> Result<Self> {
        let malformed = || Error::invalid_field("range", format!("expected 'min,max', got '{}'", s));
        let (min, max) = s.split_once(',').ok_or_else(malformed)?;
        let bound = |part: &str, open: f64| -> Result<f64> {
            let part = part.trim();
            if part.is_empty() {
                Ok(open)
            } else {
                part.parse::<f64>().map_err(|_| malformed())
            }
        };
        let range = DistanceRange::new(bound(min, f64::NEG_INFINITY)?, bound(max, f64::INFINITY)?);
        range.validate()?;
        Ok(range)
    }
}

/// Ordered read of one adjacency set
#[derive(Debug, Clone, PartialEq)]
pub struct DistanceQuery {
    pub scope: EdgeScope,
    pub range: Option<DistanceRange>,
    pub limit: Option<usize>,
    pub desc: bool,
}

impl DistanceQuery {
    pub fn new(scope: EdgeScope) -> Self {
        Self {
            scope,
            range: None,
            limit: None,
            desc: false,
        }
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

    /// Bounds to apply; an absent range spans everything
    pub fn bounds(&self) -> DistanceRange {
        self.range.unwrap_or(DistanceRange::UNBOUNDED)
    }

    pub fn validate(&self) -> Result<()> {
        let range_ok = self.range.is_none_or(|r| r.validate().is_ok());
        FieldCheck::new()
            .require("namespace", &self.scope.namespace)
            .require("entity", &self.scope.entity)
            .require("from_node", &self.scope.from_node)
            .check("range", range_ok)
            .check("limit", self.limit != Some(0))
            .finish("distance query is invalid")
    }
}

/// Append the synthesized inverse after every record
pub fn with_inverses(edges: Vec<Edge>) -> Vec<Edge> {
    let mut expanded = Vec::with_capacity(edges.len() * 2);
    for edge in edges {
        let inverse = edge.inverse();
        expanded.push(edge);
        expanded.push(inverse);
    }
    expanded
}

#[cfg(test)]
mod tests {
    use super::*;

    fn edge(from: &str, to: &str, direction: Direction) -> Edge {
        EdgeKey::new("ns", from, "friend", direction, to).with_distance(0.5)
    }

    #[test]
    fn test_inverse_swaps_and_inverts() {
        let e = edge("a", "b", Direction::Out);
        let inv = e.inverse();
        assert_eq!(inv.from_node, "b");
        assert_eq!(inv.to_node, "a");
        assert_eq!(inv.direction, Direction::In);
        assert_eq!(inv.distance, 0.5);
        assert_eq!(inv.inverse(), e);
    }

    #[test]
    fn test_undirected_key_matches_inverse() {
        let e = edge("b", "a", Direction::Out);
        assert_eq!(e.undirected_key(), e.inverse().undirected_key());

        let undirected = edge("x", "y", Direction::None);
        assert_eq!(undirected.undirected_key(), undirected.inverse().undirected_key());

        assert_ne!(
            edge("a", "b", Direction::Out).undirected_key(),
            edge("a", "b", Direction::None).undirected_key()
        );
    }

    #[test]
    fn test_key_validation_lists_missing_fields() {
        let key = EdgeKey::new("", "a", "", Direction::None, "");
        let err = key.validate().unwrap_err();
        assert_eq!(err.fields(), ["namespace", "entity", "to_node"]);
    }

    #[test]
    fn test_filter_matches() {
        let e = edge("a", "b", Direction::Out);
        assert!(EdgeFilter::namespace("ns").matches(&e));
        assert!(EdgeFilter::namespace("ns").from_node("a").direction(Direction::Out).matches(&e));
        assert!(!EdgeFilter::namespace("ns").entity("viewed").matches(&e));
        assert!(!EdgeFilter::namespace("other").matches(&e));
    }

    #[test]
    fn test_range_parsing() {
        let range: DistanceRange = "0.5,1".parse().unwrap();
        assert_eq!(range, DistanceRange::new(0.5, 1.0));

        let open: DistanceRange = ",2".parse().unwrap();
        assert_eq!(open.min, f64::NEG_INFINITY);
        assert_eq!(open.max, 2.0);

        assert!("1".parse::<DistanceRange>().is_err());
        assert!("abc,1".parse::<DistanceRange>().is_err());
        assert!("2,1".parse::<DistanceRange>().is_err());
    }

    #[test]
    fn test_distance_query_validation() {
        let scope = EdgeScope::new("ns", "a", "friend", Direction::None);
        assert!(DistanceQuery::new(scope.clone()).validate().is_ok());

        let err = DistanceQuery::new(scope.clone())
            .range(DistanceRange::new(2.0, 1.0))
            .limit(0)
            .validate()
            .unwrap_err();
        assert_eq!(err.fields(), ["range", "limit"]);

        let nan = DistanceQuery::new(scope).range(DistanceRange::new(f64::NAN, 1.0));
        assert!(nan.validate().is_err());
    }

    #[test]
    fn test_with_inverses_interleaves() {
        let expanded = with_inverses(vec![edge("a", "b", Direction::Out), edge("a", "c", Direction::None)]);
        assert_eq!(expanded.len(), 4);
        assert_eq!(expanded[1].from_node, "b");
        assert_eq!(expanded[1].direction, Direction::In);
        assert_eq!(expanded[3].from_node, "c");
    }

    #[test]
    fn test_edge_serializes_camel_case() {
        let json = serde_json::to_value(edge("a", "b", Direction::None)).unwrap();
        assert_eq!(json["fromNode"], "a");
        assert_eq!(json["toNode"], "b");
        assert!(json["direction"].is_null());
    }
}
