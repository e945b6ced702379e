//! Paths and their assembly from accepted edges

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::domain::edge::Edge;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PathHop {
    pub node: String,
    /// Distance of the edge that reached this node; zero for the first hop
    pub distance: f64,
    pub entity: String,
}

/// Ordered hops plus their cumulative distance
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Path {
    pub hops: Vec<PathHop>,
    pub distance: f64,
}

impl Path {
    fn start(edge: &Edge) -> Self {
        Self {
            hops: vec![
                PathHop {
                    node: edge.from_node.clone(),
                    distance: 0.0,
                    entity: edge.entity.clone(),
                },
                PathHop {
                    node: edge.to_node.clone(),
                    distance: edge.distance,
                    entity: edge.entity.clone(),
                },
            ],
            distance: edge.distance,
        }
    }

    fn extended(&self, edge: &Edge) -> Self {
        let mut hops = self.hops.clone();
        hops.push(PathHop {
            node: edge.to_node.clone(),
            distance: edge.distance,
            entity: edge.entity.clone(),
        });
        Self {
            hops,
            distance: self.distance + edge.distance,
        }
    }

    /// Number of nodes on the path
    pub fn len(&self) -> usize {
        self.hops.len()
    }

    pub fn is_empty(&self) -> bool {
        self.hops.is_empty()
    }

    pub fn nodes(&self) -> impl Iterator<Item = &str> {
        self.hops.iter().map(|hop| hop.node.as_str())
    }

    pub fn last_node(&self) -> Option<&str> {
        self.hops.last().map(|hop| hop.node.as_str())
    }
}

/// Folds accepted edges into paths in discovery order
///
/// An edge whose source ends no path starts a new one. Otherwise every path
/// ending at the source is extended into a new path and the shorter one stays.
#[derive(Debug, Default)]
pub struct PathAssembler {
    paths: Vec<Path>,
    ends: HashMap<String, Vec<usize>>,
}

impl PathAssembler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, edge: &Edge) {
        let tails = self.ends.get(&edge.from_node).cloned().unwrap_or_default();
        if tails.is_empty() {
            self.insert(Path::start(edge));
        } else {
            for index in tails {
                let extended = self.paths[index].extended(edge);
                self.insert(extended);
            }
        }
    }

    fn insert(&mut self, path: Path) {
        if let Some(end) = path.last_node() {
            self.ends.entry(end.to_string()).or_default().push(self.paths.len());
        }
        self.paths.push(path);
    }

    pub fn finish(self) -> Vec<Path> {
        self.paths
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::edge::{Direction, EdgeKey};

    fn edge(from: &str, to: &str, distance: f64) -> Edge {
        EdgeKey::new("ns", from, "e", Direction::None, to).with_distance(distance)
    }

    #[test]
    fn test_new_sources_start_paths() {
        let mut assembler = PathAssembler::new();
        assembler.push(&edge("a", "b", 0.5));
        assembler.push(&edge("a", "c", 0.25));

        let paths = assembler.finish();
        assert_eq!(paths.len(), 2);
        assert_eq!(paths[1].nodes().collect::<Vec<_>>(), ["a", "c"]);
        assert_eq!(paths[1].distance, 0.25);
    }

    #[test]
    fn test_extension_keeps_prefix() {
        let mut assembler = PathAssembler::new();
        assembler.push(&edge("a", "b", 0.5));
        assembler.push(&edge("b", "c", 0.25));
        assembler.push(&edge("c", "d", 0.125));

        let paths = assembler.finish();
        let shapes: Vec<Vec<&str>> = paths.iter().map(|p| p.nodes().collect()).collect();
        assert_eq!(shapes, [vec!["a", "b"], vec!["a", "b", "c"], vec!["a", "b", "c", "d"]]);
        assert_eq!(paths[2].distance, 0.875);
        assert_eq!(paths[2].hops[3].distance, 0.125);
    }

    #[test]
    fn test_every_matching_tail_is_extended() {
        let mut assembler = PathAssembler::new();
        assembler.push(&edge("a", "x", 0.1));
        assembler.push(&edge("b", "x", 0.2));
        assembler.push(&edge("x", "y", 0.3));

        let paths = assembler.finish();
        assert_eq!(paths.len(), 4);
        assert_eq!(paths[2].nodes().collect::<Vec<_>>(), ["a", "x", "y"]);
        assert_eq!(paths[3].nodes().collect::<Vec<_>>(), ["b", "x", "y"]);
    }
}
