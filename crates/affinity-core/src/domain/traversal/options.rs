//! Traversal jobs and options

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::domain::edge::{Direction, FieldCheck};
use crate::domain::node::NodeStore;
use crate::error::Result;

use super::path::Path;
use super::source::ClosestSource;

pub const DEFAULT_MIN_PATH: usize = 2;
pub const DEFAULT_MAX_PATH: usize = 30;
pub const DEFAULT_REMOTE_CLOSEST_INDEX: usize = 1;

/// Template for one hop
///
/// Only the first job's `from_node` is used; later hops start from the nodes the
/// previous hop reached.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TraversalJob {
    pub entity: String,
    #[serde(default)]
    pub direction: Direction,
    #[serde(default)]
    pub from_node: Option<String>,
}

impl TraversalJob {
    pub fn new(entity: impl Into<String>) -> Self {
        Self {
            entity: entity.into(),
            direction: Direction::None,
            from_node: None,
        }
    }

    pub fn from(mut self, node: impl Into<String>) -> Self {
        self.from_node = Some(node.into());
        self
    }

    pub fn direction(mut self, direction: Direction) -> Self {
        self.direction = direction;
        self
    }
}

pub type PathFilter = Arc<dyn Fn(&Path) -> bool + Send + Sync>;

/// Keeps paths whose last node carries a numeric `field` of at least `min`
#[derive(Clone)]
pub struct MetadataFilter {
    pub store: Arc<dyn NodeStore>,
    pub field: String,
    pub min: f64,
}

impl fmt::Debug for MetadataFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MetadataFilter")
            .field("field", &self.field)
            .field("min", &self.min)
            .finish_non_exhaustive()
    }
}

#[derive(Clone)]
pub struct TraversalOptions {
    /// Falls back to the engine namespace
    pub namespace: Option<String>,
    /// Expansions in flight within one hop; unbounded when unset
    pub concurrency: Option<usize>,
    pub min_path: usize,
    pub max_path: usize,
    /// Keep only paths whose node count is a multiple of this
    pub mod_path: Option<usize>,
    pub filter: Option<PathFilter>,
    pub metadata_filter: Option<MetadataFilter>,
    /// Answers hops from `remote_closest_index` onwards
    pub remote_closest: Option<Arc<dyn ClosestSource>>,
    pub remote_closest_index: usize,
}

impl Default for TraversalOptions {
    fn default() -> Self {
        Self {
            namespace: None,
            concurrency: None,
            min_path: DEFAULT_MIN_PATH,
            max_path: DEFAULT_MAX_PATH,
            mod_path: None,
            filter: None,
            metadata_filter: None,
            remote_closest: None,
            remote_closest_index: DEFAULT_REMOTE_CLOSEST_INDEX,
        }
    }
}

impl fmt::Debug for TraversalOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TraversalOptions")
            .field("namespace", &self.namespace)
            .field("concurrency", &self.concurrency)
            .field("min_path", &self.min_path)
            .field("max_path", &self.max_path)
            .field("mod_path", &self.mod_path)
            .field("filter", &self.filter.is_some())
            .field("metadata_filter", &self.metadata_filter)
            .field("remote_closest", &self.remote_closest.is_some())
            .field("remote_closest_index", &self.remote_closest_index)
            .finish()
    }
}

impl TraversalOptions {
    pub fn namespace(mut self, namespace: impl Into<String>) -> Self {
        self.namespace = Some(namespace.into());
        self
    }

    pub fn concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = Some(concurrency);
        self
    }

    pub fn path_len(mut self, min_path: usize, max_path: usize) -> Self {
        self.min_path = min_path;
        self.max_path = max_path;
        self
    }

    pub fn mod_path(mut self, mod_path: usize) -> Self {
        self.mod_path = Some(mod_path);
        self
    }

    pub fn filter(mut self, filter: impl Fn(&Path) -> bool + Send + Sync + 'static) -> Self {
        self.filter = Some(Arc::new(filter));
        self
    }

    pub fn metadata_filter(mut self, store: Arc<dyn NodeStore>, field: impl Into<String>, min: f64) -> Self {
        self.metadata_filter = Some(MetadataFilter {
            store,
            field: field.into(),
            min,
        });
        self
    }

    pub fn remote(mut self, source: Arc<dyn ClosestSource>, from_hop: usize) -> Self {
        self.remote_closest = Some(source);
        self.remote_closest_index = from_hop;
        self
    }

    /// Whether a path passes the length, modulus and predicate filters
    pub fn keeps(&self, path: &Path) -> bool {
        let len = path.len();
        len >= self.min_path
            && len <= self.max_path
            && self.mod_path.is_none_or(|m| len % m == 0)
            && self.filter.as_ref().is_none_or(|f| f(path))
    }

    pub(crate) fn validate(&self, jobs: &[TraversalJob]) -> Result<()> {
        let mut check = FieldCheck::new()
            .optional("namespace", self.namespace.as_deref())
            .check("concurrency", self.concurrency != Some(0))
            .check("max_path", self.min_path <= self.max_path)
            .check("mod_path", self.mod_path != Some(0))
            .check(
                "metadata_filter",
                self.metadata_filter
                    .as_ref()
                    .is_none_or(|m| !m.field.trim().is_empty() && !m.min.is_nan()),
            );

        if let Some(first) = jobs.first() {
            check = check.check(
                "from_node",
                first.from_node.as_deref().is_some_and(|n| !n.trim().is_empty()),
            );
        }
        for job in jobs {
            check = check.require("entity", &job.entity);
        }
        check.finish("traversal request is invalid")
    }
}
