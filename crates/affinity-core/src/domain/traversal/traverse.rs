//! Multi-hop traversal
//!
//! Hops run one after another. Within a hop every frontier node is expanded
//! through a [`ClosestSource`] with bounded concurrency, and results are folded
//! in frontier order so output does not depend on completion order.

use std::collections::{HashMap, HashSet};

use futures_util::{StreamExt, TryStreamExt, stream};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::domain::edge::{Edge, EdgeStoreBackend, UndirectedKey};
use crate::domain::graph::GraphEngine;
use crate::error::Result;

use super::frequency::FrequencyTable;
use super::options::{MetadataFilter, TraversalJob, TraversalOptions};
use super::path::{Path, PathAssembler};
use super::source::ClosestSource;

/// Visit statistics and the surviving paths, shortest cumulative distance first
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TraversalResult {
    pub frequency: FrequencyTable,
    pub paths: Vec<Path>,
}

/// Run `jobs` hop by hop starting from the first job's `from_node`
///
/// `local` answers every hop unless `options.remote_closest` is set, in which
/// case hops from `options.remote_closest_index` on go to the remote source.
/// The first error aborts the traversal and nothing partial is returned.
pub async fn traverse(
    local: &dyn ClosestSource,
    default_namespace: &str,
    jobs: &[TraversalJob],
    options: &TraversalOptions,
) -> Result<TraversalResult> {
    if jobs.is_empty() {
        return Ok(TraversalResult::default());
    }
    options.validate(jobs)?;

    let namespace = options.namespace.as_deref().unwrap_or(default_namespace);
    let mut frequency = FrequencyTable::default();
    let mut assembler = PathAssembler::new();
    let mut processed: HashSet<UndirectedKey> = HashSet::new();
    let mut frontier: Vec<String> = jobs[0].from_node.iter().cloned().collect();

    for (hop, job) in jobs.iter().enumerate() {
        if frontier.is_empty() {
            break;
        }
        let source: &dyn ClosestSource = match &options.remote_closest {
            Some(remote) if hop >= options.remote_closest_index => remote.as_ref(),
            _ => local,
        };
        let concurrency = options.concurrency.unwrap_or(frontier.len()).max(1);

        let expansions: Vec<Vec<Edge>> = stream::iter(frontier.iter())
            .map(|node| source.closest(namespace, &job.entity, node, job.direction))
            .buffered(concurrency)
            .try_collect()
            .await?;

        let mut next = Vec::new();
        let mut queued = HashSet::new();
        let mut accepted = 0usize;
        for edge in expansions.into_iter().flatten() {
            if !processed.insert(edge.undirected_key()) {
                continue;
            }
            accepted += 1;
            frequency.record(&edge);
            assembler.push(&edge);
            if queued.insert(edge.to_node.clone()) {
                next.push(edge.to_node);
            }
        }

        debug!(hop, entity = %job.entity, expanded = frontier.len(), accepted, "Traversal hop complete");
        frontier = next;
    }

    let mut paths: Vec<Path> = assembler
        .finish()
        .into_iter()
        .filter(|path| options.keeps(path))
        .collect();
    if let Some(metadata) = &options.metadata_filter {
        paths = filter_by_metadata(metadata, namespace, paths).await?;
    }
    paths.sort_by(|a, b| a.distance.total_cmp(&b.distance));

    info!(
        namespace = %namespace,
        hops = jobs.len(),
        visited = frequency.total.len(),
        paths = paths.len(),
        "Traversal complete"
    );
    Ok(TraversalResult { frequency, paths })
}

async fn filter_by_metadata(filter: &MetadataFilter, namespace: &str, paths: Vec<Path>) -> Result<Vec<Path>> {
    let mut ends: Vec<String> = paths.iter().filter_map(|p| p.last_node()).map(str::to_string).collect();
    ends.sort();
    ends.dedup();
    if ends.is_empty() {
        return Ok(paths);
    }

    let documents = filter.store.multi_get(namespace, &ends).await?;
    let passing: HashMap<String, bool> = ends
        .into_iter()
        .zip(documents)
        .map(|(node, doc)| {
            let value = doc.as_ref().and_then(|d| d.get(&filter.field)).and_then(|v| v.as_f64());
            (node, value.is_some_and(|v| v >= filter.min))
        })
        .collect();

    Ok(paths
        .into_iter()
        .filter(|p| p.last_node().and_then(|n| passing.get(n)).copied().unwrap_or(false))
        .collect())
}

impl<B: EdgeStoreBackend + ?Sized> GraphEngine<B> {
    /// Traverse with this engine as the local neighbor source
    pub async fn traverse(&self, jobs: &[TraversalJob], options: &TraversalOptions) -> Result<TraversalResult> {
        traverse(self, &self.config().namespace, jobs, options).await
    }
}
