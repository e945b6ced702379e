//! Assembly of the configured storage family

use std::sync::Arc;

use tracing::info;

use crate::config::{BackendKind, Config};
use crate::domain::edge::EdgeStoreBackend;
use crate::domain::graph::GraphEngine;
use crate::domain::ingest::IngestMerge;
use crate::domain::node::NodeStore;
use crate::error::{Error, Result};
use crate::infrastructure::{
    MemoryNodeStore, MemorySortedSets, RangeEdgeStore, SqliteEdgeStore, SqliteNodeStore, TimeoutBackend,
};

use super::database::Database;

/// Engine, node store and the database behind them, if any
#[derive(Clone)]
pub struct GraphStore {
    pub engine: GraphEngine,
    pub nodes: Arc<dyn NodeStore>,
    pub database: Option<Database>,
    channel_capacity: usize,
}

impl GraphStore {
    /// Open the backend family named by `backend.kind`
    ///
    /// Every edge store call is bounded by `backend.timeout_ms`.
    pub async fn open(config: &Config) -> Result<Self> {
        let kind = config.backend_kind()?;
        let (backend, nodes, database): (Arc<dyn EdgeStoreBackend>, Arc<dyn NodeStore>, _) = match kind {
            BackendKind::Sqlite => {
                let database = Database::new(config.database_config())
                    .await
                    .map_err(|e| Error::backend(format!("{:#}", e)))?;
                let pool = database.pool().clone();
                (
                    Arc::new(SqliteEdgeStore::new(pool.clone())),
                    Arc::new(SqliteNodeStore::new(pool)),
                    Some(database),
                )
            }
            BackendKind::Memory => (
                Arc::new(RangeEdgeStore::new(Arc::new(MemorySortedSets::new()))),
                Arc::new(MemoryNodeStore::new()),
                None,
            ),
        };

        let backend: Arc<dyn EdgeStoreBackend> = Arc::new(TimeoutBackend::new(backend, config.backend_timeout()));
        let engine = GraphEngine::new(backend, config.engine_config())?;
        info!(backend = kind.as_str(), namespace = %config.graph.namespace, "Graph store opened");

        Ok(Self {
            engine,
            nodes,
            database,
            channel_capacity: config.ingest.channel_capacity,
        })
    }

    /// Ingestion pipeline writing through this store's engine
    pub fn ingest(&self) -> IngestMerge {
        IngestMerge::new(self.engine.clone(), self.channel_capacity)
    }

    pub async fn close(&self) {
        if let Some(database) = &self.database {
            database.close().await;
        }
    }
}
