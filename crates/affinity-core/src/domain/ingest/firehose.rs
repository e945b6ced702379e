//! Firehose ingestion
//!
//! A forwarder task decodes records and feeds a bounded channel. A single
//! consumer drains whatever queued up while its previous link was in flight,
//! coalesces it, and links each group in order.

use futures_core::Stream;
use futures_util::stream::BoxStream;
use futures_util::{StreamExt, TryStreamExt, stream};
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::domain::edge::{Edge, EdgeStoreBackend};
use crate::domain::graph::{GraphEngine, LinkRequest};
use crate::error::Result;

use super::merge::coalesce;
use super::record::FirehoseRecord;

pub const DEFAULT_CHANNEL_CAPACITY: usize = 1024;

/// One coalesced link and the records it accounts for
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MergedWrite {
    pub edges: [Edge; 2],
    pub record_ids: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AckResult {
    Ok,
}

/// Per-record acknowledgement of a processed batch
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Acknowledgement {
    pub record_id: String,
    pub result: AckResult,
}

pub struct IngestMerge<B: ?Sized = dyn EdgeStoreBackend> {
    engine: GraphEngine<B>,
    channel_capacity: usize,
}

impl<B: EdgeStoreBackend + ?Sized> IngestMerge<B> {
    pub fn new(engine: GraphEngine<B>, channel_capacity: usize) -> Self {
        Self {
            engine,
            channel_capacity: channel_capacity.max(1),
        }
    }

    pub fn engine(&self) -> &GraphEngine<B> {
        &self.engine
    }

    /// Link every decodable record, yielding one result per merged write
    ///
    /// Records that fail to decode or lack required fields are logged and
    /// dropped. A backend failure is yielded as an error and ends the stream.
    pub fn process_firehose<'a, S>(&'a self, records: S) -> BoxStream<'a, Result<MergedWrite>>
    where
        S: Stream<Item = FirehoseRecord> + Send + 'static,
    {
        let (tx, mut rx) = mpsc::channel::<(String, LinkRequest)>(self.channel_capacity);

        tokio::spawn(async move {
            let mut records = std::pin::pin!(records);
            while let Some(record) = records.next().await {
                let request = match record.decode().and_then(|raw| raw.into_link()) {
                    Ok(request) => request,
                    Err(e) => {
                        warn!(record_id = %record.record_id, error = %e, "Dropping ingestion record");
                        continue;
                    }
                };
                if tx.send((record.record_id, request)).await.is_err() {
                    debug!("Ingestion consumer gone, stopping forwarder");
                    break;
                }
            }
        });

        Box::pin(async_stream::stream! {
            while let Some(first) = rx.recv().await {
                let mut batch = vec![first];
                while let Ok(next) = rx.try_recv() {
                    batch.push(next);
                }

                let received = batch.len();
                let groups = coalesce(batch, &self.engine.config().namespace);
                debug!(received, groups = groups.len(), "Coalesced ingestion batch");

                for group in groups {
                    match self.engine.link(&group.request).await {
                        Ok(edges) => {
                            yield Ok(MergedWrite {
                                edges,
                                record_ids: group.record_ids,
                            });
                        }
                        Err(e) => {
                            yield Err(e);
                            return;
                        }
                    }
                }
            }
        })
    }

    /// Process a whole batch and acknowledge every input record
    pub async fn process_batch(&self, records: Vec<FirehoseRecord>) -> Result<Vec<Acknowledgement>> {
        let record_ids: Vec<String> = records.iter().map(|r| r.record_id.clone()).collect();
        let writes: Vec<MergedWrite> = self.process_firehose(stream::iter(records)).try_collect().await?;

        info!(records = record_ids.len(), writes = writes.len(), "Ingestion batch processed");
        Ok(record_ids
            .into_iter()
            .map(|record_id| Acknowledgement {
                record_id,
                result: AckResult::Ok,
            })
            .collect())
    }
}
