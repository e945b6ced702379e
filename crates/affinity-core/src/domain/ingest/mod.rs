//! Ingestion domain module
//!
//! Turns a firehose of encoded link events into coalesced [`GraphEngine::link`]
//! calls. Exactly one consumer drains the queue, so links reach the backend in
//! arrival order and repeated events for one edge collapse into a single write.
//!
//! [`GraphEngine::link`]: crate::domain::graph::GraphEngine::link

mod firehose;
mod merge;
mod record;

pub use firehose::{AckResult, Acknowledgement, DEFAULT_CHANNEL_CAPACITY, IngestMerge, MergedWrite};
pub use merge::{LinkIdentity, PendingLink, coalesce};
pub use record::{FirehoseRecord, RawLinkRequest};
