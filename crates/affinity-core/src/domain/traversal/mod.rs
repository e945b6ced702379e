//! Traversal domain module
//!
//! Bounded multi-hop path discovery built on the `closest` primitive alone.
//! A traversal takes an ordered list of [`TraversalJob`]s, one per hop, and
//! returns a [`FrequencyTable`] of node visits together with every surviving
//! [`Path`].
//!
//! Each physical edge is accepted at most once per traversal, keyed by its
//! [`UndirectedKey`](crate::domain::edge::UndirectedKey) regardless of entity,
//! which keeps cyclic graphs finite.

mod frequency;
mod options;
mod path;
mod source;
mod traverse;

pub use frequency::FrequencyTable;
pub use options::{
    DEFAULT_MAX_PATH, DEFAULT_MIN_PATH, DEFAULT_REMOTE_CLOSEST_INDEX, MetadataFilter, PathFilter,
    TraversalJob, TraversalOptions,
};
pub use path::{Path, PathAssembler, PathHop};
pub use source::ClosestSource;
pub use traverse::{TraversalResult, traverse};
