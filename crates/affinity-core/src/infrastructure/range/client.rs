//! Sorted-set client abstraction
//!
//! The range-store backend speaks to its datastore through this trait. The
//! command set mirrors what scored-collection stores commonly offer; the wire
//! protocol behind it is the implementor's concern.

use async_trait::async_trait;

use crate::error::Result;

/// Score window for [`SortedSetClient::zrange_by_score`]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScoreBounds {
    pub min: f64,
    pub max: f64,
    pub limit: Option<usize>,
    /// Highest score first
    pub rev: bool,
}

impl ScoreBounds {
    pub fn all() -> Self {
        Self {
            min: f64::NEG_INFINITY,
            max: f64::INFINITY,
            limit: None,
            rev: false,
        }
    }
}

/// Scored-collection commands used by the range-store backend
///
/// Every method is atomic with respect to a single key.
#[async_trait]
pub trait SortedSetClient: Send + Sync {
    /// Set a member's score unconditionally
    async fn zadd(&self, key: &str, member: &str, score: f64) -> Result<()>;

    /// Set a member's score only if the member is absent. Returns whether it was added.
    async fn zadd_nx(&self, key: &str, member: &str, score: f64) -> Result<bool>;

    /// Add `delta` to a member's score (absent members count as 0), raise the
    /// result to `floor` if it falls below, and return what was stored.
    /// The increment and the floor apply as one command.
    async fn zincrby_floor(&self, key: &str, member: &str, delta: f64, floor: f64) -> Result<f64>;

    async fn zscore(&self, key: &str, member: &str) -> Result<Option<f64>>;

    /// Members with scores inside `bounds`, ordered by score then member
    async fn zrange_by_score(&self, key: &str, bounds: ScoreBounds) -> Result<Vec<(String, f64)>>;

    /// Remove a member, returning the score it had
    async fn zrem(&self, key: &str, member: &str) -> Result<Option<f64>>;

    async fn zcard(&self, key: &str) -> Result<u64>;

    /// Keys matching a glob pattern where `*` matches any run of characters
    async fn scan(&self, pattern: &str) -> Result<Vec<String>>;
}
