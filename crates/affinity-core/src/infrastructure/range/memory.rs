//! In-process sorted-set store
//!
//! Backs the range-store family in tests, the CLI's `memory` backend and
//! embedded use. Each key holds a member -> score map plus a score-ordered
//! index; empty sets are dropped the way scored-collection stores drop them.

use std::cmp::Ordering;
use std::collections::{BTreeMap, BTreeSet, HashMap};

use async_trait::async_trait;
use tokio::sync::RwLock;
use tracing::debug;

use crate::error::{Error, Result};

use super::client::{ScoreBounds, SortedSetClient};

/// Total order over scores
#[derive(Debug, Clone, Copy)]
struct Score(f64);

impl PartialEq for Score {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Score {}

impl PartialOrd for Score {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Score {
    fn cmp(&self, other: &Self) -> Ordering {
        self.0.total_cmp(&other.0)
    }
}

#[derive(Debug, Default)]
struct SortedSet {
    scores: HashMap<String, f64>,
    ordered: BTreeSet<(Score, String)>,
}

impl SortedSet {
    fn insert(&mut self, member: &str, score: f64) {
        if let Some(previous) = self.scores.insert(member.to_string(), score) {
            self.ordered.remove(&(Score(previous), member.to_string()));
        }
        self.ordered.insert((Score(score), member.to_string()));
    }

    fn remove(&mut self, member: &str) -> Option<f64> {
        let score = self.scores.remove(member)?;
        self.ordered.remove(&(Score(score), member.to_string()));
        Some(score)
    }

    fn range(&self, bounds: ScoreBounds) -> Vec<(String, f64)> {
        let in_bounds = |(score, _): &&(Score, String)| score.0 >= bounds.min && score.0 <= bounds.max;
        let limit = bounds.limit.unwrap_or(usize::MAX);
        let to_pair = |(score, member): &(Score, String)| (member.clone(), score.0);

        if bounds.rev {
            self.ordered.iter().rev().filter(in_bounds).take(limit).map(to_pair).collect()
        } else {
            self.ordered.iter().filter(in_bounds).take(limit).map(to_pair).collect()
        }
    }
}

/// Sorted sets held in memory
#[derive(Debug, Default)]
pub struct MemorySortedSets {
    sets: RwLock<BTreeMap<String, SortedSet>>,
}

impl MemorySortedSets {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of non-empty keys
    pub async fn key_count(&self) -> usize {
        self.sets.read().await.len()
    }
}

fn check_score(score: f64) -> Result<()> {
    if score.is_nan() {
        return Err(Error::backend("sorted-set score must not be NaN"));
    }
    Ok(())
}

#[async_trait]
impl SortedSetClient for MemorySortedSets {
    async fn zadd(&self, key: &str, member: &str, score: f64) -> Result<()> {
        check_score(score)?;
        self.sets
            .write()
            .await
            .entry(key.to_string())
            .or_default()
            .insert(member, score);
        Ok(())
    }

    async fn zadd_nx(&self, key: &str, member: &str, score: f64) -> Result<bool> {
        check_score(score)?;
        let mut sets = self.sets.write().await;
        let set = sets.entry(key.to_string()).or_default();
        if set.scores.contains_key(member) {
            return Ok(false);
        }
        set.insert(member, score);
        Ok(true)
    }

    async fn zincrby_floor(&self, key: &str, member: &str, delta: f64, floor: f64) -> Result<f64> {
        check_score(delta)?;
        check_score(floor)?;
        let mut sets = self.sets.write().await;
        let set = sets.entry(key.to_string()).or_default();
        let score = set.scores.get(member).copied().unwrap_or(0.0) + delta;
        check_score(score)?;
        let score = score.max(floor);
        set.insert(member, score);
        Ok(score)
    }

    async fn zscore(&self, key: &str, member: &str) -> Result<Option<f64>> {
        Ok(self
            .sets
            .read()
            .await
            .get(key)
            .and_then(|set| set.scores.get(member).copied()))
    }

    async fn zrange_by_score(&self, key: &str, bounds: ScoreBounds) -> Result<Vec<(String, f64)>> {
        Ok(self
            .sets
            .read()
            .await
            .get(key)
            .map(|set| set.range(bounds))
            .unwrap_or_default())
    }

    async fn zrem(&self, key: &str, member: &str) -> Result<Option<f64>> {
        let mut sets = self.sets.write().await;
        let Some(set) = sets.get_mut(key) else {
            return Ok(None);
        };
        let removed = set.remove(member);
        if set.scores.is_empty() {
            sets.remove(key);
            debug!(key, "Dropped empty sorted set");
        }
        Ok(removed)
    }

    async fn zcard(&self, key: &str) -> Result<u64> {
        Ok(self
            .sets
            .read()
            .await
            .get(key)
            .map(|set| set.scores.len() as u64)
            .unwrap_or(0))
    }

    async fn scan(&self, pattern: &str) -> Result<Vec<String>> {
        Ok(self
            .sets
            .read()
            .await
            .keys()
            .filter(|key| glob_match(pattern, key))
            .cloned()
            .collect())
    }
}

/// Glob match where `*` matches any (possibly empty) run of characters
pub(crate) fn glob_match(pattern: &str, text: &str) -> bool {
    let parts: Vec<&str> = pattern.split('*').collect();
    if parts.len() == 1 {
        return pattern == text;
    }

    let first = parts[0];
    let last = parts[parts.len() - 1];
    if !text.starts_with(first) || text.len() < first.len() + last.len() || !text.ends_with(last) {
        return false;
    }

    let mut middle = &text[first.len()..text.len() - last.len()];
    for part in &parts[1..parts.len() - 1] {
        match middle.find(part) {
            Some(pos) => middle = &middle[pos + part.len()..],
            None => return false,
        }
    }
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_zincrby_floor_starts_from_zero() {
        let store = MemorySortedSets::new();
        assert_eq!(store.zincrby_floor("k", "a", 2.5, 0.0).await.unwrap(), 2.5);
        assert_eq!(store.zincrby_floor("k", "a", -1.0, 0.0).await.unwrap(), 1.5);
        assert_eq!(store.zscore("k", "a").await.unwrap(), Some(1.5));
    }

    #[tokio::test]
    async fn test_zincrby_floor_raises_result_to_floor() {
        let store = MemorySortedSets::new();
        store.zadd("k", "a", 0.3).await.unwrap();
        assert_eq!(store.zincrby_floor("k", "a", -0.5, 0.0).await.unwrap(), 0.0);
        assert_eq!(store.zscore("k", "a").await.unwrap(), Some(0.0));
        assert_eq!(store.zincrby_floor("k", "a", 0.5, 0.0).await.unwrap(), 0.5);
    }

    #[tokio::test]
    async fn test_zadd_nx_keeps_existing() {
        let store = MemorySortedSets::new();
        assert!(store.zadd_nx("k", "a", 1.0).await.unwrap());
        assert!(!store.zadd_nx("k", "a", 5.0).await.unwrap());
        assert_eq!(store.zscore("k", "a").await.unwrap(), Some(1.0));
    }

    #[tokio::test]
    async fn test_range_ordering_and_limits() {
        let store = MemorySortedSets::new();
        store.zadd("k", "c", 3.0).await.unwrap();
        store.zadd("k", "a", 1.0).await.unwrap();
        store.zadd("k", "b", 2.0).await.unwrap();
        store.zadd("k", "a", 4.0).await.unwrap();

        let all = store.zrange_by_score("k", ScoreBounds::all()).await.unwrap();
        let members: Vec<_> = all.iter().map(|(m, _)| m.as_str()).collect();
        assert_eq!(members, ["b", "c", "a"]);

        let bounded = store
            .zrange_by_score(
                "k",
                ScoreBounds {
                    min: 2.0,
                    max: 3.5,
                    limit: Some(1),
                    rev: true,
                },
            )
            .await
            .unwrap();
        assert_eq!(bounded, vec![("c".to_string(), 3.0)]);
    }

    #[tokio::test]
    async fn test_zrem_drops_empty_keys() {
        let store = MemorySortedSets::new();
        store.zadd("k", "a", 1.0).await.unwrap();
        assert_eq!(store.zrem("k", "a").await.unwrap(), Some(1.0));
        assert_eq!(store.zrem("k", "a").await.unwrap(), None);
        assert_eq!(store.zcard("k").await.unwrap(), 0);
        assert_eq!(store.key_count().await, 0);
    }

    #[tokio::test]
    async fn test_rejects_nan() {
        let store = MemorySortedSets::new();
        assert!(store.zadd("k", "a", f64::NAN).await.is_err());
    }

    #[tokio::test]
    async fn test_scan() {
        let store = MemorySortedSets::new();
        store.zadd("e:ns:a:friend:none", "b", 1.0).await.unwrap();
        store.zadd("e:ns:b:friend:none", "a", 1.0).await.unwrap();
        store.zadd("e:other:a:friend:none", "b", 1.0).await.unwrap();

        let keys = store.scan("e:ns:*:friend:*").await.unwrap();
        assert_eq!(keys, ["e:ns:a:friend:none", "e:ns:b:friend:none"]);
    }

    #[test]
    fn test_glob_match() {
        assert!(glob_match("abc", "abc"));
        assert!(!glob_match("abc", "abcd"));
        assert!(glob_match("a*", "a"));
        assert!(glob_match("a*c", "abbbc"));
        assert!(glob_match("*:x:*", "1:x:2"));
        assert!(!glob_match("a*b*c", "acb"));
        assert!(!glob_match("ab*ba", "aba"));
    }
}
