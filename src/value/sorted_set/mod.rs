//! # Sorted set
//!
//! Couples a [`Skiplist`] (ordered by score, for rank/range queries) with a
//! `member -> score` map (for O(1) score lookups), the same split the
//! original implementation uses.
pub mod border;
pub mod skiplist;

use bytes::Bytes;
use skiplist::{Element, Skiplist};
use std::collections::HashMap;

pub use border::ScoreBorder;

/// An ordered collection of `(member, score)` pairs.
#[derive(Debug, Default)]
pub struct SortedSet {
    list: Skiplist,
    scores: HashMap<Bytes, f64>,
}

impl Clone for SortedSet {
    fn clone(&self) -> Self {
        let mut new = SortedSet::new();
        for elem in self.list.iter() {
            new.insert(elem.member.clone(), elem.score);
        }
        new
    }
}

impl PartialEq for SortedSet {
    fn eq(&self, other: &Self) -> bool {
        self.scores == other.scores
    }
}

impl SortedSet {
    /// Creates an empty sorted set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of members.
    pub fn len(&self) -> usize {
        self.scores.len()
    }

    /// Whether the set has no members.
    pub fn is_empty(&self) -> bool {
        self.scores.is_empty()
    }

    /// Score of `member`, if present.
    pub fn score(&self, member: &[u8]) -> Option<f64> {
        self.scores.get(member).copied()
    }

    /// Inserts or updates `member` with `score`. Returns true if the member
    /// is new.
    pub fn insert(&mut self, member: Bytes, score: f64) -> bool {
        let is_new = match self.scores.get(&member) {
            Some(old) => {
                self.list.remove(&member, *old);
                false
            }
            None => true,
        };
        self.list.insert(member.clone(), score);
        self.scores.insert(member, score);
        is_new
    }

    /// Removes `member`. Returns whether it was present.
    pub fn remove(&mut self, member: &[u8]) -> bool {
        match self.scores.remove(member) {
            Some(score) => {
                self.list.remove(member, score);
                true
            }
            None => false,
        }
    }

    /// 0-based ascending rank of `member`.
    pub fn rank(&self, member: &[u8]) -> Option<usize> {
        let score = self.score(member)?;
        self.list.rank(member, score)
    }

    /// Member at 0-based ascending `rank`, if in range.
    pub fn by_rank(&self, rank: usize) -> Option<&Element> {
        self.list.by_rank(rank)
    }

    /// Number of members whose score lies within `[min, max]`.
    pub fn count(&self, min: &ScoreBorder, max: &ScoreBorder) -> usize {
        self.list
            .iter()
            .filter(|e| min.allows_min(e.score) && max.allows_max(e.score))
            .count()
    }

    /// Members within `[min, max]`, in ascending score order.
    pub fn range_by_score(&self, min: &ScoreBorder, max: &ScoreBorder) -> Vec<Element> {
        self.list
            .iter()
            .filter(|e| min.allows_min(e.score) && max.allows_max(e.score))
            .cloned()
            .collect()
    }

    /// Members within the inclusive `[start, stop]` rank range, both already
    /// normalized and clamped by the caller. Negative indices are resolved by
    /// the caller against `len()` before calling this.
    pub fn range_by_rank(&self, start: usize, stop: usize) -> Vec<Element> {
        self.list
            .iter()
            .skip(start)
            .take(stop.saturating_sub(start) + 1)
            .cloned()
            .collect()
    }

    /// Iterates members in ascending score order.
    pub fn iter(&self) -> impl Iterator<Item = &Element> {
        self.list.iter()
    }
}
