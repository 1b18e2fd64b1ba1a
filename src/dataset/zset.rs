//! Sorted set
//!
//! Member → score map; ordered views are computed on demand, sorted by
//! score and then by member bytes.

use std::cmp::Ordering;
use std::collections::HashMap;

/// Score bound of a range query
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScoreBound {
    pub value: f64,
    pub exclusive: bool,
}

impl ScoreBound {
    pub fn inclusive(value: f64) -> Self {
        Self {
            value,
            exclusive: false,
        }
    }

    fn admits_above(&self, score: f64) -> bool {
        if self.exclusive {
            score > self.value
        } else {
            score >= self.value
        }
    }

    fn admits_below(&self, score: f64) -> bool {
        if self.exclusive {
            score < self.value
        } else {
            score <= self.value
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct SortedSet {
    scores: HashMap<Vec<u8>, f64>,
}

impl SortedSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the score of `member`; returns true when the member is new
    pub fn insert(&mut self, member: Vec<u8>, score: f64) -> bool {
        self.scores.insert(member, score).is_none()
    }

    pub fn remove(&mut self, member: &[u8]) -> bool {
        self.scores.remove(member).is_some()
    }

    pub fn score(&self, member: &[u8]) -> Option<f64> {
        self.scores.get(member).copied()
    }

    pub fn len(&self) -> usize {
        self.scores.len()
    }

    pub fn is_empty(&self) -> bool {
        self.scores.is_empty()
    }

    /// Every member with its score, in rank order
    pub fn ranked(&self) -> Vec<(&[u8], f64)> {
        let mut entries: Vec<(&[u8], f64)> = self
            .scores
            .iter()
            .map(|(member, score)| (member.as_slice(), *score))
            .collect();
        entries.sort_by(|a, b| {
            a.1.partial_cmp(&b.1)
                .unwrap_or(Ordering::Equal)
                .then_with(|| a.0.cmp(b.0))
        });
        entries
    }

    /// Members with rank in `start..=stop`; negative ranks count from the end
    pub fn range(&self, start: i64, stop: i64) -> Vec<(&[u8], f64)> {
        let ranked = self.ranked();
        let len = ranked.len() as i64;
        let start = if start < 0 { (len + start).max(0) } else { start };
        let stop = if stop < 0 { len + stop } else { stop.min(len - 1) };
        if start > stop || start >= len {
            return Vec::new();
        }
        ranked[start as usize..=stop as usize].to_vec()
    }

    /// Remove every member whose score lies between the bounds
    pub fn remove_range_by_score(&mut self, min: ScoreBound, max: ScoreBound) -> Vec<Vec<u8>> {
        let doomed: Vec<Vec<u8>> = self
            .scores
            .iter()
            .filter(|(_, score)| min.admits_above(**score) && max.admits_below(**score))
            .map(|(member, _)| member.clone())
            .collect();
        for member in &doomed {
            self.scores.remove(member);
        }
        doomed
    }
}
