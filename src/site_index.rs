//! Ordered index of mutated sites keyed by genomic position.
//!
//! Rebuilt from empty on every generation run. The index answers two
//! questions: has this exact position been used already, and what is the
//! ascending-position order of everything placed so far.

use std::collections::BTreeMap;

use derive_more::From;

use crate::arena::ArenaId;

/// Total-order wrapper so f64 positions can key a `BTreeMap`.
#[derive(Debug, Clone, Copy, From)]
pub struct PositionKey(f64);

impl PartialEq for PositionKey {
    fn eq(&self, other: &Self) -> bool {
        self.0.total_cmp(&other.0).is_eq()
    }
}

impl Eq for PositionKey {}

impl PartialOrd for PositionKey {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for PositionKey {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.0.total_cmp(&other.0)
    }
}

#[derive(Debug, Default)]
pub struct SiteIndex {
    index: BTreeMap<PositionKey, ArenaId>,
}

impl SiteIndex {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, position: f64) -> bool {
        self.index.contains_key(&PositionKey(position))
    }

    /// Returns the previous record on a duplicate position; callers guard
    /// with [`SiteIndex::contains`] first.
    pub fn insert(&mut self, position: f64, id: ArenaId) -> Option<ArenaId> {
        self.index.insert(PositionKey(position), id)
    }

    /// In-order traversal, ascending by position.
    pub fn iter(&self) -> impl Iterator<Item = (f64, ArenaId)> + '_ {
        self.index.iter().map(|(key, id)| (key.0, *id))
    }

    pub fn clear(&mut self) {
        self.index.clear();
    }

    pub fn len(&self) -> usize {
        self.index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }
}
