//! Eviction Strategies
//!
//! Each strategy maps an entry to a rank; the lowest rank is evicted first.
//! Ranks live in an ordered index so victim selection is `O(log n)`.

use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::entry::Entry;
use crate::error::CacheError;

/// Which entry to drop when a tier is full.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EvictionStrategy {
    /// Least recently used
    #[default]
    Lru,
    /// Least frequently used, ties broken by oldest insertion
    Lfu,
    /// First in, first out
    Fifo,
}

impl EvictionStrategy {
    pub(crate) fn rank<T>(self, entry: &Entry<T>) -> Rank {
        match self {
            Self::Lru => Rank(entry.touched_seq, 0),
            Self::Lfu => Rank(entry.access_count, entry.created_seq),
            Self::Fifo => Rank(entry.created_seq, 0),
        }
    }

    /// Lowercase name.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Lru => "lru",
            Self::Lfu => "lfu",
            Self::Fifo => "fifo",
        }
    }
}

impl fmt::Display for EvictionStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EvictionStrategy {
    type Err = CacheError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "lru" => Ok(Self::Lru),
            "lfu" => Ok(Self::Lfu),
            "fifo" => Ok(Self::Fifo),
            other => Err(CacheError::invalid_config(format!(
                "unknown eviction strategy: {other}"
            ))),
        }
    }
}

/// Position in the eviction order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub(crate) struct Rank(u64, u64);

/// Ordered `(rank, key)` pairs.
#[derive(Debug, Default)]
pub(crate) struct EvictionIndex {
    order: BTreeSet<(Rank, String)>,
}

impl EvictionIndex {
    pub(crate) fn insert(&mut self, rank: Rank, key: &str) {
        self.order.insert((rank, key.to_string()));
    }

    pub(crate) fn remove(&mut self, rank: Rank, key: &str) {
        let removed = self.order.remove(&(rank, key.to_string()));
        debug_assert!(removed, "eviction index out of sync for {key}");
    }

    /// Move `key` from `old` to `new` rank.
    pub(crate) fn update(&mut self, old: Rank, new: Rank, key: &str) {
        if old != new {
            self.remove(old, key);
            self.insert(new, key);
        }
    }

    /// Key with the lowest rank, without removing it.
    pub(crate) fn victim(&self) -> Option<&str> {
        self.order.first().map(|(_, key)| key.as_str())
    }

    pub(crate) fn len(&self) -> usize {
        self.order.len()
    }
}
