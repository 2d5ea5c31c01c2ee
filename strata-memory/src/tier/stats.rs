//! Tier Statistics

use serde::Serialize;

/// Hit rate as `hits / (hits + misses)`, `0.0` with no lookups.
#[must_use]
pub fn hit_rate(hits: u64, misses: u64) -> f64 {
    let lookups = hits + misses;
    if lookups == 0 {
        0.0
    } else {
        #[allow(clippy::cast_precision_loss)]
        let rate = hits as f64 / lookups as f64;
        rate
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub(crate) struct TierCounters {
    pub(crate) hits: u64,
    pub(crate) misses: u64,
    pub(crate) sets: u64,
    pub(crate) deletes: u64,
    pub(crate) evictions: u64,
    pub(crate) expirations: u64,
}

/// Snapshot of one tier.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TierStats {
    /// Tier name
    pub name: String,
    /// Successful lookups
    pub hits: u64,
    /// Failed lookups (absent or expired)
    pub misses: u64,
    /// Hit rate in `[0, 1]`
    pub hit_rate: f64,
    /// Writes
    pub sets: u64,
    /// Caller deletes that removed something
    pub deletes: u64,
    /// Entries evicted for capacity
    pub evictions: u64,
    /// Entries removed after their TTL
    pub expirations: u64,
    /// Current entry count
    pub size: usize,
    /// Capacity
    pub max_size: usize,
    /// Sum of entry sizes
    pub memory_bytes: usize,
}

impl TierStats {
    pub(crate) fn from_counters(
        name: &str,
        counters: TierCounters,
        size: usize,
        max_size: usize,
        memory_bytes: usize,
    ) -> Self {
        Self {
            name: name.to_string(),
            hits: counters.hits,
            misses: counters.misses,
            hit_rate: hit_rate(counters.hits, counters.misses),
            sets: counters.sets,
            deletes: counters.deletes,
            evictions: counters.evictions,
            expirations: counters.expirations,
            size,
            max_size,
            memory_bytes,
        }
    }

    /// Fraction of capacity in use.
    #[must_use]
    pub fn utilization(&self) -> f64 {
        if self.max_size == 0 {
            return 0.0;
        }
        #[allow(clippy::cast_precision_loss)]
        let ratio = self.size as f64 / self.max_size as f64;
        ratio
    }
}
