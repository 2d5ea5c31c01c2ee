//! Manager Statistics

use std::sync::atomic::{AtomicU64, Ordering};

use serde::Serialize;

use crate::tier::{hit_rate, TierStats};

#[derive(Debug, Default)]
pub(crate) struct GlobalCounters {
    hits: AtomicU64,
    misses: AtomicU64,
    sets: AtomicU64,
    deletes: AtomicU64,
    promotions: AtomicU64,
    lookups: AtomicU64,
    lookup_micros: AtomicU64,
}

impl GlobalCounters {
    pub(crate) fn record_lookup(&self, hit: bool, micros: u64) {
        if hit {
            self.hits.fetch_add(1, Ordering::Relaxed);
        } else {
            self.misses.fetch_add(1, Ordering::Relaxed);
        }
        self.lookups.fetch_add(1, Ordering::Relaxed);
        self.lookup_micros.fetch_add(micros, Ordering::Relaxed);
    }

    pub(crate) fn record_set(&self) {
        self.sets.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_delete(&self) {
        self.deletes.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_promotions(&self, count: u64) {
        self.promotions.fetch_add(count, Ordering::Relaxed);
    }

    pub(crate) fn reset(&self) {
        for counter in [
            &self.hits,
            &self.misses,
            &self.sets,
            &self.deletes,
            &self.promotions,
            &self.lookups,
            &self.lookup_micros,
        ] {
            counter.store(0, Ordering::Relaxed);
        }
    }

    pub(crate) fn snapshot(&self, tiers: Vec<ManagedTierStats>, prefetches: usize) -> CacheStats {
        let hits = self.hits.load(Ordering::Relaxed);
        let misses = self.misses.load(Ordering::Relaxed);
        let lookups = self.lookups.load(Ordering::Relaxed);
        let micros = self.lookup_micros.load(Ordering::Relaxed);
        #[allow(clippy::cast_precision_loss)]
        let avg_access_micros = if lookups == 0 {
            0.0
        } else {
            micros as f64 / lookups as f64
        };

        CacheStats {
            tiers,
            hits,
            misses,
            hit_rate: hit_rate(hits, misses),
            sets: self.sets.load(Ordering::Relaxed),
            deletes: self.deletes.load(Ordering::Relaxed),
            promotions: self.promotions.load(Ordering::Relaxed),
            avg_access_micros,
            prefetches_in_flight: prefetches,
        }
    }
}

/// One tier's statistics as seen by the manager.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ManagedTierStats {
    /// Position in the lookup order (0 = first)
    pub priority: usize,
    /// Whether fan-out includes this tier
    pub enabled: bool,
    /// Tier-local counters
    #[serde(flatten)]
    pub stats: TierStats,
}

/// Snapshot of a [`super::CacheManager`].
///
/// `hits` and `misses` count manager lookups: a lookup served by any tier
/// is one hit, one that no tier could serve is one miss.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CacheStats {
    /// Per-tier statistics in priority order
    pub tiers: Vec<ManagedTierStats>,
    /// Lookups served by some tier
    pub hits: u64,
    /// Lookups no tier could serve
    pub misses: u64,
    /// `hits / (hits + misses)`
    pub hit_rate: f64,
    /// Manager writes
    pub sets: u64,
    /// Manager deletes that removed something
    pub deletes: u64,
    /// Copies made into higher tiers on hits
    pub promotions: u64,
    /// Mean lookup latency
    pub avg_access_micros: f64,
    /// Prefetch loaders currently running
    pub prefetches_in_flight: usize,
}

impl CacheStats {
    /// Statistics for a tier by name.
    #[must_use]
    pub fn tier(&self, name: &str) -> Option<&ManagedTierStats> {
        self.tiers.iter().find(|tier| tier.stats.name == name)
    }
}
