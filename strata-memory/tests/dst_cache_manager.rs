//! DST: CacheManager Property Tests
//!
//! Random set/get/delete/sweep sequences against a three-tier manager on a
//! simulated clock. Invariants:
//! - no tier grows past its capacity
//! - a lookup only ever returns the latest value written for that key
//! - a deleted key stays gone until written again
//! - manager hit/miss counters match the lookups performed
//!
//! Reproduce a failure with `DST_SEED=<seed> cargo test --test dst_cache_manager`.

use std::collections::HashMap;
use std::time::Duration;

use strata_memory::dst::{
    test_seeds, DeterministicRng, PropertyTest, PropertyTestable, SimClock, SimConfig,
    TimeAdvanceConfig,
};
use strata_memory::{CacheConfig, CacheManager, EvictionStrategy, TierConfig};
use tokio::runtime::Runtime;

const KEYS_COUNT: usize = 16;

#[derive(Debug, Clone)]
enum CacheOp {
    Set { key: usize, ttl_ms: Option<u64> },
    Get { key: usize },
    MGet { keys: Vec<usize> },
    Delete { key: usize },
    ClearL1,
    Sweep,
}

struct CacheModel {
    runtime: Runtime,
    cache: CacheManager<u64>,
    /// Latest value written per key; `None` after a delete.
    latest: HashMap<String, Option<u64>>,
    writes: u64,
    lookups: u64,
    violation: Option<String>,
}

impl CacheModel {
    fn new(clock: &SimClock) -> Self {
        let config = CacheConfig::with_tiers(vec![
            TierConfig::new("l1")
                .with_max_size(3)
                .with_default_ttl(Duration::from_millis(200))
                .with_strategy(EvictionStrategy::Lru),
            TierConfig::new("l2")
                .with_max_size(6)
                .with_default_ttl(Duration::from_millis(1_000))
                .with_strategy(EvictionStrategy::Lfu),
            TierConfig::new("l3")
                .with_max_size(12)
                .without_default_ttl()
                .with_strategy(EvictionStrategy::Fifo),
        ])
        .without_sweeper();

        Self {
            runtime: tokio::runtime::Builder::new_current_thread()
                .enable_all()
                .build()
                .unwrap(),
            cache: CacheManager::with_clock(config, clock.shared()).unwrap(),
            latest: HashMap::new(),
            writes: 0,
            lookups: 0,
            violation: None,
        }
    }

    fn check_lookup(&mut self, key: &str, found: Option<u64>) {
        let Some(value) = found else {
            return;
        };
        match self.latest.get(key) {
            Some(Some(expected)) if *expected == value => {}
            Some(Some(expected)) => {
                self.violation = Some(format!("{key}: got stale {value}, latest is {expected}"));
            }
            Some(None) => {
                self.violation = Some(format!("{key}: deleted but returned {value}"));
            }
            None => {
                self.violation = Some(format!("{key}: never written but returned {value}"));
            }
        }
    }
}

impl PropertyTestable for CacheModel {
    type Operation = CacheOp;

    fn generate_operation(&self, rng: &mut DeterministicRng) -> CacheOp {
        let key = rng.next_usize(0, KEYS_COUNT - 1);
        match rng.next_usize(0, 19) {
            0..=6 => CacheOp::Set {
                key,
                ttl_ms: rng.next_bool(0.5).then(|| rng.next_u64_in(1, 2_000)),
            },
            7..=12 => CacheOp::Get { key },
            13 | 14 => CacheOp::MGet {
                keys: (0..rng.next_usize(1, 4))
                    .map(|_| rng.next_usize(0, KEYS_COUNT - 1))
                    .collect(),
            },
            15 | 16 => CacheOp::Delete { key },
            17 => CacheOp::ClearL1,
            _ => CacheOp::Sweep,
        }
    }

    fn apply_operation(&mut self, op: &CacheOp, _clock: &SimClock) {
        match op {
            CacheOp::Set { key, ttl_ms } => {
                let key = format!("k{key}");
                self.writes += 1;
                let value = self.writes;
                self.runtime
                    .block_on(self.cache.set(&key, value, ttl_ms.map(Duration::from_millis)))
                    .unwrap();
                self.latest.insert(key, Some(value));
            }
            CacheOp::Get { key } => {
                let key = format!("k{key}");
                self.lookups += 1;
                let found = self.runtime.block_on(self.cache.get(&key)).unwrap();
                self.check_lookup(&key, found);
            }
            CacheOp::MGet { keys } => {
                let keys: Vec<String> = keys.iter().map(|k| format!("k{k}")).collect();
                self.lookups += keys.len() as u64;
                let found = self.runtime.block_on(self.cache.mget(keys.as_slice())).unwrap();
                for key in &keys {
                    self.check_lookup(key, found.get(key).copied());
                }
            }
            CacheOp::Delete { key } => {
                let key = format!("k{key}");
                self.runtime.block_on(self.cache.delete(&key)).unwrap();
                self.latest.insert(key, None);
            }
            CacheOp::ClearL1 => {
                self.runtime.block_on(self.cache.clear_tier("l1")).unwrap();
            }
            CacheOp::Sweep => {
                self.cache.sweep_expired();
            }
        }
    }

    fn check_invariants(&self) -> Result<(), String> {
        if let Some(violation) = &self.violation {
            return Err(violation.clone());
        }

        let stats = self.cache.stats();
        for tier in &stats.tiers {
            if tier.stats.size > tier.stats.max_size {
                return Err(format!(
                    "tier {} holds {} > {}",
                    tier.stats.name, tier.stats.size, tier.stats.max_size
                ));
            }
        }
        if stats.hits + stats.misses != self.lookups {
            return Err(format!(
                "hits {} + misses {} != lookups {}",
                stats.hits, stats.misses, self.lookups
            ));
        }
        if !(0.0..=1.0).contains(&stats.hit_rate) {
            return Err(format!("hit rate {} out of range", stats.hit_rate));
        }
        Ok(())
    }

    fn describe_state(&self) -> String {
        let stats = self.cache.stats();
        format!(
            "hits={} misses={} promotions={} sizes={:?}",
            stats.hits,
            stats.misses,
            stats.promotions,
            stats
                .tiers
                .iter()
                .map(|t| (t.stats.name.clone(), t.stats.size))
                .collect::<Vec<_>>()
        )
    }
}

#[test]
fn test_cache_manager_invariants() {
    for seed in test_seeds(6) {
        let clock = SimClock::new();
        let mut model = CacheModel::new(&clock);
        PropertyTest::new(seed)
            .with_max_operations(800)
            .with_time_advance(TimeAdvanceConfig::random(1, 250, 0.3))
            .run_with_clock(&mut model, &clock)
            .unwrap();
    }
}

#[test]
fn test_cache_manager_invariants_env_seed() {
    let seed = SimConfig::from_env_or_random().seed();
    let clock = SimClock::new();
    let mut model = CacheModel::new(&clock);
    PropertyTest::new(seed)
        .with_max_operations(2_000)
        .with_time_advance(TimeAdvanceConfig::random(1, 500, 0.5))
        .run_with_clock(&mut model, &clock)
        .unwrap();
}
