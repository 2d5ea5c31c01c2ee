//! HierarchicalMemory - Working, Short-Term and Long-Term Memory
//!
//! `TigerStyle`: Importance decides placement, recall promotes toward
//! working memory.
//!
//! | Importance | Working | Short-term       | Long-term |
//! |------------|---------|------------------|-----------|
//! | critical   | yes     | yes (1 day)      | yes       |
//! | high       |         | yes (1 hour)     | yes       |
//! | normal     | yes     | yes (30 minutes) |           |
//! | low        | yes (5 minutes) |          |           |
//!
//! Long-term memory is a [`DurableStore`] holding JSON-encoded
//! [`MemoryItem`]s. Its failures never reach callers: they are logged,
//! counted, and treated as a miss. Normal and low importance writes never
//! call the durable store, unless they replace a key that may have a
//! durable copy.

mod config;

pub use config::HierarchyConfig;

use std::collections::HashSet;
use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use serde::de::DeserializeOwned;
use serde::Serialize;
use strata_core::{SharedClock, SystemClock};
use tracing::{debug, info, warn};

use crate::entry::validate_key;
use crate::error::{CacheError, CacheResult};
use crate::item::{Importance, MemoryItem, MemoryTier};
use crate::storage::{DurableStore, StorageError, StorageResult};
use crate::tier::{EvictionStrategy, Tier, TierConfig, TierStats};

#[derive(Debug, Default)]
struct HierarchyCounters {
    promotions: AtomicU64,
    durable_reads: AtomicU64,
    durable_writes: AtomicU64,
    durable_deletes: AtomicU64,
    durable_failures: AtomicU64,
}

/// Snapshot of a [`HierarchicalMemory`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HierarchyStats {
    /// Working memory tier
    pub working: TierStats,
    /// Short-term memory tier
    pub short_term: TierStats,
    /// Copies made toward working memory on recall
    pub promotions: u64,
    /// Durable reads attempted
    pub durable_reads: u64,
    /// Durable writes attempted
    pub durable_writes: u64,
    /// Durable deletes attempted
    pub durable_deletes: u64,
    /// Durable calls that failed, timed out or returned undecodable data
    pub durable_failures: u64,
}

// =============================================================================
// HierarchicalMemory
// =============================================================================

/// Three-level memory routed by importance.
#[derive(Debug)]
pub struct HierarchicalMemory<T> {
    config: HierarchyConfig,
    working: Tier<MemoryItem<T>>,
    short_term: Tier<MemoryItem<T>>,
    long_term: Arc<dyn DurableStore>,
    /// Keys this instance attempted to write durably.
    durable_keys: Mutex<HashSet<String>>,
    clock: SharedClock,
    counters: HierarchyCounters,
}

impl<T> HierarchicalMemory<T>
where
    T: Clone + Serialize + DeserializeOwned + Send + Sync + 'static,
{
    /// Create on the system clock.
    ///
    /// # Errors
    /// Returns [`CacheError::InvalidConfig`] for an invalid configuration.
    pub fn new(config: HierarchyConfig, long_term: Arc<dyn DurableStore>) -> CacheResult<Self> {
        Self::with_clock(config, long_term, SystemClock::shared())
    }

    /// Create with an explicit clock.
    ///
    /// # Errors
    /// Returns [`CacheError::InvalidConfig`] for an invalid configuration.
    pub fn with_clock(
        config: HierarchyConfig,
        long_term: Arc<dyn DurableStore>,
        clock: SharedClock,
    ) -> CacheResult<Self> {
        config.validate()?;

        let working = Tier::new(
            TierConfig::new(MemoryTier::Working.to_string())
                .with_max_size(config.working_max_entries)
                .with_default_ttl(Duration::from_millis(config.working_ttl_ms))
                .with_strategy(EvictionStrategy::Lru),
        )?
        .with_clock(Arc::clone(&clock));
        let short_term = Tier::new(
            TierConfig::new(MemoryTier::ShortTerm.to_string())
                .with_max_size(config.short_term_max_entries)
                .with_default_ttl(Duration::from_millis(config.short_term_ttl_ms))
                .with_strategy(EvictionStrategy::Lru),
        )?
        .with_clock(Arc::clone(&clock));

        info!(
            working_max_entries = config.working_max_entries,
            short_term_max_entries = config.short_term_max_entries,
            "hierarchical memory created"
        );
        Ok(Self {
            config,
            working,
            short_term,
            long_term,
            durable_keys: Mutex::new(HashSet::new()),
            clock,
            counters: HierarchyCounters::default(),
        })
    }

    // =========================================================================
    // Remember
    // =========================================================================

    /// Store `value` in the tiers its importance maps to.
    ///
    /// Tiers the importance does not map to lose any older copy of `key`.
    /// A durable failure is logged and does not fail the call.
    ///
    /// # Errors
    /// Returns [`CacheError::InvalidKey`] for an invalid key.
    pub async fn remember(&self, key: &str, value: T, importance: Importance) -> CacheResult<()> {
        validate_key(key)?;
        let item = MemoryItem::new(value, importance, self.clock.now_ms());
        self.remember_item(key, item).await
    }

    /// Store a prepared item (for example with a custom relevance).
    ///
    /// # Errors
    /// Returns [`CacheError::InvalidKey`] for an invalid key.
    #[tracing::instrument(skip(self, item), fields(importance = %item.importance))]
    pub async fn remember_item(&self, key: &str, item: MemoryItem<T>) -> CacheResult<()> {
        validate_key(key)?;
        let placement = self.config.placement(item.importance);

        if placement.long_term {
            match serde_json::to_vec(&item) {
                Ok(bytes) => {
                    // A timed-out write may still land.
                    self.track_durable(key);
                    let durable_key = self.durable_key(key);
                    let ttl = self.config.durable_ttl_ms.map(Duration::from_millis);
                    self.counters.durable_writes.fetch_add(1, Ordering::Relaxed);
                    let write = self.long_term.set(&durable_key, bytes, ttl);
                    if let Err(err) = self.durable_call(write).await {
                        self.durable_failed("write", key, &err);
                    }
                }
                Err(err) => {
                    warn!(key, error = %err, "value not serializable, skipped long-term memory");
                }
            }
        } else if self.may_be_durable(key) {
            self.durable_delete(key).await;
        }

        match placement.short_term {
            Some(ttl) => self.short_term.set(key, item.clone(), Some(ttl))?,
            None => {
                self.short_term.delete(key)?;
            }
        }
        match placement.working {
            Some(ttl) => self.working.set(key, item, Some(ttl))?,
            None => {
                self.working.delete(key)?;
            }
        }

        debug!(key, "remembered");
        Ok(())
    }

    // =========================================================================
    // Recall
    // =========================================================================

    /// Find a value, searching working, short-term, then long-term memory.
    ///
    /// # Errors
    /// Returns [`CacheError::InvalidKey`] for an invalid key.
    pub async fn recall(&self, key: &str) -> CacheResult<Option<T>> {
        Ok(self.recall_item(key).await?.map(|item| item.value))
    }

    /// [`HierarchicalMemory::recall`] returning the full item.
    ///
    /// A hit below working memory is copied into every shallower tier.
    /// `access_count` reflects reads of the tier the item was found in.
    ///
    /// # Errors
    /// Returns [`CacheError::InvalidKey`] for an invalid key.
    #[tracing::instrument(skip(self), level = "debug")]
    pub async fn recall_item(&self, key: &str) -> CacheResult<Option<MemoryItem<T>>> {
        validate_key(key)?;

        if let Some(item) = self.working.get(key)? {
            return Ok(Some(with_access_count(&self.working, key, item)));
        }

        if let Some(item) = self.short_term.get(key)? {
            let item = with_access_count(&self.short_term, key, item);
            self.working.set(key, item.clone(), None)?;
            self.counters.promotions.fetch_add(1, Ordering::Relaxed);
            debug!(key, from = %MemoryTier::ShortTerm, "promoted to working memory");
            return Ok(Some(item));
        }

        let Some(item) = self.durable_get(key).await else {
            return Ok(None);
        };
        self.short_term.set(key, item.clone(), None)?;
        self.working.set(key, item.clone(), None)?;
        self.counters.promotions.fetch_add(2, Ordering::Relaxed);
        debug!(key, from = %MemoryTier::LongTerm, "promoted to working memory");
        Ok(Some(item))
    }

    // =========================================================================
    // Forget
    // =========================================================================

    /// Remove `key` from all three tiers. Returns `true` if any tier held it.
    ///
    /// # Errors
    /// Returns [`CacheError::InvalidKey`] for an invalid key.
    #[tracing::instrument(skip(self), level = "debug")]
    pub async fn forget(&self, key: &str) -> CacheResult<bool> {
        validate_key(key)?;
        let in_working = self.working.delete(key)?;
        let in_short_term = self.short_term.delete(key)?;
        let in_long_term = self.durable_delete(key).await;
        Ok(in_working || in_short_term || in_long_term)
    }

    // =========================================================================
    // Maintenance and inspection
    // =========================================================================

    /// Flush working or short-term memory. Long-term memory cannot be
    /// flushed here; returns `false` for it.
    pub fn clear_tier(&self, tier: MemoryTier) -> bool {
        match tier {
            MemoryTier::Working => self.working.clear(),
            MemoryTier::ShortTerm => self.short_term.clear(),
            MemoryTier::LongTerm => {
                debug!("long-term memory is not flushed through the hierarchy");
                return false;
            }
        }
        info!(tier = %tier, "memory tier cleared");
        true
    }

    /// Remove expired entries from working and short-term memory.
    pub fn sweep_expired(&self) -> usize {
        self.working.sweep_expired() + self.short_term.sweep_expired()
    }

    /// Tiers currently holding `key`, without touching statistics.
    ///
    /// A long-term read failure leaves `LongTerm` out.
    ///
    /// # Errors
    /// Returns [`CacheError::InvalidKey`] for an invalid key.
    pub async fn tiers_holding(&self, key: &str) -> CacheResult<Vec<MemoryTier>> {
        validate_key(key)?;
        let mut tiers = Vec::with_capacity(3);
        if self.working.contains(key) {
            tiers.push(MemoryTier::Working);
        }
        if self.short_term.contains(key) {
            tiers.push(MemoryTier::ShortTerm);
        }
        let durable_key = self.durable_key(key);
        let read = self.long_term.get(&durable_key);
        match self.durable_call(read).await {
            Ok(Some(_)) => tiers.push(MemoryTier::LongTerm),
            Ok(None) => {}
            Err(err) => debug!(key, error = %err, "long-term presence unknown"),
        }
        Ok(tiers)
    }

    /// Statistics snapshot.
    #[must_use]
    pub fn stats(&self) -> HierarchyStats {
        HierarchyStats {
            working: self.working.stats(),
            short_term: self.short_term.stats(),
            promotions: self.counters.promotions.load(Ordering::Relaxed),
            durable_reads: self.counters.durable_reads.load(Ordering::Relaxed),
            durable_writes: self.counters.durable_writes.load(Ordering::Relaxed),
            durable_deletes: self.counters.durable_deletes.load(Ordering::Relaxed),
            durable_failures: self.counters.durable_failures.load(Ordering::Relaxed),
        }
    }

    /// Working memory tier.
    #[must_use]
    pub fn working(&self) -> &Tier<MemoryItem<T>> {
        &self.working
    }

    /// Short-term memory tier.
    #[must_use]
    pub fn short_term(&self) -> &Tier<MemoryItem<T>> {
        &self.short_term
    }

    /// Configuration.
    #[must_use]
    pub fn config(&self) -> &HierarchyConfig {
        &self.config
    }

    // =========================================================================
    // Durable helpers
    // =========================================================================

    fn durable_key(&self, key: &str) -> String {
        format!("{}{key}", self.config.durable_key_prefix)
    }

    /// Bound a durable call by the configured timeout.
    async fn durable_call<R>(&self, call: impl Future<Output = StorageResult<R>>) -> CacheResult<R> {
        let timeout = self.config.durable_timeout();
        match tokio::time::timeout(timeout, call).await {
            Ok(result) => result.map_err(CacheError::from),
            Err(_) => Err(StorageError::timeout(self.config.durable_timeout_ms).into()),
        }
    }

    async fn durable_get(&self, key: &str) -> Option<MemoryItem<T>> {
        self.counters.durable_reads.fetch_add(1, Ordering::Relaxed);
        let durable_key = self.durable_key(key);
        let read = self.long_term.get(&durable_key);
        let bytes = match self.durable_call(read).await {
            Ok(bytes) => bytes?,
            Err(err) => {
                self.durable_failed("read", key, &err);
                return None;
            }
        };
        match serde_json::from_slice(&bytes) {
            Ok(item) => {
                self.track_durable(key);
                Some(item)
            }
            Err(err) => {
                self.durable_failed("decode", key, &CacheError::from(err));
                None
            }
        }
    }

    async fn durable_delete(&self, key: &str) -> bool {
        self.counters.durable_deletes.fetch_add(1, Ordering::Relaxed);
        let durable_key = self.durable_key(key);
        let delete = self.long_term.delete(&durable_key);
        match self.durable_call(delete).await {
            Ok(existed) => {
                self.untrack_durable(key);
                existed
            }
            Err(err) => {
                self.durable_failed("delete", key, &err);
                false
            }
        }
    }

    fn lock_durable_keys(&self) -> MutexGuard<'_, HashSet<String>> {
        self.durable_keys.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn track_durable(&self, key: &str) {
        self.lock_durable_keys().insert(key.to_string());
    }

    fn untrack_durable(&self, key: &str) {
        self.lock_durable_keys().remove(key);
    }

    /// Whether `key` may have a long-term copy: written durably by this
    /// instance, or held in a fast tier under a durable importance (for
    /// example after recall from a store written by an earlier process).
    fn may_be_durable(&self, key: &str) -> bool {
        if self.lock_durable_keys().contains(key) {
            return true;
        }
        let durable = |item: MemoryItem<T>| self.config.placement(item.importance).long_term;
        self.working.peek(key).is_some_and(durable)
            || self.short_term.peek(key).is_some_and(durable)
    }

    fn durable_failed(&self, operation: &str, key: &str, err: &CacheError) {
        self.counters
            .durable_failures
            .fetch_add(1, Ordering::Relaxed);
        warn!(key, operation, error = %err, "long-term memory call failed");
    }
}

fn with_access_count<T>(tier: &Tier<MemoryItem<T>>, key: &str, mut item: MemoryItem<T>) -> MemoryItem<T>
where
    T: Clone + Serialize,
{
    if let Some(meta) = tier.entry_meta(key) {
        item.access_count = meta.access_count;
    }
    item
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::SimDurableStore;
    use strata_core::dst::{
        DeterministicRng, FaultConfig, FaultInjectorBuilder, FaultType, SimClock,
    };

    struct Fixture {
        memory: HierarchicalMemory<String>,
        store: SimDurableStore,
        clock: SimClock,
    }

    fn fixture_with(config: HierarchyConfig, store: SimDurableStore) -> Fixture {
        let clock = SimClock::new();
        let store = store.with_clock(clock.shared());
        let memory =
            HierarchicalMemory::with_clock(config, Arc::new(store.clone()), clock.shared())
                .unwrap();
        Fixture {
            memory,
            store,
            clock,
        }
    }

    fn fixture() -> Fixture {
        fixture_with(HierarchyConfig::default(), SimDurableStore::new())
    }

    fn faulty(fault: FaultType) -> SimDurableStore {
        let faults = FaultInjectorBuilder::new(DeterministicRng::new(7))
            .with_fault(FaultConfig::new(fault, 1.0))
            .build();
        SimDurableStore::new().with_fault_injector(Arc::new(faults))
    }

    fn s(v: &str) -> String {
        v.to_string()
    }

    #[tokio::test]
    async fn test_routing_by_importance() {
        let f = fixture();
        f.memory.remember("c", s("1"), Importance::Critical).await.unwrap();
        f.memory.remember("h", s("2"), Importance::High).await.unwrap();
        f.memory.remember("n", s("3"), Importance::Normal).await.unwrap();
        f.memory.remember("l", s("4"), Importance::Low).await.unwrap();

        use MemoryTier::{LongTerm, ShortTerm, Working};
        assert_eq!(
            f.memory.tiers_holding("c").await.unwrap(),
            vec![Working, ShortTerm, LongTerm]
        );
        assert_eq!(f.memory.tiers_holding("h").await.unwrap(), vec![ShortTerm, LongTerm]);
        assert_eq!(f.memory.tiers_holding("n").await.unwrap(), vec![Working, ShortTerm]);
        assert_eq!(f.memory.tiers_holding("l").await.unwrap(), vec![Working]);
    }

    #[tokio::test]
    async fn test_importance_ttls() {
        let f = fixture();
        f.memory.remember("c", s("1"), Importance::Critical).await.unwrap();
        f.memory.remember("h", s("2"), Importance::High).await.unwrap();
        f.memory.remember("l", s("3"), Importance::Low).await.unwrap();

        let short = |key: &str| f.memory.short_term().entry_meta(key).unwrap().expires_at_ms;
        assert_eq!(short("c"), Some(86_400_000));
        assert_eq!(short("h"), Some(3_600_000));
        let working = f.memory.working().entry_meta("l").unwrap().expires_at_ms;
        assert_eq!(working, Some(300_000));
    }

    #[tokio::test]
    async fn test_recall_survives_tier_flush() {
        let f = fixture();
        f.memory.remember("k", s("v"), Importance::Critical).await.unwrap();

        assert!(f.memory.clear_tier(MemoryTier::Working));
        assert!(f.memory.clear_tier(MemoryTier::ShortTerm));
        assert!(!f.memory.clear_tier(MemoryTier::LongTerm));

        assert_eq!(f.memory.recall("k").await.unwrap(), Some(s("v")));
        assert!(f.memory.working().contains("k"));
        assert!(f.memory.short_term().contains("k"));
        assert_eq!(f.memory.stats().promotions, 2);
    }

    #[tokio::test]
    async fn test_recall_promotes_from_short_term() {
        let f = fixture();
        f.memory.remember("h", s("v"), Importance::High).await.unwrap();
        assert!(!f.memory.working().contains("h"));

        let item = f.memory.recall_item("h").await.unwrap().unwrap();
        assert_eq!(item.importance, Importance::High);
        assert_eq!(item.access_count, 1);
        assert!(f.memory.working().contains("h"));
        assert_eq!(f.memory.stats().durable_reads, 0);
    }

    #[tokio::test]
    async fn test_low_importance_expires() {
        let f = fixture();
        f.memory.remember("l", s("v"), Importance::Low).await.unwrap();

        f.clock.advance_mins(6);
        assert_eq!(f.memory.recall("l").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_reremember_moves_between_tiers() {
        let f = fixture();
        f.memory.remember("k", s("v1"), Importance::Critical).await.unwrap();
        f.memory.remember("k", s("v2"), Importance::Low).await.unwrap();

        assert_eq!(
            f.memory.tiers_holding("k").await.unwrap(),
            vec![MemoryTier::Working]
        );
        assert!(f.store.is_empty());
        assert_eq!(f.memory.recall("k").await.unwrap(), Some(s("v2")));
    }

    #[tokio::test]
    async fn test_low_and_normal_writes_skip_durable_store() {
        let store = faulty(FaultType::DurableLatency).with_latency(Duration::from_millis(300));
        let f = fixture_with(HierarchyConfig::default(), store);

        let started = std::time::Instant::now();
        for key in ["a", "b", "c"] {
            f.memory.remember(key, s("v"), Importance::Low).await.unwrap();
            f.memory.remember(key, s("w"), Importance::Normal).await.unwrap();
        }

        assert!(started.elapsed() < Duration::from_millis(250));
        let store_stats = f.store.stats();
        assert_eq!(store_stats.reads + store_stats.writes + store_stats.deletes, 0);
        assert_eq!(f.memory.stats().durable_deletes, 0);
    }

    #[tokio::test]
    async fn test_downgrade_deletes_durable_copy_once() {
        let f = fixture();
        f.memory.remember("k", s("v1"), Importance::High).await.unwrap();
        f.memory.remember("k", s("v2"), Importance::Normal).await.unwrap();
        assert!(f.store.is_empty());
        assert_eq!(f.memory.stats().durable_deletes, 1);

        f.memory.remember("k", s("v3"), Importance::Low).await.unwrap();
        assert_eq!(f.memory.stats().durable_deletes, 1);
    }

    #[tokio::test]
    async fn test_downgrade_of_recalled_record_from_earlier_instance() {
        let f = fixture();
        f.memory.remember("k", s("v1"), Importance::Critical).await.unwrap();

        let restarted: HierarchicalMemory<String> = HierarchicalMemory::with_clock(
            HierarchyConfig::default(),
            Arc::new(f.store.clone()),
            f.clock.shared(),
        )
        .unwrap();
        assert_eq!(restarted.recall("k").await.unwrap(), Some(s("v1")));

        restarted.remember("k", s("v2"), Importance::Low).await.unwrap();
        assert!(f.store.is_empty());
    }

    #[tokio::test]
    async fn test_forget_everywhere() {
        let f = fixture();
        f.memory.remember("k", s("v"), Importance::Critical).await.unwrap();

        assert!(f.memory.forget("k").await.unwrap());
        assert!(f.memory.tiers_holding("k").await.unwrap().is_empty());
        assert!(!f.memory.forget("k").await.unwrap());
    }

    #[tokio::test]
    async fn test_durable_write_failure_is_not_raised() {
        let f = fixture_with(HierarchyConfig::default(), faulty(FaultType::DurableWriteFail));

        f.memory.remember("k", s("v"), Importance::Critical).await.unwrap();

        assert!(f.memory.working().contains("k"));
        assert!(!f.store.contains_key("strata:ltm:k"));
        assert_eq!(f.memory.stats().durable_failures, 1);
    }

    #[tokio::test]
    async fn test_durable_read_failure_is_a_miss() {
        let f = fixture_with(HierarchyConfig::default(), faulty(FaultType::DurableReadFail));
        f.memory.remember("k", s("v"), Importance::High).await.unwrap();
        f.memory.clear_tier(MemoryTier::ShortTerm);

        assert_eq!(f.memory.recall("k").await.unwrap(), None);
        assert_eq!(f.memory.stats().durable_failures, 1);
    }

    #[tokio::test]
    async fn test_corrupt_record_is_a_miss() {
        let f = fixture_with(HierarchyConfig::default(), faulty(FaultType::DurableCorruption));
        f.memory.remember("k", s("v"), Importance::High).await.unwrap();
        f.memory.clear_tier(MemoryTier::ShortTerm);

        assert_eq!(f.memory.recall("k").await.unwrap(), None);
        assert_eq!(f.memory.stats().durable_failures, 1);
    }

    #[tokio::test]
    async fn test_durable_timeout() {
        let config = HierarchyConfig::default().with_durable_timeout(Duration::from_millis(20));
        let store = faulty(FaultType::DurableLatency).with_latency(Duration::from_secs(5));
        let f = fixture_with(config, store);

        let started = std::time::Instant::now();
        f.memory.remember("k", s("v"), Importance::Critical).await.unwrap();

        assert!(started.elapsed() < Duration::from_secs(2));
        assert!(f.memory.working().contains("k"));
        assert_eq!(f.memory.stats().durable_failures, 1);
    }

    #[tokio::test]
    async fn test_durable_key_prefix_and_json() {
        let f = fixture_with(
            HierarchyConfig::default().with_durable_key_prefix("agent:"),
            SimDurableStore::new(),
        );
        f.memory.remember("k", s("v"), Importance::High).await.unwrap();

        let bytes = f.store.get("agent:k").await.unwrap().unwrap();
        let item: MemoryItem<String> = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(item.value, "v");
        assert_eq!(item.importance, Importance::High);
    }

    #[tokio::test]
    async fn test_durable_record_carries_writer_clock_timestamp() {
        let f = fixture();
        f.clock.advance_mins(42);
        f.memory.remember("k", s("v"), Importance::High).await.unwrap();

        let bytes = f.store.get("strata:ltm:k").await.unwrap().unwrap();
        let item: MemoryItem<String> = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(item.timestamp_ms, 42 * 60_000);
        assert_eq!(item.age_ms(f.clock.now_ms()), 0);
    }

    #[tokio::test]
    async fn test_working_memory_is_lru() {
        let f = fixture_with(
            HierarchyConfig::default().with_working_max_entries(2),
            SimDurableStore::new(),
        );
        f.memory.remember("a", s("1"), Importance::Low).await.unwrap();
        f.memory.remember("b", s("2"), Importance::Low).await.unwrap();
        f.memory.recall("a").await.unwrap();
        f.memory.remember("c", s("3"), Importance::Low).await.unwrap();

        assert!(f.memory.working().contains("a"));
        assert!(!f.memory.working().contains("b"));
    }

    #[tokio::test]
    async fn test_invalid_key() {
        let f = fixture();
        assert!(matches!(
            f.memory.remember("", s("v"), Importance::Low).await,
            Err(CacheError::InvalidKey { .. })
        ));
        assert!(f.memory.recall("").await.is_err());
        assert!(f.memory.forget("").await.is_err());
    }
}
