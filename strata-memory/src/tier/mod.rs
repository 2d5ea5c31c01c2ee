//! Tier - One Bounded Store
//!
//! `TigerStyle`: Bounded capacity, explicit expiry, injected clock.
//!
//! A tier owns its entries behind a single mutex. Reads and writes are
//! synchronous and never hold the lock while emitting events.
//!
//! ```rust
//! use std::time::Duration;
//! use strata_memory::tier::{EvictionStrategy, Tier, TierConfig};
//!
//! let tier: Tier<String> = Tier::new(
//!     TierConfig::new("hot").with_max_size(2).with_strategy(EvictionStrategy::Lru),
//! )
//! .unwrap();
//!
//! tier.set("a", "1".to_string(), None).unwrap();
//! tier.set("b", "2".to_string(), Some(Duration::from_secs(5))).unwrap();
//! tier.get("a").unwrap();
//! tier.set("c", "3".to_string(), None).unwrap(); // evicts "b"
//!
//! assert!(!tier.contains("b"));
//! ```

mod config;
mod stats;
mod strategy;

pub use config::TierConfig;
pub use stats::{hit_rate, TierStats};
pub use strategy::EvictionStrategy;

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use serde::Serialize;
use strata_core::{SharedClock, SystemClock};
use tracing::debug;

use crate::entry::{validate_key, Entry, EntryMeta};
use crate::error::CacheResult;
use crate::events::{CacheEvent, CacheEventKind, EventBus};
use stats::TierCounters;
use strategy::EvictionIndex;

// =============================================================================
// Tier
// =============================================================================

/// A bounded key/value store with TTLs and an eviction strategy.
#[derive(Debug)]
pub struct Tier<T> {
    config: TierConfig,
    clock: SharedClock,
    events: EventBus,
    state: Mutex<TierState<T>>,
}

#[derive(Debug)]
struct TierState<T> {
    entries: HashMap<String, Entry<T>>,
    index: EvictionIndex,
    seq: u64,
    counters: TierCounters,
    memory_bytes: usize,
}

enum Lookup {
    Absent,
    Expired,
    Live,
}

impl<T> TierState<T> {
    fn new() -> Self {
        Self {
            entries: HashMap::new(),
            index: EvictionIndex::default(),
            seq: 0,
            counters: TierCounters::default(),
            memory_bytes: 0,
        }
    }

    fn next_seq(&mut self) -> u64 {
        self.seq += 1;
        self.seq
    }

    fn lookup(&self, key: &str, now_ms: u64) -> Lookup {
        match self.entries.get(key) {
            None => Lookup::Absent,
            Some(entry) if entry.is_expired(now_ms) => Lookup::Expired,
            Some(_) => Lookup::Live,
        }
    }

    fn remove_entry(&mut self, key: &str, strategy: EvictionStrategy) -> Option<Entry<T>> {
        let entry = self.entries.remove(key)?;
        self.index.remove(strategy.rank(&entry), key);
        self.memory_bytes = self.memory_bytes.saturating_sub(entry.size_bytes);
        Some(entry)
    }
}

impl<T> Tier<T>
where
    T: Clone + Serialize,
{
    /// Create a tier on the system clock with its own event bus.
    ///
    /// # Errors
    /// Returns [`crate::CacheError::InvalidConfig`] if the config is invalid.
    pub fn new(config: TierConfig) -> CacheResult<Self> {
        config.validate()?;
        Ok(Self {
            config,
            clock: SystemClock::shared(),
            events: EventBus::default(),
            state: Mutex::new(TierState::new()),
        })
    }

    /// Use `clock` for timestamps and expiry.
    #[must_use]
    pub fn with_clock(mut self, clock: SharedClock) -> Self {
        self.clock = clock;
        self
    }

    /// Publish events on `events`.
    #[must_use]
    pub fn with_event_bus(mut self, events: EventBus) -> Self {
        self.events = events;
        self
    }

    fn lock(&self) -> MutexGuard<'_, TierState<T>> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn emit(&self, key: Option<&str>, kind: CacheEventKind) {
        self.events
            .emit(CacheEvent::tier(&self.config.name, key, kind));
    }

    // =========================================================================
    // Reads
    // =========================================================================

    /// Get a live value, counting a hit or a miss.
    ///
    /// An expired entry is removed, counted as one expiration and reported
    /// as a miss.
    ///
    /// # Errors
    /// Returns [`crate::CacheError::InvalidKey`] for an invalid key.
    pub fn get(&self, key: &str) -> CacheResult<Option<T>> {
        validate_key(key)?;
        let now_ms = self.clock.now_ms();
        let strategy = self.config.strategy;

        let mut state = self.lock();
        match state.lookup(key, now_ms) {
            Lookup::Absent => {
                state.counters.misses += 1;
                drop(state);
                self.emit(Some(key), CacheEventKind::Miss);
                Ok(None)
            }
            Lookup::Expired => {
                state.remove_entry(key, strategy);
                state.counters.expirations += 1;
                state.counters.misses += 1;
                drop(state);
                self.emit(Some(key), CacheEventKind::Expire);
                self.emit(Some(key), CacheEventKind::Miss);
                Ok(None)
            }
            Lookup::Live => {
                let seq = state.next_seq();
                let TierState {
                    entries,
                    index,
                    counters,
                    ..
                } = &mut *state;
                let value = entries.get_mut(key).map(|entry| {
                    let old = strategy.rank(entry);
                    entry.touch(now_ms, seq);
                    index.update(old, strategy.rank(entry), key);
                    entry.value.clone()
                });
                counters.hits += 1;
                drop(state);
                self.emit(Some(key), CacheEventKind::Hit);
                Ok(value)
            }
        }
    }

    /// Get a live value without touching statistics or recency.
    #[must_use]
    pub fn peek(&self, key: &str) -> Option<T> {
        let now_ms = self.clock.now_ms();
        let state = self.lock();
        state
            .entries
            .get(key)
            .filter(|entry| !entry.is_expired(now_ms))
            .map(|entry| entry.value.clone())
    }

    /// Whether a live entry exists for `key`.
    #[must_use]
    pub fn contains(&self, key: &str) -> bool {
        let now_ms = self.clock.now_ms();
        matches!(self.lock().lookup(key, now_ms), Lookup::Live)
    }

    /// Metadata for a live entry.
    #[must_use]
    pub fn entry_meta(&self, key: &str) -> Option<EntryMeta> {
        let now_ms = self.clock.now_ms();
        let state = self.lock();
        state
            .entries
            .get(key)
            .filter(|entry| !entry.is_expired(now_ms))
            .map(Entry::meta)
    }

    /// Keys of live entries, in no particular order.
    #[must_use]
    pub fn keys(&self) -> Vec<String> {
        let now_ms = self.clock.now_ms();
        let state = self.lock();
        state
            .entries
            .iter()
            .filter(|(_, entry)| !entry.is_expired(now_ms))
            .map(|(key, _)| key.clone())
            .collect()
    }

    // =========================================================================
    // Writes
    // =========================================================================

    /// Insert or replace a value.
    ///
    /// `ttl` of `None` (or zero) uses the tier's default TTL. Replacing an
    /// existing key never evicts. Inserting a new key into a full tier
    /// evicts exactly one entry first.
    ///
    /// # Errors
    /// Returns [`crate::CacheError::InvalidKey`] for an invalid key.
    pub fn set(&self, key: &str, value: T, ttl: Option<Duration>) -> CacheResult<()> {
        validate_key(key)?;
        let now_ms = self.clock.now_ms();
        let strategy = self.config.strategy;
        let ttl_ms = ttl
            .filter(|ttl| !ttl.is_zero())
            .map(|ttl| u64::try_from(ttl.as_millis()).unwrap_or(u64::MAX))
            .or(self.config.default_ttl_ms);

        let mut evicted = None;
        {
            let mut state = self.lock();
            let seq = state.next_seq();

            if state.entries.contains_key(key) {
                let TierState {
                    entries,
                    index,
                    memory_bytes,
                    ..
                } = &mut *state;
                if let Some(entry) = entries.get_mut(key) {
                    let old_rank = strategy.rank(entry);
                    let old_size = entry.size_bytes;
                    entry.replace(value, now_ms, ttl_ms, seq);
                    index.update(old_rank, strategy.rank(entry), key);
                    *memory_bytes = memory_bytes.saturating_sub(old_size) + entry.size_bytes;
                }
            } else {
                if state.entries.len() >= self.config.max_size {
                    if let Some(victim) = state.index.victim().map(str::to_string) {
                        state.remove_entry(&victim, strategy);
                        state.counters.evictions += 1;
                        evicted = Some(victim);
                    }
                }
                let entry = Entry::new(value, now_ms, ttl_ms, seq);
                state.index.insert(strategy.rank(&entry), key);
                state.memory_bytes += entry.size_bytes;
                state.entries.insert(key.to_string(), entry);
            }

            state.counters.sets += 1;
            debug_assert!(state.entries.len() <= self.config.max_size);
            debug_assert_eq!(state.entries.len(), state.index.len());
        }

        if let Some(victim) = evicted {
            debug!(
                tier = %self.config.name,
                key = %victim,
                strategy = %strategy,
                "evicted entry"
            );
            self.emit(Some(&victim), CacheEventKind::Evict);
        }
        self.emit(Some(key), CacheEventKind::Set);
        Ok(())
    }

    /// Remove `key`. Returns `true` if a live entry was removed.
    ///
    /// # Errors
    /// Returns [`crate::CacheError::InvalidKey`] for an invalid key.
    pub fn delete(&self, key: &str) -> CacheResult<bool> {
        validate_key(key)?;
        let now_ms = self.clock.now_ms();

        let mut state = self.lock();
        let Some(entry) = state.remove_entry(key, self.config.strategy) else {
            return Ok(false);
        };
        if entry.is_expired(now_ms) {
            state.counters.expirations += 1;
            drop(state);
            self.emit(Some(key), CacheEventKind::Expire);
            return Ok(false);
        }
        state.counters.deletes += 1;
        drop(state);
        self.emit(Some(key), CacheEventKind::Delete);
        Ok(true)
    }

    /// Remove every entry and reset statistics.
    pub fn clear(&self) {
        {
            let mut state = self.lock();
            let seq = state.seq;
            *state = TierState::new();
            // Keep the logical clock monotonic across clears.
            state.seq = seq;
        }
        self.emit(None, CacheEventKind::Clear);
    }

    /// Remove all expired entries. Returns how many were removed.
    pub fn sweep_expired(&self) -> usize {
        let now_ms = self.clock.now_ms();
        let strategy = self.config.strategy;

        let expired: Vec<String> = {
            let mut state = self.lock();
            let keys: Vec<String> = state
                .entries
                .iter()
                .filter(|(_, entry)| entry.is_expired(now_ms))
                .map(|(key, _)| key.clone())
                .collect();
            for key in &keys {
                state.remove_entry(key, strategy);
            }
            state.counters.expirations += keys.len() as u64;
            keys
        };

        for key in &expired {
            self.emit(Some(key), CacheEventKind::Expire);
        }
        if !expired.is_empty() {
            debug!(tier = %self.config.name, count = expired.len(), "swept expired entries");
        }
        expired.len()
    }

    // =========================================================================
    // Introspection
    // =========================================================================

    /// Stored entries, including expired ones not yet swept.
    #[must_use]
    pub fn len(&self) -> usize {
        self.lock().entries.len()
    }

    /// Whether the tier stores nothing.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lock().entries.is_empty()
    }

    /// Statistics snapshot.
    #[must_use]
    pub fn stats(&self) -> TierStats {
        let state = self.lock();
        TierStats::from_counters(
            &self.config.name,
            state.counters,
            state.entries.len(),
            self.config.max_size,
            state.memory_bytes,
        )
    }

    /// Tier name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.config.name
    }

    /// Default TTL applied to writes without one.
    #[must_use]
    pub fn default_ttl(&self) -> Option<Duration> {
        self.config.default_ttl()
    }

    /// Eviction strategy.
    #[must_use]
    pub fn strategy(&self) -> EvictionStrategy {
        self.config.strategy
    }

    /// Capacity in entries.
    #[must_use]
    pub fn max_size(&self) -> usize {
        self.config.max_size
    }

    /// Full configuration.
    #[must_use]
    pub fn config(&self) -> &TierConfig {
        &self.config
    }
}

// =============================================================================
// Tests
// =============================================================================


// =============================================================================
// DST Tests
// =============================================================================
