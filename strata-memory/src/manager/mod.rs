//! CacheManager - Ordered Multi-Tier Cache
//!
//! `TigerStyle`: Explicit tier order, explicit TTL rules, bounded tiers.
//!
//! # Architecture
//!
//! ```text
//!            get                         set
//!             │                           │
//!   ┌─────────▼─────────┐       ┌─────────▼─────────┐
//!   │ L1 (fast, small)  │◄──┐   │ L1  ttl=min(r,d1) │
//!   └─────────┬─────────┘   │   ├───────────────────┤
//!   ┌─────────▼─────────┐   │   │ L2  ttl=min(r,d2) │
//!   │ L2                │───┤   ├───────────────────┤
//!   └─────────┬─────────┘   │   │ L3  ttl=min(r,d3) │
//!   ┌─────────▼─────────┐   │   └───────────────────┘
//!   │ L3 (slow, large)  │───┘ promote on hit
//!   └───────────────────┘
//! ```
//!
//! Lookups walk enabled tiers in priority order and copy a hit into every
//! higher-priority tier missing the key. Writes fan out to every enabled
//! tier. A tier list snapshot is taken per operation so no two tier locks
//! are ever held at once.

mod config;
mod prefetch;
mod stats;

pub use config::CacheConfig;
pub use prefetch::PrefetchOutcome;
pub use stats::{CacheStats, ManagedTierStats};

use std::collections::HashMap;
use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, PoisonError, RwLock, Weak};
use std::time::{Duration, Instant};

use futures::future::join_all;
use serde::Serialize;
use strata_core::{SharedClock, SystemClock};
use tokio::sync::broadcast;
use tracing::{debug, info, warn};

use crate::entry::validate_key;
use crate::error::{CacheError, CacheResult};
use crate::events::{CacheEvent, CacheEventKind, EventBus};
use crate::task::BackgroundTask;
use crate::tier::{Tier, TierConfig};
use prefetch::InFlight;
use stats::GlobalCounters;

/// The smaller of a requested TTL and a tier default; either side may be
/// absent. A zero request counts as absent.
#[must_use]
pub fn effective_ttl(requested: Option<Duration>, tier_default: Option<Duration>) -> Option<Duration> {
    match (requested.filter(|ttl| !ttl.is_zero()), tier_default) {
        (Some(requested), Some(default)) => Some(requested.min(default)),
        (Some(requested), None) => Some(requested),
        (None, default) => default,
    }
}

// =============================================================================
// Internals
// =============================================================================

#[derive(Debug)]
struct ManagedTier<T> {
    tier: Arc<Tier<T>>,
    enabled: AtomicBool,
}

impl<T> ManagedTier<T> {
    fn is_enabled(&self) -> bool {
        self.enabled.load(Ordering::Acquire)
    }
}

#[derive(Debug)]
struct ManagerInner<T> {
    config: CacheConfig,
    clock: SharedClock,
    events: EventBus,
    tiers: RwLock<Vec<Arc<ManagedTier<T>>>>,
    counters: GlobalCounters,
    in_flight: InFlight,
}

impl<T> ManagerInner<T>
where
    T: Clone + Serialize + Send + Sync + 'static,
{
    fn build_tier(&self, config: TierConfig) -> CacheResult<Arc<ManagedTier<T>>> {
        let tier = Tier::new(config)?
            .with_clock(Arc::clone(&self.clock))
            .with_event_bus(self.events.clone());
        Ok(Arc::new(ManagedTier {
            tier: Arc::new(tier),
            enabled: AtomicBool::new(true),
        }))
    }

    fn snapshot(&self) -> Vec<Arc<ManagedTier<T>>> {
        self.tiers
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn enabled(&self) -> Vec<Arc<ManagedTier<T>>> {
        self.snapshot()
            .into_iter()
            .filter(|managed| managed.is_enabled())
            .collect()
    }

    fn find(&self, name: &str) -> Option<Arc<ManagedTier<T>>> {
        self.tiers
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .find(|managed| managed.tier.name() == name)
            .cloned()
    }

    fn sweep_all(&self) -> usize {
        self.snapshot()
            .iter()
            .map(|managed| managed.tier.sweep_expired())
            .sum()
    }
}

// =============================================================================
// CacheManager
// =============================================================================

/// Ordered set of tiers behind one async API.
///
/// ```rust
/// use std::time::Duration;
/// use strata_memory::{CacheConfig, CacheManager, TierConfig};
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() -> strata_memory::CacheResult<()> {
/// let cache: CacheManager<String> = CacheManager::new(CacheConfig::with_tiers(vec![
///     TierConfig::new("l1").with_max_size(100).with_default_ttl(Duration::from_secs(60)),
///     TierConfig::new("l2").with_max_size(1_000).with_default_ttl(Duration::from_secs(300)),
/// ]))?;
///
/// cache.set("user:1", "alice".to_string(), None).await?;
/// assert_eq!(cache.get("user:1").await?, Some("alice".to_string()));
/// cache.stop().await;
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct CacheManager<T> {
    inner: Arc<ManagerInner<T>>,
    sweeper: Option<BackgroundTask>,
}

impl<T> CacheManager<T>
where
    T: Clone + Serialize + Send + Sync + 'static,
{
    /// Create a manager on the system clock.
    ///
    /// Starts the expiry sweeper when a tokio runtime is available.
    ///
    /// # Errors
    /// Returns [`CacheError::InvalidConfig`] or [`CacheError::DuplicateTier`]
    /// for an invalid configuration.
    pub fn new(config: CacheConfig) -> CacheResult<Self> {
        Self::with_clock(config, SystemClock::shared())
    }

    /// Create a manager whose tiers read time from `clock`.
    ///
    /// # Errors
    /// Same as [`CacheManager::new`].
    pub fn with_clock(config: CacheConfig, clock: SharedClock) -> CacheResult<Self> {
        config.validate()?;

        let inner = Arc::new(ManagerInner {
            events: EventBus::new(config.event_capacity),
            clock,
            tiers: RwLock::new(Vec::with_capacity(config.tiers.len())),
            counters: GlobalCounters::default(),
            in_flight: InFlight::default(),
            config,
        });
        let tiers = inner
            .config
            .tiers
            .iter()
            .cloned()
            .map(|tier| inner.build_tier(tier))
            .collect::<CacheResult<Vec<_>>>()?;
        *inner.tiers.write().unwrap_or_else(PoisonError::into_inner) = tiers;

        let sweeper = inner.config.check_period().and_then(|period| {
            let weak: Weak<ManagerInner<T>> = Arc::downgrade(&inner);
            BackgroundTask::spawn("cache-sweep", period, move || {
                if let Some(inner) = weak.upgrade() {
                    inner.sweep_all();
                }
            })
        });

        info!(
            tiers = inner.config.tiers.len(),
            sweeper = sweeper.is_some(),
            "cache manager created"
        );
        Ok(Self { inner, sweeper })
    }

    // =========================================================================
    // Reads
    // =========================================================================

    /// Look a key up across enabled tiers.
    ///
    /// A hit in a lower tier is copied into every higher-priority enabled
    /// tier that lacks the key, with that tier's default TTL.
    ///
    /// # Errors
    /// Returns [`CacheError::InvalidKey`] for an invalid key.
    #[tracing::instrument(skip(self), level = "debug")]
    pub async fn get(&self, key: &str) -> CacheResult<Option<T>> {
        validate_key(key)?;
        let started = Instant::now();
        let tiers = self.inner.enabled();

        for (position, managed) in tiers.iter().enumerate() {
            if let Some(value) = managed.tier.get(key)? {
                self.promote(key, &value, &tiers[..position])?;
                self.record_lookup(true, started);
                return Ok(Some(value));
            }
        }

        self.record_lookup(false, started);
        self.inner
            .events
            .emit(CacheEvent::global(key, CacheEventKind::Miss));
        Ok(None)
    }

    /// Look a key up in one named tier, enabled or not. No promotion.
    ///
    /// An unknown tier is a miss.
    ///
    /// # Errors
    /// Returns [`CacheError::InvalidKey`] for an invalid key.
    #[tracing::instrument(skip(self), level = "debug")]
    pub async fn get_from(&self, key: &str, tier: &str) -> CacheResult<Option<T>> {
        validate_key(key)?;
        let started = Instant::now();
        let Some(managed) = self.inner.find(tier) else {
            debug!(error = %CacheError::tier_not_found(tier), "lookup treated as miss");
            self.record_lookup(false, started);
            return Ok(None);
        };
        let value = managed.tier.get(key)?;
        self.record_lookup(value.is_some(), started);
        Ok(value)
    }

    /// Whether any enabled tier holds a live entry. Does not touch stats.
    ///
    /// # Errors
    /// Returns [`CacheError::InvalidKey`] for an invalid key.
    pub async fn has(&self, key: &str) -> CacheResult<bool> {
        validate_key(key)?;
        Ok(self
            .inner
            .enabled()
            .iter()
            .any(|managed| managed.tier.contains(key)))
    }

    /// Look several keys up concurrently. Absent keys are left out.
    ///
    /// # Errors
    /// Returns [`CacheError::InvalidKey`] if any key is invalid; no lookups
    /// run in that case.
    pub async fn mget<K: AsRef<str>>(&self, keys: &[K]) -> CacheResult<HashMap<String, T>> {
        for key in keys {
            validate_key(key.as_ref())?;
        }

        let lookups = keys.iter().map(|key| async move {
            let key = key.as_ref();
            self.get(key).await.map(|value| (key.to_string(), value))
        });

        let mut found = HashMap::with_capacity(keys.len());
        for result in join_all(lookups).await {
            if let (key, Some(value)) = result? {
                found.insert(key, value);
            }
        }
        Ok(found)
    }

    // =========================================================================
    // Writes
    // =========================================================================

    /// Write to every enabled tier.
    ///
    /// Each tier gets `min(ttl, tier default)`; when one side is absent the
    /// other is used, and with neither the entry never expires.
    ///
    /// # Errors
    /// Returns [`CacheError::InvalidKey`] for an invalid key.
    #[tracing::instrument(skip(self, value), level = "debug")]
    pub async fn set(&self, key: &str, value: T, ttl: Option<Duration>) -> CacheResult<()> {
        validate_key(key)?;
        let tiers = self.inner.enabled();
        if tiers.is_empty() {
            debug!("no enabled tiers, write dropped");
        }

        if let Some((last, rest)) = tiers.split_last() {
            for managed in rest {
                let tier_ttl = effective_ttl(ttl, managed.tier.default_ttl());
                managed.tier.set(key, value.clone(), tier_ttl)?;
            }
            let tier_ttl = effective_ttl(ttl, last.tier.default_ttl());
            last.tier.set(key, value, tier_ttl)?;
        }

        self.inner.counters.record_set();
        Ok(())
    }

    /// Write to one named tier, enabled or not.
    ///
    /// An unknown tier makes this a no-op.
    ///
    /// # Errors
    /// Returns [`CacheError::InvalidKey`] for an invalid key.
    #[tracing::instrument(skip(self, value), level = "debug")]
    pub async fn set_in(
        &self,
        key: &str,
        value: T,
        ttl: Option<Duration>,
        tier: &str,
    ) -> CacheResult<()> {
        validate_key(key)?;
        let Some(managed) = self.inner.find(tier) else {
            debug!(error = %CacheError::tier_not_found(tier), "write ignored");
            return Ok(());
        };
        managed
            .tier
            .set(key, value, effective_ttl(ttl, managed.tier.default_ttl()))?;
        self.inner.counters.record_set();
        Ok(())
    }

    /// Write several entries concurrently.
    ///
    /// # Errors
    /// Returns [`CacheError::InvalidKey`] if any key is invalid; nothing is
    /// written in that case.
    pub async fn mset(&self, entries: Vec<(String, T)>, ttl: Option<Duration>) -> CacheResult<()> {
        for (key, _) in &entries {
            validate_key(key)?;
        }

        let writes = entries
            .into_iter()
            .map(|(key, value)| async move { self.set(&key, value, ttl).await });
        join_all(writes)
            .await
            .into_iter()
            .collect::<CacheResult<Vec<()>>>()?;
        Ok(())
    }

    /// Delete from every tier. Returns `true` if any tier held the key.
    ///
    /// Disabled tiers are included so stale copies cannot resurface when
    /// the tier is enabled again.
    ///
    /// # Errors
    /// Returns [`CacheError::InvalidKey`] for an invalid key.
    #[tracing::instrument(skip(self), level = "debug")]
    pub async fn delete(&self, key: &str) -> CacheResult<bool> {
        validate_key(key)?;
        let mut removed = false;
        for managed in self.inner.snapshot() {
            removed |= managed.tier.delete(key)?;
        }
        if removed {
            self.inner.counters.record_delete();
        }
        Ok(removed)
    }

    /// Delete from one named tier. An unknown tier returns `false`.
    ///
    /// # Errors
    /// Returns [`CacheError::InvalidKey`] for an invalid key.
    pub async fn delete_from(&self, key: &str, tier: &str) -> CacheResult<bool> {
        validate_key(key)?;
        let Some(managed) = self.inner.find(tier) else {
            return Ok(false);
        };
        let removed = managed.tier.delete(key)?;
        if removed {
            self.inner.counters.record_delete();
        }
        Ok(removed)
    }

    /// Flush every tier and reset global statistics.
    pub async fn clear(&self) {
        for managed in self.inner.snapshot() {
            managed.tier.clear();
        }
        self.inner.counters.reset();
        info!("cache cleared");
    }

    /// Flush one tier.
    ///
    /// # Errors
    /// Returns [`CacheError::TierNotFound`] for an unknown tier.
    pub async fn clear_tier(&self, name: &str) -> CacheResult<()> {
        let managed = self
            .inner
            .find(name)
            .ok_or_else(|| CacheError::tier_not_found(name))?;
        managed.tier.clear();
        Ok(())
    }

    // =========================================================================
    // Prefetch
    // =========================================================================

    /// Run `loader` and store its value, unless a prefetch for `key` is
    /// already running. Uses the configured prefetch timeout.
    ///
    /// Loader errors and timeouts are logged and reported in the outcome,
    /// never returned as errors.
    ///
    /// # Errors
    /// Returns [`CacheError::InvalidKey`] for an invalid key.
    pub async fn prefetch<F, Fut, E>(
        &self,
        key: &str,
        loader: F,
        ttl: Option<Duration>,
    ) -> CacheResult<PrefetchOutcome>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: std::fmt::Display,
    {
        let timeout = self.inner.config.prefetch_timeout();
        self.prefetch_with_timeout(key, loader, ttl, timeout).await
    }

    /// [`CacheManager::prefetch`] with an explicit loader timeout.
    ///
    /// # Errors
    /// Returns [`CacheError::InvalidKey`] for an invalid key.
    #[tracing::instrument(skip(self, loader), level = "debug")]
    pub async fn prefetch_with_timeout<F, Fut, E>(
        &self,
        key: &str,
        loader: F,
        ttl: Option<Duration>,
        timeout: Duration,
    ) -> CacheResult<PrefetchOutcome>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: std::fmt::Display,
    {
        validate_key(key)?;
        let Some(_claim) = self.inner.in_flight.claim(key) else {
            debug!("prefetch already in flight");
            return Ok(PrefetchOutcome::AlreadyInFlight);
        };

        match tokio::time::timeout(timeout, loader()).await {
            Ok(Ok(value)) => {
                self.set(key, value, ttl).await?;
                debug!("prefetch loaded");
                Ok(PrefetchOutcome::Loaded)
            }
            Ok(Err(err)) => {
                let err = CacheError::LoaderFailure {
                    key: key.to_string(),
                    message: err.to_string(),
                };
                warn!(error = %err, "prefetch failed");
                Ok(PrefetchOutcome::Failed(err))
            }
            Err(_) => {
                let err = CacheError::LoaderTimeout {
                    key: key.to_string(),
                    timeout_ms: u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX),
                };
                warn!(error = %err, "prefetch timed out");
                Ok(PrefetchOutcome::TimedOut(err))
            }
        }
    }

    /// Whether a prefetch for `key` is running.
    #[must_use]
    pub fn is_prefetching(&self, key: &str) -> bool {
        self.inner.in_flight.contains(key)
    }

    // =========================================================================
    // Tier administration
    // =========================================================================

    /// Append a tier at the lowest priority.
    ///
    /// # Errors
    /// Returns [`CacheError::DuplicateTier`] if the name is taken, or
    /// [`CacheError::InvalidConfig`] for an invalid config.
    pub fn add_tier(&self, config: TierConfig) -> CacheResult<()> {
        let name = config.name.clone();
        let managed = self.inner.build_tier(config)?;
        let mut tiers = self
            .inner
            .tiers
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        if tiers.iter().any(|existing| existing.tier.name() == name) {
            return Err(CacheError::DuplicateTier { name });
        }
        tiers.push(managed);
        info!(tier = %name, priority = tiers.len() - 1, "tier added");
        Ok(())
    }

    /// Remove a tier and its data.
    ///
    /// # Errors
    /// Returns [`CacheError::TierNotFound`] for an unknown tier.
    pub fn remove_tier(&self, name: &str) -> CacheResult<()> {
        let mut tiers = self
            .inner
            .tiers
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        let position = tiers
            .iter()
            .position(|managed| managed.tier.name() == name)
            .ok_or_else(|| CacheError::tier_not_found(name))?;
        tiers.remove(position);
        info!(tier = %name, "tier removed");
        Ok(())
    }

    /// Include a tier in fan-out again.
    ///
    /// # Errors
    /// Returns [`CacheError::TierNotFound`] for an unknown tier.
    pub fn enable_tier(&self, name: &str) -> CacheResult<()> {
        self.set_enabled(name, true)
    }

    /// Skip a tier in fan-out. Its data is kept.
    ///
    /// # Errors
    /// Returns [`CacheError::TierNotFound`] for an unknown tier.
    pub fn disable_tier(&self, name: &str) -> CacheResult<()> {
        self.set_enabled(name, false)
    }

    fn set_enabled(&self, name: &str, enabled: bool) -> CacheResult<()> {
        let managed = self
            .inner
            .find(name)
            .ok_or_else(|| CacheError::tier_not_found(name))?;
        managed.enabled.store(enabled, Ordering::Release);
        info!(tier = %name, enabled, "tier toggled");
        Ok(())
    }

    /// Whether a tier is enabled; `None` for an unknown tier.
    #[must_use]
    pub fn is_tier_enabled(&self, name: &str) -> Option<bool> {
        self.inner.find(name).map(|managed| managed.is_enabled())
    }

    /// Tier names in priority order.
    #[must_use]
    pub fn tier_names(&self) -> Vec<String> {
        self.inner
            .snapshot()
            .iter()
            .map(|managed| managed.tier.name().to_string())
            .collect()
    }

    /// Direct access to a tier.
    #[must_use]
    pub fn tier(&self, name: &str) -> Option<Arc<Tier<T>>> {
        self.inner.find(name).map(|managed| Arc::clone(&managed.tier))
    }

    // =========================================================================
    // Maintenance and observability
    // =========================================================================

    /// Remove expired entries from every tier, enabled or not.
    pub fn sweep_expired(&self) -> usize {
        self.inner.sweep_all()
    }

    /// Statistics snapshot.
    #[must_use]
    pub fn stats(&self) -> CacheStats {
        let tiers = self
            .inner
            .snapshot()
            .iter()
            .enumerate()
            .map(|(priority, managed)| ManagedTierStats {
                priority,
                enabled: managed.is_enabled(),
                stats: managed.tier.stats(),
            })
            .collect();
        self.inner
            .counters
            .snapshot(tiers, self.inner.in_flight.len())
    }

    /// Receive cache events from now on.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<CacheEvent> {
        self.inner.events.subscribe()
    }

    /// Whether the background sweeper is running.
    #[must_use]
    pub fn is_sweeping(&self) -> bool {
        self.sweeper.as_ref().is_some_and(BackgroundTask::is_running)
    }

    /// Stop the background sweeper and wait for it to exit.
    pub async fn stop(&self) {
        if let Some(sweeper) = &self.sweeper {
            sweeper.stop().await;
        }
    }

    /// Stop the sweeper, then flush every tier.
    pub async fn destroy(&self) {
        self.stop().await;
        self.clear().await;
        info!("cache manager destroyed");
    }

    // =========================================================================
    // Helpers
    // =========================================================================

    fn promote(&self, key: &str, value: &T, higher: &[Arc<ManagedTier<T>>]) -> CacheResult<()> {
        let mut promoted = 0;
        for managed in higher {
            if !managed.tier.contains(key) {
                managed.tier.set(key, value.clone(), None)?;
                promoted += 1;
            }
        }
        if promoted > 0 {
            debug!(key, tiers = promoted, "promoted entry");
            self.inner.counters.record_promotions(promoted);
        }
        Ok(())
    }

    fn record_lookup(&self, hit: bool, started: Instant) {
        let micros = u64::try_from(started.elapsed().as_micros()).unwrap_or(u64::MAX);
        self.inner.counters.record_lookup(hit, micros);
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tier::EvictionStrategy;
    use strata_core::SimClock;

    fn two_tiers(clock: &SimClock) -> CacheManager<String> {
        CacheManager::with_clock(
            CacheConfig::with_tiers(vec![
                TierConfig::new("l1")
                    .with_max_size(2)
                    .with_default_ttl(Duration::from_secs(60)),
                TierConfig::new("l2")
                    .with_max_size(10)
                    .with_default_ttl(Duration::from_secs(300))
                    .with_strategy(EvictionStrategy::Lfu),
            ])
            .without_sweeper(),
            clock.shared(),
        )
        .unwrap()
    }

    fn s(v: &str) -> String {
        v.to_string()
    }

    #[test]
    fn test_effective_ttl() {
        let secs = Duration::from_secs;
        assert_eq!(effective_ttl(Some(secs(10)), Some(secs(60))), Some(secs(10)));
        assert_eq!(effective_ttl(Some(secs(600)), Some(secs(60))), Some(secs(60)));
        assert_eq!(effective_ttl(None, Some(secs(60))), Some(secs(60)));
        assert_eq!(effective_ttl(Some(secs(5)), None), Some(secs(5)));
        assert_eq!(effective_ttl(None, None), None);
        assert_eq!(effective_ttl(Some(Duration::ZERO), None), None);
    }

    #[tokio::test]
    async fn test_set_fans_out_with_capped_ttl() {
        let clock = SimClock::new();
        let cache = two_tiers(&clock);

        cache.set("k", s("v"), Some(Duration::from_secs(120))).await.unwrap();

        let l1 = cache.tier("l1").unwrap().entry_meta("k").unwrap();
        let l2 = cache.tier("l2").unwrap().entry_meta("k").unwrap();
        assert_eq!(l1.expires_at_ms, Some(60_000));
        assert_eq!(l2.expires_at_ms, Some(120_000));
    }

    #[tokio::test]
    async fn test_get_promotes_with_tier_default_ttl() {
        let clock = SimClock::new();
        let cache = two_tiers(&clock);

        cache.set_in("k", s("v"), None, "l2").await.unwrap();
        clock.advance_secs(10);
        assert_eq!(cache.get("k").await.unwrap(), Some(s("v")));

        let l1 = cache.tier("l1").unwrap().entry_meta("k").unwrap();
        assert_eq!(l1.expires_at_ms, Some(70_000));
        assert_eq!(cache.stats().promotions, 1);
    }

    #[tokio::test]
    async fn test_promotion_is_idempotent() {
        let clock = SimClock::new();
        let cache = two_tiers(&clock);

        cache.set_in("k", s("v"), None, "l2").await.unwrap();
        cache.get("k").await.unwrap();
        cache.get("k").await.unwrap();

        assert_eq!(cache.stats().promotions, 1);
        assert_eq!(cache.tier("l1").unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_global_miss_counted_once() {
        let clock = SimClock::new();
        let cache = two_tiers(&clock);

        assert_eq!(cache.get("nope").await.unwrap(), None);
        let stats = cache.stats();
        assert_eq!(stats.misses, 1);
        assert_eq!(stats.tier("l1").unwrap().stats.misses, 1);
        assert_eq!(stats.tier("l2").unwrap().stats.misses, 1);
    }

    #[tokio::test]
    async fn test_named_tier_operations() {
        let clock = SimClock::new();
        let cache = two_tiers(&clock);

        cache.set_in("k", s("v"), None, "l2").await.unwrap();
        assert_eq!(cache.get_from("k", "l1").await.unwrap(), None);
        assert_eq!(cache.get_from("k", "l2").await.unwrap(), Some(s("v")));
        assert_eq!(cache.get_from("k", "l9").await.unwrap(), None);

        cache.set_in("k", s("v"), None, "l9").await.unwrap();
        assert!(!cache.delete_from("k", "l9").await.unwrap());
        assert!(cache.delete_from("k", "l2").await.unwrap());
    }

    #[tokio::test]
    async fn test_disabled_tier_skipped_but_kept() {
        let clock = SimClock::new();
        let cache = two_tiers(&clock);

        cache.set("k", s("v"), None).await.unwrap();
        cache.disable_tier("l1").unwrap();
        cache.set("only-l2", s("x"), None).await.unwrap();

        assert_eq!(cache.is_tier_enabled("l1"), Some(false));
        assert!(!cache.tier("l1").unwrap().contains("only-l2"));
        assert_eq!(cache.get_from("k", "l1").await.unwrap(), Some(s("v")));

        cache.enable_tier("l1").unwrap();
        assert!(matches!(
            cache.disable_tier("l9"),
            Err(CacheError::TierNotFound { .. })
        ));
    }

    #[tokio::test]
    async fn test_no_enabled_tiers() {
        let clock = SimClock::new();
        let cache = two_tiers(&clock);
        cache.disable_tier("l1").unwrap();
        cache.disable_tier("l2").unwrap();

        cache.set("k", s("v"), None).await.unwrap();
        assert_eq!(cache.get("k").await.unwrap(), None);
        assert!(!cache.has("k").await.unwrap());
    }

    #[tokio::test]
    async fn test_delete_reports_any_tier() {
        let clock = SimClock::new();
        let cache = two_tiers(&clock);

        cache.set_in("k", s("v"), None, "l2").await.unwrap();
        assert!(cache.delete("k").await.unwrap());
        assert!(!cache.delete("k").await.unwrap());
        assert_eq!(cache.stats().deletes, 1);
    }

    #[tokio::test]
    async fn test_mget_mset() {
        let clock = SimClock::new();
        let cache = two_tiers(&clock);

        cache
            .mset(vec![(s("a"), s("1")), (s("b"), s("2"))], None)
            .await
            .unwrap();
        let found = cache.mget(&["a", "b", "c"]).await.unwrap();

        assert_eq!(found.len(), 2);
        assert_eq!(found["a"], "1");
        assert!(!found.contains_key("c"));
    }

    #[tokio::test]
    async fn test_mget_invalid_key_fails_before_lookups() {
        let clock = SimClock::new();
        let cache = two_tiers(&clock);

        let err = cache.mget(&["a", ""]).await.unwrap_err();
        assert!(matches!(err, CacheError::InvalidKey { .. }));
        assert_eq!(cache.stats().misses, 0);

        let err = cache
            .mset(vec![(s("ok"), s("1")), (String::new(), s("2"))], None)
            .await
            .unwrap_err();
        assert!(matches!(err, CacheError::InvalidKey { .. }));
        assert!(!cache.has("ok").await.unwrap());
    }

    #[tokio::test]
    async fn test_add_and_remove_tier() {
        let clock = SimClock::new();
        let cache = two_tiers(&clock);

        cache.add_tier(TierConfig::new("l3")).unwrap();
        assert_eq!(cache.tier_names(), vec!["l1", "l2", "l3"]);
        assert!(matches!(
            cache.add_tier(TierConfig::new("l1")),
            Err(CacheError::DuplicateTier { .. })
        ));

        cache.remove_tier("l2").unwrap();
        assert_eq!(cache.tier_names(), vec!["l1", "l3"]);
        assert!(cache.remove_tier("l2").is_err());
    }

    #[tokio::test]
    async fn test_clear_resets_everything() {
        let clock = SimClock::new();
        let cache = two_tiers(&clock);

        cache.set("k", s("v"), None).await.unwrap();
        cache.get("k").await.unwrap();
        cache.clear().await;

        let stats = cache.stats();
        assert_eq!(stats.hits, 0);
        assert_eq!(stats.sets, 0);
        assert!(stats.tiers.iter().all(|tier| tier.stats.size == 0));
    }

    #[tokio::test]
    async fn test_clear_single_tier() {
        let clock = SimClock::new();
        let cache = two_tiers(&clock);

        cache.set("k", s("v"), None).await.unwrap();
        cache.clear_tier("l1").await.unwrap();

        assert!(!cache.tier("l1").unwrap().contains("k"));
        assert!(cache.tier("l2").unwrap().contains("k"));
        assert!(cache.clear_tier("l9").await.is_err());
    }

    #[tokio::test]
    async fn test_manual_sweep_covers_disabled_tiers() {
        let clock = SimClock::new();
        let cache = two_tiers(&clock);

        cache.set("k", s("v"), Some(Duration::from_secs(1))).await.unwrap();
        cache.disable_tier("l2").unwrap();
        clock.advance_secs(2);

        assert_eq!(cache.sweep_expired(), 2);
    }

    #[tokio::test]
    async fn test_prefetch_loads() {
        let clock = SimClock::new();
        let cache = two_tiers(&clock);

        let outcome = cache
            .prefetch("k", || async { Ok::<_, String>(s("loaded")) }, None)
            .await
            .unwrap();

        assert!(outcome.is_loaded());
        assert_eq!(cache.get("k").await.unwrap(), Some(s("loaded")));
        assert!(!cache.is_prefetching("k"));
    }

    #[tokio::test]
    async fn test_prefetch_failure_is_reported_not_raised() {
        let clock = SimClock::new();
        let cache = two_tiers(&clock);

        let outcome = cache
            .prefetch("k", || async { Err::<String, _>("backend down") }, None)
            .await
            .unwrap();

        assert!(matches!(
            outcome,
            PrefetchOutcome::Failed(CacheError::LoaderFailure { ref message, .. })
                if message == "backend down"
        ));
        assert!(!cache.is_prefetching("k"));
        assert!(!cache.has("k").await.unwrap());
    }

    #[tokio::test]
    async fn test_prefetch_timeout_clears_marker() {
        let clock = SimClock::new();
        let cache = two_tiers(&clock);

        let outcome = cache
            .prefetch_with_timeout(
                "slow",
                || async {
                    tokio::time::sleep(Duration::from_secs(5)).await;
                    Ok::<_, String>(s("late"))
                },
                None,
                Duration::from_millis(10),
            )
            .await
            .unwrap();

        assert!(matches!(
            outcome,
            PrefetchOutcome::TimedOut(CacheError::LoaderTimeout { timeout_ms: 10, .. })
        ));
        assert!(!cache.is_prefetching("slow"));
    }

    #[tokio::test]
    async fn test_prefetch_single_flight() {
        let clock = SimClock::new();
        let cache = two_tiers(&clock);
        let (release, wait) = tokio::sync::oneshot::channel::<()>();

        let first = cache.prefetch("k", || async move {
            let _ = wait.await;
            Ok::<_, String>(s("first"))
        }, None);
        let second = async {
            tokio::task::yield_now().await;
            assert!(cache.is_prefetching("k"));
            let outcome = cache
                .prefetch("k", || async { Ok::<_, String>(s("second")) }, None)
                .await
                .unwrap();
            let _ = release.send(());
            outcome
        };

        let (first, second) = tokio::join!(first, second);
        assert_eq!(first.unwrap(), PrefetchOutcome::Loaded);
        assert_eq!(second, PrefetchOutcome::AlreadyInFlight);
        assert_eq!(cache.get("k").await.unwrap(), Some(s("first")));
    }

    #[tokio::test]
    async fn test_cancelled_prefetch_releases_claim() {
        let clock = SimClock::new();
        let cache = two_tiers(&clock);

        {
            let pending = cache.prefetch(
                "k",
                || std::future::pending::<Result<String, String>>(),
                None,
            );
            let _ = tokio::time::timeout(Duration::from_millis(5), pending).await;
        }

        assert!(!cache.is_prefetching("k"));
    }

    #[tokio::test]
    async fn test_events_include_global_miss() {
        let clock = SimClock::new();
        let cache = two_tiers(&clock);
        let mut rx = cache.subscribe();

        cache.get("absent").await.unwrap();

        let events: Vec<CacheEvent> = std::iter::from_fn(|| rx.try_recv().ok()).collect();
        assert_eq!(events.len(), 3);
        assert_eq!(events[2].tier, None);
        assert_eq!(events[2].kind, CacheEventKind::Miss);
    }

    #[tokio::test]
    async fn test_sweeper_lifecycle() {
        let cache: CacheManager<String> = CacheManager::new(
            CacheConfig::with_tiers(vec![TierConfig::new("l1")])
                .with_check_period(Duration::from_millis(5)),
        )
        .unwrap();

        assert!(cache.is_sweeping());
        cache.stop().await;
        assert!(!cache.is_sweeping());
        cache.destroy().await;
    }

    #[test]
    fn test_no_runtime_no_sweeper() {
        let cache: CacheManager<String> = CacheManager::new(CacheConfig::default()).unwrap();
        assert!(!cache.is_sweeping());
    }

    #[tokio::test]
    async fn test_invalid_config_rejected() {
        let result: CacheResult<CacheManager<String>> =
            CacheManager::new(CacheConfig::with_tiers(vec![TierConfig::new("x").with_max_size(0)]));
        assert!(matches!(result, Err(CacheError::InvalidConfig { .. })));
    }
}
