//! GarbageCollector - Relevance-Weighted Collection
//!
//! `TigerStyle`: Bounded memory, explicit policy, errors isolated per item.
//!
//! Items are registered with [`GarbageCollector::add_memory_item`]. Each
//! cycle measures total tracked size; below the pressure threshold it does
//! nothing. Otherwise it removes every item that is too old, not relevant
//! enough or not accessed often enough.

mod config;

pub use config::{
    GcConfig, RemovalReason, GC_INTERVAL_SECS_ENV, GC_MAX_AGE_DAYS_ENV, GC_MAX_MEMORY_MB_ENV,
    GC_MIN_RELEVANCE_ENV,
};

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};
use std::time::{Duration, Instant};

use serde::Serialize;
use strata_core::{SharedClock, SystemClock};
use tracing::{debug, error, info};

use crate::constants::MEMORY_RELEVANCE_DEFAULT;
use crate::entry::{estimate_size, validate_key};
use crate::error::{CacheError, CacheResult};
use crate::item::{clamp_relevance, Importance, MemoryItem};
use crate::task::BackgroundTask;

/// Outcome of one cycle.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GcReport {
    /// Items examined
    pub checked: usize,
    /// Items removed
    pub removed: usize,
    /// Items skipped because they could not be evaluated
    pub failed: usize,
    /// Bytes released
    pub freed_bytes: u64,
    /// Tracked bytes before the cycle
    pub usage_bytes: u64,
    /// Wall time spent
    pub duration: Duration,
    /// The pressure gate stopped the cycle before marking
    pub skipped: bool,
    /// Removed keys with the rule each broke
    pub removals: Vec<(String, RemovalReason)>,
}

#[derive(Debug)]
struct GcInner<T> {
    config: GcConfig,
    clock: SharedClock,
    items: Mutex<HashMap<String, MemoryItem<T>>>,
    last_report: Mutex<Option<GcReport>>,
    cycles: AtomicU64,
}

impl<T: Serialize> GcInner<T> {
    fn items(&self) -> MutexGuard<'_, HashMap<String, MemoryItem<T>>> {
        self.items.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn collect(&self, force: bool) -> GcReport {
        let started = Instant::now();
        let now_ms = self.clock.now_ms();
        let mut items = self.items();

        let mut sizes = HashMap::with_capacity(items.len());
        let mut failed = 0;
        for (key, item) in items.iter() {
            match estimate_size(&item.value) {
                Ok(size) => {
                    sizes.insert(key.clone(), size as u64);
                }
                Err(err) => {
                    failed += 1;
                    let err = CacheError::GcItem {
                        key: key.clone(),
                        message: err.to_string(),
                    };
                    error!(error = %err, "skipping item");
                }
            }
        }
        let usage_bytes: u64 = sizes.values().sum();

        if !force && usage_bytes < self.config.pressure_threshold_bytes() {
            drop(items);
            let report = GcReport {
                checked: sizes.len(),
                removed: 0,
                failed,
                freed_bytes: 0,
                usage_bytes,
                duration: started.elapsed(),
                skipped: true,
                removals: Vec::new(),
            };
            debug!(usage_bytes, "gc skipped, below pressure threshold");
            return self.finish(report);
        }

        let mut removals: Vec<(String, RemovalReason)> = sizes
            .keys()
            .filter_map(|key| {
                let item = items.get(key)?;
                self.config
                    .removal_reason(item, now_ms)
                    .map(|reason| (key.clone(), reason))
            })
            .collect();
        removals.sort();

        let mut freed_bytes = 0;
        for (key, reason) in &removals {
            items.remove(key);
            freed_bytes += sizes.get(key).copied().unwrap_or(0);
            debug!(key = %key, reason = %reason, "collected");
        }
        drop(items);

        let report = GcReport {
            checked: sizes.len(),
            removed: removals.len(),
            failed,
            freed_bytes,
            usage_bytes,
            duration: started.elapsed(),
            skipped: false,
            removals,
        };
        info!(
            checked = report.checked,
            removed = report.removed,
            failed = report.failed,
            freed_bytes = report.freed_bytes,
            duration_us = report.duration.as_micros() as u64,
            "gc cycle complete"
        );
        self.finish(report)
    }

    fn finish(&self, report: GcReport) -> GcReport {
        self.cycles.fetch_add(1, Ordering::Relaxed);
        *self
            .last_report
            .lock()
            .unwrap_or_else(PoisonError::into_inner) = Some(report.clone());
        report
    }
}

// =============================================================================
// GarbageCollector
// =============================================================================

/// Tracks items and periodically removes those that break the policy.
#[derive(Debug)]
pub struct GarbageCollector<T> {
    inner: Arc<GcInner<T>>,
    task: Mutex<Option<BackgroundTask>>,
}

impl<T> GarbageCollector<T>
where
    T: Serialize + Send + 'static,
{
    /// Create on the system clock. Call [`GarbageCollector::start`] to run
    /// cycles periodically.
    ///
    /// # Errors
    /// Returns [`CacheError::InvalidConfig`] for an invalid policy.
    pub fn new(config: GcConfig) -> CacheResult<Self> {
        Self::with_clock(config, SystemClock::shared())
    }

    /// Create with an explicit clock for ages.
    ///
    /// # Errors
    /// Returns [`CacheError::InvalidConfig`] for an invalid policy.
    pub fn with_clock(config: GcConfig, clock: SharedClock) -> CacheResult<Self> {
        config.validate()?;
        Ok(Self {
            inner: Arc::new(GcInner {
                config,
                clock,
                items: Mutex::new(HashMap::new()),
                last_report: Mutex::new(None),
                cycles: AtomicU64::new(0),
            }),
            task: Mutex::new(None),
        })
    }

    /// Track `data` under `key`, replacing any previous item.
    ///
    /// # Errors
    /// Returns [`CacheError::InvalidKey`] for an invalid key.
    pub fn add_memory_item(&self, key: &str, data: T, relevance: f64) -> CacheResult<()> {
        validate_key(key)?;
        let item = MemoryItem::new(data, Importance::Normal, self.inner.clock.now_ms())
            .with_relevance(relevance);
        self.inner.items().insert(key.to_string(), item);
        Ok(())
    }

    /// Track `data` with the default relevance.
    ///
    /// # Errors
    /// Returns [`CacheError::InvalidKey`] for an invalid key.
    pub fn add_memory_item_default(&self, key: &str, data: T) -> CacheResult<()> {
        self.add_memory_item(key, data, MEMORY_RELEVANCE_DEFAULT)
    }

    /// Count one access. Returns `false` for an untracked key.
    pub fn record_access(&self, key: &str) -> bool {
        let mut items = self.inner.items();
        let Some(item) = items.get_mut(key) else {
            return false;
        };
        item.access_count += 1;
        true
    }

    /// Replace an item's relevance. Returns `false` for an untracked key.
    pub fn update_relevance(&self, key: &str, relevance: f64) -> bool {
        let mut items = self.inner.items();
        let Some(item) = items.get_mut(key) else {
            return false;
        };
        item.relevance = clamp_relevance(relevance);
        true
    }

    /// Stop tracking `key`.
    pub fn remove_memory_item(&self, key: &str) -> bool {
        self.inner.items().remove(key).is_some()
    }

    /// Whether `key` is tracked.
    #[must_use]
    pub fn contains(&self, key: &str) -> bool {
        self.inner.items().contains_key(key)
    }

    /// Tracked item count.
    #[must_use]
    pub fn tracked_count(&self) -> usize {
        self.inner.items().len()
    }

    /// Total size of tracked items. Unsizable items count as zero.
    #[must_use]
    pub fn memory_usage_bytes(&self) -> u64 {
        self.inner
            .items()
            .values()
            .filter_map(|item| estimate_size(&item.value).ok())
            .map(|size| size as u64)
            .sum()
    }

    /// Run one cycle, honouring the pressure gate.
    pub fn run_cycle(&self) -> GcReport {
        self.inner.collect(false)
    }

    /// Run one cycle regardless of memory pressure.
    pub fn force_collect(&self) -> GcReport {
        self.inner.collect(true)
    }

    /// Report of the most recent cycle.
    #[must_use]
    pub fn last_report(&self) -> Option<GcReport> {
        self.inner
            .last_report
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Cycles run so far.
    #[must_use]
    pub fn cycles(&self) -> u64 {
        self.inner.cycles.load(Ordering::Relaxed)
    }

    /// Policy.
    #[must_use]
    pub fn config(&self) -> &GcConfig {
        &self.inner.config
    }

    /// Start periodic cycles every `gc_interval_secs`.
    ///
    /// Returns `false` when no tokio runtime is available. Calling it while
    /// running does nothing.
    pub fn start(&self) -> bool {
        let mut task = self.task.lock().unwrap_or_else(PoisonError::into_inner);
        if task.as_ref().is_some_and(BackgroundTask::is_running) {
            return true;
        }

        let weak: Weak<GcInner<T>> = Arc::downgrade(&self.inner);
        *task = BackgroundTask::spawn("gc", self.inner.config.interval(), move || {
            if let Some(inner) = weak.upgrade() {
                inner.collect(false);
            }
        });
        task.is_some()
    }

    /// Stop periodic cycles and wait for the task to exit.
    pub async fn stop(&self) {
        let task = self.task.lock().unwrap_or_else(PoisonError::into_inner).take();
        if let Some(task) = task {
            task.stop().await;
            info!("gc stopped");
        }
    }

    /// Whether periodic cycles are running.
    #[must_use]
    pub fn is_running(&self) -> bool {
        self.task
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
            .is_some_and(BackgroundTask::is_running)
    }
}

// =============================================================================
// Tests
// =============================================================================
