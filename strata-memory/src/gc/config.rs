//! Garbage Collection Policy
//!
//! `TigerStyle`: Explicit thresholds, environment overrides, pure scoring.

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::constants::{
    BYTES_PER_MB, GC_ACCESS_RATE_AGE_MS_MIN, GC_INTERVAL_SECS_DEFAULT,
    GC_LOW_ACTIVITY_PER_MIN_DEFAULT, GC_MAX_AGE_DAYS_DEFAULT, GC_MAX_MEMORY_MB_DEFAULT,
    GC_MIN_RELEVANCE_DEFAULT, GC_PRESSURE_RATIO_DEFAULT, TIME_MS_PER_DAY, TIME_MS_PER_MIN,
};
use crate::error::{CacheError, CacheResult};
use crate::item::MemoryItem;

/// Environment variable overriding `max_memory_mb`.
pub const GC_MAX_MEMORY_MB_ENV: &str = "STRATA_GC_MAX_MEMORY_MB";
/// Environment variable overriding `max_age_days`.
pub const GC_MAX_AGE_DAYS_ENV: &str = "STRATA_GC_MAX_AGE_DAYS";
/// Environment variable overriding `min_relevance`.
pub const GC_MIN_RELEVANCE_ENV: &str = "STRATA_GC_MIN_RELEVANCE";
/// Environment variable overriding `gc_interval_secs`.
pub const GC_INTERVAL_SECS_ENV: &str = "STRATA_GC_INTERVAL_SECS";

/// Why an item was collected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RemovalReason {
    /// Older than `max_age_days`
    TooOld,
    /// Relevance below `min_relevance`
    LowRelevance,
    /// Accesses per minute below `low_activity_threshold`
    LowActivity,
}

impl fmt::Display for RemovalReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::TooOld => "too_old",
            Self::LowRelevance => "low_relevance",
            Self::LowActivity => "low_activity",
        })
    }
}

/// Collection policy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GcConfig {
    /// Memory budget for tracked items
    pub max_memory_mb: u64,
    /// Maximum item age
    pub max_age_days: u64,
    /// Minimum relevance to keep an item
    pub min_relevance: f64,
    /// Seconds between cycles
    pub gc_interval_secs: u64,
    /// Minimum accesses per minute to keep an item
    pub low_activity_threshold: f64,
    /// Fraction of the budget in use before a cycle scans
    pub pressure_ratio: f64,
}

impl GcConfig {
    /// Defaults overridden by `STRATA_GC_*` environment variables.
    ///
    /// Missing or unparsable values fall back to defaults.
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Like [`GcConfig::from_env`] with a custom variable source.
    #[must_use]
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        Self {
            max_memory_mb: parse_or(&lookup, GC_MAX_MEMORY_MB_ENV, defaults.max_memory_mb),
            max_age_days: parse_or(&lookup, GC_MAX_AGE_DAYS_ENV, defaults.max_age_days),
            min_relevance: parse_or(&lookup, GC_MIN_RELEVANCE_ENV, defaults.min_relevance),
            gc_interval_secs: parse_or(&lookup, GC_INTERVAL_SECS_ENV, defaults.gc_interval_secs),
            ..defaults
        }
    }

    /// Set the memory budget.
    #[must_use]
    pub fn with_max_memory_mb(mut self, mb: u64) -> Self {
        self.max_memory_mb = mb;
        self
    }

    /// Set the maximum age.
    #[must_use]
    pub fn with_max_age_days(mut self, days: u64) -> Self {
        self.max_age_days = days;
        self
    }

    /// Set the relevance floor.
    #[must_use]
    pub fn with_min_relevance(mut self, relevance: f64) -> Self {
        self.min_relevance = relevance;
        self
    }

    /// Set the cycle interval.
    #[must_use]
    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.gc_interval_secs = interval.as_secs().max(1);
        self
    }

    /// Set the activity floor (accesses per minute).
    #[must_use]
    pub fn with_low_activity_threshold(mut self, per_minute: f64) -> Self {
        self.low_activity_threshold = per_minute;
        self
    }

    /// Set the pressure ratio; `0.0` scans on every cycle.
    #[must_use]
    pub fn with_pressure_ratio(mut self, ratio: f64) -> Self {
        self.pressure_ratio = ratio;
        self
    }

    /// Memory budget in bytes.
    #[must_use]
    pub fn max_memory_bytes(&self) -> u64 {
        self.max_memory_mb.saturating_mul(BYTES_PER_MB)
    }

    /// Usage at which a cycle starts scanning.
    #[must_use]
    pub fn pressure_threshold_bytes(&self) -> u64 {
        #[allow(
            clippy::cast_precision_loss,
            clippy::cast_possible_truncation,
            clippy::cast_sign_loss
        )]
        let threshold = (self.max_memory_bytes() as f64 * self.pressure_ratio) as u64;
        threshold
    }

    /// Cycle interval.
    #[must_use]
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.gc_interval_secs)
    }

    /// First rule `item` breaks at `now_ms`, if any.
    ///
    /// Rules are OR-ed: age, then relevance, then access rate. Access rate
    /// is only judged once the item is at least a minute old.
    #[must_use]
    pub fn removal_reason<T>(&self, item: &MemoryItem<T>, now_ms: u64) -> Option<RemovalReason> {
        let age_ms = item.age_ms(now_ms);
        if age_ms > self.max_age_days.saturating_mul(TIME_MS_PER_DAY) {
            return Some(RemovalReason::TooOld);
        }
        if item.relevance < self.min_relevance {
            return Some(RemovalReason::LowRelevance);
        }
        if age_ms >= GC_ACCESS_RATE_AGE_MS_MIN {
            #[allow(clippy::cast_precision_loss)]
            let rate = item.access_count as f64 / (age_ms as f64 / TIME_MS_PER_MIN as f64);
            if rate < self.low_activity_threshold {
                return Some(RemovalReason::LowActivity);
            }
        }
        None
    }

    /// Check the configuration.
    ///
    /// # Errors
    /// Returns [`CacheError::InvalidConfig`] for a zero budget or interval,
    /// or ratios outside `[0, 1]`.
    pub fn validate(&self) -> CacheResult<()> {
        if self.max_memory_mb == 0 {
            return Err(CacheError::invalid_config("max_memory_mb must be positive"));
        }
        if self.gc_interval_secs == 0 {
            return Err(CacheError::invalid_config("gc_interval_secs must be positive"));
        }
        if !(0.0..=1.0).contains(&self.min_relevance) {
            return Err(CacheError::invalid_config("min_relevance must be in [0, 1]"));
        }
        if !(0.0..=1.0).contains(&self.pressure_ratio) {
            return Err(CacheError::invalid_config("pressure_ratio must be in [0, 1]"));
        }
        if self.low_activity_threshold.is_nan() || self.low_activity_threshold < 0.0 {
            return Err(CacheError::invalid_config(
                "low_activity_threshold must be non-negative",
            ));
        }
        Ok(())
    }
}

fn parse_or<V>(lookup: &impl Fn(&str) -> Option<String>, name: &str, default: V) -> V
where
    V: FromStr + fmt::Display,
{
    let Some(raw) = lookup(name) else {
        return default;
    };
    raw.trim().parse().unwrap_or_else(|_| {
        warn!(var = name, value = %raw, default = %default, "unparsable GC setting, using default");
        default
    })
}

impl Default for GcConfig {
    fn default() -> Self {
        Self {
            max_memory_mb: GC_MAX_MEMORY_MB_DEFAULT,
            max_age_days: GC_MAX_AGE_DAYS_DEFAULT,
            min_relevance: GC_MIN_RELEVANCE_DEFAULT,
            gc_interval_secs: GC_INTERVAL_SECS_DEFAULT,
            low_activity_threshold: GC_LOW_ACTIVITY_PER_MIN_DEFAULT,
            pressure_ratio: GC_PRESSURE_RATIO_DEFAULT,
        }
    }
}
