//! Cache Manager Configuration

use std::collections::HashSet;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::constants::{
    CACHE_CHECK_PERIOD_MS_DEFAULT, CACHE_EVENT_CHANNEL_CAPACITY_DEFAULT,
    CACHE_PREFETCH_TIMEOUT_MS_DEFAULT,
};
use crate::error::{CacheError, CacheResult};
use crate::tier::TierConfig;

/// Configuration for a [`super::CacheManager`].
///
/// Tiers are listed in priority order: index 0 is checked first.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Tiers, highest priority first
    pub tiers: Vec<TierConfig>,
    /// Background expiry sweep period; `None` disables the sweeper
    pub check_period_ms: Option<u64>,
    /// Default loader timeout for `prefetch`
    pub prefetch_timeout_ms: u64,
    /// Events buffered per subscriber
    pub event_capacity: usize,
}

impl CacheConfig {
    /// Configuration with the given tiers and default timings.
    #[must_use]
    pub fn with_tiers(tiers: Vec<TierConfig>) -> Self {
        Self {
            tiers,
            ..Self::default()
        }
    }

    /// Append a tier at the lowest priority.
    #[must_use]
    pub fn with_tier(mut self, tier: TierConfig) -> Self {
        self.tiers.push(tier);
        self
    }

    /// Set the sweep period.
    #[must_use]
    pub fn with_check_period(mut self, period: Duration) -> Self {
        self.check_period_ms = Some(u64::try_from(period.as_millis()).unwrap_or(u64::MAX));
        self
    }

    /// Disable the background sweeper.
    #[must_use]
    pub fn without_sweeper(mut self) -> Self {
        self.check_period_ms = None;
        self
    }

    /// Set the default prefetch timeout.
    #[must_use]
    pub fn with_prefetch_timeout(mut self, timeout: Duration) -> Self {
        self.prefetch_timeout_ms = u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX);
        self
    }

    /// Set the event buffer size.
    #[must_use]
    pub fn with_event_capacity(mut self, capacity: usize) -> Self {
        self.event_capacity = capacity;
        self
    }

    /// Sweep period as a `Duration`.
    #[must_use]
    pub fn check_period(&self) -> Option<Duration> {
        self.check_period_ms.map(Duration::from_millis)
    }

    /// Prefetch timeout as a `Duration`.
    #[must_use]
    pub fn prefetch_timeout(&self) -> Duration {
        Duration::from_millis(self.prefetch_timeout_ms)
    }

    /// Check the configuration.
    ///
    /// # Errors
    /// Returns [`CacheError::InvalidConfig`] for no tiers, an invalid tier,
    /// zero periods or capacity, and [`CacheError::DuplicateTier`] for a
    /// repeated tier name.
    pub fn validate(&self) -> CacheResult<()> {
        if self.tiers.is_empty() {
            return Err(CacheError::invalid_config("at least one tier is required"));
        }
        let mut names = HashSet::new();
        for tier in &self.tiers {
            tier.validate()?;
            if !names.insert(tier.name.as_str()) {
                return Err(CacheError::DuplicateTier {
                    name: tier.name.clone(),
                });
            }
        }
        if self.check_period_ms == Some(0) {
            return Err(CacheError::invalid_config("check_period_ms must be positive"));
        }
        if self.prefetch_timeout_ms == 0 {
            return Err(CacheError::invalid_config(
                "prefetch_timeout_ms must be positive",
            ));
        }
        if self.event_capacity == 0 {
            return Err(CacheError::invalid_config("event_capacity must be positive"));
        }
        Ok(())
    }
}

impl Default for CacheConfig {
    /// Three tiers: `l1` (LRU), `l2` (LFU), `l3` (LRU).
    fn default() -> Self {
        Self {
            tiers: vec![TierConfig::l1(), TierConfig::l2(), TierConfig::l3()],
            check_period_ms: Some(CACHE_CHECK_PERIOD_MS_DEFAULT),
            prefetch_timeout_ms: CACHE_PREFETCH_TIMEOUT_MS_DEFAULT,
            event_capacity: CACHE_EVENT_CHANNEL_CAPACITY_DEFAULT,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_valid() {
        let config = CacheConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.tiers.len(), 3);
        assert_eq!(config.tiers[0].name, "l1");
    }

    #[test]
    fn test_duplicate_names_rejected() {
        let config = CacheConfig::with_tiers(vec![TierConfig::new("a"), TierConfig::new("a")]);
        assert!(matches!(
            config.validate(),
            Err(CacheError::DuplicateTier { name }) if name == "a"
        ));
    }

    #[test]
    fn test_invalid_values_rejected() {
        assert!(CacheConfig::with_tiers(vec![]).validate().is_err());
        assert!(CacheConfig::default()
            .with_event_capacity(0)
            .validate()
            .is_err());
        assert!(CacheConfig::default()
            .with_check_period(Duration::ZERO)
            .validate()
            .is_err());
    }

    #[test]
    fn test_from_json() {
        let config: CacheConfig = serde_json::from_str(
            r#"{
                "tiers": [
                    {"name": "mem", "max_size": 10, "default_ttl_ms": 1000},
                    {"name": "big", "max_size": 100, "strategy": "lfu"}
                ],
                "check_period_ms": null
            }"#,
        )
        .unwrap();

        assert!(config.validate().is_ok());
        assert_eq!(config.tiers.len(), 2);
        assert_eq!(config.check_period(), None);
        assert_eq!(config.prefetch_timeout_ms, CACHE_PREFETCH_TIMEOUT_MS_DEFAULT);
    }
}
