//! Tier Configuration

use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::strategy::EvictionStrategy;
use crate::constants::{
    TIER_L1_ENTRIES_COUNT_DEFAULT, TIER_L1_TTL_MS_DEFAULT, TIER_L2_ENTRIES_COUNT_DEFAULT,
    TIER_L2_TTL_MS_DEFAULT, TIER_L3_ENTRIES_COUNT_DEFAULT, TIER_L3_TTL_MS_DEFAULT,
};
use crate::error::{CacheError, CacheResult};

/// Configuration for one tier.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TierConfig {
    /// Unique name within a manager
    pub name: String,
    /// Capacity in entries
    pub max_size: usize,
    /// TTL for writes without one (and for promotions); `None` = no expiry
    pub default_ttl_ms: Option<u64>,
    /// Eviction strategy
    pub strategy: EvictionStrategy,
}

impl TierConfig {
    /// Named tier with L1 sizing.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Small, short-lived LRU tier.
    #[must_use]
    pub fn l1() -> Self {
        Self::default()
    }

    /// Mid-sized LFU tier.
    #[must_use]
    pub fn l2() -> Self {
        Self {
            name: "l2".to_string(),
            max_size: TIER_L2_ENTRIES_COUNT_DEFAULT,
            default_ttl_ms: Some(TIER_L2_TTL_MS_DEFAULT),
            strategy: EvictionStrategy::Lfu,
        }
    }

    /// Large, long-lived LRU tier.
    #[must_use]
    pub fn l3() -> Self {
        Self {
            name: "l3".to_string(),
            max_size: TIER_L3_ENTRIES_COUNT_DEFAULT,
            default_ttl_ms: Some(TIER_L3_TTL_MS_DEFAULT),
            strategy: EvictionStrategy::Lru,
        }
    }

    /// Set capacity.
    #[must_use]
    pub fn with_max_size(mut self, max_size: usize) -> Self {
        self.max_size = max_size;
        self
    }

    /// Set default TTL.
    #[must_use]
    pub fn with_default_ttl(mut self, ttl: Duration) -> Self {
        self.default_ttl_ms = Some(u64::try_from(ttl.as_millis()).unwrap_or(u64::MAX));
        self
    }

    /// Entries never expire unless written with a TTL.
    #[must_use]
    pub fn without_default_ttl(mut self) -> Self {
        self.default_ttl_ms = None;
        self
    }

    /// Set eviction strategy.
    #[must_use]
    pub fn with_strategy(mut self, strategy: EvictionStrategy) -> Self {
        self.strategy = strategy;
        self
    }

    /// Default TTL as a `Duration`.
    #[must_use]
    pub fn default_ttl(&self) -> Option<Duration> {
        self.default_ttl_ms.map(Duration::from_millis)
    }

    /// Check the configuration.
    ///
    /// # Errors
    /// Returns [`CacheError::InvalidConfig`] for an empty name, zero
    /// capacity or a zero default TTL.
    pub fn validate(&self) -> CacheResult<()> {
        if self.name.is_empty() {
            return Err(CacheError::invalid_config("tier name must not be empty"));
        }
        if self.max_size == 0 {
            return Err(CacheError::invalid_config(format!(
                "tier {}: max_size must be positive",
                self.name
            )));
        }
        if self.default_ttl_ms == Some(0) {
            return Err(CacheError::invalid_config(format!(
                "tier {}: default_ttl_ms must be positive (omit it for no expiry)",
                self.name
            )));
        }
        Ok(())
    }
}

impl Default for TierConfig {
    fn default() -> Self {
        Self {
            name: "l1".to_string(),
            max_size: TIER_L1_ENTRIES_COUNT_DEFAULT,
            default_ttl_ms: Some(TIER_L1_TTL_MS_DEFAULT),
            strategy: EvictionStrategy::Lru,
        }
    }
}
