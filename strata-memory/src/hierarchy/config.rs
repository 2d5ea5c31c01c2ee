//! Hierarchical Memory Configuration
//!
//! `TigerStyle`: Explicit limits and TTLs, defaults from constants.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::constants::{
    DURABLE_KEY_PREFIX_DEFAULT, DURABLE_TIMEOUT_MS_DEFAULT, IMPORTANCE_CRITICAL_TTL_MS,
    IMPORTANCE_HIGH_TTL_MS, IMPORTANCE_LOW_TTL_MS, IMPORTANCE_NORMAL_TTL_MS,
    SHORT_TERM_MEMORY_ENTRIES_COUNT_DEFAULT, SHORT_TERM_MEMORY_TTL_MS_DEFAULT,
    WORKING_MEMORY_ENTRIES_COUNT_DEFAULT, WORKING_MEMORY_TTL_MS_DEFAULT,
};
use crate::error::{CacheError, CacheResult};
use crate::item::Importance;

/// Configuration for [`super::HierarchicalMemory`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HierarchyConfig {
    /// Working memory capacity (entries)
    pub working_max_entries: usize,
    /// Working memory TTL
    pub working_ttl_ms: u64,
    /// Short-term memory capacity (entries)
    pub short_term_max_entries: usize,
    /// Short-term TTL for values promoted out of long-term memory
    pub short_term_ttl_ms: u64,
    /// Short-term TTL for `critical` values
    pub critical_ttl_ms: u64,
    /// Short-term TTL for `high` values
    pub high_ttl_ms: u64,
    /// Short-term TTL for `normal` values
    pub normal_ttl_ms: u64,
    /// Working TTL for `low` values
    pub low_ttl_ms: u64,
    /// Bound on each durable-store call
    pub durable_timeout_ms: u64,
    /// Prefix for durable-store keys
    pub durable_key_prefix: String,
    /// TTL for durable records; `None` keeps them until forgotten
    pub durable_ttl_ms: Option<u64>,
}

/// Where one importance class is written.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Placement {
    pub(crate) working: Option<Duration>,
    pub(crate) short_term: Option<Duration>,
    pub(crate) long_term: bool,
}

impl HierarchyConfig {
    /// Set working memory capacity.
    #[must_use]
    pub fn with_working_max_entries(mut self, entries: usize) -> Self {
        self.working_max_entries = entries;
        self
    }

    /// Set short-term memory capacity.
    #[must_use]
    pub fn with_short_term_max_entries(mut self, entries: usize) -> Self {
        self.short_term_max_entries = entries;
        self
    }

    /// Set the working memory TTL.
    #[must_use]
    pub fn with_working_ttl(mut self, ttl: Duration) -> Self {
        self.working_ttl_ms = millis(ttl);
        self
    }

    /// Set the durable call timeout.
    #[must_use]
    pub fn with_durable_timeout(mut self, timeout: Duration) -> Self {
        self.durable_timeout_ms = millis(timeout);
        self
    }

    /// Set the durable key prefix.
    #[must_use]
    pub fn with_durable_key_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.durable_key_prefix = prefix.into();
        self
    }

    /// Expire durable records after `ttl`.
    #[must_use]
    pub fn with_durable_ttl(mut self, ttl: Duration) -> Self {
        self.durable_ttl_ms = Some(millis(ttl));
        self
    }

    /// Durable call timeout as a `Duration`.
    #[must_use]
    pub fn durable_timeout(&self) -> Duration {
        Duration::from_millis(self.durable_timeout_ms)
    }

    pub(crate) fn placement(&self, importance: Importance) -> Placement {
        let working = Some(Duration::from_millis(self.working_ttl_ms));
        match importance {
            Importance::Critical => Placement {
                working,
                short_term: Some(Duration::from_millis(self.critical_ttl_ms)),
                long_term: true,
            },
            Importance::High => Placement {
                working: None,
                short_term: Some(Duration::from_millis(self.high_ttl_ms)),
                long_term: true,
            },
            Importance::Normal => Placement {
                working,
                short_term: Some(Duration::from_millis(self.normal_ttl_ms)),
                long_term: false,
            },
            Importance::Low => Placement {
                working: Some(Duration::from_millis(self.low_ttl_ms)),
                short_term: None,
                long_term: false,
            },
        }
    }

    /// Check the configuration.
    ///
    /// # Errors
    /// Returns [`CacheError::InvalidConfig`] for zero capacities, TTLs or
    /// timeout.
    pub fn validate(&self) -> CacheResult<()> {
        if self.working_max_entries == 0 || self.short_term_max_entries == 0 {
            return Err(CacheError::invalid_config(
                "memory tier capacities must be positive",
            ));
        }
        let ttls = [
            ("working_ttl_ms", self.working_ttl_ms),
            ("short_term_ttl_ms", self.short_term_ttl_ms),
            ("critical_ttl_ms", self.critical_ttl_ms),
            ("high_ttl_ms", self.high_ttl_ms),
            ("normal_ttl_ms", self.normal_ttl_ms),
            ("low_ttl_ms", self.low_ttl_ms),
            ("durable_timeout_ms", self.durable_timeout_ms),
        ];
        if let Some((field, _)) = ttls.iter().find(|(_, value)| *value == 0) {
            return Err(CacheError::invalid_config(format!("{field} must be positive")));
        }
        if self.durable_ttl_ms == Some(0) {
            return Err(CacheError::invalid_config("durable_ttl_ms must be positive"));
        }
        Ok(())
    }
}

fn millis(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}

impl Default for HierarchyConfig {
    fn default() -> Self {
        Self {
            working_max_entries: WORKING_MEMORY_ENTRIES_COUNT_DEFAULT,
            working_ttl_ms: WORKING_MEMORY_TTL_MS_DEFAULT,
            short_term_max_entries: SHORT_TERM_MEMORY_ENTRIES_COUNT_DEFAULT,
            short_term_ttl_ms: SHORT_TERM_MEMORY_TTL_MS_DEFAULT,
            critical_ttl_ms: IMPORTANCE_CRITICAL_TTL_MS,
            high_ttl_ms: IMPORTANCE_HIGH_TTL_MS,
            normal_ttl_ms: IMPORTANCE_NORMAL_TTL_MS,
            low_ttl_ms: IMPORTANCE_LOW_TTL_MS,
            durable_timeout_ms: DURABLE_TIMEOUT_MS_DEFAULT,
            durable_key_prefix: DURABLE_KEY_PREFIX_DEFAULT.to_string(),
            durable_ttl_ms: None,
        }
    }
}
