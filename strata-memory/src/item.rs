//! Memory Items and Importance Classes

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::constants::{MEMORY_RELEVANCE_DEFAULT, MEMORY_RELEVANCE_MAX, MEMORY_RELEVANCE_MIN};
use crate::error::CacheError;

/// Importance class; decides which memory tiers a value is written to.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum Importance {
    /// Working memory only
    Low,
    /// Working and short-term memory
    #[default]
    Normal,
    /// Short-term and long-term memory
    High,
    /// Every tier
    Critical,
}

impl Importance {
    /// All classes, lowest first.
    #[must_use]
    pub fn all() -> &'static [Importance] {
        &[Self::Low, Self::Normal, Self::High, Self::Critical]
    }

    /// Lowercase name.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Normal => "normal",
            Self::High => "high",
            Self::Critical => "critical",
        }
    }
}

impl fmt::Display for Importance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Importance {
    type Err = CacheError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "low" => Ok(Self::Low),
            "normal" => Ok(Self::Normal),
            "high" => Ok(Self::High),
            "critical" => Ok(Self::Critical),
            _ => Err(CacheError::InvalidImportance {
                value: s.to_string(),
            }),
        }
    }
}

/// The three levels of hierarchical memory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MemoryTier {
    /// Small, fast, short-lived
    Working,
    /// Larger, longer-lived
    ShortTerm,
    /// Durable store
    LongTerm,
}

impl fmt::Display for MemoryTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Working => "working",
            Self::ShortTerm => "short_term",
            Self::LongTerm => "long_term",
        })
    }
}

/// A value with the metadata used for routing and garbage collection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MemoryItem<T> {
    /// Stored value
    pub value: T,
    /// Importance class
    pub importance: Importance,
    /// Relevance in `[0, 1]`
    pub relevance: f64,
    /// Recorded accesses
    pub access_count: u64,
    /// Creation time in milliseconds of the writing clock.
    ///
    /// [`strata_core::SystemClock`] counts from process start, so after a
    /// record is reloaded from durable storage by another process this is
    /// not comparable with that process's clock.
    pub timestamp_ms: u64,
}

impl<T> MemoryItem<T> {
    /// New item with default relevance and no accesses.
    #[must_use]
    pub fn new(value: T, importance: Importance, timestamp_ms: u64) -> Self {
        Self {
            value,
            importance,
            relevance: MEMORY_RELEVANCE_DEFAULT,
            access_count: 0,
            timestamp_ms,
        }
    }

    /// Set relevance, clamped to `[0, 1]`.
    #[must_use]
    pub fn with_relevance(mut self, relevance: f64) -> Self {
        self.relevance = clamp_relevance(relevance);
        self
    }

    /// Age relative to `now_ms`.
    #[must_use]
    pub fn age_ms(&self, now_ms: u64) -> u64 {
        now_ms.saturating_sub(self.timestamp_ms)
    }
}

/// Clamp to `[0, 1]`; NaN becomes the minimum.
#[must_use]
pub fn clamp_relevance(relevance: f64) -> f64 {
    if relevance.is_nan() {
        MEMORY_RELEVANCE_MIN
    } else {
        relevance.clamp(MEMORY_RELEVANCE_MIN, MEMORY_RELEVANCE_MAX)
    }
}
