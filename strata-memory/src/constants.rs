//! `TigerStyle` Constants
//!
//! All limits use big-endian naming: `CATEGORY_SPECIFICS_UNIT_LIMIT`
//! Example: `TIER_L1_TTL_MS_DEFAULT` (not `DEFAULT_L1_TTL`)
//!
//! Every constant includes units in the name:
//! - _`BYTES_MAX` for size limits
//! - _`MS_DEFAULT` / _`SECS_DEFAULT` for durations
//! - _`COUNT_DEFAULT` / _`COUNT_MAX` for quantities

pub use strata_core::constants::{TIME_MS_PER_DAY, TIME_MS_PER_MIN, TIME_MS_PER_SEC};

// =============================================================================
// Keys
// =============================================================================

/// Maximum key length accepted by any tier
pub const KEY_BYTES_MAX: usize = 256;

// =============================================================================
// Cache Manager Tiers
// =============================================================================

/// Default L1 capacity (entries)
pub const TIER_L1_ENTRIES_COUNT_DEFAULT: usize = 1_000;

/// Default L1 TTL
pub const TIER_L1_TTL_MS_DEFAULT: u64 = 60 * TIME_MS_PER_SEC; // 1 minute

/// Default L2 capacity (entries)
pub const TIER_L2_ENTRIES_COUNT_DEFAULT: usize = 10_000;

/// Default L2 TTL
pub const TIER_L2_TTL_MS_DEFAULT: u64 = 5 * TIME_MS_PER_MIN; // 5 minutes

/// Default L3 capacity (entries)
pub const TIER_L3_ENTRIES_COUNT_DEFAULT: usize = 100_000;

/// Default L3 TTL
pub const TIER_L3_TTL_MS_DEFAULT: u64 = 60 * TIME_MS_PER_MIN; // 1 hour

/// Interval between background expiry sweeps
pub const CACHE_CHECK_PERIOD_MS_DEFAULT: u64 = 60 * TIME_MS_PER_SEC;

/// Timeout applied to `prefetch` loaders unless overridden
pub const CACHE_PREFETCH_TIMEOUT_MS_DEFAULT: u64 = 30 * TIME_MS_PER_SEC;

/// Capacity of the cache event broadcast channel
pub const CACHE_EVENT_CHANNEL_CAPACITY_DEFAULT: usize = 1_024;

// =============================================================================
// Hierarchical Memory
// =============================================================================

/// Working memory capacity (entries)
pub const WORKING_MEMORY_ENTRIES_COUNT_DEFAULT: usize = 1_000;

/// Working memory TTL (also used for promotions into working memory)
pub const WORKING_MEMORY_TTL_MS_DEFAULT: u64 = 5 * TIME_MS_PER_MIN;

/// Short-term memory capacity (entries)
pub const SHORT_TERM_MEMORY_ENTRIES_COUNT_DEFAULT: usize = 10_000;

/// Short-term memory TTL for promotions out of long-term memory
pub const SHORT_TERM_MEMORY_TTL_MS_DEFAULT: u64 = 30 * TIME_MS_PER_MIN;

/// Short-term TTL for `critical` memories
pub const IMPORTANCE_CRITICAL_TTL_MS: u64 = TIME_MS_PER_DAY;

/// Short-term TTL for `high` memories
pub const IMPORTANCE_HIGH_TTL_MS: u64 = 60 * TIME_MS_PER_MIN;

/// Short-term TTL for `normal` memories
pub const IMPORTANCE_NORMAL_TTL_MS: u64 = 30 * TIME_MS_PER_MIN;

/// Working TTL for `low` memories
pub const IMPORTANCE_LOW_TTL_MS: u64 = 5 * TIME_MS_PER_MIN;

/// Default relevance assigned to new memory items
pub const MEMORY_RELEVANCE_DEFAULT: f64 = 0.5;

/// Minimum relevance
pub const MEMORY_RELEVANCE_MIN: f64 = 0.0;

/// Maximum relevance
pub const MEMORY_RELEVANCE_MAX: f64 = 1.0;

/// Timeout for a single durable-store call
pub const DURABLE_TIMEOUT_MS_DEFAULT: u64 = 5 * TIME_MS_PER_SEC;

/// Prefix applied to keys written to the durable store
pub const DURABLE_KEY_PREFIX_DEFAULT: &str = "strata:ltm:";

// =============================================================================
// Garbage Collection
// =============================================================================

/// Bytes per megabyte
pub const BYTES_PER_MB: u64 = 1024 * 1024;

/// Memory budget for tracked items
pub const GC_MAX_MEMORY_MB_DEFAULT: u64 = 512;

/// Items older than this are collected
pub const GC_MAX_AGE_DAYS_DEFAULT: u64 = 30;

/// Items with relevance below this are collected
pub const GC_MIN_RELEVANCE_DEFAULT: f64 = 0.3;

/// Interval between GC cycles
pub const GC_INTERVAL_SECS_DEFAULT: u64 = 300;

/// Accesses per minute below which an item counts as inactive
pub const GC_LOW_ACTIVITY_PER_MIN_DEFAULT: f64 = 0.01;

/// Fraction of the memory budget that must be in use before a cycle scans
pub const GC_PRESSURE_RATIO_DEFAULT: f64 = 0.8;

/// Items younger than this have no meaningful access rate
pub const GC_ACCESS_RATE_AGE_MS_MIN: u64 = TIME_MS_PER_MIN;
