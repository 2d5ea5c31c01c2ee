//! `TigerStyle` Constants
//!
//! All limits use big-endian naming: `CATEGORY_SPECIFICS_UNIT_LIMIT`.
//! Every constant includes units in the name (`_MS`, `_COUNT_MAX`, ...).

// =============================================================================
// Time
// =============================================================================

/// Milliseconds per second
pub const TIME_MS_PER_SEC: u64 = 1000;

/// Milliseconds per minute
pub const TIME_MS_PER_MIN: u64 = 60 * TIME_MS_PER_SEC;

/// Milliseconds per day
pub const TIME_MS_PER_DAY: u64 = 24 * 60 * TIME_MS_PER_MIN;

// =============================================================================
// DST (Deterministic Simulation Testing) Limits
// =============================================================================

/// Maximum number of simulation steps
pub const DST_SIMULATION_STEPS_MAX: u64 = 1_000_000;

/// Maximum probability for fault injection (1.0 = 100%)
pub const DST_FAULT_PROBABILITY_MAX: f64 = 1.0;

/// Maximum time advance per step in milliseconds.
///
/// Large enough to push tracked items past a multi-week age policy in one step.
pub const DST_TIME_ADVANCE_MS_MAX: u64 = 90 * TIME_MS_PER_DAY;

/// Default number of operations in a property test run
pub const DST_PROPERTY_OPERATIONS_COUNT_DEFAULT: u64 = 100;
