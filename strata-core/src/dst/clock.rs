//! SimClock - Simulated Time
//!
//! TigerStyle: Deterministic, controllable time for simulation.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use crate::clock::{Clock, SharedClock};
use crate::constants::{DST_TIME_ADVANCE_MS_MAX, TIME_MS_PER_DAY, TIME_MS_PER_MIN, TIME_MS_PER_SEC};

/// A simulated clock for deterministic testing.
///
/// TigerStyle:
/// - Time only moves forward
/// - All time operations are explicit
/// - Clones share the same underlying time
#[derive(Debug, Clone, Default)]
pub struct SimClock {
    current_ms: Arc<AtomicU64>,
}

impl SimClock {
    /// Create a new clock starting at time zero.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a clock starting at the given millisecond timestamp.
    #[must_use]
    pub fn at_ms(start_ms: u64) -> Self {
        Self {
            current_ms: Arc::new(AtomicU64::new(start_ms)),
        }
    }

    /// Get current time in milliseconds.
    #[must_use]
    pub fn now_ms(&self) -> u64 {
        self.current_ms.load(Ordering::SeqCst)
    }

    /// Advance time by the given milliseconds, returning the new time.
    ///
    /// # Panics
    /// Panics if `ms` exceeds `DST_TIME_ADVANCE_MS_MAX`.
    pub fn advance_ms(&self, ms: u64) -> u64 {
        assert!(
            ms <= DST_TIME_ADVANCE_MS_MAX,
            "advance_ms({ms}) exceeds max ({DST_TIME_ADVANCE_MS_MAX})"
        );

        let old_time = self.current_ms.fetch_add(ms, Ordering::SeqCst);
        old_time.saturating_add(ms)
    }

    /// Advance time by whole seconds.
    pub fn advance_secs(&self, secs: u64) -> u64 {
        self.advance_ms(secs * TIME_MS_PER_SEC)
    }

    /// Advance time by whole minutes.
    pub fn advance_mins(&self, mins: u64) -> u64 {
        self.advance_ms(mins * TIME_MS_PER_MIN)
    }

    /// Advance time by whole days.
    pub fn advance_days(&self, days: u64) -> u64 {
        self.advance_ms(days * TIME_MS_PER_DAY)
    }

    /// Set time to an absolute value.
    ///
    /// # Panics
    /// Panics if the new time is earlier than the current time.
    pub fn set_ms(&self, ms: u64) {
        let current = self.now_ms();
        assert!(ms >= current, "cannot set time backwards: {ms} < {current}");
        self.current_ms.store(ms, Ordering::SeqCst);
    }

    /// Elapsed milliseconds since `since` (saturating at zero).
    #[must_use]
    pub fn elapsed_since(&self, since: u64) -> u64 {
        self.now_ms().saturating_sub(since)
    }

    /// A type-erased handle sharing this clock's time.
    #[must_use]
    pub fn shared(&self) -> SharedClock {
        Arc::new(self.clone())
    }
}

impl Clock for SimClock {
    fn now_ms(&self) -> u64 {
        SimClock::now_ms(self)
    }
}
