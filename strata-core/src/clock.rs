//! Clock - Time Source Abstraction
//!
//! `TigerStyle`: All timestamps flow through one injectable source so that
//! TTL expiry and age-based policies can be driven deterministically.

use std::fmt::Debug;
use std::sync::Arc;
use std::time::Instant;

/// A monotonic millisecond time source.
///
/// Production code uses [`SystemClock`]; simulation tests use
/// [`SimClock`](crate::dst::SimClock) and advance time explicitly.
pub trait Clock: Send + Sync + Debug {
    /// Milliseconds elapsed since the clock's origin. Never decreases.
    fn now_ms(&self) -> u64;
}

/// Shared handle to a clock.
pub type SharedClock = Arc<dyn Clock>;

/// Wall-independent monotonic clock backed by [`Instant`].
#[derive(Debug, Clone, Copy)]
pub struct SystemClock {
    origin: Instant,
}

impl SystemClock {
    /// Create a clock whose origin is "now".
    #[must_use]
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
        }
    }

    /// Create a shared system clock.
    #[must_use]
    pub fn shared() -> SharedClock {
        Arc::new(Self::new())
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for SystemClock {
    fn now_ms(&self) -> u64 {
        u64::try_from(self.origin.elapsed().as_millis()).unwrap_or(u64::MAX)
    }
}
