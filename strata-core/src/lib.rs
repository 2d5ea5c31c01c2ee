//! Strata Core - Time and Simulation Primitives
//!
//! `TigerStyle` simulation-first foundation for the strata cache and memory
//! tiers.
//!
//! # Philosophy
//!
//! > "If you're not testing with fault injection, you're not testing."
//!
//! Every time-dependent decision in strata (TTL expiry, LRU recency, GC age)
//! reads a [`Clock`]. Tests swap in a [`SimClock`] and move time by hand;
//! durable-store failures come from a seeded [`FaultInjector`].
//!
//! # Usage
//!
//! ```rust
//! use strata_core::dst::{FaultConfig, FaultInjectorBuilder, FaultType, DeterministicRng};
//! use strata_core::SimClock;
//!
//! let clock = SimClock::new();
//! clock.advance_ms(1500);
//! assert_eq!(clock.now_ms(), 1500);
//!
//! let faults = FaultInjectorBuilder::new(DeterministicRng::new(42))
//!     .with_fault(FaultConfig::new(FaultType::DurableWriteFail, 1.0))
//!     .build();
//! assert!(faults.should_inject("durable_write").is_some());
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![allow(clippy::module_name_repetitions)]

pub mod clock;
pub mod constants;
pub mod dst;

pub use clock::{Clock, SharedClock, SystemClock};
pub use constants::*;
pub use dst::{
    run_property_tests, test_seeds, DeterministicRng, FaultConfig, FaultInjector,
    FaultInjectorBuilder, FaultType, PropertyTest, PropertyTestFailure, PropertyTestResult,
    PropertyTestable, SimClock, SimConfig, TimeAdvanceConfig,
};
