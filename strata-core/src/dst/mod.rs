//! DST - Deterministic Simulation Testing
//!
//! TigerBeetle/FoundationDB-style simulation primitives.
//!
//! - [`SimClock`] drives TTL expiry and GC age without sleeping
//! - [`FaultInjector`] fails durable-store calls on a seeded schedule
//! - [`PropertyTest`] runs random operation sequences against invariants
//!
//! Run with an explicit seed for reproducibility:
//! ```bash
//! DST_SEED=12345 cargo test
//! ```

mod clock;
mod config;
mod fault;
mod property;
mod rng;

pub use clock::SimClock;
pub use config::{SimConfig, DST_SEED_ENV};
pub use fault::{FaultConfig, FaultInjector, FaultInjectorBuilder, FaultType};
pub use property::{
    run_property_tests, test_seeds, PropertyTest, PropertyTestFailure, PropertyTestResult,
    PropertyTestable, TimeAdvanceConfig,
};
pub use rng::DeterministicRng;
