//! DST - Deterministic Simulation Testing
//!
//! Re-exports the `strata-core` primitives and adds [`Simulation`], which
//! wires a [`SimClock`], a seeded [`FaultInjector`] and a
//! [`SimDurableStore`](crate::storage::SimDurableStore) into one
//! environment.
//!
//! ```rust
//! use strata_memory::dst::{Simulation, SimConfig};
//! use strata_memory::{CacheConfig, CacheError};
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() {
//! Simulation::new(SimConfig::with_seed(42))
//!     .with_durable_faults(0.1)
//!     .run(|env| async move {
//!         let cache = env.cache_manager::<u64>(CacheConfig::default())?;
//!         cache.set("answer", 42, None).await?;
//!         env.advance_time_secs(30);
//!         assert_eq!(cache.get("answer").await?, Some(42));
//!         Ok::<(), CacheError>(())
//!     })
//!     .await
//!     .unwrap();
//! # }
//! ```

mod simulation;

pub use simulation::{create_simulation, SimEnvironment, Simulation};
pub use strata_core::dst::{
    run_property_tests, test_seeds, DeterministicRng, FaultConfig, FaultInjector,
    FaultInjectorBuilder, FaultType, PropertyTest, PropertyTestFailure, PropertyTestResult,
    PropertyTestable, SimClock, SimConfig, TimeAdvanceConfig, DST_SEED_ENV,
};
