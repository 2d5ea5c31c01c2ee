//! Simulation - DST Test Harness
//!
//! `TigerStyle`: One seed drives the clock, the RNG and every durable fault,
//! so a failing run replays exactly.

use std::future::Future;
use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde::Serialize;

use strata_core::dst::{
    DeterministicRng, FaultConfig, FaultInjector, FaultInjectorBuilder, SimClock, SimConfig,
};

use crate::error::CacheResult;
use crate::gc::{GarbageCollector, GcConfig};
use crate::hierarchy::{HierarchicalMemory, HierarchyConfig};
use crate::manager::{CacheConfig, CacheManager};
use crate::storage::SimDurableStore;

/// Everything a simulated test needs, wired to one clock and one injector.
pub struct SimEnvironment {
    /// Simulation configuration
    pub config: SimConfig,
    /// Simulated clock
    pub clock: SimClock,
    /// Deterministic RNG, independent of the fault schedule
    pub rng: DeterministicRng,
    /// Fault injector shared with `store`
    pub faults: Arc<FaultInjector>,
    /// Simulated durable store
    pub store: SimDurableStore,
}

impl SimEnvironment {
    /// Advance simulated time in milliseconds.
    pub fn advance_time_ms(&self, ms: u64) -> u64 {
        self.clock.advance_ms(ms)
    }

    /// Advance simulated time in seconds.
    pub fn advance_time_secs(&self, secs: u64) -> u64 {
        self.clock.advance_secs(secs)
    }

    /// Current simulated time in milliseconds.
    #[must_use]
    pub fn now_ms(&self) -> u64 {
        self.clock.now_ms()
    }

    /// A cache manager on the simulated clock.
    ///
    /// The periodic sweeper is disabled; drive expiry with
    /// [`CacheManager::sweep_expired`] after advancing the clock.
    ///
    /// # Errors
    /// Returns the manager's configuration error, if any.
    pub fn cache_manager<T>(&self, config: CacheConfig) -> CacheResult<CacheManager<T>>
    where
        T: Clone + Serialize + Send + Sync + 'static,
    {
        CacheManager::with_clock(config.without_sweeper(), self.clock.shared())
    }

    /// A hierarchical memory whose long-term tier is this environment's store.
    ///
    /// # Errors
    /// Returns the hierarchy's configuration error, if any.
    pub fn hierarchy<T>(&self, config: HierarchyConfig) -> CacheResult<HierarchicalMemory<T>>
    where
        T: Clone + Serialize + DeserializeOwned + Send + Sync + 'static,
    {
        HierarchicalMemory::with_clock(config, Arc::new(self.store.clone()), self.clock.shared())
    }

    /// A garbage collector measuring ages on the simulated clock.
    ///
    /// # Errors
    /// Returns the collector's configuration error, if any.
    pub fn garbage_collector<T>(&self, config: GcConfig) -> CacheResult<GarbageCollector<T>>
    where
        T: Serialize + Send + 'static,
    {
        GarbageCollector::with_clock(config, self.clock.shared())
    }
}

/// Builder for a deterministic simulation run.
#[derive(Debug)]
pub struct Simulation {
    config: SimConfig,
    fault_configs: Vec<FaultConfig>,
}

impl Simulation {
    /// Create a simulation with no faults registered.
    #[must_use]
    pub fn new(config: SimConfig) -> Self {
        Self {
            config,
            fault_configs: Vec::new(),
        }
    }

    /// Register a fault.
    #[must_use]
    pub fn with_fault(mut self, config: FaultConfig) -> Self {
        self.fault_configs.push(config);
        self
    }

    /// Fail every durable operation with the given probability.
    #[must_use]
    pub fn with_durable_faults(self, probability: f64) -> Self {
        use strata_core::dst::FaultType;

        self.with_fault(FaultConfig::new(FaultType::DurableReadFail, probability))
            .with_fault(FaultConfig::new(FaultType::DurableWriteFail, probability))
            .with_fault(FaultConfig::new(FaultType::DurableDeleteFail, probability))
    }

    /// Run `test_fn` against a freshly built environment.
    ///
    /// # Errors
    /// Returns whatever error the test function returns.
    pub async fn run<F, Fut, E>(self, test_fn: F) -> Result<(), E>
    where
        F: FnOnce(SimEnvironment) -> Fut,
        Fut: Future<Output = Result<(), E>>,
    {
        let env = self.build();
        let seed = env.config.seed();
        let result = test_fn(env).await;
        if result.is_err() {
            tracing::warn!(seed, "simulation failed; rerun with DST_SEED={seed}");
        }
        result
    }

    /// Build the environment without running anything.
    #[must_use]
    pub fn build(self) -> SimEnvironment {
        let mut rng = DeterministicRng::new(self.config.seed());
        let clock = SimClock::new();

        let faults = Arc::new(
            self.fault_configs
                .into_iter()
                .fold(FaultInjectorBuilder::new(rng.fork()), FaultInjectorBuilder::with_fault)
                .build(),
        );

        let store = SimDurableStore::new()
            .with_fault_injector(Arc::clone(&faults))
            .with_clock(clock.shared());

        SimEnvironment {
            config: self.config,
            clock,
            rng,
            faults,
            store,
        }
    }
}

/// Create a simulation from an explicit seed, or from `DST_SEED` / a random
/// seed when `None`.
#[must_use]
pub fn create_simulation(seed: Option<u64>) -> Simulation {
    let config = match seed {
        Some(s) => SimConfig::with_seed(s),
        None => SimConfig::from_env_or_random(),
    };
    Simulation::new(config)
}
