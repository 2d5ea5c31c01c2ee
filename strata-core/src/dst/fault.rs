//! FaultInjector - Probabilistic Fault Injection
//!
//! TigerStyle: Explicit fault injection for chaos testing of the durable tier.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

use super::rng::DeterministicRng;
use crate::constants::DST_FAULT_PROBABILITY_MAX;

/// Types of faults that can be injected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FaultType {
    /// Durable read fails (store unreachable)
    DurableReadFail,
    /// Durable write fails
    DurableWriteFail,
    /// Durable delete fails
    DurableDeleteFail,
    /// Durable read returns garbled bytes
    DurableCorruption,
    /// Durable call stalls long enough to hit the caller's timeout
    DurableLatency,
}

impl FaultType {
    /// Get the fault type name as a string.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::DurableReadFail => "durable_read_fail",
            Self::DurableWriteFail => "durable_write_fail",
            Self::DurableDeleteFail => "durable_delete_fail",
            Self::DurableCorruption => "durable_corruption",
            Self::DurableLatency => "durable_latency",
        }
    }

    /// Whether this fault can fire for the named operation.
    ///
    /// Operation names are `durable_read`, `durable_write` and `durable_delete`.
    #[must_use]
    pub fn applies_to(&self, operation: &str) -> bool {
        match self {
            Self::DurableReadFail | Self::DurableCorruption => operation == "durable_read",
            Self::DurableWriteFail => operation == "durable_write",
            Self::DurableDeleteFail => operation == "durable_delete",
            Self::DurableLatency => operation.starts_with("durable_"),
        }
    }
}

/// Configuration for a specific fault.
#[derive(Debug, Clone)]
pub struct FaultConfig {
    /// The type of fault
    pub fault_type: FaultType,
    /// Probability of injection (0.0 to 1.0)
    pub probability: f64,
    /// Optional key filter (substring match on the key being accessed)
    pub key_filter: Option<String>,
    /// Maximum number of injections (None = unlimited)
    pub max_injections: Option<u64>,
}

impl FaultConfig {
    /// Create a new fault configuration.
    ///
    /// # Panics
    /// Panics if probability is not in [0, 1].
    #[must_use]
    pub fn new(fault_type: FaultType, probability: f64) -> Self {
        assert!(
            (0.0..=DST_FAULT_PROBABILITY_MAX).contains(&probability),
            "probability must be in [0, {DST_FAULT_PROBABILITY_MAX}], got {probability}"
        );

        Self {
            fault_type,
            probability,
            key_filter: None,
            max_injections: None,
        }
    }

    /// Only inject for keys containing `filter`.
    #[must_use]
    pub fn with_key_filter(mut self, filter: impl Into<String>) -> Self {
        self.key_filter = Some(filter.into());
        self
    }

    /// Set maximum number of injections.
    ///
    /// # Panics
    /// Panics if `max` is zero.
    #[must_use]
    pub fn with_max_injections(mut self, max: u64) -> Self {
        assert!(max > 0, "max_injections must be positive");
        self.max_injections = Some(max);
        self
    }
}

#[derive(Debug)]
struct InjectorState {
    rng: DeterministicRng,
    counts: HashMap<FaultType, u64>,
}

/// Fault injector for simulation testing.
///
/// TigerStyle:
/// - Explicit fault registration (before sharing via `Arc`)
/// - Deterministic through RNG
/// - Injection counts tracked per fault type
#[derive(Debug)]
pub struct FaultInjector {
    configs: Vec<FaultConfig>,
    state: Mutex<InjectorState>,
}

impl FaultInjector {
    /// Create a fault injector with no faults registered.
    #[must_use]
    pub fn new(rng: DeterministicRng) -> Self {
        Self {
            configs: Vec::new(),
            state: Mutex::new(InjectorState {
                rng,
                counts: HashMap::new(),
            }),
        }
    }

    /// A fault injector that never fires.
    #[must_use]
    pub fn disabled() -> Self {
        Self::new(DeterministicRng::new(0))
    }

    /// Register a fault configuration.
    pub fn register(&mut self, config: FaultConfig) {
        self.lock_state().counts.entry(config.fault_type).or_insert(0);
        self.configs.push(config);
    }

    /// Check whether a fault fires for `operation`, ignoring keys.
    pub fn should_inject(&self, operation: &str) -> Option<FaultType> {
        self.should_inject_for(operation, "")
    }

    /// Check whether a fault fires for `operation` on `key`.
    ///
    /// Returns the first registered fault that applies and wins its roll.
    pub fn should_inject_for(&self, operation: &str, key: &str) -> Option<FaultType> {
        if self.configs.is_empty() {
            return None;
        }

        let mut state = self.lock_state();
        for config in &self.configs {
            if !config.fault_type.applies_to(operation) {
                continue;
            }
            if let Some(filter) = &config.key_filter {
                if !key.contains(filter.as_str()) {
                    continue;
                }
            }
            let count = state.counts.get(&config.fault_type).copied().unwrap_or(0);
            if config.max_injections.is_some_and(|max| count >= max) {
                continue;
            }
            if state.rng.next_bool(config.probability) {
                *state.counts.entry(config.fault_type).or_insert(0) += 1;
                return Some(config.fault_type);
            }
        }

        None
    }

    /// Injection counts keyed by fault name.
    #[must_use]
    pub fn injection_stats(&self) -> HashMap<String, u64> {
        self.lock_state()
            .counts
            .iter()
            .map(|(fault, count)| (fault.as_str().to_string(), *count))
            .collect()
    }

    /// Total number of injections across all fault types.
    #[must_use]
    pub fn total_injections(&self) -> u64 {
        self.lock_state().counts.values().sum()
    }

    /// Reset injection counts (re-arms `max_injections` limits).
    pub fn reset_stats(&self) {
        for count in self.lock_state().counts.values_mut() {
            *count = 0;
        }
    }

    fn lock_state(&self) -> MutexGuard<'_, InjectorState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Builder for [`FaultInjector`].
///
/// TigerStyle: configure everything, then share via `Arc`.
#[derive(Debug)]
pub struct FaultInjectorBuilder {
    rng: DeterministicRng,
    configs: Vec<FaultConfig>,
}

impl FaultInjectorBuilder {
    /// Create a new builder with the given RNG.
    #[must_use]
    pub fn new(rng: DeterministicRng) -> Self {
        Self {
            rng,
            configs: Vec::new(),
        }
    }

    /// Add a fault configuration.
    #[must_use]
    pub fn with_fault(mut self, config: FaultConfig) -> Self {
        self.configs.push(config);
        self
    }

    /// Fail every durable read, write and delete with the given probability.
    #[must_use]
    pub fn with_durable_outage(self, probability: f64) -> Self {
        self.with_fault(FaultConfig::new(FaultType::DurableReadFail, probability))
            .with_fault(FaultConfig::new(FaultType::DurableWriteFail, probability))
            .with_fault(FaultConfig::new(FaultType::DurableDeleteFail, probability))
    }

    /// Build the injector.
    #[must_use]
    pub fn build(self) -> FaultInjector {
        let mut injector = FaultInjector::new(self.rng);
        for config in self.configs {
            injector.register(config);
        }
        injector
    }
}
