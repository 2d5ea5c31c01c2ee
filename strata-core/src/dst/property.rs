//! Property-Based Testing for DST
//!
//! TigerStyle: Random operation sequences with invariant checking.
//!
//! Each run is driven by one seed: the same seed replays the same operations
//! and the same time advances, so a failing invariant is reproducible.
//!
//! ```rust
//! use strata_core::dst::{DeterministicRng, PropertyTest, PropertyTestable, SimClock};
//!
//! struct Bounded { len: usize, max: usize }
//!
//! #[derive(Debug, Clone)]
//! enum Op { Push, Pop }
//!
//! impl PropertyTestable for Bounded {
//!     type Operation = Op;
//!
//!     fn generate_operation(&self, rng: &mut DeterministicRng) -> Op {
//!         if rng.next_bool(0.6) { Op::Push } else { Op::Pop }
//!     }
//!
//!     fn apply_operation(&mut self, op: &Op, _clock: &SimClock) {
//!         match op {
//!             Op::Push => self.len = (self.len + 1).min(self.max),
//!             Op::Pop => self.len = self.len.saturating_sub(1),
//!         }
//!     }
//!
//!     fn check_invariants(&self) -> Result<(), String> {
//!         if self.len > self.max { Err(format!("len {} > max {}", self.len, self.max)) } else { Ok(()) }
//!     }
//! }
//!
//! PropertyTest::new(42).with_max_operations(500).run_and_assert(Bounded { len: 0, max: 8 });
//! ```

use std::fmt::Debug;

use super::clock::SimClock;
use super::config::SimConfig;
use super::rng::DeterministicRng;
use crate::constants::{DST_PROPERTY_OPERATIONS_COUNT_DEFAULT, DST_SIMULATION_STEPS_MAX};

/// Trait for systems that can be property-tested.
pub trait PropertyTestable {
    /// The type of operations that can be performed.
    type Operation: Debug + Clone;

    /// Generate a random operation based on current state.
    fn generate_operation(&self, rng: &mut DeterministicRng) -> Self::Operation;

    /// Apply an operation; `clock` is the run's simulated time.
    fn apply_operation(&mut self, op: &Self::Operation, clock: &SimClock);

    /// Check that all invariants hold.
    ///
    /// # Errors
    /// Returns a description of the first violated invariant.
    fn check_invariants(&self) -> Result<(), String>;

    /// Describe the current state for failure reports.
    fn describe_state(&self) -> String {
        String::from("(state description not implemented)")
    }
}

/// Result of a property test run.
#[derive(Debug)]
pub struct PropertyTestResult {
    /// Number of operations executed
    pub operations_executed: u64,
    /// Seed used for reproduction
    pub seed: u64,
    /// Failure details, if any
    pub failure: Option<PropertyTestFailure>,
}

impl PropertyTestResult {
    /// Check if the test passed.
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.failure.is_none()
    }

    /// Panic with reproduction details if the run failed.
    ///
    /// # Panics
    /// Panics if the test failed.
    pub fn unwrap(self) {
        if let Some(failure) = self.failure {
            panic!(
                "Property test failed!\n\
                 Seed: {} (replay with DST_SEED={})\n\
                 Operation #{}: {}\n\
                 Invariant violation: {}\n\
                 State: {}",
                self.seed,
                self.seed,
                failure.operation_index,
                failure.operation,
                failure.message,
                failure.state_description
            );
        }
    }
}

/// Details of a property test failure.
#[derive(Debug)]
pub struct PropertyTestFailure {
    /// Index of the failing operation (0-based)
    pub operation_index: u64,
    /// Debug rendering of the failing operation
    pub operation: String,
    /// The invariant violation message
    pub message: String,
    /// Description of the state at failure
    pub state_description: String,
}

/// How simulated time moves between operations.
#[derive(Debug, Clone)]
pub struct TimeAdvanceConfig {
    /// Minimum advance per step (ms)
    pub min_ms: u64,
    /// Maximum advance per step (ms)
    pub max_ms: u64,
    /// Probability of advancing at a given step
    pub probability: f64,
}

impl Default for TimeAdvanceConfig {
    fn default() -> Self {
        Self::random(0, 1000, 0.5)
    }
}

impl TimeAdvanceConfig {
    /// Time never moves.
    #[must_use]
    pub fn none() -> Self {
        Self {
            min_ms: 0,
            max_ms: 0,
            probability: 0.0,
        }
    }

    /// Advance by exactly `ms` before every operation.
    #[must_use]
    pub fn fixed(ms: u64) -> Self {
        Self {
            min_ms: ms,
            max_ms: ms,
            probability: 1.0,
        }
    }

    /// Advance by a random amount in `[min_ms, max_ms]` with `probability`.
    ///
    /// # Panics
    /// Panics on an empty range or a probability outside [0, 1].
    #[must_use]
    pub fn random(min_ms: u64, max_ms: u64, probability: f64) -> Self {
        assert!((0.0..=1.0).contains(&probability), "probability out of range");
        assert!(min_ms <= max_ms, "min_ms must be <= max_ms");
        Self {
            min_ms,
            max_ms,
            probability,
        }
    }

    fn step(&self, rng: &mut DeterministicRng) -> u64 {
        if self.probability <= 0.0 || !rng.next_bool(self.probability) {
            return 0;
        }
        rng.next_u64_in(self.min_ms, self.max_ms)
    }
}

/// Property-based test runner.
#[derive(Debug)]
pub struct PropertyTest {
    seed: u64,
    max_operations: u64,
    time_config: TimeAdvanceConfig,
}

impl PropertyTest {
    /// Create a new property test with the given seed.
    #[must_use]
    pub fn new(seed: u64) -> Self {
        Self {
            seed,
            max_operations: DST_PROPERTY_OPERATIONS_COUNT_DEFAULT,
            time_config: TimeAdvanceConfig::default(),
        }
    }

    /// Create a property test seeded from `DST_SEED` (or randomly).
    #[must_use]
    pub fn from_env() -> Self {
        Self::new(SimConfig::from_env_or_random().seed())
    }

    /// Set the number of operations to run.
    ///
    /// # Panics
    /// Panics if `max` exceeds `DST_SIMULATION_STEPS_MAX`.
    #[must_use]
    pub fn with_max_operations(mut self, max: u64) -> Self {
        assert!(
            max <= DST_SIMULATION_STEPS_MAX,
            "max_operations {max} exceeds DST_SIMULATION_STEPS_MAX {DST_SIMULATION_STEPS_MAX}"
        );
        self.max_operations = max;
        self
    }

    /// Configure time advancement between operations.
    #[must_use]
    pub fn with_time_advance(mut self, config: TimeAdvanceConfig) -> Self {
        self.time_config = config;
        self
    }

    /// Run the test, checking invariants initially and after every operation.
    #[must_use]
    pub fn run<T: PropertyTestable>(self, mut state: T) -> PropertyTestResult {
        self.run_with_clock(&mut state, &SimClock::new())
    }

    /// Run against a caller-provided clock (for states that captured a clock
    /// at construction).
    #[must_use]
    pub fn run_with_clock<T: PropertyTestable>(
        self,
        state: &mut T,
        clock: &SimClock,
    ) -> PropertyTestResult {
        let mut rng = DeterministicRng::new(self.seed);
        let fail = |index: u64, operation: String, message: String, state: &T| PropertyTestResult {
            operations_executed: index,
            seed: self.seed,
            failure: Some(PropertyTestFailure {
                operation_index: index,
                operation,
                message,
                state_description: state.describe_state(),
            }),
        };

        if let Err(msg) = state.check_invariants() {
            return fail(0, "(initial state)".to_string(), msg, state);
        }

        for i in 0..self.max_operations {
            let advance = self.time_config.step(&mut rng);
            if advance > 0 {
                clock.advance_ms(advance);
            }

            let op = state.generate_operation(&mut rng);
            state.apply_operation(&op, clock);

            if let Err(msg) = state.check_invariants() {
                return fail(i, format!("{op:?}"), msg, state);
            }
        }

        PropertyTestResult {
            operations_executed: self.max_operations,
            seed: self.seed,
            failure: None,
        }
    }

    /// Run and panic on failure.
    ///
    /// # Panics
    /// Panics if any invariant is violated.
    pub fn run_and_assert<T: PropertyTestable>(self, state: T) {
        self.run(state).unwrap();
    }
}

/// Run the same property test over several seeds.
///
/// # Panics
/// Panics on the first failing seed.
pub fn run_property_tests<T, F>(seeds: &[u64], max_operations: u64, state_factory: F)
where
    T: PropertyTestable,
    F: Fn() -> T,
{
    for &seed in seeds {
        PropertyTest::new(seed)
            .with_max_operations(max_operations)
            .run_and_assert(state_factory());
    }
}

/// Seeds for multi-seed runs: `0`, `1`, `42`, then seeds derived from the
/// environment seed.
///
/// # Panics
/// Panics if `count < 3`.
#[must_use]
pub fn test_seeds(count: usize) -> Vec<u64> {
    assert!(count >= 3, "need at least 3 seeds for edge cases");

    let mut seeds = vec![0, 1, 42];
    let mut rng = DeterministicRng::new(SimConfig::from_env_or_random().seed());
    while seeds.len() < count {
        seeds.push(rng.next_u64());
    }
    seeds
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Counter {
        value: i64,
        cap: i64,
        buggy: bool,
    }

    #[derive(Debug, Clone)]
    enum CounterOp {
        Add(i64),
        Reset,
    }

    impl PropertyTestable for Counter {
        type Operation = CounterOp;

        fn generate_operation(&self, rng: &mut DeterministicRng) -> CounterOp {
            if rng.next_bool(0.9) {
                CounterOp::Add(rng.next_usize(1, 5) as i64)
            } else {
                CounterOp::Reset
            }
        }

        fn apply_operation(&mut self, op: &CounterOp, _clock: &SimClock) {
            match op {
                CounterOp::Add(n) if self.buggy => self.value += n,
                CounterOp::Add(n) => self.value = (self.value + n).min(self.cap),
                CounterOp::Reset => self.value = 0,
            }
        }

        fn check_invariants(&self) -> Result<(), String> {
            if self.value > self.cap {
                return Err(format!("value {} above cap {}", self.value, self.cap));
            }
            Ok(())
        }
    }

    #[test]
    fn test_passing_run() {
        let result = PropertyTest::new(42)
            .with_max_operations(300)
            .run(Counter { value: 0, cap: 10, buggy: false });
        assert!(result.is_success());
        assert_eq!(result.operations_executed, 300);
    }

    #[test]
    fn test_failing_run_reports_seed() {
        let result = PropertyTest::new(7)
            .with_max_operations(300)
            .run(Counter { value: 0, cap: 10, buggy: true });
        assert!(!result.is_success());
        assert_eq!(result.seed, 7);
    }

    #[test]
    fn test_time_advances_with_fixed_config() {
        let clock = SimClock::new();
        let mut state = Counter { value: 0, cap: 10, buggy: false };
        let result = PropertyTest::new(1)
            .with_max_operations(10)
            .with_time_advance(TimeAdvanceConfig::fixed(100))
            .run_with_clock(&mut state, &clock);

        assert!(result.is_success());
        assert_eq!(clock.now_ms(), 1000);
    }

    #[test]
    fn test_seeds_include_edge_cases() {
        let seeds = test_seeds(5);
        assert_eq!(&seeds[..3], &[0, 1, 42]);
        assert_eq!(seeds.len(), 5);
    }
}
