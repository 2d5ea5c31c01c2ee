//! DeterministicRng - Seeded Random Number Generator
//!
//! TigerStyle: ChaCha20-based RNG so a seed replays the exact same run.

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha20Rng;

/// Golden-ratio increment used to derive fork seeds.
const FORK_SEED_STRIDE: u64 = 0x9E37_79B9_7F4A_7C15;

/// A deterministic random number generator.
///
/// TigerStyle:
/// - Same seed always produces same sequence
/// - Fork creates independent streams (one per simulated component)
#[derive(Debug, Clone)]
pub struct DeterministicRng {
    rng: ChaCha20Rng,
    seed: u64,
    forks: u64,
}

impl DeterministicRng {
    /// Create a new RNG with the given seed.
    #[must_use]
    pub fn new(seed: u64) -> Self {
        Self {
            rng: ChaCha20Rng::seed_from_u64(seed),
            seed,
            forks: 0,
        }
    }

    /// Get the original seed.
    #[must_use]
    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// Generate a random float in [0, 1).
    pub fn next_float(&mut self) -> f64 {
        self.rng.gen::<f64>()
    }

    /// Generate a random u64.
    pub fn next_u64(&mut self) -> u64 {
        self.rng.gen()
    }

    /// Generate a random usize in [min, max] (inclusive).
    ///
    /// # Panics
    /// Panics if min > max.
    pub fn next_usize(&mut self, min: usize, max: usize) -> usize {
        assert!(min <= max, "min ({min}) must be <= max ({max})");
        self.rng.gen_range(min..=max)
    }

    /// Generate a random u64 in [min, max] (inclusive).
    ///
    /// # Panics
    /// Panics if min > max.
    pub fn next_u64_in(&mut self, min: u64, max: u64) -> u64 {
        assert!(min <= max, "min ({min}) must be <= max ({max})");
        self.rng.gen_range(min..=max)
    }

    /// Generate a random boolean that is true with the given probability.
    ///
    /// # Panics
    /// Panics if probability is not in [0, 1].
    pub fn next_bool(&mut self, probability: f64) -> bool {
        assert!(
            (0.0..=1.0).contains(&probability),
            "probability must be in [0, 1], got {probability}"
        );
        self.next_float() < probability
    }

    /// Choose a random element from a slice.
    ///
    /// # Panics
    /// Panics if the slice is empty.
    pub fn choose<'a, T>(&mut self, items: &'a [T]) -> &'a T {
        assert!(!items.is_empty(), "cannot choose from empty slice");
        &items[self.next_usize(0, items.len() - 1)]
    }

    /// Create an independent stream derived from this RNG's seed.
    pub fn fork(&mut self) -> Self {
        self.forks += 1;
        Self::new(
            self.seed
                .wrapping_add(self.forks.wrapping_mul(FORK_SEED_STRIDE)),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_same_seed_same_sequence() {
        let mut a = DeterministicRng::new(12345);
        let mut b = DeterministicRng::new(12345);

        for _ in 0..100 {
            assert_eq!(a.next_u64(), b.next_u64());
        }
    }

    #[test]
    fn test_bounds() {
        let mut rng = DeterministicRng::new(42);

        for _ in 0..200 {
            assert!((5..=10).contains(&rng.next_usize(5, 10)));
            assert!((100..=200).contains(&rng.next_u64_in(100, 200)));
            let f = rng.next_float();
            assert!((0.0..1.0).contains(&f));
        }
    }

    #[test]
    fn test_next_bool_extremes() {
        let mut rng = DeterministicRng::new(7);

        assert!((0..100).all(|_| !rng.next_bool(0.0)));
        assert!((0..100).all(|_| rng.next_bool(1.0)));
    }

    #[test]
    fn test_forks_are_independent_and_reproducible() {
        let mut parent = DeterministicRng::new(42);
        let mut fork1 = parent.fork();
        let mut fork2 = parent.fork();
        assert_ne!(fork1.seed(), fork2.seed());

        let mut replay = DeterministicRng::new(42);
        let mut replay1 = replay.fork();
        assert_eq!(fork1.next_u64(), replay1.next_u64());
        let _ = fork2.next_u64();
    }
}
