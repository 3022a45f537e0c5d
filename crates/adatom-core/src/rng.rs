//! The run's single pseudo-random stream.

use rand::distributions::Open01;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

/// Seeded once at construction and never reseeded.
#[derive(Debug, Clone)]
pub struct KmcRng {
    inner: ChaCha8Rng,
    seed: u64,
    draws: u64,
}

impl KmcRng {
    pub fn new(seed: u64) -> Self {
        Self {
            inner: ChaCha8Rng::seed_from_u64(seed),
            seed,
            draws: 0,
        }
    }

    /// Uniform draw in `[0, 1)`.
    pub fn uniform(&mut self) -> f64 {
        self.draws += 1;
        self.inner.gen::<f64>()
    }

    /// Uniform draw in `(0, 1)`. Never returns 0, so `ln` is always finite.
    pub fn uniform_open(&mut self) -> f64 {
        self.draws += 1;
        self.inner.sample(Open01)
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// Number of values drawn so far.
    pub fn draws(&self) -> u64 {
        self.draws
    }
}
