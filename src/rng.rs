use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;

use crate::error::{BreedError, Result};

/// seeded PCG stream behind every random decision the breeder makes.
/// two sources built from the same seed and driven by the same call
/// sequence produce the same values, which is what makes a run replayable.
#[derive(Clone, Debug)]
pub struct RandomSource {
    rng: Pcg32,
}

impl RandomSource {
    pub fn new(seed: u64) -> Self {
        Self { rng: Pcg32::seed_from_u64(seed) }
    }

    /// integer in [0, n)
    pub fn uniform_int(&mut self, n: usize) -> Result<usize> {
        if n == 0 {
            return Err(BreedError::InvalidState("uniform_int over an empty range".into()));
        }
        Ok(self.rng.random_range(0..n))
    }

    /// integer in [lo, hi]
    pub fn uniform_int_between(&mut self, lo: i64, hi: i64) -> Result<i64> {
        if lo > hi {
            return Err(BreedError::InvalidConfiguration(format!(
                "uniform_int_between: lo {lo} > hi {hi}"
            )));
        }
        Ok(self.rng.random_range(lo..=hi))
    }

    /// real in [0, 1)
    pub fn uniform_real(&mut self) -> f64 {
        self.rng.random::<f64>()
    }

    /// real in [lo, hi]
    pub fn uniform_real_between(&mut self, lo: f64, hi: f64) -> f64 {
        lo + (hi - lo) * self.uniform_real()
    }

    /// `center + spread * (2u - 1)`, clamped to [lo, hi]
    pub fn jitter_real(&mut self, center: f64, spread: f64, lo: f64, hi: f64) -> f64 {
        let delta = spread * (2.0 * self.uniform_real() - 1.0);
        (center + delta).clamp(lo, hi)
    }

    /// integer jitter, rounded to nearest before clamping
    pub fn jitter_int(&mut self, center: i64, spread: i64, lo: i64, hi: i64) -> i64 {
        let v = self.jitter_real(center as f64, spread as f64, lo as f64, hi as f64);
        (v.round() as i64).clamp(lo, hi)
    }

    /// true with probability 1/rate. rates of 0 and 1 are rejected:
    /// the first divides by zero, the second would always fire.
    pub fn bernoulli(&mut self, rate: u32) -> Result<bool> {
        if rate < 2 {
            return Err(BreedError::InvalidConfiguration(format!(
                "mutation rate must be at least 2 (one in N), got {rate}"
            )));
        }
        Ok(self.rng.random_range(0..rate) == 0)
    }
}
