//! Seeded random source for simulation runs.

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use rand_distr::{Distribution, Normal};

use crate::error::{Result, SimError};

/// Deterministic pseudo-random stream.
///
/// Backed by ChaCha8, whose output is fixed by the seed alone and portable
/// across platforms. Instances never share state, so one source per run keeps
/// runs independent of each other.
#[derive(Debug, Clone)]
pub struct SimRng {
    inner: ChaCha8Rng,
}

impl SimRng {
    pub fn from_seed(seed: u64) -> Self {
        Self {
            inner: ChaCha8Rng::seed_from_u64(seed),
        }
    }

    /// Uniform draw in `[0, 1)`.
    pub fn uniform(&mut self) -> f64 {
        self.inner.r#gen::<f64>()
    }

    /// `true` with probability `p`.
    pub fn bernoulli(&mut self, p: f64) -> bool {
        self.uniform() < p
    }

    /// Draw from a normal distribution with the given mean and standard deviation.
    pub fn normal(&mut self, mean: f64, standard_deviation: f64) -> Result<f64> {
        let dist = normal_distribution(mean, standard_deviation)?;
        Ok(dist.sample(&mut self.inner))
    }

    /// Fill a buffer with `count` normal draws, validating parameters once.
    pub fn normal_vec(
        &mut self,
        count: usize,
        mean: f64,
        standard_deviation: f64,
    ) -> Result<Vec<f64>> {
        let dist = normal_distribution(mean, standard_deviation)?;
        Ok((0..count).map(|_| dist.sample(&mut self.inner)).collect())
    }
}

fn normal_distribution(mean: f64, standard_deviation: f64) -> Result<Normal<f64>> {
    if !mean.is_finite() {
        return Err(SimError::invalid(format!(
            "normal mean must be finite, got {mean}"
        )));
    }
    if !standard_deviation.is_finite() || standard_deviation < 0.0 {
        return Err(SimError::invalid(format!(
            "standard deviation must be finite and non-negative, got {standard_deviation}"
        )));
    }
    Normal::new(mean, standard_deviation)
        .map_err(|err| SimError::invalid(format!("invalid normal parameters: {err}")))
}
