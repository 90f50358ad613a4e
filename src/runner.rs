//! Repeated simulated experiments under one scenario.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{Result, SimError};
use crate::generate::Scenario;
use crate::model::{SimulationResult, check_alpha};
use crate::oracle::TestOracle;
use crate::rng::SimRng;

/// Run-level knobs shared by every trial of one run.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TrialConfig {
    pub trials: u64,
    pub alpha: f64,
    pub seed: u64,
}

/// Execute `config.trials` independent experiments and count rejections.
///
/// A single random source seeded from `config.seed` is advanced trial by
/// trial, so a run is fully determined by its inputs. A trial rejects when
/// its p-value is strictly below alpha. The first generator or oracle error
/// aborts the run.
pub fn run_trials<O: TestOracle + ?Sized>(
    scenario: &Scenario,
    n_per_group: usize,
    oracle: &O,
    config: &TrialConfig,
) -> Result<SimulationResult> {
    if config.trials == 0 {
        return Err(SimError::invalid("trials must be positive"));
    }
    if n_per_group == 0 {
        return Err(SimError::invalid("n_per_group must be positive"));
    }
    check_alpha(config.alpha)?;
    scenario.validate()?;

    let mut rng = SimRng::from_seed(config.seed);
    let mut rejections = 0_u64;

    for _ in 0..config.trials {
        let pair = scenario.generate(n_per_group, &mut rng)?;
        let outcome = oracle.evaluate(&pair, config.alpha)?;
        if outcome.p_value < config.alpha {
            rejections += 1;
        }
    }

    let result = SimulationResult::from_counts(config.trials, config.alpha, rejections)?;
    debug!(
        family = scenario.family().as_str(),
        n_per_group,
        trials = config.trials,
        seed = config.seed,
        rejections,
        rejection_rate = result.rejection_rate(),
        "trial run complete"
    );
    Ok(result)
}
