use serde::{Deserialize, Serialize};

use crate::error::{Result, SimError};
use crate::interval::{ProportionInterval, wilson_interval};

/// Outcome of one Monte Carlo run.
///
/// Under a null scenario the rejection rate estimates the Type I error rate;
/// under a real effect it estimates power.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SimulationResult {
    trials: u64,
    alpha: f64,
    successes: u64,
    rejection_rate: f64,
}

impl SimulationResult {
    /// Build a result from raw counts, e.g. when merging trials run elsewhere.
    pub fn from_counts(trials: u64, alpha: f64, successes: u64) -> Result<Self> {
        if trials == 0 {
            return Err(SimError::invalid("trials must be positive"));
        }
        if successes > trials {
            return Err(SimError::invalid(format!(
                "successes ({successes}) exceed trials ({trials})"
            )));
        }
        check_alpha(alpha)?;

        Ok(Self {
            trials,
            alpha,
            successes,
            rejection_rate: successes as f64 / trials as f64,
        })
    }

    pub fn trials(&self) -> u64 {
        self.trials
    }

    pub fn alpha(&self) -> f64 {
        self.alpha
    }

    pub fn successes(&self) -> u64 {
        self.successes
    }

    pub fn rejection_rate(&self) -> f64 {
        self.rejection_rate
    }

    pub fn wilson_interval(&self, confidence: f64) -> Result<ProportionInterval> {
        wilson_interval(self.successes, self.trials, confidence)
    }
}

pub(crate) fn check_alpha(alpha: f64) -> Result<()> {
    if alpha > 0.0 && alpha < 1.0 {
        Ok(())
    } else {
        Err(SimError::invalid(format!(
            "alpha must lie strictly between 0 and 1, got {alpha}"
        )))
    }
}

/// One sweep output row. Field order matches [`SweepRow::COLUMNS`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SweepRow {
    pub n_per_group: usize,
    pub alpha: f64,
    pub trials: u64,
    pub type1_mean: f64,
    pub power_mean: f64,
    pub type1_conversion: f64,
    pub power_conversion: f64,
    pub type1_ratio: f64,
    pub power_ratio: f64,
}

impl SweepRow {
    pub const COLUMNS: [&'static str; 9] = [
        "n_per_group",
        "alpha",
        "trials",
        "type1_mean",
        "power_mean",
        "type1_conversion",
        "power_conversion",
        "type1_ratio",
        "power_ratio",
    ];

    /// Values rendered in [`SweepRow::COLUMNS`] order.
    pub fn record(&self) -> [String; 9] {
        [
            self.n_per_group.to_string(),
            self.alpha.to_string(),
            self.trials.to_string(),
            self.type1_mean.to_string(),
            self.power_mean.to_string(),
            self.type1_conversion.to_string(),
            self.power_conversion.to_string(),
            self.type1_ratio.to_string(),
            self.power_ratio.to_string(),
        ]
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SweepManifest {
    pub manifest_version: u32,
    pub generated_at: String,
    pub output_path: String,
    pub output_sha256: String,
    pub trials: u64,
    pub alpha: f64,
    pub seed_base: u64,
    pub sample_sizes: Vec<usize>,
    pub row_count: usize,
    pub oracle: String,
}
