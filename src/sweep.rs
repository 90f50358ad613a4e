//! Sample-size sweeps over all metric families.
//!
//! Every cell of the sweep, i.e. one (sample size, metric family, hypothesis)
//! combination, runs with its own seed
//! `seed_base + offset(family, hypothesis) + index`. Cells share no state, so
//! callers may evaluate them in any order and merge by index.

use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::{Result, SimError};
use crate::generate::MetricFamily;
use crate::model::{SweepManifest, SweepRow, check_alpha};
use crate::oracle::TestOracle;
use crate::runner::{TrialConfig, run_trials};
use crate::settings::MetricSettings;
use crate::util::{now_utc_string, sha256_file, write_atomically};

/// Distance between the seed ranges of neighbouring cells.
pub const SEED_STRIDE: u64 = 10_000;

#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Hypothesis {
    Null,
    Alternative,
}

impl Hypothesis {
    pub fn column_prefix(self) -> &'static str {
        match self {
            Self::Null => "type1",
            Self::Alternative => "power",
        }
    }
}

/// Seed offset for a cell: 10k/20k for mean, 30k/40k for conversion,
/// 50k/60k for ratio.
pub fn seed_offset(family: MetricFamily, hypothesis: Hypothesis) -> u64 {
    let family_slot = match family {
        MetricFamily::Mean => 0,
        MetricFamily::Conversion => 1,
        MetricFamily::Ratio => 2,
    };
    let hypothesis_slot = match hypothesis {
        Hypothesis::Null => 1,
        Hypothesis::Alternative => 2,
    };
    SEED_STRIDE * (2 * family_slot + hypothesis_slot)
}

pub fn cell_seed(
    seed_base: u64,
    index: usize,
    family: MetricFamily,
    hypothesis: Hypothesis,
) -> Result<u64> {
    seed_base
        .checked_add(seed_offset(family, hypothesis))
        .and_then(|seed| seed.checked_add(index as u64))
        .ok_or_else(|| {
            SimError::invalid(format!(
                "seed_base {seed_base} is too large for sweep index {index}"
            ))
        })
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SweepConfig {
    pub trials: u64,
    pub alpha: f64,
    pub sample_sizes: Vec<usize>,
    pub seed_base: u64,
    #[serde(default)]
    pub settings: MetricSettings,
}

impl SweepConfig {
    pub fn validate(&self) -> Result<()> {
        if self.sample_sizes.is_empty() {
            return Err(SimError::invalid(
                "sweep needs at least one sample size",
            ));
        }
        if self.sample_sizes.len() as u64 >= SEED_STRIDE {
            return Err(SimError::invalid(format!(
                "sweep supports fewer than {SEED_STRIDE} sample sizes, got {}",
                self.sample_sizes.len()
            )));
        }
        if let Some(position) = self.sample_sizes.iter().position(|n| *n == 0) {
            return Err(SimError::invalid(format!(
                "sample size at position {position} must be positive"
            )));
        }
        if self.trials == 0 {
            return Err(SimError::invalid("trials must be positive"));
        }
        check_alpha(self.alpha)?;
        self.settings.validate()?;
        cell_seed(
            self.seed_base,
            self.sample_sizes.len() - 1,
            MetricFamily::Ratio,
            Hypothesis::Alternative,
        )?;
        Ok(())
    }
}

/// Run one sweep row: six runs for the sample size at `index`.
pub fn run_sweep_row<O: TestOracle + ?Sized>(
    config: &SweepConfig,
    index: usize,
    oracle: &O,
) -> Result<SweepRow> {
    let n_per_group = *config.sample_sizes.get(index).ok_or_else(|| {
        SimError::invalid(format!(
            "sweep index {index} out of range for {} sample sizes",
            config.sample_sizes.len()
        ))
    })?;

    let mut rates = [[0.0_f64; 2]; 3];
    for (slot, family) in MetricFamily::ALL.into_iter().enumerate() {
        let alternative = config.settings.scenario(family);
        for (column, hypothesis) in [Hypothesis::Null, Hypothesis::Alternative]
            .into_iter()
            .enumerate()
        {
            let scenario = match hypothesis {
                Hypothesis::Null => alternative.null(),
                Hypothesis::Alternative => alternative.clone(),
            };
            let trial_config = TrialConfig {
                trials: config.trials,
                alpha: config.alpha,
                seed: cell_seed(config.seed_base, index, family, hypothesis)?,
            };
            let result = run_trials(&scenario, n_per_group, oracle, &trial_config)?;
            debug!(
                n_per_group,
                column = %format!("{}_{}", hypothesis.column_prefix(), family.as_str()),
                seed = trial_config.seed,
                "sweep cell complete"
            );
            rates[slot][column] = result.rejection_rate();
        }
    }

    let [mean, conversion, ratio] = rates;
    Ok(SweepRow {
        n_per_group,
        alpha: config.alpha,
        trials: config.trials,
        type1_mean: mean[0],
        power_mean: mean[1],
        type1_conversion: conversion[0],
        power_conversion: conversion[1],
        type1_ratio: ratio[0],
        power_ratio: ratio[1],
    })
}

/// Run every row of the sweep, in sample-size order.
pub fn run_sweep<O: TestOracle + ?Sized>(config: &SweepConfig, oracle: &O) -> Result<Vec<SweepRow>> {
    config.validate()?;

    let mut rows = Vec::with_capacity(config.sample_sizes.len());
    for index in 0..config.sample_sizes.len() {
        let row = run_sweep_row(config, index, oracle)?;
        info!(
            n_per_group = row.n_per_group,
            power_mean = row.power_mean,
            power_conversion = row.power_conversion,
            power_ratio = row.power_ratio,
            "sweep row complete"
        );
        rows.push(row);
    }
    Ok(rows)
}

/// Write the header and all rows; a finished file is never partial.
pub fn write_sweep_csv(path: &Path, rows: &[SweepRow]) -> Result<()> {
    if rows.is_empty() {
        return Err(SimError::invalid("refusing to write a sweep with no rows"));
    }

    write_atomically(path, |file| {
        let mut writer = csv::Writer::from_writer(file);
        writer.write_record(SweepRow::COLUMNS)?;
        for row in rows {
            writer.write_record(row.record())?;
        }
        writer.flush().map_err(|err| SimError::io(path, err))
    })
}

/// Run the sweep, write the CSV and describe the output.
pub fn run_sweep_to_csv<O: TestOracle + ?Sized>(
    output_path: &Path,
    config: &SweepConfig,
    oracle: &O,
) -> Result<SweepManifest> {
    let rows = run_sweep(config, oracle)?;
    write_sweep_csv(output_path, &rows)?;

    Ok(SweepManifest {
        manifest_version: 1,
        generated_at: now_utc_string(),
        output_path: output_path.display().to_string(),
        output_sha256: sha256_file(output_path)?,
        trials: config.trials,
        alpha: config.alpha,
        seed_base: config.seed_base,
        sample_sizes: config.sample_sizes.clone(),
        row_count: rows.len(),
        oracle: oracle.label(),
    })
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;
    use std::fs;

    use super::*;
    use crate::oracle::StandardOracle;

    fn config(sample_sizes: Vec<usize>) -> SweepConfig {
        SweepConfig {
            trials: 200,
            alpha: 0.05,
            sample_sizes,
            seed_base: 123,
            settings: MetricSettings::default(),
        }
    }

    #[test]
    fn seed_offsets_match_stock_layout() {
        assert_eq!(seed_offset(MetricFamily::Mean, Hypothesis::Null), 10_000);
        assert_eq!(seed_offset(MetricFamily::Mean, Hypothesis::Alternative), 20_000);
        assert_eq!(seed_offset(MetricFamily::Conversion, Hypothesis::Null), 30_000);
        assert_eq!(seed_offset(MetricFamily::Conversion, Hypothesis::Alternative), 40_000);
        assert_eq!(seed_offset(MetricFamily::Ratio, Hypothesis::Null), 50_000);
        assert_eq!(seed_offset(MetricFamily::Ratio, Hypothesis::Alternative), 60_000);
    }

    #[test]
    fn every_cell_gets_a_distinct_seed() {
        let mut seen = HashSet::new();
        for index in 0..50 {
            for family in MetricFamily::ALL {
                for hypothesis in [Hypothesis::Null, Hypothesis::Alternative] {
                    assert!(seen.insert(cell_seed(7, index, family, hypothesis).unwrap()));
                }
            }
        }
        assert_eq!(seen.len(), 300);
    }

    #[test]
    fn empty_sweep_is_invalid() {
        let err = run_sweep(&config(Vec::new()), &StandardOracle::default()).unwrap_err();
        assert!(err.is_invalid_argument());
    }

    #[test]
    fn zero_sample_size_and_seed_overflow_are_invalid() {
        assert!(config(vec![50, 0]).validate().unwrap_err().is_invalid_argument());

        let mut overflowing = config(vec![50]);
        overflowing.seed_base = u64::MAX - 5;
        assert!(overflowing.validate().unwrap_err().is_invalid_argument());
    }

    #[test]
    fn sweep_rows_follow_sample_size_order() {
        let rows = run_sweep(&config(vec![100, 50]), &StandardOracle::default()).unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].n_per_group, 100);
        assert_eq!(rows[1].n_per_group, 50);
        for row in &rows {
            assert_eq!(row.trials, 200);
            for rate in [row.type1_mean, row.power_mean, row.type1_ratio, row.power_ratio] {
                assert!((0.0..=1.0).contains(&rate));
            }
        }
    }

    #[test]
    fn single_row_matches_full_sweep_row() {
        let cfg = config(vec![50, 100]);
        let oracle = StandardOracle::default();
        let rows = run_sweep(&cfg, &oracle).unwrap();
        let second = run_sweep_row(&cfg, 1, &oracle).unwrap();
        assert_eq!(rows[1], second);
    }

    #[test]
    fn run_sweep_to_csv_writes_file() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("results").join("sweep.csv");

        let manifest = run_sweep_to_csv(
            &out,
            &config(vec![50, 100]),
            &StandardOracle::default(),
        )
        .unwrap();

        let text = fs::read_to_string(&out).unwrap();
        assert!(text.contains("n_per_group"));
        assert!(text.contains("power_conversion"));

        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0], SweepRow::COLUMNS.join(","));
        assert!(lines[1].starts_with("50,0.05,200,"));
        assert!(lines[2].starts_with("100,0.05,200,"));

        assert_eq!(manifest.row_count, 2);
        assert_eq!(manifest.oracle, "standard (ratio: delta)");
        assert_eq!(manifest.output_sha256, sha256_file(&out).unwrap());
    }

    #[test]
    fn writing_no_rows_is_invalid() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("sweep.csv");
        assert!(write_sweep_csv(&out, &[]).unwrap_err().is_invalid_argument());
        assert!(!out.exists());
    }
}
