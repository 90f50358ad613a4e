//! Explicit configuration values for sweeps and reports.
//!
//! Defaults reproduce the stock experiment setup. Nothing here is global:
//! callers build or load a value and pass it down.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{Result, SimError};
use crate::generate::{ConversionScenario, MeanScenario, MetricFamily, RatioScenario, Scenario};

/// Alternative-hypothesis scenario per metric family; the null scenario is
/// derived from it.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct MetricSettings {
    pub mean: MeanScenario,
    pub conversion: ConversionScenario,
    pub ratio: RatioScenario,
}

impl MetricSettings {
    pub fn scenario(&self, family: MetricFamily) -> Scenario {
        match family {
            MetricFamily::Mean => Scenario::Mean(self.mean.clone()),
            MetricFamily::Conversion => Scenario::Conversion(self.conversion.clone()),
            MetricFamily::Ratio => Scenario::Ratio(self.ratio.clone()),
        }
    }

    pub fn validate(&self) -> Result<()> {
        for family in MetricFamily::ALL {
            self.scenario(family).validate()?;
        }
        Ok(())
    }

    pub fn load(path: &Path) -> Result<Self> {
        load_json(path)
    }
}

/// Per-family sample size and seeds for the fixed report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportCell {
    pub n_per_group: usize,
    pub type1_seed: u64,
    pub power_seed: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReportConfig {
    pub alpha: f64,
    pub trials: u64,
    pub confidence: f64,
    pub metrics: MetricSettings,
    pub mean: ReportCell,
    pub conversion: ReportCell,
    pub ratio: ReportCell,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            alpha: 0.05,
            trials: 2000,
            confidence: 0.95,
            metrics: MetricSettings::default(),
            mean: ReportCell {
                n_per_group: 200,
                type1_seed: 0,
                power_seed: 1,
            },
            conversion: ReportCell {
                n_per_group: 500,
                type1_seed: 2,
                power_seed: 3,
            },
            ratio: ReportCell {
                n_per_group: 500,
                type1_seed: 4,
                power_seed: 5,
            },
        }
    }
}

impl ReportConfig {
    pub fn cell(&self, family: MetricFamily) -> &ReportCell {
        match family {
            MetricFamily::Mean => &self.mean,
            MetricFamily::Conversion => &self.conversion,
            MetricFamily::Ratio => &self.ratio,
        }
    }

    pub fn load(path: &Path) -> Result<Self> {
        load_json(path)
    }
}

fn load_json<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T> {
    let raw = fs::read(path).map_err(|err| SimError::io(path, err))?;
    Ok(serde_json::from_slice(&raw)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_settings_fall_back_to_defaults() {
        let raw = r#"{ "conversion": { "rate_a": 0.2, "rate_b": 0.25 } }"#;
        let settings: MetricSettings =
            serde_json::from_str(raw).expect("partial settings should deserialize");
        assert_eq!(settings.conversion.rate_b, 0.25);
        assert_eq!(settings.mean, MeanScenario::default());
        assert_eq!(settings.ratio.purchase_amount, 120.0);
    }

    #[test]
    fn report_defaults_match_stock_setup() {
        let config = ReportConfig::default();
        assert_eq!(config.trials, 2000);
        assert_eq!(config.cell(MetricFamily::Mean).n_per_group, 200);
        assert_eq!(config.cell(MetricFamily::Ratio).power_seed, 5);
        assert!(config.metrics.validate().is_ok());
    }

    #[test]
    fn load_reads_json_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        fs::write(&path, r#"{ "mean": { "mean_a": 1.0, "mean_b": 1.5, "standard_deviation_a": 2.0, "standard_deviation_b": 2.0 } }"#)
            .unwrap();
        let settings = MetricSettings::load(&path).unwrap();
        assert_eq!(settings.mean.mean_b, 1.5);

        let missing = MetricSettings::load(&dir.path().join("missing.json")).unwrap_err();
        assert!(matches!(missing, SimError::Io { .. }));
    }
}
