//! Synthetic data generators, one per metric family.

use serde::{Deserialize, Serialize};

use crate::error::{Result, SimError};
use crate::rng::SimRng;

/// Metric families the simulator knows how to synthesize and test.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MetricFamily {
    Mean,
    Conversion,
    Ratio,
}

impl MetricFamily {
    pub const ALL: [MetricFamily; 3] = [Self::Mean, Self::Conversion, Self::Ratio];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Mean => "mean",
            Self::Conversion => "conversion",
            Self::Ratio => "ratio",
        }
    }

    pub fn title(self) -> &'static str {
        match self {
            Self::Mean => "Mean metric (normal data)",
            Self::Conversion => "Conversion metric (Bernoulli)",
            Self::Ratio => "Ratio metric (revenue per visitor)",
        }
    }
}

/// Normal data with per-group mean and standard deviation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MeanScenario {
    pub mean_a: f64,
    pub mean_b: f64,
    pub standard_deviation_a: f64,
    pub standard_deviation_b: f64,
}

impl MeanScenario {
    pub fn with_shared_deviation(mean_a: f64, mean_b: f64, standard_deviation: f64) -> Self {
        Self {
            mean_a,
            mean_b,
            standard_deviation_a: standard_deviation,
            standard_deviation_b: standard_deviation,
        }
    }
}

impl Default for MeanScenario {
    fn default() -> Self {
        Self::with_shared_deviation(0.0, 0.3, 1.0)
    }
}

/// Bernoulli conversions with per-group success probability.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConversionScenario {
    pub rate_a: f64,
    pub rate_b: f64,
}

impl Default for ConversionScenario {
    fn default() -> Self {
        Self {
            rate_a: 0.08,
            rate_b: 0.095,
        }
    }
}

/// Revenue per visitor: a purchase of fixed amount happens with some
/// probability, every visitor contributes one unit to the denominator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RatioScenario {
    pub purchase_probability_a: f64,
    pub purchase_probability_b: f64,
    pub purchase_amount: f64,
}

impl Default for RatioScenario {
    fn default() -> Self {
        Self {
            purchase_probability_a: 0.05,
            purchase_probability_b: 0.06,
            purchase_amount: 120.0,
        }
    }
}

/// Data-generating process for one simulated experiment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "family", rename_all = "snake_case")]
pub enum Scenario {
    Mean(MeanScenario),
    Conversion(ConversionScenario),
    Ratio(RatioScenario),
}

/// Per-unit numerator and denominator observations for one group.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RatioSample {
    pub numerator: Vec<f64>,
    pub denominator: Vec<f64>,
}

impl RatioSample {
    pub fn len(&self) -> usize {
        self.numerator.len()
    }

    pub fn is_empty(&self) -> bool {
        self.numerator.is_empty()
    }
}

/// One synthetic experiment: group A and group B observations.
#[derive(Debug, Clone, PartialEq)]
pub enum SamplePair {
    Continuous { a: Vec<f64>, b: Vec<f64> },
    Binary { a: Vec<u8>, b: Vec<u8> },
    Ratio { a: RatioSample, b: RatioSample },
}

impl SamplePair {
    pub fn family(&self) -> MetricFamily {
        match self {
            Self::Continuous { .. } => MetricFamily::Mean,
            Self::Binary { .. } => MetricFamily::Conversion,
            Self::Ratio { .. } => MetricFamily::Ratio,
        }
    }
}

impl Scenario {
    pub fn family(&self) -> MetricFamily {
        match self {
            Self::Mean(_) => MetricFamily::Mean,
            Self::Conversion(_) => MetricFamily::Conversion,
            Self::Ratio(_) => MetricFamily::Ratio,
        }
    }

    /// The same scenario with group B drawn exactly like group A.
    pub fn null(&self) -> Self {
        match self {
            Self::Mean(s) => Self::Mean(MeanScenario {
                mean_b: s.mean_a,
                standard_deviation_b: s.standard_deviation_a,
                ..s.clone()
            }),
            Self::Conversion(s) => Self::Conversion(ConversionScenario {
                rate_b: s.rate_a,
                ..s.clone()
            }),
            Self::Ratio(s) => Self::Ratio(RatioScenario {
                purchase_probability_b: s.purchase_probability_a,
                ..s.clone()
            }),
        }
    }

    /// Check parameters without touching a random source.
    pub fn validate(&self) -> Result<()> {
        match self {
            Self::Mean(s) => {
                check_finite("mean_a", s.mean_a)?;
                check_finite("mean_b", s.mean_b)?;
                check_deviation("standard_deviation_a", s.standard_deviation_a)?;
                check_deviation("standard_deviation_b", s.standard_deviation_b)
            }
            Self::Conversion(s) => {
                check_probability("rate_a", s.rate_a)?;
                check_probability("rate_b", s.rate_b)
            }
            Self::Ratio(s) => {
                check_probability("purchase_probability_a", s.purchase_probability_a)?;
                check_probability("purchase_probability_b", s.purchase_probability_b)?;
                check_finite("purchase_amount", s.purchase_amount)
            }
        }
    }

    /// Draw `n_per_group` units for group A, then `n_per_group` for group B.
    pub fn generate(&self, n_per_group: usize, rng: &mut SimRng) -> Result<SamplePair> {
        if n_per_group == 0 {
            return Err(SimError::invalid("n_per_group must be positive"));
        }
        self.validate()?;

        let pair = match self {
            Self::Mean(s) => SamplePair::Continuous {
                a: rng.normal_vec(n_per_group, s.mean_a, s.standard_deviation_a)?,
                b: rng.normal_vec(n_per_group, s.mean_b, s.standard_deviation_b)?,
            },
            Self::Conversion(s) => SamplePair::Binary {
                a: bernoulli_outcomes(rng, n_per_group, s.rate_a),
                b: bernoulli_outcomes(rng, n_per_group, s.rate_b),
            },
            Self::Ratio(s) => SamplePair::Ratio {
                a: purchases(rng, n_per_group, s.purchase_probability_a, s.purchase_amount),
                b: purchases(rng, n_per_group, s.purchase_probability_b, s.purchase_amount),
            },
        };
        Ok(pair)
    }
}

fn bernoulli_outcomes(rng: &mut SimRng, n: usize, p: f64) -> Vec<u8> {
    (0..n).map(|_| u8::from(rng.bernoulli(p))).collect()
}

fn purchases(rng: &mut SimRng, n: usize, p: f64, amount: f64) -> RatioSample {
    let numerator = (0..n)
        .map(|_| if rng.bernoulli(p) { amount } else { 0.0 })
        .collect();
    RatioSample {
        numerator,
        denominator: vec![1.0; n],
    }
}

fn check_finite(name: &str, value: f64) -> Result<()> {
    if value.is_finite() {
        Ok(())
    } else {
        Err(SimError::invalid(format!("{name} must be finite, got {value}")))
    }
}

fn check_deviation(name: &str, value: f64) -> Result<()> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(SimError::invalid(format!(
            "{name} must be finite and non-negative, got {value}"
        )))
    }
}

fn check_probability(name: &str, value: f64) -> Result<()> {
    if (0.0..=1.0).contains(&value) {
        Ok(())
    } else {
        Err(SimError::invalid(format!(
            "{name} must lie in [0, 1], got {value}"
        )))
    }
}
