//! Significance tests consumed by the trial runner.
//!
//! The runner only needs a p-value per sample pair, so the test itself sits
//! behind [`TestOracle`]. [`StandardOracle`] is the stock implementation: a
//! Welch t-test for means, a pooled two-proportion z-test for conversions and
//! a delta-method z-test for ratio metrics.

use serde::{Deserialize, Serialize};
use statrs::distribution::{ContinuousCDF, Normal, StudentsT};

use crate::error::{Result, SimError};
use crate::generate::{RatioSample, SamplePair};

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct OracleOutcome {
    pub p_value: f64,
}

/// Capability that turns a sample pair into a p-value.
pub trait TestOracle {
    fn evaluate(&self, pair: &SamplePair, alpha: f64) -> Result<OracleOutcome>;

    /// Short description recorded in run manifests.
    fn label(&self) -> String {
        String::from("custom")
    }
}

impl<T: TestOracle + ?Sized> TestOracle for &T {
    fn evaluate(&self, pair: &SamplePair, alpha: f64) -> Result<OracleOutcome> {
        (**self).evaluate(pair, alpha)
    }

    fn label(&self) -> String {
        (**self).label()
    }
}

/// Variance estimator used by the ratio-metric test.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RatioMethod {
    #[default]
    Delta,
}

impl RatioMethod {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Delta => "delta",
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StandardOracle {
    pub ratio_method: RatioMethod,
}

impl StandardOracle {
    pub fn new(ratio_method: RatioMethod) -> Self {
        Self { ratio_method }
    }
}

impl TestOracle for StandardOracle {
    fn evaluate(&self, pair: &SamplePair, _alpha: f64) -> Result<OracleOutcome> {
        let p_value = match pair {
            SamplePair::Continuous { a, b } => welch_t_test(a, b)?,
            SamplePair::Binary { a, b } => two_proportion_z_test(a, b)?,
            SamplePair::Ratio { a, b } => match self.ratio_method {
                RatioMethod::Delta => delta_ratio_z_test(a, b)?,
            },
        };

        if !p_value.is_finite() {
            return Err(SimError::oracle(format!("non-finite p-value {p_value}")));
        }
        Ok(OracleOutcome {
            p_value: p_value.clamp(0.0, 1.0),
        })
    }

    fn label(&self) -> String {
        format!("standard (ratio: {})", self.ratio_method.as_str())
    }
}

struct Moments {
    n: f64,
    mean: f64,
    variance: f64,
}

fn sample_moments(label: &str, values: &[f64]) -> Result<Moments> {
    if values.len() < 2 {
        return Err(SimError::oracle(format!(
            "{label} needs at least 2 observations, got {}",
            values.len()
        )));
    }
    if values.iter().any(|x| !x.is_finite()) {
        return Err(SimError::oracle(format!("{label} contains non-finite values")));
    }

    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    let variance = values.iter().map(|x| (x - mean).powi(2)).sum::<f64>() / (n - 1.0);
    Ok(Moments { n, mean, variance })
}

/// p-value when the standard error vanishes: identical constant groups carry
/// no evidence of a difference, distinct constant groups are certain.
fn degenerate_p_value(difference: f64) -> f64 {
    if difference == 0.0 { 1.0 } else { 0.0 }
}

fn standard_normal() -> Result<Normal> {
    Normal::new(0.0, 1.0).map_err(|err| SimError::oracle(format!("standard normal: {err}")))
}

fn two_sided_normal_p(z: f64) -> Result<f64> {
    Ok((2.0 * standard_normal()?.sf(z.abs())).min(1.0))
}

pub(crate) fn welch_t_test(a: &[f64], b: &[f64]) -> Result<f64> {
    let ma = sample_moments("group A", a)?;
    let mb = sample_moments("group B", b)?;

    let va = ma.variance / ma.n;
    let vb = mb.variance / mb.n;
    let se = (va + vb).sqrt();
    let difference = mb.mean - ma.mean;
    if se == 0.0 {
        return Ok(degenerate_p_value(difference));
    }

    let t = difference / se;
    let df = (va + vb).powi(2) / (va.powi(2) / (ma.n - 1.0) + vb.powi(2) / (mb.n - 1.0));
    let dist = StudentsT::new(0.0, 1.0, df)
        .map_err(|err| SimError::oracle(format!("student t with df={df}: {err}")))?;
    Ok((2.0 * dist.sf(t.abs())).min(1.0))
}

pub(crate) fn two_proportion_z_test(a: &[u8], b: &[u8]) -> Result<f64> {
    if a.is_empty() || b.is_empty() {
        return Err(SimError::oracle("conversion groups must not be empty"));
    }
    if a.iter().chain(b.iter()).any(|x| *x > 1) {
        return Err(SimError::oracle("conversion outcomes must be 0 or 1"));
    }

    let na = a.len() as f64;
    let nb = b.len() as f64;
    let xa = a.iter().map(|x| f64::from(*x)).sum::<f64>();
    let xb = b.iter().map(|x| f64::from(*x)).sum::<f64>();

    let pa = xa / na;
    let pb = xb / nb;
    let pooled = (xa + xb) / (na + nb);
    let se = (pooled * (1.0 - pooled) * (1.0 / na + 1.0 / nb)).sqrt();
    if se == 0.0 {
        return Ok(degenerate_p_value(pb - pa));
    }

    two_sided_normal_p((pb - pa) / se)
}

struct RatioEstimate {
    ratio: f64,
    variance: f64,
}

fn delta_ratio_estimate(label: &str, sample: &RatioSample) -> Result<RatioEstimate> {
    if sample.numerator.len() != sample.denominator.len() {
        return Err(SimError::oracle(format!(
            "{label} numerator has {} units but denominator has {}",
            sample.numerator.len(),
            sample.denominator.len()
        )));
    }

    let x = sample_moments(label, &sample.numerator)?;
    let y = sample_moments(label, &sample.denominator)?;
    if y.mean == 0.0 {
        return Err(SimError::oracle(format!("{label} has zero mean denominator")));
    }

    let covariance = sample
        .numerator
        .iter()
        .zip(&sample.denominator)
        .map(|(xi, yi)| (xi - x.mean) * (yi - y.mean))
        .sum::<f64>()
        / (x.n - 1.0);

    let ratio = x.mean / y.mean;
    let variance = (x.variance / y.mean.powi(2)
        - 2.0 * x.mean * covariance / y.mean.powi(3)
        + x.mean.powi(2) * y.variance / y.mean.powi(4))
        / x.n;

    Ok(RatioEstimate {
        ratio,
        variance: variance.max(0.0),
    })
}

pub(crate) fn delta_ratio_z_test(a: &RatioSample, b: &RatioSample) -> Result<f64> {
    let ea = delta_ratio_estimate("group A", a)?;
    let eb = delta_ratio_estimate("group B", b)?;

    let difference = eb.ratio - ea.ratio;
    let se = (ea.variance + eb.variance).sqrt();
    if se == 0.0 {
        return Ok(degenerate_p_value(difference));
    }
    two_sided_normal_p(difference / se)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ratio(numerator: Vec<f64>) -> RatioSample {
        let denominator = vec![1.0; numerator.len()];
        RatioSample {
            numerator,
            denominator,
        }
    }

    #[test]
    fn welch_matches_known_value() {
        // t = 3.0 / sqrt(2.5/5 + 2.5/5) = 3.0, df = 8
        let a = [1.0, 2.0, 3.0, 4.0, 5.0];
        let b = [4.0, 5.0, 6.0, 7.0, 8.0];
        let p = welch_t_test(&a, &b).unwrap();
        assert!((p - 0.017071).abs() < 1e-5, "p={p}");
    }

    #[test]
    fn identical_groups_are_not_significant() {
        let a = [1.0, 2.0, 3.0, 4.0];
        let p = welch_t_test(&a, &a).unwrap();
        assert!((p - 1.0).abs() < 1e-12);

        let constant = [2.0; 10];
        assert_eq!(welch_t_test(&constant, &constant).unwrap(), 1.0);
        assert_eq!(welch_t_test(&constant, &[3.0; 10]).unwrap(), 0.0);
    }

    #[test]
    fn single_observation_is_an_oracle_failure() {
        let err = welch_t_test(&[1.0], &[2.0, 3.0]).unwrap_err();
        assert!(matches!(err, SimError::Oracle(_)));
    }

    #[test]
    fn two_proportion_matches_hand_computation() {
        // 10/100 vs 20/100: pooled 0.15, se = sqrt(0.15*0.85*0.02), z ~= 1.9803
        let mut a = vec![0_u8; 100];
        let mut b = vec![0_u8; 100];
        a[..10].fill(1);
        b[..20].fill(1);
        let p = two_proportion_z_test(&a, &b).unwrap();
        assert!((p - 0.04767).abs() < 1e-4, "p={p}");
    }

    #[test]
    fn all_zero_conversions_yield_p_one() {
        let zeros = vec![0_u8; 40];
        assert_eq!(two_proportion_z_test(&zeros, &zeros).unwrap(), 1.0);
    }

    #[test]
    fn delta_ratio_reduces_to_mean_z_test_with_unit_denominators() {
        let a = ratio(vec![0.0, 120.0, 0.0, 0.0, 120.0, 0.0, 0.0, 0.0]);
        let b = ratio(vec![120.0, 120.0, 0.0, 120.0, 0.0, 120.0, 0.0, 0.0]);
        let p = delta_ratio_z_test(&a, &b).unwrap();

        let na = 8.0;
        let mean_a = 30.0;
        let mean_b = 60.0;
        let var_a = (2.0 * 90.0_f64.powi(2) + 6.0 * 30.0_f64.powi(2)) / 7.0;
        let var_b = 8.0 * 60.0_f64.powi(2) / 7.0;
        let z = (mean_b - mean_a) / (var_a / na + var_b / na).sqrt();
        let expected = 2.0 * standard_normal().unwrap().sf(z);
        assert!((p - expected).abs() < 1e-12);
    }

    #[test]
    fn ratio_rejects_zero_denominator_and_length_mismatch() {
        let zero_denominator = RatioSample {
            numerator: vec![1.0, 2.0],
            denominator: vec![0.0, 0.0],
        };
        let ok = ratio(vec![1.0, 2.0]);
        assert!(matches!(
            delta_ratio_z_test(&zero_denominator, &ok).unwrap_err(),
            SimError::Oracle(_)
        ));

        let mismatched = RatioSample {
            numerator: vec![1.0, 2.0, 3.0],
            denominator: vec![1.0, 1.0],
        };
        assert!(matches!(
            delta_ratio_z_test(&ok, &mismatched).unwrap_err(),
            SimError::Oracle(_)
        ));
    }

    #[test]
    fn standard_oracle_dispatches_by_pair_kind() {
        let oracle = StandardOracle::default();
        let pair = SamplePair::Continuous {
            a: vec![0.0, 0.1, -0.1, 0.05],
            b: vec![10.0, 10.1, 9.9, 10.05],
        };
        let outcome = oracle.evaluate(&pair, 0.05).unwrap();
        assert!(outcome.p_value < 1e-6);

        let pair = SamplePair::Binary {
            a: vec![0, 1, 0, 1],
            b: vec![0, 1, 0, 1],
        };
        assert_eq!(oracle.evaluate(&pair, 0.05).unwrap().p_value, 1.0);
    }
}
