//! Wilson score intervals for rejection rates.

use serde::{Deserialize, Serialize};

use crate::error::{Result, SimError};

/// Confidence interval for a binomial proportion.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ProportionInterval {
    pub estimate: f64,
    pub low: f64,
    pub high: f64,
}

// Acklam's rational approximation to the standard normal quantile.
const A: [f64; 6] = [
    -3.969683028665376e01,
    2.209460984245205e02,
    -2.759285104469687e02,
    1.383577518672690e02,
    -3.066479806614716e01,
    2.506628277459239e00,
];
const B: [f64; 5] = [
    -5.447609879822406e01,
    1.615858368580409e02,
    -1.556989798598866e02,
    6.680131188771972e01,
    -1.328068155288572e01,
];
const C: [f64; 6] = [
    -7.784894002430293e-03,
    -3.223964580411365e-01,
    -2.400758277161838e00,
    -2.549732539343734e00,
    4.374664141464968e00,
    2.938163982698783e00,
];
const D: [f64; 4] = [
    7.784695709041462e-03,
    3.224671290700398e-01,
    2.445134137142996e00,
    3.754408661907416e00,
];

const P_LOW: f64 = 0.02425;
const P_HIGH: f64 = 1.0 - P_LOW;

fn tail_quantile(q: f64) -> f64 {
    (((((C[0] * q + C[1]) * q + C[2]) * q + C[3]) * q + C[4]) * q + C[5])
        / ((((D[0] * q + D[1]) * q + D[2]) * q + D[3]) * q + 1.0)
}

/// Approximate inverse CDF of the standard normal distribution.
///
/// Relative error is about 1.15e-9 over the whole open interval.
pub fn normal_inverse_cdf(p: f64) -> Result<f64> {
    if !(p > 0.0 && p < 1.0) {
        return Err(SimError::invalid(format!(
            "probability must lie strictly between 0 and 1, got {p}"
        )));
    }

    if p < P_LOW {
        let q = (-2.0 * p.ln()).sqrt();
        return Ok(tail_quantile(q));
    }

    if p > P_HIGH {
        let q = (-2.0 * (1.0 - p).ln()).sqrt();
        return Ok(-tail_quantile(q));
    }

    let q = p - 0.5;
    let r = q * q;
    Ok(
        (((((A[0] * r + A[1]) * r + A[2]) * r + A[3]) * r + A[4]) * r + A[5]) * q
            / (((((B[0] * r + B[1]) * r + B[2]) * r + B[3]) * r + B[4]) * r + 1.0),
    )
}

/// Two-sided Wilson score interval for `successes` out of `trials`.
///
/// Stays inside `[0, 1]` and remains informative when the observed proportion
/// is 0 or 1, where the plain normal-approximation interval collapses.
pub fn wilson_interval(successes: u64, trials: u64, confidence: f64) -> Result<ProportionInterval> {
    if trials == 0 {
        return Err(SimError::invalid("trials must be positive"));
    }
    if successes > trials {
        return Err(SimError::invalid(format!(
            "successes must be between 0 and trials ({trials}), got {successes}"
        )));
    }
    if !(confidence > 0.0 && confidence < 1.0) {
        return Err(SimError::invalid(format!(
            "confidence must lie strictly between 0 and 1, got {confidence}"
        )));
    }

    let z = normal_inverse_cdf(0.5 + confidence / 2.0)?;
    let n = trials as f64;
    let p_hat = successes as f64 / n;
    let z2 = z * z;

    let denom = 1.0 + z2 / n;
    let center = (p_hat + z2 / (2.0 * n)) / denom;
    let half_width = (z / denom) * (p_hat * (1.0 - p_hat) / n + z2 / (4.0 * n * n)).sqrt();

    // Rounding can push a bound across the estimate at the boundaries.
    let low = (center - half_width).max(0.0).min(p_hat);
    let high = (center + half_width).min(1.0).max(p_hat);

    Ok(ProportionInterval {
        estimate: p_hat,
        low,
        high,
    })
}
