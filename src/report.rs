//! Fixed Type I error / power report across the three metric families.

use std::io::Write;

use serde::Serialize;
use tracing::info;

use crate::error::{Result, SimError};
use crate::generate::MetricFamily;
use crate::interval::ProportionInterval;
use crate::model::SimulationResult;
use crate::oracle::TestOracle;
use crate::runner::{TrialConfig, run_trials};
use crate::settings::ReportConfig;

#[derive(Debug, Clone, Serialize)]
pub struct MetricReport {
    pub family: MetricFamily,
    pub n_per_group: usize,
    pub type1: SimulationResult,
    pub type1_interval: ProportionInterval,
    pub power: SimulationResult,
}

#[derive(Debug, Clone, Serialize)]
pub struct SimulationReport {
    pub alpha: f64,
    pub trials: u64,
    pub confidence: f64,
    pub metrics: Vec<MetricReport>,
}

pub fn build_report<O: TestOracle + ?Sized>(
    config: &ReportConfig,
    oracle: &O,
) -> Result<SimulationReport> {
    config.metrics.validate()?;

    let mut metrics = Vec::with_capacity(MetricFamily::ALL.len());
    for family in MetricFamily::ALL {
        let cell = config.cell(family);
        let alternative = config.metrics.scenario(family);

        let type1 = run_trials(
            &alternative.null(),
            cell.n_per_group,
            oracle,
            &TrialConfig {
                trials: config.trials,
                alpha: config.alpha,
                seed: cell.type1_seed,
            },
        )?;
        let power = run_trials(
            &alternative,
            cell.n_per_group,
            oracle,
            &TrialConfig {
                trials: config.trials,
                alpha: config.alpha,
                seed: cell.power_seed,
            },
        )?;
        let type1_interval = type1.wilson_interval(config.confidence)?;

        info!(
            family = family.as_str(),
            type1 = type1.rejection_rate(),
            power = power.rejection_rate(),
            "report metric complete"
        );

        metrics.push(MetricReport {
            family,
            n_per_group: cell.n_per_group,
            type1,
            type1_interval,
            power,
        });
    }

    Ok(SimulationReport {
        alpha: config.alpha,
        trials: config.trials,
        confidence: config.confidence,
        metrics,
    })
}

fn fmt3(x: f64) -> String {
    format!("{x:.3}")
}

/// Confidence level as a percent label, e.g. `95` or `99.9`.
pub fn confidence_label(confidence: f64) -> String {
    let percent = format!("{:.4}", confidence * 100.0);
    percent
        .trim_end_matches('0')
        .trim_end_matches('.')
        .to_string()
}

pub fn render_text<W: Write>(report: &SimulationReport, output: &mut W) -> Result<()> {
    render_lines(report, output).map_err(|err| SimError::io("<report output>", err))
}

fn render_lines<W: Write>(report: &SimulationReport, output: &mut W) -> std::io::Result<()> {
    writeln!(output, "Experimentation Simulation Report")?;
    writeln!(output, "--------------------------------")?;
    writeln!(
        output,
        "This report runs a few small simulations and prints rejection rates."
    )?;
    writeln!(output, "Under no effect: rejection rate approximates Type I error.")?;
    writeln!(output, "Under a real effect: rejection rate approximates power.")?;
    writeln!(output)?;

    let label = confidence_label(report.confidence);
    for metric in &report.metrics {
        writeln!(output, "{}", metric.family.title())?;
        writeln!(
            output,
            "  Type I error: {} ({label}% CI {} to {})",
            fmt3(metric.type1.rejection_rate()),
            fmt3(metric.type1_interval.low),
            fmt3(metric.type1_interval.high),
        )?;
        writeln!(output, "  Power: {}", fmt3(metric.power.rejection_rate()))?;
        writeln!(output)?;
    }
    output.flush()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::oracle::StandardOracle;

    fn small_config() -> ReportConfig {
        ReportConfig {
            trials: 150,
            ..ReportConfig::default()
        }
    }

    #[test]
    fn confidence_label_trims_trailing_zeros() {
        assert_eq!(confidence_label(0.95), "95");
        assert_eq!(confidence_label(0.999), "99.9");
        assert_eq!(confidence_label(0.9), "90");
    }

    #[test]
    fn report_covers_every_family_in_order() {
        let report = build_report(&small_config(), &StandardOracle::default()).unwrap();
        let families: Vec<MetricFamily> = report.metrics.iter().map(|m| m.family).collect();
        assert_eq!(families, MetricFamily::ALL.to_vec());

        for metric in &report.metrics {
            assert_eq!(metric.type1.trials(), 150);
            let iv = metric.type1_interval;
            assert!(iv.low <= metric.type1.rejection_rate());
            assert!(metric.type1.rejection_rate() <= iv.high);
        }
        assert_eq!(report.metrics[1].n_per_group, 500);
    }

    #[test]
    fn report_is_reproducible() {
        let oracle = StandardOracle::default();
        let first = build_report(&small_config(), &oracle).unwrap();
        let second = build_report(&small_config(), &oracle).unwrap();
        for (a, b) in first.metrics.iter().zip(&second.metrics) {
            assert_eq!(a.type1, b.type1);
            assert_eq!(a.power, b.power);
        }
    }

    #[test]
    fn text_rendering_uses_three_decimals_and_ci() {
        let type1 = SimulationResult::from_counts(2000, 0.05, 102).unwrap();
        let power = SimulationResult::from_counts(2000, 0.05, 1698).unwrap();
        let report = SimulationReport {
            alpha: 0.05,
            trials: 2000,
            confidence: 0.95,
            metrics: vec![MetricReport {
                family: MetricFamily::Mean,
                n_per_group: 200,
                type1,
                type1_interval: type1.wilson_interval(0.95).unwrap(),
                power,
            }],
        };

        let mut buf = Vec::new();
        render_text(&report, &mut buf).unwrap();
        let text = String::from_utf8(buf).unwrap();

        assert!(text.starts_with("Experimentation Simulation Report\n"));
        assert!(text.contains("Mean metric (normal data)\n"));
        assert!(text.contains("  Type I error: 0.051 (95% CI 0.042 to 0.062)\n"));
        assert!(text.contains("  Power: 0.849\n"));
    }

    #[test]
    fn invalid_confidence_fails_the_report() {
        let config = ReportConfig {
            trials: 20,
            confidence: 1.0,
            ..ReportConfig::default()
        };
        let err = build_report(&config, &StandardOracle::default()).unwrap_err();
        assert!(err.is_invalid_argument());
    }
}
