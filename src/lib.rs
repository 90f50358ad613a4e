//! Monte Carlo estimation of Type I error and power for A/B test statistics.
//!
//! A [`generate::Scenario`] synthesizes paired samples from a known process, a
//! [`oracle::TestOracle`] turns each pair into a p-value, and
//! [`runner::run_trials`] counts how often the p-value falls below alpha. The
//! rejection count converts to a Wilson score interval via
//! [`interval::wilson_interval`]; [`sweep`] and [`report`] drive the runner
//! across sample sizes and metric families.

pub mod error;
pub mod generate;
pub mod interval;
pub mod model;
pub mod oracle;
pub mod report;
pub mod rng;
pub mod runner;
pub mod settings;
pub mod sweep;
pub mod util;

pub use error::{Result, SimError};
