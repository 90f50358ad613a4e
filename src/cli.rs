use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};
use simlab::oracle::RatioMethod;

#[derive(Parser, Debug)]
#[command(
    name = "simlab",
    version,
    about = "Monte Carlo Type I error and power simulation for A/B tests"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Print Type I error and power for each metric family.
    Report(ReportArgs),
    /// Sweep sample sizes and write the rejection rates to CSV.
    Sweep(SweepArgs),
    /// Wilson score interval for an observed rejection count.
    Interval(IntervalArgs),
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum)]
pub enum RatioMethodArg {
    Delta,
}

impl From<RatioMethodArg> for RatioMethod {
    fn from(value: RatioMethodArg) -> Self {
        match value {
            RatioMethodArg::Delta => RatioMethod::Delta,
        }
    }
}

#[derive(Args, Debug, Clone)]
pub struct ReportArgs {
    #[arg(long)]
    pub alpha: Option<f64>,

    #[arg(long)]
    pub trials: Option<u64>,

    #[arg(long)]
    pub confidence: Option<f64>,

    /// JSON file holding a report configuration; flags override its values.
    #[arg(long)]
    pub settings_path: Option<PathBuf>,

    #[arg(long, value_enum, default_value_t = RatioMethodArg::Delta)]
    pub ratio_method: RatioMethodArg,

    #[arg(long, default_value_t = false)]
    pub json: bool,
}

#[derive(Args, Debug, Clone)]
pub struct SweepArgs {
    #[arg(long, default_value = "results/sweep.csv")]
    pub output_path: PathBuf,

    #[arg(long, default_value_t = 1000)]
    pub trials: u64,

    #[arg(long, default_value_t = 0.05)]
    pub alpha: f64,

    #[arg(
        long = "sample-size",
        value_delimiter = ',',
        default_values_t = [100_usize, 200, 500, 1000]
    )]
    pub sample_sizes: Vec<usize>,

    #[arg(long, default_value_t = 0)]
    pub seed_base: u64,

    /// JSON file holding metric settings (mean, conversion, ratio scenarios).
    #[arg(long)]
    pub settings_path: Option<PathBuf>,

    #[arg(long, value_enum, default_value_t = RatioMethodArg::Delta)]
    pub ratio_method: RatioMethodArg,

    /// Defaults to `<output-path>.manifest.json`.
    #[arg(long)]
    pub manifest_path: Option<PathBuf>,

    #[arg(long, default_value_t = false)]
    pub no_manifest: bool,
}

#[derive(Args, Debug, Clone)]
pub struct IntervalArgs {
    #[arg(long)]
    pub successes: u64,

    #[arg(long)]
    pub trials: u64,

    #[arg(long, default_value_t = 0.95)]
    pub confidence: f64,

    #[arg(long, default_value_t = false)]
    pub json: bool,
}

#[cfg(test)]
mod tests {
    use clap::CommandFactory;

    use super::*;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn sweep_defaults_match_stock_run() {
        let cli = Cli::try_parse_from(["simlab", "sweep"]).expect("sweep parses without flags");
        let Commands::Sweep(args) = cli.command else {
            panic!("expected sweep command");
        };
        assert_eq!(args.sample_sizes, vec![100, 200, 500, 1000]);
        assert_eq!(args.trials, 1000);
        assert_eq!(args.output_path, PathBuf::from("results/sweep.csv"));
    }

    #[test]
    fn sample_sizes_accept_repeats_and_commas() {
        let cli = Cli::try_parse_from([
            "simlab",
            "sweep",
            "--sample-size",
            "50,100",
            "--sample-size",
            "250",
        ])
        .expect("sample sizes parse");
        let Commands::Sweep(args) = cli.command else {
            panic!("expected sweep command");
        };
        assert_eq!(args.sample_sizes, vec![50, 100, 250]);
    }
}
