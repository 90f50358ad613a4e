use std::ffi::OsString;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use simlab::oracle::StandardOracle;
use simlab::settings::MetricSettings;
use simlab::sweep::{SweepConfig, run_sweep_to_csv};
use simlab::util::write_json_pretty;
use tracing::info;

use crate::cli::SweepArgs;

pub fn run(args: SweepArgs) -> Result<()> {
    let settings = match &args.settings_path {
        Some(path) => MetricSettings::load(path)
            .with_context(|| format!("failed to load metric settings: {}", path.display()))?,
        None => MetricSettings::default(),
    };

    let config = SweepConfig {
        trials: args.trials,
        alpha: args.alpha,
        sample_sizes: args.sample_sizes.clone(),
        seed_base: args.seed_base,
        settings,
    };
    let oracle = StandardOracle::new(args.ratio_method.into());

    info!(
        output = %args.output_path.display(),
        trials = config.trials,
        alpha = config.alpha,
        sample_sizes = ?config.sample_sizes,
        seed_base = config.seed_base,
        "starting sweep"
    );

    let manifest = run_sweep_to_csv(&args.output_path, &config, &oracle)
        .with_context(|| format!("sweep failed for {}", args.output_path.display()))?;
    info!(
        path = %args.output_path.display(),
        rows = manifest.row_count,
        sha256 = %manifest.output_sha256,
        "wrote sweep csv"
    );

    if !args.no_manifest {
        let manifest_path = args
            .manifest_path
            .clone()
            .unwrap_or_else(|| default_manifest_path(&args.output_path));
        write_json_pretty(&manifest_path, &manifest)
            .with_context(|| format!("failed to write {}", manifest_path.display()))?;
        info!(path = %manifest_path.display(), "wrote sweep manifest");
    }

    Ok(())
}

fn default_manifest_path(output_path: &Path) -> PathBuf {
    let mut name = output_path
        .file_name()
        .map(OsString::from)
        .unwrap_or_else(|| OsString::from("sweep"));
    name.push(".manifest.json");
    output_path.with_file_name(name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn manifest_sits_next_to_csv() {
        assert_eq!(
            default_manifest_path(Path::new("results/sweep.csv")),
            PathBuf::from("results/sweep.csv.manifest.json")
        );
    }
}
