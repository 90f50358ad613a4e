use std::io::{self, Write};

use anyhow::{Context, Result};
use simlab::oracle::StandardOracle;
use simlab::report::{build_report, render_text};
use simlab::settings::ReportConfig;
use tracing::info;

use crate::cli::ReportArgs;

pub fn run(args: ReportArgs) -> Result<()> {
    let config = resolve_config(&args)?;
    let oracle = StandardOracle::new(args.ratio_method.into());

    info!(
        alpha = config.alpha,
        trials = config.trials,
        confidence = config.confidence,
        "starting simulation report"
    );

    let report = build_report(&config, &oracle).context("simulation report failed")?;

    let mut output = io::BufWriter::new(io::stdout().lock());
    if args.json {
        serde_json::to_writer_pretty(&mut output, &report)
            .context("failed to serialize report json output")?;
        writeln!(output)?;
        output.flush()?;
    } else {
        render_text(&report, &mut output).context("failed to write report")?;
    }

    Ok(())
}

fn resolve_config(args: &ReportArgs) -> Result<ReportConfig> {
    let mut config = match &args.settings_path {
        Some(path) => ReportConfig::load(path)
            .with_context(|| format!("failed to load report settings: {}", path.display()))?,
        None => ReportConfig::default(),
    };

    if let Some(alpha) = args.alpha {
        config.alpha = alpha;
    }
    if let Some(trials) = args.trials {
        config.trials = trials;
    }
    if let Some(confidence) = args.confidence {
        config.confidence = confidence;
    }
    Ok(config)
}
