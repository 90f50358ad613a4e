use std::io::{self, Write};

use anyhow::{Context, Result};
use serde::Serialize;
use simlab::interval::{ProportionInterval, wilson_interval};
use simlab::report::confidence_label;
use tracing::info;

use crate::cli::IntervalArgs;

#[derive(Debug, Serialize)]
struct IntervalResponse {
    successes: u64,
    trials: u64,
    confidence: f64,
    interval: ProportionInterval,
}

pub fn run(args: IntervalArgs) -> Result<()> {
    let interval = wilson_interval(args.successes, args.trials, args.confidence)
        .context("failed to compute wilson interval")?;

    info!(
        successes = args.successes,
        trials = args.trials,
        confidence = args.confidence,
        "computed wilson interval"
    );

    let mut output = io::BufWriter::new(io::stdout().lock());
    if args.json {
        let response = IntervalResponse {
            successes: args.successes,
            trials: args.trials,
            confidence: args.confidence,
            interval,
        };
        serde_json::to_writer_pretty(&mut output, &response)
            .context("failed to serialize interval json output")?;
        writeln!(output)?;
    } else {
        writeln!(
            output,
            "{:.3} ({}% CI {:.3} to {:.3})",
            interval.estimate,
            confidence_label(args.confidence),
            interval.low,
            interval.high
        )?;
    }
    output.flush()?;
    Ok(())
}
