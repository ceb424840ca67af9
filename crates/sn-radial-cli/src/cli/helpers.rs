use anyhow::Context;
use sn_radial_core::modules::{PromptConfirmation, RunReport, WidthDeviation};
use std::io::{Stdout, StdinLock, Write};
use std::path::Path;
use tracing_subscriber::EnvFilter;

/// Install the stderr log subscriber. `RUST_LOG` takes precedence over
/// `verbose`.
pub(super) fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    // An already installed global subscriber stays in place.
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

pub(super) fn stdin_confirmation() -> PromptConfirmation<StdinLock<'static>, Stdout> {
    PromptConfirmation::new(std::io::stdin().lock(), std::io::stdout())
}

pub(super) fn print_run_summary(report: &RunReport) -> anyhow::Result<()> {
    let mut out = std::io::stdout().lock();
    writeln!(out, "Run directory: {}", report.run_dir.display())
        .context("failed to write run summary")?;
    writeln!(
        out,
        "Steps {}..{}, {} snapshot(s), probability {:.15e}",
        report.start_step, report.final_step, report.snapshots_written, report.final_probability
    )
    .context("failed to write run summary")?;
    out.flush().context("failed to flush run summary")?;
    Ok(())
}

pub(super) fn print_analysis_summary(
    table: &Path,
    samples: usize,
    deviation: Option<(f64, Option<WidthDeviation>)>,
) -> anyhow::Result<()> {
    let mut out = std::io::stdout().lock();
    writeln!(out, "Observables: {} ({samples} rows)", table.display())
        .context("failed to write analysis summary")?;
    match deviation {
        Some((threshold, Some(found))) => writeln!(
            out,
            "Width departs from free spreading by {:.3e} > {threshold} at step {} (t = {:e} s)",
            found.deviation, found.step, found.time_s
        ),
        Some((threshold, None)) => {
            writeln!(out, "No width deviation above {threshold} from free spreading")
        }
        None => Ok(()),
    }
    .context("failed to write analysis summary")?;
    out.flush().context("failed to flush analysis summary")?;
    Ok(())
}
