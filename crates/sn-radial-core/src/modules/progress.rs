//! Console progress line and resume confirmation providers.

use super::traits::{ProgressReporter, ResumeConfirmation};
use crate::domain::{SnError, SnResult};
use std::io::{BufRead, Write};
use std::path::Path;

pub fn progress_percent(step: u64, total_steps: u64) -> u64 {
    if total_steps == 0 {
        return 100;
    }
    (100_u128 * u128::from(step) / u128::from(total_steps)) as u64
}

/// Overwrites a single `Progress NN%` status line on `out`.
#[derive(Debug)]
pub struct ProgressLine<W: Write> {
    out: W,
}

impl<W: Write> ProgressLine<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

impl ProgressLine<std::io::Stdout> {
    pub fn stdout() -> Self {
        Self::new(std::io::stdout())
    }
}

impl<W: Write> ProgressReporter for ProgressLine<W> {
    fn report(&mut self, step: u64, total_steps: u64) {
        // Status line write errors are ignored.
        let _ = write!(self.out, "Progress {}%\r", progress_percent(step, total_steps));
        let _ = self.out.flush();
    }

    fn complete(&mut self, total_steps: u64) {
        self.report(total_steps, total_steps);
        let _ = writeln!(self.out, "\nDone.");
        let _ = self.out.flush();
    }
}

/// Reporter that discards everything.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoProgress;

impl ProgressReporter for NoProgress {
    fn report(&mut self, _step: u64, _total_steps: u64) {}

    fn complete(&mut self, _total_steps: u64) {}
}

/// Answer decided up front, e.g. by `--yes`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PresetConfirmation(pub bool);

impl ResumeConfirmation for PresetConfirmation {
    fn confirm(&mut self, _run_dir: &Path, _resume_step: u64) -> SnResult<bool> {
        Ok(self.0)
    }
}

/// Prints the resume notice to `out` and waits for a line on `input`.
///
/// Any line, including an empty one, acknowledges. End of input declines.
#[derive(Debug)]
pub struct PromptConfirmation<R: BufRead, W: Write> {
    input: R,
    out: W,
}

impl<R: BufRead, W: Write> PromptConfirmation<R, W> {
    pub fn new(input: R, out: W) -> Self {
        Self { input, out }
    }

    pub fn into_parts(self) -> (R, W) {
        (self.input, self.out)
    }
}

impl<R: BufRead, W: Write> ResumeConfirmation for PromptConfirmation<R, W> {
    fn confirm(&mut self, run_dir: &Path, resume_step: u64) -> SnResult<bool> {
        let notice = format!(
            "Will continue writing to directory {} from t={}.\n\
             All data beyond this time will be overwritten!\n\
             Press [Enter] to continue . . .",
            run_dir.display(),
            resume_step
        );
        self.out
            .write_all(notice.as_bytes())
            .and_then(|()| self.out.flush())
            .map_err(|source| {
                SnError::io_system(
                    "IO.CONFIRMATION",
                    format!("failed to print resume notice: {source}"),
                )
            })?;

        let mut line = String::new();
        let read = self.input.read_line(&mut line).map_err(|source| {
            SnError::io_system(
                "IO.CONFIRMATION",
                format!("failed to read resume confirmation: {source}"),
            )
        })?;
        Ok(read > 0)
    }
}
