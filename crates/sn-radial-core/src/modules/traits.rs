use crate::common::config::RunParameters;
use crate::domain::SnResult;
use crate::numerics::fpenv::FpFlags;
use num_complex::Complex64;
use std::path::Path;

/// Durable storage for wavefunction snapshots and the settings log of a run
/// directory.
pub trait SnapshotStore {
    fn save(&mut self, run_dir: &Path, step: u64, psi: &[Complex64]) -> SnResult<()>;

    /// Fill `psi` with the snapshot taken at `step`; the stored length must
    /// match `psi.len()` exactly.
    fn load(&self, run_dir: &Path, step: u64, psi: &mut [Complex64]) -> SnResult<()>;

    fn has_snapshot(&self, run_dir: &Path, step: u64) -> bool;

    fn append_settings(
        &mut self,
        run_dir: &Path,
        parameters: &RunParameters,
        start_step: u64,
    ) -> SnResult<()>;
}

pub trait ProgressReporter {
    fn report(&mut self, step: u64, total_steps: u64);

    fn complete(&mut self, total_steps: u64);
}

/// Operator acknowledgment before a resumed run overwrites later snapshots.
pub trait ResumeConfirmation {
    /// `Ok(false)` declines the resume.
    fn confirm(&mut self, run_dir: &Path, resume_step: u64) -> SnResult<bool>;
}

pub trait FloatingPointMonitor {
    fn raised(&mut self) -> FpFlags;

    fn clear(&mut self);
}
