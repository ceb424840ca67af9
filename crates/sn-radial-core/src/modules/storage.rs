//! Binary wavefunction snapshots and the appended `param.txt` settings log.
//!
//! A snapshot `data/w{step:014}.dat` holds the N complex values of one step,
//! each as two little-endian `f64` (real part first).

use super::analysis::analysis_command;
use super::paths::{DATA_DIR, utc_stamp};
use super::traits::SnapshotStore;
use crate::common::config::RunParameters;
use crate::domain::{SnError, SnResult};
use num_complex::Complex64;
use std::fmt::Write as _;
use std::fs::{self, OpenOptions};
use std::io::Write as _;
use std::path::{Path, PathBuf};
use std::time::SystemTime;
use tracing::debug;

pub const SETTINGS_FILE: &str = "param.txt";
pub const BYTES_PER_VALUE: usize = 16;

#[derive(Debug, thiserror::Error)]
pub enum SnapshotError {
    #[error("failed to write snapshot '{}': {source}", path.display())]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to read snapshot '{}': {source}", path.display())]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("premature end of snapshot '{}': expected {expected} bytes, found {actual}", path.display())]
    PrematureEnd {
        path: PathBuf,
        expected: usize,
        actual: usize,
    },
    #[error("snapshot '{}' is longer than the grid: expected {expected} bytes, found {actual}", path.display())]
    TrailingData {
        path: PathBuf,
        expected: usize,
        actual: usize,
    },
    #[error("failed to append settings log '{}': {source}", path.display())]
    Settings {
        path: PathBuf,
        source: std::io::Error,
    },
}

impl From<SnapshotError> for SnError {
    fn from(error: SnapshotError) -> Self {
        let placeholder = match error {
            SnapshotError::Write { .. } => "IO.SNAPSHOT_WRITE",
            SnapshotError::Read { .. }
            | SnapshotError::PrematureEnd { .. }
            | SnapshotError::TrailingData { .. } => "IO.SNAPSHOT_READ",
            SnapshotError::Settings { .. } => "IO.SETTINGS_LOG",
        };
        SnError::io_system(placeholder, error.to_string())
    }
}

pub fn snapshot_path(run_dir: &Path, step: u64) -> PathBuf {
    run_dir.join(DATA_DIR).join(format!("w{step:014}.dat"))
}

pub fn encode_snapshot(psi: &[Complex64]) -> Vec<u8> {
    let mut bytes = Vec::with_capacity(psi.len() * BYTES_PER_VALUE);
    for value in psi {
        bytes.extend_from_slice(&value.re.to_le_bytes());
        bytes.extend_from_slice(&value.im.to_le_bytes());
    }
    bytes
}

/// Decode into `psi`, which fixes the expected length.
pub fn decode_snapshot(
    path: &Path,
    bytes: &[u8],
    psi: &mut [Complex64],
) -> Result<(), SnapshotError> {
    let expected = psi.len() * BYTES_PER_VALUE;
    if bytes.len() < expected {
        return Err(SnapshotError::PrematureEnd {
            path: path.to_path_buf(),
            expected,
            actual: bytes.len(),
        });
    }
    if bytes.len() > expected {
        return Err(SnapshotError::TrailingData {
            path: path.to_path_buf(),
            expected,
            actual: bytes.len(),
        });
    }

    for (value, chunk) in psi.iter_mut().zip(bytes.chunks_exact(BYTES_PER_VALUE)) {
        let (re, im) = chunk.split_at(8);
        let mut re_bytes = [0_u8; 8];
        let mut im_bytes = [0_u8; 8];
        re_bytes.copy_from_slice(re);
        im_bytes.copy_from_slice(im);
        *value = Complex64::new(f64::from_le_bytes(re_bytes), f64::from_le_bytes(im_bytes));
    }
    Ok(())
}

/// Human-readable block appended to the settings log on every start or resume.
pub fn render_settings_block(
    parameters: &RunParameters,
    run_dir: &Path,
    start_step: u64,
    stamp: &str,
) -> String {
    let rule = "*********************************";
    let mut block = String::new();
    // Writing into a String cannot fail.
    let _ = writeln!(block, "{rule}");
    let _ = writeln!(block, " SETTINGS FOR RUN @ {stamp}");
    let _ = writeln!(block, " STARTING WITH t = {start_step:>14}");
    let _ = writeln!(block, "{rule}");
    let _ = writeln!(block, "width in nm: {:>20}", parameters.width_nm);
    let _ = writeln!(block, "mass in u  : {:>20e}", parameters.mass_u);
    let _ = writeln!(block, "grid size  : {:>20}", parameters.grid_size);
    let _ = writeln!(block, "dr in nm   : {:>20}", parameters.dr_nm);
    let _ = writeln!(block, "dt in ns   : {:>20e}", parameters.dt_ns);
    let _ = writeln!(block, "max. time  : {:>20}", parameters.total_steps);
    let _ = writeln!(block, "save every : {:>20}", parameters.save_every);
    let _ = writeln!(block, "coupling   : {:>20}", parameters.coupling);
    let _ = writeln!(block, "wave funct.: {:>20}", parameters.shape.code());
    let _ = writeln!(block, "total time : {:>18e} s", parameters.total_time_s());
    let _ = writeln!(block, "analysis   : {}", analysis_command(parameters, run_dir));
    if !parameters.numerical_checks {
        let _ = writeln!(block, "!results obtained in UNSAFE mode!");
    }
    block.push('\n');
    block
}

/// Snapshot store on the local filesystem.
#[derive(Debug, Clone, Copy, Default)]
pub struct FileSnapshotStore;

impl FileSnapshotStore {
    pub fn new() -> Self {
        Self
    }
}

impl SnapshotStore for FileSnapshotStore {
    fn save(&mut self, run_dir: &Path, step: u64, psi: &[Complex64]) -> SnResult<()> {
        let path = snapshot_path(run_dir, step);
        fs::write(&path, encode_snapshot(psi))
            .map_err(|source| SnapshotError::Write {
                path: path.clone(),
                source,
            })?;
        debug!(step, path = %path.display(), "wrote snapshot");
        Ok(())
    }

    fn load(&self, run_dir: &Path, step: u64, psi: &mut [Complex64]) -> SnResult<()> {
        let path = snapshot_path(run_dir, step);
        let bytes = fs::read(&path).map_err(|source| SnapshotError::Read {
            path: path.clone(),
            source,
        })?;
        decode_snapshot(&path, &bytes, psi)?;
        debug!(step, path = %path.display(), "loaded snapshot");
        Ok(())
    }

    fn has_snapshot(&self, run_dir: &Path, step: u64) -> bool {
        snapshot_path(run_dir, step).is_file()
    }

    fn append_settings(
        &mut self,
        run_dir: &Path,
        parameters: &RunParameters,
        start_step: u64,
    ) -> SnResult<()> {
        let path = run_dir.join(SETTINGS_FILE);
        let block = render_settings_block(
            parameters,
            run_dir,
            start_step,
            &utc_stamp(SystemTime::now())?,
        );
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .map_err(|source| SnapshotError::Settings {
                path: path.clone(),
                source,
            })?;
        file.write_all(block.as_bytes())
            .map_err(|source| SnapshotError::Settings {
                path: path.clone(),
                source,
            })?;
        debug!(start_step, path = %path.display(), "appended settings log");
        Ok(())
    }
}
