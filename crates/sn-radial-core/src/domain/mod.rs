pub mod errors;

pub use errors::{SnError, SnErrorCategory, SnResult};

use num_complex::Complex64;
use std::fmt::{Display, Formatter};
use std::path::PathBuf;

/// Radial wavefunction sampled on shells `0..N`; shell `i` sits at radius `i * DR`.
pub type Wavefunction = Vec<Complex64>;

/// How a run obtains its initial state and output directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunMode {
    /// Fresh run below `output_root`, in a new timestamped directory.
    Start { output_root: PathBuf },
    /// Resume the run stored in `output_root/subpath` from the snapshot at `resume_step`.
    Continue {
        output_root: PathBuf,
        subpath: String,
        resume_step: u64,
    },
}

impl RunMode {
    pub fn output_root(&self) -> &PathBuf {
        match self {
            Self::Start { output_root } | Self::Continue { output_root, .. } => output_root,
        }
    }

    pub const fn is_continue(&self) -> bool {
        matches!(self, Self::Continue { .. })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RunPhase {
    Initializing,
    Stepping,
    Finalizing,
    Done,
}

impl RunPhase {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Initializing => "initializing",
            Self::Stepping => "stepping",
            Self::Finalizing => "finalizing",
            Self::Done => "done",
        }
    }
}

impl Display for RunPhase {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str((*self).as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::{RunMode, RunPhase};
    use std::path::PathBuf;

    #[test]
    fn run_mode_exposes_output_root_for_both_branches() {
        let start = RunMode::Start {
            output_root: PathBuf::from("/tmp/sn"),
        };
        let resume = RunMode::Continue {
            output_root: PathBuf::from("/tmp/sn"),
            subpath: "20100101-0000".to_string(),
            resume_step: 1000,
        };

        assert_eq!(start.output_root(), resume.output_root());
        assert!(!start.is_continue());
        assert!(resume.is_continue());
    }

    #[test]
    fn run_phase_renders_lowercase_names() {
        assert_eq!(RunPhase::Initializing.to_string(), "initializing");
        assert_eq!(RunPhase::Done.to_string(), "done");
    }
}
