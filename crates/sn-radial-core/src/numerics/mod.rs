pub mod fpenv;
pub mod norm;
pub mod observables;
pub mod offdiagonal;
pub mod potential;
pub mod tridiagonal;

pub use fpenv::{FpFlags, HardwareFpMonitor};
pub use norm::total_probability;
pub use observables::{free_gaussian, half_width, phase_profile, r90, rmax, width_deviation};
pub use offdiagonal::OffDiagonals;
pub use potential::PotentialEvaluator;
pub use tridiagonal::{StepSolver, TridiagonalError};
