pub mod analysis;
pub mod driver;
pub mod initial;
pub mod paths;
pub mod progress;
pub mod storage;
pub mod traits;

pub use analysis::{ObservableSample, RunAnalysis, WidthDeviation, write_observables};
pub use driver::{FpEvent, IntegrationDriver, RunCollaborators, RunReport};
pub use initial::{WavefunctionShape, initial_wavefunction};
pub use paths::PathManager;
pub use progress::{NoProgress, PresetConfirmation, ProgressLine, PromptConfirmation};
pub use storage::FileSnapshotStore;
pub use traits::{FloatingPointMonitor, ProgressReporter, ResumeConfirmation, SnapshotStore};
