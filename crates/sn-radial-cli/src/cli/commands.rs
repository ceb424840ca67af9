use super::CliError;
use super::helpers::{print_analysis_summary, print_run_summary, stdin_confirmation};
use sn_radial_core::common::config::RunParameters;
use sn_radial_core::domain::{RunMode, SnError};
use sn_radial_core::modules::paths::existing_run_dir;
use sn_radial_core::modules::{
    FileSnapshotStore, IntegrationDriver, PresetConfirmation, ProgressLine, ResumeConfirmation,
    RunAnalysis, RunCollaborators, WavefunctionShape, write_observables,
};
use sn_radial_core::numerics::HardwareFpMonitor;
use std::path::PathBuf;

/// Run parameter overrides accepted before or after the subcommand.
#[derive(clap::Args, Debug, Default)]
pub(super) struct RunFlags {
    /// JSON file with run parameters; missing fields keep their defaults
    #[arg(long, global = true, value_name = "PATH")]
    params: Option<PathBuf>,

    /// Initial packet width in nm
    #[arg(long, global = true, value_name = "NM")]
    width: Option<f64>,

    /// Mass in atomic mass units
    #[arg(long, global = true, value_name = "U")]
    mass: Option<f64>,

    /// Number of radial shells
    #[arg(long, global = true, value_name = "N")]
    grid_size: Option<usize>,

    /// Shell thickness in nm
    #[arg(long, global = true, value_name = "NM")]
    dr: Option<f64>,

    /// Time step in ns
    #[arg(long, global = true, value_name = "NS")]
    dt: Option<f64>,

    /// Total number of time steps
    #[arg(long, global = true, value_name = "N")]
    steps: Option<u64>,

    /// Write a snapshot every N steps
    #[arg(long, global = true, value_name = "N")]
    save_every: Option<u64>,

    /// Coupling constant of the self-gravitation term
    #[arg(long, global = true, value_name = "X")]
    coupling: Option<f64>,

    /// Initial wavefunction: gaussian (g), rectangular (r) or exp-ball (b)
    #[arg(long, global = true, value_name = "SHAPE")]
    shape: Option<WavefunctionShape>,

    /// Skip the weak-potential and floating-point checks
    #[arg(long, global = true)]
    no_checks: bool,

    /// Log at debug level unless RUST_LOG says otherwise
    #[arg(long, short = 'v', global = true)]
    pub(super) verbose: bool,
}

#[derive(clap::Args, Debug, Default)]
pub(super) struct StartArgs {
    /// Directory below which the timestamped run directory is created
    #[arg(long, value_name = "PATH")]
    output_root: Option<PathBuf>,
}

#[derive(clap::Args, Debug)]
pub(super) struct ContinueArgs {
    /// Run directory name below the output root, e.g. 20100101-0000
    #[arg(value_name = "SUBPATH")]
    subpath: String,

    /// Step of the snapshot to resume from
    #[arg(value_name = "STEP")]
    step: u64,

    /// Directory holding the run directory
    #[arg(long, value_name = "PATH")]
    output_root: Option<PathBuf>,

    /// Resume without waiting for confirmation; later snapshots are overwritten
    #[arg(long, short = 'y')]
    yes: bool,
}

#[derive(clap::Args, Debug)]
pub(super) struct AnalyzeArgs {
    /// Run directory name below the output root, e.g. 20100101-0000
    #[arg(value_name = "SUBPATH")]
    subpath: String,

    /// Directory holding the run directory
    #[arg(long, value_name = "PATH")]
    output_root: Option<PathBuf>,

    /// Also report the first snapshot whose width departs from free
    /// spreading by more than this relative amount
    #[arg(long, value_name = "X")]
    deviation: Option<f64>,
}

pub(super) fn run_start_command(flags: &RunFlags, args: StartArgs) -> Result<i32, CliError> {
    let parameters = resolve_parameters(flags)?;
    let mode = RunMode::Start {
        output_root: args
            .output_root
            .unwrap_or_else(|| parameters.output_root.clone()),
    };
    execute_run(parameters, &mode, &mut PresetConfirmation(true))
}

pub(super) fn run_continue_command(flags: &RunFlags, args: ContinueArgs) -> Result<i32, CliError> {
    let parameters = resolve_parameters(flags)?;
    let mode = RunMode::Continue {
        output_root: args
            .output_root
            .unwrap_or_else(|| parameters.output_root.clone()),
        subpath: args.subpath,
        resume_step: args.step,
    };
    if args.yes {
        execute_run(parameters, &mode, &mut PresetConfirmation(true))
    } else {
        execute_run(parameters, &mode, &mut stdin_confirmation())
    }
}

pub(super) fn run_analyze_command(flags: &RunFlags, args: AnalyzeArgs) -> Result<i32, CliError> {
    if let Some(threshold) = args.deviation {
        if !threshold.is_finite() || threshold < 0.0 {
            return Err(CliError::Usage(format!(
                "deviation must be finite and non-negative, got {threshold}"
            )));
        }
    }
    let parameters = resolve_parameters(flags)?;
    let output_root = args
        .output_root
        .unwrap_or_else(|| parameters.output_root.clone());
    let run_dir = existing_run_dir(&output_root, &args.subpath)?;
    let store = FileSnapshotStore::new();
    let analysis = RunAnalysis::new(&parameters, &store, &run_dir);

    let samples = analysis.observables()?;
    let table = write_observables(&run_dir, &samples)?;
    let deviation = match args.deviation {
        Some(threshold) => Some((threshold, analysis.first_width_deviation(threshold)?)),
        None => None,
    };
    print_analysis_summary(&table, samples.len(), deviation)?;
    Ok(0)
}

fn resolve_parameters(flags: &RunFlags) -> Result<RunParameters, CliError> {
    let mut parameters = match &flags.params {
        Some(path) => RunParameters::load(path).map_err(SnError::from)?,
        None => RunParameters::default(),
    };
    if let Some(width) = flags.width {
        parameters.width_nm = width;
    }
    if let Some(mass) = flags.mass {
        parameters.mass_u = mass;
    }
    if let Some(grid_size) = flags.grid_size {
        parameters.grid_size = grid_size;
    }
    if let Some(dr) = flags.dr {
        parameters.dr_nm = dr;
    }
    if let Some(dt) = flags.dt {
        parameters.dt_ns = dt;
    }
    if let Some(steps) = flags.steps {
        parameters.total_steps = steps;
    }
    if let Some(save_every) = flags.save_every {
        parameters.save_every = save_every;
    }
    if let Some(coupling) = flags.coupling {
        parameters.coupling = coupling;
    }
    if let Some(shape) = flags.shape {
        parameters.shape = shape;
    }
    if flags.no_checks {
        parameters.numerical_checks = false;
    }
    parameters.validate().map_err(SnError::from)?;
    Ok(parameters)
}

fn execute_run(
    parameters: RunParameters,
    mode: &RunMode,
    confirmation: &mut dyn ResumeConfirmation,
) -> Result<i32, CliError> {
    let mut driver = IntegrationDriver::new(parameters)?;
    let report = driver.run(
        mode,
        RunCollaborators {
            store: &mut FileSnapshotStore::new(),
            progress: &mut ProgressLine::stdout(),
            confirmation,
            fp_monitor: &mut HardwareFpMonitor::new(),
        },
    )?;
    print_run_summary(&report)?;
    Ok(0)
}

#[cfg(test)]
mod tests {
    use super::{RunFlags, resolve_parameters};
    use crate::cli::CliError;
    use sn_radial_core::modules::WavefunctionShape;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn overrides_apply_on_top_of_parameter_file() {
        let temp = TempDir::new().expect("tempdir should be created");
        let path = temp.path().join("run.json");
        fs::write(&path, r#"{ "grid_size": 32, "total_steps": 100, "save_every": 10 }"#)
            .expect("parameter file should be written");

        let parameters = resolve_parameters(&RunFlags {
            params: Some(path),
            steps: Some(40),
            coupling: Some(0.5),
            shape: Some(WavefunctionShape::ExpBall),
            no_checks: true,
            ..RunFlags::default()
        })
        .expect("parameters should resolve");

        assert_eq!(parameters.grid_size, 32);
        assert_eq!(parameters.total_steps, 40);
        assert_eq!(parameters.save_every, 10);
        assert_eq!(parameters.coupling, 0.5);
        assert_eq!(parameters.shape, WavefunctionShape::ExpBall);
        assert!(!parameters.numerical_checks);
    }

    #[test]
    fn physical_overrides_replace_defaults() {
        let parameters = resolve_parameters(&RunFlags {
            width: Some(50.0),
            mass: Some(1.0e3),
            grid_size: Some(1500),
            dr: Some(0.6),
            dt: Some(100.0),
            ..RunFlags::default()
        })
        .expect("parameters should resolve");

        assert_eq!(parameters.width_nm, 50.0);
        assert_eq!(parameters.mass_u, 1.0e3);
        assert_eq!(parameters.grid_size, 1500);
        assert_eq!(parameters.dr_nm, 0.6);
        assert_eq!(parameters.dt_ns, 100.0);
    }

    #[test]
    fn invalid_override_is_rejected() {
        let error = resolve_parameters(&RunFlags {
            save_every: Some(0),
            ..RunFlags::default()
        })
        .expect_err("zero save interval should fail");
        match error {
            CliError::Run(error) => assert_eq!(error.exit_code(), 2),
            other => panic!("expected run error, got {other}"),
        }
    }
}
