//! Post-run analysis over the snapshots of a run directory.
//!
//! Every snapshot a run writes is reduced to a few radii, tabulated in
//! `observables.dat`, and compared with the free gaussian to find when
//! self-gravity first changes the width noticeably.

use super::initial::{WavefunctionShape, initial_wavefunction};
use super::traits::SnapshotStore;
use crate::common::config::RunParameters;
use crate::domain::{SnError, SnResult, Wavefunction};
use crate::numerics::norm::total_probability;
use crate::numerics::observables::{free_gaussian, r90, rmax, width_deviation};
use num_complex::Complex64;
use std::fmt::Write as _;
use std::fs::OpenOptions;
use std::io::{ErrorKind, Write as _};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

pub const OBSERVABLES_FILE: &str = "observables.dat";

/// Steps at which a run with these settings writes snapshots, in order.
pub fn saved_steps(total_steps: u64, save_every: u64) -> Vec<u64> {
    if save_every == 0 {
        return Vec::new();
    }
    let mut steps: Vec<u64> = (1..=total_steps / save_every)
        .map(|multiple| multiple * save_every)
        .collect();
    if total_steps % save_every != 0 {
        steps.push(total_steps);
    }
    steps
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ObservableSample {
    pub step: u64,
    pub time_s: f64,
    pub r90_nm: f64,
    pub rmax_nm: f64,
    pub probability: f64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WidthDeviation {
    pub step: u64,
    pub time_s: f64,
    pub deviation: f64,
}

pub struct RunAnalysis<'a> {
    parameters: &'a RunParameters,
    store: &'a dyn SnapshotStore,
    run_dir: &'a Path,
}

impl<'a> RunAnalysis<'a> {
    pub fn new(
        parameters: &'a RunParameters,
        store: &'a dyn SnapshotStore,
        run_dir: &'a Path,
    ) -> Self {
        Self {
            parameters,
            store,
            run_dir,
        }
    }

    /// Saved steps present in the run directory, up to the first missing one.
    pub fn available_steps(&self) -> Vec<u64> {
        saved_steps(self.parameters.total_steps, self.parameters.save_every)
            .into_iter()
            .take_while(|step| self.store.has_snapshot(self.run_dir, *step))
            .collect()
    }

    /// One sample for the initial state and one per available snapshot.
    pub fn observables(&self) -> SnResult<Vec<ObservableSample>> {
        let parameters = self.parameters;
        let initial = initial_wavefunction(
            parameters.shape,
            parameters.grid_size,
            parameters.dr_nm,
            parameters.width_nm,
        );
        let mut samples = vec![self.sample(0, &initial)];
        let mut psi = self.buffer();
        for step in self.available_steps() {
            self.store.load(self.run_dir, step, &mut psi)?;
            samples.push(self.sample(step, &psi));
        }
        debug!(samples = samples.len(), "collected observables");
        Ok(samples)
    }

    /// First snapshot whose half width departs from the free gaussian's by
    /// more than `threshold`. Steps where a half width is undefined are
    /// skipped.
    pub fn first_width_deviation(&self, threshold: f64) -> SnResult<Option<WidthDeviation>> {
        let parameters = self.parameters;
        let mut psi = self.buffer();
        for step in self.available_steps() {
            self.store.load(self.run_dir, step, &mut psi)?;
            let time_ns = parameters.dt_ns * step as f64;
            let reference = free_gaussian(
                parameters.width_nm,
                parameters.mass_u,
                time_ns,
                parameters.grid_size,
                parameters.dr_nm,
            );
            let Some(deviation) = width_deviation(&psi, &reference) else {
                continue;
            };
            if deviation > threshold {
                info!(step, deviation, "width departs from free spreading");
                return Ok(Some(WidthDeviation {
                    step,
                    time_s: 1.0e-9 * time_ns,
                    deviation,
                }));
            }
        }
        Ok(None)
    }

    fn buffer(&self) -> Wavefunction {
        vec![Complex64::new(0.0, 0.0); self.parameters.grid_size]
    }

    fn sample(&self, step: u64, psi: &[Complex64]) -> ObservableSample {
        let dr = self.parameters.dr_nm;
        ObservableSample {
            step,
            time_s: 1.0e-9 * self.parameters.dt_ns * step as f64,
            r90_nm: r90(psi, dr),
            rmax_nm: rmax(psi, dr),
            probability: total_probability(psi, dr),
        }
    }
}

/// Tab-separated table with a `#` header line.
pub fn render_observables(samples: &[ObservableSample]) -> String {
    let mut table = String::from("# step\ttime_s\tr90_nm\trmax_nm\tprobability\n");
    for sample in samples {
        // Writing into a String cannot fail.
        let _ = writeln!(
            table,
            "{}\t{:e}\t{:e}\t{:e}\t{:e}",
            sample.step, sample.time_s, sample.r90_nm, sample.rmax_nm, sample.probability
        );
    }
    table
}

/// Write the table to `observables.dat` in `run_dir`; an existing table is
/// never replaced.
pub fn write_observables(run_dir: &Path, samples: &[ObservableSample]) -> SnResult<PathBuf> {
    let path = run_dir.join(OBSERVABLES_FILE);
    let mut file = OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(&path)
        .map_err(|source| {
            let reason = if source.kind() == ErrorKind::AlreadyExists {
                "file already exists".to_string()
            } else {
                source.to_string()
            };
            SnError::io_system(
                "IO.ANALYSIS_OUTPUT",
                format!("cannot create '{}': {reason}", path.display()),
            )
        })?;
    file.write_all(render_observables(samples).as_bytes())
        .map_err(|source| {
            SnError::io_system(
                "IO.ANALYSIS_OUTPUT",
                format!("failed to write '{}': {source}", path.display()),
            )
        })?;
    Ok(path)
}

/// Command line that analyses `run_dir` with the settings of this run.
pub fn analysis_command(parameters: &RunParameters, run_dir: &Path) -> String {
    let subpath = run_dir
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default();
    let root = run_dir.parent().unwrap_or_else(|| Path::new("."));
    let mut command = format!(
        "sn-radial --width {} --mass {:e} --grid-size {} --dr {} --dt {:e} --steps {} --save-every {} --shape {} analyze {} --output-root {}",
        parameters.width_nm,
        parameters.mass_u,
        parameters.grid_size,
        parameters.dr_nm,
        parameters.dt_ns,
        parameters.total_steps,
        parameters.save_every,
        parameters.shape.code(),
        subpath,
        root.display()
    );
    if parameters.shape == WavefunctionShape::Gaussian {
        let _ = write!(
            command,
            " --deviation {}",
            crate::common::constants::DEFAULT_WIDTH_DEVIATION
        );
    }
    command
}

#[cfg(test)]
mod tests {
    use super::{
        OBSERVABLES_FILE, RunAnalysis, analysis_command, render_observables, saved_steps,
        write_observables,
    };
    use crate::common::config::RunParameters;
    use crate::common::constants::GAUSSIAN_R90_PER_WIDTH;
    use crate::modules::initial::WavefunctionShape;
    use crate::modules::storage::FileSnapshotStore;
    use crate::modules::traits::SnapshotStore;
    use crate::numerics::observables::free_gaussian;
    use std::fs;
    use std::path::Path;
    use tempfile::TempDir;

    fn gaussian_run() -> RunParameters {
        RunParameters {
            grid_size: 400,
            dr_nm: 0.5,
            width_nm: 10.0,
            mass_u: 1.0e3,
            dt_ns: 10.0,
            total_steps: 25,
            save_every: 10,
            ..RunParameters::default()
        }
    }

    fn run_dir(temp: &TempDir) -> &Path {
        fs::create_dir_all(temp.path().join("data")).expect("data dir should be created");
        temp.path()
    }

    /// Store the free solution at every saved step, optionally squeezed.
    fn store_free_run(dir: &Path, parameters: &RunParameters, squeeze_from: Option<u64>) {
        let mut store = FileSnapshotStore::new();
        for step in saved_steps(parameters.total_steps, parameters.save_every) {
            let width = match squeeze_from {
                Some(first) if step >= first => 0.8 * parameters.width_nm,
                _ => parameters.width_nm,
            };
            let psi = free_gaussian(
                width,
                parameters.mass_u,
                parameters.dt_ns * step as f64,
                parameters.grid_size,
                parameters.dr_nm,
            );
            store.save(dir, step, &psi).expect("snapshot should save");
        }
    }

    #[test]
    fn saved_steps_include_the_terminal_step() {
        assert_eq!(saved_steps(25, 10), vec![10, 20, 25]);
        assert_eq!(saved_steps(20, 10), vec![10, 20]);
        assert_eq!(saved_steps(3, 10), vec![3]);
        assert!(saved_steps(5, 0).is_empty());
    }

    #[test]
    fn observables_cover_initial_state_and_every_snapshot() {
        let temp = TempDir::new().expect("tempdir should be created");
        let dir = run_dir(&temp);
        let parameters = gaussian_run();
        store_free_run(dir, &parameters, None);
        let store = FileSnapshotStore::new();

        let samples = RunAnalysis::new(&parameters, &store, dir)
            .observables()
            .expect("observables should be computed");

        let steps: Vec<u64> = samples.iter().map(|sample| sample.step).collect();
        assert_eq!(steps, vec![0, 10, 20, 25]);
        assert!((samples[0].r90_nm - GAUSSIAN_R90_PER_WIDTH * 10.0).abs() <= 1.0);
        assert!((samples[0].rmax_nm - 10.0).abs() <= 0.5);
        assert!((samples[3].time_s - 2.5e-7).abs() <= 1.0e-20);
        for pair in samples.windows(2) {
            assert!(pair[1].r90_nm >= pair[0].r90_nm, "free packets only spread");
        }
        for sample in &samples {
            assert!((sample.probability - 1.0).abs() <= 1.0e-3);
        }
    }

    #[test]
    fn scan_stops_at_the_first_missing_snapshot() {
        let temp = TempDir::new().expect("tempdir should be created");
        let dir = run_dir(&temp);
        let parameters = gaussian_run();
        store_free_run(dir, &parameters, None);
        fs::remove_file(dir.join("data").join("w00000000000020.dat"))
            .expect("snapshot should be removed");
        let store = FileSnapshotStore::new();

        let analysis = RunAnalysis::new(&parameters, &store, dir);
        assert_eq!(analysis.available_steps(), vec![10]);
    }

    #[test]
    fn free_run_shows_no_width_deviation() {
        let temp = TempDir::new().expect("tempdir should be created");
        let dir = run_dir(&temp);
        let parameters = gaussian_run();
        store_free_run(dir, &parameters, None);
        let store = FileSnapshotStore::new();

        let found = RunAnalysis::new(&parameters, &store, dir)
            .first_width_deviation(0.01)
            .expect("scan should succeed");
        assert_eq!(found, None);
    }

    #[test]
    fn narrowed_packet_is_reported_at_its_first_snapshot() {
        let temp = TempDir::new().expect("tempdir should be created");
        let dir = run_dir(&temp);
        let parameters = gaussian_run();
        store_free_run(dir, &parameters, Some(20));
        let store = FileSnapshotStore::new();

        let found = RunAnalysis::new(&parameters, &store, dir)
            .first_width_deviation(0.05)
            .expect("scan should succeed")
            .expect("narrowed packet should deviate");
        assert_eq!(found.step, 20);
        assert!((found.time_s - 2.0e-7).abs() <= 1.0e-20);
        assert!(found.deviation > 0.1);
    }

    #[test]
    fn observables_table_is_written_once() {
        let temp = TempDir::new().expect("tempdir should be created");
        let dir = run_dir(&temp);
        let parameters = gaussian_run();
        store_free_run(dir, &parameters, None);
        let store = FileSnapshotStore::new();
        let samples = RunAnalysis::new(&parameters, &store, dir)
            .observables()
            .expect("observables should be computed");

        let path = write_observables(dir, &samples).expect("table should be written");
        assert_eq!(path, dir.join(OBSERVABLES_FILE));
        let table = fs::read_to_string(&path).expect("table should be readable");
        assert_eq!(table, render_observables(&samples));
        assert_eq!(table.lines().count(), 5);
        assert!(table.starts_with("# step\ttime_s\tr90_nm\trmax_nm\tprobability\n0\t0e0\t"));

        let error = write_observables(dir, &samples).expect_err("existing table should be kept");
        assert_eq!(error.placeholder(), "IO.ANALYSIS_OUTPUT");
        assert_eq!(error.exit_code(), 3);
    }

    #[test]
    fn analysis_command_reproduces_run_settings() {
        let parameters = gaussian_run();
        let command = analysis_command(&parameters, Path::new("/tmp/sn/20100101-0000"));
        assert_eq!(
            command,
            "sn-radial --width 10 --mass 1e3 --grid-size 400 --dr 0.5 --dt 1e1 --steps 25 \
             --save-every 10 --shape g analyze 20100101-0000 --output-root /tmp/sn --deviation 0.01"
        );

        let ball = RunParameters {
            shape: WavefunctionShape::ExpBall,
            ..gaussian_run()
        };
        let command = analysis_command(&ball, Path::new("/tmp/sn/20100101-0000"));
        assert!(command.ends_with("--shape b analyze 20100101-0000 --output-root /tmp/sn"));
    }
}
