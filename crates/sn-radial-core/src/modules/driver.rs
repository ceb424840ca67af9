//! Time loop of a run, from initial state to the final snapshot.
//!
//! `IntegrationDriver::run` walks `Initializing → Stepping → Finalizing →
//! Done`. Fresh runs get a new timestamped directory and a generated initial
//! state; resumed runs reload the snapshot of the resume step from an
//! existing directory after the operator has confirmed. Every start or resume
//! appends a block to the settings log.
//!
//! While stepping, a snapshot is written whenever the step is a multiple of
//! the save interval. Raised floating-point flags are reported per step and
//! then cleared; they never abort the run. The terminal state is always
//! persisted.

use super::initial::initial_wavefunction;
use super::paths::{PathManager, existing_run_dir};
use super::traits::{FloatingPointMonitor, ProgressReporter, ResumeConfirmation, SnapshotStore};
use crate::common::config::RunParameters;
use crate::domain::{RunMode, RunPhase, SnError, SnResult, Wavefunction};
use crate::numerics::fpenv::FpFlags;
use crate::numerics::norm::total_probability;
use crate::numerics::offdiagonal::OffDiagonals;
use crate::numerics::potential::PotentialEvaluator;
use crate::numerics::tridiagonal::StepSolver;
use num_complex::Complex64;
use std::path::PathBuf;
use tracing::{debug, info, warn};

/// External collaborators a run talks to.
pub struct RunCollaborators<'a> {
    pub store: &'a mut dyn SnapshotStore,
    pub progress: &'a mut dyn ProgressReporter,
    pub confirmation: &'a mut dyn ResumeConfirmation,
    pub fp_monitor: &'a mut dyn FloatingPointMonitor,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FpEvent {
    pub step: u64,
    pub flags: FpFlags,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RunReport {
    pub run_dir: PathBuf,
    pub start_step: u64,
    pub final_step: u64,
    pub snapshots_written: u64,
    /// Step on which the potential was found too weak to represent.
    pub weak_potential_step: Option<u64>,
    /// Number of steps after which at least one flag was raised.
    pub fp_event_steps: u64,
    pub first_fp_event: Option<FpEvent>,
    pub initial_probability: f64,
    pub final_probability: f64,
}

#[derive(Debug, Clone)]
pub struct IntegrationDriver {
    parameters: RunParameters,
    phase: RunPhase,
    run_stamp: Option<String>,
}

impl IntegrationDriver {
    pub fn new(parameters: RunParameters) -> SnResult<Self> {
        parameters.validate()?;
        Ok(Self {
            parameters,
            phase: RunPhase::Initializing,
            run_stamp: None,
        })
    }

    /// Name fresh run directories with `stamp` instead of the current minute.
    pub fn with_run_stamp(mut self, stamp: impl Into<String>) -> Self {
        self.run_stamp = Some(stamp.into());
        self
    }

    pub fn parameters(&self) -> &RunParameters {
        &self.parameters
    }

    pub fn phase(&self) -> RunPhase {
        self.phase
    }

    pub fn run(&mut self, mode: &RunMode, io: RunCollaborators<'_>) -> SnResult<RunReport> {
        let RunCollaborators {
            store,
            progress,
            confirmation,
            fp_monitor,
        } = io;
        let parameters = self.parameters.clone();
        let grid_size = parameters.grid_size;
        let total_steps = parameters.total_steps;
        let save_every = parameters.save_every;
        let checks = parameters.numerical_checks;

        self.enter(RunPhase::Initializing);
        let mut psi: Wavefunction = vec![Complex64::new(0.0, 0.0); grid_size];
        let (run_dir, start_step) = match mode {
            RunMode::Start { output_root } => {
                let mut paths = match &self.run_stamp {
                    Some(stamp) => PathManager::with_stamp(output_root, stamp.clone()),
                    None => PathManager::new(output_root),
                };
                let run_dir = paths.create()?;
                psi = initial_wavefunction(
                    parameters.shape,
                    grid_size,
                    parameters.dr_nm,
                    parameters.width_nm,
                );
                info!(run_dir = %run_dir.display(), shape = %parameters.shape, "starting fresh run");
                (run_dir, 0)
            }
            RunMode::Continue {
                output_root,
                subpath,
                resume_step,
            } => {
                let resume_step = *resume_step;
                if resume_step > total_steps {
                    return Err(SnError::input_validation(
                        "INPUT.RESUME_STEP",
                        format!(
                            "resume step {resume_step} lies beyond the last step {total_steps}"
                        ),
                    ));
                }
                let run_dir = existing_run_dir(output_root, subpath)?;
                store.load(&run_dir, resume_step, &mut psi)?;
                if !confirmation.confirm(&run_dir, resume_step)? {
                    return Err(SnError::input_validation(
                        "INPUT.RESUME_DECLINED",
                        format!(
                            "resume of '{}' at step {resume_step} was not confirmed",
                            run_dir.display()
                        ),
                    ));
                }
                info!(run_dir = %run_dir.display(), resume_step, "continuing run");
                (run_dir, resume_step)
            }
        };
        store.append_settings(&run_dir, &parameters, start_step)?;

        let prefactors = parameters.prefactors();
        let off_diagonals = OffDiagonals::build(grid_size, prefactors.pre_beta);
        let mut evaluator = PotentialEvaluator::new(grid_size, &prefactors, checks);
        let mut solver = StepSolver::new(grid_size);
        let mut diagonal = vec![Complex64::new(0.0, 0.0); grid_size];

        let initial_probability = total_probability(&psi, parameters.dr_nm);
        let mut report = RunReport {
            run_dir,
            start_step,
            final_step: start_step,
            snapshots_written: 0,
            weak_potential_step: None,
            fp_event_steps: 0,
            first_fp_event: None,
            initial_probability,
            final_probability: initial_probability,
        };

        self.enter(RunPhase::Stepping);
        if checks {
            fp_monitor.clear();
        }
        let mut step = start_step;
        while step < total_steps {
            step += 1;

            if evaluator.evaluate(&psi, &mut diagonal) {
                report.weak_potential_step = Some(step);
            }
            solver
                .advance(&off_diagonals, &diagonal, &mut psi)
                .map_err(|error| error.at_step(step))?;

            if step % save_every == 0 {
                store.save(&report.run_dir, step, &psi)?;
                report.snapshots_written += 1;
                progress.report(step, total_steps);
                info!(
                    step,
                    probability = total_probability(&psi, parameters.dr_nm),
                    "saved snapshot"
                );
            }

            if checks {
                let raised = fp_monitor.raised();
                if !raised.is_empty() {
                    warn!(step, flags = %raised, "floating point exception raised");
                    report.fp_event_steps += 1;
                    if report.first_fp_event.is_none() {
                        report.first_fp_event = Some(FpEvent { step, flags: raised });
                    }
                    fp_monitor.clear();
                }
            }
        }

        self.enter(RunPhase::Finalizing);
        if step % save_every != 0 {
            store.save(&report.run_dir, step, &psi)?;
            report.snapshots_written += 1;
            debug!(step, "saved terminal snapshot");
        }
        progress.complete(total_steps);

        report.final_step = step;
        report.final_probability = total_probability(&psi, parameters.dr_nm);
        self.enter(RunPhase::Done);
        info!(
            final_step = report.final_step,
            snapshots = report.snapshots_written,
            fp_event_steps = report.fp_event_steps,
            probability = report.final_probability,
            "run complete"
        );
        Ok(report)
    }

    fn enter(&mut self, phase: RunPhase) {
        self.phase = phase;
        info!(phase = %phase, "entering run phase");
    }
}
