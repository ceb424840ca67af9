//! Run parameters and the evolution-operator prefactors derived from them.
//!
//! Defaults reproduce the reference configuration (a 50·10⁹ u gaussian of
//! 500 nm width on 5100 shells of 0.6 nm). A JSON parameter file may override
//! any subset of fields.

use super::constants::{
    DEFAULT_COUPLING, DEFAULT_DR_NM, DEFAULT_DT_NS, DEFAULT_GRID_SIZE, DEFAULT_MASS_U,
    DEFAULT_OUTPUT_ROOT, DEFAULT_SAVE_EVERY, DEFAULT_TOTAL_STEPS, DEFAULT_WIDTH_NM,
    MINUS_HBAR_OVER_EIGHT, MIN_GRID_SIZE, PI_G_OVER_HBAR,
};
use crate::domain::SnError;
use crate::modules::initial::WavefunctionShape;
use num_complex::Complex64;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct RunParameters {
    pub width_nm: f64,
    pub mass_u: f64,
    pub grid_size: usize,
    pub dr_nm: f64,
    pub dt_ns: f64,
    pub total_steps: u64,
    pub coupling: f64,
    pub save_every: u64,
    pub output_root: PathBuf,
    pub shape: WavefunctionShape,
    pub numerical_checks: bool,
}

impl Default for RunParameters {
    fn default() -> Self {
        Self {
            width_nm: DEFAULT_WIDTH_NM,
            mass_u: DEFAULT_MASS_U,
            grid_size: DEFAULT_GRID_SIZE,
            dr_nm: DEFAULT_DR_NM,
            dt_ns: DEFAULT_DT_NS,
            total_steps: DEFAULT_TOTAL_STEPS,
            coupling: DEFAULT_COUPLING,
            save_every: DEFAULT_SAVE_EVERY,
            output_root: PathBuf::from(DEFAULT_OUTPUT_ROOT),
            shape: WavefunctionShape::default(),
            numerical_checks: true,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read run parameters '{}': {source}", path.display())]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to parse run parameters '{}': {source}", path.display())]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },
    #[error("grid size must be at least {min}, got {got}")]
    GridTooSmall { got: usize, min: usize },
    #[error("{name} must be finite and positive, got {value}")]
    NonPositive { name: &'static str, value: f64 },
    #[error("coupling must be finite and non-negative, got {0}")]
    BadCoupling(f64),
    #[error("{0} must be greater than 0")]
    ZeroCount(&'static str),
}

impl From<ConfigError> for SnError {
    fn from(error: ConfigError) -> Self {
        match error {
            ConfigError::Read { .. } => SnError::io_system("IO.RUN_PARAMETERS", error.to_string()),
            _ => SnError::input_validation("INPUT.RUN_PARAMETERS", error.to_string()),
        }
    }
}

impl RunParameters {
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let source = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let parameters: Self =
            serde_json::from_str(&source).map_err(|source| ConfigError::Parse {
                path: path.to_path_buf(),
                source,
            })?;
        parameters.validate()?;
        Ok(parameters)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.grid_size < MIN_GRID_SIZE {
            return Err(ConfigError::GridTooSmall {
                got: self.grid_size,
                min: MIN_GRID_SIZE,
            });
        }
        for (name, value) in [
            ("width_nm", self.width_nm),
            ("mass_u", self.mass_u),
            ("dr_nm", self.dr_nm),
            ("dt_ns", self.dt_ns),
        ] {
            if !value.is_finite() || value <= 0.0 {
                return Err(ConfigError::NonPositive { name, value });
            }
        }
        if !self.coupling.is_finite() || self.coupling < 0.0 {
            return Err(ConfigError::BadCoupling(self.coupling));
        }
        if self.total_steps == 0 {
            return Err(ConfigError::ZeroCount("total_steps"));
        }
        if self.save_every == 0 {
            return Err(ConfigError::ZeroCount("save_every"));
        }
        Ok(())
    }

    /// Simulated time covered by the full run, in seconds.
    pub fn total_time_s(&self) -> f64 {
        1.0e-9 * self.dt_ns * self.total_steps as f64
    }

    pub fn prefactors(&self) -> Prefactors {
        Prefactors::from_parameters(self)
    }
}

/// Step-invariant coefficients of the evolution operator.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Prefactors {
    /// `−i ħ/(8m) · dt/dr²`, scale of the radial Laplacian stencil.
    pub pre_beta: Complex64,
    /// Free diagonal for shells `i ≥ 1`.
    pub b_pre: Complex64,
    /// Free diagonal for the central shell, whose stencil is `6 (ψ₁ − ψ₀)`.
    pub bn_pre: Complex64,
    /// `i π G/ħ · dt (m dr)² · coupling`, scale of the self-consistent potential.
    pub v_pre: Complex64,
}

impl Prefactors {
    pub fn from_parameters(parameters: &RunParameters) -> Self {
        let mass = parameters.mass_u;
        let dr = parameters.dr_nm;
        let dt = parameters.dt_ns;
        let i = Complex64::i();

        let pre_beta = i * MINUS_HBAR_OVER_EIGHT / mass / dr / dr * dt;
        let half = Complex64::new(0.5, 0.0);
        let b_pre = half - 2.0 * i * MINUS_HBAR_OVER_EIGHT / mass / dr / dr * dt;
        let bn_pre = half - 6.0 * i * MINUS_HBAR_OVER_EIGHT / mass / dr / dr * dt;
        let v_pre = i * parameters.coupling * PI_G_OVER_HBAR * dt * mass * dr * mass * dr;

        Self {
            pre_beta,
            b_pre,
            bn_pre,
            v_pre,
        }
    }
}
