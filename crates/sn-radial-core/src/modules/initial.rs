//! Closed-form initial wavefunctions sampled onto the radial grid.
//!
//! Values are in nm^(-3/2). The gaussian and rectangular profiles satisfy
//! `4π ∫ |ψ(r)|² r² dr = 1` up to discretisation error; the exponential
//! ball only roughly, and its scale depends on the grid spacing.

use crate::common::constants::{EXP_BALL_PROFILE_SCALE, RECT_PROFILE_SCALE, TWO_OVER_SQRT_PI};
use crate::domain::Wavefunction;
use num_complex::Complex64;
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};
use std::str::FromStr;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum WavefunctionShape {
    /// `(π W²)^(-3/4) exp(−r²/(2W²))`
    #[default]
    #[serde(alias = "g")]
    Gaussian,
    /// Constant up to `r = W`, zero beyond.
    #[serde(alias = "r")]
    Rectangular,
    /// `i exp(−5 i DR/W)` over the shell index `i`, a ball with a hole at the centre.
    #[serde(alias = "b", alias = "e")]
    ExpBall,
}

impl WavefunctionShape {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Gaussian => "gaussian",
            Self::Rectangular => "rectangular",
            Self::ExpBall => "exp-ball",
        }
    }

    /// Single-letter code written to the settings log.
    pub const fn code(self) -> char {
        match self {
            Self::Gaussian => 'g',
            Self::Rectangular => 'r',
            Self::ExpBall => 'b',
        }
    }
}

impl Display for WavefunctionShape {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str((*self).as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown wavefunction shape '{0}'; expected gaussian (g), rectangular (r) or exp-ball (b)")]
pub struct UnknownShapeError(pub String);

impl FromStr for WavefunctionShape {
    type Err = UnknownShapeError;

    fn from_str(token: &str) -> Result<Self, Self::Err> {
        match token.trim().to_ascii_lowercase().as_str() {
            "g" | "gaussian" => Ok(Self::Gaussian),
            "r" | "rect" | "rectangular" => Ok(Self::Rectangular),
            "b" | "e" | "exp-ball" | "exp_ball" | "exponential" => Ok(Self::ExpBall),
            _ => Err(UnknownShapeError(token.to_string())),
        }
    }
}

/// Sample `shape` of width `width_nm` onto `grid_size` shells of `dr_nm`.
pub fn initial_wavefunction(
    shape: WavefunctionShape,
    grid_size: usize,
    dr_nm: f64,
    width_nm: f64,
) -> Wavefunction {
    match shape {
        WavefunctionShape::Gaussian => gaussian(grid_size, dr_nm, width_nm),
        WavefunctionShape::Rectangular => rectangular(grid_size, dr_nm, width_nm),
        WavefunctionShape::ExpBall => exp_ball(grid_size, dr_nm, width_nm),
    }
}

fn gaussian(grid_size: usize, dr: f64, width: f64) -> Wavefunction {
    let scale = TWO_OVER_SQRT_PI / width;
    let prefactor = (scale * scale * scale / 8.0).sqrt();
    let exponent = -0.5 * dr / width * dr / width;
    (0..grid_size)
        .map(|shell| {
            let shell_sq = (shell * shell) as f64;
            Complex64::new(prefactor * (shell_sq * exponent).exp(), 0.0)
        })
        .collect()
}

fn rectangular(grid_size: usize, dr: f64, width: f64) -> Wavefunction {
    let last_inside = (width / dr) as usize;
    let value = Complex64::new(RECT_PROFILE_SCALE / width / width.sqrt(), 0.0);
    (0..grid_size)
        .map(|shell| {
            if shell <= last_inside {
                value
            } else {
                Complex64::new(0.0, 0.0)
            }
        })
        .collect()
}

fn exp_ball(grid_size: usize, dr: f64, width: f64) -> Wavefunction {
    let prefactor = EXP_BALL_PROFILE_SCALE / width.powi(5).sqrt();
    let exponent = -5.0 * dr / width;
    (0..grid_size)
        .map(|shell| {
            let shell = shell as f64;
            Complex64::new(prefactor * shell * (shell * exponent).exp(), 0.0)
        })
        .collect()
}
