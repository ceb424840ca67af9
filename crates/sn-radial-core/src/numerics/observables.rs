//! Observables that measure how far self-gravity holds a packet together.
//!
//! Radii are in nm. The reference for every comparison is the free gaussian,
//! whose width grows as `|1 + i ħ t/(m W²)|`.

use crate::common::constants::{HBAR_OVER_U_NM2_PER_NS, R90_FRACTION};
use crate::domain::Wavefunction;
use num_complex::Complex64;
use std::f64::consts::PI;

/// Closed-form gaussian of initial width `width_nm` after `time_ns` of free
/// evolution, sampled on `grid_size` shells.
pub fn free_gaussian(
    width_nm: f64,
    mass_u: f64,
    time_ns: f64,
    grid_size: usize,
    dr_nm: f64,
) -> Wavefunction {
    let spread = Complex64::new(0.0, HBAR_OVER_U_NM2_PER_NS / mass_u / (width_nm * width_nm) * time_ns);
    let z = (Complex64::new(1.0, 0.0) + spread).inv();
    let amplitude = (z / (PI.sqrt() * width_nm)).powf(1.5);
    let exponent = -z / (2.0 * width_nm * width_nm);
    (0..grid_size)
        .map(|shell| {
            let r = shell as f64 * dr_nm;
            amplitude * (exponent * r * r).exp()
        })
        .collect()
}

/// Radius within which 90% of the radial probability `r²|ψ|²` lies.
///
/// A state without probability yields 0. When rounding keeps the running
/// share below 90% the radius past the last shell is returned.
pub fn r90(psi: &[Complex64], dr_nm: f64) -> f64 {
    let total: f64 = radial_density(psi).sum();
    if total <= 0.0 {
        return 0.0;
    }
    let mut enclosed = 0.0;
    for (shell, density) in radial_density(psi).enumerate() {
        enclosed += density / total;
        if enclosed >= R90_FRACTION {
            return shell as f64 * dr_nm;
        }
    }
    psi.len() as f64 * dr_nm
}

/// Radius of the first maximum of `r²|ψ|²`.
pub fn rmax(psi: &[Complex64], dr_nm: f64) -> f64 {
    let mut peak_shell = 0;
    let mut peak = f64::NEG_INFINITY;
    for (shell, density) in radial_density(psi).enumerate() {
        if density > peak {
            peak = density;
            peak_shell = shell;
        }
    }
    peak_shell as f64 * dr_nm
}

/// First shell where `|ψ|²` drops below half its maximum.
pub fn half_width(psi: &[Complex64]) -> Option<usize> {
    let peak = psi.iter().map(|value| value.norm_sqr()).fold(0.0, f64::max);
    psi.iter().position(|value| value.norm_sqr() < 0.5 * peak)
}

/// `|1 − hw(ψ)/hw(reference)|`, or `None` if either half width is undefined.
pub fn width_deviation(psi: &[Complex64], reference: &[Complex64]) -> Option<f64> {
    let own = half_width(psi)?;
    let reference = half_width(reference)?;
    if reference == 0 {
        return None;
    }
    Some((1.0 - own as f64 / reference as f64).abs())
}

/// Phase of every shell in `(−π, π]`.
pub fn phase_profile(psi: &[Complex64]) -> Vec<f64> {
    psi.iter().map(|value| value.arg()).collect()
}

fn radial_density(psi: &[Complex64]) -> impl Iterator<Item = f64> + '_ {
    psi.iter()
        .enumerate()
        .map(|(shell, value)| (shell * shell) as f64 * value.norm_sqr())
}
