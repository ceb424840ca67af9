//! Physical prefactors and default run parameters.
//!
//! Run parameters are given in atomic mass units (u), nanometres (nm) and
//! nanoseconds (ns); the prefactors below fold the SI conversions in.

/// π G / ħ · (1 u in kg)²
pub const PI_G_OVER_HBAR: f64 = 5.482_469_926_046_101_4e-30;
/// −ħ / 8 · 10⁹ / (1 u in kg)
pub const MINUS_HBAR_OVER_EIGHT: f64 = -7.938_474_844_967_516_7;
/// 2 / √π
pub const TWO_OVER_SQRT_PI: f64 = 1.128_379_167_095_512_573_9;

/// Height of the normalized top-hat profile, times W^(3/2).
pub const RECT_PROFILE_SCALE: f64 = 0.488_602_511_902_919_92;
/// `1 / √(9375 π)`, scale of the exponential-ball profile times W^(5/2).
pub const EXP_BALL_PROFILE_SCALE: f64 = 5.826_924_963_157_755_042_898_057e-3;

/// ħ / (1 u) in nm²/ns, spreading rate of a free packet.
pub const HBAR_OVER_U_NM2_PER_NS: f64 = 63.507_798_759_74;
/// Radius holding 90% of a gaussian's probability, in units of its width.
pub const GAUSSIAN_R90_PER_WIDTH: f64 = 1.767_963_324_16;
/// Share of the radial probability enclosed by `r90`.
pub const R90_FRACTION: f64 = 0.9;

pub const DEFAULT_WIDTH_NM: f64 = 500.0;
pub const DEFAULT_MASS_U: f64 = 50.0e9;
pub const DEFAULT_GRID_SIZE: usize = 5100;
pub const DEFAULT_DR_NM: f64 = 0.6;
pub const DEFAULT_DT_NS: f64 = 1.0e6;
pub const DEFAULT_TOTAL_STEPS: u64 = 20_000_000;
pub const DEFAULT_COUPLING: f64 = 1.0;
pub const DEFAULT_SAVE_EVERY: u64 = 1000;
pub const DEFAULT_OUTPUT_ROOT: &str = "/tmp/test";

/// Smallest grid the potential recurrence is defined on.
pub const MIN_GRID_SIZE: usize = 3;
/// Relative width departure that counts as a deviation from free spreading.
pub const DEFAULT_WIDTH_DEVIATION: f64 = 0.01;

#[cfg(test)]
mod tests {
    use super::{
        DEFAULT_DR_NM, DEFAULT_MASS_U, DEFAULT_WIDTH_NM, EXP_BALL_PROFILE_SCALE,
        MINUS_HBAR_OVER_EIGHT, PI_G_OVER_HBAR, RECT_PROFILE_SCALE, TWO_OVER_SQRT_PI,
    };
    use std::f64::consts::PI;

    #[test]
    fn profile_scales_match_closed_forms() {
        assert!((TWO_OVER_SQRT_PI - 2.0 / PI.sqrt()).abs() <= 1.0e-15);
        assert!((RECT_PROFILE_SCALE - (3.0 / (4.0 * PI)).sqrt()).abs() <= 1.0e-15);
        assert!((EXP_BALL_PROFILE_SCALE - 1.0 / (9375.0 * PI).sqrt()).abs() <= 1.0e-15);
    }

    #[test]
    fn prefactors_have_expected_signs() {
        assert!(PI_G_OVER_HBAR > 0.0);
        assert!(MINUS_HBAR_OVER_EIGHT < 0.0);
        for value in [DEFAULT_WIDTH_NM, DEFAULT_MASS_U, DEFAULT_DR_NM] {
            assert!(value.is_finite() && value > 0.0);
        }
    }
}
