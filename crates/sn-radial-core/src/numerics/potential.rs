//! Self-consistent gravitational potential on the radial grid.
//!
//! For shell `j` the Newtonian potential of the density `|ψ|²` is, up to the
//! common prefactor, `v_j = v_0 + (1/j) Σ_{i≤j} i²|ψ_i|² − Σ_{i≤j} i|ψ_i|²`.
//! The evaluator obtains every `v_j − v_0` in one forward sweep with a
//! rescaled running sum instead of the quadratic double sum.

use crate::common::config::Prefactors;
use crate::common::constants::MIN_GRID_SIZE;
use num_complex::Complex64;
use tracing::warn;

#[derive(Debug, Clone)]
pub struct PotentialEvaluator {
    b_pre: Complex64,
    bn_pre: Complex64,
    v_pre: Complex64,
    relative: Vec<f64>,
    weak_potential_check: bool,
}

impl PotentialEvaluator {
    /// # Panics
    ///
    /// If `grid_size` is below 3; the recurrence special-cases shells 0, 1
    /// and `N − 1`.
    pub fn new(grid_size: usize, prefactors: &Prefactors, numerical_checks: bool) -> Self {
        assert!(
            grid_size >= MIN_GRID_SIZE,
            "potential grid needs at least {MIN_GRID_SIZE} shells, got {grid_size}"
        );
        Self {
            b_pre: prefactors.b_pre,
            bn_pre: prefactors.bn_pre,
            v_pre: prefactors.v_pre,
            relative: vec![0.0; grid_size],
            weak_potential_check: numerical_checks,
        }
    }

    pub fn grid_size(&self) -> usize {
        self.relative.len()
    }

    /// Potential of the last evaluation: entry 0 is the central value `v_0`,
    /// entry `i ≥ 1` is `v_i − v_0`.
    pub fn relative_potential(&self) -> &[f64] {
        &self.relative
    }

    /// True while the weak-potential check is still armed.
    pub fn weak_potential_check_armed(&self) -> bool {
        self.weak_potential_check
    }

    /// Write the diagonal of the evolution operator for `psi` into `diagonal`.
    ///
    /// Returns `true` on the single call where the potential turned out to be
    /// numerically invisible (`b_0 == bn_pre`); the check disarms itself after
    /// firing.
    pub fn evaluate(&mut self, psi: &[Complex64], diagonal: &mut [Complex64]) -> bool {
        let n = self.relative.len();
        debug_assert_eq!(psi.len(), n);
        debug_assert_eq!(diagonal.len(), n);

        let v = &mut self.relative;

        let mut psisq = psi[1].norm();
        psisq *= psisq;
        let mut qi_sum = 0.5 * psisq;
        v[0] = psisq;
        v[1] = 0.0;
        for shell in 2..=n - 2 {
            let mut weight = shell as f64;
            psisq = psi[shell].norm();
            psisq *= psisq;
            psisq *= weight;
            v[shell] = qi_sum - v[0];
            v[0] += psisq;
            weight /= weight + 1.0;
            qi_sum += psisq;
            qi_sum *= weight;
        }
        psisq = psi[n - 1].norm();
        psisq *= psisq;
        v[n - 1] = qi_sum - v[0];
        v[0] += psisq * (n - 1) as f64;

        let central = v[0];
        diagonal[0] = self.bn_pre - self.v_pre * central;
        for shell in 1..n {
            diagonal[shell] = self.b_pre - self.v_pre * (central + v[shell]);
        }

        if self.weak_potential_check && diagonal[0] == self.bn_pre {
            warn!("potential too weak to be represented numerically");
            self.weak_potential_check = false;
            return true;
        }
        false
    }
}

#[cfg(test)]
mod tests {
    use super::PotentialEvaluator;
    use crate::common::config::{Prefactors, RunParameters};
    use num_complex::Complex64;

    fn parameters(grid_size: usize, coupling: f64) -> RunParameters {
        RunParameters {
            grid_size,
            coupling,
            ..RunParameters::default()
        }
    }

    fn sample_psi(grid_size: usize) -> Vec<Complex64> {
        (0..grid_size)
            .map(|shell| {
                let r = shell as f64;
                Complex64::new((-0.1 * r * r).exp(), 0.05 * r)
            })
            .collect()
    }

    /// `v_j − v_0` straight from the quadratic-cost definition, with the
    /// outermost shell's own term folded in the same way as the sweep.
    fn direct_relative(psi: &[Complex64]) -> (f64, Vec<f64>) {
        let n = psi.len();
        let density: Vec<f64> = psi.iter().map(|value| value.norm_sqr()).collect();
        let central: f64 = (1..n).map(|i| i as f64 * density[i]).sum();
        let mut relative = vec![0.0; n];
        for j in 2..n {
            let upto = j - 1;
            let quadratic: f64 = (1..=upto).map(|i| (i * i) as f64 * density[i]).sum();
            let linear: f64 = (1..=upto).map(|i| i as f64 * density[i]).sum();
            relative[j] = quadratic / j as f64 - linear;
        }
        (central, relative)
    }

    #[test]
    fn sweep_matches_quadratic_definition() {
        let run = parameters(40, 1.0);
        let psi = sample_psi(run.grid_size);
        let mut evaluator = PotentialEvaluator::new(run.grid_size, &run.prefactors(), true);
        let mut diagonal = vec![Complex64::new(0.0, 0.0); run.grid_size];

        evaluator.evaluate(&psi, &mut diagonal);

        let (central, expected) = direct_relative(&psi);
        let computed = evaluator.relative_potential();
        assert!((computed[0] - central).abs() <= 1.0e-12 * central.abs());
        for shell in 2..run.grid_size {
            assert!(
                (computed[shell] - expected[shell]).abs() <= 1.0e-12 * central.abs(),
                "shell {shell}: {} vs {}",
                computed[shell],
                expected[shell]
            );
        }
    }

    #[test]
    fn output_has_grid_length_and_zero_baseline_at_shell_one() {
        for grid_size in [3, 4, 17] {
            let run = parameters(grid_size, 1.0);
            let prefactors = Prefactors::from_parameters(&run);
            let mut evaluator = PotentialEvaluator::new(grid_size, &prefactors, true);
            let mut diagonal = vec![Complex64::new(0.0, 0.0); grid_size];

            evaluator.evaluate(&sample_psi(grid_size), &mut diagonal);

            assert_eq!(evaluator.relative_potential().len(), grid_size);
            assert_eq!(evaluator.relative_potential()[1], 0.0);
            let v0 = evaluator.relative_potential()[0];
            assert_eq!(diagonal[1], prefactors.b_pre - prefactors.v_pre * v0);
            assert_eq!(diagonal[0], prefactors.bn_pre - prefactors.v_pre * v0);
        }
    }

    #[test]
    #[should_panic(expected = "at least 3 shells")]
    fn grids_below_three_shells_are_rejected() {
        let run = parameters(2, 1.0);
        let _ = PotentialEvaluator::new(run.grid_size, &run.prefactors(), true);
    }

    #[test]
    fn weak_potential_warning_fires_once() {
        let run = parameters(16, 0.0);
        let mut evaluator = PotentialEvaluator::new(run.grid_size, &run.prefactors(), true);
        let psi = sample_psi(run.grid_size);
        let mut diagonal = vec![Complex64::new(0.0, 0.0); run.grid_size];

        assert!(evaluator.evaluate(&psi, &mut diagonal));
        assert!(!evaluator.weak_potential_check_armed());
        assert!(!evaluator.evaluate(&psi, &mut diagonal));
    }

    #[test]
    fn weak_potential_check_can_be_disabled() {
        let run = parameters(16, 0.0);
        let mut evaluator = PotentialEvaluator::new(run.grid_size, &run.prefactors(), false);
        let mut diagonal = vec![Complex64::new(0.0, 0.0); run.grid_size];

        assert!(!evaluator.evaluate(&sample_psi(run.grid_size), &mut diagonal));
    }

    #[test]
    fn representable_potential_keeps_check_armed() {
        let run = parameters(16, 1.0);
        let mut evaluator = PotentialEvaluator::new(run.grid_size, &run.prefactors(), true);
        let mut diagonal = vec![Complex64::new(0.0, 0.0); run.grid_size];

        assert!(!evaluator.evaluate(&sample_psi(run.grid_size), &mut diagonal));
        assert!(evaluator.weak_potential_check_armed());
    }
}
