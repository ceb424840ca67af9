use num_complex::Complex64;
use std::f64::consts::PI;

/// Discretised radial probability `4π DR³ Σ_{i≥1} i² |ψ_i|²`.
///
/// This is the norm the implicit step conserves. The central shell carries
/// no volume in the radial measure and is skipped.
pub fn total_probability(psi: &[Complex64], dr_nm: f64) -> f64 {
    let mut sum = 0.0;
    let mut correction = 0.0;
    for (shell, value) in psi.iter().enumerate().skip(1) {
        let weight = (shell * shell) as f64;
        kahan_add(&mut sum, &mut correction, weight * value.norm_sqr());
    }
    4.0 * PI * dr_nm * dr_nm * dr_nm * sum
}

fn kahan_add(sum: &mut f64, correction: &mut f64, value: f64) {
    let corrected = value - *correction;
    let next = *sum + corrected;
    *correction = (next - *sum) - corrected;
    *sum = next;
}

#[cfg(test)]
mod tests {
    use super::total_probability;
    use num_complex::Complex64;
    use std::f64::consts::PI;

    #[test]
    fn central_shell_does_not_contribute() {
        let psi = vec![
            Complex64::new(100.0, 0.0),
            Complex64::new(0.0, 1.0),
            Complex64::new(0.5, 0.5),
        ];
        let expected = 4.0 * PI * 8.0 * (1.0 + 4.0 * 0.5);
        assert!((total_probability(&psi, 2.0) - expected).abs() <= 1.0e-12);
    }

    #[test]
    fn phase_does_not_change_probability() {
        let psi: Vec<Complex64> = (0..50)
            .map(|shell| Complex64::new((-0.01 * (shell * shell) as f64).exp(), 0.0))
            .collect();
        let rotated: Vec<Complex64> = psi
            .iter()
            .enumerate()
            .map(|(shell, value)| value * Complex64::from_polar(1.0, 0.3 * shell as f64))
            .collect();

        let before = total_probability(&psi, 0.6);
        let after = total_probability(&rotated, 0.6);
        assert!((before - after).abs() <= 1.0e-13 * before);
    }

    #[test]
    fn empty_state_has_zero_probability() {
        assert_eq!(total_probability(&[], 0.6), 0.0);
    }
}
