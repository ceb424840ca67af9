use num_complex::Complex64;

/// Sub- and super-diagonal of the radial Laplacian stencil.
///
/// Both depend only on the grid and on `pre_beta`, so they are built once
/// per run and shared by every step.
#[derive(Debug, Clone, PartialEq)]
pub struct OffDiagonals {
    sub: Vec<Complex64>,
    sup: Vec<Complex64>,
}

impl OffDiagonals {
    pub fn build(grid_size: usize, pre_beta: Complex64) -> Self {
        let mut sub = vec![Complex64::new(0.0, 0.0); grid_size];
        let mut sup = vec![Complex64::new(0.0, 0.0); grid_size];

        if let Some(first) = sup.first_mut() {
            *first = 6.0 * pre_beta;
        }
        for shell in 1..grid_size {
            let inverse = 1.0 / shell as f64;
            sub[shell] = pre_beta * (1.0 - inverse);
            sup[shell] = pre_beta * (1.0 + inverse);
        }

        Self { sub, sup }
    }

    /// Sub-diagonal `a`; entry 0 has no matrix position and stays zero.
    pub fn sub(&self) -> &[Complex64] {
        &self.sub
    }

    /// Super-diagonal `c`.
    pub fn sup(&self) -> &[Complex64] {
        &self.sup
    }

    pub fn len(&self) -> usize {
        self.sub.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sub.is_empty()
    }
}
