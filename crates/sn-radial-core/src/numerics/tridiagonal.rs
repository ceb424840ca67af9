use super::offdiagonal::OffDiagonals;
use crate::domain::SnError;
use num_complex::Complex64;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TridiagonalError {
    #[error(
        "tridiagonal system is singular at pivot index {pivot_index}{}",
        step.map(|step| format!(" in step {step}")).unwrap_or_default()
    )]
    SingularPivot {
        pivot_index: usize,
        step: Option<u64>,
    },
    #[error("tridiagonal operand length mismatch: expected {expected}, got {actual}")]
    LengthMismatch { expected: usize, actual: usize },
}

impl TridiagonalError {
    /// Attach the time step during which the solve failed.
    pub fn at_step(self, step: u64) -> Self {
        match self {
            Self::SingularPivot { pivot_index, .. } => Self::SingularPivot {
                pivot_index,
                step: Some(step),
            },
            other => other,
        }
    }
}

impl From<TridiagonalError> for SnError {
    fn from(error: TridiagonalError) -> Self {
        match error {
            TridiagonalError::SingularPivot { .. } => {
                SnError::computation("RUN.SINGULAR_PIVOT", error.to_string())
            }
            TridiagonalError::LengthMismatch { .. } => {
                SnError::internal("RUN.GRID_LENGTH", error.to_string())
            }
        }
    }
}

/// Thomas elimination for the implicit step `A x = ψ`, `ψ ← x − ψ`.
///
/// With `A = ½ + K` this is the Cayley step `ψ ← (½ + K)⁻¹ (½ − K) ψ`.
/// Elimination scratch is allocated once; a step touches no heap memory.
#[derive(Debug, Clone)]
pub struct StepSolver {
    pivots: Vec<Complex64>,
    rhs: Vec<Complex64>,
}

impl StepSolver {
    pub fn new(grid_size: usize) -> Self {
        Self {
            pivots: vec![Complex64::new(0.0, 0.0); grid_size],
            rhs: vec![Complex64::new(0.0, 0.0); grid_size],
        }
    }

    pub fn grid_size(&self) -> usize {
        self.pivots.len()
    }

    /// Advance `psi` by one step through the operator `(off.sub, diagonal, off.sup)`.
    ///
    /// On error `psi` is left untouched.
    pub fn advance(
        &mut self,
        off: &OffDiagonals,
        diagonal: &[Complex64],
        psi: &mut [Complex64],
    ) -> Result<(), TridiagonalError> {
        let n = self.pivots.len();
        for actual in [off.len(), diagonal.len(), psi.len()] {
            if actual != n {
                return Err(TridiagonalError::LengthMismatch {
                    expected: n,
                    actual,
                });
            }
        }
        if n == 0 {
            return Ok(());
        }

        let sub = off.sub();
        let sup = off.sup();
        let bb = &mut self.pivots;
        let d = &mut self.rhs;

        bb[0] = diagonal[0];
        d[0] = psi[0];
        for row in 1..n {
            let previous = bb[row - 1];
            if is_zero(previous) {
                return Err(TridiagonalError::SingularPivot {
                    pivot_index: row - 1,
                    step: None,
                });
            }
            bb[row] = diagonal[row] - sub[row] * sup[row - 1] / previous;
            d[row] = psi[row] - sub[row] * d[row - 1] / previous;
        }
        if is_zero(bb[n - 1]) {
            return Err(TridiagonalError::SingularPivot {
                pivot_index: n - 1,
                step: None,
            });
        }

        // Back substitution; `d` is overwritten with the solution x.
        d[n - 1] = d[n - 1] / bb[n - 1];
        psi[n - 1] = d[n - 1] - psi[n - 1];
        for row in (0..n - 1).rev() {
            d[row] = (d[row] - sup[row] * d[row + 1]) / bb[row];
            psi[row] = d[row] - psi[row];
        }
        Ok(())
    }
}

fn is_zero(value: Complex64) -> bool {
    value.re == 0.0 && value.im == 0.0
}
