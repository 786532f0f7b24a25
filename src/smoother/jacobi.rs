// Damped Jacobi smoother.

use crate::error::AmgError;
use crate::matrix::CsrMatrix;
use crate::smoother::Smoother;
use num_traits::Float;

/// Arguments for [`DampedJacobi`].
#[derive(Clone, Copy, Debug)]
pub struct JacobiArgs<T> {
    /// Relaxation weight ω.
    pub relaxation: T,
}

impl<T: Float> Default for JacobiArgs<T> {
    fn default() -> Self {
        Self {
            relaxation: T::one(),
        }
    }
}

/// Damped Jacobi sweep: lhs[i] += ω · rhs[i] / a_ii.
pub struct DampedJacobi<T> {
    inv_diag: Vec<T>,
    relaxation: T,
}

impl<T: Float> Smoother<T> for DampedJacobi<T> {
    type Args = JacobiArgs<T>;

    fn build(matrix: &CsrMatrix<T>, args: &Self::Args) -> Result<Self, AmgError> {
        let diag = matrix.diagonal();
        let mut inv_diag = Vec::with_capacity(diag.len());
        for (i, d) in diag.into_iter().enumerate() {
            if d == T::zero() {
                return Err(AmgError::ZeroPivot(i));
            }
            inv_diag.push(T::one() / d);
        }
        Ok(Self {
            inv_diag,
            relaxation: args.relaxation,
        })
    }

    fn apply(&self, _matrix: &CsrMatrix<T>, lhs: &mut [T], rhs: &[T]) {
        for i in 0..lhs.len() {
            lhs[i] = lhs[i] + self.relaxation * rhs[i] * self.inv_diag[i];
        }
    }
}
