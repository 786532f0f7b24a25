// Successive over-relaxation smoother with selectable sweep direction.

use bitflags::bitflags;

use crate::error::AmgError;
use crate::matrix::CsrMatrix;
use crate::smoother::Smoother;
use num_traits::Float;

bitflags! {
    /// Sweep directions for [`SorSmoother`].
    #[derive(Copy, Clone, Debug)]
    pub struct SorSweep: u8 {
        const FORWARD  = 0b01;
        const BACKWARD = 0b10;
        const SYMMETRIC = Self::FORWARD.bits() | Self::BACKWARD.bits();
    }
}

/// Arguments for [`SorSmoother`].
#[derive(Clone, Copy, Debug)]
pub struct SorArgs<T> {
    /// Relaxation weight ω.
    pub relaxation: T,
    pub sweep: SorSweep,
}

impl<T: Float> Default for SorArgs<T> {
    fn default() -> Self {
        Self {
            relaxation: T::one(),
            sweep: SorSweep::FORWARD,
        }
    }
}

/// Gauss–Seidel / SOR sweep in correction form.
///
/// Each sweep solves A c ≈ rhs by one pass of SOR starting from c = 0 and
/// adds c into `lhs`. A symmetric sweep runs the forward pass followed by the
/// backward pass on the same correction.
pub struct SorSmoother<T> {
    inv_diag: Vec<T>,
    relaxation: T,
    sweep: SorSweep,
}

impl<T: Float> SorSmoother<T> {
    fn relax(&self, matrix: &CsrMatrix<T>, c: &mut [T], rhs: &[T], i: usize) {
        let (cols, vals) = matrix.row(i);
        let mut sigma = T::zero();
        for (&j, &v) in cols.iter().zip(vals) {
            if j != i {
                sigma = sigma + v * c[j];
            }
        }
        let ci = (rhs[i] - sigma) * self.inv_diag[i];
        c[i] = (T::one() - self.relaxation) * c[i] + self.relaxation * ci;
    }
}

impl<T: Float> Smoother<T> for SorSmoother<T> {
    type Args = SorArgs<T>;

    fn build(matrix: &CsrMatrix<T>, args: &Self::Args) -> Result<Self, AmgError> {
        if args.sweep.is_empty() {
            return Err(AmgError::InvalidCriterion(
                "SOR sweep selects no direction".into(),
            ));
        }
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
            sweep: args.sweep,
        })
    }

    fn apply(&self, matrix: &CsrMatrix<T>, lhs: &mut [T], rhs: &[T]) {
        let n = rhs.len();
        let mut c = vec![T::zero(); n];
        if self.sweep.intersects(SorSweep::FORWARD) {
            for i in 0..n {
                self.relax(matrix, &mut c, rhs, i);
            }
        }
        if self.sweep.intersects(SorSweep::BACKWARD) {
            for i in (0..n).rev() {
                self.relax(matrix, &mut c, rhs, i);
            }
        }
        for i in 0..n {
            lhs[i] = lhs[i] + c[i];
        }
    }
}
