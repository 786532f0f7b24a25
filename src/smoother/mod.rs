//! Relaxation smoothers.
//!
//! A smoother performs one sweep in residual-correction form: given the
//! current residual `rhs`, it folds an approximate correction into `lhs`.
//! The caller is responsible for keeping `rhs` equal to the true residual
//! between sweeps.

pub mod jacobi;
pub mod sor;

pub use jacobi::{DampedJacobi, JacobiArgs};
pub use sor::{SorArgs, SorSmoother, SorSweep};

use crate::error::AmgError;
use crate::matrix::CsrMatrix;

/// One relaxation sweep bound to a matrix.
pub trait Smoother<T>: Sized {
    /// Construction arguments, shared across hierarchy levels.
    type Args: Clone;

    /// Build a smoother for `matrix`. Fails on a zero diagonal entry.
    fn build(matrix: &CsrMatrix<T>, args: &Self::Args) -> Result<Self, AmgError>;

    /// One sweep: `lhs += W⁻¹ rhs` for the smoother's approximation W of A.
    fn apply(&self, matrix: &CsrMatrix<T>, lhs: &mut [T], rhs: &[T]);
}
