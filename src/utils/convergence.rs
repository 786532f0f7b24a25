//! Convergence tracking & tolerance checks for iterative solvers.

use num_traits::Float;

/// Stopping criteria.
pub struct Convergence<T> {
    pub tol: T,
    pub max_iters: usize,
}

/// Diagnostics from one solve or one coarse-solver application.
#[derive(Clone, Copy, Debug)]
pub struct SolveReport<T> {
    pub iterations: usize,
    pub initial_residual: T,
    pub final_residual: T,
    pub converged: bool,
}

impl<T: Float> SolveReport<T> {
    /// Achieved residual reduction, final over initial. One when the initial
    /// residual was already zero.
    pub fn reduction(&self) -> T {
        if self.initial_residual == T::zero() {
            T::one()
        } else {
            self.final_residual / self.initial_residual
        }
    }
}

impl<T: Float> Convergence<T> {
    /// Returns (should_stop, report) given the current residual norm and
    /// iteration count. Hitting the iteration limit stops the loop without
    /// counting as convergence.
    pub fn check(&self, res_norm: T, res0_norm: T, i: usize) -> (bool, SolveReport<T>) {
        let rel = if res0_norm == T::zero() {
            T::zero()
        } else {
            res_norm / res0_norm
        };
        let converged = rel <= self.tol;
        (
            converged || i >= self.max_iters,
            SolveReport {
                iterations: i,
                initial_residual: res0_norm,
                final_residual: res_norm,
                converged,
            },
        )
    }
}
