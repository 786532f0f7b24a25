//! Coarse-level solvers and the outer Krylov driver.

use crate::error::AmgError;
use crate::preconditioner::Preconditioner;
use crate::utils::SolveReport;

/// Common interface for any iterative solver of A·x = b.
pub trait LinearSolver<M, T> {
    /// Solve A·x = b, writing the result into `x`, optionally through a
    /// preconditioner. Returns iteration diagnostics.
    fn solve(
        &mut self,
        a: &M,
        pc: Option<&mut dyn Preconditioner<T>>,
        b: &[T],
        x: &mut [T],
    ) -> Result<SolveReport<T>, AmgError>;
}

/// Approximate inverse bound to one operator, applied in place.
///
/// `x` carries the iterate in and out; `b` is the right-hand side. The
/// report carries residual diagnostics; failure to converge is reported,
/// never raised.
pub trait InverseOperator<T> {
    /// Apply the inverse with the implementation's default reduction.
    fn apply(&mut self, x: &mut [T], b: &[T]) -> SolveReport<T>;

    /// Apply the inverse requesting a residual reduction.
    fn apply_with_reduction(&mut self, x: &mut [T], b: &[T], reduction: T) -> SolveReport<T>;
}

/// Lifecycle of a recursive multilevel solver: one-time setup, repeated
/// application, one-time teardown.
pub trait MultilevelCycle<T> {
    /// Setup phase. Runs once before the first `apply`.
    fn pre(&mut self, lhs: &mut [T], rhs: &[T]);

    /// One multilevel cycle improving `lhs`.
    fn apply(&mut self, lhs: &mut [T], rhs: &[T]);

    /// Teardown phase. Runs once after the last `apply`.
    fn post(&mut self, lhs: &mut [T]);
}

pub mod amg;
pub use amg::Amg;

pub mod coarse;
pub use coarse::{CoarseSolverHandle, CoarseSolverPolicy, OneStepAmgPolicy};

pub mod pcg;
pub use pcg::PcgSolver;
