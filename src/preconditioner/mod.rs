//! Preconditioners with an explicit setup/apply/teardown lifecycle.
//!
//! A preconditioner brackets a Krylov solve: `pre` runs once before the
//! first iteration, `apply` computes an approximate defect correction each
//! iteration, and `post` runs once after the final iterate is accepted.

use crate::error::AmgError;
use crate::parallel::SolverCategory;

pub mod two_level;

pub use two_level::TwoLevelPreconditioner;

/// Stateful preconditioner contract.
///
/// `apply(v, d)` overwrites `v` with an approximate solution of `M v = d`
/// for the defect `d`; callers hand `v` in zeroed. Implementations may keep
/// per-solve state as long as `pre` and `post` bracket it.
pub trait Preconditioner<T> {
    /// Prepare for a solve on the pair (x, b). Runs once per solve.
    fn pre(&mut self, _x: &mut [T], _b: &[T]) -> Result<(), AmgError> {
        Ok(())
    }

    /// Apply one action v ← M⁻¹ d. `v` is zero on entry.
    fn apply(&mut self, v: &mut [T], d: &[T]) -> Result<(), AmgError>;

    /// Release per-solve state after the final iterate `x` is accepted.
    fn post(&mut self, _x: &mut [T]) -> Result<(), AmgError> {
        Ok(())
    }

    /// Execution category of this preconditioner.
    fn category(&self) -> SolverCategory {
        SolverCategory::Sequential
    }
}
