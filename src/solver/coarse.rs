// Coarse-solver construction and the one-shot solve lifecycle.

use std::sync::Arc;

use crate::config::CoarseningCriterion;
use crate::error::AmgError;
use crate::matrix::MatrixOperator;
use crate::smoother::Smoother;
use crate::solver::{Amg, InverseOperator, MultilevelCycle};
use crate::transfer::TransferPolicy;
use crate::utils::SolveReport;
use faer::traits::{ComplexField, RealField};
use num_traits::Float;

/// Builds, from a transfer policy's coarse operator, the solver object the
/// preconditioner cycle applies to the coarse system.
pub trait CoarseSolverPolicy<T> {
    fn create_coarse_level_solver(
        &mut self,
        transfer: &dyn TransferPolicy<T>,
    ) -> Result<Box<dyn InverseOperator<T>>, AmgError>;
}

/// Coarse-solver policy wrapping one full application of a recursive AMG
/// hierarchy per solve.
pub struct OneStepAmgPolicy<T, S: Smoother<T>> {
    criterion: CoarseningCriterion<T>,
    smoother_args: S::Args,
}

impl<T: Float, S: Smoother<T>> OneStepAmgPolicy<T, S> {
    pub fn new(criterion: CoarseningCriterion<T>, smoother_args: S::Args) -> Self {
        Self {
            criterion,
            smoother_args,
        }
    }
}

impl<T, S> CoarseSolverPolicy<T> for OneStepAmgPolicy<T, S>
where
    T: Float + Send + Sync + ComplexField + RealField + 'static,
    S: Smoother<T> + 'static,
{
    fn create_coarse_level_solver(
        &mut self,
        transfer: &dyn TransferPolicy<T>,
    ) -> Result<Box<dyn InverseOperator<T>>, AmgError> {
        let operator = transfer
            .coarse_operator()
            .ok_or(AmgError::CoarseSystemMissing)?;
        let solver =
            Amg::<T, S>::new(&operator, self.criterion.clone(), self.smoother_args.clone())?;
        Ok(Box::new(CoarseSolverHandle::new(solver, operator)))
    }
}

enum HandleState<T> {
    Uninitialized,
    Active { iterate: Vec<T> },
    Closed,
}

/// One-shot setup/teardown wrapper around a multilevel solver.
///
/// The underlying solver's `pre` runs on the first `apply`, where a copy of
/// the iterate is captured; its `post` runs on that copy exactly once when
/// the handle is closed or dropped, and is skipped when no `apply` ever
/// happened.
pub struct CoarseSolverHandle<T, C>
where
    T: Float + Send + Sync,
    C: MultilevelCycle<T>,
{
    solver: C,
    operator: Arc<MatrixOperator<T>>,
    state: HandleState<T>,
    default_reduction: T,
}

impl<T, C> CoarseSolverHandle<T, C>
where
    T: Float + Send + Sync,
    C: MultilevelCycle<T>,
{
    pub fn new(solver: C, operator: Arc<MatrixOperator<T>>) -> Self {
        Self {
            solver,
            operator,
            state: HandleState::Uninitialized,
            default_reduction: num_traits::cast(1e-8).unwrap_or_else(T::zero),
        }
    }

    /// True once the first `apply` has run and the handle is not yet closed.
    pub fn is_active(&self) -> bool {
        matches!(self.state, HandleState::Active { .. })
    }

    /// Run the underlying solver's teardown if it ever started. Idempotent;
    /// also invoked on drop.
    pub fn close(&mut self) {
        if let HandleState::Active { iterate } = &mut self.state {
            self.solver.post(iterate);
        }
        self.state = HandleState::Closed;
    }
}

impl<T, C> InverseOperator<T> for CoarseSolverHandle<T, C>
where
    T: Float + Send + Sync,
    C: MultilevelCycle<T>,
{
    fn apply(&mut self, x: &mut [T], b: &[T]) -> SolveReport<T> {
        let reduction = self.default_reduction;
        self.apply_with_reduction(x, b, reduction)
    }

    /// One fixed-cost application of the multilevel solver. The requested
    /// reduction is ignored; the report states what the single cycle
    /// achieved against the default tolerance.
    fn apply_with_reduction(&mut self, x: &mut [T], b: &[T], _reduction: T) -> SolveReport<T> {
        assert!(
            !matches!(self.state, HandleState::Closed),
            "coarse solver handle already closed"
        );
        let initial = self.operator.defect_norm(b, x);
        if matches!(self.state, HandleState::Uninitialized) {
            self.solver.pre(x, b);
            self.state = HandleState::Active {
                iterate: x.to_vec(),
            };
        }
        self.solver.apply(x, b);
        let final_residual = self.operator.defect_norm(b, x);
        let converged =
            final_residual == T::zero() || final_residual <= self.default_reduction * initial;
        SolveReport {
            iterations: 1,
            initial_residual: initial,
            final_residual,
            converged,
        }
    }
}

impl<T, C> Drop for CoarseSolverHandle<T, C>
where
    T: Float + Send + Sync,
    C: MultilevelCycle<T>,
{
    fn drop(&mut self) {
        self.close();
    }
}
