//! Fine/coarse level transfer.
//!
//! A [`TransferPolicy`] owns one coarse system derived from a fine operator
//! and moves residuals down and corrections up between the two levels. The
//! concrete realization in [`aggregation`] derives the coarse system
//! algebraically from the matrix connectivity.

pub mod aggregation;

pub use aggregation::AggregationTransferPolicy;

use std::sync::Arc;

use crate::error::AmgError;
use crate::matrix::MatrixOperator;
use num_traits::Float;

/// Coarse-level state every transfer policy owns: the coarse operator plus
/// the right-hand side and solution vectors the coarse solver works on.
#[derive(Debug, Default)]
pub struct TransferState<T> {
    operator: Option<Arc<MatrixOperator<T>>>,
    rhs: Vec<T>,
    lhs: Vec<T>,
}

impl<T: Float + Send + Sync> TransferState<T> {
    pub fn new() -> Self {
        Self {
            operator: None,
            rhs: Vec::new(),
            lhs: Vec::new(),
        }
    }

    /// Install the coarse operator and size the coarse vectors to match it.
    pub(crate) fn install(&mut self, operator: MatrixOperator<T>) {
        self.lhs = vec![T::zero(); operator.ncols()];
        self.rhs = vec![T::zero(); operator.nrows()];
        self.operator = Some(Arc::new(operator));
    }

    pub fn operator(&self) -> Option<Arc<MatrixOperator<T>>> {
        self.operator.clone()
    }

    pub fn is_built(&self) -> bool {
        self.operator.is_some()
    }

    pub fn rhs(&self) -> &[T] {
        &self.rhs
    }

    pub fn lhs(&self) -> &[T] {
        &self.lhs
    }

    pub fn vectors_mut(&mut self) -> (&mut [T], &mut [T]) {
        (&mut self.lhs, &mut self.rhs)
    }
}

/// Interface between the fine and the coarse level.
///
/// The contract is one `create_coarse_level_system` call followed by any
/// number of restrict/solve/prolongate cycles. The coarse operator never
/// changes once built.
pub trait TransferPolicy<T> {
    /// Build and store the coarse system for `fine`. Must run before any
    /// other operation on the policy.
    fn create_coarse_level_system(&mut self, fine: &MatrixOperator<T>) -> Result<(), AmgError>;

    /// Restrict a fine-level residual into the internal coarse rhs and reset
    /// the internal coarse lhs to zero.
    fn move_to_coarse_level(&mut self, fine_rhs: &[T]);

    /// Prolongate the internal coarse lhs and add it into `fine_lhs`.
    fn move_to_fine_level(&mut self, fine_lhs: &mut [T]);

    /// The coarse operator, shared so a coarse-solver builder can retain it.
    fn coarse_operator(&self) -> Option<Arc<MatrixOperator<T>>>;

    /// Coarse right-hand side written by the last restriction.
    fn coarse_rhs(&self) -> &[T];

    /// Coarse solution vector written by the coarse solver.
    fn coarse_lhs(&self) -> &[T];

    /// Mutable (lhs, rhs) pair for the in-place coarse solve.
    fn coarse_vectors_mut(&mut self) -> (&mut [T], &mut [T]);
}
