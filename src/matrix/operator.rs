// Assembled linear operator over CSR storage.

use crate::core::traits::{Indexing, MatVec};
use crate::matrix::sparse::CsrMatrix;
use crate::parallel::SolverCategory;
use num_traits::Float;

/// A sparse linear operator A together with the operations the preconditioner
/// cycle needs: plain application and defect computation b − A x.
#[derive(Clone, Debug)]
pub struct MatrixOperator<T> {
    matrix: CsrMatrix<T>,
}

impl<T: Float + Send + Sync> MatrixOperator<T> {
    pub fn new(matrix: CsrMatrix<T>) -> Self {
        Self { matrix }
    }

    /// The underlying matrix, for structural inspection.
    pub fn matrix(&self) -> &CsrMatrix<T> {
        &self.matrix
    }

    pub fn nrows(&self) -> usize {
        self.matrix.nrows()
    }

    pub fn ncols(&self) -> usize {
        self.matrix.ncols()
    }

    pub fn is_square(&self) -> bool {
        self.matrix.nrows() == self.matrix.ncols()
    }

    /// Compute y = A x.
    pub fn apply(&self, x: &[T], y: &mut [T]) {
        #[cfg(feature = "rayon")]
        self.matrix.spmv_parallel(x, y);
        #[cfg(not(feature = "rayon"))]
        self.matrix.spmv(x, y);
    }

    /// Compute out = b − A x in one pass over the rows.
    pub fn defect(&self, b: &[T], x: &[T], out: &mut [T]) {
        assert_eq!(b.len(), self.matrix.nrows());
        assert_eq!(x.len(), self.matrix.ncols());
        assert_eq!(out.len(), self.matrix.nrows());
        #[cfg(feature = "rayon")]
        {
            use rayon::prelude::*;
            out.par_iter_mut().enumerate().for_each(|(i, oi)| {
                let (cols, vals) = self.matrix.row(i);
                let mut sum = T::zero();
                for (&j, &v) in cols.iter().zip(vals) {
                    sum = sum + v * x[j];
                }
                *oi = b[i] - sum;
            });
        }
        #[cfg(not(feature = "rayon"))]
        for i in 0..self.matrix.nrows() {
            let (cols, vals) = self.matrix.row(i);
            let mut sum = T::zero();
            for (&j, &v) in cols.iter().zip(vals) {
                sum = sum + v * x[j];
            }
            out[i] = b[i] - sum;
        }
    }

    /// Euclidean norm of the defect b − A x.
    pub fn defect_norm(&self, b: &[T], x: &[T]) -> T {
        let mut tmp = vec![T::zero(); self.matrix.nrows()];
        self.defect(b, x, &mut tmp);
        tmp.iter().fold(T::zero(), |acc, v| acc + *v * *v).sqrt()
    }

    /// Execution category of this operator.
    pub fn category(&self) -> SolverCategory {
        SolverCategory::Sequential
    }
}

impl<T: Float + Send + Sync> MatVec<Vec<T>> for MatrixOperator<T> {
    fn matvec(&self, x: &Vec<T>, y: &mut Vec<T>) {
        self.apply(x, y);
    }
}

impl<T> Indexing for MatrixOperator<T> {
    fn nrows(&self) -> usize {
        self.matrix.nrows()
    }
}
