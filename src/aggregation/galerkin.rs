// Galerkin triple product for piecewise-constant transfer.

use std::collections::BTreeSet;

use crate::aggregation::aggregates::AggregatesMap;
use crate::error::AmgError;
use crate::matrix::CsrMatrix;
use crate::parallel::Ownership;
use num_traits::Float;

/// Sparsity pattern of the coarse operator P^T A P, where P is the
/// piecewise-constant interpolation induced by an aggregates map.
///
/// The pattern depends only on the aggregation, so it is built once and the
/// values are recomputed whenever the fine operator changes.
#[derive(Clone, Debug)]
pub struct GalerkinProduct {
    n_coarse: usize,
    row_ptr: Vec<usize>,
    col_idx: Vec<usize>,
}

impl GalerkinProduct {
    /// Derive the coarse sparsity from the fine pattern and the aggregates.
    ///
    /// Coarse row I couples to coarse column J whenever some fine entry
    /// (i, j) exists with i in aggregate I and j in aggregate J. The diagonal
    /// is always stored, so rows of skipped-only coupling still factorize.
    pub fn build<T: Float>(
        fine: &CsrMatrix<T>,
        aggregates: &AggregatesMap,
        n_coarse: usize,
    ) -> Self {
        let mut rows: Vec<BTreeSet<usize>> = vec![BTreeSet::new(); n_coarse];
        for (i, row) in rows.iter_mut().enumerate() {
            row.insert(i);
        }
        for i in 0..fine.nrows() {
            let Some(ci) = aggregates.aggregate(i) else {
                continue;
            };
            let (cols, _) = fine.row(i);
            for &j in cols {
                if let Some(cj) = aggregates.aggregate(j) {
                    rows[ci].insert(cj);
                }
            }
        }
        let mut row_ptr = Vec::with_capacity(n_coarse + 1);
        row_ptr.push(0);
        let mut col_idx = Vec::new();
        for row in rows {
            col_idx.extend(row);
            row_ptr.push(col_idx.len());
        }
        Self {
            n_coarse,
            row_ptr,
            col_idx,
        }
    }

    /// Number of coarse unknowns.
    pub fn n_coarse(&self) -> usize {
        self.n_coarse
    }

    /// Stored entries in the coarse pattern.
    pub fn nnz(&self) -> usize {
        self.col_idx.len()
    }

    /// Accumulate the coarse values from the current fine operator.
    ///
    /// Rows not owned by this process and skipped rows contribute nothing.
    /// The fine matrix and aggregates must be the ones the pattern was built
    /// from.
    pub fn calculate<T, O>(
        &self,
        fine: &CsrMatrix<T>,
        aggregates: &AggregatesMap,
        ownership: &O,
    ) -> Result<CsrMatrix<T>, AmgError>
    where
        T: Float,
        O: Ownership,
    {
        let mut values = vec![T::zero(); self.col_idx.len()];
        for i in 0..fine.nrows() {
            if !ownership.is_owned(i) {
                continue;
            }
            let Some(ci) = aggregates.aggregate(i) else {
                continue;
            };
            let span = self.row_ptr[ci]..self.row_ptr[ci + 1];
            let row_cols = &self.col_idx[span.clone()];
            let (cols, vals) = fine.row(i);
            for (&j, &v) in cols.iter().zip(vals) {
                let Some(cj) = aggregates.aggregate(j) else {
                    continue;
                };
                let k = row_cols
                    .binary_search(&cj)
                    .expect("coarse pattern does not cover this aggregate pair");
                values[span.start + k] = values[span.start + k] + v;
            }
        }
        CsrMatrix::from_csr(
            self.n_coarse,
            self.n_coarse,
            self.row_ptr.clone(),
            self.col_idx.clone(),
            values,
        )
    }
}
