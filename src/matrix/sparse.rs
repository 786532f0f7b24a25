// Compressed sparse row storage for the fine and coarse operators.

use crate::core::traits::{Indexing, MatVec};
use crate::error::AmgError;
use num_traits::Float;

/// Square or rectangular sparse matrix in CSR layout.
///
/// Column indices are kept strictly increasing within each row, which makes
/// `get` a binary search and keeps every traversal deterministic.
#[derive(Clone, Debug)]
pub struct CsrMatrix<T> {
    nrows: usize,
    ncols: usize,
    row_ptr: Vec<usize>,
    col_idx: Vec<usize>,
    values: Vec<T>,
}

impl<T: Float> CsrMatrix<T> {
    /// Build a CSR matrix from raw row-pointer, column-index, and value arrays.
    pub fn from_csr(
        nrows: usize,
        ncols: usize,
        row_ptr: Vec<usize>,
        col_idx: Vec<usize>,
        values: Vec<T>,
    ) -> Result<Self, AmgError> {
        if row_ptr.len() != nrows + 1 {
            return Err(AmgError::InvalidMatrix(format!(
                "row pointer length {} does not match {} rows",
                row_ptr.len(),
                nrows
            )));
        }
        if row_ptr[0] != 0 || row_ptr[nrows] != col_idx.len() || col_idx.len() != values.len() {
            return Err(AmgError::InvalidMatrix(
                "row pointers do not span the column/value arrays".into(),
            ));
        }
        for i in 0..nrows {
            if row_ptr[i] > row_ptr[i + 1] {
                return Err(AmgError::InvalidMatrix(format!(
                    "row pointers decrease at row {i}"
                )));
            }
            if row_ptr[i + 1] > col_idx.len() {
                return Err(AmgError::InvalidMatrix(format!(
                    "row pointer {} exceeds the {} stored entries at row {i}",
                    row_ptr[i + 1],
                    col_idx.len()
                )));
            }
            let cols = &col_idx[row_ptr[i]..row_ptr[i + 1]];
            for w in cols.windows(2) {
                if w[0] >= w[1] {
                    return Err(AmgError::InvalidMatrix(format!(
                        "column indices not strictly increasing in row {i}"
                    )));
                }
            }
            if let Some(&j) = cols.last() {
                if j >= ncols {
                    return Err(AmgError::InvalidMatrix(format!(
                        "column index {j} out of bounds in row {i}"
                    )));
                }
            }
        }
        Ok(Self {
            nrows,
            ncols,
            row_ptr,
            col_idx,
            values,
        })
    }

    /// Build a CSR matrix from (row, col, value) triplets; duplicates are summed.
    pub fn from_triplets(
        nrows: usize,
        ncols: usize,
        entries: &[(usize, usize, T)],
    ) -> Result<Self, AmgError> {
        let mut rows: Vec<Vec<(usize, T)>> = vec![Vec::new(); nrows];
        for &(i, j, v) in entries {
            if i >= nrows || j >= ncols {
                return Err(AmgError::InvalidMatrix(format!(
                    "entry ({i}, {j}) outside a {nrows}x{ncols} matrix"
                )));
            }
            rows[i].push((j, v));
        }
        let mut row_ptr = Vec::with_capacity(nrows + 1);
        row_ptr.push(0);
        let mut col_idx = Vec::new();
        let mut values = Vec::new();
        for row in &mut rows {
            row.sort_unstable_by_key(|&(j, _)| j);
            let mut last = None;
            for &(j, v) in row.iter() {
                if last == Some(j) {
                    if let Some(tail) = values.last_mut() {
                        *tail = *tail + v;
                    }
                } else {
                    col_idx.push(j);
                    values.push(v);
                    last = Some(j);
                }
            }
            row_ptr.push(col_idx.len());
        }
        Ok(Self {
            nrows,
            ncols,
            row_ptr,
            col_idx,
            values,
        })
    }

    /// The n×n identity.
    pub fn identity(n: usize) -> Self {
        Self {
            nrows: n,
            ncols: n,
            row_ptr: (0..=n).collect(),
            col_idx: (0..n).collect(),
            values: vec![T::one(); n],
        }
    }

    /// Number of rows.
    pub fn nrows(&self) -> usize {
        self.nrows
    }

    /// Number of columns.
    pub fn ncols(&self) -> usize {
        self.ncols
    }

    /// Number of stored entries.
    pub fn nnz(&self) -> usize {
        self.col_idx.len()
    }

    /// Column indices and values of row `i`.
    pub fn row(&self, i: usize) -> (&[usize], &[T]) {
        let span = self.row_ptr[i]..self.row_ptr[i + 1];
        (&self.col_idx[span.clone()], &self.values[span])
    }

    /// Entry (i, j), zero if not stored.
    pub fn get(&self, i: usize, j: usize) -> T {
        let (cols, vals) = self.row(i);
        match cols.binary_search(&j) {
            Ok(pos) => vals[pos],
            Err(_) => T::zero(),
        }
    }

    /// The diagonal as a dense vector, zero where no entry is stored.
    pub fn diagonal(&self) -> Vec<T> {
        (0..self.nrows.min(self.ncols))
            .map(|i| self.get(i, i))
            .collect()
    }

    /// Compute y = A * x. `x.len() == ncols()`, `y.len() == nrows()`.
    pub fn spmv(&self, x: &[T], y: &mut [T]) {
        assert_eq!(x.len(), self.ncols);
        assert_eq!(y.len(), self.nrows);
        for i in 0..self.nrows {
            let (cols, vals) = self.row(i);
            let mut sum = T::zero();
            for (&j, &v) in cols.iter().zip(vals) {
                sum = sum + v * x[j];
            }
            y[i] = sum;
        }
    }
}

impl<T: Float + faer::traits::ComplexField> CsrMatrix<T> {
    /// Dense copy, used for the coarsest-level factorization.
    pub fn to_dense(&self) -> faer::Mat<T> {
        faer::Mat::from_fn(self.nrows, self.ncols, |i, j| self.get(i, j))
    }
}

#[cfg(feature = "rayon")]
impl<T: Float + Send + Sync> CsrMatrix<T> {
    /// Parallel spmv over rows using rayon; each row sum stays serial, so the
    /// result is bitwise identical to the serial kernel.
    pub fn spmv_parallel(&self, x: &[T], y: &mut [T]) {
        use rayon::prelude::*;
        assert_eq!(x.len(), self.ncols);
        assert_eq!(y.len(), self.nrows);
        y.par_iter_mut().enumerate().for_each(|(i, yi)| {
            let (cols, vals) = self.row(i);
            let mut sum = T::zero();
            for (&j, &v) in cols.iter().zip(vals) {
                sum = sum + v * x[j];
            }
            *yi = sum;
        });
    }
}

impl<T: Float + Send + Sync> MatVec<Vec<T>> for CsrMatrix<T> {
    fn matvec(&self, x: &Vec<T>, y: &mut Vec<T>) {
        #[cfg(feature = "rayon")]
        self.spmv_parallel(x, y);
        #[cfg(not(feature = "rayon"))]
        self.spmv(x, y);
    }
}

impl<T> Indexing for CsrMatrix<T> {
    fn nrows(&self) -> usize {
        self.nrows
    }
}
