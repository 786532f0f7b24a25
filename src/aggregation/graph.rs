// Adjacency view of a sparse matrix for aggregation.

use crate::error::AmgError;
use crate::matrix::CsrMatrix;
use num_traits::Float;

/// The connectivity graph of a square matrix: one vertex per unknown, one
/// directed edge per stored off-diagonal entry.
pub struct MatrixGraph<'a, T> {
    matrix: &'a CsrMatrix<T>,
}

impl<'a, T: Float> MatrixGraph<'a, T> {
    pub fn new(matrix: &'a CsrMatrix<T>) -> Result<Self, AmgError> {
        if matrix.nrows() != matrix.ncols() {
            return Err(AmgError::DimensionMismatch(format!(
                "connectivity graph needs a square matrix, got {}x{}",
                matrix.nrows(),
                matrix.ncols()
            )));
        }
        Ok(Self { matrix })
    }

    pub fn vertices(&self) -> usize {
        self.matrix.nrows()
    }

    /// Off-diagonal entries of row `v` as (column, value) pairs, in column order.
    pub fn edges(&self, v: usize) -> impl Iterator<Item = (usize, T)> + '_ {
        let (cols, vals) = self.matrix.row(v);
        cols.iter()
            .copied()
            .zip(vals.iter().copied())
            .filter(move |&(j, _)| j != v)
    }

    pub fn matrix(&self) -> &'a CsrMatrix<T> {
        self.matrix
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn edges_skip_the_diagonal() {
        let m = CsrMatrix::from_triplets(
            3,
            3,
            &[(0, 0, 2.0), (0, 1, -1.0), (1, 1, 2.0), (2, 0, -1.0), (2, 2, 2.0)],
        )
        .unwrap();
        let g = MatrixGraph::new(&m).unwrap();
        assert_eq!(g.vertices(), 3);
        assert_eq!(g.edges(0).collect::<Vec<_>>(), vec![(1, -1.0)]);
        assert!(g.edges(1).next().is_none());
        assert_eq!(g.edges(2).collect::<Vec<_>>(), vec![(0, -1.0)]);
    }

    #[test]
    fn rejects_rectangular_matrices() {
        let m = CsrMatrix::<f64>::from_triplets(2, 3, &[(0, 0, 1.0)]).unwrap();
        assert!(matches!(
            MatrixGraph::new(&m),
            Err(AmgError::DimensionMismatch(_))
        ));
    }
}
