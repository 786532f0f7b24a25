// Aggregation-based transfer between levels.

use std::sync::Arc;

use crate::aggregation::{
    build_aggregates, AggregatesMap, AggregationCounts, GalerkinProduct, MatrixGraph,
};
use crate::config::CoarseningCriterion;
use crate::error::AmgError;
use crate::matrix::MatrixOperator;
use crate::parallel::SequentialInfo;
use crate::transfer::{TransferPolicy, TransferState};
use num_traits::Float;

/// Restrict a fine vector by summing its entries over each aggregate.
///
/// Skipped unknowns contribute nothing. This is the exact adjoint of the
/// undamped piecewise-constant prolongation.
pub fn restrict_vector<T: Float>(aggregates: &AggregatesMap, fine: &[T], coarse: &mut [T]) {
    coarse.fill(T::zero());
    for (v, value) in fine.iter().enumerate() {
        if let Some(a) = aggregates.aggregate(v) {
            coarse[a] = coarse[a] + *value;
        }
    }
}

/// Add `damping` times the piecewise-constant interpolation of `coarse` into
/// `fine`. Skipped unknowns receive no correction.
pub fn prolongate_vector<T: Float>(
    aggregates: &AggregatesMap,
    coarse: &[T],
    damping: T,
    fine: &mut [T],
) {
    for (v, value) in fine.iter_mut().enumerate() {
        if let Some(a) = aggregates.aggregate(v) {
            *value = *value + damping * coarse[a];
        }
    }
}

/// Transfer policy that derives the coarse system by algebraic aggregation.
///
/// `create_coarse_level_system` partitions the fine unknowns into aggregates
/// of strongly connected neighbors and forms the coarse operator as the
/// Galerkin product over the partition. Restriction and prolongation are
/// never materialized as matrices; both walk the aggregates map directly.
pub struct AggregationTransferPolicy<T> {
    criterion: CoarseningCriterion<T>,
    state: TransferState<T>,
    aggregates: Option<AggregatesMap>,
    counts: AggregationCounts,
    monitor: Option<Box<dyn FnMut(AggregationCounts)>>,
}

impl<T: Float + Send + Sync> AggregationTransferPolicy<T> {
    /// A policy for the given coarsening criterion. Fails fast on malformed
    /// criterion bounds.
    pub fn new(criterion: CoarseningCriterion<T>) -> Result<Self, AmgError> {
        criterion.validate()?;
        Ok(Self {
            criterion,
            state: TransferState::new(),
            aggregates: None,
            counts: AggregationCounts::default(),
            monitor: None,
        })
    }

    /// Observe aggregation diagnostics when the coarse system is built.
    pub fn with_monitor(mut self, monitor: impl FnMut(AggregationCounts) + 'static) -> Self {
        self.monitor = Some(Box::new(monitor));
        self
    }

    /// Diagnostics from the last `create_coarse_level_system` call.
    pub fn counts(&self) -> AggregationCounts {
        self.counts
    }

    /// The vertex-to-aggregate assignment, once built.
    pub fn aggregates(&self) -> Option<&AggregatesMap> {
        self.aggregates.as_ref()
    }

    /// The criterion this policy coarsens with.
    pub fn criterion(&self) -> &CoarseningCriterion<T> {
        &self.criterion
    }
}

impl<T: Float + Send + Sync> TransferPolicy<T> for AggregationTransferPolicy<T> {
    fn create_coarse_level_system(&mut self, fine: &MatrixOperator<T>) -> Result<(), AmgError> {
        let matrix = fine.matrix();
        let graph = MatrixGraph::new(matrix)?;
        let (mut aggregates, mut counts) = build_aggregates(&graph, &self.criterion);
        // Sequential case: nothing is excluded. A distributed variant would
        // mark overlap rows here.
        let excluded = vec![false; matrix.nrows()];
        counts.skipped = excluded.iter().filter(|&&e| e).count();
        let n_coarse = aggregates.renumber(&excluded);
        if n_coarse == 0 {
            return Err(AmgError::NoAggregates);
        }
        let product = GalerkinProduct::build(matrix, &aggregates, n_coarse);
        let coarse = product.calculate(matrix, &aggregates, &SequentialInfo)?;
        if let Some(monitor) = self.monitor.as_mut() {
            monitor(counts);
        }
        self.counts = counts;
        self.aggregates = Some(aggregates);
        self.state.install(MatrixOperator::new(coarse));
        Ok(())
    }

    fn move_to_coarse_level(&mut self, fine_rhs: &[T]) {
        let aggregates = self
            .aggregates
            .as_ref()
            .expect("coarse level system not built");
        restrict_vector(aggregates, fine_rhs, &mut self.state.rhs);
        self.state.lhs.fill(T::zero());
    }

    fn move_to_fine_level(&mut self, fine_lhs: &mut [T]) {
        let aggregates = self
            .aggregates
            .as_ref()
            .expect("coarse level system not built");
        prolongate_vector(
            aggregates,
            &self.state.lhs,
            self.criterion.prolong_damping,
            fine_lhs,
        );
    }

    fn coarse_operator(&self) -> Option<Arc<MatrixOperator<T>>> {
        self.state.operator()
    }

    fn coarse_rhs(&self) -> &[T] {
        self.state.rhs()
    }

    fn coarse_lhs(&self) -> &[T] {
        self.state.lhs()
    }

    fn coarse_vectors_mut(&mut self) -> (&mut [T], &mut [T]) {
        self.state.vectors_mut()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregation::SKIPPED;
    use crate::matrix::CsrMatrix;

    fn chain(n: usize) -> CsrMatrix<f64> {
        let mut entries = Vec::new();
        for i in 0..n {
            entries.push((i, i, 2.0));
            if i > 0 {
                entries.push((i, i - 1, -1.0));
            }
            if i + 1 < n {
                entries.push((i, i + 1, -1.0));
            }
        }
        CsrMatrix::from_triplets(n, n, &entries).unwrap()
    }

    #[test]
    fn restriction_sums_over_aggregates() {
        let map = AggregatesMap::from_assignments(vec![0, 0, 1, 1]);
        let mut coarse = vec![9.0, 9.0];
        restrict_vector(&map, &[1.0, 2.0, 3.0, 4.0], &mut coarse);
        assert_eq!(coarse, vec![3.0, 7.0]);
    }

    #[test]
    fn prolongation_damps_and_skips() {
        let map = AggregatesMap::from_assignments(vec![0, 0, 1, SKIPPED]);
        let mut fine = vec![1.0; 4];
        prolongate_vector(&map, &[2.0, 4.0], 0.5, &mut fine);
        assert_eq!(fine, vec![2.0, 2.0, 3.0, 1.0]);
    }

    #[test]
    fn builds_coarse_system_for_chain() {
        let fine = MatrixOperator::new(chain(8));
        let mut policy = AggregationTransferPolicy::new(CoarseningCriterion::default()).unwrap();
        policy.create_coarse_level_system(&fine).unwrap();
        let coarse = policy.coarse_operator().unwrap();
        assert_eq!(coarse.nrows(), 2);
        assert_eq!(policy.coarse_rhs().len(), 2);
        assert_eq!(policy.coarse_lhs().len(), 2);
        assert_eq!(policy.counts().aggregates, 2);

        policy.move_to_coarse_level(&[1.0; 8]);
        assert_eq!(policy.coarse_rhs(), &[4.0, 4.0]);
        assert_eq!(policy.coarse_lhs(), &[0.0, 0.0]);
    }

    #[test]
    fn monitor_observes_counts() {
        use std::cell::Cell;
        use std::rc::Rc;

        let seen = Rc::new(Cell::new(0usize));
        let sink = Rc::clone(&seen);
        let fine = MatrixOperator::new(chain(8));
        let mut policy = AggregationTransferPolicy::new(CoarseningCriterion::default())
            .unwrap()
            .with_monitor(move |c| sink.set(c.aggregates));
        policy.create_coarse_level_system(&fine).unwrap();
        assert_eq!(seen.get(), 2);
    }

    #[test]
    fn rejects_bad_criterion() {
        let criterion = CoarseningCriterion::new().with_prolong_damping(0.0);
        assert!(matches!(
            AggregationTransferPolicy::<f64>::new(criterion),
            Err(AmgError::InvalidCriterion(_))
        ));
    }

    #[test]
    #[should_panic(expected = "not built")]
    fn restriction_requires_a_built_system() {
        let mut policy =
            AggregationTransferPolicy::<f64>::new(CoarseningCriterion::default()).unwrap();
        policy.move_to_coarse_level(&[1.0, 2.0]);
    }
}
