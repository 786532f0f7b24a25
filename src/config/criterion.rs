//! Coarsening parameters shared by the transfer policy and the recursive AMG.

use crate::error::AmgError;
use num_traits::Float;

/// Parameters steering aggregation and the multilevel hierarchy.
///
/// `strength_threshold` decides which couplings count as strong
/// (|a_ij| / sqrt(|a_ii a_jj|) above the threshold), `min_aggregate_size`
/// and `max_aggregate_size` bound the aggregate growth, and
/// `prolong_damping` scales the interpolated correction. The remaining
/// fields bound the recursive hierarchy: stop once a level has at most
/// `coarsen_target` unknowns, never exceed `max_levels`, and stop early when
/// a coarsening step shrinks the system by less than `min_coarsen_rate`.
#[derive(Clone, Debug)]
pub struct CoarseningCriterion<T> {
    pub strength_threshold: T,
    pub min_aggregate_size: usize,
    pub max_aggregate_size: usize,
    pub prolong_damping: T,
    pub max_levels: usize,
    pub coarsen_target: usize,
    pub min_coarsen_rate: T,
}

impl<T: Float> Default for CoarseningCriterion<T> {
    fn default() -> Self {
        Self {
            strength_threshold: num_traits::cast(1.0 / 3.0).unwrap_or_else(T::zero),
            min_aggregate_size: 4,
            max_aggregate_size: 6,
            prolong_damping: T::one(),
            max_levels: 100,
            coarsen_target: 100,
            min_coarsen_rate: num_traits::cast(1.2).unwrap_or_else(T::one),
        }
    }
}

impl<T: Float> CoarseningCriterion<T> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_strength_threshold(mut self, threshold: T) -> Self {
        self.strength_threshold = threshold;
        self
    }

    pub fn with_aggregate_size(mut self, min: usize, max: usize) -> Self {
        self.min_aggregate_size = min;
        self.max_aggregate_size = max;
        self
    }

    pub fn with_prolong_damping(mut self, damping: T) -> Self {
        self.prolong_damping = damping;
        self
    }

    pub fn with_max_levels(mut self, levels: usize) -> Self {
        self.max_levels = levels;
        self
    }

    pub fn with_coarsen_target(mut self, target: usize) -> Self {
        self.coarsen_target = target;
        self
    }

    pub fn with_min_coarsen_rate(mut self, rate: T) -> Self {
        self.min_coarsen_rate = rate;
        self
    }

    /// Reject unusable parameter combinations up front.
    pub fn validate(&self) -> Result<(), AmgError> {
        if !(self.strength_threshold >= T::zero() && self.strength_threshold < T::one()) {
            return Err(AmgError::InvalidCriterion(
                "strength threshold must lie in [0, 1)".into(),
            ));
        }
        let two = T::one() + T::one();
        if !(self.prolong_damping > T::zero() && self.prolong_damping <= two) {
            return Err(AmgError::InvalidCriterion(
                "prolongation damping must lie in (0, 2]".into(),
            ));
        }
        if self.min_aggregate_size == 0 {
            return Err(AmgError::InvalidCriterion(
                "minimum aggregate size must be at least 1".into(),
            ));
        }
        if self.max_aggregate_size < self.min_aggregate_size {
            return Err(AmgError::InvalidCriterion(
                "maximum aggregate size below the minimum".into(),
            ));
        }
        if self.max_levels == 0 {
            return Err(AmgError::InvalidCriterion(
                "at least one level is required".into(),
            ));
        }
        if self.coarsen_target == 0 {
            return Err(AmgError::InvalidCriterion(
                "coarsen target must be at least 1".into(),
            ));
        }
        if !(self.min_coarsen_rate > T::one()) {
            return Err(AmgError::InvalidCriterion(
                "coarsening rate must exceed 1".into(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_validate() {
        assert!(CoarseningCriterion::<f64>::default().validate().is_ok());
    }

    #[test]
    fn rejects_out_of_range_damping() {
        let c = CoarseningCriterion::<f64>::new().with_prolong_damping(0.0);
        assert!(matches!(c.validate(), Err(AmgError::InvalidCriterion(_))));
        let c = CoarseningCriterion::<f64>::new().with_prolong_damping(2.5);
        assert!(matches!(c.validate(), Err(AmgError::InvalidCriterion(_))));
        let c = CoarseningCriterion::<f64>::new().with_prolong_damping(f64::NAN);
        assert!(matches!(c.validate(), Err(AmgError::InvalidCriterion(_))));
    }

    #[test]
    fn rejects_inverted_aggregate_sizes() {
        let c = CoarseningCriterion::<f64>::new().with_aggregate_size(6, 4);
        assert!(matches!(c.validate(), Err(AmgError::InvalidCriterion(_))));
    }
}
