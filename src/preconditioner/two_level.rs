//! Two-level multigrid preconditioner.
//!
//! One application runs pre-smoothing sweeps on the fine system, restricts
//! the remaining defect through the transfer policy, solves the coarse
//! system with the policy-built solver, prolongates the correction back and
//! finishes with post-smoothing sweeps. The defect is recomputed from the
//! iterate before every post-sweep so the coarse correction is folded in.

use crate::error::AmgError;
use crate::matrix::MatrixOperator;
use crate::preconditioner::Preconditioner;
use crate::smoother::Smoother;
use crate::solver::{CoarseSolverPolicy, InverseOperator};
use crate::transfer::TransferPolicy;
use crate::utils::SolveReport;
use num_traits::Float;

/// Additive composition of a smoother and a single coarse-grid correction.
///
/// The fine operator is borrowed; the transfer policy and the coarse solver
/// are owned and set up once in [`TwoLevelPreconditioner::new`].
pub struct TwoLevelPreconditioner<'a, T, S, P> {
    operator: &'a MatrixOperator<T>,
    smoother: S,
    policy: P,
    coarse_solver: Box<dyn InverseOperator<T>>,
    pre_steps: usize,
    post_steps: usize,
    coarse_report: Option<SolveReport<T>>,
}

impl<'a, T, S, P> TwoLevelPreconditioner<'a, T, S, P>
where
    T: Float + Send + Sync,
    S: Smoother<T>,
    P: TransferPolicy<T>,
{
    /// Build the coarse system through `policy`, then let `coarse_policy`
    /// construct the solver for it.
    pub fn new<CP>(
        operator: &'a MatrixOperator<T>,
        smoother: S,
        mut policy: P,
        coarse_policy: &mut CP,
        pre_steps: usize,
        post_steps: usize,
    ) -> Result<Self, AmgError>
    where
        CP: CoarseSolverPolicy<T>,
    {
        if !operator.is_square() {
            return Err(AmgError::DimensionMismatch(format!(
                "two-level preconditioner needs a square matrix, got {}x{}",
                operator.nrows(),
                operator.ncols()
            )));
        }
        policy.create_coarse_level_system(operator)?;
        let coarse_solver = coarse_policy.create_coarse_level_solver(&policy)?;
        Ok(Self {
            operator,
            smoother,
            policy,
            coarse_solver,
            pre_steps,
            post_steps,
            coarse_report: None,
        })
    }

    /// Report from the most recent coarse solve, if an apply has run.
    pub fn coarse_report(&self) -> Option<SolveReport<T>> {
        self.coarse_report
    }

    /// The transfer policy; aggregation statistics live there.
    pub fn policy(&self) -> &P {
        &self.policy
    }
}

impl<'a, T, S, P> Preconditioner<T> for TwoLevelPreconditioner<'a, T, S, P>
where
    T: Float + Send + Sync,
    S: Smoother<T>,
    P: TransferPolicy<T>,
{
    /// v must enter zeroed; on exit it holds the two-level correction for
    /// the defect d.
    fn apply(&mut self, v: &mut [T], d: &[T]) -> Result<(), AmgError> {
        let n = self.operator.nrows();
        assert_eq!(v.len(), n, "iterate length mismatch");
        assert_eq!(d.len(), n, "defect length mismatch");

        let mut u = v.to_vec();
        let mut rhs = d.to_vec();

        for _ in 0..self.pre_steps {
            self.smoother.apply(self.operator.matrix(), &mut u, &rhs);
            self.operator.defect(d, &u, &mut rhs);
        }

        self.policy.move_to_coarse_level(&rhs);
        {
            let (coarse_lhs, coarse_rhs) = self.policy.coarse_vectors_mut();
            self.coarse_report = Some(self.coarse_solver.apply(coarse_lhs, coarse_rhs));
        }
        self.policy.move_to_fine_level(&mut u);

        for _ in 0..self.post_steps {
            self.operator.defect(d, &u, &mut rhs);
            self.smoother.apply(self.operator.matrix(), &mut u, &rhs);
        }

        v.copy_from_slice(&u);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CoarseningCriterion;
    use crate::matrix::CsrMatrix;
    use crate::smoother::{DampedJacobi, JacobiArgs, SorArgs, SorSmoother, SorSweep};
    use crate::solver::OneStepAmgPolicy;
    use crate::transfer::AggregationTransferPolicy;
    use approx::assert_relative_eq;

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

    // 6 on the diagonal, -1 everywhere else; every row sums to 1.
    fn dense_coupled(n: usize) -> CsrMatrix<f64> {
        let mut entries = Vec::new();
        for i in 0..n {
            for j in 0..n {
                let value = if i == j { 6.0 } else { -1.0 };
                entries.push((i, j, value));
            }
        }
        CsrMatrix::from_triplets(n, n, &entries).unwrap()
    }

    #[test]
    fn single_aggregate_correction_is_exact_on_constants() {
        let op = MatrixOperator::new(dense_coupled(6));
        let criterion = CoarseningCriterion::default()
            .with_strength_threshold(0.1)
            .with_aggregate_size(6, 6);
        let transfer = AggregationTransferPolicy::new(criterion).unwrap();
        let smoother = DampedJacobi::build(op.matrix(), &JacobiArgs::default()).unwrap();
        let mut coarse_policy = OneStepAmgPolicy::<f64, DampedJacobi<f64>>::new(
            CoarseningCriterion::default(),
            JacobiArgs::default(),
        );
        let mut pc =
            TwoLevelPreconditioner::new(&op, smoother, transfer, &mut coarse_policy, 0, 0)
                .unwrap();

        let d = vec![2.5; 6];
        let mut v = vec![0.0; 6];
        pc.apply(&mut v, &d).unwrap();

        // Row sums are 1, so the solution of A u = 2.5 is the constant 2.5
        // and a single sum-restricted aggregate reproduces it.
        for vi in &v {
            assert_relative_eq!(*vi, 2.5, epsilon = 1e-12);
        }
        assert!(op.defect_norm(&d, &v) < 1e-12);
        let report = pc.coarse_report().unwrap();
        assert_eq!(report.iterations, 1);
        assert!(report.converged);
    }

    #[test]
    fn post_smoothing_sees_the_coarse_correction() {
        let op = MatrixOperator::new(chain(4));
        let criterion = CoarseningCriterion::default().with_aggregate_size(2, 2);
        let transfer = AggregationTransferPolicy::new(criterion).unwrap();
        let smoother = SorSmoother::build(op.matrix(), &SorArgs::default()).unwrap();
        let mut coarse_policy = OneStepAmgPolicy::<f64, DampedJacobi<f64>>::new(
            CoarseningCriterion::default(),
            JacobiArgs::default(),
        );
        let mut pc =
            TwoLevelPreconditioner::new(&op, smoother, transfer, &mut coarse_policy, 0, 1)
                .unwrap();

        let d = vec![1.0; 4];
        let mut v = vec![0.0; 4];
        pc.apply(&mut v, &d).unwrap();

        // Coarse correction alone gives [2, 2, 2, 2]; one forward sweep on
        // the refreshed defect [-1, 1, 1, -1] then lands here.
        let expected = [1.5, 2.25, 2.625, 1.8125];
        for (vi, ei) in v.iter().zip(expected.iter()) {
            assert_relative_eq!(*vi, *ei, epsilon = 1e-12);
        }
        // The defect of the zero iterate is ||d|| = 2.
        let after = op.defect_norm(&d, &v);
        assert!(after < 0.8, "after = {after}");
    }

    #[test]
    fn repeated_applications_drive_the_defect_down() {
        let op = MatrixOperator::new(chain(16));
        let criterion = CoarseningCriterion::default().with_aggregate_size(2, 2);
        let transfer = AggregationTransferPolicy::new(criterion).unwrap();
        let args = SorArgs {
            relaxation: 1.0,
            sweep: SorSweep::SYMMETRIC,
        };
        let smoother = SorSmoother::build(op.matrix(), &args).unwrap();
        let mut coarse_policy = OneStepAmgPolicy::<f64, SorSmoother<f64>>::new(
            CoarseningCriterion::default(),
            SorArgs::default(),
        );
        let mut pc =
            TwoLevelPreconditioner::new(&op, smoother, transfer, &mut coarse_policy, 1, 1)
                .unwrap();

        let d = vec![1.0; 16];
        let mut x = vec![0.0; 16];
        let mut defect = vec![0.0; 16];
        let mut correction = vec![0.0; 16];
        // Stationary iteration x += M(d - A x).
        for _ in 0..100 {
            op.defect(&d, &x, &mut defect);
            correction.fill(0.0);
            pc.apply(&mut correction, &defect).unwrap();
            for (xi, ci) in x.iter_mut().zip(&correction) {
                *xi += *ci;
            }
        }
        assert!(op.defect_norm(&d, &x) < 1e-6);
    }

    #[test]
    fn rejects_non_square_operators() {
        let op = MatrixOperator::new(
            CsrMatrix::from_triplets(2, 3, &[(0, 0, 1.0), (1, 1, 1.0)]).unwrap(),
        );
        let transfer = AggregationTransferPolicy::new(CoarseningCriterion::default()).unwrap();
        let smoother =
            DampedJacobi::build(&CsrMatrix::identity(2), &JacobiArgs::default()).unwrap();
        let mut coarse_policy = OneStepAmgPolicy::<f64, DampedJacobi<f64>>::new(
            CoarseningCriterion::default(),
            JacobiArgs::default(),
        );
        let r = TwoLevelPreconditioner::new(&op, smoother, transfer, &mut coarse_policy, 1, 1);
        assert!(matches!(r, Err(AmgError::DimensionMismatch(_))));
    }
}
