use twogrid::config::CoarseningCriterion;
use twogrid::matrix::{CsrMatrix, MatrixOperator};
use twogrid::preconditioner::TwoLevelPreconditioner;
use twogrid::smoother::{Smoother, SorArgs, SorSmoother, SorSweep};
use twogrid::solver::{LinearSolver, OneStepAmgPolicy, PcgSolver};
use twogrid::transfer::AggregationTransferPolicy;

fn main() {
    // 1-D Poisson problem on n unknowns.
    let n = 1024;
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
    let op = MatrixOperator::new(CsrMatrix::from_triplets(n, n, &entries).unwrap());
    let b: Vec<f64> = (0..n).map(|i| (i as f64 / n as f64).sin()).collect();

    // Symmetric sweeps keep the preconditioner symmetric for CG.
    let args = SorArgs {
        relaxation: 1.0,
        sweep: SorSweep::SYMMETRIC,
    };
    let transfer = AggregationTransferPolicy::new(CoarseningCriterion::default()).unwrap();
    let smoother = SorSmoother::build(op.matrix(), &args).unwrap();
    let mut coarse_policy =
        OneStepAmgPolicy::<f64, SorSmoother<f64>>::new(CoarseningCriterion::default(), args);
    let mut pc =
        TwoLevelPreconditioner::new(&op, smoother, transfer, &mut coarse_policy, 1, 1).unwrap();

    let mut solver = PcgSolver::new(1e-10, 200);
    let mut x = vec![0.0; n];
    let report = solver.solve(&op, Some(&mut pc), &b, &mut x).unwrap();
    println!(
        "two-level PCG: {} iterations, residual {:.3e} -> {:.3e}",
        report.iterations, report.initial_residual, report.final_residual
    );

    let mut solver = PcgSolver::new(1e-10, 10_000);
    let mut y = vec![0.0; n];
    let plain = solver.solve(&op, None, &b, &mut y).unwrap();
    println!(
        "plain CG:      {} iterations, residual {:.3e} -> {:.3e}",
        plain.iterations, plain.initial_residual, plain.final_residual
    );
}
