use criterion::{black_box, criterion_group, criterion_main, Criterion};
use twogrid::config::CoarseningCriterion;
use twogrid::matrix::{CsrMatrix, MatrixOperator};
use twogrid::preconditioner::{Preconditioner, TwoLevelPreconditioner};
use twogrid::smoother::{Smoother, SorArgs, SorSmoother};
use twogrid::solver::OneStepAmgPolicy;
use twogrid::transfer::AggregationTransferPolicy;

fn laplacian_1d(n: usize) -> CsrMatrix<f64> {
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

fn bench_two_level_apply(c: &mut Criterion) {
    let n = 4096;
    let op = MatrixOperator::new(laplacian_1d(n));
    let coarsening = CoarseningCriterion::default();
    let transfer = AggregationTransferPolicy::new(coarsening).unwrap();
    let smoother = SorSmoother::build(op.matrix(), &SorArgs::default()).unwrap();
    let mut coarse_policy = OneStepAmgPolicy::<f64, SorSmoother<f64>>::new(
        CoarseningCriterion::default(),
        SorArgs::default(),
    );
    let mut pc =
        TwoLevelPreconditioner::new(&op, smoother, transfer, &mut coarse_policy, 1, 1).unwrap();

    let d: Vec<f64> = (0..n).map(|i| (i as f64).sin()).collect();
    let mut v = vec![0.0; n];

    c.bench_function("two-level apply", |ben| {
        ben.iter(|| {
            v.fill(0.0);
            pc.apply(black_box(&mut v), black_box(&d)).unwrap();
        })
    });

    c.bench_function("smoothing sweep", |ben| {
        let sweep = SorSmoother::build(op.matrix(), &SorArgs::default()).unwrap();
        let mut lhs = vec![0.0; n];
        ben.iter(|| {
            sweep.apply(black_box(op.matrix()), black_box(&mut lhs), black_box(&d));
        })
    });
}

criterion_group!(benches, bench_two_level_apply);
criterion_main!(benches);
