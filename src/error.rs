use thiserror::Error;

// Unified error type for twogrid

#[derive(Error, Debug)]
pub enum AmgError {
    #[error("invalid coarsening criterion: {0}")]
    InvalidCriterion(String),
    #[error("invalid matrix structure: {0}")]
    InvalidMatrix(String),
    #[error("dimension mismatch: {0}")]
    DimensionMismatch(String),
    #[error("aggregation produced no aggregates")]
    NoAggregates,
    #[error("coarse level system has not been built")]
    CoarseSystemMissing,
    #[error("zero pivot at row {0}")]
    ZeroPivot(usize),
    #[error("indefinite matrix detected (p^T A p <= 0)")]
    IndefiniteMatrix,
    #[error("indefinite preconditioner detected (beta < 0)")]
    IndefinitePreconditioner,
}
