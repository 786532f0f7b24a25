//! Configuration types for coarsening and the multilevel hierarchy.

pub mod criterion;
pub use criterion::CoarseningCriterion;
