pub mod aggregates;
pub mod galerkin;
pub mod graph;

pub use aggregates::{
    build_aggregates, AggregatesMap, AggregationCounts, ISOLATED, SKIPPED, UNAGGREGATED,
};
pub use galerkin::GalerkinProduct;
pub use graph::MatrixGraph;
