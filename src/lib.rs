//! twogrid: aggregation-based two-level multigrid preconditioning
//!
//! This crate coarsens sparse systems by matrix aggregation, assembles the
//! Galerkin coarse operator and combines smoothing sweeps with a coarse-grid
//! correction into preconditioners for Krylov solvers, with optional
//! shared-memory parallelism.

pub mod parallel;

pub mod aggregation;
pub mod config;
pub mod core;
pub mod error;
pub mod matrix;
pub mod preconditioner;
pub mod smoother;
pub mod solver;
pub mod transfer;
pub mod utils;

// Re-exports for convenience
pub use aggregation::*;
pub use config::*;
pub use crate::core::*;
pub use error::*;
pub use matrix::*;
pub use preconditioner::*;
pub use smoother::*;
pub use solver::*;
pub use transfer::*;
pub use utils::*;

// Re-export SolveReport at the crate root for convenience
pub use utils::convergence::SolveReport;
