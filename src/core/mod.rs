//! Core traits and vector wrappers.

pub mod traits;
pub mod wrappers;

pub use traits::{Indexing, InnerProduct, MatVec};
