//! Matrix module: CSR storage and the assembled operator.

pub mod sparse;
pub use sparse::CsrMatrix;
pub mod operator;
pub use operator::MatrixOperator;
