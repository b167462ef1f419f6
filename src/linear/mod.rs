//! Explicit linear operators for source and potential reconstruction.
//!
//! The image pipeline never builds these; they turn parts of it into matrices for linear
//! solvers driven from outside.

mod bilinear;
pub use bilinear::{build_bilinear_interpolation, BilinearInterpolation};

mod convolution_matrix;
pub use convolution_matrix::ConvolutionMatrix;

mod dsd;
pub use dsd::{build_dsd_operator, DsdOperator};

mod finite_diff;
pub use finite_diff::derivative_operator;

mod sparse;
pub use sparse::SparseMatrix;
