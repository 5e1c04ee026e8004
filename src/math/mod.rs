//! Mathematical utilities: finite differences and the nonlinear least-squares
//! driver built on the `levenberg_marquardt` crate.

pub mod finite_diff;
pub mod lm;

pub use finite_diff::*;
pub use lm::*;
