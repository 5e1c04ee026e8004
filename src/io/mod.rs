//! Input/output helpers.
//!
//! - metrics table CSV write/read (`export`)

pub mod export;

pub use export::*;
