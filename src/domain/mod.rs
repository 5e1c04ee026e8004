//! Domain types used throughout the pipeline.
//!
//! This module defines:
//!
//! - tree observations (`Observation`) and sample stats
//! - the model catalogue (`ModelKind`)
//! - configuration (`FitConfig`, `SolverOptions`)
//! - the exported metrics row (`MetricRecord`)

pub mod types;

pub use types::*;
