//! `hd-curves` library crate.
//!
//! The binary (`hd`) is a thin wrapper around this library so that:
//!
//! - core logic is testable without spawning processes
//! - the fitting and metrics code can be reused on real measurements later

pub mod app;
pub mod cli;
pub mod data;
pub mod domain;
pub mod error;
pub mod fit;
pub mod io;
pub mod math;
pub mod models;
pub mod report;
