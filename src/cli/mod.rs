//! Command-line parsing for the height–diameter model comparison.
//!
//! The goal of this module is to keep **argument parsing** separate from the
//! modeling/math code. Every flag has a default, so a bare `hd` reproduces the
//! fixed seeded run.

use std::path::PathBuf;

use clap::Parser;

use crate::domain::ModelKind;

/// Top-level CLI.
#[derive(Debug, Parser, Clone)]
#[command(
    name = "hd",
    version,
    about = "Fit and compare nonlinear height-diameter models on a synthetic tree sample"
)]
pub struct Cli {
    /// Number of synthetic trees to generate.
    #[arg(short = 'n', long, default_value_t = 100)]
    pub sample_count: usize,

    /// Random seed for sample generation.
    #[arg(long, default_value_t = 123)]
    pub seed: u64,

    /// Standard deviation (cm) of the noise added to diameter before it is rescaled to height.
    #[arg(long, default_value_t = 4.0)]
    pub noise_sd: f64,

    /// Models to fit (comma-separated). Defaults to all ten.
    #[arg(long = "model", value_enum, value_delimiter = ',')]
    pub models: Vec<ModelKind>,

    /// Solver patience per model: at most N·(p + 1) residual evaluations.
    #[arg(long, default_value_t = 200)]
    pub max_iterations: usize,

    /// Relative-offset convergence tolerance.
    #[arg(long, default_value_t = 1e-5)]
    pub tolerance: f64,

    /// Metrics CSV output path (overwritten).
    #[arg(short = 'o', long, default_value = "hd_model_metrics.csv")]
    pub output: PathBuf,

    /// Skip per-model coefficient summaries.
    #[arg(short, long)]
    pub quiet: bool,
}
