//! Top-level application orchestration.
//!
//! `src/main.rs` is intentionally tiny; this module is the "real main" that:
//! - parses CLI arguments
//! - initialises logging
//! - runs sample generation, fitting and metrics
//! - prints reports
//! - writes the metrics CSV

use clap::Parser;

use crate::cli::Cli;
use crate::domain::{FitConfig, ModelKind, SolverOptions};
use crate::error::AppError;

pub mod pipeline;

/// Entry point for the `hd` binary.
pub fn run() -> Result<(), AppError> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    let config = fit_config_from_args(&cli);
    let run = pipeline::run_fit(&config)?;

    println!("{}", crate::report::format_run_header(&run.sample.stats, &config));

    if config.summaries {
        for fit in run.slots.values().filter_map(|o| o.fitted()) {
            println!("{}", crate::report::format_model_summary(fit));
        }
    }

    println!("Model comparison:");
    println!(
        "{}",
        crate::report::format_comparison_table(&run.slots, &run.metrics)
    );

    let failures = crate::report::format_failures(&run.slots);
    if !failures.is_empty() {
        println!("Failed models:\n{failures}");
    }

    println!("Goodness of fit:");
    println!("{}", crate::report::format_metrics_table(&run.metrics));

    export_metrics(&config, &run)
}

/// Write the metrics CSV (header only when nothing converged), then fail with
/// exit code 3 if there were no rows to write.
pub fn export_metrics(config: &FitConfig, run: &pipeline::RunOutput) -> Result<(), AppError> {
    crate::io::write_metrics_csv(&config.output, &run.metrics)?;
    log::info!(
        "Wrote {} rows to {}",
        run.metrics.len(),
        config.output.display()
    );

    if run.metrics.is_empty() {
        return Err(AppError::new(3, "No model converged; nothing to report."));
    }
    Ok(())
}

pub fn fit_config_from_args(cli: &Cli) -> FitConfig {
    let mut models = if cli.models.is_empty() {
        ModelKind::ALL.to_vec()
    } else {
        cli.models.clone()
    };
    models.sort();
    models.dedup();

    FitConfig {
        sample_count: cli.sample_count,
        sample_seed: cli.seed,
        noise_sd: cli.noise_sd,
        models,
        solver: SolverOptions {
            max_iterations: cli.max_iterations,
            tolerance: cli.tolerance,
        },
        output: cli.output.clone(),
        summaries: !cli.quiet,
        ..FitConfig::default()
    }
}
