//! Shared "fit pipeline" logic.
//!
//! Keeping this in one place keeps the core workflow testable without
//! spawning processes:
//! sample generation -> fit each model -> metrics table
//!
//! Presentation (printing) and export stay in `app`.

use crate::data::{SampleData, generate_sample};
use crate::domain::{FitConfig, MetricRecord};
use crate::error::AppError;
use crate::fit::{ModelSlots, fit_all};
use crate::report::collect_metrics;

/// All computed outputs of a single `hd` run.
#[derive(Debug, Clone)]
pub struct RunOutput {
    pub sample: SampleData,
    pub slots: ModelSlots,
    pub metrics: Vec<MetricRecord>,
}

/// Execute the full fitting pipeline and return the computed outputs.
pub fn run_fit(config: &FitConfig) -> Result<RunOutput, AppError> {
    // 1) Generate the synthetic sample.
    let sample = generate_sample(config)?;
    log::info!(
        "Generated {} observations (seed {})",
        sample.stats.n_points,
        config.sample_seed
    );

    // 2) Fit every requested model; failures stay in their slot.
    let slots = fit_all(&sample.observations, &config.models, &config.solver);

    // 3) Metrics for the converged models, in slot order. May be empty.
    let metrics = collect_metrics(&slots, &sample.observations);

    Ok(RunOutput {
        sample,
        slots,
        metrics,
    })
}
