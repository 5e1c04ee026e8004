//! Model fitting orchestration.
//!
//! Responsibilities:
//!
//! - fit each requested model independently from its hand-tuned start
//! - keep every outcome (converged or failed) in an ordered slot map

use std::collections::BTreeMap;

use crate::domain::{ModelKind, Observation, SolverOptions};
use crate::models::initial_params;

pub mod fitter;

pub use fitter::*;

/// Fit outcomes keyed by model, ordered `model1..model10`.
///
/// Models that were not requested have no slot.
pub type ModelSlots = BTreeMap<ModelKind, FitOutcome>;

/// Fit each requested model kind, sequentially.
pub fn fit_all(observations: &[Observation], kinds: &[ModelKind], opts: &SolverOptions) -> ModelSlots {
    kinds
        .iter()
        .map(|&kind| {
            log::info!("Fitting {} ({})", kind.slot_name(), kind.display_name());
            let outcome = fit_model(kind, observations, initial_params(kind), opts);
            match &outcome {
                FitOutcome::Converged(fit) => log::info!(
                    "{} converged after {} evaluations (tolerance {:.3e})",
                    kind.slot_name(),
                    fit.evaluations,
                    fit.convergence
                ),
                FitOutcome::Failed(failure) => log::warn!("{failure}"),
            }
            (kind, outcome)
        })
        .collect()
}
