//! Goodness-of-fit metrics for converged models.
//!
//! For a fit with `n` observations, `p` parameters and residual sum of squares
//! `SSE`:
//!
//! - `AIC = n (ln 2π + 1 − ln n + ln SSE) + 2 (p + 1)`, the Gaussian
//!   log-likelihood with σ counted as a parameter
//! - `RMSE = sqrt(mean((observed − predicted)²))`
//! - `mean bias = mean(predicted − observed)`
//! - `MAE = mean(|predicted − observed|)`

use std::f64::consts::PI;

use crate::domain::{MetricRecord, ModelKind, Observation};
use crate::fit::{FitOutcome, FittedModel, ModelSlots};

/// Akaike Information Criterion for a least-squares fit.
pub fn aic(n: usize, sse: f64, param_count: usize) -> f64 {
    let n = n as f64;
    let log_lik = -0.5 * n * ((2.0 * PI).ln() + 1.0 - n.ln() + sse.ln());
    -2.0 * log_lik + 2.0 * (param_count as f64 + 1.0)
}

/// Compute the metrics row for one fitted model against `observations`.
pub fn evaluate(fit: &FittedModel, observations: &[Observation]) -> MetricRecord {
    let n = observations.len() as f64;
    let mut sse = 0.0;
    let mut bias_sum = 0.0;
    let mut abs_sum = 0.0;

    for o in observations {
        let err = fit.predict(o.diameter) - o.height;
        sse += err * err;
        bias_sum += err;
        abs_sum += err.abs();
    }

    MetricRecord {
        model: fit.kind.slot_name().to_string(),
        aic: aic(observations.len(), sse, fit.param_count()),
        rmse: (sse / n).sqrt(),
        mean_bias: bias_sum / n,
        mae: abs_sum / n,
    }
}

/// Build the metrics table in slot order (`model1..model10`).
///
/// Absent and failed slots are skipped with a warning.
pub fn collect_metrics(slots: &ModelSlots, observations: &[Observation]) -> Vec<MetricRecord> {
    ModelKind::ALL.iter().fold(Vec::new(), |mut table, kind| {
        match slots.get(kind) {
            None => log::warn!("{} was not fitted; skipping.", kind.slot_name()),
            Some(FitOutcome::Failed(failure)) => {
                log::warn!("{} did not converge; skipping. ({})", kind.slot_name(), failure.reason)
            }
            Some(FitOutcome::Converged(fit)) => table.push(evaluate(fit, observations)),
        }
        table
    })
}

/// The record with the lowest AIC, if any.
pub fn best_by_aic(records: &[MetricRecord]) -> Option<&MetricRecord> {
    records
        .iter()
        .filter(|r| r.aic.is_finite())
        .min_by(|a, b| a.aic.total_cmp(&b.aic))
}
