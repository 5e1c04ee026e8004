//! Fitting routine for a single model kind.
//!
//! Given:
//! - observations `(d_i, h_i)`
//! - a model kind and its starting parameters
//!
//! we run the Levenberg–Marquardt driver in `math::lm` on `h_i ≈ f(d_i; θ)` and, on convergence,
//! derive the usual inference quantities:
//! - residual standard error `σ̂ = sqrt(SSE / (n − p))`
//! - covariance `σ̂² (JᵀJ)⁻¹`, standard errors, t values, two-sided p-values

use nalgebra::DVector;
use statrs::distribution::{ContinuousCDF, StudentsT};
use thiserror::Error;

use crate::domain::{ModelKind, Observation, SolverOptions};
use crate::math::{LmError, levenberg_marquardt};
use crate::models::predict;

/// One row of a coefficient table.
#[derive(Debug, Clone)]
pub struct ParamEstimate {
    pub name: &'static str,
    pub estimate: f64,
    pub std_error: f64,
    pub t_value: f64,
    pub p_value: f64,
}

/// A converged fit and its diagnostics.
#[derive(Debug, Clone)]
pub struct FittedModel {
    pub kind: ModelKind,
    pub params: Vec<f64>,
    pub estimates: Vec<ParamEstimate>,
    /// Fitted heights, in observation order.
    pub fitted: Vec<f64>,
    pub n: usize,
    pub sse: f64,
    /// Residual standard error.
    pub sigma: f64,
    /// Residual degrees of freedom (`n − p`).
    pub df: usize,
    /// Residual evaluations the solver needed.
    pub evaluations: usize,
    /// Achieved relative-offset convergence tolerance.
    pub convergence: f64,
}

impl FittedModel {
    /// Predicted height at diameter `d`.
    pub fn predict(&self, d: f64) -> f64 {
        predict(self.kind, d, &self.params)
    }

    pub fn param_count(&self) -> usize {
        self.params.len()
    }
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum FitError {
    #[error("expected {expected} starting values, got {got}")]
    StartLength { expected: usize, got: usize },
    #[error(transparent)]
    Solver(#[from] LmError),
    #[error("parameter covariance is singular")]
    SingularCovariance,
}

/// A model that did not converge.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("{} ({}) failed: {reason}", .kind.slot_name(), .kind.display_name())]
pub struct FitFailure {
    pub kind: ModelKind,
    pub reason: FitError,
}

/// Result of fitting one model slot.
#[derive(Debug, Clone)]
pub enum FitOutcome {
    Converged(FittedModel),
    Failed(FitFailure),
}

impl FitOutcome {
    pub fn kind(&self) -> ModelKind {
        match self {
            FitOutcome::Converged(fit) => fit.kind,
            FitOutcome::Failed(failure) => failure.kind,
        }
    }

    pub fn fitted(&self) -> Option<&FittedModel> {
        match self {
            FitOutcome::Converged(fit) => Some(fit),
            FitOutcome::Failed(_) => None,
        }
    }

    pub fn failure(&self) -> Option<&FitFailure> {
        match self {
            FitOutcome::Converged(_) => None,
            FitOutcome::Failed(failure) => Some(failure),
        }
    }
}

/// Fit a single model kind from the given starting parameters.
pub fn fit_model(
    kind: ModelKind,
    observations: &[Observation],
    start: &[f64],
    opts: &SolverOptions,
) -> FitOutcome {
    match try_fit(kind, observations, start, opts) {
        Ok(fit) => FitOutcome::Converged(fit),
        Err(reason) => FitOutcome::Failed(FitFailure { kind, reason }),
    }
}

fn try_fit(
    kind: ModelKind,
    observations: &[Observation],
    start: &[f64],
    opts: &SolverOptions,
) -> Result<FittedModel, FitError> {
    let p = kind.param_count();
    if start.len() != p {
        return Err(FitError::StartLength {
            expected: p,
            got: start.len(),
        });
    }

    let n = observations.len();
    let diameters: Vec<f64> = observations.iter().map(|o| o.diameter).collect();
    let heights = DVector::from_iterator(n, observations.iter().map(|o| o.height));

    let model = |theta: &DVector<f64>| {
        DVector::from_iterator(n, diameters.iter().map(|&d| predict(kind, d, theta.as_slice())))
    };
    let sol = levenberg_marquardt(model, &heights, start, opts)?;

    let df = n - p;
    let sigma = (sol.sse / df as f64).sqrt();

    let jtj = sol.jacobian.transpose() * &sol.jacobian;
    let unscaled_cov = jtj
        .cholesky()
        .map(|c| c.inverse())
        .ok_or(FitError::SingularCovariance)?;

    let t_dist = StudentsT::new(0.0, 1.0, df as f64).ok();
    let estimates = kind
        .param_names()
        .iter()
        .enumerate()
        .map(|(k, &name)| {
            let estimate = sol.params[k];
            let std_error = sigma * unscaled_cov[(k, k)].sqrt();
            let t_value = estimate / std_error;
            let p_value = t_dist
                .as_ref()
                .map(|t| 2.0 * (1.0 - t.cdf(t_value.abs())))
                .unwrap_or(f64::NAN);
            ParamEstimate {
                name,
                estimate,
                std_error,
                t_value,
                p_value,
            }
        })
        .collect();

    Ok(FittedModel {
        kind,
        params: sol.params.iter().copied().collect(),
        estimates,
        fitted: sol.fitted.iter().copied().collect(),
        n,
        sse: sol.sse,
        sigma,
        df,
        evaluations: sol.evaluations,
        convergence: sol.convergence,
    })
}
