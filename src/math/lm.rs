//! Nonlinear least squares on top of the `levenberg_marquardt` crate.
//!
//! Minimises `SSE(θ) = Σ (y_i − f_i(θ))²` for a model `f` that maps a parameter
//! vector to one prediction per observation. The crate (a port of MINPACK's
//! `lmder`) drives the damped, diagonally scaled steps; this module owns what
//! it does not provide:
//!
//! - a central-difference Jacobian
//! - a rank check on the column-scaled Jacobian ("singular gradient"), both at
//!   the start and at the solution
//! - the relative-offset convergence criterion that decides acceptance
//!
//! The relative offset compares the residual's projection onto the tangent
//! plane of the expectation surface with the residual orthogonal to it:
//!
//! ```text
//! c = sqrt(‖Qᵀr‖² / p) / sqrt((SSE − ‖Qᵀr‖²) / (n − p))
//! ```
//!
//! It is scale-free, so one tolerance works for every model.

use levenberg_marquardt::{LeastSquaresProblem, LevenbergMarquardt, TerminationReason};
use nalgebra::{DMatrix, DVector, Dyn, Owned};
use thiserror::Error;

use crate::domain::SolverOptions;
use crate::math::central_jacobian;

/// `ftol`/`xtol` handed to the crate. Tight enough that its own stopping rule
/// never fires before the relative offset is below any sensible tolerance.
const REDUCTION_TOL: f64 = 1e-14;

/// SSE below this fraction of `Σy²` is treated as an exact fit, where the
/// relative offset degenerates to a ratio of rounding errors.
const EXACT_FIT_RATIO: f64 = 1e-20;

/// Minimum ratio of smallest to largest singular value of the column-scaled Jacobian.
const RANK_TOL: f64 = 1e-10;

/// Why a fit did not produce a usable estimate.
///
/// `evaluations` counts residual evaluations made by the solver; `0` means
/// the problem was rejected at the starting values.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum LmError {
    #[error("underdetermined: n={n} observations for {p} parameters")]
    Underdetermined { n: usize, p: usize },
    #[error("model is not finite at the starting parameters")]
    NonFiniteStart,
    #[error("non-finite Jacobian after {evaluations} evaluations")]
    NonFiniteJacobian { evaluations: usize },
    #[error("singular gradient after {evaluations} evaluations")]
    SingularGradient { evaluations: usize },
    #[error("step factor reduced below minimum after {evaluations} evaluations (convergence {convergence:.3e})")]
    StepFactorTooSmall { evaluations: usize, convergence: f64 },
    #[error("iterations exceeded maximum of {max_iterations} (convergence {convergence:.3e})")]
    MaxIterations {
        max_iterations: usize,
        convergence: f64,
    },
    #[error("solver stopped after {evaluations} evaluations: {reason}")]
    Breakdown { evaluations: usize, reason: String },
}

/// A converged solution and the quantities needed for inference.
#[derive(Debug, Clone)]
pub struct LmSolution {
    pub params: DVector<f64>,
    /// Fitted values `f(θ̂)`.
    pub fitted: DVector<f64>,
    /// `y − f(θ̂)`.
    pub residuals: DVector<f64>,
    /// Jacobian of `f` at `θ̂`.
    pub jacobian: DMatrix<f64>,
    pub sse: f64,
    /// Residual evaluations made by the solver.
    pub evaluations: usize,
    /// Achieved relative offset.
    pub convergence: f64,
}

/// The crate's view of a curve fit: residuals `f(θ) − y` and their Jacobian.
#[derive(Clone)]
struct CurveProblem<'a> {
    model: &'a dyn Fn(&DVector<f64>) -> DVector<f64>,
    observed: &'a DVector<f64>,
    params: DVector<f64>,
}

impl LeastSquaresProblem<f64, Dyn, Dyn> for CurveProblem<'_> {
    type ResidualStorage = Owned<f64, Dyn>;
    type JacobianStorage = Owned<f64, Dyn, Dyn>;
    type ParameterStorage = Owned<f64, Dyn>;

    fn set_params(&mut self, params: &DVector<f64>) {
        self.params.copy_from(params);
    }

    fn params(&self) -> DVector<f64> {
        self.params.clone()
    }

    fn residuals(&self) -> Option<DVector<f64>> {
        let predicted = (self.model)(&self.params);
        all_finite(predicted.iter()).then(|| predicted - self.observed)
    }

    fn jacobian(&self) -> Option<DMatrix<f64>> {
        let jacobian = central_jacobian(&self.model, &self.params, self.observed.len());
        all_finite(jacobian.iter()).then_some(jacobian)
    }
}

/// Fit `f` to `y` starting from `start`.
///
/// `opts.max_iterations` becomes the solver's patience: at most
/// `max_iterations · (p + 1)` residual evaluations.
pub fn levenberg_marquardt<F>(
    f: F,
    y: &DVector<f64>,
    start: &[f64],
    opts: &SolverOptions,
) -> Result<LmSolution, LmError>
where
    F: Fn(&DVector<f64>) -> DVector<f64>,
{
    let n = y.len();
    let p = start.len();
    if p == 0 || n <= p {
        return Err(LmError::Underdetermined { n, p });
    }

    let start = DVector::from_column_slice(start);
    if !all_finite(f(&start).iter()) {
        return Err(LmError::NonFiniteStart);
    }

    let initial = assess(&f, y, start, 0)?;
    if initial.convergence < opts.tolerance {
        return Ok(initial);
    }
    if opts.max_iterations == 0 {
        return Err(LmError::MaxIterations {
            max_iterations: 0,
            convergence: initial.convergence,
        });
    }

    let problem = CurveProblem {
        model: &f,
        observed: y,
        params: initial.params,
    };
    let (problem, report) = LevenbergMarquardt::new()
        .with_ftol(REDUCTION_TOL)
        .with_xtol(REDUCTION_TOL)
        .with_gtol(0.0)
        .with_patience(opts.max_iterations)
        .minimize(problem);

    let evaluations = report.number_of_evaluations;
    log::debug!(
        "solver stopped: {:?} after {evaluations} evaluations (objective {:.6e})",
        report.termination,
        report.objective_function
    );

    match report.termination {
        TerminationReason::LostPatience => {
            let convergence = assess(&f, y, problem.params, evaluations)
                .map(|s| s.convergence)
                .unwrap_or(f64::NAN);
            return Err(LmError::MaxIterations {
                max_iterations: opts.max_iterations,
                convergence,
            });
        }
        // Stopping because no further reduction is representable is fine;
        // the relative offset below decides.
        reason if reason.was_successful() || matches!(reason, TerminationReason::NoImprovementPossible(_)) => {}
        reason => {
            return Err(LmError::Breakdown {
                evaluations,
                reason: format!("{reason:?}"),
            });
        }
    }

    let solution = assess(&f, y, problem.params, evaluations)?;
    if solution.convergence < opts.tolerance {
        Ok(solution)
    } else {
        Err(LmError::StepFactorTooSmall {
            evaluations,
            convergence: solution.convergence,
        })
    }
}

/// Everything needed to judge `theta`: fitted values, Jacobian rank and the
/// relative offset.
fn assess<F>(f: &F, y: &DVector<f64>, theta: DVector<f64>, evaluations: usize) -> Result<LmSolution, LmError>
where
    F: Fn(&DVector<f64>) -> DVector<f64>,
{
    let fitted = f(&theta);
    if !all_finite(fitted.iter()) {
        return Err(LmError::Breakdown {
            evaluations,
            reason: "non-finite predictions".to_string(),
        });
    }
    let residuals = y - &fitted;
    let sse = residuals.norm_squared();

    let jacobian = central_jacobian(f, &theta, y.len());
    if !all_finite(jacobian.iter()) {
        return Err(LmError::NonFiniteJacobian { evaluations });
    }
    if !is_full_rank(&jacobian) {
        return Err(LmError::SingularGradient { evaluations });
    }

    let convergence = if sse <= EXACT_FIT_RATIO * y.norm_squared() {
        0.0
    } else {
        relative_offset(&jacobian, &residuals, sse)
    };

    Ok(LmSolution {
        params: theta,
        fitted,
        residuals,
        jacobian,
        sse,
        evaluations,
        convergence,
    })
}

fn all_finite<'a>(mut values: impl Iterator<Item = &'a f64>) -> bool {
    values.all(|v| v.is_finite())
}

/// Rank check on the column-scaled Jacobian, so parameter units do not matter.
fn is_full_rank(jacobian: &DMatrix<f64>) -> bool {
    let mut scaled = jacobian.clone();
    for mut column in scaled.column_iter_mut() {
        let norm = column.norm();
        if !norm.is_finite() || norm <= 0.0 {
            return false;
        }
        column.unscale_mut(norm);
    }

    let singular = scaled.svd(false, false).singular_values;
    let max = singular.max();
    let min = singular.min();
    max > 0.0 && min / max > RANK_TOL
}

fn relative_offset(jacobian: &DMatrix<f64>, residuals: &DVector<f64>, sse: f64) -> f64 {
    let (n, p) = jacobian.shape();
    let q = jacobian.clone().qr().q();
    let projected = (q.transpose() * residuals).norm_squared();
    let orthogonal = sse - projected;

    if orthogonal <= 0.0 {
        return 0.0;
    }

    ((projected / p as f64) / (orthogonal / (n - p) as f64)).sqrt()
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn exp_decay(x: &[f64]) -> impl Fn(&DVector<f64>) -> DVector<f64> + '_ {
        move |t: &DVector<f64>| DVector::from_iterator(x.len(), x.iter().map(|&xi| t[0] * (-t[1] * xi).exp()))
    }

    #[test]
    fn recovers_parameters_from_exact_data() {
        let x: Vec<f64> = (0..20).map(|i| i as f64 * 0.5).collect();
        let y = DVector::from_iterator(x.len(), x.iter().map(|&xi| 5.0 * (-0.4 * xi).exp()));

        let sol = levenberg_marquardt(exp_decay(&x), &y, &[3.0, 0.2], &SolverOptions::default())
            .expect("exact data should converge");

        assert_relative_eq!(sol.params[0], 5.0, max_relative = 1e-6);
        assert_relative_eq!(sol.params[1], 0.4, max_relative = 1e-6);
        assert!(sol.sse < 1e-12);
        assert!(sol.evaluations > 0);
    }

    #[test]
    fn recovers_parameters_from_noisy_data() {
        let x: Vec<f64> = (0..30).map(|i| i as f64 * 0.3).collect();
        // Deterministic alternating perturbation.
        let y = DVector::from_iterator(
            x.len(),
            x.iter()
                .enumerate()
                .map(|(i, &xi)| 5.0 * (-0.4 * xi).exp() + if i % 2 == 0 { 0.01 } else { -0.01 }),
        );

        let sol = levenberg_marquardt(exp_decay(&x), &y, &[3.0, 0.2], &SolverOptions::default())
            .expect("noisy data should converge");

        assert!((sol.params[0] - 5.0).abs() < 0.05);
        assert!((sol.params[1] - 0.4).abs() < 0.01);
        assert!(sol.convergence < 1e-5);
        assert_relative_eq!(sol.residuals.norm_squared(), sol.sse, max_relative = 1e-12);
    }

    #[test]
    fn zero_start_is_a_singular_gradient() {
        // a = b = 0 makes a·(1 − e^(−b·x)) flat in both parameters.
        let x: Vec<f64> = (1..=10).map(f64::from).collect();
        let y = DVector::from_iterator(x.len(), x.iter().map(|&xi| 10.0 * (1.0 - (-0.2 * xi).exp())));
        let f = |t: &DVector<f64>| {
            DVector::from_iterator(x.len(), x.iter().map(|&xi| t[0] * (1.0 - (-t[1] * xi).exp())))
        };

        let err = levenberg_marquardt(f, &y, &[0.0, 0.0], &SolverOptions::default()).unwrap_err();
        assert_eq!(err, LmError::SingularGradient { evaluations: 0 });
    }

    #[test]
    fn non_finite_start_is_rejected() {
        let x = [1.0, 2.0, 3.0];
        let y = DVector::from_row_slice(&[1.0, 2.0, 3.0]);
        let f = |t: &DVector<f64>| DVector::from_iterator(3, x.iter().map(|&xi| t[0] / (xi - t[1])));

        let err = levenberg_marquardt(f, &y, &[1.0, 2.0], &SolverOptions::default()).unwrap_err();
        assert_eq!(err, LmError::NonFiniteStart);
    }

    #[test]
    fn too_few_observations_is_underdetermined() {
        let x = [1.0, 2.0];
        let y = DVector::from_row_slice(&[1.0, 2.0]);
        let err = levenberg_marquardt(exp_decay(&x), &y, &[1.0, 0.1], &SolverOptions::default()).unwrap_err();
        assert_eq!(err, LmError::Underdetermined { n: 2, p: 2 });
    }

    #[test]
    fn exhausted_budget_reports_max_iterations() {
        let x: Vec<f64> = (0..20).map(|i| i as f64 * 0.5).collect();
        let y = DVector::from_iterator(x.len(), x.iter().map(|&xi| 5.0 * (-0.4 * xi).exp()));
        let opts = SolverOptions {
            max_iterations: 0,
            tolerance: 1e-5,
        };

        let err = levenberg_marquardt(exp_decay(&x), &y, &[3.0, 0.2], &opts).unwrap_err();
        assert!(matches!(err, LmError::MaxIterations { max_iterations: 0, .. }));
    }

    #[test]
    fn start_at_the_optimum_needs_no_solver_run() {
        let x: Vec<f64> = (0..20).map(|i| i as f64 * 0.5).collect();
        let y = DVector::from_iterator(x.len(), x.iter().map(|&xi| 5.0 * (-0.4 * xi).exp()));
        let opts = SolverOptions {
            max_iterations: 0,
            tolerance: 1e-5,
        };

        let sol = levenberg_marquardt(exp_decay(&x), &y, &[5.0, 0.4], &opts).expect("exact start");
        assert_eq!(sol.evaluations, 0);
        assert_eq!(sol.convergence, 0.0);
    }

    #[test]
    fn rank_check_rejects_duplicate_columns() {
        let full = DMatrix::from_row_slice(3, 2, &[1.0, 0.0, 0.0, 1.0, 1.0, 1.0]);
        assert!(is_full_rank(&full));

        let collinear = DMatrix::from_row_slice(3, 2, &[1.0, 2.0, 2.0, 4.0, 3.0, 6.0]);
        assert!(!is_full_rank(&collinear));

        let zero_column = DMatrix::from_row_slice(2, 2, &[1.0, 0.0, 2.0, 0.0]);
        assert!(!is_full_rank(&zero_column));
    }
}
