//! Model evaluation for the ten height–diameter equations.
//!
//! The fitter relies on two primitive operations:
//! - predict `h(d)` given the parameter vector (for residuals/Jacobians/metrics)
//! - the hand-tuned starting vector for each equation
//!
//! Every equation is `h = 1.3 + g(d; θ)` so predicted height equals breast
//! height at zero diameter.

use crate::domain::{BREAST_HEIGHT, ModelKind};

/// Predict height for the given model kind.
///
/// Returns a non-finite value when the parameters put the equation outside
/// its domain (e.g. a negative base under a fractional power); callers treat
/// that as a rejected evaluation.
///
/// # Panics
/// Panics if `params` is shorter than `model.param_count()`.
pub fn predict(model: ModelKind, d: f64, params: &[f64]) -> f64 {
    let g = match model {
        ModelKind::Meyer => {
            let (a, b) = (params[0], params[1]);
            a * -(-b * d).exp_m1()
        }
        ModelKind::Power => {
            let (a, b) = (params[0], params[1]);
            a * d.powf(b)
        }
        ModelKind::Logistic => {
            let (a, b, c) = (params[0], params[1], params[2]);
            a / (1.0 + b * (-c * d).exp())
        }
        ModelKind::Gompertz => {
            let (a, b, c) = (params[0], params[1], params[2]);
            a * (-b * (-c * d).exp()).exp()
        }
        ModelKind::Curtis => {
            let (a, b) = (params[0], params[1]);
            a * (d / (1.0 + d)).powf(b)
        }
        ModelKind::Schumacher => {
            let (a, b) = (params[0], params[1]);
            a * (-b / d).exp()
        }
        ModelKind::Naslund => {
            let (a, b) = (params[0], params[1]);
            let denom = a + b * d;
            d * d / (denom * denom)
        }
        ModelKind::MichaelisMenten => {
            let (a, b) = (params[0], params[1]);
            a * d / (b + d)
        }
        ModelKind::Wykoff => {
            let (a, b) = (params[0], params[1]);
            (a + b / (d + 1.0)).exp()
        }
        ModelKind::Ratkowsky => {
            let (a, b, c) = (params[0], params[1], params[2]);
            a * (-b / (d + c)).exp()
        }
    };
    BREAST_HEIGHT + g
}

/// Hand-tuned starting parameters for each equation.
///
/// These are tuned to the default seeded sample (diameters 10–60 cm, heights
/// 10–25 m); poor starts risk non-convergence.
pub fn initial_params(model: ModelKind) -> &'static [f64] {
    match model {
        ModelKind::Meyer => &[40.0, 0.02],
        ModelKind::Power => &[1.5, 0.7],
        ModelKind::Logistic => &[30.0, 3.0, 0.04],
        ModelKind::Gompertz => &[30.0, 1.5, 0.03],
        ModelKind::Curtis => &[25.0, 10.0],
        ModelKind::Schumacher => &[30.0, 15.0],
        ModelKind::Naslund => &[1.6, 0.18],
        ModelKind::MichaelisMenten => &[45.0, 50.0],
        ModelKind::Wykoff => &[3.4, -13.0],
        ModelKind::Ratkowsky => &[30.0, 20.0, 5.0],
    }
}

/// Equation text for summaries.
pub fn formula(model: ModelKind) -> &'static str {
    match model {
        ModelKind::Meyer => "h = 1.3 + a * (1 - exp(-b * d))",
        ModelKind::Power => "h = 1.3 + a * d^b",
        ModelKind::Logistic => "h = 1.3 + a / (1 + b * exp(-c * d))",
        ModelKind::Gompertz => "h = 1.3 + a * exp(-b * exp(-c * d))",
        ModelKind::Curtis => "h = 1.3 + a * (d / (1 + d))^b",
        ModelKind::Schumacher => "h = 1.3 + a * exp(-b / d)",
        ModelKind::Naslund => "h = 1.3 + d^2 / (a + b * d)^2",
        ModelKind::MichaelisMenten => "h = 1.3 + a * d / (b + d)",
        ModelKind::Wykoff => "h = 1.3 + exp(a + b / (d + 1))",
        ModelKind::Ratkowsky => "h = 1.3 + a * exp(-b / (d + c))",
    }
}
