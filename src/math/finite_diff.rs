//! Central-difference Jacobians.
//!
//! The equations are cheap to evaluate and only have 2–3 parameters, so we
//! differentiate numerically instead of carrying analytic derivatives for
//! every model.

use nalgebra::{DMatrix, DVector};

/// Jacobian of `f` at `theta`, one row per output and one column per parameter.
///
/// Step size per parameter is `ε^(1/3) · max(|θ_j|, 1)`, the usual choice for
/// central differences. Non-finite evaluations propagate into the matrix;
/// callers check the result.
pub fn central_jacobian<F>(f: &F, theta: &DVector<f64>, rows: usize) -> DMatrix<f64>
where
    F: Fn(&DVector<f64>) -> DVector<f64>,
{
    let p = theta.len();
    let step_scale = f64::EPSILON.cbrt();
    let mut jac = DMatrix::zeros(rows, p);

    for j in 0..p {
        let h = step_scale * theta[j].abs().max(1.0);

        let mut plus = theta.clone();
        plus[j] += h;
        let mut minus = theta.clone();
        minus[j] -= h;

        let column = (f(&plus) - f(&minus)) / (2.0 * h);
        jac.set_column(j, &column);
    }

    jac
}
