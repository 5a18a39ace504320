//! Elastic-net penalty.
//!
//! The penalty on a single coordinate is the convex combination
//! `α·λ·|x| + (1 − α)·λ·x²` of the [lasso](super::lasso) and
//! [ridge](super::ridge) penalties. It is handled as that additive
//! composition everywhere: the ridge component is smooth and enters the
//! gradient, the lasso component is non-smooth and enters the proximal
//! operator, and the coordinate subproblem absorbs both in closed form.
//!
//! # References
//!
//! \[1\] [Regularization and variable selection via the elastic
//! net](https://doi.org/10.1111/j.1467-9868.2005.00503.x)

use nalgebra::{convert, RealField};

use super::{lasso, ridge};

/// Penalty value `α·λ·|x| + (1 − α)·λ·x²` for a single coordinate.
pub fn value<T: RealField + Copy>(x: T, lambda: T, alpha: T) -> T {
    let one = T::one();
    lasso::value(x, alpha * lambda) + ridge::value(x, (one - alpha) * lambda)
}

/// Gradient of the smooth (ridge) component.
pub fn smooth_gradient<T: RealField + Copy>(x: T, lambda: T, alpha: T) -> T {
    let one = T::one();
    ridge::gradient(x, (one - alpha) * lambda)
}

/// Proximal operator of the non-smooth (lasso) component.
pub fn prox<T: RealField + Copy>(u: T, step: T, lambda: T, alpha: T) -> T {
    lasso::prox(u, step, alpha * lambda)
}

/// Minimizer of the coordinate subproblem
/// `v·z + ½·h·z² + α·λ·|b + z| + (1 − α)·λ·(b + z)²` in closed form; the
/// quadratic ridge term is absorbed into the curvature.
pub fn coord_z<T: RealField + Copy>(b: T, v: T, h: T, lambda: T, alpha: T) -> T {
    let one = T::one();
    let two: T = convert(2.0);
    let p = lasso::soft_threshold(h * b - v, alpha * lambda) / (h + two * (one - alpha) * lambda);
    p - b
}

#[cfg(test)]
mod tests {
    use super::*;

    use approx::assert_abs_diff_eq;

    #[test]
    fn decomposes_into_lasso_and_ridge() {
        let (lambda, alpha) = (0.4, 0.3);
        for &x in &[-1.2, -0.4, 0.0, 0.6, 2.0] {
            let composed =
                lasso::value(x, alpha * lambda) + ridge::value(x, (1.0 - alpha) * lambda);
            assert_abs_diff_eq!(value(x, lambda, alpha), composed);
        }
    }

    #[test]
    fn alpha_one_is_lasso() {
        assert_abs_diff_eq!(value(0.7, 0.4, 1.0), lasso::value(0.7, 0.4));
        assert_abs_diff_eq!(smooth_gradient(0.7, 0.4, 1.0), 0.0);
        assert_abs_diff_eq!(prox(1.0, 1.0, 0.4, 1.0), lasso::prox(1.0, 1.0, 0.4));
    }

    #[test]
    fn alpha_zero_is_ridge() {
        assert_abs_diff_eq!(value(0.7, 0.4, 0.0), ridge::value(0.7, 0.4));
        assert_abs_diff_eq!(smooth_gradient(0.7, 0.4, 0.0), ridge::gradient(0.7, 0.4));
        // No lasso component left, the proximal operator is the identity.
        assert_abs_diff_eq!(prox(1.0, 1.0, 0.4, 0.0), 1.0);
    }

    #[test]
    fn coord_step_stationarity() {
        let (b, v, h, lambda, alpha): (f64, f64, f64, f64, f64) = (0.1, -1.1, 1.8, 0.4, 0.5);
        let z = coord_z(b, v, h, lambda, alpha);
        let p = b + z;
        assert!(p != 0.0);
        let slope = v + h * z + smooth_gradient(p, lambda, alpha) + alpha * lambda * p.signum();
        assert_abs_diff_eq!(slope, 0.0, epsilon = 1e-12);
    }
}
