//! Ridge (L2) penalty.
//!
//! The penalty on a single coordinate is `λ·x²`. Ridge regularization does
//! not set parameters to zero; it shrinks them towards zero. The penalty is
//! smooth everywhere, so the proximal-gradient optimizer treats it through
//! its gradient and no proximal operator is needed.
//!
//! # References
//!
//! \[1\] [Ridge Regression: Biased Estimation for Nonorthogonal
//! Problems](https://doi.org/10.1080/00401706.1970.10488634)

use nalgebra::{convert, RealField};

/// Penalty value `λ·x²` for a single coordinate.
pub fn value<T: RealField + Copy>(x: T, lambda: T) -> T {
    lambda * x * x
}

/// Penalty gradient `2·λ·x` for a single coordinate.
pub fn gradient<T: RealField + Copy>(x: T, lambda: T) -> T {
    let two: T = convert(2.0);
    two * lambda * x
}

/// Minimizer of the coordinate subproblem `v·z + ½·h·z² + λ·(b + z)²` in
/// closed form.
pub fn coord_z<T: RealField + Copy>(b: T, v: T, h: T, lambda: T) -> T {
    let two: T = convert(2.0);
    -(v + two * lambda * b) / (h + two * lambda)
}

#[cfg(test)]
mod tests {
    use super::*;

    use approx::assert_abs_diff_eq;

    #[test]
    fn gradient_matches_finite_difference() {
        let lambda = 0.8;
        let eps = 1e-6;
        for &x in &[-1.7, -0.3, 0.0, 0.5, 2.4] {
            let numeric = (value(x + eps, lambda) - value(x - eps, lambda)) / (2.0 * eps);
            assert_abs_diff_eq!(gradient(x, lambda), numeric, epsilon = 1e-8);
        }
    }

    #[test]
    fn coord_step_stationarity() {
        let (b, v, h, lambda) = (0.7, -0.9, 1.5, 0.4);
        let z = coord_z(b, v, h, lambda);
        let slope = v + h * z + gradient(b + z, lambda);
        assert_abs_diff_eq!(slope, 0.0, epsilon = 1e-12);
    }
}
