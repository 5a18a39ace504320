//! Capped-L1 penalty.
//!
//! The penalty on a single coordinate is `λ·min(|x|, θ)`: the lasso penalty
//! capped at a ceiling, which removes the bias of the lasso for large
//! coordinates. The penalty is non-convex, so both the proximal operator and
//! the coordinate subproblem enumerate the minimizers of the two regions
//! (`|x| ≤ θ` and `|x| ≥ θ`) and compare their objective values.
//!
//! # References
//!
//! \[1\] [Analysis of Multi-stage Convex Relaxation for Sparse
//! Regularization](https://www.jmlr.org/papers/v11/zhang10a.html)

use nalgebra::{convert, RealField};


use super::lasso;

/// Penalty value `λ·min(|x|, θ)` for a single coordinate.
pub fn value<T: RealField + Copy>(x: T, lambda: T, theta: T) -> T {
    lambda * x.abs().min(theta)
}

/// Proximal operator `argmin_z ½(z − u)² + t·λ·min(|z|, θ)`.
///
/// The capped region (`|z| ≥ θ`) keeps `u` unshrunk, the lasso region
/// (`|z| ≤ θ`) soft-thresholds; the global minimizer is whichever candidate
/// attains the smaller objective.
pub fn prox<T: RealField + Copy>(u: T, step: T, lambda: T, theta: T) -> T {
    let au = u.abs();
    let s = if u < T::zero() { -T::one() } else { T::one() };

    let capped = s * au.max(theta);
    let shrunk = s * theta.min(lasso::soft_threshold(au, step * lambda));

    let objective = |z: T| {
        let d = z - u;
        convert::<_, T>(0.5) * d * d + step * value(z, lambda, theta)
    };

    if objective(capped) < objective(shrunk) {
        capped
    } else {
        shrunk
    }
}

/// Minimizer of the coordinate subproblem
/// `v·z + ½·h·z² + λ·min(|b + z|, θ)`.
///
/// Candidates: the soft-threshold root clipped into the lasso region and the
/// Newton root clipped into the capped region; the smaller subproblem value
/// wins.
pub fn coord_z<T: RealField + Copy>(b: T, v: T, h: T, lambda: T, theta: T) -> T {
    let half: T = convert(0.5);

    // Lasso region: |b + z| <= theta.
    let inner = lasso::soft_threshold(h * b - v, lambda) / h;
    let inner = inner.max(-theta).min(theta) - b;

    // Capped region: |b + z| >= theta, flat penalty.
    let newton = -v / h;
    let p = b + newton;
    let outer = if p >= T::zero() {
        p.max(theta) - b
    } else {
        p.min(-theta) - b
    };

    let objective = |z: T| v * z + half * h * z * z + value(b + z, lambda, theta);

    if objective(outer) < objective(inner) {
        outer
    } else {
        inner
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use approx::assert_abs_diff_eq;

    fn prox_objective(z: f64, u: f64, step: f64, lambda: f64, theta: f64) -> f64 {
        0.5 * (z - u).powi(2) + step * value(z, lambda, theta)
    }

    #[test]
    fn value_is_capped() {
        assert_abs_diff_eq!(value(0.5, 0.3, 2.0), 0.15);
        assert_abs_diff_eq!(value(-5.0, 0.3, 2.0), 0.6);
        assert_abs_diff_eq!(value(2.0, 0.3, 2.0), 0.6);
    }

    #[test]
    fn prox_soft_thresholds_small_coordinates() {
        assert_abs_diff_eq!(prox(1.0, 1.0, 0.3, 5.0), 0.7);
        assert_abs_diff_eq!(prox(-0.2, 1.0, 0.3, 5.0), 0.0);
    }

    #[test]
    fn prox_keeps_large_coordinates() {
        // Far beyond the cap the flat region wins and u stays unshrunk.
        assert_abs_diff_eq!(prox(6.0, 1.0, 0.3, 2.0), 6.0);
        assert_abs_diff_eq!(prox(-6.0, 1.0, 0.3, 2.0), -6.0);
    }

    #[test]
    fn prox_zero_step_is_identity() {
        for &u in &[-3.0, -0.5, 0.0, 1.9, 2.1] {
            assert_abs_diff_eq!(prox(u, 0.0, 0.3, 2.0), u);
        }
    }

    #[test]
    fn prox_is_global_minimizer() {
        let (step, lambda, theta) = (0.8, 0.6, 1.5);
        for i in 0..80 {
            let u = -4.0 + 0.1 * i as f64;
            let z = prox(u, step, lambda, theta);
            let best = prox_objective(z, u, step, lambda, theta);
            for k in 0..=1600 {
                let grid = -8.0 + 0.01 * k as f64;
                assert!(best <= prox_objective(grid, u, step, lambda, theta) + 1e-6);
            }
        }
    }

    #[test]
    fn coord_step_is_global_minimizer() {
        let (lambda, theta) = (0.6, 1.5);
        let objective = |z: f64, b: f64, v: f64, h: f64| {
            v * z + 0.5 * h * z * z + value(b + z, lambda, theta)
        };
        for &(b, v, h) in &[(0.0, -1.0, 1.0), (1.4, 0.8, 2.0), (-2.0, -0.4, 0.7)] {
            let z = coord_z(b, v, h, lambda, theta);
            let best = objective(z, b, v, h);
            for k in 0..=1600 {
                let grid = -8.0 + 0.01 * k as f64;
                assert!(best <= objective(grid, b, v, h) + 1e-6);
            }
        }
    }
}
