//! Smoothly clipped absolute deviation (SCAD) penalty.
//!
//! The penalty on a single coordinate is
//!
//! ```text
//! p(x) = λ·|x|                             if |x| <= λ
//!        (2θλ·|x| - x² - λ²)/(2(θ - 1))    if λ < |x| <= θλ
//!        λ²(θ + 1)/2                       if |x| > θλ
//! ```
//!
//! with `θ > 2`: a lasso near zero, a quadratic interpolation in between and
//! a flat tail. Both the proximal operator and the coordinate subproblem
//! enumerate the region-restricted minimizers and compare their objective
//! values, mirroring the [MCP](super::mcp) treatment.
//!
//! # References
//!
//! \[1\] [Variable Selection via Nonconcave Penalized Likelihood and its
//! Oracle Properties](https://doi.org/10.1198/016214501753382273)

use nalgebra::{convert, RealField};


use super::lasso;

/// Penalty value for a single coordinate.
pub fn value<T: RealField + Copy>(x: T, lambda: T, theta: T) -> T {
    let one = T::one();
    let two: T = convert(2.0);
    let a = x.abs();
    if a <= lambda {
        lambda * a
    } else if a <= theta * lambda {
        (two * theta * lambda * a - a * a - lambda * lambda) / (two * (theta - one))
    } else {
        lambda * lambda * (theta + one) / two
    }
}

/// Proximal operator `argmin_z ½(z − u)² + t·p(z)`.
///
/// Candidates: the soft-threshold root clipped into the lasso region, the
/// interpolation-region root (or its boundaries when `θ − 1 <= t` makes that
/// region concave) and the unshrunk value clipped into the flat region. The
/// region attaining the smallest objective wins.
pub fn prox<T: RealField + Copy>(u: T, step: T, lambda: T, theta: T) -> T {
    let zero = T::zero();
    let one = T::one();
    let au = u.abs();
    let s = if u < zero { -one } else { one };
    let bound = theta * lambda;

    let objective = |z: T| {
        let d = z - u;
        convert::<_, T>(0.5) * d * d + step * value(z, lambda, theta)
    };

    let mut best = zero;
    let mut best_value = objective(zero);
    let mut consider = |z: T| {
        if z.is_finite() {
            let v = objective(z);
            if v < best_value {
                best = z;
                best_value = v;
            }
        }
    };

    // Lasso region |z| <= λ.
    consider(s * lasso::soft_threshold(au, step * lambda).min(lambda));

    // Interpolation region λ <= |z| <= θλ.
    let denom = theta - one - step;
    if denom > zero {
        let root = ((theta - one) * au - theta * step * lambda) / denom;
        consider(s * root.max(lambda).min(bound));
    } else {
        // Concave region: only its boundaries can minimize.
        consider(s * lambda);
        consider(s * bound);
    }

    // Flat region |z| >= θλ.
    consider(s * au.max(bound));

    best
}

/// Minimizer of the coordinate subproblem `v·z + ½·h·z² + p(b + z)`.
///
/// The three value regions give five convex pieces (two sign branches each
/// for the lasso and interpolation regions plus the flat region). Each
/// stationary point is clipped into its piece and the candidate with the
/// smallest subproblem value wins. The caller must have ensured
/// `h > 1/(θ - 1)`, inflating the diagonal if necessary; see
/// [`Penalty::coord_z`](crate::penalty::Penalty::coord_z).
///
/// Returns `None` when no candidate has a finite subproblem value.
pub fn coord_z<T: RealField + Copy>(b: T, v: T, h: T, lambda: T, theta: T) -> Option<T> {
    let zero = T::zero();
    let one = T::one();
    let half: T = convert(0.5);
    let bound = theta * lambda;

    let objective = |z: T| v * z + half * h * z * z + value(b + z, lambda, theta);

    let clip = |z: T, lo: T, hi: T| z.max(lo).min(hi);

    // Lasso region, both sign branches: v + h·z ± λ = 0.
    let z1 = clip(-(v + lambda) / h, -b, lambda - b);
    let z2 = clip(-(v - lambda) / h, -lambda - b, -b);

    // Interpolation region, both sign branches:
    // v + h·z + (θλ·sign(p) - p)/(θ - 1) = 0 with p = b + z.
    let denom = h * (theta - one) - one;
    let z3 = clip((b - v * (theta - one) - bound) / denom, lambda - b, bound - b);
    let z4 = clip((b - v * (theta - one) + bound) / denom, -bound - b, -lambda - b);

    // Flat region, |b + z| > θλ: v + h·z = 0.
    let z5 = -v / h;
    let z5 = if b + z5 < zero {
        if b + z5 <= -bound {
            z5
        } else {
            -bound - b
        }
    } else if b + z5 >= bound {
        z5
    } else {
        bound - b
    };

    let mut best: Option<(T, T)> = None;
    for z in [z1, z2, z3, z4, z5] {
        if !z.is_finite() {
            continue;
        }
        let val = objective(z);
        if !val.is_finite() {
            continue;
        }
        match best {
            Some((_, best_val)) if best_val <= val => {}
            _ => best = Some((z, val)),
        }
    }

    best.map(|(z, _)| z)
}

#[cfg(test)]
mod tests {
    use super::*;

    use approx::assert_abs_diff_eq;

    #[test]
    fn value_regions_are_continuous() {
        let (lambda, theta) = (0.5, 3.7);
        let eps = 1e-9;
        // At |x| = λ the lasso and interpolation regions agree.
        assert_abs_diff_eq!(
            value(lambda - eps, lambda, theta),
            value(lambda + eps, lambda, theta),
            epsilon = 1e-6
        );
        // At |x| = θλ the interpolation and flat regions agree.
        let t = theta * lambda;
        assert_abs_diff_eq!(
            value(t - eps, lambda, theta),
            value(t + eps, lambda, theta),
            epsilon = 1e-6
        );
        // Flat value.
        assert_abs_diff_eq!(
            value(10.0, lambda, theta),
            lambda * lambda * (theta + 1.0) / 2.0
        );
    }

    #[test]
    fn gradient_of_value_matches_finite_difference() {
        // The closed forms used by the coordinate solver are derived from the
        // value definition; check the derivative of each region numerically.
        let (lambda, theta) = (0.5, 3.7);
        let eps = 1e-6;
        let derivative = |a: f64| {
            if a <= lambda {
                lambda
            } else if a <= theta * lambda {
                (theta * lambda - a) / (theta - 1.0)
            } else {
                0.0
            }
        };
        for &a in &[0.1, 0.4, 0.8, 1.3, 1.7, 2.5] {
            let numeric = (value(a + eps, lambda, theta) - value(a - eps, lambda, theta))
                / (2.0 * eps);
            assert_abs_diff_eq!(derivative(a), numeric, epsilon = 1e-5);
        }
    }

    #[test]
    fn prox_zero_step_is_identity() {
        for &u in &[-4.0, -1.0, 0.0, 0.4, 1.6, 2.2] {
            assert_abs_diff_eq!(prox(u, 0.0, 0.5, 3.7), u);
        }
    }

    #[test]
    fn prox_region_selection() {
        let (lambda, theta) = (0.5, 3.7);
        // Small coordinates: soft threshold.
        assert_abs_diff_eq!(prox(0.8, 1.0, lambda, theta), 0.3);
        // Beyond θλ: identity.
        assert_abs_diff_eq!(prox(4.0, 1.0, lambda, theta), 4.0);
        assert_abs_diff_eq!(prox(-4.0, 1.0, lambda, theta), -4.0);
    }

    #[test]
    fn prox_is_global_minimizer() {
        for &(step, lambda, theta) in &[(1.0, 0.5, 3.7), (3.5, 0.6, 2.5)] {
            let objective =
                |z: f64, u: f64| 0.5 * (z - u).powi(2) + step * value(z, lambda, theta);
            for i in 0..80 {
                let u = -4.0 + 0.1 * i as f64;
                let z = prox(u, step, lambda, theta);
                let best = objective(z, u);
                for k in 0..=1600 {
                    let grid = -8.0 + 0.01 * k as f64;
                    assert!(best <= objective(grid, u) + 1e-6);
                }
            }
        }
    }

    #[test]
    fn coord_step_is_global_minimizer() {
        let (lambda, theta) = (0.5, 3.7);
        let objective = |z: f64, b: f64, v: f64, h: f64| {
            v * z + 0.5 * h * z * z + value(b + z, lambda, theta)
        };
        for &(b, v, h) in &[(0.0, -1.0, 1.0), (1.1, 0.4, 2.0), (-0.4, -0.2, 0.9)] {
            let z = coord_z(b, v, h, lambda, theta).unwrap();
            let best = objective(z, b, v, h);
            for k in 0..=1600 {
                let grid = -8.0 + 0.01 * k as f64;
                assert!(best <= objective(grid, b, v, h) + 1e-6);
            }
        }
    }
}
