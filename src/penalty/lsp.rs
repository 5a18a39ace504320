//! Log-sum penalty (LSP).
//!
//! The penalty on a single coordinate is `λ·log(1 + |x|/θ)`. Like the other
//! folded penalties it is non-convex, flattening out for large coordinates.
//! There is no flat region, so both the proximal operator and the coordinate
//! subproblem reduce to the roots of one quadratic per sign branch, compared
//! against the zero candidate.
//!
//! # References
//!
//! \[1\] [Enhancing Sparsity by Reweighted l1
//! Minimization](https://doi.org/10.1007/s00041-008-9045-x)

use nalgebra::{convert, RealField};


/// Penalty value `λ·log(1 + |x|/θ)` for a single coordinate.
pub fn value<T: RealField + Copy>(x: T, lambda: T, theta: T) -> T {
    lambda * (T::one() + x.abs() / theta).ln()
}

/// Real roots of `a·z² + b·z + c = 0`, if any.
fn quadratic_roots<T: RealField + Copy>(a: T, b: T, c: T) -> Option<(T, T)> {
    let four: T = convert(4.0);
    let two: T = convert(2.0);
    let disc = b * b - four * a * c;
    if disc < T::zero() {
        return None;
    }
    let sq = disc.sqrt();
    Some(((-b + sq) / (two * a), (-b - sq) / (two * a)))
}

/// Proximal operator `argmin_z ½(z − u)² + t·λ·log(1 + |z|/θ)`.
///
/// The stationarity equation of each sign branch is a quadratic; all real
/// roots lying in their branch are evaluated together with the zero
/// candidate, and the global minimizer wins.
pub fn prox<T: RealField + Copy>(u: T, step: T, lambda: T, theta: T) -> T {
    let zero = T::zero();
    let c = step * lambda;

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

    // Positive branch: (z - u)(θ + z) + t·λ = 0 for z > 0.
    if let Some((r1, r2)) = quadratic_roots(T::one(), theta - u, c - u * theta) {
        if r1 > zero {
            consider(r1);
        }
        if r2 > zero {
            consider(r2);
        }
    }

    // Negative branch: (z - u)(θ - z) - t·λ = 0 for z < 0.
    if let Some((r1, r2)) = quadratic_roots(T::one(), -(theta + u), u * theta + c) {
        if r1 < zero {
            consider(r1);
        }
        if r2 < zero {
            consider(r2);
        }
    }

    best
}

/// Minimizer of the coordinate subproblem
/// `v·z + ½·h·z² + λ·log(1 + |b + z|/θ)`.
///
/// Returns `None` when no candidate has a finite subproblem value.
pub fn coord_z<T: RealField + Copy>(b: T, v: T, h: T, lambda: T, theta: T) -> Option<T> {
    let zero = T::zero();
    let half: T = convert(0.5);

    let objective = |z: T| v * z + half * h * z * z + value(b + z, lambda, theta);

    let mut best: Option<(T, T)> = None;
    let mut consider = |z: T| {
        if !z.is_finite() {
            return;
        }
        let val = objective(z);
        if !val.is_finite() {
            return;
        }
        match best {
            Some((_, best_val)) if best_val <= val => {}
            _ => best = Some((z, val)),
        }
    };

    // Zero candidate: sets the coordinate to zero.
    consider(-b);

    // Positive branch: (v + h·z)(θ + b + z) + λ = 0 for b + z > 0.
    if let Some((r1, r2)) = quadratic_roots(h, v + h * (theta + b), v * (theta + b) + lambda) {
        if b + r1 > zero {
            consider(r1);
        }
        if b + r2 > zero {
            consider(r2);
        }
    }

    // Negative branch: (v + h·z)(θ - b - z) - λ = 0 for b + z < 0.
    if let Some((r1, r2)) = quadratic_roots(h, v - h * (theta - b), lambda - v * (theta - b)) {
        if b + r1 < zero {
            consider(r1);
        }
        if b + r2 < zero {
            consider(r2);
        }
    }

    best.map(|(z, _)| z)
}

#[cfg(test)]
mod tests {
    use super::*;

    use approx::assert_abs_diff_eq;

    #[test]
    fn value_at_zero_is_zero() {
        assert_abs_diff_eq!(value(0.0, 0.4, 1.2), 0.0);
    }

    #[test]
    fn prox_zero_step_is_identity() {
        for &u in &[-2.5, -0.3, 0.0, 0.8, 4.0] {
            assert_abs_diff_eq!(prox(u, 0.0, 0.4, 1.2), u, epsilon = 1e-12);
        }
    }

    #[test]
    fn prox_is_odd() {
        let (step, lambda, theta) = (0.7, 0.5, 1.1);
        for &u in &[0.2, 0.9, 1.7, 3.3] {
            assert_abs_diff_eq!(
                prox(-u, step, lambda, theta),
                -prox(u, step, lambda, theta),
                epsilon = 1e-12
            );
        }
    }

    #[test]
    fn prox_is_global_minimizer() {
        let (step, lambda, theta) = (0.9, 0.8, 0.7);
        let objective =
            |z: f64, u: f64| 0.5 * (z - u).powi(2) + step * value(z, lambda, theta);
        for i in 0..60 {
            let u = -3.0 + 0.1 * i as f64;
            let z = prox(u, step, lambda, theta);
            let best = objective(z, u);
            for k in 0..=1200 {
                let grid = -6.0 + 0.01 * k as f64;
                assert!(best <= objective(grid, u) + 1e-6);
            }
        }
    }

    #[test]
    fn coord_step_is_global_minimizer() {
        let (lambda, theta) = (0.5, 0.9);
        let objective = |z: f64, b: f64, v: f64, h: f64| {
            v * z + 0.5 * h * z * z + value(b + z, lambda, theta)
        };
        for &(b, v, h) in &[(0.0, -1.2, 1.0), (0.8, 0.6, 2.2), (-1.5, -0.2, 0.6)] {
            let z = coord_z(b, v, h, lambda, theta).unwrap();
            let best = objective(z, b, v, h);
            for k in 0..=1200 {
                let grid = -6.0 + 0.01 * k as f64;
                assert!(best <= objective(grid, b, v, h) + 1e-6);
            }
        }
    }
}
