//! Minimax concave penalty (MCP).
//!
//! The penalty on a single coordinate is
//!
//! ```text
//! p(x) = λ·|x| - x²/(2θ)   if |x| <= θλ
//!        θλ²/2             if |x| >  θλ
//! ```
//!
//! with `θ > 1`. Inside the threshold the penalty behaves like a lasso whose
//! slope tapers off; beyond it the penalty is flat, so large coordinates are
//! left unbiased. The proximal operator is the firm-thresholding function;
//! the coordinate subproblem is non-convex but convex within regions, so the
//! solver finds the minimizer of every region and compares their subproblem
//! values.
//!
//! Note that MCP under coordinate descent is less stable than under the
//! proximal-gradient method; see [`crate::algo::Glmnet`] for the caveat.
//!
//! # References
//!
//! \[1\] [Nearly unbiased variable selection under minimax concave
//! penalty](https://doi.org/10.1214/09-AOS729)

use nalgebra::{convert, RealField};


/// Penalty value for a single coordinate.
pub fn value<T: RealField + Copy>(x: T, lambda: T, theta: T) -> T {
    let two: T = convert(2.0);
    let a = x.abs();
    if a <= theta * lambda {
        lambda * a - a * a / (two * theta)
    } else {
        theta * lambda * lambda / two
    }
}

/// Proximal operator `argmin_z ½(z − u)² + t·p(z)` (firm thresholding).
///
/// For `θ > t` the subproblem is convex and the closed-form firm threshold
/// applies; otherwise the inner region is concave and its boundary points
/// compete with the unshrunk value, so the candidates are compared by
/// objective value.
pub fn prox<T: RealField + Copy>(u: T, step: T, lambda: T, theta: T) -> T {
    let zero = T::zero();
    let au = u.abs();
    let s = if u < zero { -T::one() } else { T::one() };

    if theta > step {
        if au <= theta * lambda {
            let shrunk = (au - step * lambda).max(zero);
            s * shrunk * theta / (theta - step)
        } else {
            u
        }
    } else {
        // Non-convex inner region: only the region boundaries and the
        // unshrunk value can minimize.
        let objective = |z: T| {
            let d = z - u;
            convert::<_, T>(0.5) * d * d + step * value(z, lambda, theta)
        };

        let mut best = zero;
        let mut best_value = objective(zero);
        let mut consider = |z: T| {
            let v = objective(z);
            if v < best_value {
                best = z;
                best_value = v;
            }
        };

        consider(s * theta * lambda);
        if au > theta * lambda {
            consider(u);
        }
        best
    }
}

/// Minimizer of the coordinate subproblem `v·z + ½·h·z² + p(b + z)`, where
/// `b = x_j + d_j` and `v = g_j + (Hd)_j`.
///
/// The subproblem is convex within three regions (both sign branches of the
/// tapered region and the flat region). The stationary point of each region
/// is computed, clipped into its region (the clip value itself is a
/// candidate, covering the region boundaries), and the candidate with the
/// smallest subproblem value wins. The caller must have ensured
/// `h > 1/θ`, inflating the diagonal if necessary; see
/// [`Penalty::coord_z`](crate::penalty::Penalty::coord_z).
///
/// Returns `None` when no candidate has a finite subproblem value.
pub fn coord_z<T: RealField + Copy>(b: T, v: T, h: T, lambda: T, theta: T) -> Option<T> {
    let zero = T::zero();
    let half: T = convert(0.5);
    let bound = theta * lambda;

    let objective = |z: T| v * z + half * h * z * z + value(b + z, lambda, theta);

    // Tapered region, b + z > 0:
    // v + h·z + λ - (b + z)/θ = 0, lower-bounded by the zero candidate.
    let z1 = (-(v * theta) - bound + b) / (h * theta - T::one());
    let z1 = z1.max(-b);
    let z1 = if b + z1 <= bound { z1 } else { bound - b };

    // Tapered region, b + z < 0:
    // v + h·z - λ - (b + z)/θ = 0, upper-bounded by the zero candidate.
    let z2 = (-(v * theta) + bound + b) / (h * theta - T::one());
    let z2 = z2.min(-b);
    let z2 = if b + z2 >= -bound { z2 } else { -bound - b };

    // Flat region, |b + z| > θλ: v + h·z = 0.
    let z3 = -v / h;
    let z3 = if b + z3 < zero {
        if b + z3 <= -bound {
            z3
        } else {
            -bound - b
        }
    } else if b + z3 >= bound {
        z3
    } else {
        bound - b
    };

    let mut best: Option<(T, T)> = None;
    for z in [z1, z2, z3] {
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
