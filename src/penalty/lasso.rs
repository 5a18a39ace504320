//! Lasso (L1) penalty.
//!
//! The penalty on a single coordinate is `λ·|x|`. Its proximal operator is
//! the soft-thresholding function and its coordinate-descent subproblem has a
//! single soft-threshold root.
//!
//! # References
//!
//! \[1\] [Regression Shrinkage and Selection via the
//! Lasso](https://doi.org/10.1111/j.2517-6161.1996.tb02080.x)

use nalgebra::RealField;

/// Penalty value `λ·|x|` for a single coordinate.
pub fn value<T: RealField + Copy>(x: T, lambda: T) -> T {
    lambda * x.abs()
}

/// Soft-thresholding `sign(u)·max(|u| − c, 0)`.
pub fn soft_threshold<T: RealField + Copy>(u: T, c: T) -> T {
    if u > c {
        u - c
    } else if u < -c {
        u + c
    } else {
        T::zero()
    }
}

/// Proximal operator `argmin_z ½(z − u)² + t·λ·|z|`.
pub fn prox<T: RealField + Copy>(u: T, step: T, lambda: T) -> T {
    soft_threshold(u, step * lambda)
}

/// Minimizer of the coordinate subproblem `v·z + ½·h·z² + λ·|b + z|`, where
/// `b = x_j + d_j` is the inner-iteration value of the coordinate and
/// `v = g_j + (Hd)_j` collects the linear terms of the quadratic model.
pub fn coord_z<T: RealField + Copy>(b: T, v: T, h: T, lambda: T) -> T {
    soft_threshold(h * b - v, lambda) / h - b
}
