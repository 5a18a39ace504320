//! Reference fit functions useful for testing, debugging and smoke testing
//! the optimizers.
//!
//! [`Quadratic`] is recommended for first tests: its penalized minimizers are
//! known in closed form for most penalties. [`LeastSquares`] exercises
//! realistic correlated curvature and [`Rosenbrock`] a non-convex fit.

#![allow(unused)]

use nalgebra::{
    storage::{Storage, StorageMut},
    DMatrix, DVector, Dyn, IsContiguous, Matrix, Vector,
};

use crate::core::{FitFunction, FitHessian, ParamSet, Problem};

/// Separable quadratic fit `f(x) = ½‖x − u‖²` with a fixed target `u`.
///
/// The proximal operator of a penalty is exactly the penalized minimizer of
/// this fit at unit step, which makes expected results easy to derive by
/// hand.
#[derive(Debug, Clone)]
pub struct Quadratic {
    target: DVector<f64>,
}

impl Quadratic {
    /// Creates the fit with given target.
    pub fn new(target: DVector<f64>) -> Self {
        Self { target }
    }

    /// The unpenalized minimizer.
    pub fn target(&self) -> &DVector<f64> {
        &self.target
    }
}

impl Problem for Quadratic {
    type Field = f64;

    fn params(&self) -> ParamSet {
        ParamSet::of_dim(self.target.len())
    }
}

impl FitFunction for Quadratic {
    fn value<Sx>(&self, x: &Vector<Self::Field, Dyn, Sx>) -> Self::Field
    where
        Sx: Storage<Self::Field, Dyn> + IsContiguous,
    {
        x.iter()
            .zip(self.target.iter())
            .map(|(xj, uj)| 0.5 * (xj - uj).powi(2))
            .sum()
    }

    fn gradient<Sx, Sg>(
        &self,
        x: &Vector<Self::Field, Dyn, Sx>,
        g: &mut Vector<Self::Field, Dyn, Sg>,
    ) where
        Sx: Storage<Self::Field, Dyn> + IsContiguous,
        Sg: StorageMut<Self::Field, Dyn>,
    {
        for j in 0..x.len() {
            g[j] = x[j] - self.target[j];
        }
    }
}

impl FitHessian for Quadratic {
    fn hessian<Sx, Sh>(
        &self,
        _x: &Vector<Self::Field, Dyn, Sx>,
        h: &mut Matrix<Self::Field, Dyn, Dyn, Sh>,
    ) where
        Sx: Storage<Self::Field, Dyn> + IsContiguous,
        Sh: StorageMut<Self::Field, Dyn, Dyn>,
    {
        h.fill(0.0);
        h.fill_diagonal(1.0);
    }
}

/// Least-squares fit `f(β) = ½‖y − Xβ‖²` for a fixed design matrix `X` and
/// response `y`.
///
/// The Hessian `XᵀX` couples the parameters, which exercises the incremental
/// `Hd` bookkeeping of the coordinate-descent optimizer.
#[derive(Debug, Clone)]
pub struct LeastSquares {
    design: DMatrix<f64>,
    response: DVector<f64>,
}

impl LeastSquares {
    /// Creates the fit from a design matrix and a response vector.
    ///
    /// # Panics
    ///
    /// Panics if the number of rows of the design does not match the length
    /// of the response.
    pub fn new(design: DMatrix<f64>, response: DVector<f64>) -> Self {
        assert_eq!(design.nrows(), response.len(), "shape mismatch");
        Self { design, response }
    }
}

impl Problem for LeastSquares {
    type Field = f64;

    fn params(&self) -> ParamSet {
        ParamSet::of_dim(self.design.ncols())
    }
}

impl FitFunction for LeastSquares {
    fn value<Sx>(&self, x: &Vector<Self::Field, Dyn, Sx>) -> Self::Field
    where
        Sx: Storage<Self::Field, Dyn> + IsContiguous,
    {
        let residual = &self.response - &self.design * x;
        0.5 * residual.norm_squared()
    }

    fn gradient<Sx, Sg>(
        &self,
        x: &Vector<Self::Field, Dyn, Sx>,
        g: &mut Vector<Self::Field, Dyn, Sg>,
    ) where
        Sx: Storage<Self::Field, Dyn> + IsContiguous,
        Sg: StorageMut<Self::Field, Dyn>,
    {
        let residual = &self.design * x - &self.response;
        g.copy_from(&(self.design.transpose() * residual));
    }
}

impl FitHessian for LeastSquares {
    fn hessian<Sx, Sh>(
        &self,
        _x: &Vector<Self::Field, Dyn, Sx>,
        h: &mut Matrix<Self::Field, Dyn, Dyn, Sh>,
    ) where
        Sx: Storage<Self::Field, Dyn> + IsContiguous,
        Sh: StorageMut<Self::Field, Dyn, Dyn>,
    {
        h.copy_from(&(self.design.transpose() * &self.design));
    }
}

/// Two-dimensional Rosenbrock fit
/// `f(x) = (a − x₁)² + b·(x₂ − x₁²)²`, a classic non-convex test function
/// with a curved valley.
#[derive(Debug, Clone)]
pub struct Rosenbrock {
    a: f64,
    b: f64,
}

impl Rosenbrock {
    /// Creates the fit with given coefficients; `a = 1`, `b = 100` is the
    /// standard choice, with the unpenalized minimum in `(a, a²)`.
    pub fn new(a: f64, b: f64) -> Self {
        Self { a, b }
    }
}

impl Problem for Rosenbrock {
    type Field = f64;

    fn params(&self) -> ParamSet {
        ParamSet::of_dim(2)
    }
}

impl FitFunction for Rosenbrock {
    fn value<Sx>(&self, x: &Vector<Self::Field, Dyn, Sx>) -> Self::Field
    where
        Sx: Storage<Self::Field, Dyn> + IsContiguous,
    {
        (self.a - x[0]).powi(2) + self.b * (x[1] - x[0].powi(2)).powi(2)
    }

    fn gradient<Sx, Sg>(
        &self,
        x: &Vector<Self::Field, Dyn, Sx>,
        g: &mut Vector<Self::Field, Dyn, Sg>,
    ) where
        Sx: Storage<Self::Field, Dyn> + IsContiguous,
        Sg: StorageMut<Self::Field, Dyn>,
    {
        g[0] = -2.0 * (self.a - x[0]) - 4.0 * self.b * x[0] * (x[1] - x[0].powi(2));
        g[1] = 2.0 * self.b * (x[1] - x[0].powi(2));
    }
}

impl FitHessian for Rosenbrock {
    fn hessian<Sx, Sh>(
        &self,
        x: &Vector<Self::Field, Dyn, Sx>,
        h: &mut Matrix<Self::Field, Dyn, Dyn, Sh>,
    ) where
        Sx: Storage<Self::Field, Dyn> + IsContiguous,
        Sh: StorageMut<Self::Field, Dyn, Dyn>,
    {
        h[(0, 0)] = 2.0 - 4.0 * self.b * (x[1] - 3.0 * x[0].powi(2));
        h[(0, 1)] = -4.0 * self.b * x[0];
        h[(1, 0)] = -4.0 * self.b * x[0];
        h[(1, 1)] = 2.0 * self.b;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use approx::assert_abs_diff_eq;
    use nalgebra::{dmatrix, dvector};

    fn numeric_gradient<F: FitFunction<Field = f64>>(f: &F, x: &DVector<f64>) -> DVector<f64> {
        let eps = 1e-6;
        let mut g = DVector::zeros(x.len());
        for j in 0..x.len() {
            let mut plus = x.clone();
            let mut minus = x.clone();
            plus[j] += eps;
            minus[j] -= eps;
            g[j] = (f.value(&plus) - f.value(&minus)) / (2.0 * eps);
        }
        g
    }

    #[test]
    fn quadratic_gradient_matches() {
        let f = Quadratic::new(dvector![1.0, -2.0, 0.5]);
        let x = dvector![0.3, 0.1, -0.4];
        let mut g = DVector::zeros(3);
        f.gradient(&x, &mut g);
        assert_abs_diff_eq!(g, numeric_gradient(&f, &x), epsilon = 1e-6);
    }

    #[test]
    fn least_squares_gradient_matches() {
        let f = LeastSquares::new(
            dmatrix![1.0, 0.5; -0.3, 1.2; 0.8, -0.7],
            dvector![1.0, 0.2, -0.4],
        );
        let x = dvector![0.6, -0.9];
        let mut g = DVector::zeros(2);
        f.gradient(&x, &mut g);
        assert_abs_diff_eq!(g, numeric_gradient(&f, &x), epsilon = 1e-5);
    }

    #[test]
    fn rosenbrock_gradient_matches() {
        let f = Rosenbrock::new(1.0, 100.0);
        let x = dvector![-1.2, 1.0];
        let mut g = DVector::zeros(2);
        f.gradient(&x, &mut g);
        assert_abs_diff_eq!(g, numeric_gradient(&f, &x), epsilon = 1e-3);
    }
}
