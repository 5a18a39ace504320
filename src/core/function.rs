use nalgebra::{
    storage::{Storage, StorageMut},
    Dyn, IsContiguous, Matrix, Vector,
};

use super::base::Problem;

/// The trait for defining fit functions.
///
/// ## Defining a fit function
///
/// A fit function is any type that implements [`FitFunction`] and [`Problem`]
/// traits. There is one required associated type (the scalar) and three
/// required methods: [`params`](Problem::params),
/// [`value`](FitFunction::value) and [`gradient`](FitFunction::gradient).
///
/// ```rust
/// use penalized::nalgebra as na;
/// use penalized::{FitFunction, ParamSet, Problem};
/// use na::{Dyn, IsContiguous};
///
/// // A fit function is represented by a type, typically holding the data the
/// // model is fitted to.
/// struct Sum1DSquares {
///     targets: Vec<f64>,
/// }
///
/// impl Problem for Sum1DSquares {
///     // The numeric type. Usually f64 or f32.
///     type Field = f64;
///
///     fn params(&self) -> ParamSet {
///         ParamSet::of_dim(self.targets.len())
///     }
/// }
///
/// impl FitFunction for Sum1DSquares {
///     // Evaluate trial values of the parameters.
///     fn value<Sx>(&self, x: &na::Vector<Self::Field, Dyn, Sx>) -> Self::Field
///     where
///         Sx: na::storage::Storage<Self::Field, Dyn> + IsContiguous,
///     {
///         x.iter()
///             .zip(self.targets.iter())
///             .map(|(xi, ti)| 0.5 * (xi - ti).powi(2))
///             .sum()
///     }
///
///     fn gradient<Sx, Sg>(
///         &self,
///         x: &na::Vector<Self::Field, Dyn, Sx>,
///         g: &mut na::Vector<Self::Field, Dyn, Sg>,
///     ) where
///         Sx: na::storage::Storage<Self::Field, Dyn> + IsContiguous,
///         Sg: na::storage::StorageMut<Self::Field, Dyn>,
///     {
///         for (j, ti) in self.targets.iter().enumerate() {
///             g[j] = x[j] - ti;
///         }
///     }
/// }
/// ```
///
/// The fit function must be deterministic within one optimizer call.
/// Non-finite values (NaN, infinity) terminate the optimization with the
/// [`FitNonFinite`](crate::driver::Status::FitNonFinite) status.
pub trait FitFunction: Problem {
    /// Calculate the fit value given values of the parameters.
    fn value<Sx>(&self, x: &Vector<Self::Field, Dyn, Sx>) -> Self::Field
    where
        Sx: Storage<Self::Field, Dyn> + IsContiguous;

    /// Calculate the gradient of the fit in given point.
    fn gradient<Sx, Sg>(
        &self,
        x: &Vector<Self::Field, Dyn, Sx>,
        g: &mut Vector<Self::Field, Dyn, Sg>,
    ) where
        Sx: Storage<Self::Field, Dyn> + IsContiguous,
        Sg: StorageMut<Self::Field, Dyn>;
}

/// Extension of [`FitFunction`] for fit functions that can also provide a
/// Hessian matrix.
///
/// The Hessian does not need to be exact; a quasi-Newton approximation such
/// as BFGS maintained by the caller is acceptable. It is required by the
/// [coordinate-descent optimizer](crate::algo::Glmnet) only; the
/// [proximal-gradient optimizer](crate::algo::Ista) never asks for it.
pub trait FitHessian: FitFunction {
    /// Calculate the Hessian (or its approximation) in given point.
    fn hessian<Sx, Sh>(
        &self,
        x: &Vector<Self::Field, Dyn, Sx>,
        h: &mut Matrix<Self::Field, Dyn, Dyn, Sh>,
    ) where
        Sx: Storage<Self::Field, Dyn> + IsContiguous,
        Sh: StorageMut<Self::Field, Dyn, Dyn>;
}
