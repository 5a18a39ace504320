//! Coordinate-descent (glmnet-style) optimization method.
//!
//! The method minimizes `f(x) + P(x)` with a combination of outer and inner
//! iterations. Every outer iteration builds a quadratic model of the fit
//! function from its gradient and Hessian (exact or a quasi-Newton
//! approximation supplied by the fit function). The inner iterations sweep
//! the coordinates in ascending index order and solve the penalized
//! univariate subproblem of each coordinate exactly through the
//! [penalty catalogue](crate::penalty), accumulating a step direction. An
//! Armijo backtracking line search along the accumulated direction accepts
//! the outer step.
//!
//! For the non-convex penalties the coordinate subproblem can lose strict
//! convexity; the subproblem solver then inflates the Hessian diagonal and
//! the optimizer reports the fallback. MCP in particular is known to be less
//! stable under coordinate descent than under the
//! [proximal-gradient method](super::Ista), which is the recommended
//! alternative in that case.
//!
//! # References
//!
//! \[1\] [Regularization Paths for Generalized Linear Models via Coordinate
//! Descent](https://doi.org/10.18637/jss.v033.i01)
//!
//! \[2\] [An Improved GLMNET for L1-regularized Logistic
//! Regression](https://doi.org/10.1145/2020408.2020421)

use getset::{CopyGetters, Setters};
use log::{debug, warn};
use nalgebra::{
    convert, storage::StorageMut, ComplexField, DimName, Dyn, IsContiguous, OMatrix, OVector,
    RealField, Vector, U1,
};
use num_traits::{One, Zero};
use thiserror::Error;

use crate::core::{FitHessian, IterOutcome, ParamSet, PenalizedOptimizer, Problem};
use crate::penalty::Penalty;

/// Options for [`Glmnet`] optimizer.
#[derive(Debug, Clone, CopyGetters, Setters)]
#[getset(get_copy = "pub", set = "pub")]
pub struct GlmnetOptions<P: Problem> {
    /// Maximum number of inner coordinate sweeps per outer iteration.
    /// Default: `100`.
    max_inner: usize,
    /// Convergence threshold on the largest coordinate update within one
    /// sweep. Default: `1e-9`.
    tol_inner: P::Field,
    /// Sufficient-decrease constant of the Armijo line search. Default:
    /// `1e-4`.
    c_armijo: P::Field,
    /// Multiplier applied to the step length when a step is rejected.
    /// Default: `0.5`.
    step_shrink: P::Field,
    /// Smallest step length tried before the line search gives up. Default:
    /// `1e-9`.
    step_min: P::Field,
    /// Inflation added to the Hessian diagonal by the positive-definiteness
    /// fallback of the coordinate subproblems. Default: `1e-3`.
    pd_epsilon: P::Field,
}

impl<P: Problem> Default for GlmnetOptions<P> {
    fn default() -> Self {
        Self {
            max_inner: 100,
            tol_inner: convert(1e-9),
            c_armijo: convert(1e-4),
            step_shrink: convert(0.5),
            step_min: convert(1e-9),
            pd_epsilon: convert(1e-3),
        }
    }
}

/// Error returned from [`Glmnet`] optimizer.
#[derive(Debug, Error)]
pub enum GlmnetError {
    /// The fit function or penalty returned a non-finite value.
    #[error("fit function returned a non-finite value")]
    FitNonFinite,
    /// The Armijo step length fell below its lower bound without an accepted
    /// step.
    #[error("line search failed to find an acceptable step")]
    LineSearchFailed,
    /// A coordinate subproblem has no finite minimizer.
    #[error("coordinate subproblem has no finite minimizer")]
    SubproblemNoMinimum,
}

/// Coordinate-descent solver.
///
/// See [module](self) documentation for more details.
pub struct Glmnet<P: Problem> {
    options: GlmnetOptions<P>,
    grad: OVector<P::Field, Dyn>,
    hess: OMatrix<P::Field, Dyn, Dyn>,
    dir: OVector<P::Field, Dyn>,
    hess_dir: OVector<P::Field, Dyn>,
    trial: OVector<P::Field, Dyn>,
}

impl<P: Problem> Glmnet<P> {
    /// Initializes the optimizer with default options.
    pub fn new(p: &P, params: &ParamSet) -> Self {
        Self::with_options(p, params, GlmnetOptions::default())
    }

    /// Initializes the optimizer with given options.
    pub fn with_options(_: &P, params: &ParamSet, options: GlmnetOptions<P>) -> Self {
        let dim = Dyn(params.dim());

        Self {
            options,
            grad: OVector::zeros_generic(dim, U1::name()),
            hess: OMatrix::zeros_generic(dim, dim),
            dir: OVector::zeros_generic(dim, U1::name()),
            hess_dir: OVector::zeros_generic(dim, U1::name()),
            trial: OVector::zeros_generic(dim, U1::name()),
        }
    }
}

impl<F: FitHessian> Glmnet<F> {
    fn next_inner<Sx>(
        &mut self,
        f: &F,
        params: &ParamSet,
        penalty: &Penalty<F::Field>,
        x: &mut Vector<F::Field, Dyn, Sx>,
    ) -> Result<IterOutcome<F::Field>, GlmnetError>
    where
        Sx: StorageMut<F::Field, Dyn> + IsContiguous,
    {
        let Self {
            options,
            grad,
            hess,
            dir,
            hess_dir,
            trial,
        } = self;

        let zero = F::Field::zero();
        let one = F::Field::one();
        let n = x.len();

        // Quadratic model of the fit in the current point.
        f.gradient(x, grad);
        f.hessian(x, hess);

        let objective = f.value(x) + penalty.value(x);
        if !objective.is_finite()
            || grad.iter().any(|g| !g.is_finite())
            || hess.iter().any(|h| !h.is_finite())
        {
            return Err(GlmnetError::FitNonFinite);
        }

        dir.fill(zero);
        hess_dir.fill(zero);

        // Inner iterations: sweep the coordinates until the updates die out.
        let mut inner_iters = 0;
        let mut pd_fallbacks = 0;
        for sweep in 0..options.max_inner {
            inner_iters += 1;

            let mut z_max = zero;
            for j in 0..n {
                let b = x[j] + dir[j];
                let v = grad[j] + hess_dir[j];
                let step = penalty
                    .coord_z(j, b, v, hess[(j, j)], options.pd_epsilon)
                    .map_err(|_| GlmnetError::SubproblemNoMinimum)?;

                if step.pd_fallback {
                    pd_fallbacks += 1;
                    warn!(
                        "coordinate subproblem of {} is not positive definite, \
                         inflating the Hessian diagonal (consider the proximal-gradient \
                         method for non-convex penalties)",
                        params.label(j)
                    );
                }

                if step.z != zero {
                    dir[j] += step.z;
                    hess_dir.axpy(step.z, &hess.column(j), one);
                }
                z_max = z_max.max(step.z.abs());
            }

            debug!("inner sweep {}: max |z| = {}", sweep, z_max);

            if z_max < options.tol_inner {
                break;
            }
        }

        // Armijo line search along the accumulated direction.
        let descent = grad.dot(dir);
        let mut s = one;

        loop {
            trial.copy_from(x);
            trial.axpy(s, dir, one);

            let trial_objective = f.value(trial) + penalty.value(trial);
            if !trial_objective.is_finite() {
                return Err(GlmnetError::FitNonFinite);
            }

            if trial_objective <= objective + options.c_armijo * s * descent {
                x.copy_from(trial);
                debug!("step accepted, fx = {}, s = {}", trial_objective, s);

                return Ok(IterOutcome {
                    objective: trial_objective,
                    step_size: s,
                    inner_iters,
                    pd_fallbacks,
                });
            }

            s *= options.step_shrink;
            if s < options.step_min {
                return Err(GlmnetError::LineSearchFailed);
            }
            debug!("step rejected, s = {}", s);
        }
    }
}

impl<F: FitHessian> PenalizedOptimizer<F> for Glmnet<F> {
    const NAME: &'static str = "glmnet";

    type Error = GlmnetError;

    fn opt_next<Sx>(
        &mut self,
        f: &F,
        params: &ParamSet,
        penalty: &Penalty<F::Field>,
        x: &mut Vector<F::Field, Dyn, Sx>,
    ) -> Result<IterOutcome<F::Field>, Self::Error>
    where
        Sx: StorageMut<F::Field, Dyn> + IsContiguous,
    {
        self.next_inner(f, params, penalty, x)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use approx::assert_abs_diff_eq;
    use nalgebra::dvector;

    use crate::core::{FitFunction, Problem};
    use crate::testing::{LeastSquares, Quadratic};

    fn run(
        f: &Quadratic,
        penalty: &Penalty<f64>,
        optimizer: &mut Glmnet<Quadratic>,
        iters: usize,
    ) -> (nalgebra::DVector<f64>, usize) {
        let params = f.params();
        let mut x = nalgebra::DVector::zeros(params.dim());
        let mut pd_fallbacks = 0;
        for _ in 0..iters {
            let outcome = optimizer.opt_next(f, &params, penalty, &mut x).unwrap();
            pd_fallbacks += outcome.pd_fallbacks;
        }
        (x, pd_fallbacks)
    }

    #[test]
    fn lasso_soft_thresholds() {
        let f = Quadratic::new(dvector![1.0, 0.2, -0.5]);
        let penalty = Penalty::lasso(0.3, vec![1.0, 1.0, 1.0]);
        let mut optimizer = Glmnet::new(&f, &f.params());

        let (x, _) = run(&f, &penalty, &mut optimizer, 10);
        assert_abs_diff_eq!(x[0], 0.7, epsilon = 1e-8);
        assert_abs_diff_eq!(x[1], 0.0, epsilon = 1e-8);
        assert_abs_diff_eq!(x[2], -0.2, epsilon = 1e-8);
    }

    #[test]
    fn mcp_identity_beyond_threshold() {
        let f = Quadratic::new(dvector![5.0]);
        let penalty = Penalty::mcp(0.5, 3.0, vec![1.0]);
        let mut optimizer = Glmnet::new(&f, &f.params());

        let (x, pd_fallbacks) = run(&f, &penalty, &mut optimizer, 10);
        assert_abs_diff_eq!(x[0], 5.0, epsilon = 1e-8);
        assert_eq!(pd_fallbacks, 0);
    }

    #[test]
    fn correlated_least_squares_satisfies_kkt() {
        // Two correlated predictors and one irrelevant one.
        let design = nalgebra::dmatrix![
            1.0, 0.9, 0.1;
            0.9, 1.0, -0.2;
            0.3, 0.2, 1.0;
            -0.5, -0.4, 0.3;
        ];
        let response = dvector![1.2, 1.0, 0.2, -0.6];
        let f = LeastSquares::new(design, response);
        let penalty = Penalty::lasso(0.1, vec![1.0, 1.0, 1.0]);

        let params = f.params();
        let mut optimizer = Glmnet::new(&f, &params);
        let mut x = nalgebra::DVector::zeros(params.dim());
        for _ in 0..50 {
            optimizer.opt_next(&f, &params, &penalty, &mut x).unwrap();
        }

        let mut grad = nalgebra::DVector::zeros(params.dim());
        f.gradient(&x, &mut grad);
        assert!(penalty.stationarity(&x, &grad) < 1e-8);
    }

    #[test]
    fn line_search_gives_up_on_ascent_direction() {
        // A gradient with the wrong sign produces a direction along which the
        // objective only grows; no step length can repair that.
        struct WrongGradient;

        impl Problem for WrongGradient {
            type Field = f64;

            fn params(&self) -> ParamSet {
                ParamSet::of_dim(1)
            }
        }

        impl crate::core::FitFunction for WrongGradient {
            fn value<Sx>(&self, x: &nalgebra::Vector<f64, Dyn, Sx>) -> f64
            where
                Sx: nalgebra::storage::Storage<f64, Dyn> + IsContiguous,
            {
                0.5 * (x[0] - 1.0).powi(2)
            }

            fn gradient<Sx, Sg>(
                &self,
                x: &nalgebra::Vector<f64, Dyn, Sx>,
                g: &mut nalgebra::Vector<f64, Dyn, Sg>,
            ) where
                Sx: nalgebra::storage::Storage<f64, Dyn> + IsContiguous,
                Sg: nalgebra::storage::StorageMut<f64, Dyn>,
            {
                g[0] = -(x[0] - 1.0);
            }
        }

        impl FitHessian for WrongGradient {
            fn hessian<Sx, Sh>(
                &self,
                _x: &nalgebra::Vector<f64, Dyn, Sx>,
                h: &mut nalgebra::Matrix<f64, Dyn, Dyn, Sh>,
            ) where
                Sx: nalgebra::storage::Storage<f64, Dyn> + IsContiguous,
                Sh: nalgebra::storage::StorageMut<f64, Dyn, Dyn>,
            {
                h[(0, 0)] = 1.0;
            }
        }

        let f = WrongGradient;
        let params = f.params();
        let penalty = Penalty::none();
        let mut optimizer = Glmnet::new(&f, &params);
        let mut x = dvector![0.0];

        let result = optimizer.opt_next(&f, &params, &penalty, &mut x);
        assert!(matches!(result, Err(GlmnetError::LineSearchFailed)));
    }
}
