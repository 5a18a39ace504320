use nalgebra::{storage::StorageMut, Dyn, IsContiguous, Vector};

use crate::penalty::Penalty;

use super::{function::FitFunction, params::ParamSet};

/// Outcome of one outer iteration of a penalized optimizer.
#[derive(Debug, Clone, Copy)]
pub struct IterOutcome<T> {
    /// Total objective `f(x) + P(x)` at the accepted point.
    pub objective: T,
    /// Step size that was accepted (`1/L` for the proximal-gradient method,
    /// the Armijo step length `s` for coordinate descent).
    pub step_size: T,
    /// Number of inner iterations performed (0 for the proximal-gradient
    /// method).
    pub inner_iters: usize,
    /// Number of positive-definiteness fallbacks triggered in coordinate
    /// subproblems during this iteration.
    pub pd_fallbacks: usize,
}

/// Common interface for all penalized optimizers.
///
/// All optimizers implement a common interface defined by the
/// [`PenalizedOptimizer`] trait. The essential method is
/// [`opt_next`](PenalizedOptimizer::opt_next) which takes the parameters *x*
/// and computes the next step of the minimization of `f(x) + P(x)`. Thus it
/// represents one outer iteration in the process. Repeated calls to this
/// method should move *x* towards the minimizer in successful cases.
///
/// The stopping criteria, the iteration caps and the assembly of the final
/// [report](crate::driver::FitReport) are the concern of the
/// [driver](crate::driver::FitDriver); an optimizer only needs to know how to
/// take one step.
pub trait PenalizedOptimizer<F: FitFunction> {
    /// Name of the optimizer.
    const NAME: &'static str;

    /// Error type of the iteration. Represents an invalid operation during
    /// computing the next step, such as a failed line search or a coordinate
    /// subproblem without a finite minimizer.
    type Error;

    /// Computes the next step in the optimization process.
    ///
    /// The value of `x` is the current values of the parameters. After the
    /// method returns, `x` should hold the parameter values of the performed
    /// step and the returned outcome *must* carry the total objective
    /// `f(x) + P(x)` of that step.
    ///
    /// The implementations *can* assume that subsequent calls to `opt_next`
    /// pass the value of `x` as was outputted in the previous iteration by
    /// the same method, and that `penalty` has been
    /// [validated](crate::penalty::Penalty::validate) against the dimension
    /// of the problem.
    fn opt_next<Sx>(
        &mut self,
        f: &F,
        params: &ParamSet,
        penalty: &Penalty<F::Field>,
        x: &mut Vector<F::Field, Dyn, Sx>,
    ) -> Result<IterOutcome<F::Field>, Self::Error>
    where
        Sx: StorageMut<F::Field, Dyn> + IsContiguous;
}
