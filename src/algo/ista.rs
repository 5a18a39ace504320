//! Proximal-gradient (iterative shrinkage-thresholding) optimization method.
//!
//! [ISTA](https://en.wikipedia.org/wiki/Proximal_gradient_method) minimizes
//! `f(x) + P(x)` by alternating gradient steps on the smooth part (the fit
//! function plus the smooth component of the penalty) with the proximal
//! operator of the non-smooth component. The step length is the inverse of a
//! Lipschitz estimate `L` controlled by a backtracking line search; the line
//! search can be monotone or non-monotone, in which case the
//! sufficient-decrease inequality compares against the maximum objective over
//! a trailing window.
//!
//! This method works for every penalty in the catalogue and is the more
//! robust choice for the non-convex ones.
//!
//! # References
//!
//! \[1\] [A Fast Iterative Shrinkage-Thresholding Algorithm for Linear
//! Inverse Problems](https://doi.org/10.1137/080716542)
//!
//! \[2\] [A General Iterative Shrinkage and Thresholding Algorithm for
//! Non-convex Regularized Optimization Problems](https://arxiv.org/abs/1303.4434)
//!
//! \[3\] [Proximal Algorithms](https://doi.org/10.1561/2400000003)

use std::collections::VecDeque;

use getset::{CopyGetters, Setters};
use log::debug;
use nalgebra::{
    convert, storage::StorageMut, ComplexField, DimName, Dyn, IsContiguous, OVector, RealField,
    Vector, U1,
};
use num_traits::{One, Zero};
use thiserror::Error;

use crate::core::{FitFunction, IterOutcome, ParamSet, PenalizedOptimizer, Problem};
use crate::penalty::Penalty;

/// Line-search variant of the proximal-gradient method.
#[derive(Debug, Clone, Copy)]
pub enum LineSearch {
    /// Accept a step only if it satisfies the sufficient-decrease inequality
    /// against the current objective. The objective sequence is
    /// non-increasing.
    Monotone,
    /// Accept a step if it satisfies the inequality against the maximum
    /// objective over a trailing window of the given width. Useful for
    /// non-convex penalties where strict descent can stall in poor local
    /// structure.
    NonMonotone(usize),
}

impl LineSearch {
    fn window(self) -> usize {
        match self {
            LineSearch::Monotone => 1,
            LineSearch::NonMonotone(window) => window.max(1),
        }
    }
}

/// Options for [`Ista`] optimizer.
#[derive(Debug, Clone, CopyGetters, Setters)]
#[getset(get_copy = "pub", set = "pub")]
pub struct IstaOptions<P: Problem> {
    /// Initial Lipschitz estimate (inverse step length). Default: `0.1`.
    l_init: P::Field,
    /// Lower bound for the Lipschitz estimate. Default: `1e-10`.
    l_min: P::Field,
    /// Upper bound for the Lipschitz estimate; the line search fails when it
    /// saturates without acceptance. Default: `1e10`.
    l_max: P::Field,
    /// Multiplier applied to the estimate when a step is rejected. Default:
    /// `2`.
    backtrack: P::Field,
    /// Factor applied to the estimate after an accepted step. Default:
    /// `0.9`.
    shrink: P::Field,
    /// Sufficient-decrease constant of the acceptance inequality. Default:
    /// `1e-4`.
    c_armijo: P::Field,
    /// Line search variant. Default: monotone.
    line_search: LineSearch,
}

impl<P: Problem> Default for IstaOptions<P> {
    fn default() -> Self {
        Self {
            l_init: convert(0.1),
            l_min: convert(1e-10),
            l_max: convert(1e10),
            backtrack: convert(2.0),
            shrink: convert(0.9),
            c_armijo: convert(1e-4),
            line_search: LineSearch::Monotone,
        }
    }
}

/// Error returned from [`Ista`] optimizer.
#[derive(Debug, Error)]
pub enum IstaError {
    /// The fit function or penalty returned a non-finite value.
    #[error("fit function returned a non-finite value")]
    FitNonFinite,
    /// The Lipschitz estimate saturated its upper bound without an accepted
    /// step.
    #[error("line search failed to find an acceptable step")]
    LineSearchFailed,
}

/// Proximal-gradient solver.
///
/// See [module](self) documentation for more details.
pub struct Ista<P: Problem> {
    options: IstaOptions<P>,
    l: P::Field,
    history: VecDeque<P::Field>,
    grad: OVector<P::Field, Dyn>,
    trial: OVector<P::Field, Dyn>,
    candidate: OVector<P::Field, Dyn>,
}

impl<P: Problem> Ista<P> {
    /// Initializes the optimizer with default options.
    pub fn new(p: &P, params: &ParamSet) -> Self {
        Self::with_options(p, params, IstaOptions::default())
    }

    /// Initializes the optimizer with given options.
    pub fn with_options(_: &P, params: &ParamSet, options: IstaOptions<P>) -> Self {
        let dim = Dyn(params.dim());
        let window = options.line_search.window();

        Self {
            l: options.l_init,
            options,
            history: VecDeque::with_capacity(window),
            grad: OVector::zeros_generic(dim, U1::name()),
            trial: OVector::zeros_generic(dim, U1::name()),
            candidate: OVector::zeros_generic(dim, U1::name()),
        }
    }

    /// Resets the internal state of the optimizer.
    pub fn reset(&mut self) {
        self.l = self.options.l_init;
        self.history.clear();
    }
}

impl<F: FitFunction> Ista<F> {
    fn next_inner<Sx>(
        &mut self,
        f: &F,
        penalty: &Penalty<F::Field>,
        x: &mut Vector<F::Field, Dyn, Sx>,
    ) -> Result<IterOutcome<F::Field>, IstaError>
    where
        Sx: StorageMut<F::Field, Dyn> + IsContiguous,
    {
        let Self {
            options,
            l,
            history,
            grad,
            trial,
            candidate,
        } = self;

        let zero = F::Field::zero();
        let one = F::Field::one();
        let two: F::Field = convert(2.0);
        let window = options.line_search.window();

        // Gradient of the smooth part: fit plus the smooth penalty component.
        f.gradient(x, grad);
        penalty.add_smooth_gradient(x, grad);

        let fx = f.value(x) + penalty.value(x);
        if !fx.is_finite() || grad.iter().any(|g| !g.is_finite()) {
            return Err(IstaError::FitNonFinite);
        }

        if history.is_empty() {
            history.push_back(fx);
        }
        let reference = history.iter().fold(fx, |acc, v| acc.max(*v));

        let (objective, step_size) = loop {
            let step = one / *l;

            // trial = x - grad / L, candidate = prox of the trial point.
            trial.copy_from(x);
            trial.axpy(-step, grad, one);
            penalty.prox_assign(trial, step, candidate);

            let objective = f.value(candidate) + penalty.value(candidate);
            if !objective.is_finite() {
                return Err(IstaError::FitNonFinite);
            }

            // Sufficient decrease against the window maximum, proportional
            // to the squared step length.
            let mut squared = zero;
            for j in 0..x.len() {
                let d = candidate[j] - x[j];
                squared += d * d;
            }
            let bound = reference - options.c_armijo * *l / two * squared;

            if objective <= bound {
                break (objective, step);
            }

            if *l >= options.l_max {
                return Err(IstaError::LineSearchFailed);
            }
            *l = (*l * options.backtrack).min(options.l_max);
            debug!("step rejected, L = {}", l);
        };

        x.copy_from(candidate);

        // Bounded window of past objectives for the non-monotone search.
        while history.len() >= window {
            history.pop_front();
        }
        history.push_back(objective);

        *l = (*l * options.shrink).max(options.l_min);
        debug!("step accepted, fx = {}, next L = {}", objective, l);

        Ok(IterOutcome {
            objective,
            step_size,
            inner_iters: 0,
            pd_fallbacks: 0,
        })
    }
}

impl<F: FitFunction> PenalizedOptimizer<F> for Ista<F> {
    const NAME: &'static str = "ISTA";

    type Error = IstaError;

    fn opt_next<Sx>(
        &mut self,
        f: &F,
        _params: &ParamSet,
        penalty: &Penalty<F::Field>,
        x: &mut Vector<F::Field, Dyn, Sx>,
    ) -> Result<IterOutcome<F::Field>, Self::Error>
    where
        Sx: StorageMut<F::Field, Dyn> + IsContiguous,
    {
        self.next_inner(f, penalty, x)
    }
}
