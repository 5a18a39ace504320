//! High-level API for penalized estimation.
//!
//! The [`FitDriver`] encapsulates the outer iteration loop: it owns the
//! parameter vector, invokes the [optimizer](crate::core::PenalizedOptimizer)
//! step by step, checks the selected convergence criterion and the iteration
//! cap, routes [diagnostics](crate::diagnostics) and assembles the final
//! [`FitReport`]. Tuning parameters are validated when the driver is
//! [built](FitBuilder::build); every later failure returns the best point
//! found so far together with a [`Status`] describing what happened.
//!
//! The simplest way of using the driver is to initialize it with the
//! defaults (the proximal-gradient optimizer starting from zero):
//!
//! ```rust
//! use penalized::nalgebra as na;
//! use penalized::{FitDriver, FitFunction, ParamSet, Penalty, Problem, Status};
//! use na::{Dyn, IsContiguous};
//!
//! struct Residuals {
//!     targets: Vec<f64>,
//! }
//!
//! impl Problem for Residuals {
//!     type Field = f64;
//!
//!     fn params(&self) -> ParamSet {
//!         ParamSet::of_dim(self.targets.len())
//!     }
//! }
//!
//! impl FitFunction for Residuals {
//!     fn value<Sx>(&self, x: &na::Vector<Self::Field, Dyn, Sx>) -> Self::Field
//!     where
//!         Sx: na::storage::Storage<Self::Field, Dyn> + IsContiguous,
//!     {
//!         x.iter()
//!             .zip(self.targets.iter())
//!             .map(|(xi, ti)| 0.5 * (xi - ti).powi(2))
//!             .sum()
//!     }
//!
//!     fn gradient<Sx, Sg>(
//!         &self,
//!         x: &na::Vector<Self::Field, Dyn, Sx>,
//!         g: &mut na::Vector<Self::Field, Dyn, Sg>,
//!     ) where
//!         Sx: na::storage::Storage<Self::Field, Dyn> + IsContiguous,
//!         Sg: na::storage::StorageMut<Self::Field, Dyn>,
//!     {
//!         for (j, ti) in self.targets.iter().enumerate() {
//!             g[j] = x[j] - ti;
//!         }
//!     }
//! }
//!
//! let f = Residuals {
//!     targets: vec![1.0, 0.2, -0.5],
//! };
//!
//! let report = FitDriver::builder(&f)
//!     .with_penalty(Penalty::lasso(0.3, vec![1.0, 1.0, 1.0]))
//!     .build()
//!     .expect("invalid tuning")
//!     .run();
//!
//! assert_eq!(report.status, Status::Converged);
//! ```
//!
//! The coordinate-descent optimizer and any non-default options go through
//! the builder as well:
//!
//! ```rust,ignore
//! let report = FitDriver::builder(&f)
//!     .with_penalty(penalty)
//!     .with_initial(vec![0.0; 3])
//!     .with_algo(penalized::algo::Glmnet::new)
//!     .with_control(control)
//!     .build()?
//!     .run();
//! ```

use std::fmt;

use getset::{CopyGetters, Setters};
use log::warn;
use nalgebra::{convert, ComplexField, DimName, Dyn, OVector, Scalar, U1};

use crate::algo::{
    glmnet::GlmnetError,
    ista::{Ista, IstaError},
};
use crate::core::{FitFunction, ParamSet, PenalizedOptimizer, Problem};
use crate::diagnostics::{Event, Level, Observer};
use crate::penalty::{Penalty, TuningError};

/// Convergence criterion checked after every outer iteration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Criterion {
    /// Stop when the stationarity measure of the penalized objective (see
    /// [`Penalty::stationarity`]) falls below `tol_grad`. Works for every
    /// penalty in the catalogue.
    GradientNorm,
    /// Stop when the change of the objective between consecutive outer
    /// iterations falls below `tol_obj`.
    ObjectiveChange,
}

/// Options shared by both optimizers and enforced by the driver.
#[derive(Debug, Clone, CopyGetters, Setters)]
#[getset(get_copy = "pub", set = "pub")]
pub struct Control<P: Problem> {
    /// Outer iteration cap. Default: `1000`.
    max_outer: usize,
    /// Threshold of the gradient-based criterion. Default: `1e-8`.
    tol_grad: P::Field,
    /// Threshold of the objective-change criterion. Default: `1e-10`.
    tol_obj: P::Field,
    /// The convergence criterion. Default: gradient-based.
    criterion: Criterion,
}

impl<P: Problem> Default for Control<P> {
    fn default() -> Self {
        Self {
            max_outer: 1000,
            tol_grad: convert(1e-8),
            tol_obj: convert(1e-10),
            criterion: Criterion::GradientNorm,
        }
    }
}

/// Final state of an optimization run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    /// The selected convergence criterion is satisfied.
    Converged,
    /// The iteration cap (or a cooperative abort) stopped the run; the best
    /// point found so far is returned. A warning, not an error.
    MaxIters,
    /// A line search exhausted its step sizes; the best point found so far
    /// is returned.
    LineSearchFailed,
    /// The fit function returned NaN or infinity; the best point found so
    /// far is returned.
    FitNonFinite,
    /// A coordinate subproblem had no finite minimizer; the best point found
    /// so far is returned.
    SubproblemNoMinimum,
    /// The run converged, but the positive-definiteness fallback was
    /// triggered along the way. A warning; treat the result with care.
    NotPosDef,
}

impl Status {
    /// Whether the run ended in a usable minimizer (possibly with
    /// warnings).
    pub fn is_success(&self) -> bool {
        matches!(self, Status::Converged | Status::NotPosDef)
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Status::Converged => "converged",
            Status::MaxIters => "maximum iterations reached",
            Status::LineSearchFailed => "line search failed",
            Status::FitNonFinite => "fit function not finite",
            Status::SubproblemNoMinimum => "subproblem without finite minimum",
            Status::NotPosDef => "converged with positive-definiteness fallback",
        };
        f.write_str(name)
    }
}

impl From<IstaError> for Status {
    fn from(error: IstaError) -> Self {
        match error {
            IstaError::FitNonFinite => Status::FitNonFinite,
            IstaError::LineSearchFailed => Status::LineSearchFailed,
        }
    }
}

impl From<GlmnetError> for Status {
    fn from(error: GlmnetError) -> Self {
        match error {
            GlmnetError::FitNonFinite => Status::FitNonFinite,
            GlmnetError::LineSearchFailed => Status::LineSearchFailed,
            GlmnetError::SubproblemNoMinimum => Status::SubproblemNoMinimum,
        }
    }
}

/// Result of an optimization run.
#[derive(Debug, Clone)]
pub struct FitReport<T: Scalar> {
    /// The final parameter values (the best point found so far on abort
    /// paths).
    pub x: OVector<T, Dyn>,
    /// Fit value `f(x)` in the final point.
    pub f_value: T,
    /// Penalty value `P(x)` in the final point.
    pub p_value: T,
    /// Number of outer iterations performed.
    pub iters_outer: usize,
    /// Total number of inner iterations performed (0 for the
    /// proximal-gradient optimizer).
    pub iters_inner: usize,
    /// Number of positive-definiteness fallbacks triggered in coordinate
    /// subproblems.
    pub pd_fallbacks: usize,
    /// Final state of the run.
    pub status: Status,
    /// Human-readable explanation of the final state.
    pub message: String,
}

impl<T: Scalar> FitReport<T> {
    /// Whether the run ended in a usable minimizer.
    pub fn is_success(&self) -> bool {
        self.status.is_success()
    }
}

/// Builder for the [`FitDriver`].
pub struct FitBuilder<'a, F: Problem, A> {
    f: &'a F,
    params: ParamSet,
    penalty: Penalty<F::Field>,
    algo: A,
    x0: OVector<F::Field, Dyn>,
    control: Control<F>,
    observer: Option<&'a mut dyn Observer<F::Field>>,
}

impl<'a, F: Problem> FitBuilder<'a, F, Ista<F>> {
    fn new(f: &'a F) -> Self {
        let params = f.params();
        let algo = Ista::new(f, &params);

        let dim = Dyn(params.dim());
        let x0 = OVector::from_element_generic(dim, U1::name(), convert(0.0));

        Self {
            f,
            params,
            penalty: Penalty::None,
            algo,
            x0,
            control: Control::default(),
            observer: None,
        }
    }
}

impl<'a, F: Problem, A> FitBuilder<'a, F, A> {
    /// Sets the initial point from which the iterative process starts.
    /// Default: zeros.
    ///
    /// # Panics
    ///
    /// Panics if the length does not match the number of parameters.
    pub fn with_initial(mut self, x0: Vec<F::Field>) -> Self {
        assert_eq!(x0.len(), self.params.dim(), "initial point length mismatch");
        let dim = Dyn(self.params.dim());
        self.x0 = OVector::from_vec_generic(dim, U1::name(), x0);
        self
    }

    /// Sets the penalty selection. Default: [`Penalty::None`].
    pub fn with_penalty(mut self, penalty: Penalty<F::Field>) -> Self {
        self.penalty = penalty;
        self
    }

    /// Sets specific optimizer to be used.
    ///
    /// This builder method accepts a closure that takes the reference to the
    /// fit function and the parameter set. For the optimizers in this crate,
    /// you can simply pass the `new` constructor directly (e.g.,
    /// [`Glmnet::new`](crate::algo::Glmnet::new)) or a closure calling
    /// `with_options`.
    pub fn with_algo<A2, FA>(self, factory: FA) -> FitBuilder<'a, F, A2>
    where
        FA: FnOnce(&F, &ParamSet) -> A2,
    {
        let algo = factory(self.f, &self.params);

        FitBuilder {
            f: self.f,
            params: self.params,
            penalty: self.penalty,
            algo,
            x0: self.x0,
            control: self.control,
            observer: self.observer,
        }
    }

    /// Sets the shared control options.
    pub fn with_control(mut self, control: Control<F>) -> Self {
        self.control = control;
        self
    }

    /// Injects a sink for the structured diagnostic events.
    pub fn with_observer(mut self, observer: &'a mut dyn Observer<F::Field>) -> Self {
        self.observer = Some(observer);
        self
    }

    /// Validates the tuning parameters and builds the [`FitDriver`].
    pub fn build(self) -> Result<FitDriver<'a, F, A>, TuningError> {
        self.penalty.validate(self.params.dim())?;

        Ok(FitDriver {
            f: self.f,
            params: self.params,
            penalty: self.penalty,
            algo: self.algo,
            x: self.x0,
            control: self.control,
            observer: self.observer,
        })
    }
}

/// The driver for the process of minimizing a penalized fit function.
///
/// For default settings, use [`FitDriver::builder`] directly followed by
/// [`build`](FitBuilder::build). For the usage of the driver, see
/// [module](self) documentation.
pub struct FitDriver<'a, F: Problem, A> {
    f: &'a F,
    params: ParamSet,
    penalty: Penalty<F::Field>,
    algo: A,
    x: OVector<F::Field, Dyn>,
    control: Control<F>,
    observer: Option<&'a mut dyn Observer<F::Field>>,
}

impl<'a, F: Problem> FitDriver<'a, F, Ista<F>> {
    /// Returns the builder for specifying the penalty, the optimizer and
    /// additional settings.
    pub fn builder(f: &'a F) -> FitBuilder<'a, F, Ista<F>> {
        FitBuilder::new(f)
    }
}

impl<'a, F: Problem, A> FitDriver<'a, F, A> {
    /// Returns reference to the current point.
    pub fn x(&self) -> &[F::Field] {
        self.x.as_slice()
    }

    /// Returns the parameter set of the problem.
    pub fn params(&self) -> &ParamSet {
        &self.params
    }
}

impl<'a, F: FitFunction, A> FitDriver<'a, F, A>
where
    A: PenalizedOptimizer<F>,
    A::Error: Into<Status> + fmt::Display,
{
    /// Runs the iterative process until the selected stopping criterion, the
    /// iteration cap or a failure is reached.
    pub fn run(&mut self) -> FitReport<F::Field> {
        let dim = Dyn(self.params.dim());
        let mut grad = OVector::zeros_generic(dim, U1::name());

        let mut objective = self.f.value(&self.x) + self.penalty.value(&self.x);
        if !objective.is_finite() {
            return self.report(
                Status::FitNonFinite,
                "fit function is not finite in the initial point".to_string(),
                0,
                0,
                0,
            );
        }

        let mut best_x = self.x.clone_owned();
        let mut best_objective = objective;

        let mut iters_outer = 0;
        let mut iters_inner = 0;
        let mut pd_fallbacks = 0;
        let mut status = Status::MaxIters;
        let mut message = format!(
            "maximum number of outer iterations ({}) reached",
            self.control.max_outer()
        );

        for iter in 1..=self.control.max_outer() {
            match self
                .algo
                .opt_next(self.f, &self.params, &self.penalty, &mut self.x)
            {
                Ok(outcome) => {
                    iters_outer = iter;
                    iters_inner += outcome.inner_iters;
                    pd_fallbacks += outcome.pd_fallbacks;

                    self.f.gradient(&self.x, &mut grad);
                    let stationarity = self.penalty.stationarity(&self.x, &grad);

                    if let Some(observer) = self.observer.as_deref_mut() {
                        observer.observe(&Event {
                            level: Level::Info,
                            iter,
                            objective: outcome.objective,
                            grad_norm: stationarity,
                            step_size: outcome.step_size,
                            note: None,
                        });
                        if outcome.pd_fallbacks > 0 {
                            observer.observe(&Event {
                                level: Level::Warning,
                                iter,
                                objective: outcome.objective,
                                grad_norm: stationarity,
                                step_size: outcome.step_size,
                                note: Some(
                                    "positive-definiteness fallback in coordinate subproblems"
                                        .to_string(),
                                ),
                            });
                        }
                    }

                    if outcome.objective < best_objective {
                        best_objective = outcome.objective;
                        best_x.copy_from(&self.x);
                    }

                    let previous = objective;
                    objective = outcome.objective;

                    let converged = match self.control.criterion() {
                        Criterion::GradientNorm => stationarity < self.control.tol_grad(),
                        Criterion::ObjectiveChange => {
                            (previous - objective).abs() < self.control.tol_obj()
                        }
                    };

                    if converged {
                        if pd_fallbacks > 0 {
                            status = Status::NotPosDef;
                            message = format!(
                                "converged, but the positive-definiteness fallback was \
                                 triggered {} time(s)",
                                pd_fallbacks
                            );
                        } else {
                            status = Status::Converged;
                            message = match self.control.criterion() {
                                Criterion::GradientNorm => {
                                    "stationarity below tolerance".to_string()
                                }
                                Criterion::ObjectiveChange => {
                                    "objective change below tolerance".to_string()
                                }
                            };
                        }
                        break;
                    }

                    let abort = self
                        .observer
                        .as_ref()
                        .map_or(false, |observer| observer.should_abort());
                    if abort {
                        message = "aborted by the caller".to_string();
                        break;
                    }
                }
                Err(error) => {
                    iters_outer = iter;
                    message = error.to_string();
                    status = error.into();
                    break;
                }
            }
        }

        if !status.is_success() {
            // Abort paths return the best point found so far.
            warn!("{}", message);
            self.x.copy_from(&best_x);
        }

        self.report(status, message, iters_outer, iters_inner, pd_fallbacks)
    }

    fn report(
        &self,
        status: Status,
        message: String,
        iters_outer: usize,
        iters_inner: usize,
        pd_fallbacks: usize,
    ) -> FitReport<F::Field> {
        FitReport {
            x: self.x.clone_owned(),
            f_value: self.f.value(&self.x),
            p_value: self.penalty.value(&self.x),
            iters_outer,
            iters_inner,
            pd_fallbacks,
            status,
            message,
        }
    }
}
