#![allow(clippy::many_single_char_names)]
#![allow(clippy::type_complexity)]
#![warn(missing_docs)]

//! # Penalized
//!
//! A pure Rust framework and implementation of penalized (regularized) model
//! estimation.
//!
//! This library minimizes objectives of the form `F(x) = f(x) + P(x)`, where
//! `f` is a smooth fit function supplied by the caller (a regression
//! deviance, a log-likelihood, any twice-differentiable loss) and `P` is a
//! regularization penalty from a fixed [catalogue](penalty). Two optimizer
//! families cooperate with the catalogue and implement the same interface:
//!
//! * [Proximal gradient](algo::ista) (ISTA) -- recommended default; works
//!   for every penalty that has a closed-form proximal operator, which is
//!   all of them, and is the more robust choice for the non-convex
//!   penalties.
//! * [Coordinate descent](algo::glmnet) (glmnet-style) -- inner/outer
//!   iterations on a quadratic model of the fit with exact coordinate-wise
//!   penalty handling; requires a Hessian (or a quasi-Newton approximation)
//!   from the fit function.
//!
//! ## Penalties
//!
//! | Penalty | Tuning | Non-convex |
//! |---|---|---|
//! | [`none`](penalty::Penalty::None) | -- | no |
//! | [lasso](penalty::lasso) | `λ`, weights | no |
//! | [ridge](penalty::ridge) | `λ`, weights | no |
//! | [elastic net](penalty::elastic_net) | `λ`, `α`, weights | no |
//! | [capped L1](penalty::capped_l1) | `λ`, `θ`, weights | yes |
//! | [LSP](penalty::lsp) | `λ`, `θ`, weights | yes |
//! | [MCP](penalty::mcp) | `λ`, `θ`, weights | yes |
//! | [SCAD](penalty::scad) | `λ`, `θ`, weights | yes |
//!
//! A [mixed selection](penalty::Penalty::Mixed) assigns an own penalty,
//! tuning and weight to every parameter.
//!
//! ## Problem
//!
//! A fit function is any type implementing the [`Problem`] and
//! [`FitFunction`] traits (plus [`FitHessian`] for coordinate descent):
//!
//! ```rust
//! use penalized::nalgebra as na;
//! use penalized::{FitFunction, ParamSet, Problem};
//! use na::{Dyn, IsContiguous};
//!
//! struct Residuals {
//!     targets: Vec<f64>,
//! }
//!
//! impl Problem for Residuals {
//!     // The numeric type. Usually f64 or f32.
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
//! ```
//!
//! ## Solving
//!
//! The [`FitDriver`](driver) runs the iterative process until a stopping
//! criterion, the iteration cap or a failure is reached and returns a
//! [`FitReport`] with the minimizer, the fit and penalty values, iteration
//! counts and a [`Status`]:
//!
//! ```rust
//! # use penalized::nalgebra as na;
//! # use penalized::{FitFunction, ParamSet, Penalty, Problem};
//! # use na::{Dyn, IsContiguous};
//! #
//! # struct Residuals {
//! #     targets: Vec<f64>,
//! # }
//! #
//! # impl Problem for Residuals {
//! #     type Field = f64;
//! #
//! #     fn params(&self) -> ParamSet {
//! #         ParamSet::of_dim(self.targets.len())
//! #     }
//! # }
//! #
//! # impl FitFunction for Residuals {
//! #     fn value<Sx>(&self, x: &na::Vector<Self::Field, Dyn, Sx>) -> Self::Field
//! #     where
//! #         Sx: na::storage::Storage<Self::Field, Dyn> + IsContiguous,
//! #     {
//! #         x.iter()
//! #             .zip(self.targets.iter())
//! #             .map(|(xi, ti)| 0.5 * (xi - ti).powi(2))
//! #             .sum()
//! #     }
//! #
//! #     fn gradient<Sx, Sg>(
//! #         &self,
//! #         x: &na::Vector<Self::Field, Dyn, Sx>,
//! #         g: &mut na::Vector<Self::Field, Dyn, Sg>,
//! #     ) where
//! #         Sx: na::storage::Storage<Self::Field, Dyn> + IsContiguous,
//! #         Sg: na::storage::StorageMut<Self::Field, Dyn>,
//! #     {
//! #         for (j, ti) in self.targets.iter().enumerate() {
//! #             g[j] = x[j] - ti;
//! #         }
//! #     }
//! # }
//! use penalized::FitDriver;
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
//! assert!(report.is_success());
//! ```
//!
//! Diagnostics are routed through an injected
//! [observer](diagnostics::Observer); the core holds no global mutable state
//! and, given identical inputs, produces identical outputs.
//!
//! ## License
//!
//! Licensed under MIT.

pub mod algo;
mod core;
pub mod diagnostics;
pub mod driver;
pub mod penalty;

pub use core::*;
pub use driver::{Control, Criterion, FitBuilder, FitDriver, FitReport, Status};
pub use penalty::{Penalty, PenaltyKind};

#[cfg(feature = "testing")]
pub mod testing;

#[cfg(not(feature = "testing"))]
pub(crate) mod testing;

pub use nalgebra;
