//! The catalogue of regularization penalties.
//!
//! A [`Penalty`] describes the term `P(x)` of the objective
//! `F(x) = f(x) + P(x)` minimized by the [optimizers](crate::algo). Every
//! penalty is coordinate-separable and immutable during an optimization run;
//! the optimizers consume the operations exposed here ([value](Penalty::value),
//! [smooth gradient](Penalty::add_smooth_gradient),
//! [proximal operator](Penalty::prox_assign),
//! [coordinate step](Penalty::coord_z) and
//! [stationarity](Penalty::stationarity)) and never the concrete kind.
//!
//! The catalogue contains the convex penalties [lasso], [ridge] and their
//! combination [elastic net](elastic_net), and the non-convex folded
//! penalties [capped-L1](capped_l1), [LSP](lsp), [MCP](mcp) and [SCAD](scad)
//! which reduce the bias of the lasso by flattening at large magnitudes. A
//! [mixed selection](Penalty::Mixed) assigns an own penalty, tuning and
//! weight to every parameter.

pub mod capped_l1;
pub mod elastic_net;
pub mod lasso;
pub mod lsp;
pub mod mcp;
pub mod ridge;
pub mod scad;

use std::fmt;
use std::str::FromStr;

use nalgebra::{
    convert,
    storage::{Storage, StorageMut},
    Dyn, IsContiguous, RealField, Vector,
};

use thiserror::Error;

/// Identifier of a penalty family.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PenaltyKind {
    /// No regularization.
    None,
    /// L1 penalty `λ·|x|`.
    Lasso,
    /// L2 penalty `λ·x²`.
    Ridge,
    /// Convex combination `αλ·|x| + (1−α)λ·x²`.
    ElasticNet,
    /// Capped L1 penalty `λ·min(|x|, θ)`.
    CappedL1,
    /// Log-sum penalty `λ·log(1 + |x|/θ)`.
    Lsp,
    /// Minimax concave penalty.
    Mcp,
    /// Smoothly clipped absolute deviation penalty.
    Scad,
}

impl fmt::Display for PenaltyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            PenaltyKind::None => "none",
            PenaltyKind::Lasso => "lasso",
            PenaltyKind::Ridge => "ridge",
            PenaltyKind::ElasticNet => "elastic_net",
            PenaltyKind::CappedL1 => "capped_l1",
            PenaltyKind::Lsp => "lsp",
            PenaltyKind::Mcp => "mcp",
            PenaltyKind::Scad => "scad",
        };
        f.write_str(name)
    }
}

impl FromStr for PenaltyKind {
    type Err = TuningError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "none" => Ok(PenaltyKind::None),
            "lasso" => Ok(PenaltyKind::Lasso),
            "ridge" => Ok(PenaltyKind::Ridge),
            "elastic_net" | "elasticnet" | "enet" => Ok(PenaltyKind::ElasticNet),
            "capped_l1" | "cappedl1" => Ok(PenaltyKind::CappedL1),
            "lsp" => Ok(PenaltyKind::Lsp),
            "mcp" => Ok(PenaltyKind::Mcp),
            "scad" => Ok(PenaltyKind::Scad),
            _ => Err(TuningError::UnknownPenalty {
                name: s.to_string(),
            }),
        }
    }
}

/// Error returned when tuning parameters are invalid.
///
/// Tuning is validated before the first iteration (at
/// [driver build time](crate::driver::FitBuilder::build)); no partial result
/// exists when this error is raised.
#[derive(Debug, Error, PartialEq)]
pub enum TuningError {
    /// The string does not name a supported penalty.
    #[error(
        "unknown penalty type: {name} \
         (supported are: none, lasso, ridge, elastic_net, capped_l1, lsp, mcp, scad)"
    )]
    UnknownPenalty {
        /// The offending name.
        name: String,
    },
    /// Lambda is negative.
    #[error("lambda must be non-negative")]
    NegativeLambda,
    /// Alpha lies outside `[0, 1]`.
    #[error("alpha must lie in [0, 1]")]
    AlphaOutOfRange,
    /// Theta violates its per-family lower bound.
    #[error("theta of {kind} must be greater than {min}")]
    ThetaOutOfRange {
        /// Family whose bound is violated.
        kind: PenaltyKind,
        /// The (exclusive) lower bound.
        min: f64,
    },
    /// A parameter weight is negative.
    #[error("weights must be non-negative")]
    NegativeWeight,
    /// The weight vector matches neither the number of parameters nor length
    /// one.
    #[error("expected {expected} weights (or a single broadcast weight), found {found}")]
    WeightsLength {
        /// Number of parameters.
        expected: usize,
        /// Length of the supplied vector.
        found: usize,
    },
    /// A mixed penalty does not provide one row per parameter.
    #[error("expected {expected} per-parameter penalties, found {found}")]
    RowsLength {
        /// Number of parameters.
        expected: usize,
        /// Number of supplied rows.
        found: usize,
    },
}

/// Error returned when a coordinate subproblem has no finite minimizer.
#[derive(Debug, Clone, Copy, Error)]
#[error("coordinate subproblem has no finite minimizer")]
pub struct SubproblemError;

/// Tuning parameters of the [lasso] penalty.
#[derive(Debug, Clone)]
pub struct LassoTuning<T> {
    /// Regularization strength, `λ >= 0`.
    pub lambda: T,
    /// Per-parameter weights `w_j >= 0` (e.g., for adaptive lasso). A
    /// length-one vector broadcasts to all parameters; a zero weight leaves
    /// the parameter unpenalized.
    pub weights: Vec<T>,
}

/// Tuning parameters of the [ridge] penalty.
#[derive(Debug, Clone)]
pub struct RidgeTuning<T> {
    /// Regularization strength, `λ >= 0`.
    pub lambda: T,
    /// Per-parameter weights, as in [`LassoTuning`].
    pub weights: Vec<T>,
}

/// Tuning parameters of the [elastic net](elastic_net) penalty.
#[derive(Debug, Clone)]
pub struct ElasticNetTuning<T> {
    /// Regularization strength, `λ >= 0`.
    pub lambda: T,
    /// Mixing parameter, `α ∈ [0, 1]`; `1` is pure lasso, `0` pure ridge.
    pub alpha: T,
    /// Per-parameter weights, as in [`LassoTuning`].
    pub weights: Vec<T>,
}

/// Tuning parameters shared by the folded penalties ([capped-L1](capped_l1),
/// [LSP](lsp), [MCP](mcp), [SCAD](scad)).
#[derive(Debug, Clone)]
pub struct FoldedTuning<T> {
    /// Regularization strength, `λ >= 0`.
    pub lambda: T,
    /// Shape parameter; the lower bound depends on the family (`θ > 0` for
    /// capped-L1 and LSP, `θ > 1` for MCP, `θ > 2` for SCAD).
    pub theta: T,
    /// Per-parameter weights, as in [`LassoTuning`].
    pub weights: Vec<T>,
}

/// Penalty assignment for a single parameter of a [mixed](Penalty::Mixed)
/// selection.
#[derive(Debug, Clone, Copy)]
pub struct ParamPenalty<T> {
    /// Penalty family applied to this parameter.
    pub kind: PenaltyKind,
    /// Regularization strength.
    pub lambda: T,
    /// Mixing parameter (elastic net only).
    pub alpha: T,
    /// Shape parameter (folded penalties only).
    pub theta: T,
    /// Parameter weight; zero leaves the parameter unpenalized.
    pub weight: T,
}

impl<T: RealField + Copy> ParamPenalty<T> {
    fn with_kind(kind: PenaltyKind, lambda: T, alpha: T, theta: T) -> Self {
        Self {
            kind,
            lambda,
            alpha,
            theta,
            weight: T::one(),
        }
    }

    /// An unpenalized parameter.
    pub fn none() -> Self {
        Self::with_kind(PenaltyKind::None, T::zero(), T::one(), T::one())
    }

    /// A lasso-penalized parameter.
    pub fn lasso(lambda: T) -> Self {
        Self::with_kind(PenaltyKind::Lasso, lambda, T::one(), T::one())
    }

    /// A ridge-penalized parameter.
    pub fn ridge(lambda: T) -> Self {
        Self::with_kind(PenaltyKind::Ridge, lambda, T::one(), T::one())
    }

    /// An elastic-net-penalized parameter. Per-parameter `λ` and `α` give
    /// the per-parameter variant of the elastic net.
    pub fn elastic_net(lambda: T, alpha: T) -> Self {
        Self::with_kind(PenaltyKind::ElasticNet, lambda, alpha, T::one())
    }

    /// A capped-L1-penalized parameter.
    pub fn capped_l1(lambda: T, theta: T) -> Self {
        Self::with_kind(PenaltyKind::CappedL1, lambda, T::one(), theta)
    }

    /// An LSP-penalized parameter.
    pub fn lsp(lambda: T, theta: T) -> Self {
        Self::with_kind(PenaltyKind::Lsp, lambda, T::one(), theta)
    }

    /// An MCP-penalized parameter.
    pub fn mcp(lambda: T, theta: T) -> Self {
        Self::with_kind(PenaltyKind::Mcp, lambda, T::one(), theta)
    }

    /// A SCAD-penalized parameter.
    pub fn scad(lambda: T, theta: T) -> Self {
        Self::with_kind(PenaltyKind::Scad, lambda, T::one(), theta)
    }

    /// Replaces the parameter weight.
    pub fn with_weight(mut self, weight: T) -> Self {
        self.weight = weight;
        self
    }
}

/// A penalty selection: one penalty family with its tuning parameters, or a
/// per-parameter mixture.
///
/// See the [module](self) documentation for the catalogue.
#[derive(Debug, Clone)]
pub enum Penalty<T> {
    /// No regularization; the optimizers minimize the plain fit function.
    None,
    /// Lasso penalty.
    Lasso(LassoTuning<T>),
    /// Ridge penalty.
    Ridge(RidgeTuning<T>),
    /// Elastic-net penalty.
    ElasticNet(ElasticNetTuning<T>),
    /// Capped-L1 penalty.
    CappedL1(FoldedTuning<T>),
    /// Log-sum penalty.
    Lsp(FoldedTuning<T>),
    /// Minimax concave penalty.
    Mcp(FoldedTuning<T>),
    /// Smoothly clipped absolute deviation penalty.
    Scad(FoldedTuning<T>),
    /// Per-parameter mixture of penalties, one row per parameter.
    Mixed(Vec<ParamPenalty<T>>),
}

/// Outcome of one coordinate subproblem.
#[derive(Debug, Clone, Copy)]
pub struct CoordStep<T> {
    /// The computed step direction for the coordinate.
    pub z: T,
    /// Whether the positive-definiteness fallback inflated the Hessian
    /// diagonal to make the subproblem convex.
    pub pd_fallback: bool,
}

/// Per-coordinate view of a penalty with the weight already applied.
#[derive(Debug, Clone, Copy)]
struct CoordPen<T> {
    kind: PenaltyKind,
    lambda: T,
    alpha: T,
    theta: T,
}

impl<T: RealField + Copy> CoordPen<T> {
    fn none() -> Self {
        Self {
            kind: PenaltyKind::None,
            lambda: T::zero(),
            alpha: T::one(),
            theta: T::one(),
        }
    }
}

fn weight_at<T: Copy>(weights: &[T], j: usize) -> T {
    if weights.len() == 1 {
        weights[0]
    } else {
        weights[j]
    }
}

fn validate_weights<T: RealField + Copy>(weights: &[T], dim: usize) -> Result<(), TuningError> {
    if weights.len() != dim && weights.len() != 1 {
        return Err(TuningError::WeightsLength {
            expected: dim,
            found: weights.len(),
        });
    }
    if weights.iter().any(|w| *w < T::zero()) {
        return Err(TuningError::NegativeWeight);
    }
    Ok(())
}

fn validate_theta<T: RealField + Copy>(kind: PenaltyKind, theta: T) -> Result<(), TuningError> {
    let min = match kind {
        PenaltyKind::CappedL1 | PenaltyKind::Lsp => 0.0,
        PenaltyKind::Mcp => 1.0,
        PenaltyKind::Scad => 2.0,
        _ => return Ok(()),
    };
    if theta <= convert(min) {
        Err(TuningError::ThetaOutOfRange { kind, min })
    } else {
        Ok(())
    }
}

impl<T: RealField + Copy> Penalty<T> {
    /// No regularization.
    pub fn none() -> Self {
        Penalty::None
    }

    /// Lasso penalty with strength `lambda` and per-parameter `weights`.
    pub fn lasso(lambda: T, weights: Vec<T>) -> Self {
        Penalty::Lasso(LassoTuning { lambda, weights })
    }

    /// Ridge penalty with strength `lambda` and per-parameter `weights`.
    pub fn ridge(lambda: T, weights: Vec<T>) -> Self {
        Penalty::Ridge(RidgeTuning { lambda, weights })
    }

    /// Elastic-net penalty with strength `lambda`, mixing `alpha` and
    /// per-parameter `weights`.
    pub fn elastic_net(lambda: T, alpha: T, weights: Vec<T>) -> Self {
        Penalty::ElasticNet(ElasticNetTuning {
            lambda,
            alpha,
            weights,
        })
    }

    /// Capped-L1 penalty with strength `lambda`, cap `theta` and
    /// per-parameter `weights`.
    pub fn capped_l1(lambda: T, theta: T, weights: Vec<T>) -> Self {
        Penalty::CappedL1(FoldedTuning {
            lambda,
            theta,
            weights,
        })
    }

    /// LSP penalty with strength `lambda`, shape `theta` and per-parameter
    /// `weights`.
    pub fn lsp(lambda: T, theta: T, weights: Vec<T>) -> Self {
        Penalty::Lsp(FoldedTuning {
            lambda,
            theta,
            weights,
        })
    }

    /// MCP with strength `lambda`, shape `theta` and per-parameter `weights`.
    pub fn mcp(lambda: T, theta: T, weights: Vec<T>) -> Self {
        Penalty::Mcp(FoldedTuning {
            lambda,
            theta,
            weights,
        })
    }

    /// SCAD penalty with strength `lambda`, shape `theta` and per-parameter
    /// `weights`.
    pub fn scad(lambda: T, theta: T, weights: Vec<T>) -> Self {
        Penalty::Scad(FoldedTuning {
            lambda,
            theta,
            weights,
        })
    }

    /// Per-parameter mixture, one [`ParamPenalty`] row per parameter.
    pub fn mixed(rows: Vec<ParamPenalty<T>>) -> Self {
        Penalty::Mixed(rows)
    }

    /// Name of the penalty selection, for diagnostics.
    pub fn name(&self) -> &'static str {
        match self {
            Penalty::None => "none",
            Penalty::Lasso(_) => "lasso",
            Penalty::Ridge(_) => "ridge",
            Penalty::ElasticNet(_) => "elastic_net",
            Penalty::CappedL1(_) => "capped_l1",
            Penalty::Lsp(_) => "lsp",
            Penalty::Mcp(_) => "mcp",
            Penalty::Scad(_) => "scad",
            Penalty::Mixed(_) => "mixed",
        }
    }

    /// Checks the tuning parameters against their invariants (`λ >= 0`,
    /// `α ∈ [0, 1]`, the per-family `θ` bound, non-negative weights of
    /// matching length) for a problem with `dim` parameters.
    pub fn validate(&self, dim: usize) -> Result<(), TuningError> {
        let zero = T::zero();
        let one = T::one();

        let check_lambda = |lambda: T| {
            if lambda < zero {
                Err(TuningError::NegativeLambda)
            } else {
                Ok(())
            }
        };

        match self {
            Penalty::None => Ok(()),
            Penalty::Lasso(LassoTuning { lambda, weights })
            | Penalty::Ridge(RidgeTuning { lambda, weights }) => {
                check_lambda(*lambda)?;
                validate_weights(weights, dim)
            }
            Penalty::ElasticNet(ElasticNetTuning {
                lambda,
                alpha,
                weights,
            }) => {
                check_lambda(*lambda)?;
                if *alpha < zero || *alpha > one {
                    return Err(TuningError::AlphaOutOfRange);
                }
                validate_weights(weights, dim)
            }
            Penalty::CappedL1(tuning)
            | Penalty::Lsp(tuning)
            | Penalty::Mcp(tuning)
            | Penalty::Scad(tuning) => {
                check_lambda(tuning.lambda)?;
                validate_theta(self.kind_of_folded(), tuning.theta)?;
                validate_weights(&tuning.weights, dim)
            }
            Penalty::Mixed(rows) => {
                if rows.len() != dim {
                    return Err(TuningError::RowsLength {
                        expected: dim,
                        found: rows.len(),
                    });
                }
                for row in rows {
                    check_lambda(row.lambda)?;
                    if row.weight < zero {
                        return Err(TuningError::NegativeWeight);
                    }
                    if row.kind == PenaltyKind::ElasticNet
                        && (row.alpha < zero || row.alpha > one)
                    {
                        return Err(TuningError::AlphaOutOfRange);
                    }
                    validate_theta(row.kind, row.theta)?;
                }
                Ok(())
            }
        }
    }

    fn kind_of_folded(&self) -> PenaltyKind {
        match self {
            Penalty::CappedL1(_) => PenaltyKind::CappedL1,
            Penalty::Lsp(_) => PenaltyKind::Lsp,
            Penalty::Mcp(_) => PenaltyKind::Mcp,
            Penalty::Scad(_) => PenaltyKind::Scad,
            _ => unreachable!("not a folded penalty"),
        }
    }

    fn coord(&self, j: usize) -> CoordPen<T> {
        let zero = T::zero();
        let one = T::one();

        let weighted = |kind: PenaltyKind, lambda: T, alpha: T, theta: T, w: T| {
            if w == zero || kind == PenaltyKind::None {
                CoordPen::none()
            } else {
                CoordPen {
                    kind,
                    lambda: lambda * w,
                    alpha,
                    theta,
                }
            }
        };

        match self {
            Penalty::None => CoordPen::none(),
            Penalty::Lasso(t) => weighted(
                PenaltyKind::Lasso,
                t.lambda,
                one,
                one,
                weight_at(&t.weights, j),
            ),
            Penalty::Ridge(t) => weighted(
                PenaltyKind::Ridge,
                t.lambda,
                one,
                one,
                weight_at(&t.weights, j),
            ),
            Penalty::ElasticNet(t) => weighted(
                PenaltyKind::ElasticNet,
                t.lambda,
                t.alpha,
                one,
                weight_at(&t.weights, j),
            ),
            Penalty::CappedL1(t) => weighted(
                PenaltyKind::CappedL1,
                t.lambda,
                one,
                t.theta,
                weight_at(&t.weights, j),
            ),
            Penalty::Lsp(t) => weighted(
                PenaltyKind::Lsp,
                t.lambda,
                one,
                t.theta,
                weight_at(&t.weights, j),
            ),
            Penalty::Mcp(t) => weighted(
                PenaltyKind::Mcp,
                t.lambda,
                one,
                t.theta,
                weight_at(&t.weights, j),
            ),
            Penalty::Scad(t) => weighted(
                PenaltyKind::Scad,
                t.lambda,
                one,
                t.theta,
                weight_at(&t.weights, j),
            ),
            Penalty::Mixed(rows) => {
                let row = &rows[j];
                weighted(row.kind, row.lambda, row.alpha, row.theta, row.weight)
            }
        }
    }

    /// Penalty value `P(x)`.
    pub fn value<Sx>(&self, x: &Vector<T, Dyn, Sx>) -> T
    where
        Sx: Storage<T, Dyn> + IsContiguous,
    {
        let mut total = T::zero();
        for (j, xj) in x.iter().enumerate() {
            total += coord_value(self.coord(j), *xj);
        }
        total
    }

    /// Adds the gradient of the smooth component of the penalty (the ridge
    /// part of ridge and elastic-net selections) to `g`. Non-smooth
    /// components contribute nothing here; they enter through
    /// [`prox_assign`](Penalty::prox_assign).
    pub fn add_smooth_gradient<Sx, Sg>(&self, x: &Vector<T, Dyn, Sx>, g: &mut Vector<T, Dyn, Sg>)
    where
        Sx: Storage<T, Dyn> + IsContiguous,
        Sg: StorageMut<T, Dyn>,
    {
        for (j, xj) in x.iter().enumerate() {
            g[j] += coord_smooth_gradient(self.coord(j), *xj);
        }
    }

    /// Evaluates the proximal operator of the non-smooth component,
    /// `out = argmin_z ½‖z − u‖² + t·P_ns(z)`, coordinate by coordinate.
    ///
    /// For smooth selections (none, ridge) this is the identity; a zero step
    /// size is the identity for every selection.
    pub fn prox_assign<Su, So>(
        &self,
        u: &Vector<T, Dyn, Su>,
        step: T,
        out: &mut Vector<T, Dyn, So>,
    ) where
        Su: Storage<T, Dyn> + IsContiguous,
        So: StorageMut<T, Dyn>,
    {
        for (j, uj) in u.iter().enumerate() {
            out[j] = coord_prox(self.coord(j), *uj, step);
        }
    }

    /// Solves the coordinate subproblem
    /// `min_z v·z + ½·H_jj·z² + P_j(b + z)` of the coordinate-descent inner
    /// iteration, where `b = x_j + d_j` and `v = g_j + (Hd)_j`.
    ///
    /// When the subproblem is not strictly convex (`H_jj` below the
    /// per-family curvature margin), the diagonal is inflated by the margin
    /// plus `pd_epsilon` and the outcome is flagged so that the optimizer can
    /// report the fallback.
    pub fn coord_z(
        &self,
        j: usize,
        b: T,
        v: T,
        h_jj: T,
        pd_epsilon: T,
    ) -> Result<CoordStep<T>, SubproblemError> {
        let zero = T::zero();
        let one = T::one();
        let c = self.coord(j);

        // Curvature margin below which the region-wise subproblems stop
        // being strictly convex.
        let (margin, inflate) = match c.kind {
            PenaltyKind::Mcp => (one / c.theta, true),
            PenaltyKind::Scad => (one / (c.theta - one), true),
            _ => (zero, false),
        };

        let mut h = h_jj;
        let mut pd_fallback = false;
        if h - margin <= zero {
            pd_fallback = true;
            if inflate {
                h += margin + pd_epsilon;
            } else {
                h = pd_epsilon;
            }
        }

        let z = match c.kind {
            PenaltyKind::None => Some(-v / h),
            PenaltyKind::Lasso => Some(lasso::coord_z(b, v, h, c.lambda)),
            PenaltyKind::Ridge => Some(ridge::coord_z(b, v, h, c.lambda)),
            PenaltyKind::ElasticNet => Some(elastic_net::coord_z(b, v, h, c.lambda, c.alpha)),
            PenaltyKind::CappedL1 => Some(capped_l1::coord_z(b, v, h, c.lambda, c.theta)),
            PenaltyKind::Lsp => lsp::coord_z(b, v, h, c.lambda, c.theta),
            PenaltyKind::Mcp => mcp::coord_z(b, v, h, c.lambda, c.theta),
            PenaltyKind::Scad => scad::coord_z(b, v, h, c.lambda, c.theta),
        };

        match z {
            Some(z) if z.is_finite() => Ok(CoordStep { z, pd_fallback }),
            _ => Err(SubproblemError),
        }
    }

    /// Stationarity measure of the penalized objective: the ∞-norm over
    /// coordinates of the distance from `−g_j` to the (Clarke)
    /// subdifferential of the penalty at `x_j`, where `g = ∇f(x)`.
    ///
    /// At a minimizer of `f + P` the measure is zero; it is the quantity
    /// compared against `tol_grad` by the gradient-based convergence
    /// criterion and is well defined for every penalty in the catalogue,
    /// including the non-convex ones.
    pub fn stationarity<Sx, Sg>(&self, x: &Vector<T, Dyn, Sx>, g: &Vector<T, Dyn, Sg>) -> T
    where
        Sx: Storage<T, Dyn> + IsContiguous,
        Sg: Storage<T, Dyn>,
    {
        let mut worst = T::zero();
        for (j, xj) in x.iter().enumerate() {
            worst = worst.max(coord_stationarity(self.coord(j), *xj, g[j]));
        }
        worst
    }
}

fn coord_value<T: RealField + Copy>(c: CoordPen<T>, x: T) -> T {
    match c.kind {
        PenaltyKind::None => T::zero(),
        PenaltyKind::Lasso => lasso::value(x, c.lambda),
        PenaltyKind::Ridge => ridge::value(x, c.lambda),
        PenaltyKind::ElasticNet => elastic_net::value(x, c.lambda, c.alpha),
        PenaltyKind::CappedL1 => capped_l1::value(x, c.lambda, c.theta),
        PenaltyKind::Lsp => lsp::value(x, c.lambda, c.theta),
        PenaltyKind::Mcp => mcp::value(x, c.lambda, c.theta),
        PenaltyKind::Scad => scad::value(x, c.lambda, c.theta),
    }
}

fn coord_smooth_gradient<T: RealField + Copy>(c: CoordPen<T>, x: T) -> T {
    match c.kind {
        PenaltyKind::Ridge => ridge::gradient(x, c.lambda),
        PenaltyKind::ElasticNet => elastic_net::smooth_gradient(x, c.lambda, c.alpha),
        _ => T::zero(),
    }
}

fn coord_prox<T: RealField + Copy>(c: CoordPen<T>, u: T, step: T) -> T {
    match c.kind {
        // The smooth selections enter through the gradient; their proximal
        // operator is the identity.
        PenaltyKind::None | PenaltyKind::Ridge => u,
        PenaltyKind::Lasso => lasso::prox(u, step, c.lambda),
        PenaltyKind::ElasticNet => elastic_net::prox(u, step, c.lambda, c.alpha),
        PenaltyKind::CappedL1 => capped_l1::prox(u, step, c.lambda, c.theta),
        PenaltyKind::Lsp => lsp::prox(u, step, c.lambda, c.theta),
        PenaltyKind::Mcp => mcp::prox(u, step, c.lambda, c.theta),
        PenaltyKind::Scad => scad::prox(u, step, c.lambda, c.theta),
    }
}

/// Distance from `-g` to the interval `[lo, hi]`.
fn interval_distance<T: RealField + Copy>(g: T, lo: T, hi: T) -> T {
    let q = -g;
    if q < lo {
        lo - q
    } else if q > hi {
        q - hi
    } else {
        T::zero()
    }
}

fn coord_stationarity<T: RealField + Copy>(c: CoordPen<T>, x: T, g: T) -> T {
    let zero = T::zero();
    let one = T::one();
    let a = x.abs();
    let s = x.signum();

    match c.kind {
        PenaltyKind::None => g.abs(),
        PenaltyKind::Ridge => (g + ridge::gradient(x, c.lambda)).abs(),
        PenaltyKind::Lasso => {
            if x == zero {
                interval_distance(g, -c.lambda, c.lambda)
            } else {
                (g + c.lambda * s).abs()
            }
        }
        PenaltyKind::ElasticNet => {
            let gs = g + elastic_net::smooth_gradient(x, c.lambda, c.alpha);
            let l1 = c.alpha * c.lambda;
            if x == zero {
                interval_distance(gs, -l1, l1)
            } else {
                (gs + l1 * s).abs()
            }
        }
        PenaltyKind::CappedL1 => {
            if x == zero {
                interval_distance(g, -c.lambda, c.lambda)
            } else if a < c.theta {
                (g + c.lambda * s).abs()
            } else if a > c.theta {
                g.abs()
            } else {
                // Concave kink at the cap: the one-sided slopes are λ and 0.
                if s > zero {
                    interval_distance(g, zero, c.lambda)
                } else {
                    interval_distance(g, -c.lambda, zero)
                }
            }
        }
        PenaltyKind::Lsp => {
            let slope0 = c.lambda / c.theta;
            if x == zero {
                interval_distance(g, -slope0, slope0)
            } else {
                (g + c.lambda * s / (c.theta + a)).abs()
            }
        }
        PenaltyKind::Mcp => {
            if x == zero {
                interval_distance(g, -c.lambda, c.lambda)
            } else if a <= c.theta * c.lambda {
                (g + (c.lambda - a / c.theta) * s).abs()
            } else {
                g.abs()
            }
        }
        PenaltyKind::Scad => {
            if x == zero {
                interval_distance(g, -c.lambda, c.lambda)
            } else if a <= c.lambda {
                (g + c.lambda * s).abs()
            } else if a <= c.theta * c.lambda {
                (g + (c.theta * c.lambda - a) / (c.theta - one) * s).abs()
            } else {
                g.abs()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use approx::assert_abs_diff_eq;
    use nalgebra::{dvector, DVector};

    fn catalogue() -> Vec<Penalty<f64>> {
        vec![
            Penalty::none(),
            Penalty::lasso(0.3, vec![1.0]),
            Penalty::ridge(0.5, vec![1.0]),
            Penalty::elastic_net(0.4, 0.5, vec![1.0]),
            Penalty::capped_l1(0.3, 1.5, vec![1.0]),
            Penalty::lsp(0.3, 0.8, vec![1.0]),
            Penalty::mcp(0.5, 3.0, vec![1.0]),
            Penalty::scad(0.5, 3.7, vec![1.0]),
        ]
    }

    #[test]
    fn kind_from_str() {
        assert_eq!("lasso".parse::<PenaltyKind>().unwrap(), PenaltyKind::Lasso);
        assert_eq!(
            "cappedL1".parse::<PenaltyKind>().unwrap(),
            PenaltyKind::CappedL1
        );
        assert_eq!(
            "elastic_net".parse::<PenaltyKind>().unwrap(),
            PenaltyKind::ElasticNet
        );
        assert_eq!("SCAD".parse::<PenaltyKind>().unwrap(), PenaltyKind::Scad);
        assert!(matches!(
            "ell0".parse::<PenaltyKind>(),
            Err(TuningError::UnknownPenalty { .. })
        ));
    }

    #[test]
    fn validation_rejects_bad_tuning() {
        assert_eq!(
            Penalty::lasso(-0.1, vec![1.0, 1.0]).validate(2),
            Err(TuningError::NegativeLambda)
        );
        assert_eq!(
            Penalty::elastic_net(0.1, 1.5, vec![1.0]).validate(3),
            Err(TuningError::AlphaOutOfRange)
        );
        assert_eq!(
            Penalty::mcp(0.1, 1.0, vec![1.0]).validate(1),
            Err(TuningError::ThetaOutOfRange {
                kind: PenaltyKind::Mcp,
                min: 1.0
            })
        );
        assert_eq!(
            Penalty::scad(0.1, 2.0, vec![1.0]).validate(1),
            Err(TuningError::ThetaOutOfRange {
                kind: PenaltyKind::Scad,
                min: 2.0
            })
        );
        assert_eq!(
            Penalty::lasso(0.1, vec![1.0, -1.0]).validate(2),
            Err(TuningError::NegativeWeight)
        );
        assert_eq!(
            Penalty::lasso(0.1, vec![1.0, 1.0]).validate(3),
            Err(TuningError::WeightsLength {
                expected: 3,
                found: 2
            })
        );
        assert_eq!(
            Penalty::mixed(vec![ParamPenalty::lasso(0.1)]).validate(2),
            Err(TuningError::RowsLength {
                expected: 2,
                found: 1
            })
        );
    }

    #[test]
    fn validation_accepts_broadcast_weights() {
        assert_eq!(Penalty::lasso(0.1, vec![1.0]).validate(4), Ok(()));
    }

    #[test]
    fn zero_weights_disable_the_penalty() {
        let x = dvector![1.3, -0.7, 0.4];
        let penalties = vec![
            Penalty::lasso(0.3, vec![0.0]),
            Penalty::ridge(0.5, vec![0.0, 0.0, 0.0]),
            Penalty::mcp(0.5, 3.0, vec![0.0]),
        ];
        for penalty in penalties {
            assert_abs_diff_eq!(penalty.value(&x), 0.0);

            let mut g = DVector::zeros(3);
            penalty.add_smooth_gradient(&x, &mut g);
            assert_abs_diff_eq!(g.norm(), 0.0);

            let mut out = DVector::zeros(3);
            penalty.prox_assign(&x, 0.7, &mut out);
            assert_abs_diff_eq!((out - &x).norm(), 0.0);
        }
    }

    #[test]
    fn prox_with_zero_step_is_identity() {
        let u = dvector![-2.0, -0.2, 0.0, 0.4, 3.0];
        for penalty in catalogue() {
            let mut out = DVector::zeros(5);
            penalty.prox_assign(&u, 0.0, &mut out);
            assert_abs_diff_eq!((out - &u).norm(), 0.0, epsilon = 1e-12);
        }
    }

    #[test]
    fn elastic_net_decomposes() {
        let (lambda, alpha) = (0.4, 0.3);
        let enet = Penalty::elastic_net(lambda, alpha, vec![1.0]);
        let l1 = Penalty::lasso(alpha * lambda, vec![1.0]);
        let l2 = Penalty::ridge((1.0 - alpha) * lambda, vec![1.0]);

        let x = dvector![1.3, -0.7, 0.0, 0.4];
        assert_abs_diff_eq!(enet.value(&x), l1.value(&x) + l2.value(&x), epsilon = 1e-12);
    }

    #[test]
    fn values_are_weakly_monotone_in_magnitude() {
        for penalty in catalogue() {
            let mut previous = 0.0;
            for k in 0..=400 {
                let a = 0.01 * k as f64;
                let value = penalty.value(&dvector![a]);
                assert!(
                    value + 1e-12 >= previous,
                    "{} decreased at |x| = {}",
                    penalty.name(),
                    a
                );
                previous = value;
            }
        }
    }

    #[test]
    fn smooth_gradients_match_finite_differences() {
        let penalties = vec![
            Penalty::ridge(0.5, vec![1.0]),
            Penalty::elastic_net(0.4, 0.0, vec![1.0]),
        ];
        let eps = 1e-6;
        for penalty in penalties {
            for &x in &[-1.4, -0.2, 0.0, 0.3, 2.1] {
                let mut g = DVector::zeros(1);
                penalty.add_smooth_gradient(&dvector![x], &mut g);
                let numeric = (penalty.value(&dvector![x + eps])
                    - penalty.value(&dvector![x - eps]))
                    / (2.0 * eps);
                assert_abs_diff_eq!(g[0], numeric, epsilon = 1e-6);
            }
        }
    }

    #[test]
    fn stationarity_is_zero_at_penalized_minimum() {
        // Minimize ½(x - u)² + 0.3|x| by hand: u = 1.0 gives x* = 0.7, and
        // u = 0.2 gives x* = 0.
        let penalty = Penalty::lasso(0.3, vec![1.0, 1.0]);
        let x = dvector![0.7, 0.0];
        let g = dvector![0.7 - 1.0, 0.0 - 0.2];
        assert_abs_diff_eq!(penalty.stationarity(&x, &g), 0.0, epsilon = 1e-12);
    }

    #[test]
    fn stationarity_detects_non_minimum() {
        let penalty = Penalty::lasso(0.3, vec![1.0]);
        let x = dvector![0.0];
        let g = dvector![-1.0];
        assert_abs_diff_eq!(penalty.stationarity(&x, &g), 0.7, epsilon = 1e-12);
    }

    #[test]
    fn mixed_rows_dispatch_per_parameter() {
        let penalty = Penalty::mixed(vec![
            ParamPenalty::none(),
            ParamPenalty::lasso(0.3),
            ParamPenalty::mcp(0.5, 3.0).with_weight(2.0),
        ]);
        assert_eq!(penalty.validate(3), Ok(()));

        let x = dvector![5.0, 1.0, 0.5];
        let expected = 0.0 + 0.3 * 1.0 + mcp::value(0.5, 1.0, 3.0);
        assert_abs_diff_eq!(penalty.value(&x), expected, epsilon = 1e-12);
    }

    #[test]
    fn coord_z_flags_pd_fallback() {
        let penalty: Penalty<f64> = Penalty::mcp(0.5, 3.0, vec![1.0]);
        // H_jj = 0.1 < 1/θ: the subproblem is not strictly convex.
        let step = penalty.coord_z(0, 0.0, -0.4, 0.1, 1e-3).unwrap();
        assert!(step.pd_fallback);
        assert!(step.z.is_finite());

        // A healthy diagonal does not trigger the fallback.
        let step = penalty.coord_z(0, 0.0, -0.4, 1.0, 1e-3).unwrap();
        assert!(!step.pd_fallback);
    }
}
