use nalgebra::RealField;

use super::params::ParamSet;

/// The base trait for [`FitFunction`](super::function::FitFunction).
pub trait Problem {
    /// Type of the scalar, usually f32 or f64.
    type Field: RealField + Copy;

    /// Get the parameter set of the problem: the number of parameters and
    /// their labels. Labels are used in diagnostics only; all algorithms are
    /// index-based.
    fn params(&self) -> ParamSet;
}
