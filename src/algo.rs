//! The collection of implemented optimizers.

pub mod glmnet;
pub mod ista;

pub use glmnet::Glmnet;
pub use ista::Ista;
