//! Tire Degradation Models
//!
//! Inference-side models for race strategy planning: a Weibull
//! accelerated-failure-time model for achievable stint lengths, a
//! multinomial logistic classifier for compound transitions, and a
//! deterministic lap-time degradation model.
//!
//! All models are consumed at inference time only. Fitting happens
//! offline; this crate evaluates fitted parameters against encoded
//! feature rows.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ModelError {
    #[error("Invalid model parameter: {0}")]
    InvalidParameter(String),
    #[error("{what} has length {got}, expected {expected}")]
    ArityMismatch {
        what: String,
        expected: usize,
        got: usize,
    },
    #[error("Non-finite model value: {0}")]
    NonFinite(String),
}

pub type Result<T> = std::result::Result<T, ModelError>;

pub mod aft;
pub mod classifier;
pub mod features;
pub mod pace;

pub use aft::{SurvivalBundle, SurvivalModel, WeibullAft};
pub use classifier::{SoftmaxTransition, TransitionModel};
pub use features::FeatureRow;
