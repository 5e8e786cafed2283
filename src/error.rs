//! Error types in glmnet
//!

use ndarray::ShapeError;
use thiserror::Error;

use crate::irls::FeasibilityCheck;

pub type Result<T> = std::result::Result<T, GlmnetError>;

/// An error when fitting a penalized GLM or its regularization path
#[derive(Error, Debug, Clone)]
pub enum GlmnetError {
    /// The elastic-net mixing parameter is outside of `[0, 1]`
    #[error("alpha should be in [0, 1], got {0}")]
    InvalidAlpha(f32),
    #[error("lower limits should be <= 0, variable {index} has {value}")]
    InvalidLowerLimit { index: usize, value: f32 },
    #[error("upper limits should be >= 0, variable {index} has {value}")]
    InvalidUpperLimit { index: usize, value: f32 },
    #[error("lambdas should be non-negative, got {0}")]
    NegativeLambda(f32),
    #[error("lambda_min_ratio should be in (0, 1), got {0}")]
    InvalidLambdaMinRatio(f32),
    #[error("penalty factors should be non-negative, variable {index} has {value}")]
    InvalidPenaltyFactor { index: usize, value: f32 },
    #[error("excluded variable {index} out of range for {nvars} variables")]
    ExcludedOutOfRange { index: usize, nvars: usize },
    #[error("at least one lambda value needed")]
    EmptyLambdaSequence,
    #[error("invalid control parameter {0}")]
    InvalidControl(String),
    /// Dimensions of design, response, weights, offset or limits do not agree
    #[error("shape mismatch for {what}: expected {expected}, got {actual}")]
    ShapeMismatch {
        what: &'static str,
        expected: usize,
        actual: usize,
    },
    #[error("sparse design matrices must be stored in compressed column form")]
    NotCompressedColumn,
    #[error("response has values outside of the range of the {0} family")]
    InvalidResponse(&'static str),
    #[error("multiple responses not supported")]
    MultipleTargets,
    /// A positive error code returned by the path solver, no partial result exists
    #[error("fatal solver error {code}: {msg}")]
    SolverFatal { code: i32, msg: String },
    #[error("coordinate descent did not converge within {0} passes")]
    MaxIterations(usize),
    /// A step-size correction loop of the IRLS driver ran out of retries
    #[error("{check} check failed after {retries} step halvings; cannot correct step size")]
    UnrecoverableStep {
        check: FeasibilityCheck,
        retries: usize,
    },
    #[error("invalid ndarray shape {0}")]
    NdShape(#[from] ShapeError),
}
