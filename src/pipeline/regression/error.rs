//! Error types for model fitting

use polars::prelude::PolarsError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RegressionError {
    #[error("column '{column}' not found in dataset")]
    MissingColumn { column: String },

    #[error("column '{column}' cannot be used as a numeric regressor")]
    NonNumericColumn { column: String },

    #[error("design has {nobs} complete observations for {ncols} parameters")]
    InsufficientObservations { nobs: usize, ncols: usize },

    #[error("{context}: matrix is singular or not positive definite")]
    SingularMatrix { context: &'static str },

    #[error("outcome '{column}' must be coded 0/1, found {value}")]
    NonBinaryOutcome { column: String, value: f64 },

    #[error("probit did not converge after {iterations} iterations (last step {step:.3e})")]
    NoConvergence { iterations: usize, step: f64 },

    #[error("perfect separation detected: fitted probabilities reached 0 or 1")]
    PerfectSeparation,

    #[error("threshold must be within [0, 1], got {0}")]
    InvalidThreshold(f64),

    #[error("length mismatch: {left} vs {right}")]
    LengthMismatch { left: usize, right: usize },

    #[error("invalid distribution parameters: {0}")]
    Distribution(String),

    #[error(transparent)]
    Frame(#[from] PolarsError),
}
