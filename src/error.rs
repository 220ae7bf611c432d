//! Error types shared by detectors, the inference boundary and the pipeline.

use thiserror::Error;

use crate::detector::ExecutionTarget;

/// Errors raised by an [`InferenceBackend`](crate::detector::InferenceBackend).
#[derive(Debug, Clone, Error)]
pub enum BackendError {
    /// The backend could not be constructed or lost its model.
    #[error("backend unavailable: {0}")]
    Unavailable(String),
    /// The input tensor was rejected (shape, layout, dtype).
    #[error("input rejected: {0}")]
    Input(String),
    /// The forward pass failed.
    #[error("forward pass failed: {0}")]
    Forward(String),
    /// The requested execution target is not supported by this backend.
    #[error("execution target {0:?} is not supported")]
    TargetUnsupported(ExecutionTarget),
}

/// Crate-wide error type.
#[derive(Debug, Clone, Error)]
pub enum Error {
    #[error(transparent)]
    Backend(#[from] BackendError),

    #[error("class table must contain exactly {expected} names, got {got}")]
    ClassTable { expected: usize, got: usize },

    #[error("classifier weight count mismatch: descriptor has {expected} values, got {got}")]
    DescriptorLength { expected: usize, got: usize },

    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("malformed classifier: {0}")]
    Classifier(String),

    #[error("{0} is not supported by this detector")]
    Unsupported(&'static str),
}

pub type Result<T> = std::result::Result<T, Error>;
