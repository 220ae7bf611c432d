//! Boundary to the inference runtime that executes the neural detector.
//!
//! The core never loads model files itself. A backend is constructed by the
//! caller (for example through [`LoadBackend`]) and handed to the pipeline
//! builder already initialized; a failed construction simply leaves the
//! neural detector out of the ensemble.

use std::path::Path;

use ndarray::{Array2, Array4};

use crate::error::BackendError;

/// Device a backend runs its forward pass on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ExecutionTarget {
    #[default]
    Cpu,
    /// GPU or other accelerator, when the backend supports one.
    Accelerator,
}

/// One named output layer of a forward pass.
///
/// Rows are candidate boxes laid out as
/// `[cx, cy, w, h, objectness, class scores...]`, normalized to the frame.
#[derive(Debug, Clone)]
pub struct OutputTensor {
    pub name: String,
    pub data: Array2<f32>,
}

impl OutputTensor {
    pub fn new(name: impl Into<String>, data: Array2<f32>) -> Self {
        Self {
            name: name.into(),
            data,
        }
    }
}

/// Trait for inference runtimes able to run a grid-based detector.
pub trait InferenceBackend {
    /// Bind the NCHW input tensor for the next forward pass.
    fn set_input(&mut self, blob: Array4<f32>) -> Result<(), BackendError>;

    /// Run the network over all unconnected output layers.
    fn forward(&mut self) -> Result<Vec<OutputTensor>, BackendError>;

    /// Select the execution target for subsequent forward passes.
    fn set_target(&mut self, target: ExecutionTarget) -> Result<(), BackendError>;
}

/// Construction from a network description plus its weights.
///
/// Implemented by concrete runtimes outside this crate; the pipeline only
/// ever sees the `Result` of this call.
pub trait LoadBackend: InferenceBackend + Sized {
    fn load(config: &Path, weights: &Path) -> Result<Self, BackendError>;
}
