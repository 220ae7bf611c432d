//! Burn inference backend for the neural detector.
//!
//! This module provides a `BurnBackend` that implements `InferenceBackend`
//! for running grid detection networks built with the Burn framework.
//!
//! # Example
//!
//! ```ignore
//! use multidetect_rs::detector::{BurnBackend, BurnModel};
//! use burn::backend::NdArray;
//!
//! // Implement BurnModel for your detection network
//! struct MyYoloModel { /* ... */ }
//!
//! impl BurnModel<NdArray> for MyYoloModel {
//!     fn forward(&self, input: burn::tensor::Tensor<NdArray, 4>) -> Vec<burn::tensor::Tensor<NdArray, 2>> {
//!         // Run inference, one [rows, 5 + classes] tensor per output layer
//!     }
//! }
//!
//! let backend = BurnBackend::new(MyYoloModel::load("model.bin"), Default::default());
//! let pipeline = Pipeline::builder()
//!     .with_neural_backend(Ok(backend), ClassNames::coco())
//!     .build();
//! ```

use burn::prelude::*;
use burn::tensor::Tensor;
use ndarray::{Array2, Array4};

use super::backend::{ExecutionTarget, InferenceBackend, OutputTensor};
use crate::error::BackendError;

/// Trait for Burn-based grid detection networks.
///
/// Implement this trait for your specific model architecture.
pub trait BurnModel<B: Backend>: Send + Sync {
    /// Run forward pass on the input tensor.
    ///
    /// # Arguments
    /// * `input` - Input tensor of shape [batch, channels, height, width]
    ///
    /// # Returns
    /// One `[rows, 5 + classes]` tensor per output layer.
    fn forward(&self, input: Tensor<B, 4>) -> Vec<Tensor<B, 2>>;
}

/// Burn-based inference backend implementing `InferenceBackend`.
pub struct BurnBackend<B: Backend, M: BurnModel<B>> {
    model: M,
    device: B::Device,
    input: Option<Tensor<B, 4>>,
}

impl<B: Backend, M: BurnModel<B>> BurnBackend<B, M> {
    /// Create a new Burn backend with the given model and device.
    pub fn new(model: M, device: B::Device) -> Self {
        Self {
            model,
            device,
            input: None,
        }
    }
}

impl<B: Backend, M: BurnModel<B>> InferenceBackend for BurnBackend<B, M> {
    fn set_input(&mut self, blob: Array4<f32>) -> Result<(), BackendError> {
        let (n, c, h, w) = blob.dim();
        if n != 1 || c != 3 {
            return Err(BackendError::Input(format!(
                "expected a single 3-channel image, got shape [{n}, {c}, {h}, {w}]"
            )));
        }

        let data: Vec<f32> = blob.iter().copied().collect();
        let tensor = Tensor::<B, 1>::from_floats(data.as_slice(), &self.device).reshape([n, c, h, w]);
        self.input = Some(tensor);
        Ok(())
    }

    fn forward(&mut self) -> Result<Vec<OutputTensor>, BackendError> {
        let input = self
            .input
            .take()
            .ok_or_else(|| BackendError::Input("forward called before set_input".into()))?;

        self.model
            .forward(input)
            .into_iter()
            .enumerate()
            .map(|(i, tensor)| {
                let [rows, cols] = tensor.dims();
                let values = tensor
                    .into_data()
                    .to_vec::<f32>()
                    .map_err(|e| BackendError::Forward(format!("{e:?}")))?;
                let data = Array2::from_shape_vec((rows, cols), values)
                    .map_err(|e| BackendError::Forward(e.to_string()))?;
                Ok(OutputTensor::new(format!("output_{i}"), data))
            })
            .collect()
    }

    /// The device is fixed at construction.
    fn set_target(&mut self, target: ExecutionTarget) -> Result<(), BackendError> {
        match target {
            ExecutionTarget::Cpu => Ok(()),
            other => Err(BackendError::TargetUnsupported(other)),
        }
    }
}
