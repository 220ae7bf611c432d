//! Orchestration: detector selection, rendering and tracking for each frame.

mod builder;
mod config;
mod controller;
mod ensemble;

pub use builder::PipelineBuilder;
pub use config::PipelineConfig;
pub use controller::{AnnotatedFrame, Pipeline};
pub use ensemble::{DetectorSet, Ensemble, EnsembleOutput, FrameFailure};
