//! Per-frame detection ensemble with lightweight identity tracking.
//!
//! A [`Pipeline`] takes one RGB frame at a time and returns an annotated copy:
//! either the neural detector runs alone (when advanced detection is on and a
//! backend was supplied) or the classical detectors run in order (faces,
//! pedestrians, color regions, shapes). Optionally each detection is given a
//! persistent identity by greedy nearest-centroid matching, and corner
//! keypoints are drawn over the frame.
//!
//! # Example
//!
//! ```ignore
//! use multidetect_rs::{Pipeline, PipelineConfig};
//!
//! let mut pipeline = Pipeline::builder()
//!     .with_config(PipelineConfig::default().with_tracking(true))
//!     .build();
//!
//! for frame in frames {
//!     let out = pipeline.process(&frame);
//!     for identity in &out.identities {
//!         println!("{} -> {}", out.detections[identity.detection_index].label, identity.id);
//!     }
//! }
//! ```

pub mod detection;
pub mod detector;
pub mod error;
pub mod geometry;
pub mod pipeline;
pub mod render;
pub mod tracker;

pub use detection::{Detection, DetectionBuilder, DetectionKind, DetectorKind};
pub use detector::{Detector, ExecutionTarget, InferenceBackend, OutputTensor};
pub use error::{BackendError, Error, Result};
pub use geometry::Rect;
pub use pipeline::{AnnotatedFrame, DetectorSet, Pipeline, PipelineBuilder, PipelineConfig};
pub use render::Annotator;
pub use tracker::{Identity, IdentityTracker, TrackerConfig};
