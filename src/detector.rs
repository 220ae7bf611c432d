//! Detection modalities run by the ensemble.
//!
//! Every detector implements [`Detector`]. The neural detector reaches its
//! network through the [`InferenceBackend`] boundary; the classical detectors
//! operate directly on the frame with already-parsed classifier data.

mod backend;
mod cascade;
mod class_names;
mod color;
mod integral;
mod keypoints;
mod neural;
mod nms;
mod palette;
mod pedestrian;
mod shape;
mod traits;

pub use backend::{ExecutionTarget, InferenceBackend, LoadBackend, OutputTensor};
pub use cascade::{CascadeClassifier, CascadeConfig, CascadeDetector, CascadeStage, FeatureRect, WeakClassifier};
pub use class_names::{COCO_CLASSES, ClassNames, NUM_CLASSES};
pub use color::{ColorClass, ColorConfig, ColorDetector, rgb_to_hsv};
pub use integral::IntegralImage;
pub use keypoints::{FeatureOverlay, Keypoint, OverlayConfig};
pub use neural::{Candidate, ChannelOrder, NeuralConfig, NeuralDetector, blob_from_frame, decode_outputs};
pub use nms::nms_boxes;
pub use palette::ClassPalette;
pub use pedestrian::{DESCRIPTOR_LEN, HogConfig, LinearSvm, PedestrianDetector, compute_descriptor};
pub use shape::{SHAPE_COLOR, ShapeClassifier, ShapeConfig, ShapeKind};
pub use traits::Detector;

#[cfg(feature = "burn-backend")]
mod burn_backend;

#[cfg(feature = "burn-backend")]
pub use burn_backend::{BurnBackend, BurnModel};
