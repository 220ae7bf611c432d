//! Uniform interface over every detection modality.

use image::RgbImage;

use super::ExecutionTarget;
use crate::detection::{Detection, DetectorKind};
use crate::error::{Error, Result};

/// Common interface for the detectors run by the ensemble.
///
/// Implement this trait to plug any detection strategy into the pipeline.
///
/// # Example
///
/// ```ignore
/// use multidetect_rs::{Detection, Detector, DetectorKind, Result};
///
/// struct MyDetector;
///
/// impl Detector for MyDetector {
///     fn kind(&self) -> DetectorKind {
///         DetectorKind::Custom("mine")
///     }
///
///     fn detect(&mut self, frame: &image::RgbImage) -> Result<Vec<Detection>> {
///         Ok(vec![])
///     }
/// }
/// ```
pub trait Detector {
    /// Tag stamped on every detection this detector produces.
    fn kind(&self) -> DetectorKind;

    /// Run detection on one frame.
    ///
    /// The frame is borrowed for the duration of the call only; detectors keep
    /// no per-frame state between calls.
    fn detect(&mut self, frame: &RgbImage) -> Result<Vec<Detection>>;

    /// Ask the detector to move its computation to another execution target.
    ///
    /// Detectors without a configurable target report `Unsupported`, which the
    /// pipeline ignores.
    fn request_target(&mut self, target: ExecutionTarget) -> Result<()> {
        let _ = target;
        Err(Error::Unsupported("execution target selection"))
    }
}
