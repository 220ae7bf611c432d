//! Detector sets and the per-detector error boundary.

use std::time::Instant;

use image::RgbImage;
use tracing::{debug, warn};

use crate::detection::{Detection, DetectorKind};
use crate::detector::{Detector, ExecutionTarget};
use crate::error::Error;

/// Which group of detectors runs for a frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DetectorSet {
    /// The neural detector, run alone.
    Advanced,
    /// The classical detectors, run in order.
    Fallback,
}

/// A detector that failed on one frame. The frame continues without its output.
#[derive(Debug, Clone)]
pub struct FrameFailure {
    pub detector: DetectorKind,
    pub error: Error,
}

#[derive(Debug, Clone)]
pub struct EnsembleOutput {
    pub set: DetectorSet,
    pub detections: Vec<Detection>,
    pub failures: Vec<FrameFailure>,
}

#[derive(Default)]
pub struct Ensemble {
    advanced: Vec<Box<dyn Detector>>,
    fallback: Vec<Box<dyn Detector>>,
}

impl Ensemble {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, set: DetectorSet, detector: Box<dyn Detector>) {
        self.detectors_mut(set).push(detector);
    }

    fn detectors(&self, set: DetectorSet) -> &[Box<dyn Detector>] {
        match set {
            DetectorSet::Advanced => &self.advanced,
            DetectorSet::Fallback => &self.fallback,
        }
    }

    fn detectors_mut(&mut self, set: DetectorSet) -> &mut Vec<Box<dyn Detector>> {
        match set {
            DetectorSet::Advanced => &mut self.advanced,
            DetectorSet::Fallback => &mut self.fallback,
        }
    }

    pub fn is_available(&self, set: DetectorSet) -> bool {
        !self.detectors(set).is_empty()
    }

    /// Detector kinds of a set, in run order.
    pub fn kinds(&self, set: DetectorSet) -> Vec<DetectorKind> {
        self.detectors(set).iter().map(|d| d.kind()).collect()
    }

    /// The advanced set runs only when requested and populated.
    pub fn select(&self, advanced_requested: bool) -> DetectorSet {
        if advanced_requested && self.is_available(DetectorSet::Advanced) {
            DetectorSet::Advanced
        } else {
            DetectorSet::Fallback
        }
    }

    /// Run every detector of `set` on the frame.
    ///
    /// A failing detector contributes nothing and is reported in `failures`;
    /// degenerate boxes are dropped.
    pub fn run(&mut self, set: DetectorSet, frame: &RgbImage) -> EnsembleOutput {
        let mut detections = Vec::new();
        let mut failures = Vec::new();

        for detector in self.detectors_mut(set).iter_mut() {
            let kind = detector.kind();
            let start = Instant::now();
            match detector.detect(frame) {
                Ok(found) => {
                    let total = found.len();
                    detections.extend(found.into_iter().filter(Detection::is_valid));
                    debug!(
                        detector = %kind,
                        total,
                        elapsed_ms = start.elapsed().as_secs_f64() * 1000.0,
                        "detector finished"
                    );
                }
                Err(error) => {
                    warn!(detector = %kind, %error, "detector failed, continuing without its detections");
                    failures.push(FrameFailure { detector: kind, error });
                }
            }
        }

        EnsembleOutput {
            set,
            detections,
            failures,
        }
    }

    /// Forward an execution target request to every detector; refusals are only logged.
    pub fn request_target(&mut self, target: ExecutionTarget) {
        for detector in self.advanced.iter_mut().chain(self.fallback.iter_mut()) {
            if let Err(error) = detector.request_target(target) {
                debug!(detector = %detector.kind(), ?target, %error, "execution target not applied");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detection::DetectionKind;
    use crate::error::Result;
    use crate::geometry::Rect;

    struct Fixed(Vec<Detection>);

    impl Detector for Fixed {
        fn kind(&self) -> DetectorKind {
            DetectorKind::Custom("fixed")
        }

        fn detect(&mut self, _frame: &RgbImage) -> Result<Vec<Detection>> {
            Ok(self.0.clone())
        }
    }

    struct Broken;

    impl Detector for Broken {
        fn kind(&self) -> DetectorKind {
            DetectorKind::Custom("broken")
        }

        fn detect(&mut self, _frame: &RgbImage) -> Result<Vec<Detection>> {
            Err(Error::Config("boom".into()))
        }
    }

    fn det(w: f32) -> Detection {
        Detection::new(
            Rect::new(0.0, 0.0, w, 10.0),
            "x",
            DetectionKind::Face,
            DetectorKind::Custom("fixed"),
        )
    }

    #[test]
    fn test_select_requires_available_advanced_set() {
        let mut ensemble = Ensemble::new();
        assert_eq!(ensemble.select(true), DetectorSet::Fallback);
        ensemble.push(DetectorSet::Advanced, Box::new(Fixed(vec![])));
        assert_eq!(ensemble.select(true), DetectorSet::Advanced);
        assert_eq!(ensemble.select(false), DetectorSet::Fallback);
    }

    #[test]
    fn test_failure_is_isolated() {
        let mut ensemble = Ensemble::new();
        ensemble.push(DetectorSet::Fallback, Box::new(Broken));
        ensemble.push(DetectorSet::Fallback, Box::new(Fixed(vec![det(10.0)])));

        let out = ensemble.run(DetectorSet::Fallback, &RgbImage::new(20, 20));
        assert_eq!(out.detections.len(), 1);
        assert_eq!(out.failures.len(), 1);
        assert_eq!(out.failures[0].detector, DetectorKind::Custom("broken"));
    }

    #[test]
    fn test_degenerate_boxes_dropped() {
        let mut ensemble = Ensemble::new();
        ensemble.push(DetectorSet::Fallback, Box::new(Fixed(vec![det(0.0), det(5.0)])));
        let out = ensemble.run(DetectorSet::Fallback, &RgbImage::new(20, 20));
        assert_eq!(out.detections.len(), 1);
        assert_eq!(out.detections[0].rect.width, 5.0);
    }
}
