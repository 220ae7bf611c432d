//! Builder for assembling a Pipeline from already-initialized artifacts.

use ab_glyph::FontArc;
use tracing::{info, warn};

use super::config::PipelineConfig;
use super::controller::Pipeline;
use super::ensemble::{DetectorSet, Ensemble};
use crate::detector::{
    CascadeClassifier, CascadeConfig, CascadeDetector, ClassNames, ColorConfig, ColorDetector, Detector,
    FeatureOverlay, HogConfig, InferenceBackend, LinearSvm, NeuralConfig, NeuralDetector, OverlayConfig,
    PedestrianDetector, ShapeClassifier, ShapeConfig,
};
use crate::error::{BackendError, Error};
use crate::render::Annotator;
use crate::tracker::{IdentityTracker, TrackerConfig};

/// Builder for creating a `Pipeline`.
///
/// Every fallible artifact is accepted as the `Result` of loading it. An
/// `Err` is logged and leaves that detector out for the pipeline's lifetime;
/// building itself never fails.
pub struct PipelineBuilder {
    neural: Option<(Box<dyn InferenceBackend>, ClassNames)>,
    cascade: Option<CascadeClassifier>,
    svm: Option<LinearSvm>,
    color: bool,
    shape: bool,
    custom: Vec<(DetectorSet, Box<dyn Detector>)>,
    neural_config: NeuralConfig,
    cascade_config: CascadeConfig,
    hog_config: HogConfig,
    color_config: ColorConfig,
    shape_config: ShapeConfig,
    overlay_config: OverlayConfig,
    tracker_config: TrackerConfig,
    config: PipelineConfig,
    font: Option<FontArc>,
}

impl Default for PipelineBuilder {
    fn default() -> Self {
        Self {
            neural: None,
            cascade: None,
            svm: None,
            color: true,
            shape: true,
            custom: Vec::new(),
            neural_config: NeuralConfig::default(),
            cascade_config: CascadeConfig::default(),
            hog_config: HogConfig::default(),
            color_config: ColorConfig::default(),
            shape_config: ShapeConfig::default(),
            overlay_config: OverlayConfig::default(),
            tracker_config: TrackerConfig::default(),
            config: PipelineConfig::default(),
            font: None,
        }
    }
}

impl PipelineBuilder {
    /// Create a new pipeline builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Supply the neural detector's backend and class table.
    pub fn with_neural_backend<B>(mut self, backend: Result<B, BackendError>, class_names: ClassNames) -> Self
    where
        B: InferenceBackend + 'static,
    {
        match backend {
            Ok(backend) => self.neural = Some((Box::new(backend), class_names)),
            Err(error) => warn!(%error, "neural backend unavailable, advanced detection disabled"),
        }
        self
    }

    /// Supply the parsed face cascade.
    pub fn with_face_cascade(mut self, cascade: Result<CascadeClassifier, Error>) -> Self {
        match cascade {
            Ok(cascade) => self.cascade = Some(cascade),
            Err(error) => warn!(%error, "face cascade unavailable"),
        }
        self
    }

    /// Supply the parsed pedestrian classifier.
    pub fn with_people_detector(mut self, svm: Result<LinearSvm, Error>) -> Self {
        match svm {
            Ok(svm) => self.svm = Some(svm),
            Err(error) => warn!(%error, "pedestrian classifier unavailable"),
        }
        self
    }

    /// Register an extra detector. Fallback detectors run after the built-in ones.
    pub fn with_detector(mut self, set: DetectorSet, detector: Box<dyn Detector>) -> Self {
        self.custom.push((set, detector));
        self
    }

    pub fn without_color_detector(mut self) -> Self {
        self.color = false;
        self
    }

    pub fn without_shape_classifier(mut self) -> Self {
        self.shape = false;
        self
    }

    pub fn with_neural_config(mut self, config: NeuralConfig) -> Self {
        self.neural_config = config;
        self
    }

    pub fn with_cascade_config(mut self, config: CascadeConfig) -> Self {
        self.cascade_config = config;
        self
    }

    pub fn with_hog_config(mut self, config: HogConfig) -> Self {
        self.hog_config = config;
        self
    }

    pub fn with_color_config(mut self, config: ColorConfig) -> Self {
        self.color_config = config;
        self
    }

    pub fn with_shape_config(mut self, config: ShapeConfig) -> Self {
        self.shape_config = config;
        self
    }

    pub fn with_overlay_config(mut self, config: OverlayConfig) -> Self {
        self.overlay_config = config;
        self
    }

    pub fn with_tracker_config(mut self, config: TrackerConfig) -> Self {
        self.tracker_config = config;
        self
    }

    /// Initial switches.
    pub fn with_config(mut self, config: PipelineConfig) -> Self {
        self.config = config;
        self
    }

    /// Font for captions and identity labels, replacing the embedded one.
    pub fn with_font(mut self, font: FontArc) -> Self {
        self.font = Some(font);
        self
    }

    pub fn build(self) -> Pipeline {
        let mut ensemble = Ensemble::new();

        if let Some((backend, class_names)) = self.neural {
            ensemble.push(
                DetectorSet::Advanced,
                Box::new(NeuralDetector::new(backend, class_names, self.neural_config)),
            );
        }

        if let Some(cascade) = self.cascade {
            match CascadeDetector::new(cascade, self.cascade_config) {
                Ok(detector) => ensemble.push(DetectorSet::Fallback, Box::new(detector)),
                Err(error) => warn!(%error, "face detector disabled"),
            }
        }

        if let Some(svm) = self.svm {
            match PedestrianDetector::new(svm, self.hog_config) {
                Ok(detector) => ensemble.push(DetectorSet::Fallback, Box::new(detector)),
                Err(error) => warn!(%error, "pedestrian detector disabled"),
            }
        }

        if self.color {
            ensemble.push(DetectorSet::Fallback, Box::new(ColorDetector::new(self.color_config)));
        }
        if self.shape {
            ensemble.push(DetectorSet::Fallback, Box::new(ShapeClassifier::new(self.shape_config)));
        }

        for (set, detector) in self.custom {
            ensemble.push(set, detector);
        }

        info!(
            advanced = ?ensemble.kinds(DetectorSet::Advanced),
            fallback = ?ensemble.kinds(DetectorSet::Fallback),
            "pipeline ready"
        );

        Pipeline::from_parts(
            ensemble,
            IdentityTracker::new(self.tracker_config),
            FeatureOverlay::new(self.overlay_config),
            self.font.map_or_else(Annotator::default, Annotator::new),
            self.config,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detection::DetectorKind;
    use crate::detector::{ExecutionTarget, OutputTensor};
    use ndarray::Array4;

    struct Unused;

    impl InferenceBackend for Unused {
        fn set_input(&mut self, _blob: Array4<f32>) -> Result<(), BackendError> {
            Ok(())
        }

        fn forward(&mut self) -> Result<Vec<OutputTensor>, BackendError> {
            Ok(vec![])
        }

        fn set_target(&mut self, target: ExecutionTarget) -> Result<(), BackendError> {
            Err(BackendError::TargetUnsupported(target))
        }
    }

    #[test]
    fn test_default_fallback_order() {
        let pipeline = Pipeline::builder().build();
        assert_eq!(
            pipeline.ensemble().kinds(DetectorSet::Fallback),
            vec![DetectorKind::Color, DetectorKind::Shape]
        );
        assert!(!pipeline.is_advanced_detection_available());
    }

    #[test]
    fn test_failed_artifacts_are_skipped() {
        let pipeline = Pipeline::builder()
            .with_neural_backend::<Unused>(
                Err(BackendError::Unavailable("missing weights".into())),
                ClassNames::coco(),
            )
            .with_face_cascade(Err(Error::Classifier("truncated".into())))
            .with_people_detector(LinearSvm::new(vec![0.0; 10], 0.0))
            .build();

        assert!(!pipeline.is_advanced_detection_available());
        assert_eq!(pipeline.ensemble().kinds(DetectorSet::Fallback).len(), 2);
    }

    #[test]
    fn test_neural_backend_enables_advanced_set() {
        let pipeline = Pipeline::builder()
            .with_neural_backend(Ok(Unused), ClassNames::coco())
            .build();
        assert!(pipeline.is_advanced_detection_available());
        assert_eq!(
            pipeline.ensemble().kinds(DetectorSet::Advanced),
            vec![DetectorKind::Neural]
        );
    }
}
