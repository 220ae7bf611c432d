//! Pipeline for combining the detector ensemble with identity tracking.

use image::RgbImage;
use tracing::debug;

use super::builder::PipelineBuilder;
use super::config::PipelineConfig;
use super::ensemble::{DetectorSet, Ensemble, FrameFailure};
use crate::detection::Detection;
use crate::detector::{ExecutionTarget, FeatureOverlay};
use crate::render::Annotator;
use crate::tracker::{Identity, IdentityTracker};

/// Result of one `process` call.
#[derive(Debug, Clone)]
pub struct AnnotatedFrame {
    /// Copy of the input with boxes, labels, identities and keypoints drawn on it.
    pub image: RgbImage,
    /// Detections drawn on `image`, in production order.
    pub detections: Vec<Detection>,
    /// One entry per tracked detection; empty when tracking is off.
    pub identities: Vec<Identity>,
    /// Detectors that failed on this frame.
    pub failures: Vec<FrameFailure>,
    /// `None` for empty frames, which skip detection.
    pub detector_set: Option<DetectorSet>,
}

/// Single entry point: one annotated frame per input frame.
///
/// This struct bundles the detector ensemble, the identity tracker, the
/// keypoint overlay and the renderer. Switches in [`PipelineConfig`] may be
/// changed between calls and take effect on the next one.
pub struct Pipeline {
    ensemble: Ensemble,
    tracker: IdentityTracker,
    overlay: FeatureOverlay,
    annotator: Annotator,
    config: PipelineConfig,
    gpu_applied: bool,
}

impl Pipeline {
    pub fn builder() -> PipelineBuilder {
        PipelineBuilder::new()
    }

    pub(crate) fn from_parts(
        ensemble: Ensemble,
        tracker: IdentityTracker,
        overlay: FeatureOverlay,
        annotator: Annotator,
        config: PipelineConfig,
    ) -> Self {
        Self {
            ensemble,
            tracker,
            overlay,
            annotator,
            config,
            gpu_applied: false,
        }
    }

    /// Detect, draw and optionally track on a copy of `frame`.
    ///
    /// Never fails: detector errors are reported in [`AnnotatedFrame::failures`].
    /// The input frame is not modified.
    pub fn process(&mut self, frame: &RgbImage) -> AnnotatedFrame {
        let config = self.config;
        self.apply_gpu_request(config.gpu_acceleration);

        let mut image = frame.clone();
        if frame.width() == 0 || frame.height() == 0 {
            return AnnotatedFrame {
                image,
                detections: Vec::new(),
                identities: Vec::new(),
                failures: Vec::new(),
                detector_set: None,
            };
        }

        let set = self.ensemble.select(config.advanced_detection);
        let output = self.ensemble.run(set, frame);

        for det in &output.detections {
            self.annotator.draw_detection(&mut image, det);
        }

        let identities = if config.tracking {
            let identities = self.tracker.update(&output.detections);
            for identity in &identities {
                self.annotator
                    .draw_identity(&mut image, &identity.rect, identity.id);
            }
            identities
        } else {
            Vec::new()
        };

        if config.feature_overlay {
            let keypoints = self.overlay.keypoints(frame);
            self.annotator
                .draw_keypoints(&mut image, &keypoints, self.overlay.config().radius);
        }

        AnnotatedFrame {
            image,
            detections: output.detections,
            identities,
            failures: output.failures,
            detector_set: Some(set),
        }
    }

    /// Push an execution target change to the detectors when the switch flips.
    fn apply_gpu_request(&mut self, wanted: bool) {
        if wanted == self.gpu_applied {
            return;
        }
        let target = if wanted {
            ExecutionTarget::Accelerator
        } else {
            ExecutionTarget::Cpu
        };
        debug!(?target, "requesting execution target");
        self.ensemble.request_target(target);
        self.gpu_applied = wanted;
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    pub fn config_mut(&mut self) -> &mut PipelineConfig {
        &mut self.config
    }

    pub fn set_config(&mut self, config: PipelineConfig) {
        self.config = config;
    }

    pub fn set_advanced_detection(&mut self, enabled: bool) {
        self.config.advanced_detection = enabled;
    }

    pub fn set_feature_overlay(&mut self, enabled: bool) {
        self.config.feature_overlay = enabled;
    }

    pub fn set_tracking(&mut self, enabled: bool) {
        self.config.tracking = enabled;
    }

    pub fn set_gpu_acceleration(&mut self, enabled: bool) {
        self.config.gpu_acceleration = enabled;
    }

    /// Whether the neural detector was supplied and initialized.
    pub fn is_advanced_detection_available(&self) -> bool {
        self.ensemble.is_available(DetectorSet::Advanced)
    }

    /// Get a reference to the underlying tracker.
    pub fn tracker(&self) -> &IdentityTracker {
        &self.tracker
    }

    /// Get a mutable reference to the underlying tracker.
    pub fn tracker_mut(&mut self) -> &mut IdentityTracker {
        &mut self.tracker
    }

    pub fn ensemble(&self) -> &Ensemble {
        &self.ensemble
    }
}
