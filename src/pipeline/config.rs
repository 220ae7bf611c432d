/// Per-call switches, read once at the start of every `process` call.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PipelineConfig {
    /// Run the neural detector alone instead of the classical detectors, when it is available.
    pub advanced_detection: bool,
    /// Draw corner keypoints over the frame.
    pub feature_overlay: bool,
    /// Assign and draw identities.
    pub tracking: bool,
    /// Ask detectors to move to an accelerator.
    pub gpu_acceleration: bool,
}

impl PipelineConfig {
    pub fn with_advanced_detection(mut self, enabled: bool) -> Self {
        self.advanced_detection = enabled;
        self
    }

    pub fn with_feature_overlay(mut self, enabled: bool) -> Self {
        self.feature_overlay = enabled;
        self
    }

    pub fn with_tracking(mut self, enabled: bool) -> Self {
        self.tracking = enabled;
        self
    }

    pub fn with_gpu_acceleration(mut self, enabled: bool) -> Self {
        self.gpu_acceleration = enabled;
        self
    }
}
