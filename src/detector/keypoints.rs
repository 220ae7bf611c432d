//! Corner keypoints for the feature overlay. They are drawn, never tracked.

use image::{RgbImage, imageops};
use imageproc::corners::corners_fast9;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Keypoint {
    pub x: u32,
    pub y: u32,
    pub score: f32,
}

#[derive(Debug, Clone)]
pub struct OverlayConfig {
    /// FAST intensity threshold.
    pub threshold: u8,
    /// Strongest keypoints kept per frame.
    pub max_keypoints: usize,
    pub radius: i32,
}

impl Default for OverlayConfig {
    fn default() -> Self {
        Self {
            threshold: 20,
            max_keypoints: 500,
            radius: 2,
        }
    }
}

impl OverlayConfig {
    pub fn with_max_keypoints(mut self, max_keypoints: usize) -> Self {
        self.max_keypoints = max_keypoints;
        self
    }

    pub fn with_threshold(mut self, threshold: u8) -> Self {
        self.threshold = threshold;
        self
    }
}

#[derive(Debug, Clone, Default)]
pub struct FeatureOverlay {
    config: OverlayConfig,
}

impl FeatureOverlay {
    pub fn new(config: OverlayConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &OverlayConfig {
        &self.config
    }

    /// FAST-9 corners, strongest first.
    pub fn keypoints(&self, frame: &RgbImage) -> Vec<Keypoint> {
        if frame.width() == 0 || frame.height() == 0 {
            return Vec::new();
        }
        let gray = imageops::grayscale(frame);
        let mut keypoints: Vec<Keypoint> = corners_fast9(&gray, self.config.threshold)
            .into_iter()
            .map(|c| Keypoint {
                x: c.x,
                y: c.y,
                score: c.score,
            })
            .collect();
        keypoints.sort_by(|a, b| b.score.total_cmp(&a.score));
        keypoints.truncate(self.config.max_keypoints);
        keypoints
    }
}
