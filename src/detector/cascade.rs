//! Boosted cascade of Haar-like features for frontal faces.
//!
//! The classifier arrives already parsed; this module only evaluates it. A
//! window passes when every stage's summed weak-classifier votes reach the
//! stage threshold. Raw hits from the multi-scale scan are clustered with
//! [`group_rectangles`] and clusters with too few members are dropped.

use image::imageops;
use image::{GrayImage, RgbImage};
use imageproc::contrast::equalize_histogram;
use tracing::trace;

use super::integral::IntegralImage;
use super::traits::Detector;
use crate::detection::{Detection, DetectionBuilder, DetectionKind, DetectorKind};
use crate::error::{Error, Result};
use crate::geometry::{Rect, group_rectangles};

const GROUP_EPS: f32 = 0.2;

/// One weighted rectangle of a Haar-like feature, in base-window pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FeatureRect {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
    pub weight: f32,
}

impl FeatureRect {
    pub fn new(x: u32, y: u32, width: u32, height: u32, weight: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
            weight,
        }
    }
}

/// Decision stump over a single feature.
#[derive(Debug, Clone, PartialEq)]
pub struct WeakClassifier {
    pub rects: Vec<FeatureRect>,
    /// Compared against the area-normalized feature value scaled by the window's standard deviation.
    pub threshold: f32,
    /// Vote when the feature value is below the threshold.
    pub left: f32,
    /// Vote otherwise.
    pub right: f32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CascadeStage {
    pub threshold: f32,
    pub classifiers: Vec<WeakClassifier>,
}

/// A parsed cascade: base window size plus its ordered stages.
#[derive(Debug, Clone, PartialEq)]
pub struct CascadeClassifier {
    window_width: u32,
    window_height: u32,
    stages: Vec<CascadeStage>,
}

impl CascadeClassifier {
    /// Validate and wrap a parsed cascade.
    ///
    /// Every feature rectangle must fit inside the base window and every stage
    /// must carry at least one weak classifier.
    pub fn new(window_width: u32, window_height: u32, stages: Vec<CascadeStage>) -> Result<Self> {
        if window_width == 0 || window_height == 0 {
            return Err(Error::Classifier("cascade window has zero size".into()));
        }
        if stages.is_empty() {
            return Err(Error::Classifier("cascade has no stages".into()));
        }
        for (si, stage) in stages.iter().enumerate() {
            if stage.classifiers.is_empty() {
                return Err(Error::Classifier(format!("stage {si} has no weak classifiers")));
            }
            for weak in &stage.classifiers {
                if weak.rects.is_empty() {
                    return Err(Error::Classifier(format!("stage {si} has a feature without rectangles")));
                }
                let outside = weak.rects.iter().any(|r| {
                    r.width == 0
                        || r.height == 0
                        || r.x + r.width > window_width
                        || r.y + r.height > window_height
                });
                if outside {
                    return Err(Error::Classifier(format!(
                        "stage {si} has a feature rectangle outside the {window_width}x{window_height} window"
                    )));
                }
            }
        }

        Ok(Self {
            window_width,
            window_height,
            stages,
        })
    }

    pub fn window_size(&self) -> (u32, u32) {
        (self.window_width, self.window_height)
    }

    pub fn stages(&self) -> &[CascadeStage] {
        &self.stages
    }

    /// Run every stage on the window at `(x, y)` scaled by `scale`.
    fn evaluate(&self, integral: &IntegralImage, x: usize, y: usize, scale: f32) -> bool {
        let win_w = (self.window_width as f32 * scale).round() as usize;
        let win_h = (self.window_height as f32 * scale).round() as usize;

        let (_, variance) = integral.rect_stats(x, y, win_w, win_h);
        let norm = if variance > 0.0 { variance.sqrt() } else { 1.0 };
        let inv_area = 1.0 / (win_w * win_h) as f64;

        for stage in &self.stages {
            let mut stage_sum = 0.0f64;
            for weak in &stage.classifiers {
                let mut value = 0.0f64;
                for r in &weak.rects {
                    let rx = (r.x as f32 * scale).round() as usize;
                    let ry = (r.y as f32 * scale).round() as usize;
                    let rw = ((r.width as f32 * scale).round() as usize).min(win_w.saturating_sub(rx));
                    let rh = ((r.height as f32 * scale).round() as usize).min(win_h.saturating_sub(ry));
                    value += r.weight as f64 * integral.rect_sum(x + rx, y + ry, rw, rh);
                }
                value *= inv_area;

                let vote = if value < weak.threshold as f64 * norm {
                    weak.left
                } else {
                    weak.right
                };
                stage_sum += vote as f64;
            }
            if stage_sum < stage.threshold as f64 {
                return false;
            }
        }
        true
    }

    /// Slide the cascade over every scale and return the raw window hits.
    pub fn scan(&self, gray: &GrayImage, config: &CascadeConfig) -> Vec<Rect> {
        let integral = IntegralImage::new(gray);
        let (img_w, img_h) = (gray.width(), gray.height());
        let mut hits = Vec::new();

        let mut factor = 1.0f32;
        loop {
            let win_w = (self.window_width as f32 * factor).round() as u32;
            let win_h = (self.window_height as f32 * factor).round() as u32;
            if win_w > img_w || win_h > img_h {
                break;
            }
            if let Some((max_w, max_h)) = config.max_size {
                if win_w > max_w || win_h > max_h {
                    break;
                }
            }

            if win_w >= config.min_size.0 && win_h >= config.min_size.1 {
                let step = if factor > 2.0 { factor } else { 2.0 * factor };
                let step = (step.round() as usize).max(1);
                for y in (0..=(img_h - win_h) as usize).step_by(step) {
                    for x in (0..=(img_w - win_w) as usize).step_by(step) {
                        if self.evaluate(&integral, x, y, factor) {
                            hits.push(Rect::new(x as f32, y as f32, win_w as f32, win_h as f32));
                        }
                    }
                }
            }

            factor *= config.scale_factor;
        }

        hits
    }
}

/// Multi-scale scan parameters.
#[derive(Debug, Clone)]
pub struct CascadeConfig {
    /// Window growth per scale step; must exceed 1.
    pub scale_factor: f32,
    /// A cluster must gather more than this many raw hits.
    pub min_neighbors: usize,
    pub min_size: (u32, u32),
    pub max_size: Option<(u32, u32)>,
    /// Equalize the grayscale histogram before scanning.
    pub equalize: bool,
}

impl Default for CascadeConfig {
    fn default() -> Self {
        Self {
            scale_factor: 1.1,
            min_neighbors: 5,
            min_size: (50, 50),
            max_size: None,
            equalize: true,
        }
    }
}

impl CascadeConfig {
    pub fn with_scale_factor(mut self, scale_factor: f32) -> Self {
        self.scale_factor = scale_factor;
        self
    }

    pub fn with_min_neighbors(mut self, min_neighbors: usize) -> Self {
        self.min_neighbors = min_neighbors;
        self
    }

    pub fn with_min_size(mut self, width: u32, height: u32) -> Self {
        self.min_size = (width, height);
        self
    }

    pub fn with_max_size(mut self, width: u32, height: u32) -> Self {
        self.max_size = Some((width, height));
        self
    }
}

/// Face detector backed by a [`CascadeClassifier`].
#[derive(Debug, Clone)]
pub struct CascadeDetector {
    classifier: CascadeClassifier,
    config: CascadeConfig,
}

impl CascadeDetector {
    pub fn new(classifier: CascadeClassifier, config: CascadeConfig) -> Result<Self> {
        if config.scale_factor.is_nan() || config.scale_factor <= 1.0 {
            return Err(Error::Config(format!(
                "cascade scale factor must be greater than 1, got {}",
                config.scale_factor
            )));
        }
        Ok(Self { classifier, config })
    }

    pub fn config(&self) -> &CascadeConfig {
        &self.config
    }
}

impl Detector for CascadeDetector {
    fn kind(&self) -> DetectorKind {
        DetectorKind::Cascade
    }

    fn detect(&mut self, frame: &RgbImage) -> Result<Vec<Detection>> {
        let gray = imageops::grayscale(frame);
        let gray = if self.config.equalize {
            equalize_histogram(&gray)
        } else {
            gray
        };

        let hits = self.classifier.scan(&gray, &self.config);
        let groups = group_rectangles(&hits, self.config.min_neighbors, GROUP_EPS);
        trace!(hits = hits.len(), groups = groups.len(), "cascade scan");

        Ok(groups
            .into_iter()
            .map(|g| {
                DetectionBuilder::new()
                    .rect(g.rect)
                    .kind(DetectionKind::Face, "face")
                    .source(DetectorKind::Cascade)
                    .build()
            })
            .filter(Detection::is_valid)
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgb;

    /// Dark upper half over a bright lower half.
    fn edge_cascade() -> CascadeClassifier {
        let weak = WeakClassifier {
            rects: vec![
                FeatureRect::new(0, 0, 24, 12, -1.0),
                FeatureRect::new(0, 12, 24, 12, 1.0),
            ],
            threshold: 0.5,
            left: 0.0,
            right: 1.0,
        };
        let stage = CascadeStage {
            threshold: 0.5,
            classifiers: vec![weak],
        };
        CascadeClassifier::new(24, 24, vec![stage]).unwrap()
    }

    fn face_frame() -> RgbImage {
        let mut frame = RgbImage::from_pixel(200, 200, Rgb([128, 128, 128]));
        for y in 50..130 {
            for x in 60..140 {
                let v = if y < 90 { 30 } else { 230 };
                frame.put_pixel(x, y, Rgb([v, v, v]));
            }
        }
        frame
    }

    #[test]
    fn test_detects_edge_pattern() {
        let mut detector = CascadeDetector::new(edge_cascade(), CascadeConfig::default()).unwrap();
        let dets = detector.detect(&face_frame()).unwrap();

        assert!(!dets.is_empty());
        for det in &dets {
            assert_eq!(det.label, "face");
            assert_eq!(det.kind, DetectionKind::Face);
            assert_eq!(det.confidence, None);
            assert!(det.rect.width >= 50.0);
        }
    }

    #[test]
    fn test_uniform_frame_has_no_faces() {
        let mut detector = CascadeDetector::new(edge_cascade(), CascadeConfig::default()).unwrap();
        let frame = RgbImage::from_pixel(160, 120, Rgb([90, 90, 90]));
        assert!(detector.detect(&frame).unwrap().is_empty());
    }

    #[test]
    fn test_small_frame_is_skipped() {
        let mut detector = CascadeDetector::new(edge_cascade(), CascadeConfig::default()).unwrap();
        let frame = RgbImage::from_pixel(40, 40, Rgb([0, 0, 0]));
        assert!(detector.detect(&frame).unwrap().is_empty());
    }

    #[test]
    fn test_rejects_rect_outside_window() {
        let weak = WeakClassifier {
            rects: vec![FeatureRect::new(20, 0, 10, 10, 1.0)],
            threshold: 0.0,
            left: 0.0,
            right: 1.0,
        };
        let stage = CascadeStage {
            threshold: 0.5,
            classifiers: vec![weak],
        };
        assert!(matches!(
            CascadeClassifier::new(24, 24, vec![stage]),
            Err(Error::Classifier(_))
        ));
    }

    #[test]
    fn test_rejects_non_growing_scale() {
        let config = CascadeConfig::default().with_scale_factor(1.0);
        assert!(matches!(
            CascadeDetector::new(edge_cascade(), config),
            Err(Error::Config(_))
        ));
    }
}
