//! Segmentation of saturated red, blue, green and yellow regions.

use std::fmt;

use image::{GrayImage, Luma, Rgb, RgbImage};
use tracing::trace;

use super::traits::Detector;
use crate::detection::{Detection, DetectionBuilder, DetectionKind, DetectorKind};
use crate::error::Result;
use crate::geometry::{bounding_rect, external_contours, polygon_area};

/// Colors the segmenter looks for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ColorClass {
    Red,
    Blue,
    Green,
    Yellow,
}

impl ColorClass {
    pub const ALL: [ColorClass; 4] = [Self::Red, Self::Blue, Self::Green, Self::Yellow];

    pub fn name(&self) -> &'static str {
        match self {
            Self::Red => "red",
            Self::Blue => "blue",
            Self::Green => "green",
            Self::Yellow => "yellow",
        }
    }

    /// Box and label color used when rendering.
    pub fn display_color(&self) -> Rgb<u8> {
        match self {
            Self::Red => Rgb([255, 0, 0]),
            Self::Blue => Rgb([0, 0, 255]),
            Self::Green => Rgb([0, 255, 0]),
            Self::Yellow => Rgb([255, 255, 0]),
        }
    }

    /// Inclusive hue intervals on the 0..180 scale. Red wraps around zero.
    pub fn hue_ranges(&self) -> &'static [(u8, u8)] {
        match self {
            Self::Red => &[(0, 10), (170, 180)],
            Self::Blue => &[(100, 130)],
            Self::Green => &[(40, 80)],
            Self::Yellow => &[(20, 30)],
        }
    }

    fn matches(&self, hsv: [u8; 3], config: &ColorConfig) -> bool {
        let [h, s, v] = hsv;
        s >= config.min_saturation
            && v >= config.min_value
            && self.hue_ranges().iter().any(|&(lo, hi)| h >= lo && h <= hi)
    }
}

impl fmt::Display for ColorClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Convert to 8-bit HSV with hue halved into `0..=180`, saturation and value in `0..=255`.
pub fn rgb_to_hsv(pixel: Rgb<u8>) -> [u8; 3] {
    let [r, g, b] = pixel.0.map(|c| c as f32);
    let max = r.max(g).max(b);
    let min = r.min(g).min(b);
    let diff = max - min;

    let s = if max > 0.0 { diff * 255.0 / max } else { 0.0 };
    let mut h = if diff == 0.0 {
        0.0
    } else if max == r {
        60.0 * (g - b) / diff
    } else if max == g {
        120.0 + 60.0 * (b - r) / diff
    } else {
        240.0 + 60.0 * (r - g) / diff
    };
    if h < 0.0 {
        h += 360.0;
    }

    [(h / 2.0).round() as u8, s.round() as u8, max as u8]
}

#[derive(Debug, Clone)]
pub struct ColorConfig {
    pub classes: Vec<ColorClass>,
    pub min_saturation: u8,
    pub min_value: u8,
    /// Regions must enclose strictly more than this many square pixels.
    pub min_area: f64,
}

impl Default for ColorConfig {
    fn default() -> Self {
        Self {
            classes: ColorClass::ALL.to_vec(),
            min_saturation: 50,
            min_value: 50,
            min_area: 1000.0,
        }
    }
}

impl ColorConfig {
    pub fn with_classes(mut self, classes: impl Into<Vec<ColorClass>>) -> Self {
        self.classes = classes.into();
        self
    }

    pub fn with_min_area(mut self, min_area: f64) -> Self {
        self.min_area = min_area;
        self
    }
}

/// Finds each configured color independently; overlapping classes may both report a region.
#[derive(Debug, Clone, Default)]
pub struct ColorDetector {
    config: ColorConfig,
}

impl ColorDetector {
    pub fn new(config: ColorConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ColorConfig {
        &self.config
    }

    fn mask(&self, hsv: &[[u8; 3]], width: u32, height: u32, class: ColorClass) -> GrayImage {
        GrayImage::from_fn(width, height, |x, y| {
            let idx = (y * width + x) as usize;
            if class.matches(hsv[idx], &self.config) {
                Luma([255])
            } else {
                Luma([0])
            }
        })
    }
}

impl Detector for ColorDetector {
    fn kind(&self) -> DetectorKind {
        DetectorKind::Color
    }

    fn detect(&mut self, frame: &RgbImage) -> Result<Vec<Detection>> {
        let (width, height) = frame.dimensions();
        let hsv: Vec<[u8; 3]> = frame.pixels().map(|p| rgb_to_hsv(*p)).collect();

        let mut detections = Vec::new();
        for &class in &self.config.classes {
            let mask = self.mask(&hsv, width, height, class);
            let before = detections.len();
            for contour in external_contours(&mask) {
                if polygon_area(&contour) <= self.config.min_area {
                    continue;
                }
                let det = DetectionBuilder::new()
                    .rect(bounding_rect(&contour))
                    .kind(DetectionKind::Color(class), class.name())
                    .source(DetectorKind::Color)
                    .build();
                if det.is_valid() {
                    detections.push(det);
                }
            }
            trace!(color = %class, regions = detections.len() - before, "color mask");
        }

        Ok(detections)
    }
}
