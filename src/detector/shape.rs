//! Polygon classification of edge contours.

use std::fmt;

use image::{Rgb, RgbImage, imageops};
use imageproc::distance_transform::Norm;
use imageproc::edges::canny;
use imageproc::filter::gaussian_blur_f32;
use imageproc::geometry::arc_length;
use imageproc::morphology::dilate;
use tracing::trace;

use super::traits::Detector;
use crate::detection::{Detection, DetectionBuilder, DetectionKind, DetectorKind};
use crate::error::Result;
use crate::geometry::{approximate_closed_polygon, bounding_rect, external_contours, polygon_area};

/// Shape name assigned from the vertex count of the simplified contour.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ShapeKind {
    Triangle,
    Quadrilateral,
    Pentagon,
    Hexagon,
    ManySided,
    Unknown,
}

impl ShapeKind {
    pub fn from_vertex_count(vertices: usize) -> Self {
        match vertices {
            3 => Self::Triangle,
            4 => Self::Quadrilateral,
            5 => Self::Pentagon,
            6 => Self::Hexagon,
            n if n > 6 => Self::ManySided,
            _ => Self::Unknown,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Triangle => "triangle",
            Self::Quadrilateral => "quadrilateral",
            Self::Pentagon => "pentagon",
            Self::Hexagon => "hexagon",
            Self::ManySided => "many-sided",
            Self::Unknown => "unknown",
        }
    }
}

impl fmt::Display for ShapeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Every shape is drawn in orange.
pub const SHAPE_COLOR: Rgb<u8> = Rgb([255, 165, 0]);

#[derive(Debug, Clone)]
pub struct ShapeConfig {
    pub blur_sigma: f32,
    pub canny_low: f32,
    pub canny_high: f32,
    /// Contours must enclose strictly more than this many square pixels.
    pub min_area: f64,
    /// Simplification tolerance as a fraction of the contour perimeter.
    pub epsilon_ratio: f64,
    /// Dilate the edge map by one pixel so corners broken by edge thinning still close.
    pub close_edges: bool,
}

impl Default for ShapeConfig {
    fn default() -> Self {
        Self {
            blur_sigma: 1.1,
            canny_low: 50.0,
            canny_high: 150.0,
            min_area: 1000.0,
            epsilon_ratio: 0.02,
            close_edges: true,
        }
    }
}

impl ShapeConfig {
    pub fn with_canny_thresholds(mut self, low: f32, high: f32) -> Self {
        self.canny_low = low;
        self.canny_high = high;
        self
    }

    pub fn with_min_area(mut self, min_area: f64) -> Self {
        self.min_area = min_area;
        self
    }
}

#[derive(Debug, Clone, Default)]
pub struct ShapeClassifier {
    config: ShapeConfig,
}

impl ShapeClassifier {
    pub fn new(config: ShapeConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ShapeConfig {
        &self.config
    }
}

impl Detector for ShapeClassifier {
    fn kind(&self) -> DetectorKind {
        DetectorKind::Shape
    }

    fn detect(&mut self, frame: &RgbImage) -> Result<Vec<Detection>> {
        if frame.width() == 0 || frame.height() == 0 {
            return Ok(Vec::new());
        }

        let gray = imageops::grayscale(frame);
        let blurred = gaussian_blur_f32(&gray, self.config.blur_sigma);
        let mut edges = canny(&blurred, self.config.canny_low, self.config.canny_high);
        if self.config.close_edges {
            edges = dilate(&edges, Norm::LInf, 1);
        }

        let mut detections = Vec::new();
        for contour in external_contours(&edges) {
            if polygon_area(&contour) <= self.config.min_area {
                continue;
            }
            let epsilon = self.config.epsilon_ratio * arc_length(&contour, true);
            let polygon = approximate_closed_polygon(&contour, epsilon);
            let shape = ShapeKind::from_vertex_count(polygon.len());

            let det = DetectionBuilder::new()
                .rect(bounding_rect(&contour))
                .kind(DetectionKind::Shape(shape), shape.name())
                .source(DetectorKind::Shape)
                .build();
            if det.is_valid() {
                detections.push(det);
            }
        }
        trace!(shapes = detections.len(), "shape classification");

        Ok(detections)
    }
}
