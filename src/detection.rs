//! Detection records shared by every detector, the renderer and the tracker.

mod builder;

pub use builder::DetectionBuilder;

use std::fmt;

use crate::detector::{ColorClass, ShapeKind};
use crate::geometry::Rect;

/// Which detector produced a detection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DetectorKind {
    Neural,
    Cascade,
    Pedestrian,
    Color,
    Shape,
    /// A caller-supplied detector registered through the pipeline builder.
    Custom(&'static str),
}

impl fmt::Display for DetectorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Neural => f.write_str("neural"),
            Self::Cascade => f.write_str("cascade"),
            Self::Pedestrian => f.write_str("pedestrian"),
            Self::Color => f.write_str("color"),
            Self::Shape => f.write_str("shape"),
            Self::Custom(name) => f.write_str(name),
        }
    }
}

/// What a detection represents.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DetectionKind {
    /// One of the neural detector's classes.
    Object { class_id: usize },
    Face,
    Person,
    Color(ColorClass),
    Shape(ShapeKind),
}

/// A single labeled box produced by one detector for one frame.
#[derive(Debug, Clone, PartialEq)]
pub struct Detection {
    /// Bounding box in frame pixels.
    pub rect: Rect,
    /// Score in `[0, 1]`; `None` for detectors that do not score.
    pub confidence: Option<f32>,
    /// Class name, e.g. `"car"`, `"face"`, `"blue"`, `"triangle"`.
    pub label: String,
    pub kind: DetectionKind,
    pub source: DetectorKind,
}

impl Detection {
    pub fn new(rect: Rect, label: impl Into<String>, kind: DetectionKind, source: DetectorKind) -> Self {
        Self {
            rect,
            confidence: None,
            label: label.into(),
            kind,
            source,
        }
    }

    pub fn with_confidence(mut self, confidence: f32) -> Self {
        self.confidence = Some(confidence);
        self
    }

    /// Text drawn next to the box: the label, followed by the score when there is one.
    pub fn caption(&self) -> String {
        match self.confidence {
            Some(score) => format!("{}: {:.2}", self.label, score),
            None => self.label.clone(),
        }
    }

    /// Degenerate boxes are dropped before rendering and tracking.
    pub fn is_valid(&self) -> bool {
        !self.rect.is_degenerate()
    }
}
