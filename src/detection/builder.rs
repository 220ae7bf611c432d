//! Builder for assembling Detection records inside the detectors.

use super::{Detection, DetectionKind, DetectorKind};
use crate::geometry::Rect;

/// Builder for creating `Detection` objects.
#[derive(Debug, Clone)]
pub struct DetectionBuilder {
    rect: Rect,
    score: Option<f32>,
    label: String,
    kind: DetectionKind,
    source: DetectorKind,
}

impl Default for DetectionBuilder {
    fn default() -> Self {
        Self {
            rect: Rect::default(),
            score: None,
            label: String::new(),
            kind: DetectionKind::Object { class_id: 0 },
            source: DetectorKind::Neural,
        }
    }
}

impl DetectionBuilder {
    /// Create a new detection builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the bounding box.
    pub fn rect(mut self, rect: Rect) -> Self {
        self.rect = rect;
        self
    }

    /// Set the confidence score.
    pub fn score(mut self, score: f32) -> Self {
        self.score = Some(score);
        self
    }

    /// Mark as a neural class detection with its table name.
    pub fn object(mut self, class_id: usize, name: impl Into<String>) -> Self {
        self.kind = DetectionKind::Object { class_id };
        self.label = name.into();
        self
    }

    /// Set kind and label explicitly.
    pub fn kind(mut self, kind: DetectionKind, label: impl Into<String>) -> Self {
        self.kind = kind;
        self.label = label.into();
        self
    }

    /// Set the producing detector.
    pub fn source(mut self, source: DetectorKind) -> Self {
        self.source = source;
        self
    }

    /// Build the final `Detection`.
    pub fn build(self) -> Detection {
        Detection {
            rect: self.rect,
            confidence: self.score,
            label: self.label,
            kind: self.kind,
            source: self.source,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detection_builder() {
        let det = DetectionBuilder::new()
            .rect(Rect::new(10.0, 20.0, 40.0, 60.0))
            .score(0.95)
            .object(2, "car")
            .build();

        assert_eq!(det.confidence, Some(0.95));
        assert_eq!(det.rect, Rect::new(10.0, 20.0, 40.0, 60.0));
        assert_eq!(det.kind, DetectionKind::Object { class_id: 2 });
        assert_eq!(det.source, DetectorKind::Neural);
    }

    #[test]
    fn test_unscored_detection() {
        let det = DetectionBuilder::new()
            .rect(Rect::new(40.0, 45.0, 20.0, 10.0))
            .kind(DetectionKind::Face, "face")
            .source(DetectorKind::Cascade)
            .build();
        assert_eq!(det.rect, Rect::new(40.0, 45.0, 20.0, 10.0));
        assert_eq!(det.confidence, None);
    }
}
