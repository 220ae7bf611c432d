//! Grid-based 80-class object detector executed through an [`InferenceBackend`].

use image::RgbImage;
use image::imageops::{self, FilterType};
use ndarray::Array4;
use tracing::trace;

use super::backend::{ExecutionTarget, InferenceBackend, OutputTensor};
use super::class_names::{ClassNames, NUM_CLASSES};
use super::nms::nms_boxes;
use super::traits::Detector;
use crate::detection::{Detection, DetectionBuilder, DetectorKind};
use crate::error::Result;
use crate::geometry::Rect;

/// Channel order the network was trained with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ChannelOrder {
    #[default]
    Rgb,
    Bgr,
}

/// Preprocessing and post-processing parameters of the neural detector.
#[derive(Debug, Clone)]
pub struct NeuralConfig {
    pub input_width: u32,
    pub input_height: u32,
    /// Multiplier applied after mean subtraction.
    pub scale: f32,
    pub mean: [f32; 3],
    pub channel_order: ChannelOrder,
    /// Rows with objectness at or below this value are rejected.
    pub objectness_threshold: f32,
    /// NMS drops candidates scoring at or below this value.
    pub score_threshold: f32,
    /// NMS suppresses boxes overlapping an accepted one by more than this IoU.
    pub nms_threshold: f32,
}

impl Default for NeuralConfig {
    fn default() -> Self {
        Self {
            input_width: 416,
            input_height: 416,
            scale: 1.0 / 255.0,
            mean: [0.0; 3],
            channel_order: ChannelOrder::Rgb,
            objectness_threshold: 0.7,
            score_threshold: 0.6,
            nms_threshold: 0.3,
        }
    }
}

impl NeuralConfig {
    pub fn with_input_size(mut self, width: u32, height: u32) -> Self {
        self.input_width = width;
        self.input_height = height;
        self
    }

    pub fn with_objectness_threshold(mut self, threshold: f32) -> Self {
        self.objectness_threshold = threshold;
        self
    }

    pub fn with_nms(mut self, score_threshold: f32, nms_threshold: f32) -> Self {
        self.score_threshold = score_threshold;
        self.nms_threshold = nms_threshold;
        self
    }
}

/// A decoded box before suppression.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Candidate {
    pub rect: Rect,
    /// Best class score multiplied by objectness.
    pub score: f32,
    pub class_id: usize,
}

/// Build the normalized NCHW input tensor for one frame.
pub fn blob_from_frame(frame: &RgbImage, config: &NeuralConfig) -> Array4<f32> {
    let (width, height) = (config.input_width, config.input_height);
    let resized = imageops::resize(frame, width, height, FilterType::Triangle);

    let mut blob = Array4::<f32>::zeros((1, 3, height as usize, width as usize));
    for (x, y, pixel) in resized.enumerate_pixels() {
        for c in 0..3 {
            let src = match config.channel_order {
                ChannelOrder::Rgb => c,
                ChannelOrder::Bgr => 2 - c,
            };
            blob[[0, c, y as usize, x as usize]] = (pixel[src] as f32 - config.mean[c]) * config.scale;
        }
    }
    blob
}

/// Turn raw output rows into candidates in frame pixel coordinates.
///
/// Each row is `[cx, cy, w, h, objectness, class scores...]` with the box
/// normalized to the frame. Box corners and sizes are truncated to whole pixels.
pub fn decode_outputs(
    outputs: &[OutputTensor],
    frame_width: u32,
    frame_height: u32,
    objectness_threshold: f32,
) -> Vec<Candidate> {
    let (fw, fh) = (frame_width as f32, frame_height as f32);
    let mut candidates = Vec::new();

    for output in outputs {
        if output.data.ncols() < 5 {
            trace!(layer = %output.name, cols = output.data.ncols(), "skipping output layer without box columns");
            continue;
        }

        for row in output.data.rows() {
            let objectness = row[4];
            if objectness.is_nan() || objectness <= objectness_threshold {
                continue;
            }

            let center_x = row[0] * fw;
            let center_y = row[1] * fh;
            let width = row[2] * fw;
            let height = row[3] * fh;
            let rect = Rect::new(
                (center_x - width / 2.0).trunc(),
                (center_y - height / 2.0).trunc(),
                width.trunc(),
                height.trunc(),
            );

            let mut class_id = 0usize;
            let mut max_score = 0.0f32;
            for (j, &score) in row.iter().enumerate().skip(5) {
                if score > max_score {
                    max_score = score;
                    class_id = j - 5;
                }
            }

            candidates.push(Candidate {
                rect,
                score: max_score * objectness,
                class_id,
            });
        }
    }

    candidates
}

/// Neural object detector.
pub struct NeuralDetector {
    backend: Box<dyn InferenceBackend>,
    class_names: ClassNames,
    config: NeuralConfig,
}

impl NeuralDetector {
    pub fn new(backend: Box<dyn InferenceBackend>, class_names: ClassNames, config: NeuralConfig) -> Self {
        Self {
            backend,
            class_names,
            config,
        }
    }

    pub fn config(&self) -> &NeuralConfig {
        &self.config
    }

    pub fn class_names(&self) -> &ClassNames {
        &self.class_names
    }

    /// Keep NMS survivors whose class is in the table and whose box is drawable.
    fn finalize(&self, candidates: &[Candidate], kept: Vec<usize>) -> Vec<Detection> {
        kept.into_iter()
            .filter_map(|idx| {
                let candidate = &candidates[idx];
                if candidate.class_id >= NUM_CLASSES {
                    return None;
                }
                let name = self.class_names.get(candidate.class_id)?;
                Some(
                    DetectionBuilder::new()
                        .rect(candidate.rect)
                        .score(candidate.score)
                        .object(candidate.class_id, name)
                        .source(DetectorKind::Neural)
                        .build(),
                )
            })
            .filter(Detection::is_valid)
            .collect()
    }
}

impl Detector for NeuralDetector {
    fn kind(&self) -> DetectorKind {
        DetectorKind::Neural
    }

    fn detect(&mut self, frame: &RgbImage) -> Result<Vec<Detection>> {
        if frame.width() == 0 || frame.height() == 0 {
            return Ok(Vec::new());
        }

        let blob = blob_from_frame(frame, &self.config);
        self.backend.set_input(blob)?;
        let outputs = self.backend.forward()?;

        let candidates = decode_outputs(
            &outputs,
            frame.width(),
            frame.height(),
            self.config.objectness_threshold,
        );
        let boxes: Vec<Rect> = candidates.iter().map(|c| c.rect).collect();
        let scores: Vec<f32> = candidates.iter().map(|c| c.score).collect();
        let kept = nms_boxes(
            &boxes,
            &scores,
            self.config.score_threshold,
            self.config.nms_threshold,
        );
        trace!(candidates = candidates.len(), kept = kept.len(), "neural post-processing");

        Ok(self.finalize(&candidates, kept))
    }

    fn request_target(&mut self, target: ExecutionTarget) -> Result<()> {
        self.backend.set_target(target)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::BackendError;
    use ndarray::Array2;

    fn row(cx: f32, cy: f32, w: f32, h: f32, obj: f32, class_id: usize, score: f32) -> Vec<f32> {
        let mut r = vec![cx, cy, w, h, obj];
        let mut classes = vec![0.0; NUM_CLASSES];
        classes[class_id] = score;
        r.extend(classes);
        r
    }

    fn tensor(rows: Vec<Vec<f32>>) -> OutputTensor {
        let cols = rows[0].len();
        let flat: Vec<f32> = rows.into_iter().flatten().collect();
        OutputTensor::new("yolo_82", Array2::from_shape_vec((flat.len() / cols, cols), flat).unwrap())
    }

    struct FixedBackend {
        outputs: Vec<OutputTensor>,
        input_shape: Option<Vec<usize>>,
    }

    impl InferenceBackend for FixedBackend {
        fn set_input(&mut self, blob: Array4<f32>) -> std::result::Result<(), BackendError> {
            self.input_shape = Some(blob.shape().to_vec());
            Ok(())
        }

        fn forward(&mut self) -> std::result::Result<Vec<OutputTensor>, BackendError> {
            Ok(self.outputs.clone())
        }

        fn set_target(&mut self, target: ExecutionTarget) -> std::result::Result<(), BackendError> {
            Err(BackendError::TargetUnsupported(target))
        }
    }

    #[test]
    fn test_objectness_boundary_is_exclusive() {
        let outputs = vec![tensor(vec![
            row(0.5, 0.5, 0.2, 0.2, 0.7, 1, 0.9),
            row(0.5, 0.5, 0.2, 0.2, 0.7001, 1, 0.9),
        ])];
        let candidates = decode_outputs(&outputs, 100, 100, 0.7);
        assert_eq!(candidates.len(), 1);
        assert!((candidates[0].score - 0.7001 * 0.9).abs() < 1e-6);
    }

    #[test]
    fn test_decode_box_geometry() {
        let outputs = vec![tensor(vec![row(0.5, 0.25, 0.3, 0.1, 0.9, 7, 0.8)])];
        let candidates = decode_outputs(&outputs, 200, 100, 0.7);
        assert_eq!(candidates.len(), 1);
        let c = candidates[0];
        assert_eq!(c.class_id, 7);
        assert_eq!(c.rect, Rect::new(70.0, 20.0, 60.0, 10.0));
    }

    #[test]
    fn test_decode_skips_narrow_layers() {
        let narrow = OutputTensor::new("bad", Array2::from_elem((3, 4), 1.0));
        assert!(decode_outputs(&[narrow], 100, 100, 0.7).is_empty());
    }

    #[test]
    fn test_blob_shape_and_scale() {
        let frame = RgbImage::from_pixel(32, 16, image::Rgb([255, 0, 51]));
        let blob = blob_from_frame(&frame, &NeuralConfig::default());
        assert_eq!(blob.shape(), &[1, 3, 416, 416]);
        assert!((blob[[0, 0, 10, 10]] - 1.0).abs() < 1e-6);
        assert!(blob[[0, 1, 10, 10]].abs() < 1e-6);
        assert!((blob[[0, 2, 10, 10]] - 0.2).abs() < 1e-6);

        let bgr = NeuralConfig {
            channel_order: ChannelOrder::Bgr,
            ..NeuralConfig::default()
        };
        let swapped = blob_from_frame(&frame, &bgr);
        assert!((swapped[[0, 0, 10, 10]] - 0.2).abs() < 1e-6);
    }

    #[test]
    fn test_detect_runs_nms_and_labels() {
        let backend = FixedBackend {
            outputs: vec![
                tensor(vec![
                    row(0.5, 0.5, 0.4, 0.4, 0.9, 2, 0.9),
                    row(0.52, 0.5, 0.4, 0.4, 0.85, 2, 0.9),
                ]),
                tensor(vec![row(0.1, 0.1, 0.1, 0.1, 0.8, 16, 0.9)]),
            ],
            input_shape: None,
        };
        let mut detector = NeuralDetector::new(Box::new(backend), ClassNames::coco(), NeuralConfig::default());
        let frame = RgbImage::new(200, 200);
        let dets = detector.detect(&frame).unwrap();

        assert_eq!(dets.len(), 2);
        assert_eq!(dets[0].label, "car");
        assert_eq!(dets[0].caption(), "car: 0.81");
        assert_eq!(dets[1].label, "dog");
        assert!(dets.iter().all(|d| d.source == DetectorKind::Neural));
    }

    #[test]
    fn test_unsupported_target_is_error() {
        let backend = FixedBackend {
            outputs: vec![],
            input_shape: None,
        };
        let mut detector = NeuralDetector::new(Box::new(backend), ClassNames::coco(), NeuralConfig::default());
        assert!(detector.request_target(ExecutionTarget::Accelerator).is_err());
    }
}
