//! Pedestrian detection with histograms of oriented gradients and a linear classifier.
//!
//! Descriptor geometry is the classic Dalal-Triggs layout: a 64x128 window
//! split into 8x8 cells, 2x2-cell blocks sliding one cell at a time, and nine
//! unsigned orientation bins, for 3780 values per window. Blocks are L2-Hys
//! normalized once per pyramid level and shared by every window on it.

use image::RgbImage;
use image::imageops::{self, FilterType};
use ndarray::{Array3, s};
use tracing::trace;

use super::traits::Detector;
use crate::detection::{Detection, DetectionBuilder, DetectionKind, DetectorKind};
use crate::error::{Error, Result};
use crate::geometry::{Rect, group_rectangles};

pub const WINDOW_WIDTH: usize = 64;
pub const WINDOW_HEIGHT: usize = 128;
pub const CELL_SIZE: usize = 8;
pub const NUM_BINS: usize = 9;

const BLOCK_CELLS: usize = 2;
const BLOCK_LEN: usize = BLOCK_CELLS * BLOCK_CELLS * NUM_BINS;
const WINDOW_BLOCKS_X: usize = WINDOW_WIDTH / CELL_SIZE - BLOCK_CELLS + 1;
const WINDOW_BLOCKS_Y: usize = WINDOW_HEIGHT / CELL_SIZE - BLOCK_CELLS + 1;

/// Number of values in one window descriptor.
pub const DESCRIPTOR_LEN: usize = WINDOW_BLOCKS_X * WINDOW_BLOCKS_Y * BLOCK_LEN;

const L2_HYS_CLIP: f32 = 0.2;
const GROUP_EPS: f32 = 0.2;

/// Linear classifier over HOG descriptors: `score = weights . descriptor + bias`.
#[derive(Debug, Clone, PartialEq)]
pub struct LinearSvm {
    weights: Vec<f32>,
    bias: f32,
}

impl LinearSvm {
    pub fn new(weights: Vec<f32>, bias: f32) -> Result<Self> {
        if weights.len() != DESCRIPTOR_LEN {
            return Err(Error::DescriptorLength {
                expected: DESCRIPTOR_LEN,
                got: weights.len(),
            });
        }
        Ok(Self { weights, bias })
    }

    pub fn weights(&self) -> &[f32] {
        &self.weights
    }

    pub fn bias(&self) -> f32 {
        self.bias
    }

    pub fn score(&self, descriptor: &[f32]) -> f32 {
        self.weights
            .iter()
            .zip(descriptor)
            .map(|(w, d)| w * d)
            .sum::<f32>()
            + self.bias
    }
}

/// Sliding-window scan parameters.
#[derive(Debug, Clone)]
pub struct HogConfig {
    /// Window displacement in pixels; a multiple of the cell size.
    pub win_stride: usize,
    /// Replicated border added around each level; a multiple of the cell size.
    pub padding: usize,
    pub scale: f32,
    pub max_levels: usize,
    /// Windows scoring at or above this value are hits.
    pub hit_threshold: f32,
    /// A cluster must gather more than this many hits.
    pub group_threshold: usize,
}

impl Default for HogConfig {
    fn default() -> Self {
        Self {
            win_stride: 8,
            padding: 32,
            scale: 1.05,
            max_levels: 64,
            hit_threshold: 0.0,
            group_threshold: 3,
        }
    }
}

impl HogConfig {
    pub fn with_hit_threshold(mut self, hit_threshold: f32) -> Self {
        self.hit_threshold = hit_threshold;
        self
    }

    pub fn with_group_threshold(mut self, group_threshold: usize) -> Self {
        self.group_threshold = group_threshold;
        self
    }

    pub fn with_scale(mut self, scale: f32) -> Self {
        self.scale = scale;
        self
    }

    fn validate(&self) -> Result<()> {
        if self.win_stride == 0 || self.win_stride % CELL_SIZE != 0 {
            return Err(Error::Config(format!(
                "window stride {} is not a positive multiple of {CELL_SIZE}",
                self.win_stride
            )));
        }
        if self.padding % CELL_SIZE != 0 {
            return Err(Error::Config(format!(
                "padding {} is not a multiple of {CELL_SIZE}",
                self.padding
            )));
        }
        if self.scale.is_nan() || self.scale <= 1.0 {
            return Err(Error::Config(format!("pyramid scale must exceed 1, got {}", self.scale)));
        }
        Ok(())
    }
}

fn sample(image: &RgbImage, x: isize, y: isize) -> [f32; 3] {
    let cx = x.clamp(0, image.width() as isize - 1) as u32;
    let cy = y.clamp(0, image.height() as isize - 1) as u32;
    let p = image.get_pixel(cx, cy);
    [p[0] as f32, p[1] as f32, p[2] as f32]
}

/// Orientation histograms for every cell of `image` surrounded by `pad`
/// replicated pixels. Shape is `(cells_y, cells_x, NUM_BINS)`.
fn cell_histograms(image: &RgbImage, pad: usize) -> Array3<f32> {
    let padded_w = image.width() as usize + 2 * pad;
    let padded_h = image.height() as usize + 2 * pad;
    let (cells_x, cells_y) = (padded_w / CELL_SIZE, padded_h / CELL_SIZE);
    let mut cells = Array3::<f32>::zeros((cells_y, cells_x, NUM_BINS));
    let bin_width = 180.0 / NUM_BINS as f32;

    for py in 0..cells_y * CELL_SIZE {
        for px in 0..cells_x * CELL_SIZE {
            let sx = px as isize - pad as isize;
            let sy = py as isize - pad as isize;
            let (left, right) = (sample(image, sx - 1, sy), sample(image, sx + 1, sy));
            let (up, down) = (sample(image, sx, sy - 1), sample(image, sx, sy + 1));

            // Strongest channel wins.
            let (mut gx, mut gy, mut mag2) = (0.0f32, 0.0f32, 0.0f32);
            for c in 0..3 {
                let dx = right[c] - left[c];
                let dy = down[c] - up[c];
                let m = dx * dx + dy * dy;
                if m > mag2 {
                    (gx, gy, mag2) = (dx, dy, m);
                }
            }
            if mag2 == 0.0 {
                continue;
            }

            let mut angle = gy.atan2(gx).to_degrees();
            if angle < 0.0 {
                angle += 180.0;
            }
            if angle >= 180.0 {
                angle -= 180.0;
            }

            let pos = angle / bin_width - 0.5;
            let lower = pos.floor();
            let frac = pos - lower;
            let b0 = (lower as isize).rem_euclid(NUM_BINS as isize) as usize;
            let b1 = (b0 + 1) % NUM_BINS;
            let mag = mag2.sqrt();

            let (cx, cy) = (px / CELL_SIZE, py / CELL_SIZE);
            cells[[cy, cx, b0]] += mag * (1.0 - frac);
            cells[[cy, cx, b1]] += mag * frac;
        }
    }

    cells
}

/// L2 normalization, clipping at [`L2_HYS_CLIP`], then renormalization.
fn normalize_block(block: &mut [f32]) {
    let sum: f32 = block.iter().map(|v| v * v).sum();
    let scale = 1.0 / (sum.sqrt() + 0.1 * block.len() as f32);
    let mut clipped_sum = 0.0f32;
    for v in block.iter_mut() {
        *v = (*v * scale).min(L2_HYS_CLIP);
        clipped_sum += *v * *v;
    }
    let scale = 1.0 / (clipped_sum.sqrt() + 1e-3);
    for v in block.iter_mut() {
        *v *= scale;
    }
}

/// Normalized blocks at every cell offset. Shape is `(blocks_y, blocks_x, BLOCK_LEN)`;
/// within a block, cells run column-major with bins innermost.
fn block_grid(cells: &Array3<f32>) -> Array3<f32> {
    let (cells_y, cells_x, _) = cells.dim();
    let blocks_y = (cells_y + 1).saturating_sub(BLOCK_CELLS);
    let blocks_x = (cells_x + 1).saturating_sub(BLOCK_CELLS);
    let mut blocks = Array3::<f32>::zeros((blocks_y, blocks_x, BLOCK_LEN));

    let mut buf = [0.0f32; BLOCK_LEN];
    for by in 0..blocks_y {
        for bx in 0..blocks_x {
            let mut k = 0;
            for cx in 0..BLOCK_CELLS {
                for cy in 0..BLOCK_CELLS {
                    for bin in 0..NUM_BINS {
                        buf[k] = cells[[by + cy, bx + cx, bin]];
                        k += 1;
                    }
                }
            }
            normalize_block(&mut buf);
            blocks.slice_mut(s![by, bx, ..]).assign(&ndarray::ArrayView1::from(&buf[..]));
        }
    }

    blocks
}

/// Visit the descriptor of the window whose top-left block is `(wx, wy)`,
/// blocks column-major.
fn window_values(blocks: &Array3<f32>, wx: usize, wy: usize) -> impl Iterator<Item = f32> + '_ {
    (0..WINDOW_BLOCKS_X).flat_map(move |bx| {
        (0..WINDOW_BLOCKS_Y).flat_map(move |by| blocks.slice(s![wy + by, wx + bx, ..]).into_iter().copied())
    })
}

/// Descriptor of the top-left 64x128 window of `image`, without padding.
pub fn compute_descriptor(image: &RgbImage) -> Result<Vec<f32>> {
    if (image.width() as usize) < WINDOW_WIDTH || (image.height() as usize) < WINDOW_HEIGHT {
        return Err(Error::Config(format!(
            "image {}x{} is smaller than the {WINDOW_WIDTH}x{WINDOW_HEIGHT} window",
            image.width(),
            image.height()
        )));
    }
    let blocks = block_grid(&cell_histograms(image, 0));
    Ok(window_values(&blocks, 0, 0).collect())
}

/// Person detector over an image pyramid.
#[derive(Debug, Clone)]
pub struct PedestrianDetector {
    svm: LinearSvm,
    config: HogConfig,
}

impl PedestrianDetector {
    pub fn new(svm: LinearSvm, config: HogConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { svm, config })
    }

    pub fn config(&self) -> &HogConfig {
        &self.config
    }

    fn window_score(&self, blocks: &Array3<f32>, wx: usize, wy: usize) -> f32 {
        self.svm
            .weights
            .iter()
            .zip(window_values(blocks, wx, wy))
            .map(|(w, d)| w * d)
            .sum::<f32>()
            + self.svm.bias
    }

    /// Raw window hits in frame coordinates across all pyramid levels.
    pub fn scan(&self, frame: &RgbImage) -> Vec<Rect> {
        let stride_cells = self.config.win_stride / CELL_SIZE;
        let pad = self.config.padding;
        let (frame_w, frame_h) = (frame.width() as f32, frame.height() as f32);
        let mut hits = Vec::new();

        let mut scale = 1.0f32;
        for level in 0..self.config.max_levels {
            let level_w = (frame_w / scale).round() as u32;
            let level_h = (frame_h / scale).round() as u32;
            if (level_w as usize) < WINDOW_WIDTH || (level_h as usize) < WINDOW_HEIGHT {
                break;
            }

            let resized;
            let image = if level == 0 {
                frame
            } else {
                resized = imageops::resize(frame, level_w, level_h, FilterType::Triangle);
                &resized
            };

            let blocks = block_grid(&cell_histograms(image, pad));
            let (blocks_y, blocks_x, _) = blocks.dim();
            let windows_x = (blocks_x + 1).saturating_sub(WINDOW_BLOCKS_X);
            let windows_y = (blocks_y + 1).saturating_sub(WINDOW_BLOCKS_Y);

            for wy in (0..windows_y).step_by(stride_cells) {
                for wx in (0..windows_x).step_by(stride_cells) {
                    if self.window_score(&blocks, wx, wy) >= self.config.hit_threshold {
                        let x = (wx * CELL_SIZE) as f32 - pad as f32;
                        let y = (wy * CELL_SIZE) as f32 - pad as f32;
                        hits.push(Rect::new(
                            x * scale,
                            y * scale,
                            WINDOW_WIDTH as f32 * scale,
                            WINDOW_HEIGHT as f32 * scale,
                        ));
                    }
                }
            }

            scale *= self.config.scale;
        }

        hits
    }
}

impl Detector for PedestrianDetector {
    fn kind(&self) -> DetectorKind {
        DetectorKind::Pedestrian
    }

    fn detect(&mut self, frame: &RgbImage) -> Result<Vec<Detection>> {
        let hits = self.scan(frame);
        let groups = group_rectangles(&hits, self.config.group_threshold, GROUP_EPS);
        trace!(hits = hits.len(), groups = groups.len(), "pedestrian scan");

        Ok(groups
            .into_iter()
            .map(|g| {
                DetectionBuilder::new()
                    .rect(g.rect)
                    .kind(DetectionKind::Person, "person")
                    .source(DetectorKind::Pedestrian)
                    .build()
            })
            .filter(Detection::is_valid)
            .collect())
    }
}
