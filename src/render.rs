//! Drawing of detections, identities and keypoints onto the working canvas.
//!
//! Rendering is cosmetic: boxes and labels that fall partly outside the canvas
//! are clipped. Labels use an embedded DejaVu Sans unless another font is given.

use ab_glyph::{FontArc, PxScale};
use image::{Rgb, RgbImage};
use imageproc::drawing::{draw_filled_circle_mut, draw_filled_rect_mut, draw_hollow_rect_mut, draw_text_mut, text_size};
use imageproc::rect::Rect as PixelRect;
use tracing::warn;

use crate::detection::{Detection, DetectionKind};
use crate::detector::{ClassPalette, Keypoint, SHAPE_COLOR};
use crate::geometry::Rect;

const FACE_COLOR: Rgb<u8> = Rgb([0, 255, 0]);
const PERSON_COLOR: Rgb<u8> = Rgb([0, 0, 255]);
const IDENTITY_COLOR: Rgb<u8> = Rgb([255, 0, 255]);
const KEYPOINT_COLOR: Rgb<u8> = Rgb([0, 255, 255]);
const LABEL_TEXT_COLOR: Rgb<u8> = Rgb([0, 0, 0]);
const FALLBACK_COLOR: Rgb<u8> = Rgb([255, 255, 255]);

static DEFAULT_FONT: &[u8] = include_bytes!("../assets/DejaVuSans.ttf");

const LABEL_FONT_SIZE: f32 = 16.0;
const LABEL_PADDING: i32 = 2;
const BOX_THICKNESS: i32 = 2;
const CAPTION_OFFSET: i32 = 5;
const IDENTITY_OFFSET: i32 = 10;

pub struct Annotator {
    palette: ClassPalette,
    font: Option<FontArc>,
    font_size: f32,
}

/// The embedded label font. `None` only if the bundled file fails to parse.
pub fn default_font() -> Option<FontArc> {
    match FontArc::try_from_slice(DEFAULT_FONT) {
        Ok(font) => Some(font),
        Err(error) => {
            warn!(%error, "embedded font rejected, labels will not be drawn");
            None
        }
    }
}

impl Default for Annotator {
    fn default() -> Self {
        Self::with_optional_font(default_font())
    }
}

impl Annotator {
    /// Annotator drawing labels with `font` instead of the embedded one.
    pub fn new(font: FontArc) -> Self {
        Self::with_optional_font(Some(font))
    }

    fn with_optional_font(font: Option<FontArc>) -> Self {
        Self {
            palette: ClassPalette::new(),
            font,
            font_size: LABEL_FONT_SIZE,
        }
    }

    pub fn with_font_size(mut self, font_size: f32) -> Self {
        self.font_size = font_size;
        self
    }

    pub fn palette(&self) -> &ClassPalette {
        &self.palette
    }

    /// Box color for a detection.
    pub fn color_for(&self, det: &Detection) -> Rgb<u8> {
        match det.kind {
            DetectionKind::Object { class_id } => self.palette.color(class_id).unwrap_or(FALLBACK_COLOR),
            DetectionKind::Face => FACE_COLOR,
            DetectionKind::Person => PERSON_COLOR,
            DetectionKind::Color(class) => class.display_color(),
            DetectionKind::Shape(_) => SHAPE_COLOR,
        }
    }

    /// Box plus caption. Neural captions sit on a filled tab in the class color.
    pub fn draw_detection(&self, canvas: &mut RgbImage, det: &Detection) {
        let Some(rect) = det.rect.to_pixel_rect() else {
            return;
        };
        let color = self.color_for(det);
        draw_thick_rect(canvas, rect, color);

        let Some(font) = &self.font else {
            return;
        };
        let scale = PxScale::from(self.font_size);
        let caption = det.caption();

        match det.kind {
            DetectionKind::Object { .. } => {
                let (text_w, text_h) = text_size(scale, font, &caption);
                let tab_w = text_w as i32 + 2 * LABEL_PADDING;
                let tab_h = text_h as i32 + 2 * LABEL_PADDING;
                let tab_x = rect.left();
                let tab_y = (rect.top() - tab_h).max(0);
                draw_filled_rect_mut(
                    canvas,
                    PixelRect::at(tab_x, tab_y).of_size(tab_w.max(1) as u32, tab_h.max(1) as u32),
                    color,
                );
                draw_text_mut(
                    canvas,
                    LABEL_TEXT_COLOR,
                    tab_x + LABEL_PADDING,
                    tab_y + LABEL_PADDING,
                    scale,
                    font,
                    &caption,
                );
            }
            _ => {
                let y = rect.top() - CAPTION_OFFSET - self.font_size as i32;
                draw_text_mut(canvas, color, rect.left(), y, scale, font, &caption);
            }
        }
    }

    /// `"ID: n"` in magenta just above the box.
    pub fn draw_identity(&self, canvas: &mut RgbImage, rect: &Rect, id: u64) {
        let Some(font) = &self.font else {
            return;
        };
        if rect.is_degenerate() {
            return;
        }
        let y = rect.y.round() as i32 - IDENTITY_OFFSET - self.font_size as i32;
        draw_text_mut(
            canvas,
            IDENTITY_COLOR,
            rect.x.round() as i32,
            y,
            PxScale::from(self.font_size),
            font,
            &format!("ID: {id}"),
        );
    }

    pub fn draw_keypoints(&self, canvas: &mut RgbImage, keypoints: &[Keypoint], radius: i32) {
        for kp in keypoints {
            draw_filled_circle_mut(canvas, (kp.x as i32, kp.y as i32), radius, KEYPOINT_COLOR);
        }
    }
}

fn draw_thick_rect(canvas: &mut RgbImage, rect: PixelRect, color: Rgb<u8>) {
    for inset in 0..BOX_THICKNESS {
        let w = rect.width() as i32 - 2 * inset;
        let h = rect.height() as i32 - 2 * inset;
        if w <= 0 || h <= 0 {
            break;
        }
        let r = PixelRect::at(rect.left() + inset, rect.top() + inset).of_size(w as u32, h as u32);
        draw_hollow_rect_mut(canvas, r, color);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detection::DetectorKind;
    use crate::detector::ColorClass;

    #[test]
    fn test_box_is_drawn_in_class_color() {
        let mut canvas = RgbImage::new(100, 100);
        let det = Detection::new(
            Rect::new(10.0, 10.0, 40.0, 30.0),
            "blue",
            DetectionKind::Color(ColorClass::Blue),
            DetectorKind::Color,
        );
        Annotator::default().draw_detection(&mut canvas, &det);

        assert_eq!(*canvas.get_pixel(10, 10), Rgb([0, 0, 255]));
        assert_eq!(*canvas.get_pixel(11, 20), Rgb([0, 0, 255]));
        assert_eq!(*canvas.get_pixel(30, 25), Rgb([0, 0, 0]));
    }

    #[test]
    fn test_box_outside_canvas_is_clipped() {
        let mut canvas = RgbImage::new(50, 50);
        let det = Detection::new(
            Rect::new(-20.0, 40.0, 100.0, 100.0),
            "face",
            DetectionKind::Face,
            DetectorKind::Cascade,
        );
        Annotator::default().draw_detection(&mut canvas, &det);
        assert_eq!(*canvas.get_pixel(10, 40), FACE_COLOR);
    }

    #[test]
    fn test_keypoints_are_cyan() {
        let mut canvas = RgbImage::new(20, 20);
        let kp = Keypoint {
            x: 10,
            y: 10,
            score: 1.0,
        };
        Annotator::default().draw_keypoints(&mut canvas, &[kp], 2);
        assert_eq!(*canvas.get_pixel(10, 10), KEYPOINT_COLOR);
    }

    #[test]
    fn test_embedded_font_draws_labels() {
        assert!(default_font().is_some());

        let mut canvas = RgbImage::new(120, 120);
        let det = Detection::new(
            Rect::new(20.0, 60.0, 40.0, 40.0),
            "face",
            DetectionKind::Face,
            DetectorKind::Cascade,
        );
        let annotator = Annotator::default();
        annotator.draw_detection(&mut canvas, &det);
        let caption_pixels = (0..60)
            .flat_map(|y| (0..120).map(move |x| (x, y)))
            .filter(|&(x, y)| canvas.get_pixel(x, y).0[1] > 0)
            .count();
        assert!(caption_pixels > 0);

        annotator.draw_identity(&mut canvas, &det.rect, 7);
        let identity_pixels = (0..60)
            .flat_map(|y| (0..120).map(move |x| (x, y)))
            .filter(|&(x, y)| {
                let [r, _, b] = canvas.get_pixel(x, y).0;
                r > 0 && b > 0
            })
            .count();
        assert!(identity_pixels > 0);
    }

    #[test]
    fn test_object_color_comes_from_palette() {
        let annotator = Annotator::default();
        let det = Detection::new(
            Rect::new(0.0, 0.0, 5.0, 5.0),
            "dog",
            DetectionKind::Object { class_id: 16 },
            DetectorKind::Neural,
        );
        assert_eq!(Some(annotator.color_for(&det)), annotator.palette().color(16));
    }
}
