/// Axis-aligned bounding box in pixel units, stored as top-left corner plus size.
///
/// The Kalman filter works on the center form; see [`Rect::from_center`].
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Rect {
    /// Top-left x coordinate
    pub x: f32,
    /// Top-left y coordinate
    pub y: f32,
    /// Width of the bounding box
    pub width: f32,
    /// Height of the bounding box
    pub height: f32,
}

impl Rect {
    /// Create a new Rect from top-left coordinates and dimensions (TLWH format).
    #[inline]
    pub fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Create a Rect from its center point and dimensions.
    #[inline]
    pub fn from_center(cx: f32, cy: f32, width: f32, height: f32) -> Self {
        Self {
            x: cx - width / 2.0,
            y: cy - height / 2.0,
            width,
            height,
        }
    }

    /// Get the center point of the bounding box.
    #[inline]
    pub fn center(&self) -> (f32, f32) {
        (self.x + self.width / 2.0, self.y + self.height / 2.0)
    }

    /// Get the area of the bounding box.
    #[inline]
    pub fn area(&self) -> f32 {
        self.width * self.height
    }

    /// A box with no extent, or with non-finite coordinates, is never rendered or tracked.
    #[inline]
    pub fn is_degenerate(&self) -> bool {
        !(self.width > 0.0 && self.height > 0.0)
            || !self.x.is_finite()
            || !self.y.is_finite()
            || !self.width.is_finite()
            || !self.height.is_finite()
    }

    /// Calculate Intersection over Union (IoU) with another bounding box.
    pub fn iou(&self, other: &Rect) -> f32 {
        let x1 = self.x.max(other.x);
        let y1 = self.y.max(other.y);
        let x2 = (self.x + self.width).min(other.x + other.width);
        let y2 = (self.y + self.height).min(other.y + other.height);

        let inter_width = (x2 - x1).max(0.0);
        let inter_height = (y2 - y1).max(0.0);
        let inter_area = inter_width * inter_height;

        let union_area = self.area() + other.area() - inter_area;

        if union_area > 0.0 {
            inter_area / union_area
        } else {
            0.0
        }
    }

    /// Euclidean distance between the centers of two boxes.
    pub fn centroid_distance(&self, other: &Rect) -> f32 {
        let (ax, ay) = self.center();
        let (bx, by) = other.center();
        ((ax - bx).powi(2) + (ay - by).powi(2)).sqrt()
    }

    /// Whether `other` lies inside this box grown by `(dx, dy)` on every side.
    pub fn contains_with_margin(&self, other: &Rect, dx: f32, dy: f32) -> bool {
        other.x >= self.x - dx
            && other.y >= self.y - dy
            && other.x + other.width <= self.x + self.width + dx
            && other.y + other.height <= self.y + self.height + dy
    }

    /// Integer pixel rectangle for drawing, `None` when the box is degenerate.
    pub fn to_pixel_rect(&self) -> Option<imageproc::rect::Rect> {
        if self.is_degenerate() {
            return None;
        }
        let width = self.width.round().max(1.0) as u32;
        let height = self.height.round().max(1.0) as u32;
        Some(imageproc::rect::Rect::at(self.x.round() as i32, self.y.round() as i32).of_size(width, height))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_center_and_area() {
        let rect = Rect::new(10.0, 20.0, 30.0, 40.0);
        assert_eq!(rect.center(), (25.0, 40.0));
        assert_eq!(rect.area(), 1200.0);
    }

    #[test]
    fn test_from_center() {
        let rect = Rect::from_center(25.0, 40.0, 30.0, 40.0);
        assert!((rect.x - 10.0).abs() < 1e-6);
        assert!((rect.y - 20.0).abs() < 1e-6);
        assert!((rect.width - 30.0).abs() < 1e-6);
        assert!((rect.height - 40.0).abs() < 1e-6);
    }

    #[test]
    fn test_iou() {
        let a = Rect::new(0.0, 0.0, 10.0, 10.0);
        let b = Rect::new(5.0, 5.0, 10.0, 10.0);

        // Intersection: 5x5 = 25
        // Union: 100 + 100 - 25 = 175
        let iou = a.iou(&b);
        assert!((iou - 25.0 / 175.0).abs() < 1e-6);
    }

    #[test]
    fn test_iou_no_overlap() {
        let a = Rect::new(0.0, 0.0, 10.0, 10.0);
        let b = Rect::new(20.0, 20.0, 10.0, 10.0);
        assert_eq!(a.iou(&b), 0.0);
    }

    #[test]
    fn test_iou_same_box() {
        let a = Rect::new(0.0, 0.0, 10.0, 10.0);
        assert!((a.iou(&a) - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_iou_degenerate_boxes() {
        let a = Rect::new(3.0, 3.0, 0.0, 0.0);
        assert_eq!(a.iou(&a), 0.0);
    }

    #[test]
    fn test_centroid_distance() {
        let a = Rect::new(0.0, 0.0, 10.0, 10.0);
        let b = Rect::new(30.0, 40.0, 10.0, 10.0);
        assert!((a.centroid_distance(&b) - 50.0).abs() < 1e-6);
    }

    #[test]
    fn test_degenerate() {
        assert!(Rect::new(0.0, 0.0, 0.0, 5.0).is_degenerate());
        assert!(Rect::new(0.0, 0.0, 5.0, -1.0).is_degenerate());
        assert!(Rect::new(f32::NAN, 0.0, 5.0, 5.0).is_degenerate());
        assert!(!Rect::new(0.0, 0.0, 5.0, 5.0).is_degenerate());
        assert!(Rect::new(0.0, 0.0, 0.0, 5.0).to_pixel_rect().is_none());
    }
}
