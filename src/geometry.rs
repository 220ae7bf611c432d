mod group;
mod polygon;
mod rect;

pub use group::{RectGroup, group_rectangles};
pub use polygon::{approximate_closed_polygon, bounding_rect, external_contours, polygon_area};
pub use rect::Rect;
