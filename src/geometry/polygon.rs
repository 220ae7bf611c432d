//! Helpers over contour point chains.

use image::GrayImage;
use imageproc::contours::{BorderType, find_contours};
use imageproc::geometry::approximate_polygon_dp;
use imageproc::point::Point;

use crate::geometry::Rect;

/// Absolute area enclosed by a closed point chain (shoelace formula).
pub fn polygon_area(points: &[Point<i32>]) -> f64 {
    if points.len() < 3 {
        return 0.0;
    }
    let mut twice_area = 0i64;
    for (i, p) in points.iter().enumerate() {
        let q = points[(i + 1) % points.len()];
        twice_area += p.x as i64 * q.y as i64 - q.x as i64 * p.y as i64;
    }
    (twice_area as f64 / 2.0).abs()
}

/// Outer borders of the top-level foreground regions of a binary mask.
///
/// Holes and regions nested inside holes are skipped.
pub fn external_contours(mask: &GrayImage) -> Vec<Vec<Point<i32>>> {
    find_contours::<i32>(mask)
        .into_iter()
        .filter(|c| c.border_type == BorderType::Outer && c.parent.is_none())
        .map(|c| c.points)
        .collect()
}

/// Smallest upright rectangle covering every point, counting pixels inclusively.
pub fn bounding_rect(points: &[Point<i32>]) -> Rect {
    let Some(first) = points.first() else {
        return Rect::default();
    };
    let (mut min_x, mut min_y, mut max_x, mut max_y) = (first.x, first.y, first.x, first.y);
    for p in points {
        min_x = min_x.min(p.x);
        min_y = min_y.min(p.y);
        max_x = max_x.max(p.x);
        max_y = max_y.max(p.y);
    }
    Rect::new(
        min_x as f32,
        min_y as f32,
        (max_x - min_x + 1) as f32,
        (max_y - min_y + 1) as f32,
    )
}

fn farthest_from(points: &[Point<i32>], origin: Point<i32>) -> usize {
    let mut best = 0;
    let mut best_dist = -1i64;
    for (i, p) in points.iter().enumerate() {
        let (dx, dy) = ((p.x - origin.x) as i64, (p.y - origin.y) as i64);
        let dist = dx * dx + dy * dy;
        if dist > best_dist {
            best_dist = dist;
            best = i;
        }
    }
    best
}

/// Douglas-Peucker simplification of a closed contour.
///
/// The chain is split at two mutually distant points, which are extreme points
/// of the shape and therefore true corners, and each half is simplified as an
/// open curve. The returned polygon does not repeat its first vertex.
pub fn approximate_closed_polygon(points: &[Point<i32>], epsilon: f64) -> Vec<Point<i32>> {
    if points.len() < 3 || epsilon <= 0.0 {
        return points.to_vec();
    }

    let a = farthest_from(points, points[0]);
    let b = farthest_from(points, points[a]);
    let (start, end) = (a.min(b), a.max(b));
    if start == end {
        return vec![points[start]];
    }

    let first_half = &points[start..=end];
    let second_half: Vec<Point<i32>> = points[end..]
        .iter()
        .chain(points[..=start].iter())
        .copied()
        .collect();

    let mut polygon = approximate_polygon_dp(first_half, epsilon, false);
    let closing = approximate_polygon_dp(&second_half, epsilon, false);

    // Both halves carry the split points at their ends.
    polygon.pop();
    if closing.len() > 1 {
        polygon.extend_from_slice(&closing[..closing.len() - 1]);
    }
    polygon.dedup();
    polygon
}

#[cfg(test)]
mod tests {
    use super::*;

    fn square_outline(x0: i32, y0: i32, side: i32) -> Vec<Point<i32>> {
        let mut pts = Vec::new();
        for x in x0..x0 + side {
            pts.push(Point::new(x, y0));
        }
        for y in y0..y0 + side {
            pts.push(Point::new(x0 + side, y));
        }
        for x in (x0 + 1..=x0 + side).rev() {
            pts.push(Point::new(x, y0 + side));
        }
        for y in (y0 + 1..=y0 + side).rev() {
            pts.push(Point::new(x0, y));
        }
        pts
    }

    #[test]
    fn test_polygon_area_square() {
        let pts = vec![
            Point::new(0, 0),
            Point::new(10, 0),
            Point::new(10, 10),
            Point::new(0, 10),
        ];
        assert_eq!(polygon_area(&pts), 100.0);
        let reversed: Vec<_> = pts.iter().rev().copied().collect();
        assert_eq!(polygon_area(&reversed), 100.0);
    }

    #[test]
    fn test_bounding_rect_is_inclusive() {
        let pts = vec![Point::new(5, 7), Point::new(44, 7), Point::new(44, 46)];
        assert_eq!(bounding_rect(&pts), Rect::new(5.0, 7.0, 40.0, 40.0));
    }

    #[test]
    fn test_external_contours_skip_holes() {
        let mut mask = GrayImage::new(60, 60);
        for y in 10..50 {
            for x in 10..50 {
                let ring = !(20..40).contains(&x) || !(20..40).contains(&y);
                if ring {
                    mask.put_pixel(x, y, image::Luma([255]));
                }
            }
        }
        let contours = external_contours(&mask);
        assert_eq!(contours.len(), 1);
        assert_eq!(bounding_rect(&contours[0]), Rect::new(10.0, 10.0, 40.0, 40.0));
    }

    #[test]
    fn test_approximate_square_outline() {
        let pts = square_outline(10, 10, 50);
        let poly = approximate_closed_polygon(&pts, 4.0);
        assert_eq!(poly.len(), 4);
    }
}
