//! Matching utilities for identity assignment.

use crate::geometry::Rect;

/// Candidate nearest to `target` by centroid distance, if strictly closer than `max_distance`.
///
/// Ties go to the earliest candidate in iteration order.
pub fn nearest_within<'a, I>(candidates: I, target: &Rect, max_distance: f32) -> Option<u64>
where
    I: IntoIterator<Item = (u64, &'a Rect)>,
{
    let mut best: Option<(u64, f32)> = None;
    for (id, rect) in candidates {
        let distance = rect.centroid_distance(target);
        if !distance.is_finite() || distance >= max_distance {
            continue;
        }
        match best {
            Some((_, best_distance)) if distance >= best_distance => {}
            _ => best = Some((id, distance)),
        }
    }
    best.map(|(id, _)| id)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_threshold_is_exclusive() {
        let a = Rect::new(0.0, 0.0, 10.0, 10.0);
        let target = Rect::new(100.0, 0.0, 10.0, 10.0);
        assert_eq!(nearest_within([(0, &a)], &target, 100.0), None);
        assert_eq!(nearest_within([(0, &a)], &target, 100.5), Some(0));
    }

    #[test]
    fn test_tie_goes_to_first() {
        let left = Rect::new(0.0, 0.0, 10.0, 10.0);
        let right = Rect::new(20.0, 0.0, 10.0, 10.0);
        let target = Rect::new(10.0, 0.0, 10.0, 10.0);
        assert_eq!(nearest_within([(4, &left), (7, &right)], &target, 100.0), Some(4));
        assert_eq!(nearest_within([(7, &right), (4, &left)], &target, 100.0), Some(7));
    }
}
