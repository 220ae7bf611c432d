//! Greedy non-maximum suppression.

use crate::geometry::Rect;

/// Class-agnostic greedy NMS.
///
/// Candidates scoring `<= score_threshold` are discarded first. The rest are
/// visited in descending score order (ties keep input order); a candidate is
/// accepted unless its IoU with an already accepted box exceeds
/// `iou_threshold`. Returns indices into `boxes`, highest score first.
pub fn nms_boxes(boxes: &[Rect], scores: &[f32], score_threshold: f32, iou_threshold: f32) -> Vec<usize> {
    debug_assert_eq!(boxes.len(), scores.len());

    let mut order: Vec<usize> = (0..boxes.len().min(scores.len()))
        .filter(|&i| scores[i] > score_threshold)
        .collect();
    order.sort_by(|&a, &b| scores[b].total_cmp(&scores[a]));

    let mut kept: Vec<usize> = Vec::new();
    for idx in order {
        let suppressed = kept
            .iter()
            .any(|&k| boxes[k].iou(&boxes[idx]) > iou_threshold);
        if !suppressed {
            kept.push(idx);
        }
    }
    kept
}
