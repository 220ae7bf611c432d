//! Clustering of overlapping sliding-window hits into single detections.

use crate::geometry::Rect;

/// A merged rectangle together with the number of raw hits that formed it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RectGroup {
    pub rect: Rect,
    pub neighbors: usize,
}

/// Two hits belong to the same object when every edge differs by at most
/// `eps * (min width + min height) / 2`.
fn similar(a: &Rect, b: &Rect, eps: f32) -> bool {
    let delta = eps * (a.width.min(b.width) + a.height.min(b.height)) * 0.5;
    (a.x - b.x).abs() <= delta
        && (a.y - b.y).abs() <= delta
        && (a.x + a.width - b.x - b.width).abs() <= delta
        && (a.y + a.height - b.y - b.height).abs() <= delta
}

fn find(parent: &mut [usize], mut i: usize) -> usize {
    while parent[i] != i {
        parent[i] = parent[parent[i]];
        i = parent[i];
    }
    i
}

/// Partition `rects` into equivalence classes of similar boxes, average each
/// class and keep the classes that collected more than `group_threshold` hits.
///
/// A surviving class is also dropped when it sits inside a stronger class
/// (more than `max(3, own hits)` neighbors). A threshold of zero returns the
/// input untouched, one group per rectangle.
pub fn group_rectangles(rects: &[Rect], group_threshold: usize, eps: f32) -> Vec<RectGroup> {
    if group_threshold == 0 || rects.is_empty() {
        return rects
            .iter()
            .map(|&rect| RectGroup { rect, neighbors: 1 })
            .collect();
    }

    let mut parent: Vec<usize> = (0..rects.len()).collect();
    for i in 0..rects.len() {
        for j in (i + 1)..rects.len() {
            if similar(&rects[i], &rects[j], eps) {
                let (ri, rj) = (find(&mut parent, i), find(&mut parent, j));
                if ri != rj {
                    parent[rj] = ri;
                }
            }
        }
    }

    // Accumulate per root, preserving first-seen order for determinism.
    let mut order: Vec<usize> = Vec::new();
    let mut sums: Vec<([f32; 4], usize)> = vec![([0.0; 4], 0); rects.len()];
    for (i, rect) in rects.iter().enumerate() {
        let root = find(&mut parent, i);
        let (acc, count) = &mut sums[root];
        if *count == 0 {
            order.push(root);
        }
        acc[0] += rect.x;
        acc[1] += rect.y;
        acc[2] += rect.width;
        acc[3] += rect.height;
        *count += 1;
    }

    let classes: Vec<RectGroup> = order
        .into_iter()
        .map(|root| {
            let (acc, count) = sums[root];
            let n = count as f32;
            RectGroup {
                rect: Rect::new(
                    (acc[0] / n).round(),
                    (acc[1] / n).round(),
                    (acc[2] / n).round(),
                    (acc[3] / n).round(),
                ),
                neighbors: count,
            }
        })
        .collect();

    classes
        .iter()
        .enumerate()
        .filter(|(_, group)| group.neighbors > group_threshold)
        .filter(|(i, group)| {
            !classes.iter().enumerate().any(|(j, other)| {
                if *i == j || other.neighbors <= group_threshold {
                    return false;
                }
                let dx = (other.rect.width * eps).round();
                let dy = (other.rect.height * eps).round();
                other.rect.contains_with_margin(&group.rect, dx, dy)
                    && (other.neighbors > group.neighbors.max(3) || group.neighbors < 3)
            })
        })
        .map(|(_, group)| *group)
        .collect()
}
