use crate::detection::Detection;

use tracing::debug;

/// Greedy class-agnostic non-maximum suppression.
///
/// Candidates are visited by descending score, equal scores keeping their
/// input order. Each accepted detection removes every remaining one whose
/// IoU with it is at least `iou_threshold`.
pub fn non_maximum_suppression(dets: Vec<Detection>, iou_threshold: f32) -> Vec<Detection> {
    let total = dets.len();
    let mut order: Vec<usize> = (0..total).collect();

    // stable sort, so ties stay in index order; NaN scores order ahead of all others
    order.sort_by(|&a, &b| dets[b].score.total_cmp(&dets[a].score));

    let mut retain = vec![false; total];
    let mut suppressed = vec![false; total];

    for (pos, &idx) in order.iter().enumerate() {
        if suppressed[idx] {
            continue;
        }

        retain[idx] = true;

        for &other in &order[pos + 1..] {
            if !suppressed[other] && dets[idx].iou(&dets[other]) >= iou_threshold {
                suppressed[other] = true;
            }
        }
    }

    let mut slots: Vec<Option<Detection>> = dets.into_iter().map(Some).collect();
    let kept: Vec<Detection> = order
        .into_iter()
        .filter(|&idx| retain[idx])
        .filter_map(|idx| slots[idx].take())
        .collect();

    debug!(total, kept = kept.len(), "suppressed overlapping detections");

    kept
}
