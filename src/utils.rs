// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license

//! Box geometry helpers and Non-Maximum Suppression.

use std::cmp::Ordering;

/// Calculate Intersection over Union (`IoU`) between two boxes in xyxy format.
#[must_use]
pub fn calculate_iou(box1: &[f32; 4], box2: &[f32; 4]) -> f32 {
    let x1 = box1[0].max(box2[0]);
    let y1 = box1[1].max(box2[1]);
    let x2 = box1[2].min(box2[2]);
    let y2 = box1[3].min(box2[3]);

    let intersection = (x2 - x1).max(0.0) * (y2 - y1).max(0.0);
    let area1 = (box1[2] - box1[0]) * (box1[3] - box1[1]);
    let area2 = (box2[2] - box2[0]) * (box2[3] - box2[1]);
    let union = area1 + area2 - intersection;

    if union <= 0.0 {
        0.0
    } else {
        intersection / union
    }
}

/// Per-class Non-Maximum Suppression.
///
/// Only suppresses boxes within the same class. Returns the indices of kept
/// boxes ordered by descending score.
///
/// # Arguments
///
/// * `boxes` - Candidates as `(bbox, score, class_id)`.
/// * `iou_threshold` - Boxes overlapping a kept box of the same class by more
///   than this are dropped.
#[must_use]
pub fn nms_per_class(boxes: &[([f32; 4], f32, usize)], iou_threshold: f32) -> Vec<usize> {
    if boxes.is_empty() {
        return vec![];
    }

    let mut indices: Vec<usize> = (0..boxes.len()).collect();
    indices.sort_by(|&a, &b| {
        boxes[b]
            .1
            .partial_cmp(&boxes[a].1)
            .unwrap_or(Ordering::Equal)
    });

    let mut keep = vec![];
    let mut suppressed = vec![false; boxes.len()];

    for (pos, &i) in indices.iter().enumerate() {
        if suppressed[i] {
            continue;
        }
        keep.push(i);

        let class_i = boxes[i].2;
        for &j in &indices[pos + 1..] {
            if !suppressed[j]
                && boxes[j].2 == class_i
                && calculate_iou(&boxes[i].0, &boxes[j].0) > iou_threshold
            {
                suppressed[j] = true;
            }
        }
    }

    keep
}
