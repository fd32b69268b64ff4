// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license

//! Post-processing for YOLO detection outputs.
//!
//! Turns the raw output tensor into one [`DetectionSet`] per batch image:
//! confidence filtering, box rescaling to the original image, and per-class
//! NMS.

use ndarray::{Array2, ArrayView2, s};

use crate::config::CounterConfig;
use crate::error::{CounterError, Result};
use crate::prediction::{Detection, DetectionSet};
use crate::preprocessing::{PreprocessResult, clip_coords, scale_coords};
use crate::utils::nms_per_class;

/// How predictions are laid out in a detection output tensor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OutputLayout {
    /// Number of images in the batch dimension.
    pub batch: usize,
    /// Number of candidate predictions per image.
    pub num_predictions: usize,
    /// Number of class score columns.
    pub num_classes: usize,
    /// `true` for `[.., num_preds, num_features]`, `false` for `[.., num_features, num_preds]`.
    pub transposed: bool,
    /// Whether column 4 is a YOLOv5-style objectness score.
    pub objectness: bool,
}

impl OutputLayout {
    /// Features per prediction: 4 box values, optional objectness, class scores.
    #[must_use]
    pub const fn num_features(&self) -> usize {
        4 + self.objectness as usize + self.num_classes
    }

    /// Number of `f32` values belonging to one batch image.
    #[must_use]
    pub const fn per_image(&self) -> usize {
        self.num_features() * self.num_predictions
    }
}

/// Work out the layout of a detection output.
///
/// Anchor-free heads (YOLOv5u/v8/11) emit `4 + nc` features, YOLOv5 heads emit
/// `5 + nc` with an objectness column. When the class table is known the
/// feature count is matched exactly. Otherwise the smaller dimension is taken
/// as the feature axis. Returns `None` for shapes that are not a detection head
/// or hold no predictions.
#[must_use]
pub fn parse_detect_shape(shape: &[usize], expected_classes: usize) -> Option<OutputLayout> {
    let (batch, a, b) = match *shape {
        [a, b] => (1, a, b),
        [batch, a, b] => (batch, a, b),
        _ => return None,
    };

    if batch == 0 || a == 0 || b == 0 || (a < 5 && b < 5) {
        return None;
    }

    let layout = |features: usize, num_predictions: usize, transposed: bool, objectness: bool| {
        features
            .checked_sub(4 + usize::from(objectness))
            .filter(|&num_classes| num_classes > 0)
            .map(|num_classes| OutputLayout {
                batch,
                num_predictions,
                num_classes,
                transposed,
                objectness,
            })
    };

    if expected_classes > 0 {
        let anchor_free = 4 + expected_classes;
        let with_objectness = 5 + expected_classes;
        if a == anchor_free {
            return layout(a, b, false, false);
        }
        if b == anchor_free {
            return layout(b, a, true, false);
        }
        if b == with_objectness {
            return layout(b, a, true, true);
        }
        if a == with_objectness {
            return layout(a, b, false, true);
        }
    }

    // Unknown or mismatched class table: the feature axis is the shorter one
    if a <= b {
        layout(a, b, false, false)
    } else {
        layout(b, a, true, false)
    }
}

/// Decode a raw detection output into one detection set per batch image.
///
/// # Arguments
///
/// * `output` - Flat output tensor data.
/// * `output_shape` - Output tensor shape.
/// * `preprocess` - Letterbox transform used for the input.
/// * `config` - Thresholds and detection cap.
/// * `num_classes` - Size of the model's class table (`0` if unknown).
///
/// # Errors
///
/// Returns [`CounterError::InferenceError`] if the shape is not a detection
/// head or the data length does not match the shape.
pub fn postprocess(
    output: &[f32],
    output_shape: &[usize],
    preprocess: &PreprocessResult,
    config: &CounterConfig,
    num_classes: usize,
) -> Result<Vec<DetectionSet>> {
    let Some(layout) = parse_detect_shape(output_shape, num_classes) else {
        // A rank 2/3 output with a zero axis is a head that predicted nothing
        if matches!(output_shape.len(), 2 | 3) && output_shape.contains(&0) {
            return Ok(vec![DetectionSet::new(preprocess.orig_shape, Vec::new())]);
        }
        return Err(CounterError::InferenceError(format!(
            "Unsupported output shape {output_shape:?} for a detection model with {num_classes} classes"
        )));
    };

    if output.len() != layout.batch * layout.per_image() {
        return Err(CounterError::InferenceError(format!(
            "Output shape {output_shape:?} does not match {} values",
            output.len()
        )));
    }

    output
        .chunks_exact(layout.per_image())
        .map(|chunk| -> Result<DetectionSet> {
            let (features, preds) = (layout.num_features(), layout.num_predictions);
            let rows = if layout.transposed {
                Array2::from_shape_vec((preds, features), chunk.to_vec())
            } else {
                Array2::from_shape_vec((features, preds), chunk.to_vec()).map(Array2::reversed_axes)
            };
            let rows = rows
                .map_err(|e| CounterError::InferenceError(format!("Malformed output tensor: {e}")))?;

            let detections = extract_detections(rows.view(), &layout, preprocess, config);
            Ok(DetectionSet::new(preprocess.orig_shape, detections))
        })
        .collect()
}

/// Extract detections from a `[num_preds, num_features]` view.
fn extract_detections(
    rows: ArrayView2<f32>,
    layout: &OutputLayout,
    preprocess: &PreprocessResult,
    config: &CounterConfig,
) -> Vec<Detection> {
    let class_start = 4 + usize::from(layout.objectness);
    let mut candidates = Vec::new();

    for row in rows.rows() {
        let objectness = if layout.objectness { row[4] } else { 1.0 };

        // Treat NaN as lowest so a corrupt score can't win or panic
        let (best_class, best_score) = row
            .slice(s![class_start..])
            .iter()
            .map(|&v| if v.is_nan() { 0.0 } else { v })
            .enumerate()
            .max_by(|(_, a), (_, b)| a.total_cmp(b))
            .unwrap_or((0, 0.0));

        let score = best_score * if objectness.is_nan() { 0.0 } else { objectness };
        if score <= config.confidence_threshold {
            continue;
        }

        let (cx, cy, w, h) = (row[0], row[1], row[2], row[3]);
        let xyxy = [cx - w / 2.0, cy - h / 2.0, cx + w / 2.0, cy + h / 2.0];
        let scaled = scale_coords(&xyxy, preprocess.scale, preprocess.padding);
        let clipped = clip_coords(&scaled, preprocess.orig_shape);

        candidates.push((clipped, score, best_class));
    }

    nms_per_class(&candidates, config.iou_threshold)
        .into_iter()
        .take(config.max_detections)
        .map(|i| {
            let (bbox, score, class_id) = candidates[i];
            Detection::new(bbox, score, class_id)
        })
        .collect()
}
