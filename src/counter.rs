// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license

//! Per-class detection counting.
//!
//! [`run`] invokes a [`Detector`] on one image and tallies detections per
//! class. [`count`] does the tally alone for an existing [`Prediction`].
//!
//! Counts are produced per detection set (one per batch image), in ascending
//! class-identifier order within each set.

use std::collections::BTreeMap;
use std::fmt;

use image::DynamicImage;

use crate::error::Result;
use crate::model::Detector;
use crate::prediction::Prediction;

/// Number of detections of one class.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DetectionCount {
    /// Class name resolved through the model's name table.
    pub class_name: String,
    /// Number of detections carrying this class (always at least 1).
    pub count: usize,
}

impl DetectionCount {
    /// Create a new count entry.
    #[must_use]
    pub fn new(class_name: impl Into<String>, count: usize) -> Self {
        Self {
            class_name: class_name.into(),
            count,
        }
    }
}

/// Renders as `"<count> <class_name>"`.
impl fmt::Display for DetectionCount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.count, self.class_name)
    }
}

/// Run the model on an image and count detections per class.
///
/// # Errors
///
/// Propagates any error raised by the detector.
///
/// # Example
///
/// ```no_run
/// use detection_counter::{YoloModel, counter, source};
///
/// let mut model = YoloModel::load("strawberry.onnx")?;
/// let image = source::load_image("field.jpg")?;
/// for entry in counter::run(&image, &mut model)? {
///     println!("{entry}");
/// }
/// # Ok::<(), detection_counter::CounterError>(())
/// ```
pub fn run<D: Detector + ?Sized>(
    image: &DynamicImage,
    model: &mut D,
) -> Result<Vec<DetectionCount>> {
    let prediction = model.detect(image)?;
    Ok(count(&prediction))
}

/// Count detections per class in a prediction.
///
/// Each detection set is tallied in a single pass into a class-id keyed map,
/// so every emitted class is present with `count >= 1`.
#[must_use]
pub fn count(prediction: &Prediction) -> Vec<DetectionCount> {
    prediction
        .sets
        .iter()
        .flat_map(|set| {
            let mut tally: BTreeMap<usize, usize> = BTreeMap::new();
            for class_id in set.class_ids() {
                *tally.entry(class_id).or_insert(0) += 1;
            }
            tally
        })
        .map(|(class_id, n)| DetectionCount::new(prediction.class_name(class_id), n))
        .collect()
}

/// Join counts into a single summary like `"3 strawberry, 1 flower"`.
///
/// Returns `"(no detections)"` when `counts` is empty.
#[must_use]
pub fn summarize(counts: &[DetectionCount]) -> String {
    if counts.is_empty() {
        return "(no detections)".to_string();
    }

    counts
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}
