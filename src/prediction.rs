// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license

//! Prediction types produced by a detection model.
//!
//! A [`Prediction`] is the full output of one inference call: one
//! [`DetectionSet`] per image in the output batch, plus the model's
//! class-name table used to resolve class identifiers.

use std::collections::HashMap;

/// A single detected object instance.
#[derive(Debug, Clone, PartialEq)]
pub struct Detection {
    /// Bounding box `[x1, y1, x2, y2]` in original image pixels.
    pub bbox: [f32; 4],
    /// Confidence score (0.0 to 1.0).
    pub confidence: f32,
    /// Index into the model's class-name table.
    pub class_id: usize,
}

impl Detection {
    /// Create a new detection.
    #[must_use]
    pub const fn new(bbox: [f32; 4], confidence: f32, class_id: usize) -> Self {
        Self {
            bbox,
            confidence,
            class_id,
        }
    }
}

/// Detections for one image.
#[derive(Debug, Clone, Default)]
pub struct DetectionSet {
    /// Original image shape (height, width) the boxes refer to.
    pub orig_shape: (u32, u32),
    /// Detections, sorted by descending confidence.
    pub detections: Vec<Detection>,
}

impl DetectionSet {
    /// Create a detection set for an image of the given (height, width).
    #[must_use]
    pub const fn new(orig_shape: (u32, u32), detections: Vec<Detection>) -> Self {
        Self {
            orig_shape,
            detections,
        }
    }

    /// Number of detections in this set.
    #[must_use]
    pub fn len(&self) -> usize {
        self.detections.len()
    }

    /// Check if nothing was detected.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.detections.is_empty()
    }

    /// Iterate over the class identifier of every detection.
    pub fn class_ids(&self) -> impl Iterator<Item = usize> + '_ {
        self.detections.iter().map(|d| d.class_id)
    }
}

/// Full output of one inference call.
#[derive(Debug, Clone, Default)]
pub struct Prediction {
    /// One detection set per image in the output batch.
    pub sets: Vec<DetectionSet>,
    /// Class ID to name mapping.
    pub names: HashMap<usize, String>,
}

impl Prediction {
    /// Create a new prediction.
    #[must_use]
    pub const fn new(sets: Vec<DetectionSet>, names: HashMap<usize, String>) -> Self {
        Self { sets, names }
    }

    /// Total number of detections across all sets.
    #[must_use]
    pub fn len(&self) -> usize {
        self.sets.iter().map(DetectionSet::len).sum()
    }

    /// Check if there are no detections in any set.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Resolve a class identifier to its name, falling back to the number itself.
    #[must_use]
    pub fn class_name(&self, class_id: usize) -> String {
        self.names
            .get(&class_id)
            .map_or_else(|| class_id.to_string(), Clone::clone)
    }
}
