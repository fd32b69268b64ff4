// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license

//! Runtime configuration for detection counting.
//!
//! [`CounterConfig`] controls how raw model output is turned into detections
//! (confidence and NMS thresholds, detection cap) and how the ONNX Runtime
//! session is set up (input size, thread count, precision).

use crate::error::{CounterError, Result};

/// Configuration for loading a model and decoding its detections.
///
/// # Example
///
/// ```rust
/// use detection_counter::CounterConfig;
///
/// let config = CounterConfig::new()
///     .with_confidence(0.5)
///     .with_iou(0.45)
///     .with_max_detections(100)
///     .with_imgsz(640, 640);
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone)]
pub struct CounterConfig {
    /// Confidence threshold for detections (0.0 to 1.0).
    /// Predictions scoring at or below this value are not counted.
    pub confidence_threshold: f32,
    /// Intersection over Union (IoU) threshold for per-class Non-Maximum Suppression.
    pub iou_threshold: f32,
    /// Maximum number of detections kept per image.
    pub max_detections: usize,
    /// Explicit input image size (height, width).
    /// If `None`, the model's metadata decides.
    pub imgsz: Option<(usize, usize)>,
    /// Number of intra-op threads for ONNX Runtime (`0` = let the runtime decide).
    pub num_threads: usize,
    /// Feed the model an FP16 input tensor even if its metadata does not say so.
    pub half: bool,
}

impl Default for CounterConfig {
    fn default() -> Self {
        Self {
            confidence_threshold: 0.25,
            iou_threshold: 0.45,
            max_detections: 1000,
            imgsz: None,
            num_threads: 0,
            half: false,
        }
    }
}

impl CounterConfig {
    /// Create a new configuration with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the confidence threshold.
    #[must_use]
    pub const fn with_confidence(mut self, threshold: f32) -> Self {
        self.confidence_threshold = threshold;
        self
    }

    /// Set the IoU threshold for Non-Maximum Suppression (NMS).
    #[must_use]
    pub const fn with_iou(mut self, threshold: f32) -> Self {
        self.iou_threshold = threshold;
        self
    }

    /// Set the maximum number of detections kept per image.
    #[must_use]
    pub const fn with_max_detections(mut self, max: usize) -> Self {
        self.max_detections = max;
        self
    }

    /// Set the input image size as (height, width).
    #[must_use]
    pub const fn with_imgsz(mut self, height: usize, width: usize) -> Self {
        self.imgsz = Some((height, width));
        self
    }

    /// Set the number of intra-op threads. `0` means auto.
    #[must_use]
    pub const fn with_threads(mut self, threads: usize) -> Self {
        self.num_threads = threads;
        self
    }

    /// Force FP16 input tensors.
    #[must_use]
    pub const fn with_half(mut self, half: bool) -> Self {
        self.half = half;
        self
    }

    /// Check that thresholds lie in [0, 1] and sizes are non-zero.
    ///
    /// # Errors
    ///
    /// Returns [`CounterError::ConfigError`] naming the first offending field.
    pub fn validate(&self) -> Result<()> {
        if !(0.0..=1.0).contains(&self.confidence_threshold) {
            return Err(CounterError::ConfigError(format!(
                "confidence threshold must be within [0, 1], got {}",
                self.confidence_threshold
            )));
        }
        if !(0.0..=1.0).contains(&self.iou_threshold) {
            return Err(CounterError::ConfigError(format!(
                "IoU threshold must be within [0, 1], got {}",
                self.iou_threshold
            )));
        }
        if self.max_detections == 0 {
            return Err(CounterError::ConfigError(
                "max detections must be at least 1".to_string(),
            ));
        }
        if let Some((h, w)) = self.imgsz
            && (h == 0 || w == 0)
        {
            return Err(CounterError::ConfigError(format!(
                "image size must be non-zero, got {h}x{w}"
            )));
        }
        Ok(())
    }
}
