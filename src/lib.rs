// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license

#![allow(clippy::multiple_crate_versions)]

//! # Detection Counter
//!
//! Counts objects per class in a single image using a YOLO detection model
//! exported to ONNX. This is the Rust take on a one-shot script: load a model,
//! run it on one image, print `"<count> <class_name>"` for each class found,
//! and append a summary line to a log file.
//!
//! ## Quick Start (Library)
//!
//! ```no_run
//! use detection_counter::{YoloModel, counter, source};
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     // Load once, pass explicitly
//!     let mut model = YoloModel::load("strawberry.onnx")?;
//!     let image = source::load_image("field.jpg")?;
//!
//!     for entry in counter::run(&image, &mut model)? {
//!         println!("{entry}"); // e.g. "3 strawberry"
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## CLI Usage
//!
//! ```bash
//! detection-counter count --model strawberry.onnx --source field.jpg
//! detection-counter count -m yolo11n.onnx -s bus.jpg --conf 0.5 --log runs.txt
//! ```
//!
//! | Option | Short | Description | Default |
//! |--------|-------|-------------|---------|
//! | `--model` | `-m` | Path to ONNX model | `strawberry.onnx` |
//! | `--source` | `-s` | Image to run on | required |
//! | `--log` | `-l` | Log file to append to | `detections_log.txt` |
//! | `--conf` | | Confidence threshold | `0.25` |
//! | `--iou` | | `IoU` threshold for NMS | `0.45` |
//! | `--max-det` | | Max detections kept per image | `1000` |
//! | `--imgsz` | | Inference image size | model metadata |
//! | `--threads` | | ONNX Runtime intra-op threads | `0` (auto) |
//! | `--half` | | Use FP16 input | `false` |
//! | `--verbose` | | Diagnostics on stderr | `false` |
//!
//! ## Model Export
//!
//! PyTorch checkpoints are not loaded directly. Export them first:
//!
//! ```bash
//! yolo export model=strawberry.pt format=onnx
//! ```
//!
//! Both anchor-free heads (`YOLOv5u`, `YOLOv8`, YOLO11) and classic `YOLOv5`
//! heads with an objectness column are decoded.
//!
//! ## Module Overview
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`counter`] | [`DetectionCount`], [`counter::run`], [`counter::count`] |
//! | [`model`] | [`YoloModel`] and the [`Detector`] trait |
//! | [`prediction`] | [`Prediction`], [`DetectionSet`], [`Detection`] |
//! | [`run_log`] | Append-only [`RunLog`] |
//! | [`source`] | Image decoding |
//! | [`config`] | [`CounterConfig`] builder |
//! | [`error`] | [`CounterError`] and [`Result`] |
//! | [`preprocessing`] | Letterbox and tensor conversion |
//! | [`postprocessing`] | Output decoding and NMS |
//! | [`metadata`] | ONNX metadata parsing |

// Modules
pub mod cli;
pub mod config;
pub mod counter;
pub mod error;
pub mod metadata;
pub mod model;
pub mod postprocessing;
pub mod prediction;
pub mod preprocessing;
pub mod run_log;
pub mod source;
pub mod utils;

// Re-export main types for convenience
pub use config::CounterConfig;
pub use counter::DetectionCount;
pub use error::{CounterError, Result};
pub use metadata::ModelMetadata;
pub use model::{Detector, YoloModel};
pub use prediction::{Detection, DetectionSet, Prediction};
pub use run_log::RunLog;

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Library name.
pub const NAME: &str = env!("CARGO_PKG_NAME");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(VERSION.contains('.'));
    }

    #[test]
    fn test_name() {
        assert_eq!(NAME, "detection-counter");
    }
}
