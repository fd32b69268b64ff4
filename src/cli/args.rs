// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license

use clap::{Args, Parser, Subcommand};

use crate::run_log::DEFAULT_LOG_FILE;

/// Default model artifact name.
pub const DEFAULT_MODEL: &str = "strawberry.onnx";

/// CLI arguments parser.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
#[command(after_help = r#"Examples:
    detection-counter count --source field.jpg
    detection-counter count -m strawberry.onnx -s field.jpg --conf 0.5
    detection-counter count -m yolo11n.onnx -s bus.jpg --log runs.txt --verbose"#)]
pub struct Cli {
    #[command(subcommand)]
    /// Subcommand to execute.
    pub command: Commands,
}

/// Commands for the CLI.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Count detected objects per class in one image
    Count(CountArgs),
}

/// Arguments for the count command.
#[derive(Args, Debug, Clone)]
pub struct CountArgs {
    /// Path to ONNX model file
    #[arg(short, long, default_value = DEFAULT_MODEL)]
    pub model: String,

    /// Image to run detection on
    #[arg(short, long)]
    pub source: String,

    /// File to append the run summary to
    #[arg(short, long, default_value = DEFAULT_LOG_FILE)]
    pub log: String,

    /// Confidence threshold
    #[arg(long, default_value_t = 0.25)]
    pub conf: f32,

    /// `IoU` threshold for NMS
    #[arg(long, default_value_t = 0.45)]
    pub iou: f32,

    /// Maximum detections kept per image
    #[arg(long = "max-det", default_value_t = 1000)]
    pub max_det: usize,

    /// Inference image size (defaults to the model's export size)
    #[arg(long)]
    pub imgsz: Option<usize>,

    /// ONNX Runtime intra-op threads (0 = auto)
    #[arg(long, default_value_t = 0)]
    pub threads: usize,

    /// Use FP16 half-precision input
    #[arg(long, default_value_t = false)]
    pub half: bool,

    /// Show verbose output on stderr
    #[arg(long, default_value_t = false)]
    pub verbose: bool,
}
