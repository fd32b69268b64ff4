// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license

//! Error types for the detection counter.

use std::fmt;

/// Result type alias for counting operations.
pub type Result<T> = std::result::Result<T, CounterError>;

/// Main error type for the detection counter.
#[derive(Debug)]
pub enum CounterError {
    /// The model artifact is missing, unsupported, or corrupt.
    ModelLoadError(String),
    /// The image source is absent or cannot be decoded.
    ImageDecodeError(String),
    /// Model invocation failed or produced an unexpected tensor.
    InferenceError(String),
    /// Invalid configuration provided.
    ConfigError(String),
    /// IO error with context (log file cannot be opened, written, etc.).
    IoError(String),
    /// Wrapped `std::io::Error`.
    Io(std::io::Error),
}

impl fmt::Display for CounterError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ModelLoadError(msg) => write!(f, "Model load error: {msg}"),
            Self::ImageDecodeError(msg) => write!(f, "Image decode error: {msg}"),
            Self::InferenceError(msg) => write!(f, "Inference error: {msg}"),
            Self::ConfigError(msg) => write!(f, "Config error: {msg}"),
            Self::IoError(msg) => write!(f, "IO error: {msg}"),
            Self::Io(err) => write!(f, "IO error: {err}"),
        }
    }
}

impl std::error::Error for CounterError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io(err) => Some(err),
            _ => None,
        }
    }
}

impl From<std::io::Error> for CounterError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err)
    }
}

impl From<image::ImageError> for CounterError {
    fn from(err: image::ImageError) -> Self {
        Self::ImageDecodeError(err.to_string())
    }
}
