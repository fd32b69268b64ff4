// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license

//! Image input handling.
//!
//! The counter needs exactly one explicit image: either a file path or an
//! encoded byte buffer. Both are decoded into a [`DynamicImage`] once.

use std::path::Path;

use image::DynamicImage;

use crate::error::{CounterError, Result};

/// File extensions accepted as image sources.
pub const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "bmp", "gif", "webp", "tiff", "tif"];

/// Check if a path looks like an image file based on its extension.
#[must_use]
pub fn is_image_file(path: &Path) -> bool {
    path.extension().is_some_and(|ext| {
        let ext = ext.to_string_lossy().to_lowercase();
        IMAGE_EXTENSIONS.contains(&ext.as_str())
    })
}

/// Decode an image file.
///
/// The format is sniffed from the file contents, so a mislabelled extension
/// still decodes.
///
/// # Errors
///
/// Returns [`CounterError::ImageDecodeError`] if the file is missing or is
/// not a decodable image.
pub fn load_image<P: AsRef<Path>>(path: P) -> Result<DynamicImage> {
    let path = path.as_ref();

    if !path.is_file() {
        return Err(CounterError::ImageDecodeError(format!(
            "Image not found: {}",
            path.display()
        )));
    }

    let bytes = std::fs::read(path).map_err(|e| {
        CounterError::ImageDecodeError(format!("Failed to read {}: {e}", path.display()))
    })?;

    decode_image(&bytes).map_err(|e| match e {
        CounterError::ImageDecodeError(msg) => {
            CounterError::ImageDecodeError(format!("{}: {msg}", path.display()))
        }
        other => other,
    })
}

/// Decode an in-memory encoded image (JPEG, PNG, ...).
///
/// # Errors
///
/// Returns [`CounterError::ImageDecodeError`] for empty or malformed buffers.
pub fn decode_image(bytes: &[u8]) -> Result<DynamicImage> {
    if bytes.is_empty() {
        return Err(CounterError::ImageDecodeError(
            "Image buffer is empty".to_string(),
        ));
    }

    let image = image::load_from_memory(bytes)?;
    if image.width() == 0 || image.height() == 0 {
        return Err(CounterError::ImageDecodeError(
            "Image has zero width or height".to_string(),
        ));
    }

    Ok(image)
}
