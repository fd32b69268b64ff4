// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license

//! Image preprocessing for YOLO inference.
//!
//! Letterbox resizing (aspect-preserving scale plus centred gray padding),
//! normalisation to [0, 1] and conversion to an NCHW tensor.

use half::f16;
use image::imageops::{self, FilterType};
use image::{DynamicImage, GenericImageView, Rgb, RgbImage};
use ndarray::Array4;

/// Default letterbox padding color (gray).
pub const LETTERBOX_COLOR: [u8; 3] = [114, 114, 114];

/// Result of preprocessing an image, containing the tensor and transform info.
#[derive(Debug, Clone)]
pub struct PreprocessResult {
    /// Preprocessed image tensor in NCHW format, normalized to [0, 1].
    pub tensor: Array4<f32>,
    /// FP16 copy of `tensor` (if requested).
    pub tensor_f16: Option<Array4<f16>>,
    /// Original image dimensions (height, width).
    pub orig_shape: (u32, u32),
    /// Scale factors applied (`scale_y`, `scale_x`).
    pub scale: (f32, f32),
    /// Padding applied (`pad_top`, `pad_left`).
    pub padding: (f32, f32),
}

/// Preprocess an image for YOLO inference.
///
/// # Arguments
///
/// * `image` - Input image, any color type.
/// * `target_size` - Target size as (height, width).
/// * `half` - If true, also generate an FP16 tensor.
#[must_use]
pub fn preprocess_image(
    image: &DynamicImage,
    target_size: (usize, usize),
    half: bool,
) -> PreprocessResult {
    let (orig_width, orig_height) = image.dimensions();
    let (new_width, new_height, pad_left, pad_top, scale) =
        calculate_letterbox_params(orig_width, orig_height, target_size);

    let rgb = image.to_rgb8();
    let resized = if (new_width, new_height) == (orig_width, orig_height) {
        rgb
    } else {
        imageops::resize(&rgb, new_width, new_height, FilterType::Triangle)
    };

    #[allow(clippy::cast_possible_truncation)]
    let mut canvas = RgbImage::from_pixel(
        target_size.1 as u32,
        target_size.0 as u32,
        Rgb(LETTERBOX_COLOR),
    );
    imageops::replace(&mut canvas, &resized, i64::from(pad_left), i64::from(pad_top));

    let tensor = image_to_tensor(&canvas);
    let tensor_f16 = half.then(|| tensor.mapv(f16::from_f32));

    PreprocessResult {
        tensor,
        tensor_f16,
        orig_shape: (orig_height, orig_width),
        scale,
        #[allow(clippy::cast_precision_loss)]
        padding: (pad_top as f32, pad_left as f32),
    }
}

/// Calculate letterbox parameters for resizing.
///
/// Returns `(new_width, new_height, pad_left, pad_top, (scale_y, scale_x))`.
fn calculate_letterbox_params(
    orig_width: u32,
    orig_height: u32,
    target_size: (usize, usize),
) -> (u32, u32, u32, u32, (f32, f32)) {
    #[allow(clippy::cast_precision_loss)]
    let (target_h, target_w) = (target_size.0 as f32, target_size.1 as f32);
    #[allow(clippy::cast_precision_loss)]
    let (orig_h, orig_w) = (orig_height.max(1) as f32, orig_width.max(1) as f32);

    let scale = (target_h / orig_h).min(target_w / orig_w);

    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    let new_w = ((orig_w * scale).round() as u32).max(1);
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    let new_h = ((orig_h * scale).round() as u32).max(1);

    #[allow(clippy::cast_possible_truncation)]
    let pad_w = (target_size.1 as u32).saturating_sub(new_w);
    #[allow(clippy::cast_possible_truncation)]
    let pad_h = (target_size.0 as u32).saturating_sub(new_h);

    #[allow(clippy::cast_precision_loss)]
    let scale_x = new_w as f32 / orig_w;
    #[allow(clippy::cast_precision_loss)]
    let scale_y = new_h as f32 / orig_h;

    (new_w, new_h, pad_w / 2, pad_h / 2, (scale_y, scale_x))
}

/// Convert an RGB image to a normalized NCHW tensor with shape (1, 3, H, W).
fn image_to_tensor(image: &RgbImage) -> Array4<f32> {
    let (width, height) = image.dimensions();
    let (w, h) = (width as usize, height as usize);

    let mut tensor = Array4::zeros((1, 3, h, w));
    for (x, y, pixel) in image.enumerate_pixels() {
        let (x, y) = (x as usize, y as usize);
        for c in 0..3 {
            tensor[[0, c, y, x]] = f32::from(pixel[c]) / 255.0;
        }
    }

    tensor
}

/// Scale coordinates from model output space back to original image space.
///
/// # Arguments
///
/// * `coords` - Coordinates in model space (after letterbox).
/// * `scale` - Scale factors (`scale_y`, `scale_x`) from preprocessing.
/// * `padding` - Padding (`pad_top`, `pad_left`) from preprocessing.
#[must_use]
pub fn scale_coords(coords: &[f32; 4], scale: (f32, f32), padding: (f32, f32)) -> [f32; 4] {
    let (scale_y, scale_x) = scale;
    let (pad_top, pad_left) = padding;

    [
        (coords[0] - pad_left) / scale_x,
        (coords[1] - pad_top) / scale_y,
        (coords[2] - pad_left) / scale_x,
        (coords[3] - pad_top) / scale_y,
    ]
}

/// Clip coordinates to image bounds given as (height, width).
#[must_use]
pub const fn clip_coords(coords: &[f32; 4], shape: (u32, u32)) -> [f32; 4] {
    #[allow(clippy::cast_precision_loss)]
    let (h, w) = (shape.0 as f32, shape.1 as f32);
    [
        coords[0].clamp(0.0, w),
        coords[1].clamp(0.0, h),
        coords[2].clamp(0.0, w),
        coords[3].clamp(0.0, h),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_letterbox_params_square() {
        let (new_w, new_h, pad_left, pad_top, _scale) =
            calculate_letterbox_params(640, 640, (640, 640));

        assert_eq!((new_w, new_h), (640, 640));
        assert_eq!((pad_left, pad_top), (0, 0));
    }

    #[test]
    fn test_letterbox_params_wide() {
        let (new_w, new_h, pad_left, pad_top, (scale_y, scale_x)) =
            calculate_letterbox_params(1280, 720, (640, 640));

        assert_eq!((new_w, new_h), (640, 360));
        assert_eq!((pad_left, pad_top), (0, 140));
        assert!((scale_x - 0.5).abs() < 1e-6);
        assert!((scale_y - 0.5).abs() < 1e-6);
    }

    #[test]
    fn test_preprocess_pads_with_gray() {
        let image = DynamicImage::ImageRgb8(RgbImage::from_pixel(64, 32, Rgb([255, 0, 0])));
        let result = preprocess_image(&image, (64, 64), false);

        assert_eq!(result.tensor.shape(), &[1, 3, 64, 64]);
        assert_eq!(result.orig_shape, (32, 64));
        assert!((result.padding.0 - 16.0).abs() < f32::EPSILON);
        assert!(result.tensor_f16.is_none());

        // Top padding row is letterbox gray, image rows are red
        let gray = 114.0 / 255.0;
        assert!((result.tensor[[0, 0, 0, 0]] - gray).abs() < 1e-6);
        assert!((result.tensor[[0, 0, 32, 10]] - 1.0).abs() < 1e-6);
        assert!(result.tensor[[0, 1, 32, 10]].abs() < 1e-6);
    }

    #[test]
    fn test_preprocess_half_tensor() {
        let image = DynamicImage::ImageRgb8(RgbImage::from_pixel(8, 8, Rgb([255, 255, 255])));
        let result = preprocess_image(&image, (8, 8), true);

        let half = result.tensor_f16.expect("fp16 tensor requested");
        assert_eq!(half.shape(), &[1, 3, 8, 8]);
        assert!((half[[0, 2, 4, 4]].to_f32() - 1.0).abs() < 1e-3);
    }

    #[test]
    fn test_scale_coords() {
        let scaled = scale_coords(&[100.0, 100.0, 200.0, 200.0], (0.5, 0.5), (10.0, 0.0));

        assert!((scaled[0] - 200.0).abs() < 1e-4);
        assert!((scaled[1] - 180.0).abs() < 1e-4);
        assert!((scaled[2] - 400.0).abs() < 1e-4);
        assert!((scaled[3] - 380.0).abs() < 1e-4);
    }

    #[test]
    fn test_clip_coords() {
        let clipped = clip_coords(&[-10.0, -20.0, 700.0, 500.0], (480, 640));

        assert!(clipped[0].abs() < 1e-6);
        assert!(clipped[1].abs() < 1e-6);
        assert!((clipped[2] - 640.0).abs() < 1e-6);
        assert!((clipped[3] - 480.0).abs() < 1e-6);
    }
}
