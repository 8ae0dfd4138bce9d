//! Image resizing for previews and canvas fitting.
//!
//! All functions return new `Bitmap` instances without modifying the input.

use super::{Bitmap, DecodeError, FilterType};

/// Resize an image to exact dimensions, ignoring aspect ratio.
///
/// # Errors
///
/// Returns `DecodeError::InvalidDimensions` for a zero target and
/// `DecodeError::CorruptedFile` if the source buffer is malformed.
pub fn resize(
    image: &Bitmap,
    width: u32,
    height: u32,
    filter: FilterType,
) -> Result<Bitmap, DecodeError> {
    if width == 0 || height == 0 {
        return Err(DecodeError::InvalidDimensions { width, height });
    }

    let rgba = image
        .to_rgba_image()
        .ok_or_else(|| DecodeError::CorruptedFile("Failed to create RgbaImage".to_string()))?;

    if image.is_empty() {
        return Err(DecodeError::InvalidDimensions {
            width: image.width,
            height: image.height,
        });
    }

    if image.width == width && image.height == height {
        return Ok(image.clone());
    }

    let resized = image::imageops::resize(&rgba, width, height, filter.to_image_filter());
    Ok(Bitmap::from_rgba_image(resized))
}

/// Resize an image so its longest edge is at most `max_edge`, preserving
/// aspect ratio. Smaller images are returned unchanged.
pub fn resize_to_fit(
    image: &Bitmap,
    max_edge: u32,
    filter: FilterType,
) -> Result<Bitmap, DecodeError> {
    if max_edge == 0 {
        return Err(DecodeError::InvalidDimensions {
            width: 0,
            height: 0,
        });
    }

    if image.width <= max_edge && image.height <= max_edge {
        return Ok(image.clone());
    }

    let (new_width, new_height) = calculate_fit_dimensions(image.width, image.height, max_edge);
    resize(image, new_width, new_height, filter)
}

/// Calculate dimensions to fit within max_edge while preserving aspect ratio.
fn calculate_fit_dimensions(width: u32, height: u32, max_edge: u32) -> (u32, u32) {
    if width == 0 || height == 0 {
        return (0, 0);
    }

    let ratio = width as f64 / height as f64;

    if width >= height {
        let new_height = (max_edge as f64 / ratio).round() as u32;
        (max_edge, new_height.max(1))
    } else {
        let new_width = (max_edge as f64 * ratio).round() as u32;
        (new_width.max(1), max_edge)
    }
}
