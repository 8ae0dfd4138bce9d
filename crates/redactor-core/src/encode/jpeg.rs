//! JPEG encoding for sharing.
//!
//! JPEG has no alpha channel, so transparent regions (the corners a rotation
//! uncovers) are composited onto white first.

use image::codecs::jpeg::JpegEncoder;
use image::{ExtendedColorType, ImageEncoder};

use super::{validate, EncodeError};
use crate::decode::Bitmap;

/// Encode a bitmap to JPEG bytes.
///
/// `quality` is clamped to 1-100.
pub fn encode_jpeg(image: &Bitmap, quality: u8) -> Result<Vec<u8>, EncodeError> {
    validate(image)?;

    let rgb = flatten_onto_white(&image.pixels);
    let quality = quality.clamp(1, 100);

    let mut buffer = Vec::new();
    JpegEncoder::new_with_quality(&mut buffer, quality)
        .write_image(&rgb, image.width, image.height, ExtendedColorType::Rgb8)
        .map_err(|e| EncodeError::EncodingFailed(e.to_string()))?;

    Ok(buffer)
}

fn flatten_onto_white(rgba: &[u8]) -> Vec<u8> {
    let mut rgb = Vec::with_capacity(rgba.len() / 4 * 3);
    for px in rgba.chunks_exact(4) {
        let a = px[3] as u32;
        for &c in &px[..3] {
            rgb.push(((c as u32 * a + 255 * (255 - a) + 127) / 255) as u8);
        }
    }
    rgb
}


#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        /// Property: any well-formed bitmap encodes to a complete JPEG stream.
        #[test]
        fn prop_valid_input_produces_valid_jpeg(
            width in 1u32..=40,
            height in 1u32..=40,
            quality in 1u8..=100,
            alpha in any::<u8>(),
        ) {
            let img = Bitmap::filled(width, height, [90, 160, 30, alpha]);
            let bytes = encode_jpeg(&img, quality).unwrap();

            prop_assert_eq!(&bytes[0..2], &[0xFF, 0xD8]);
            let len = bytes.len();
            prop_assert_eq!(&bytes[len - 2..], &[0xFF, 0xD9]);
        }
    }
}
