//! Lossless PNG encoding.

use image::codecs::png::PngEncoder;
use image::{ExtendedColorType, ImageEncoder};

use super::{validate, EncodeError};
use crate::decode::Bitmap;

/// Encode a bitmap to PNG bytes, alpha included.
pub fn encode_png(image: &Bitmap) -> Result<Vec<u8>, EncodeError> {
    validate(image)?;

    let mut buffer = Vec::new();
    PngEncoder::new(&mut buffer)
        .write_image(
            &image.pixels,
            image.width,
            image.height,
            ExtendedColorType::Rgba8,
        )
        .map_err(|e| EncodeError::EncodingFailed(e.to_string()))?;

    Ok(buffer)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decode::decode_image;

    const PNG_MAGIC: [u8; 8] = [0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A];

    #[test]
    fn test_encode_png_magic() {
        let img = Bitmap::filled(8, 8, [10, 20, 30, 255]);
        let bytes = encode_png(&img).unwrap();
        assert_eq!(&bytes[..8], &PNG_MAGIC);
    }

    #[test]
    fn test_png_is_lossless_including_alpha() {
        let mut img = Bitmap::filled(3, 2, [200, 100, 50, 255]);
        img.pixels[3] = 0;
        img.pixels[7] = 128;

        let decoded = decode_image(&encode_png(&img).unwrap()).unwrap();
        assert_eq!(decoded, img);
    }

    #[test]
    fn test_encode_png_zero_size() {
        let img = Bitmap::new(0, 4, vec![]);
        assert!(matches!(
            encode_png(&img),
            Err(EncodeError::InvalidDimensions { .. })
        ));
    }

    #[test]
    fn test_encode_png_short_buffer() {
        let img = Bitmap {
            width: 4,
            height: 4,
            pixels: vec![0; 12],
        };
        assert!(matches!(
            encode_png(&img),
            Err(EncodeError::InvalidPixelData {
                expected: 64,
                actual: 12
            })
        ));
    }
}
