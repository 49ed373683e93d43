//! PNG encoding of captured images.

use image::codecs::png::PngEncoder;
use image::{ExtendedColorType, ImageEncoder as _};

use crate::bridge::{EncodeError, ImageEncoder, PixelFormat, RawImage};

/// Encodes raw captures as PNG.
#[derive(Debug, Clone, Copy, Default)]
pub struct PngImageEncoder;

impl ImageEncoder for PngImageEncoder {
    fn encode(&self, image: &RawImage) -> Result<Vec<u8>, EncodeError> {
        if image.width == 0 || image.height == 0 {
            return Err(EncodeError::EmptyImage {
                width: image.width,
                height: image.height,
            });
        }
        // The codec panics on a short buffer instead of returning an error.
        let expected = image.expected_len();
        if image.data.len() != expected {
            return Err(EncodeError::BufferSizeMismatch {
                expected,
                actual: image.data.len(),
            });
        }

        let color = match image.format {
            PixelFormat::Gray8 => ExtendedColorType::L8,
            PixelFormat::Rgb8 => ExtendedColorType::Rgb8,
            PixelFormat::Rgba8 => ExtendedColorType::Rgba8,
        };

        let mut png = Vec::new();
        PngEncoder::new(&mut png).write_image(&image.data, image.width, image.height, color)?;
        Ok(png)
    }

    fn format_name(&self) -> &'static str {
        "PNG"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PNG_SIGNATURE: [u8; 8] = [137, 80, 78, 71, 13, 10, 26, 10];

    #[test]
    fn test_encode_rgb() {
        let image = RawImage::new(2, 2, PixelFormat::Rgb8, vec![128; 12]);
        let png = PngImageEncoder.encode(&image).unwrap();
        assert_eq!(&png[0..8], &PNG_SIGNATURE);

        let decoded = image::load_from_memory(&png).unwrap().to_rgb8();
        assert_eq!(decoded.dimensions(), (2, 2));
        assert_eq!(decoded.into_raw(), vec![128; 12]);
    }

    #[test]
    fn test_encode_rgba_and_gray() {
        let rgba = RawImage::new(1, 1, PixelFormat::Rgba8, vec![1, 2, 3, 4]);
        assert!(PngImageEncoder.encode(&rgba).is_ok());

        let gray = RawImage::new(3, 1, PixelFormat::Gray8, vec![0, 127, 255]);
        assert!(PngImageEncoder.encode(&gray).is_ok());
    }

    #[test]
    fn test_encode_rejects_short_buffer() {
        let image = RawImage::new(2, 2, PixelFormat::Rgb8, vec![0; 10]);
        match PngImageEncoder.encode(&image) {
            Err(EncodeError::BufferSizeMismatch { expected, actual }) => {
                assert_eq!(expected, 12);
                assert_eq!(actual, 10);
            }
            other => panic!("Expected BufferSizeMismatch, got {:?}", other),
        }
    }

    #[test]
    fn test_encode_rejects_empty_image() {
        let image = RawImage::new(0, 4, PixelFormat::Rgb8, vec![]);
        assert!(matches!(
            PngImageEncoder.encode(&image),
            Err(EncodeError::EmptyImage { width: 0, height: 4 })
        ));
    }

    #[test]
    fn test_format_name() {
        assert_eq!(PngImageEncoder.format_name(), "PNG");
    }
}
