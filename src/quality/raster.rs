//! Decoded grayscale raster owned by a single scoring call.

use std::io::Cursor;

use image::{GrayImage, ImageFormat, ImageReader};

use super::config::DocumentSize;
use super::error::QualityError;

/// Grayscale pixel buffer plus the metadata reported alongside the scores.
#[derive(Debug, Clone)]
pub struct RasterImage {
    gray: GrayImage,
    format: String,
    byte_size: usize,
}

impl RasterImage {
    /// Decode raw image bytes (PNG, JPEG, etc.) into an 8-bit grayscale raster.
    ///
    /// Higher bit depths are scaled down to 0-255 during conversion.
    pub fn decode(bytes: &[u8]) -> Result<Self, QualityError> {
        let reader = ImageReader::new(Cursor::new(bytes))
            .with_guessed_format()
            .map_err(|e| QualityError::Decode(e.to_string()))?;

        let format = reader
            .format()
            .map(format_tag)
            .ok_or_else(|| QualityError::Decode("unrecognized image format".to_string()))?;

        let decoded = reader.decode()?;
        tracing::debug!(
            "Decoded {} image {}x{} ({} bytes)",
            format,
            decoded.width(),
            decoded.height(),
            bytes.len()
        );

        Ok(Self {
            gray: decoded.to_luma8(),
            format,
            byte_size: bytes.len(),
        })
    }

    /// Wrap an already-decoded grayscale buffer.
    pub fn from_gray(gray: GrayImage, format: impl Into<String>) -> Self {
        let byte_size = gray.as_raw().len();
        Self {
            gray,
            format: format.into(),
            byte_size,
        }
    }

    /// Reject images smaller than `min` in either dimension.
    pub fn ensure_min_size(&self, min: DocumentSize) -> Result<(), QualityError> {
        if min.admits(self.width(), self.height()) {
            return Ok(());
        }
        Err(QualityError::ResolutionTooLow {
            width: self.width(),
            height: self.height(),
            min_width: min.width,
            min_height: min.height,
        })
    }

    pub fn gray(&self) -> &GrayImage {
        &self.gray
    }

    pub fn width(&self) -> u32 {
        self.gray.width()
    }

    pub fn height(&self) -> u32 {
        self.gray.height()
    }

    /// Lowercase format name, e.g. "png" or "jpeg".
    pub fn format(&self) -> &str {
        &self.format
    }

    /// Size of the encoded input in bytes.
    pub fn byte_size(&self) -> usize {
        self.byte_size
    }
}

fn format_tag(format: ImageFormat) -> String {
    format!("{:?}", format).to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Luma;

    fn encode_png(img: &GrayImage) -> Vec<u8> {
        let mut buf = Vec::new();
        img.write_to(&mut Cursor::new(&mut buf), ImageFormat::Png)
            .unwrap();
        buf
    }

    #[test]
    fn test_decode_png() {
        let img = GrayImage::from_pixel(32, 16, Luma([200]));
        let bytes = encode_png(&img);

        let raster = RasterImage::decode(&bytes).unwrap();
        assert_eq!(raster.width(), 32);
        assert_eq!(raster.height(), 16);
        assert_eq!(raster.format(), "png");
        assert_eq!(raster.byte_size(), bytes.len());
        assert!(raster.gray().pixels().all(|p| p.0[0] == 200));
    }

    #[test]
    fn test_decode_rgb_converts_to_gray() {
        let img = image::RgbImage::from_pixel(8, 8, image::Rgb([255, 255, 255]));
        let mut buf = Vec::new();
        img.write_to(&mut Cursor::new(&mut buf), ImageFormat::Png)
            .unwrap();

        let raster = RasterImage::decode(&buf).unwrap();
        assert!(raster.gray().pixels().all(|p| p.0[0] == 255));
    }

    #[test]
    fn test_decode_garbage_fails() {
        let err = RasterImage::decode(b"definitely not an image").unwrap_err();
        assert!(matches!(err, QualityError::Decode(_)));
    }

    #[test]
    fn test_decode_truncated_png_fails() {
        let img = GrayImage::from_pixel(64, 64, Luma([10]));
        let bytes = encode_png(&img);
        let err = RasterImage::decode(&bytes[..bytes.len() / 2]).unwrap_err();
        assert!(matches!(err, QualityError::Decode(_)));
    }

    #[test]
    fn test_min_size_gate() {
        let raster = RasterImage::from_gray(GrayImage::new(200, 200), "png");
        let err = raster
            .ensure_min_size(DocumentSize::default())
            .unwrap_err();
        assert!(matches!(
            err,
            QualityError::ResolutionTooLow {
                min_width: 400,
                min_height: 400,
                ..
            }
        ));

        let raster = RasterImage::from_gray(GrayImage::new(400, 400), "png");
        assert!(raster.ensure_min_size(DocumentSize::default()).is_ok());
        assert!(raster
            .ensure_min_size(DocumentSize::document_capture())
            .is_err());
    }
}
